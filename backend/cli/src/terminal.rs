//! Terminal implementations of the message surface and counter display.
//!
//! The transcript goes to stdout; counter updates go to stderr so they never
//! interleave with a half-written reply.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use cybersafer_core::{Counter, MessageState, Role};
use cybersafer_view::{CounterSink, MessageContainer};
use tracing::debug;

use crate::terminal_output::{paint, progress_bar, BOLD, CYAN, DIM, GREEN};

const BAR_CELLS: usize = 20;

/// Chat transcript written line by line to a terminal.
pub struct TerminalTranscript<W: Write> {
    out: W,
    color: bool,
    echo_user: bool,
    last: Option<MessageState>,
    at_line_start: bool,
}

impl<W: Write> TerminalTranscript<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            echo_user: true,
            last: None,
            at_line_start: true,
        }
    }

    /// Skip writing user messages; the terminal already shows what was
    /// typed.
    pub fn without_user_echo(mut self) -> Self {
        self.echo_user = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn hidden(&self) -> bool {
        !self.echo_user && matches!(self.last, Some(state) if state.role == Role::User)
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            debug!(error = %err, "Transcript write failed");
            return;
        }
        self.at_line_start = text.ends_with('\n');
    }

    fn end_line(&mut self) {
        if !self.at_line_start {
            self.write("\n");
        }
    }
}

impl<W: Write> MessageContainer for TerminalTranscript<W> {
    fn last_message(&self) -> Option<MessageState> {
        self.last
    }

    fn push_message(&mut self, role: Role, label: &str) {
        self.last = Some(MessageState {
            role,
            complete: false,
        });
        if self.hidden() {
            return;
        }
        self.end_line();
        let style = match role {
            Role::User => GREEN,
            Role::Bot => CYAN,
        };
        let prefix = paint(&format!("{label}:"), &format!("{BOLD}{style}"), self.color);
        self.write(&format!("{prefix} "));
    }

    fn append_to_last(&mut self, text: &str) {
        if !self.hidden() {
            self.write(text);
        }
    }

    fn mark_last_complete(&mut self) {
        if let Some(state) = self.last.as_mut() {
            state.complete = true;
        }
        if !self.hidden() {
            self.end_line();
        }
    }

    fn scroll_to_latest(&mut self) {
        if let Err(err) = self.out.flush() {
            debug!(error = %err, "Transcript flush failed");
        }
    }
}

/// Red-flag counter printed as a single status line whenever it changes.
pub struct TerminalCounter {
    color: bool,
    inner: Mutex<CounterState>,
}

struct CounterState {
    out: Box<dyn Write + Send>,
    last: Option<Counter>,
}

impl TerminalCounter {
    pub fn stderr(color: bool) -> Self {
        Self::new(Box::new(std::io::stderr()), color)
    }

    pub fn stdout(color: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), color)
    }

    pub fn new(out: Box<dyn Write + Send>, color: bool) -> Self {
        Self {
            color,
            inner: Mutex::new(CounterState { out, last: None }),
        }
    }

    pub fn last_counter(&self) -> Option<Counter> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last
    }

    fn line(&self, counter: Counter) -> String {
        let percent = counter
            .percent()
            .map(|p| format!(" {p:.0}%"))
            .unwrap_or_default();
        let bar = progress_bar(counter, BAR_CELLS);
        format!(
            "{} {bar}{}",
            paint("🚩 Red flags", BOLD, self.color),
            paint(&percent, DIM, self.color)
        )
    }
}

impl CounterSink for TerminalCounter {
    fn update_counter(&self, counter: Counter) {
        let line = self.line(counter);
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.last == Some(counter) {
            return;
        }
        state.last = Some(counter);
        if let Err(err) = writeln!(state.out, "{line}").and_then(|_| state.out.flush()) {
            debug!(error = %err, "Counter write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cybersafer_view::StreamRenderer;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn transcript_text(transcript: TerminalTranscript<Vec<u8>>) -> String {
        String::from_utf8(transcript.into_inner()).unwrap()
    }

    #[test]
    fn streamed_reply_shares_one_prefix() {
        let counter = Arc::new(TerminalCounter::new(Box::new(std::io::sink()), false));
        let mut renderer = StreamRenderer::new(TerminalTranscript::new(Vec::new(), false), counter);

        renderer.push_user_message("hi");
        renderer.render_chunk("Hello");
        renderer.render_chunk(", there");
        renderer.finish_message();

        assert_eq!(transcript_text(renderer.into_container()), "You: hi\nBot: Hello, there\n");
    }

    #[test]
    fn user_echo_can_be_suppressed() {
        let counter = Arc::new(TerminalCounter::new(Box::new(std::io::sink()), false));
        let transcript = TerminalTranscript::new(Vec::new(), false).without_user_echo();
        let mut renderer = StreamRenderer::new(transcript, counter);

        renderer.push_user_message("hi");
        renderer.render_chunk("Hello");
        renderer.finish_message();

        assert_eq!(transcript_text(renderer.into_container()), "Bot: Hello\n");
    }

    #[test]
    fn marker_updates_counter_not_transcript() {
        let buf = SharedBuf::default();
        let counter = Arc::new(TerminalCounter::new(Box::new(buf.clone()), false));
        let mut renderer = StreamRenderer::new(
            TerminalTranscript::new(Vec::new(), false),
            Arc::clone(&counter) as Arc<dyn CounterSink>,
        );

        renderer.render_chunk("[COUNTER:1/4]\nCareful now");
        renderer.finish_message();

        assert_eq!(counter.last_counter(), Some(Counter::new(1, 4)));
        assert!(buf.text().contains("1/4 25%"));
        assert_eq!(transcript_text(renderer.into_container()), "Bot: Careful now\n");
    }

    #[test]
    fn counter_prints_only_on_change() {
        let buf = SharedBuf::default();
        let counter = TerminalCounter::new(Box::new(buf.clone()), false);

        counter.update_counter(Counter::new(2, 5));
        counter.update_counter(Counter::new(2, 5));
        counter.update_counter(Counter::new(3, 5));

        let text = buf.text();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().last().unwrap().contains("3/5 60%"));
    }

    #[test]
    fn zero_total_has_no_percentage() {
        let buf = SharedBuf::default();
        let counter = TerminalCounter::new(Box::new(buf.clone()), false);
        counter.update_counter(Counter::new(0, 0));
        assert!(buf.text().trim_end().ends_with("0/0"));
    }
}
