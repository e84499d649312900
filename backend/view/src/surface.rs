//! The message surface the renderer writes into.

use cybersafer_core::{MessageState, Role};

/// A container of chat message elements.
///
/// Implementations only ever grow at the end: the renderer inspects the last
/// element, appends a new one, or appends text to the last one.
pub trait MessageContainer {
    /// Role and completion flag of the last element, if any.
    fn last_message(&self) -> Option<MessageState>;

    /// Append a new, open element with an empty content area.
    fn push_message(&mut self, role: Role, label: &str);

    /// Append text to the content of the last element.
    fn append_to_last(&mut self, text: &str);

    /// Flag the last element as complete.
    fn mark_last_complete(&mut self);

    /// Bring the newest content into view.
    fn scroll_to_latest(&mut self);
}

/// One message element: a label plus accumulated content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageElement {
    pub role: Role,
    pub label: String,
    pub content: String,
    pub complete: bool,
}

impl MessageElement {
    pub fn new(role: Role, label: impl Into<String>) -> Self {
        Self {
            role,
            label: label.into(),
            content: String::new(),
            complete: false,
        }
    }

    pub fn state(&self) -> MessageState {
        MessageState {
            role: self.role,
            complete: self.complete,
        }
    }
}

/// In-memory message container.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    elements: Vec<MessageElement>,
    // (element index, content length) at the last scroll
    scroll_mark: Option<(usize, usize)>,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[MessageElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn last(&self) -> Option<&MessageElement> {
        self.elements.last()
    }

    pub fn bot_messages(&self) -> impl Iterator<Item = &MessageElement> {
        self.elements.iter().filter(|el| el.role == Role::Bot)
    }

    /// Whether the view currently shows the end of the newest element.
    pub fn is_scrolled_to_latest(&self) -> bool {
        match (self.elements.len().checked_sub(1), self.scroll_mark) {
            (None, _) => true,
            (Some(idx), Some(mark)) => mark == (idx, self.elements[idx].content.len()),
            (Some(_), None) => false,
        }
    }
}

impl MessageContainer for MessageList {
    fn last_message(&self) -> Option<MessageState> {
        self.elements.last().map(MessageElement::state)
    }

    fn push_message(&mut self, role: Role, label: &str) {
        self.elements.push(MessageElement::new(role, label));
    }

    fn append_to_last(&mut self, text: &str) {
        if let Some(last) = self.elements.last_mut() {
            last.content.push_str(text);
        }
    }

    fn mark_last_complete(&mut self) {
        if let Some(last) = self.elements.last_mut() {
            last.complete = true;
        }
    }

    fn scroll_to_latest(&mut self) {
        self.scroll_mark = self
            .elements
            .len()
            .checked_sub(1)
            .map(|idx| (idx, self.elements[idx].content.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_last_state() {
        let mut list = MessageList::new();
        assert_eq!(list.last_message(), None);

        list.push_message(Role::Bot, "Bot");
        assert!(list.last_message().unwrap().is_open_bot());

        list.mark_last_complete();
        assert!(!list.last_message().unwrap().is_open_bot());
    }

    #[test]
    fn scroll_mark_goes_stale_on_new_content() {
        let mut list = MessageList::new();
        list.push_message(Role::Bot, "Bot");
        list.append_to_last("Hello");
        assert!(!list.is_scrolled_to_latest());

        list.scroll_to_latest();
        assert!(list.is_scrolled_to_latest());

        list.append_to_last(" again");
        assert!(!list.is_scrolled_to_latest());
    }
}
