use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    /// Marker class carried by message elements of this role.
    pub fn class_name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// What the renderer needs to know about the last message on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageState {
    pub role: Role,
    pub complete: bool,
}

impl MessageState {
    /// A bot message still receiving chunks.
    pub fn is_open_bot(&self) -> bool {
        self.role == Role::Bot && !self.complete
    }
}
