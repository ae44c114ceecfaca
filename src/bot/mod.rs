//! Host-facing seam: the message event a chat host hands us and the text
//! dispatcher that routes it to [`crate::games::GameService`].

pub mod dispatch;

pub use dispatch::{dispatch, Command};

/// An incoming chat message as seen by the minigames.
///
/// Hosts that cannot tell who sent a message return `None`; the dispatcher
/// answers with a "could not identify" reply instead of guessing.
pub trait MessageEvent {
    fn sender_id(&self) -> Option<String>;
    fn platform_id(&self) -> Option<String>;
    fn set_reply(&mut self, reply: String);
}

/// Plain in-process event used by the console host and tests.
#[derive(Debug, Clone, Default)]
pub struct TextEvent {
    pub sender: Option<String>,
    pub platform: Option<String>,
    pub reply: Option<String>,
}

impl TextEvent {
    pub fn new(sender: &str, platform: &str) -> Self {
        Self {
            sender: Some(sender.to_string()),
            platform: Some(platform.to_string()),
            reply: None,
        }
    }

    /// Take the reply set by the last dispatch.
    pub fn take_reply(&mut self) -> Option<String> {
        self.reply.take()
    }
}

impl MessageEvent for TextEvent {
    fn sender_id(&self) -> Option<String> {
        self.sender.clone()
    }

    fn platform_id(&self) -> Option<String> {
        self.platform.clone()
    }

    fn set_reply(&mut self, reply: String) {
        self.reply = Some(reply);
    }
}
