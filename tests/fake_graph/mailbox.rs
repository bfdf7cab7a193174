//! Test data model for the fake Graph server
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .message("m1", "alice@example.com", "Hello", false, "2024-01-01T10:00:00Z")
//!     .message("m2", "bob@example.com", "Re: hi", true, "2024-01-01T11:00:00Z")
//!     .build();
//! ```

/// Inbox contents of one user.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    pub messages: Vec<TestMessage>,
}

impl Mailbox {
    pub fn get(&self, id: &str) -> Option<&TestMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Messages ordered the way `$orderby=receivedDateTime DESC` asks.
    pub fn newest_first(&self) -> Vec<&TestMessage> {
        let mut sorted: Vec<&TestMessage> = self.messages.iter().collect();
        sorted.sort_by(|a, b| b.received.cmp(&a.received));
        sorted
    }
}

/// A message in the fake inbox.
///
/// `received` is an RFC 3339 UTC timestamp; lexical order is time order.
/// An empty `from` models a message with no sender.
#[derive(Debug, Clone)]
pub struct TestMessage {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub is_read: bool,
    pub received: String,
}

pub struct MailboxBuilder {
    messages: Vec<TestMessage>,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn message(
        mut self,
        id: &str,
        from: &str,
        subject: &str,
        is_read: bool,
        received: &str,
    ) -> Self {
        self.messages.push(TestMessage {
            id: id.to_string(),
            from: from.to_string(),
            subject: subject.to_string(),
            is_read,
            received: received.to_string(),
        });
        self
    }

    pub fn build(self) -> Mailbox {
        Mailbox {
            messages: self.messages,
        }
    }
}
