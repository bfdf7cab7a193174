//! Mailbox data model
//!
//! Plain owned values handed across the [`MailboxApi`](crate::MailboxApi)
//! boundary. Nothing here is persisted; every value is a snapshot of one
//! remote call or the input to one.

use serde::{Deserialize, Serialize};

/// Content type given to every inline image attachment.
pub const INLINE_IMAGE_CONTENT_TYPE: &str = "image/png";

/// One row of an inbox listing: `{id, from, subject, isRead}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxSummaryEntry {
    pub id: String,
    /// Sender address.
    pub from: Option<String>,
    pub subject: Option<String>,
    pub is_read: bool,
}

/// Sender and subject of a message, fetched for display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    pub from: Option<String>,
    pub subject: Option<String>,
}

impl MessageContext {
    #[must_use]
    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or("unknown")
    }

    #[must_use]
    pub fn subject_line(&self) -> &str {
        self.subject.as_deref().unwrap_or("(no subject)")
    }
}

impl From<&InboxSummaryEntry> for MessageContext {
    fn from(entry: &InboxSummaryEntry) -> Self {
        Self {
            from: entry.from.clone(),
            subject: entry.subject.clone(),
        }
    }
}

/// A message selected to receive an automated reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub message_id: String,
    /// Known up front when the target came from an inbox listing.
    pub context: Option<MessageContext>,
}

impl ReplyTarget {
    #[must_use]
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            context: None,
        }
    }
}

impl From<&InboxSummaryEntry> for ReplyTarget {
    fn from(entry: &InboxSummaryEntry) -> Self {
        Self {
            message_id: entry.id.clone(),
            context: Some(MessageContext::from(entry)),
        }
    }
}

/// A file attached to a message and referenced from its HTML body through
/// a `cid:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAttachment {
    pub file_name: String,
    pub content_type: String,
    pub is_inline: bool,
    pub content_id: String,
    pub bytes: Vec<u8>,
}

/// HTML body plus attachments, ready to be written into a draft or sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedMessage {
    pub html_body: String,
    pub attachments: Vec<InlineAttachment>,
}

impl ComposedMessage {
    /// A message with no attachments.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            html_body: body.into(),
            attachments: Vec::new(),
        }
    }
}

/// An email address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub name: Option<String>,
}

impl Recipient {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A brand-new message (not a reply), saved to Sent Items once sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Recipient,
    pub subject: String,
    pub message: ComposedMessage,
    /// Address replies should go to instead of the sender.
    pub reply_to: Option<Recipient>,
}

impl OutgoingMail {
    #[must_use]
    pub fn new(to: Recipient, subject: impl Into<String>, message: ComposedMessage) -> Self {
        Self {
            to,
            subject: subject.into(),
            message,
            reply_to: None,
        }
    }

    #[must_use]
    pub fn reply_to(mut self, recipient: Recipient) -> Self {
        self.reply_to = Some(recipient);
        self
    }
}
