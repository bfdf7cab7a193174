//! The remote mailbox capability
//!
//! Everything the reply workflow and the bulk orchestrator need from the
//! mail provider, as one object-safe trait. [`GraphClient`](crate::GraphClient)
//! is the production implementation; tests substitute an in-memory one.

use crate::error::Result;
use crate::message::{ComposedMessage, InboxSummaryEntry, MessageContext, OutgoingMail};
use async_trait::async_trait;

/// Authenticated operations on one tenant's mailboxes.
///
/// Every call is a single remote attempt with no caching. None of them
/// are idempotent: retrying [`send_draft`](Self::send_draft) after an
/// ambiguous failure may send twice.
#[async_trait]
pub trait MailboxApi: Send + Sync {
    /// Up to `limit` most recent inbox messages, newest first.
    async fn list_inbox(&self, user_id: &str, limit: usize) -> Result<Vec<InboxSummaryEntry>>;

    /// Sender and subject of a single message.
    async fn fetch_message(&self, user_id: &str, message_id: &str) -> Result<MessageContext>;

    /// Ask the provider for a reply draft; returns the draft's id.
    async fn create_draft_reply(&self, user_id: &str, message_id: &str) -> Result<String>;

    /// Overwrite a draft's body and attachments.
    async fn update_draft(
        &self,
        user_id: &str,
        draft_id: &str,
        message: &ComposedMessage,
    ) -> Result<()>;

    /// Send a draft. After this returns the message is in Sent Items.
    async fn send_draft(&self, user_id: &str, draft_id: &str) -> Result<()>;

    /// Compose and send a new message from `user_id`.
    async fn send_new_mail(&self, user_id: &str, mail: &OutgoingMail) -> Result<()>;
}
