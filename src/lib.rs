//! Microsoft Graph mailbox client
//!
//! Lists inbox summaries, sends new mail and replies to existing mail
//! through the Graph REST API using app-only client credentials. On top
//! of that, [`BulkReplier`] sends the same reply to many messages with a
//! randomized, human-looking delay between sends (mailbox warm-up).
//!
//! The orchestration code only depends on the [`MailboxApi`] trait;
//! [`GraphClient`] is the network implementation.

mod auth;
mod client;
mod compose;
mod config;
mod error;
mod folder;
mod mailbox;
mod message;
mod pacing;
mod reply;
mod warmup;
mod wire;

pub use client::GraphClient;
pub use compose::{InlineImage, MessageTemplate, compose};
pub use config::GraphConfig;
pub use error::{Error, ReplyStep, Result};
pub use folder::Folder;
pub use mailbox::MailboxApi;
pub use message::{
    ComposedMessage, InboxSummaryEntry, InlineAttachment, MessageContext, OutgoingMail, Recipient,
    ReplyTarget,
};
pub use pacing::{NoSleep, Pacer, PacingPolicy, Sleeper, TokioSleeper};
pub use reply::{ReplyState, ReplyWorkflow, reply_to_message};
pub use tokio_util::sync::CancellationToken;
pub use warmup::{BulkReplier, FailedReply, FailurePolicy, RunPhase, RunReport, SentReply};
