//! Error types for outlook-client

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A step of the create-draft -> update -> send reply sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyStep {
    CreateDraft,
    UpdateDraft,
    Send,
}

impl ReplyStep {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateDraft => "create-draft",
            Self::UpdateDraft => "update-draft",
            Self::Send => "send",
        }
    }
}

impl fmt::Display for ReplyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Graph API error ({status}): {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to read attachment {}: {source}", path.display())]
    AttachmentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reply to {message_id} failed at {step}: {source}")]
    ReplyWorkflow {
        message_id: String,
        step: ReplyStep,
        #[source]
        source: Box<Error>,
    },

    #[error("Reply already failed at {0}")]
    AlreadyFailed(ReplyStep),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pacing policy: {0}")]
    InvalidPacing(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure came from the remote mailbox API or its
    /// token endpoint (auth, rate limiting, not-found, transport).
    #[must_use]
    pub fn is_remote(&self) -> bool {
        match self {
            Self::Api { .. } | Self::Http(_) | Self::Auth(_) => true,
            Self::ReplyWorkflow { source, .. } => source.is_remote(),
            _ => false,
        }
    }

    /// The reply step that failed, if this is a workflow error.
    #[must_use]
    pub const fn failed_step(&self) -> Option<ReplyStep> {
        match self {
            Self::ReplyWorkflow { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
