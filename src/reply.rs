//! Single-reply workflow
//!
//! Replying is three dependent remote calls: create a reply draft, overwrite
//! its body and attachments, send it. [`ReplyWorkflow`] tracks how far one
//! reply got, so a failure reports the exact step and no later step runs.
//! Nothing is rolled back; a draft created before a failure stays in the
//! mailbox's Drafts folder.

use crate::error::{Error, ReplyStep, Result};
use crate::mailbox::MailboxApi;
use crate::message::ComposedMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Progress of one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyState {
    Pending,
    Created { draft_id: String },
    Updated { draft_id: String },
    Sent { draft_id: String },
    Failed { step: ReplyStep },
}

impl ReplyState {
    /// The step that moves this state forward, if any.
    #[must_use]
    pub const fn next_step(&self) -> Option<ReplyStep> {
        match self {
            Self::Pending => Some(ReplyStep::CreateDraft),
            Self::Created { .. } => Some(ReplyStep::UpdateDraft),
            Self::Updated { .. } => Some(ReplyStep::Send),
            Self::Sent { .. } | Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.next_step().is_none()
    }
}

/// Drives one reply through create-draft -> update -> send.
pub struct ReplyWorkflow<'a, M: MailboxApi + ?Sized> {
    mailbox: &'a M,
    user_id: &'a str,
    message_id: &'a str,
    state: ReplyState,
}

impl<'a, M: MailboxApi + ?Sized> ReplyWorkflow<'a, M> {
    #[must_use]
    pub const fn new(mailbox: &'a M, user_id: &'a str, message_id: &'a str) -> Self {
        Self {
            mailbox,
            user_id,
            message_id,
            state: ReplyState::Pending,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ReplyState {
        &self.state
    }

    /// Perform the next step.
    ///
    /// Cancellation is checked before the remote call; a cancelled step
    /// leaves the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `cancel` fired, or
    /// [`Error::ReplyWorkflow`] naming the failed step. Calling this on a
    /// terminal state is a no-op.
    pub async fn advance(
        &mut self,
        message: &ComposedMessage,
        cancel: &CancellationToken,
    ) -> Result<&ReplyState> {
        let Some(step) = self.state.next_step() else {
            return Ok(&self.state);
        };
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match self.perform(message).await {
            Ok(next) => {
                debug!("Reply to {}: {} ok", self.message_id, step);
                self.state = next;
                Ok(&self.state)
            }
            Err(source) => {
                warn!("Reply to {} failed at {}: {}", self.message_id, step, source);
                self.state = ReplyState::Failed { step };
                Err(Error::ReplyWorkflow {
                    message_id: self.message_id.to_string(),
                    step,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Advance until sent or failed. Returns the id of the sent draft.
    ///
    /// # Errors
    ///
    /// Same as [`advance`](Self::advance), plus
    /// [`Error::AlreadyFailed`] when run again after a failure.
    pub async fn run(
        &mut self,
        message: &ComposedMessage,
        cancel: &CancellationToken,
    ) -> Result<String> {
        loop {
            match self.advance(message, cancel).await? {
                ReplyState::Sent { draft_id } => return Ok(draft_id.clone()),
                ReplyState::Failed { step } => return Err(Error::AlreadyFailed(*step)),
                _ => {}
            }
        }
    }

    async fn perform(&self, message: &ComposedMessage) -> Result<ReplyState> {
        match &self.state {
            ReplyState::Pending => {
                let draft_id = self
                    .mailbox
                    .create_draft_reply(self.user_id, self.message_id)
                    .await?;
                Ok(ReplyState::Created { draft_id })
            }
            ReplyState::Created { draft_id } => {
                self.mailbox
                    .update_draft(self.user_id, draft_id, message)
                    .await?;
                Ok(ReplyState::Updated {
                    draft_id: draft_id.clone(),
                })
            }
            ReplyState::Updated { draft_id } => {
                self.mailbox.send_draft(self.user_id, draft_id).await?;
                Ok(ReplyState::Sent {
                    draft_id: draft_id.clone(),
                })
            }
            terminal => Ok(terminal.clone()),
        }
    }
}

/// Reply to `message_id` with `message` as one unit. Returns the id of
/// the sent reply.
///
/// # Errors
///
/// Returns [`Error::ReplyWorkflow`] naming the step that failed.
pub async fn reply_to_message<M: MailboxApi + ?Sized>(
    mailbox: &M,
    user_id: &str,
    message_id: &str,
    message: &ComposedMessage,
) -> Result<String> {
    ReplyWorkflow::new(mailbox, user_id, message_id)
        .run(message, &CancellationToken::new())
        .await
}
