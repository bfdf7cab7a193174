//! Bulk reply orchestration ("mailbox warm-up")
//!
//! Replies to a fixed list of targets one after another, waiting a
//! randomized interval between sends. Targets come either from the newest
//! inbox messages or from an explicit list of message ids; both feed the
//! same loop.
//!
//! ```text
//!   Idle -> Fetching -> Replying -> Waiting -> Replying -> ... -> Done
//!              |           |
//!              +-----------+--> Failed
//! ```
//!
//! `Fetching` covers the inbox listing; a run over explicit ids starts at
//! `Replying`. Phase changes are published on a `watch` channel (see
//! [`BulkReplier::subscribe_phase`]) since the run itself borrows the
//! replier mutably.
//!
//! Targets are processed strictly sequentially. The pacing wait is what
//! throttles the outbound send rate, so there is no concurrent fan-out.

use crate::error::{Error, ReplyStep, Result};
use crate::mailbox::MailboxApi;
use crate::message::{ComposedMessage, InboxSummaryEntry, MessageContext, ReplyTarget};
use crate::pacing::{Pacer, Sleeper, TokioSleeper};
use crate::reply::ReplyWorkflow;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What to do when one target's reply fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run and return the error. Remaining targets are skipped.
    #[default]
    Abort,
    /// Record the failure in the report and move on to the next target.
    Continue,
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Fetching,
    Replying,
    Waiting,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentReply {
    pub message_id: String,
    pub reply_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedReply {
    pub message_id: String,
    /// `None` when the failure happened before the reply started, e.g.
    /// while fetching the message for display.
    pub step: Option<ReplyStep>,
    pub error: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub sent: Vec<SentReply>,
    pub failed: Vec<FailedReply>,
    /// Every pacing interval waited, in order.
    pub waits: Vec<Duration>,
}

impl RunReport {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }
}

/// Sends the same reply to many messages with randomized pacing.
///
/// A replier is reusable: each `reply_to_*` call is an independent run
/// with its own target list, drawing delays from the same pacer.
pub struct BulkReplier<'a, M: MailboxApi + ?Sized> {
    mailbox: &'a M,
    pacer: Pacer,
    sleeper: Arc<dyn Sleeper>,
    on_failure: FailurePolicy,
    cancel: CancellationToken,
    phase: watch::Sender<RunPhase>,
}

impl<'a, M: MailboxApi + ?Sized> BulkReplier<'a, M> {
    #[must_use]
    pub fn new(mailbox: &'a M, pacer: Pacer) -> Self {
        Self {
            mailbox,
            pacer,
            sleeper: Arc::new(TokioSleeper),
            on_failure: FailurePolicy::default(),
            cancel: CancellationToken::new(),
            phase: watch::Sender::new(RunPhase::Idle),
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// Token checked before every remote call and raced against every
    /// pacing wait.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Phase of the current or most recent run.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    /// Receiver that sees every phase change while a run holds the
    /// replier mutably.
    #[must_use]
    pub fn subscribe_phase(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    /// Reply to the `count` most recent inbox messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns the listing error, the first reply failure under
    /// [`FailurePolicy::Abort`], or [`Error::Cancelled`].
    pub async fn reply_to_inbox(
        &mut self,
        user_id: &str,
        count: usize,
        message: &ComposedMessage,
    ) -> Result<RunReport> {
        self.set_phase(RunPhase::Fetching);
        let entries = match self.list_targets(user_id, count).await {
            Ok(entries) => entries,
            Err(e) => {
                self.set_phase(RunPhase::Failed);
                return Err(e);
            }
        };

        if entries.len() < count {
            info!(
                "Inbox has {} of the {} requested messages",
                entries.len(),
                count
            );
        }

        let targets = entries.iter().take(count).map(ReplyTarget::from).collect();
        self.run(user_id, targets, message).await
    }

    /// Reply to the given messages in order. Sender and subject of each
    /// are fetched for the progress log before replying. A repeated id is
    /// replied to once, at its first position.
    ///
    /// # Errors
    ///
    /// Same as [`reply_to_inbox`](Self::reply_to_inbox).
    pub async fn reply_to_messages<S: AsRef<str>>(
        &mut self,
        user_id: &str,
        message_ids: &[S],
        message: &ComposedMessage,
    ) -> Result<RunReport> {
        let targets = message_ids
            .iter()
            .map(|id| ReplyTarget::new(id.as_ref()))
            .collect();
        self.run(user_id, targets, message).await
    }

    async fn run(
        &mut self,
        user_id: &str,
        targets: Vec<ReplyTarget>,
        message: &ComposedMessage,
    ) -> Result<RunReport> {
        let targets = unique_targets(targets);
        let total = targets.len();
        let mut report = RunReport::new(total);

        for (index, target) in targets.iter().enumerate() {
            let position = index + 1;
            self.set_phase(RunPhase::Replying);

            match self.reply_one(user_id, target, position, total, message).await {
                Ok(reply_id) => {
                    info!("Reply sent");
                    report.sent.push(SentReply {
                        message_id: target.message_id.clone(),
                        reply_id,
                    });
                }
                Err(Error::Cancelled) => return Err(self.fail_cancelled(&report)),
                Err(e) if self.on_failure == FailurePolicy::Continue => {
                    warn!("Skipping {}: {}", target.message_id, e);
                    report.failed.push(FailedReply {
                        message_id: target.message_id.clone(),
                        step: e.failed_step(),
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    self.set_phase(RunPhase::Failed);
                    error!(
                        "Run aborted at message {}/{} after {} replies: {}",
                        position,
                        total,
                        report.sent.len(),
                        e
                    );
                    return Err(e);
                }
            }

            if position < total {
                let delay = self.pacer.next_delay();
                self.set_phase(RunPhase::Waiting);
                info!("Waiting {} seconds...", delay.as_secs());
                if self.wait(delay).await.is_err() {
                    return Err(self.fail_cancelled(&report));
                }
                report.waits.push(delay);
            }
        }

        self.set_phase(RunPhase::Done);
        info!(
            "All replies processed: {} sent, {} failed",
            report.sent.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn list_targets(&self, user_id: &str, count: usize) -> Result<Vec<InboxSummaryEntry>> {
        self.ensure_live()?;
        self.mailbox.list_inbox(user_id, count).await
    }

    async fn reply_one(
        &self,
        user_id: &str,
        target: &ReplyTarget,
        position: usize,
        total: usize,
        message: &ComposedMessage,
    ) -> Result<String> {
        info!("Message {}/{} - ID: {}", position, total, target.message_id);

        let context = match &target.context {
            Some(context) => context.clone(),
            None => self.fetch_context(user_id, &target.message_id).await?,
        };
        info!("  From: {}", context.sender());
        info!("  Subject: {}", context.subject_line());

        ReplyWorkflow::new(self.mailbox, user_id, &target.message_id)
            .run(message, &self.cancel)
            .await
    }

    async fn fetch_context(&self, user_id: &str, message_id: &str) -> Result<MessageContext> {
        self.ensure_live()?;
        self.mailbox.fetch_message(user_id, message_id).await
    }

    async fn wait(&self, delay: Duration) -> Result<()> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            () = self.sleeper.sleep(delay) => Ok(()),
        }
    }

    fn set_phase(&self, phase: RunPhase) {
        debug!("Run phase: {:?}", phase);
        self.phase.send_replace(phase);
    }

    fn ensure_live(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    fn fail_cancelled(&self, report: &RunReport) -> Error {
        self.set_phase(RunPhase::Failed);
        warn!(
            "Run cancelled after {} of {} replies",
            report.sent.len(),
            report.total
        );
        Error::Cancelled
    }
}

/// Drop repeated message ids, keeping the first occurrence in order.
fn unique_targets(targets: Vec<ReplyTarget>) -> Vec<ReplyTarget> {
    let mut seen = HashSet::new();
    targets
        .into_iter()
        .filter(|target| {
            let first = seen.insert(target.message_id.clone());
            if !first {
                warn!("Skipping repeated message {}", target.message_id);
            }
            first
        })
        .collect()
}
