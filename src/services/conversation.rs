use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::chat_gateway::ChatGateway;
use crate::models::{
    AttachmentMeta, ChatMessage, MessageId, ReplyOutcome, Role, Submission, SubmissionStatus,
};
use crate::{Error, Result};

pub const EMPTY_REPLY_FALLBACK: &str =
    "Sorry, I couldn't generate a response. Please try again later.";
pub const TRANSPORT_FAILURE_FALLBACK: &str =
    "⚠️ Sorry, something went wrong while connecting to the server. Please try again.";

// ============================================================================
// MESSAGE STORE
// ============================================================================

/// Append-only list of messages. There is no way to edit or remove an entry.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        attachment: Option<AttachmentMeta>,
    ) -> &ChatMessage {
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id: MessageId(self.next_id),
            role,
            content: content.into(),
            attachment,
            timestamp: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ============================================================================
// RESPONSE RENDERER
// ============================================================================

/// Text of the assistant message for a settled gateway call.
pub fn render_outcome(outcome: &Result<ReplyOutcome>) -> String {
    match outcome {
        Ok(ReplyOutcome::Text(text)) => text.clone(),
        Ok(ReplyOutcome::Empty) => EMPTY_REPLY_FALLBACK.to_string(),
        Err(_) => TRANSPORT_FAILURE_FALLBACK.to_string(),
    }
}

// ============================================================================
// CONVERSATION
// ============================================================================

#[derive(Debug, Default)]
struct ConversationState {
    store: MessageStore,
    status: SubmissionStatus,
}

/// Holds the in-flight slot. Dropped while still `Submitting` (the caller
/// abandoned the future, or the call was cancelled) it frees the slot.
struct InFlight<'a> {
    conversation: &'a Conversation,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.conversation.lock();
        if state.status == SubmissionStatus::Submitting {
            state.status = SubmissionStatus::Idle;
            tracing::debug!("in-flight slot released without a reply");
        }
    }
}

/// A message store plus the single in-flight slot that feeds it.
///
/// Only one submission may be outstanding at a time; a second one is
/// rejected with [`Error::Busy`] before anything is appended. Cancelling the
/// conversation (the owning view going away) aborts the outstanding call.
#[derive(Debug, Default)]
pub struct Conversation {
    state: Mutex<ConversationState>,
    cancel: CancellationToken,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().store.messages().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().store.is_empty()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.lock().status
    }

    pub fn is_loading(&self) -> bool {
        self.status() == SubmissionStatus::Submitting
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Claim the in-flight slot and append the user's message.
    fn begin(&self, submission: &Submission) -> Result<InFlight<'_>> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut state = self.lock();
        if state.status == SubmissionStatus::Submitting {
            return Err(Error::Busy);
        }
        state.status = SubmissionStatus::Submitting;
        state.store.append(
            Role::User,
            submission.message.clone(),
            submission.file.as_ref().map(|f| f.meta()),
        );
        Ok(InFlight { conversation: self })
    }

    /// Append the assistant message for a settled call and release the slot.
    fn settle(&self, outcome: &Result<ReplyOutcome>) -> ChatMessage {
        let mut state = self.lock();
        state.status = if outcome.is_ok() {
            SubmissionStatus::Succeeded
        } else {
            SubmissionStatus::Failed
        };
        state
            .store
            .append(Role::Assistant, render_outcome(outcome), None)
            .clone()
    }

    /// Send `submission` through `gateway` and record both sides of the exchange.
    ///
    /// Gateway failures are not returned: they become the transport fallback
    /// message. Only [`Error::Busy`] and [`Error::Cancelled`] reach the caller.
    pub async fn submit(&self, gateway: &ChatGateway, submission: Submission) -> Result<ChatMessage> {
        let _slot = self.begin(&submission)?;

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("submission dropped, conversation cancelled");
                return Err(Error::Cancelled);
            }
            outcome = gateway.submit(&submission) => outcome,
        };

        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "rendering transport fallback");
        }
        Ok(self.settle(&outcome))
    }

    /// Record an exchange whose reply is already known, without a network call.
    pub fn record_exchange(&self, submission: &Submission, reply: ReplyOutcome) -> Result<ChatMessage> {
        let _slot = self.begin(submission)?;
        Ok(self.settle(&Ok(reply)))
    }
}
