use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::{AiMessagePayload, AppEvent, ChatMessage, EventKind, Submission, SubmissionStatus};
use crate::services::chat_gateway::ChatGateway;
use crate::services::conversation::Conversation;
use crate::services::notifier::{EventBus, Subscription};
use crate::{Error, Result};

pub const CHAT_GREETING: &str = "👋 Hi! I'm your medical AI assistant. Feel free to ask any \
health-related questions or upload medical documents for review.";

/// The chat panel: one conversation, fed by the user and by `ai-message` events.
///
/// Events that carry the dashboard's reply are recorded directly. Events
/// without one, or that arrive while a request is outstanding, wait in a
/// queue until [`ChatView::process_pending`] runs.
pub struct ChatView {
    conversation: Arc<Conversation>,
    gateway: ChatGateway,
    pending: Arc<Mutex<VecDeque<AiMessagePayload>>>,
    _subscription: Subscription,
}

fn queue(pending: &Mutex<VecDeque<AiMessagePayload>>) -> MutexGuard<'_, VecDeque<AiMessagePayload>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn payload_submission(payload: &AiMessagePayload) -> Submission {
    Submission {
        message: payload.message.clone(),
        file: payload.file.clone(),
        simplify: payload.is_eli5,
    }
}

impl ChatView {
    /// Create the view and start listening on `bus`. Unmounting (drop) stops
    /// listening and cancels any outstanding request.
    pub fn mount(bus: &EventBus, gateway: ChatGateway) -> Self {
        let conversation = Arc::new(Conversation::new());
        let pending = Arc::new(Mutex::new(VecDeque::new()));
        let inbox = pending.clone();

        let target = conversation.clone();
        let subscription = bus.subscribe(EventKind::AiMessage, move |event| {
            let AppEvent::AiMessage(payload) = event else {
                return;
            };
            if payload.message.is_empty() {
                return;
            }

            let mut waiting = queue(&inbox);
            // Keep arrival order behind anything already queued.
            let Some(reply) = payload.reply.clone().filter(|_| waiting.is_empty()) else {
                waiting.push_back(payload.clone());
                return;
            };
            drop(waiting);
            match target.record_exchange(&payload_submission(payload), reply) {
                Ok(_) => tracing::debug!("dashboard exchange recorded in chat"),
                Err(Error::Busy) => {
                    tracing::debug!("chat busy, dashboard exchange queued");
                    queue(&inbox).push_back(payload.clone());
                }
                Err(e) => tracing::debug!(error = %e, "dashboard exchange dropped"),
            }
        });

        Self {
            conversation,
            gateway,
            pending,
            _subscription: subscription,
        }
    }

    pub async fn submit(&self, submission: Submission) -> Result<ChatMessage> {
        self.conversation.submit(&self.gateway, submission).await
    }

    /// Handle queued `ai-message` payloads in arrival order. Payloads with a
    /// known reply are recorded; the rest are sent once through the gateway.
    ///
    /// A payload leaves the queue only once it is handled. If the conversation
    /// is busy or cancelled it stays at the front and that error is returned.
    pub async fn process_pending(&self) -> Result<usize> {
        let mut handled = 0;
        loop {
            let Some(payload) = queue(&self.pending).pop_front() else {
                return Ok(handled);
            };

            let submission = payload_submission(&payload);
            let result = match payload.reply.clone() {
                Some(reply) => self.conversation.record_exchange(&submission, reply),
                None => self.submit(submission).await,
            };
            if let Err(e) = result {
                tracing::debug!(error = %e, "queued exchange left for later");
                queue(&self.pending).push_front(payload);
                return Err(e);
            }
            handled += 1;
        }
    }

    /// Number of `ai-message` payloads waiting for [`ChatView::process_pending`].
    pub fn pending_len(&self) -> usize {
        queue(&self.pending).len()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.conversation.messages()
    }

    /// The greeting shown while nothing has been said yet.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.conversation.is_empty().then_some(CHAT_GREETING)
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.conversation.status()
    }
}

impl Drop for ChatView {
    fn drop(&mut self) {
        self.conversation.cancel();
    }
}
