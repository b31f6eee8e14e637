use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::models::{
    AiMessagePayload, AppEvent, FileAttachment, ReplyOutcome, Submission, SubmissionStatus,
};
use crate::services::chat_gateway::ChatGateway;
use crate::services::conversation::EMPTY_REPLY_FALLBACK;
use crate::services::notifier::EventBus;
use crate::{Error, Result};

pub const DASHBOARD_FAILURE_ALERT: &str = "Something went wrong while sending your question.";

/// What the dashboard shows after a question settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "camelCase")]
pub enum DashboardNotice {
    /// Inline answer under the input box.
    Answer(String),
    /// Modal alert; nothing is forwarded to the chat view.
    Alert(String),
}

#[derive(Debug, Default)]
struct DashboardState {
    status: SubmissionStatus,
    last_answer: Option<String>,
}

/// Frees the dashboard's slot if a question is abandoned before it settles.
struct Asking<'a> {
    view: &'a DashboardView,
}

impl Drop for Asking<'_> {
    fn drop(&mut self) {
        let mut state = self.view.lock();
        if state.status == SubmissionStatus::Submitting {
            state.status = SubmissionStatus::Idle;
        }
    }
}

/// The home screen's quick-question box.
///
/// A successful answer is shown inline and handed to the chat view through
/// an `ai-message` event carrying the reply, so the backend is asked once.
pub struct DashboardView {
    gateway: ChatGateway,
    bus: EventBus,
    simplify: AtomicBool,
    state: Mutex<DashboardState>,
}

impl DashboardView {
    pub fn new(gateway: ChatGateway, bus: EventBus) -> Self {
        Self {
            gateway,
            bus,
            simplify: AtomicBool::new(false),
            state: Mutex::new(DashboardState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_simplify(&self, simplify: bool) {
        self.simplify.store(simplify, Ordering::Relaxed);
    }

    pub fn simplify(&self) -> bool {
        self.simplify.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> SubmissionStatus {
        self.lock().status
    }

    pub fn is_loading(&self) -> bool {
        self.status() == SubmissionStatus::Submitting
    }

    pub fn last_answer(&self) -> Option<String> {
        self.lock().last_answer.clone()
    }

    /// Ask a question. Only [`Error::Busy`] is returned as an error; backend
    /// failures become [`DashboardNotice::Alert`].
    pub async fn ask(&self, message: &str, file: Option<FileAttachment>) -> Result<DashboardNotice> {
        {
            let mut state = self.lock();
            if state.status == SubmissionStatus::Submitting {
                return Err(Error::Busy);
            }
            state.status = SubmissionStatus::Submitting;
            state.last_answer = None;
        }
        let _slot = Asking { view: self };

        let submission = Submission {
            message: message.to_string(),
            file,
            simplify: self.simplify(),
        };

        match self.gateway.submit(&submission).await {
            Ok(reply) => {
                let answer = match &reply {
                    ReplyOutcome::Text(text) => text.clone(),
                    ReplyOutcome::Empty => EMPTY_REPLY_FALLBACK.to_string(),
                };
                {
                    let mut state = self.lock();
                    state.status = SubmissionStatus::Succeeded;
                    state.last_answer = Some(answer.clone());
                }

                self.bus.emit(AppEvent::AiMessage(AiMessagePayload {
                    message: submission.message,
                    file: submission.file,
                    is_eli5: submission.simplify,
                    reply: Some(reply),
                }));
                Ok(DashboardNotice::Answer(answer))
            }
            Err(e) => {
                tracing::warn!(error = %e, "dashboard question failed");
                self.lock().status = SubmissionStatus::Failed;
                Ok(DashboardNotice::Alert(DASHBOARD_FAILURE_ALERT.to_string()))
            }
        }
    }

    /// Send a picked file with a generated caption.
    pub async fn upload(&self, file: FileAttachment) -> Result<DashboardNotice> {
        let message = format!("Uploaded file: {}", file.name);
        self.ask(&message, Some(file)).await
    }

    /// "Continue the conversation": ask the shell to show the chat view.
    pub fn continue_conversation(&self) -> usize {
        self.bus.emit(AppEvent::AiNavigate)
    }
}
