use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::Instrument;
use uuid::Uuid;

use crate::models::{ReplyOutcome, Submission};
use crate::{Error, Result};

/// Field the backend puts its answer in.
pub const REPLY_FIELD: &str = "reply";
/// Older dashboard builds read the answer from here; still accepted.
pub const LEGACY_REPLY_FIELD: &str = "response";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Posts user submissions to the AI chat endpoint as multipart forms.
#[derive(Debug, Clone)]
pub struct ChatGateway {
    client: Client,
    endpoint: String,
}

impl ChatGateway {
    /// `timeout` of `None` keeps the transport default.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        url::Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("Invalid AI endpoint '{}': {}", endpoint, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.to_string(),
        })
    }

    /// Send one submission. Exactly one POST, no retry.
    pub async fn submit(&self, submission: &Submission) -> Result<ReplyOutcome> {
        let submission_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "ai_chat_submit",
            %submission_id,
            has_file = submission.file.is_some(),
            simplify = submission.simplify,
        );

        self.post(submission, submission_id).instrument(span).await
    }

    async fn post(&self, submission: &Submission, submission_id: Uuid) -> Result<ReplyOutcome> {
        let form = build_form(submission)?;

        tracing::debug!(endpoint = %self.endpoint, "posting message");
        let response = self
            .client
            .post(&self.endpoint)
            .header(REQUEST_ID_HEADER, submission_id.to_string())
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "ai chat request failed"))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "ai chat endpoint returned an error status");
            return Err(Error::RequestFailed { status });
        }

        let body = response.bytes().await?;
        let outcome = parse_reply(&body)?;
        tracing::debug!(empty = matches!(outcome, ReplyOutcome::Empty), "reply received");
        Ok(outcome)
    }
}

/// `message` always, `file` when attached, `isEli5` only when set.
pub fn build_form(submission: &Submission) -> Result<Form> {
    let mut form = Form::new().text("message", submission.message.clone());

    if let Some(file) = &submission.file {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)?;
        form = form.part("file", part);
    }

    if submission.simplify {
        form = form.text("isEli5", "true");
    }

    Ok(form)
}

/// Decode a 2xx body. Invalid JSON is an error; a missing reply is not.
pub fn parse_reply(body: &[u8]) -> Result<ReplyOutcome> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| Error::MalformedResponse(e.to_string()))?;

    let text = [REPLY_FIELD, LEGACY_REPLY_FIELD]
        .iter()
        .filter_map(|field| value.get(field).and_then(|v| v.as_str()))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string);

    Ok(ReplyOutcome::from_field(text))
}
