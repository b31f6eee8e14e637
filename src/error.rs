use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a response (connect, DNS, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    RequestFailed { status: StatusCode },

    /// The body of a successful response was not the JSON we expected.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A submission is already outstanding for this conversation.
    #[error("a message is already being sent")]
    Busy,

    /// The owning view was torn down before the call settled.
    #[error("submission cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The generation model answered but gave us nothing usable.
    #[error("generation failed: {0}")]
    Generation(String),
}

impl Error {
    /// Failures that the views fold into the "couldn't connect" treatment.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::RequestFailed { .. } | Error::MalformedResponse(_)
        )
    }
}
