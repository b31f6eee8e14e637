use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    pub name: String,
    pub password: String,
    pub birthdate: String,
}

impl LoginForm {
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.password.is_empty() && !self.birthdate.is_empty()
    }
}

/// How the login call went. The app moves on to the dashboard either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoginOutcome {
    /// A field was blank, nothing was sent.
    Incomplete,
    Accepted { body: serde_json::Value },
    Rejected { reason: String },
}

impl LoginOutcome {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            LoginOutcome::Incomplete => None,
            LoginOutcome::Accepted { .. } => Some("Login successful!"),
            LoginOutcome::Rejected { .. } => Some("Login failed. Please check your credentials."),
        }
    }
}
