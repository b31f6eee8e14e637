use reqwest::Client;

use crate::models::{LoginForm, LoginOutcome};
use crate::{Error, Result};

// ============================================================================
// LOGIN
// ============================================================================

/// POST the credentials as JSON. Any 2xx counts as accepted.
///
/// Transport problems and non-success statuses come back as
/// [`LoginOutcome::Rejected`]; the caller moves on regardless.
pub async fn login(client: &Client, endpoint: &str, form: &LoginForm) -> LoginOutcome {
    if !form.is_complete() {
        tracing::debug!("login form incomplete, not sending");
        return LoginOutcome::Incomplete;
    }

    match send_login(client, endpoint, form).await {
        Ok(body) => {
            tracing::info!(name = %form.name, "login accepted");
            LoginOutcome::Accepted { body }
        }
        Err(e) => {
            tracing::warn!(error = %e, "login rejected");
            LoginOutcome::Rejected {
                reason: e.to_string(),
            }
        }
    }
}

async fn send_login(client: &Client, endpoint: &str, form: &LoginForm) -> Result<serde_json::Value> {
    let response = client.post(endpoint).json(form).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::RequestFailed { status });
    }

    let body = response.bytes().await?;
    if body.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(&body).map_err(|e| Error::MalformedResponse(e.to_string()))
}
