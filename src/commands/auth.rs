use reqwest::Client;

use crate::models::{LoginForm, LoginOutcome};
use crate::services::auth_service;

/// The sign-in screen. It leaves for the dashboard whatever the login call
/// says; the outcome is only reported.
pub struct LoginView {
    client: Client,
    endpoint: String,
}

impl LoginView {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    pub async fn sign_in(&self, form: &LoginForm) -> LoginOutcome {
        auth_service::login(&self.client, &self.endpoint, form).await
    }
}
