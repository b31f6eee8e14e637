pub mod commands;
pub mod models;
pub mod services;

mod error;

pub use error::{Error, Result};

use std::sync::{Arc, Mutex, PoisonError};

use commands::{ChatView, DashboardView, LoginView};
use models::{EventKind, LoginForm, LoginOutcome};
use services::chat_gateway::ChatGateway;
use services::config_service::EffectiveConfig;
use services::notifier::{EventBus, Subscription};

/// Which view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
    Chat,
}

/// The app shell: owns the views, the shared bus and the current screen.
pub struct App {
    bus: EventBus,
    screen: Arc<Mutex<Screen>>,
    login: LoginView,
    dashboard: DashboardView,
    chat: ChatView,
    _navigation: Subscription,
}

impl App {
    pub fn new(config: &EffectiveConfig, bus: EventBus) -> Result<Self> {
        let gateway = ChatGateway::new(&config.ai_endpoint, config.request_timeout)?;
        let http = reqwest::Client::new();

        let screen = Arc::new(Mutex::new(Screen::Login));
        let target = screen.clone();
        let navigation = bus.subscribe(EventKind::AiNavigate, move |_| {
            *target.lock().unwrap_or_else(PoisonError::into_inner) = Screen::Chat;
        });

        Ok(Self {
            login: LoginView::new(http, &config.login_endpoint),
            dashboard: DashboardView::new(gateway.clone(), bus.clone()),
            chat: ChatView::mount(&bus, gateway),
            bus,
            screen,
            _navigation: navigation,
        })
    }

    pub fn screen(&self) -> Screen {
        *self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn navigate(&self, screen: Screen) {
        *self.screen.lock().unwrap_or_else(PoisonError::into_inner) = screen;
    }

    /// Sign in and move to the dashboard, whatever the outcome.
    pub async fn login(&self, form: &LoginForm) -> LoginOutcome {
        let outcome = self.login.sign_in(form).await;
        self.navigate(Screen::Home);
        outcome
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn dashboard(&self) -> &DashboardView {
        &self.dashboard
    }

    pub fn chat(&self) -> &ChatView {
        &self.chat
    }
}
