mod config;
mod dashboard;
mod chat;
mod auth;
mod glossary;

pub use config::*;
pub use dashboard::*;
pub use chat::*;
pub use auth::*;
pub use glossary::*;
