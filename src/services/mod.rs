pub mod auth_service;
pub mod chat_gateway;
pub mod config_service;
pub mod conversation;
pub mod file_service;
pub mod glossary_service;
pub mod key_service;
pub mod llm_client;
pub mod notifier;
