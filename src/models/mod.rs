mod chat;
mod submission;
mod event;
mod login;
mod glossary;

pub use chat::*;
pub use submission::*;
pub use event::*;
pub use login::*;
pub use glossary::*;
