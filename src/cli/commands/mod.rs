mod ask;
mod chat;
mod config;
mod db;
mod runtime;
mod serve;
mod status;

pub use ask::AskArgs;
pub use chat::ChatArgs;
pub use config::ConfigCommand;
pub use db::{DbAction, DbArgs};
pub use serve::ServeArgs;

pub use ask::handle_ask;
pub use chat::handle_chat;
pub use config::handle_config;
pub use db::handle_db;
pub use serve::{handle_serve, shutdown_signal};
pub use status::handle_status;
