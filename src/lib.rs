mod api;
mod app;
pub mod cli;
mod commands;
pub mod error;
mod files;
pub mod formatters;
mod json_store;
mod logging;
mod redact;
mod refresh;
mod settings;
mod state;
pub mod types;
mod validation;

pub use api::{ApiClient, ApiError, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use files::FileService;
pub use refresh::{spawn_refresh_loop, RefreshTask};
pub use state::{
  FileSessionStore, KeyringSessionStore, MemorySessionStore, RefreshBus, SessionManager,
  SessionStore, StoreError, KEY_AUTH_TOKEN, KEY_CURRENT_USER,
};

pub fn run() {
  app::run();
}
