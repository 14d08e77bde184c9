mod app_state;
mod refresh_bus;
mod secret_manager;
mod session_manager;
mod session_store;

pub use app_state::AppState;
pub use refresh_bus::{RefreshBus, RefreshRequest};
pub use secret_manager::KeyringSessionStore;
pub use session_manager::SessionManager;
pub use session_store::{
    FileSessionStore, MemorySessionStore, SessionStore, StoreError, KEY_AUTH_TOKEN,
    KEY_CURRENT_USER,
};
