pub mod app;
pub mod config;
pub mod entries;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use entries::EntryStore;
pub use errors::{AppError, StoreError};
pub use session::{SessionStore, spawn_session_sync};
pub use state::AppState;
pub use storage::LocalStorage;
