use crate::entries::EntryStore;
use crate::session::SessionStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<SessionStore>>,
    pub entries: Arc<Mutex<EntryStore>>,
}

impl AppState {
    pub fn new(session: SessionStore, entries: EntryStore) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            entries: Arc::new(Mutex::new(entries)),
        }
    }
}
