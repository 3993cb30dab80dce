use crate::errors::StoreError;
use crate::models::{PendingSignup, User};
use crate::storage::{LocalStorage, SIGNUP_KEY, StorageEvent, StorageEvents, USER_KEY, decode};
use chrono::Utc;
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{info, warn};

/// Signs in without a prior signup and without checking the password.
pub const DEMO_EMAIL: &str = "demo@wellness.com";
const DEMO_USER_ID: &str = "1";

/// The current identity plus the single pending signup record.
pub struct SessionStore {
    storage: LocalStorage,
    user: Option<User>,
}

impl SessionStore {
    pub async fn load(storage: LocalStorage) -> Self {
        let user = match storage.read_json::<User>(USER_KEY).await {
            Ok(user) => user,
            Err(err) => {
                warn!("ignoring stored identity: {err}");
                None
            }
        };
        Self { storage, user }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, StoreError> {
        let pending = self.storage.read_json::<PendingSignup>(SIGNUP_KEY).await?;
        let user = match pending {
            Some(record) if record.email == email && record.password == password => {
                record.to_user()
            }
            _ if email.eq_ignore_ascii_case(DEMO_EMAIL) => demo_user(email),
            _ => {
                info!(email, "login rejected");
                return Err(StoreError::AccountNotFound);
            }
        };

        self.storage.write_json(USER_KEY, &user).await?;
        info!(user_id = %user.id, "logged in");
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Stores the credentials as the pending signup, replacing any earlier
    /// one. The session itself is left unchanged.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<User, StoreError> {
        if let Ok(Some(previous)) = self.storage.read_json::<PendingSignup>(SIGNUP_KEY).await {
            if previous.email != email {
                warn!(replaced = %previous.email, "pending signup overwritten");
            }
        }

        let record = PendingSignup {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            id: Utc::now().timestamp_millis().to_string(),
        };
        self.storage.write_json(SIGNUP_KEY, &record).await?;
        info!(user_id = %record.id, "signed up");
        Ok(record.to_user())
    }

    pub async fn logout(&mut self) -> Result<(), StoreError> {
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "logged out");
        }
        self.storage.remove_item(USER_KEY).await
    }

    pub async fn check_user_exists(&self, email: &str) -> Result<bool, StoreError> {
        let pending = self.storage.read_json::<PendingSignup>(SIGNUP_KEY).await?;
        Ok(pending.is_some_and(|record| record.email == email))
    }

    /// Applies an identity change written by another context.
    pub fn apply_storage_event(&mut self, event: &StorageEvent) {
        if event.key != USER_KEY {
            return;
        }
        self.user = match event.new_value.as_deref() {
            Some(raw) => match decode::<User>(USER_KEY, raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!("ignoring synced identity: {err}");
                    None
                }
            },
            None => None,
        };
        info!(
            user_id = self.user.as_ref().map(|user| user.id.as_str()),
            "session synced"
        );
    }
}

fn demo_user(email: &str) -> User {
    let name = email.split('@').next().unwrap_or_default();
    User {
        id: DEMO_USER_ID.to_string(),
        email: email.to_string(),
        name: name.to_string(),
    }
}

/// Keeps `session` in step with identity writes from other contexts.
pub fn spawn_session_sync(session: Arc<Mutex<SessionStore>>, mut events: StorageEvents) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            session.lock().await.apply_storage_event(&event);
        }
    })
}
