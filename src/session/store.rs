use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::dto::User;

/// Storage key for the bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";
/// Storage key for the serialized user snapshot.
pub const USER_KEY: &str = "user";
/// Storage key for the UI theme preference.
pub const THEME_KEY: &str = "userThemePreference";
/// Storage key for the first-launch intro flag.
pub const HAS_SEEN_INTRO_KEY: &str = "hasSeenIntro";

/// The authenticated session as persisted between launches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Durable string key-value storage.
///
/// Implementations only need dumb get/set/remove; the pairing rules for the
/// session live in [`SessionStore`]. Swap in [`MemoryStorage`] for tests.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// JSON file on disk, one object holding all keys.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_map(&self) -> anyhow::Result<HashMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("corrupt storage file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&self.path, raw)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// In-process storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    cells: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.cells.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.cells
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.cells.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Typed view over the raw storage.
///
/// Enforces the session invariant: `auth_token` and `user` are written and
/// removed together, never one without the other. A half-present pair is
/// treated as no session and cleaned up on read.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Read just the token, for outbound request decoration.
    pub async fn token(&self) -> Option<String> {
        match self.storage.get(AUTH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "could not read token from storage");
                None
            }
        }
    }

    /// Read the full persisted session, if both halves are present.
    pub async fn session(&self) -> Option<Session> {
        let token = self.storage.get(AUTH_TOKEN_KEY).await;
        let user = self.storage.get(USER_KEY).await;
        match (token, user) {
            (Ok(Some(token)), Ok(Some(raw_user))) => {
                match serde_json::from_str::<User>(&raw_user) {
                    Ok(user) => Some(Session { token, user }),
                    Err(e) => {
                        warn!(error = %e, "stored user snapshot is unreadable, clearing session");
                        let _ = self.clear().await;
                        None
                    }
                }
            }
            (Ok(None), Ok(None)) => None,
            (Ok(_), Ok(_)) => {
                warn!("storage held only half a session, clearing both keys");
                let _ = self.clear().await;
                None
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "could not read session from storage");
                None
            }
        }
    }

    pub async fn save(&self, session: &Session) -> anyhow::Result<()> {
        let raw_user = serde_json::to_string(&session.user)?;
        self.storage.set(AUTH_TOKEN_KEY, &session.token).await?;
        self.storage.set(USER_KEY, &raw_user).await?;
        debug!(user_id = %session.user.id, "session persisted");
        Ok(())
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.storage.remove(AUTH_TOKEN_KEY).await?;
        self.storage.remove(USER_KEY).await?;
        debug!("session cleared");
        Ok(())
    }

    pub async fn theme_preference(&self) -> Option<String> {
        self.storage.get(THEME_KEY).await.ok().flatten()
    }

    pub async fn set_theme_preference(&self, theme: &str) -> anyhow::Result<()> {
        self.storage.set(THEME_KEY, theme).await
    }

    pub async fn has_seen_intro(&self) -> bool {
        matches!(
            self.storage.get(HAS_SEEN_INTRO_KEY).await,
            Ok(Some(v)) if v == "true"
        )
    }

    pub async fn set_has_seen_intro(&self, seen: bool) -> anyhow::Result<()> {
        self.storage
            .set(HAS_SEEN_INTRO_KEY, if seen { "true" } else { "false" })
            .await
    }
}
