mod manager;
mod store;

pub use manager::{SessionManager, SessionState};
pub use store::{
    FileStorage, KeyValueStorage, MemoryStorage, Session, SessionStore, AUTH_TOKEN_KEY,
    HAS_SEEN_INTRO_KEY, THEME_KEY, USER_KEY,
};
