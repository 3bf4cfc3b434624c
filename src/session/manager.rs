use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

use crate::auth::dto::{AuthPayload, ProfileUpdate, RegisterRequest, User, UserPayload};
use crate::auth::AuthService;
use crate::response::{Ack, ApiOutcome};
use crate::session::store::{Session, SessionStore};

const PERSIST_FAILED_MESSAGE: &str = "Failed to persist session";

/// Resolved authentication state. Until [`SessionManager::bootstrap`]
/// completes, the state of a fresh process is indeterminate.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Authenticated(User),
    Unauthenticated,
}

/// Coordinates the session store and the auth facade so that every call
/// which produces a token or user snapshot also persists it.
///
/// This is the only writer of the session store; the HTTP core reads the
/// token and clears on 401, but never writes.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    auth: AuthService,
}

impl SessionManager {
    pub fn new(store: SessionStore, auth: AuthService) -> Self {
        Self { store, auth }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Resolve the persisted session against the backend at startup.
    ///
    /// A missing session short-circuits to `Unauthenticated`; a present one
    /// is verified remotely, and any verification failure (including a dead
    /// network) clears it.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> SessionState {
        let Some(saved) = self.store.session().await else {
            debug!("no persisted session");
            return SessionState::Unauthenticated;
        };

        let outcome = self.auth.verify_token().await;
        match outcome.payload {
            Some(UserPayload { user }) if outcome.success => {
                if let Err(e) = self
                    .store
                    .save(&Session {
                        token: saved.token,
                        user: user.clone(),
                    })
                    .await
                {
                    warn!(error = %e, "could not refresh verified session");
                }
                info!(user_id = %user.id, "session restored");
                SessionState::Authenticated(user)
            }
            _ => {
                warn!(message = %outcome.message, "persisted session did not verify, clearing");
                if let Err(e) = self.store.clear().await {
                    warn!(error = %e, "could not clear stale session");
                }
                SessionState::Unauthenticated
            }
        }
    }

    pub async fn login(&self, identifier: &str, password: &str) -> ApiOutcome<AuthPayload> {
        let outcome = self.auth.login(identifier, password).await;
        self.persist_auth(outcome).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiOutcome<AuthPayload> {
        let outcome = self.auth.register(request).await;
        self.persist_auth(outcome).await
    }

    /// Clears local state no matter what the backend said.
    pub async fn logout(&self) -> ApiOutcome<Ack> {
        let outcome = self.auth.logout().await;
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "could not clear session on logout");
        }
        outcome
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiOutcome<UserPayload> {
        let outcome = self.auth.update_profile(update).await;
        self.refresh_snapshot(&outcome).await;
        outcome
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> ApiOutcome<Ack> {
        self.auth.change_password(old_password, new_password).await
    }

    pub async fn update_avatar(&self, filename: &str, bytes: Bytes) -> ApiOutcome<UserPayload> {
        let outcome = self.auth.update_avatar(filename, bytes).await;
        self.refresh_snapshot(&outcome).await;
        outcome
    }

    pub async fn delete_avatar(&self) -> ApiOutcome<UserPayload> {
        let outcome = self.auth.delete_avatar().await;
        self.refresh_snapshot(&outcome).await;
        outcome
    }

    /// Persist token and user together after login or register.
    async fn persist_auth(&self, outcome: ApiOutcome<AuthPayload>) -> ApiOutcome<AuthPayload> {
        let Some(payload) = &outcome.payload else {
            return outcome;
        };
        if !outcome.success {
            return outcome;
        }
        let session = Session {
            token: payload.token.clone(),
            user: payload.user.clone(),
        };
        match self.store.save(&session).await {
            Ok(()) => {
                info!(user_id = %session.user.id, "authenticated");
                outcome
            }
            Err(e) => {
                warn!(error = %e, "session persistence failed after auth");
                ApiOutcome::failure(PERSIST_FAILED_MESSAGE)
            }
        }
    }

    /// Refresh the stored user snapshot after a successful profile or avatar
    /// mutation. Skipped when no session is stored (e.g. a logout raced the
    /// call); last write wins between concurrent mutations.
    async fn refresh_snapshot(&self, outcome: &ApiOutcome<UserPayload>) {
        if !outcome.success {
            return;
        }
        let Some(UserPayload { user }) = &outcome.payload else {
            return;
        };
        let Some(saved) = self.store.session().await else {
            debug!("no stored session to refresh");
            return;
        };
        let session = Session {
            token: saved.token,
            user: user.clone(),
        };
        if let Err(e) = self.store.save(&session).await {
            warn!(error = %e, "could not refresh user snapshot");
        }
    }
}
