//! Session lifecycle: bootstrap, login, logout, readiness.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use quire_auth::{Gate, Session, gate};
use quire_core::{Credentials, ProfilePatch, RegistrationForm};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::identity::{IdentityResolver, resolver_for};
use crate::resources::{accounts, profile};
use crate::token_store::TokenStore;

const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

/// Owner of the current [`Session`].
///
/// Share it behind an `Arc`; consumers read snapshots and wait on readiness
/// instead of inspecting tokens themselves. Lifecycle operations (bootstrap,
/// login, logout, register, profile update) are serialized: a second call
/// waits for the first to finish.
pub struct SessionManager {
    client: ApiClient,
    resolver: Arc<dyn IdentityResolver>,
    session: RwLock<Session>,
    ready: watch::Sender<bool>,
    lifecycle: Mutex<()>,
}

impl SessionManager {
    pub fn new(client: ApiClient, resolver: Arc<dyn IdentityResolver>) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            client,
            resolver,
            session: RwLock::new(Session::Anonymous),
            ready,
            lifecycle: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        let client = ApiClient::new(config, tokens)?;
        Ok(Self::new(client, resolver_for(config.identity_source)))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Whether the authentication state has been decided.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Readiness updates; the value only ever moves from `false` to `true`.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// Resolve once the authentication state has been decided.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Guard decision for a page that needs an authenticated user.
    pub async fn gate(&self) -> Gate {
        let ready = self.is_ready();
        let session = self.session.read().await;
        gate(&session, ready)
    }

    /// Decide the session from stored credentials. Run once at startup.
    ///
    /// Never fails: unusable credentials are cleared and the session ends up
    /// anonymous. Readiness is set only after the decision is made.
    pub async fn bootstrap(&self) -> Session {
        let _guard = self.lifecycle.lock().await;

        let tokens = self.client.token_store();
        if tokens.is_empty() {
            tracing::info!("no stored credentials; starting anonymous");
            return self.settle(Session::Anonymous).await;
        }

        match self.resolver.resolve(&self.client).await {
            Ok(session) => {
                tracing::info!(username = ?session.username(), "session restored");
                self.settle(session).await
            }
            Err(err) => {
                tracing::info!("stored credentials rejected, starting anonymous: {err}");
                tokens.clear();
                self.settle(Session::Anonymous).await
            }
        }
    }

    /// Exchange credentials for tokens and resolve the new identity.
    ///
    /// Rejected credentials leave the token store untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        let _guard = self.lifecycle.lock().await;
        self.login_locked(credentials).await
    }

    async fn login_locked(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        let pair = accounts::obtain_token_pair(&self.client, credentials).await?;

        let tokens = self.client.token_store();
        tokens.set(pair.access, pair.refresh);

        match self.resolver.resolve(&self.client).await {
            Ok(session) => {
                tracing::info!(username = %credentials.username, "logged in");
                Ok(self.settle(session).await)
            }
            Err(err) => {
                tracing::warn!("login succeeded but identity could not be resolved: {err}");
                tokens.clear();
                self.settle(Session::Anonymous).await;
                Err(err)
            }
        }
    }

    /// Forget the credentials. Always succeeds.
    pub async fn logout(&self) {
        let _guard = self.lifecycle.lock().await;
        self.client.token_store().clear();
        self.settle(Session::Anonymous).await;
        tracing::info!("logged out");
    }

    /// Create an account, then log into it.
    ///
    /// Form problems are reported before any request is made.
    pub async fn register(&self, form: &RegistrationForm) -> Result<Session, ClientError> {
        let credentials = form.validate()?;

        let _guard = self.lifecycle.lock().await;
        accounts::register(&self.client, &credentials)
            .await
            .map_err(|err| match err {
                ClientError::Api { status, message } => ClientError::Api {
                    status,
                    message: Some(message.unwrap_or_else(|| REGISTRATION_FAILED.to_string())),
                },
                other => other,
            })?;

        tracing::info!(username = %credentials.username, "account registered");
        self.login_locked(&credentials).await
    }

    /// `PATCH /me/` and adopt the returned profile as the new session.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Session, ClientError> {
        let _guard = self.lifecycle.lock().await;

        match profile::update_me(&self.client, patch).await {
            Ok(me) => Ok(self.settle(Session::from(me)).await),
            Err(err) => {
                self.forget_locked(&err).await;
                Err(err)
            }
        }
    }

    /// Drop the session when a call failed because the credentials are gone.
    ///
    /// Useful after any resource call: once the client has cleared the
    /// tokens the user is logged out, whatever the session still says.
    ///
    /// Waits for any lifecycle operation in flight, so a login that lands
    /// first is not undone.
    pub async fn forget_if_signed_out(&self, err: &ClientError) {
        let _guard = self.lifecycle.lock().await;
        self.forget_locked(err).await;
    }

    async fn forget_locked(&self, err: &ClientError) {
        if err.is_auth_failure() && self.client.token_store().is_empty() {
            tracing::info!("credentials were revoked; resetting session");
            self.settle(Session::Anonymous).await;
        }
    }

    /// Replace the session wholesale, then mark the state as decided.
    async fn settle(&self, session: Session) -> Session {
        *self.session.write().await = session.clone();
        self.ready.send_if_modified(|ready| {
            let changed = !*ready;
            *ready = true;
            changed
        });
        session
    }
}
