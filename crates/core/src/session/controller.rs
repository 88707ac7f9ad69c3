use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::errors::{Error, NetworkError, SessionError};
use crate::models::User;
use crate::net::{AuthContext, HttpRequest, HttpResponse, HttpTransport};
use crate::secrets::SecretStore;

use super::retry::execute_with_retry;
use super::{AuthResponse, Credentials, Session, SessionStatus};

const LOGIN_PATH: &str = "/api/auth/login";
const ME_PATH: &str = "/api/auth/me";

fn secret_error(err: Error) -> SessionError {
    match err {
        Error::Session(err) => err,
        other => SessionError::SecretStore(other.to_string()),
    }
}

/// Owns the session state machine:
/// `unauthenticated → verifying → authenticated`, and back to
/// `unauthenticated` on logout or when a request finds the token invalid.
///
/// State lives in a watch channel so readers always see a whole snapshot.
pub struct SessionController {
    config: SessionConfig,
    transport: Arc<dyn HttpTransport>,
    secrets: Arc<dyn SecretStore>,
    state: watch::Sender<Session>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn HttpTransport>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        let (state, _) = watch::channel(Session::unauthenticated());
        Self {
            config,
            transport,
            secrets,
            state,
        }
    }

    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    fn publish(&self, session: Session) {
        debug!("[Session] Status -> {:?}", session.status);
        self.state.send_replace(session);
    }

    fn stored_token(&self) -> Result<Option<String>, SessionError> {
        self.secrets
            .get_secret(&self.config.keychain_service, &self.config.keychain_account)
            .map_err(secret_error)
    }

    fn clear_stored_token(&self) -> Result<(), SessionError> {
        self.secrets
            .delete_secret(&self.config.keychain_service, &self.config.keychain_account)
            .map_err(secret_error)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Restore the session from the stored token, if any.
    ///
    /// Any failure to confirm the token ends unauthenticated with the token
    /// removed. Only secret store errors are returned.
    pub async fn check_status(&self) -> Result<SessionStatus, SessionError> {
        let Some(token) = self.stored_token()?.filter(|t| !t.is_empty()) else {
            self.publish(Session::unauthenticated());
            return Ok(SessionStatus::Unauthenticated);
        };

        self.publish(Session::verifying());
        let request = HttpRequest::get(self.url(ME_PATH))
            .bearer(&token)
            .timeout(self.config.login_timeout);

        let user = match self.transport.execute(request).await {
            Ok(response) if response.is_success() => match response.json::<AuthResponse>() {
                Ok(body) => body.user.filter(|_| body.success),
                Err(err) => {
                    warn!("[Session] Could not read session check response: {}", err);
                    None
                }
            },
            Ok(response) => {
                warn!(
                    "[Session] Session check rejected: {}",
                    NetworkError::from_status(response.status, &response.body)
                );
                None
            }
            Err(err) => {
                warn!("[Session] Session check failed: {}", err);
                None
            }
        };

        match user {
            Some(user) => {
                info!("[Session] Restored session for user {:?}", user.id);
                self.publish(Session::authenticated(user, token));
                Ok(SessionStatus::Authenticated)
            }
            None => {
                self.publish(Session::unauthenticated());
                self.clear_stored_token()?;
                Ok(SessionStatus::Unauthenticated)
            }
        }
    }

    pub async fn login(&self, credentials: Credentials) -> Result<User, SessionError> {
        self.login_with_cancel(credentials, CancellationToken::new())
            .await
    }

    /// Exchange credentials for a session, retrying transient failures.
    pub async fn login_with_cancel(
        &self,
        credentials: Credentials,
        cancel: CancellationToken,
    ) -> Result<User, SessionError> {
        self.publish(Session::verifying());

        let result = self.perform_login(&credentials, &cancel).await;
        match &result {
            Ok(user) => info!("[Session] Logged in as user {:?}", user.id),
            Err(err) => {
                warn!("[Session] Login failed: {}", err);
                self.publish(Session::unauthenticated());
            }
        }
        result
    }

    async fn perform_login(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<User, SessionError> {
        let request = HttpRequest::post(self.url(LOGIN_PATH))
            .json(credentials)
            .map_err(|e| SessionError::Network(NetworkError::Transport(e.to_string())))?
            .timeout(self.config.login_timeout);

        let response =
            execute_with_retry(self.transport.as_ref(), &request, self.config.retry, cancel)
                .await?;
        let body = parse_login_response(&response)?;

        match (body.success, body.user, body.token) {
            (true, Some(user), Some(token)) if !token.is_empty() => {
                self.secrets
                    .set_secret(
                        &self.config.keychain_service,
                        &self.config.keychain_account,
                        &token,
                    )
                    .map_err(secret_error)?;
                self.publish(Session::authenticated(user.clone(), token));
                Ok(user)
            }
            (_, _, _) => Err(SessionError::InvalidCredentials(
                body.message.unwrap_or_else(|| "Login failed".to_string()),
            )),
        }
    }

    /// Forget the session locally. No network round trip.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.publish(Session::unauthenticated());
        let result = self.clear_stored_token();
        info!("[Session] Logged out");
        result
    }
}

/// Classify a login response. Rejections carrying a readable message surface it.
fn parse_login_response(response: &HttpResponse) -> Result<AuthResponse, SessionError> {
    if response.is_success() {
        return response.json::<AuthResponse>().map_err(SessionError::Network);
    }

    let error = NetworkError::from_status(response.status, &response.body);
    if matches!(error, NetworkError::BadRequest(_) | NetworkError::Unauthorized) {
        if let Some(message) = response
            .json::<AuthResponse>()
            .ok()
            .and_then(|body| body.message)
        {
            return Err(SessionError::InvalidCredentials(message));
        }
    }
    Err(SessionError::Network(error))
}

impl AuthContext for SessionController {
    fn access_token(&self) -> Option<String> {
        let session = self.state.borrow();
        if session.is_authenticated() {
            session.token.clone()
        } else {
            None
        }
    }

    fn invalidate(&self) {
        let was_authenticated = self.state.send_if_modified(|session| {
            if session.is_authenticated() {
                *session = Session::unauthenticated();
                true
            } else {
                false
            }
        });
        if was_authenticated {
            warn!("[Session] Token rejected by server; session cleared");
            if let Err(err) = self.clear_stored_token() {
                warn!("[Session] Failed to remove rejected token: {}", err);
            }
        }
    }
}
