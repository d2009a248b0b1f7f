//! Identity gate over an external sign-in provider.
//!
//! Rooms never see credentials. The rest of the system consumes an
//! [`AuthSession`] and does not care which provider minted it.

use async_trait::async_trait;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use tracing::{info, instrument};

/// Failure at the identity boundary. Reported to the user; never fatal to
/// the process.
#[derive(Debug, Clone, Display, Error)]
pub enum IdentityError {
    /// The display name was empty or all whitespace.
    #[display("display name must not be blank")]
    InvalidDisplayName,
    /// The provider refused the sign-in.
    #[display("identity provider rejected the sign-in: {message}")]
    Rejected {
        /// Provider-specific refusal description.
        message: String,
    },
}

/// An authenticated participant, as far as rooms care: a display name and
/// whether the session is still valid.
#[derive(Debug, Clone, Getters, new)]
pub struct AuthSession {
    display_name: String,
    #[new(value = "true")]
    valid: bool,
}

impl AuthSession {
    /// Marks the session invalid. Called by the gate's sign-out.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// Boundary to the external identity provider.
///
/// Deployments against a federated provider implement this trait;
/// [`LocalIdentityGate`] covers tests and local play.
#[async_trait]
pub trait IdentityGate: Send + Sync {
    /// Signs a user in, producing a session for the given display name.
    async fn sign_in(&self, display_name: &str) -> Result<AuthSession, IdentityError>;

    /// Invalidates a session. No provider round-trip is assumed.
    fn sign_out(&self, session: &mut AuthSession);
}

/// Provider-less identity gate: any non-blank display name signs in.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalIdentityGate;

impl LocalIdentityGate {
    /// Creates the gate.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityGate for LocalIdentityGate {
    #[instrument(skip(self))]
    async fn sign_in(&self, display_name: &str) -> Result<AuthSession, IdentityError> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::InvalidDisplayName);
        }
        info!(display_name = %trimmed, "Signed in");
        Ok(AuthSession::new(trimmed.to_string()))
    }

    #[instrument(skip(self, session), fields(display_name = %session.display_name()))]
    fn sign_out(&self, session: &mut AuthSession) {
        session.invalidate();
        info!("Signed out");
    }
}
