use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::crypto::nonce::{NonceSource, PseudoRandomNonce};
use crate::error::CredentialError;
use crate::messages::{create_type1, create_type3, Challenge};

/// Upper bound on draining a `401` body before the retry.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Who to authenticate as. Read-only once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    domain: Option<String>,
    workstation: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain: None,
            workstation: None,
        }
    }

    /// Splits `DOMAIN\user` and `user@domain`; anything else is a bare user name.
    pub fn from_qualified(username: &str, password: impl Into<String>) -> Self {
        if let Some((domain, user)) = username.split_once('\\') {
            return Self::new(user, password).with_domain(domain);
        }
        if let Some((user, domain)) = username.split_once('@') {
            Self::new(user, password).with_domain(domain)
        } else {
            Self::new(username, password)
        }
    }

    /// Sent in Type 1 and used as the Type 3 target instead of the server's target name.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Overrides the local host name.
    pub fn with_workstation(mut self, workstation: impl Into<String>) -> Self {
        self.workstation = Some(workstation.into());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn workstation(&self) -> Option<&str> {
        self.workstation.as_deref()
    }

    pub fn negotiate_header(&self) -> Result<String, CredentialError> {
        create_type1(self.workstation(), self.domain())
    }

    pub fn authenticate_header(
        &self,
        challenge: &Challenge,
        nonces: &dyn NonceSource,
    ) -> Result<String, CredentialError> {
        create_type3(
            challenge,
            &self.username,
            &self.password,
            self.workstation(),
            self.domain(),
            nonces,
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .field("workstation", &self.workstation)
            .finish()
    }
}

/// Handshake settings shared by every request of a client.
#[derive(Clone)]
pub struct ClientConfig {
    pub drain_timeout: Duration,
    pub nonce_source: Arc<dyn NonceSource>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            nonce_source: Arc::new(PseudoRandomNonce),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}
