//! Model session: holds the one credential that authorises remote calls.
//!
//! A session is an ordinary value: build it, hand it (or a snapshot of it) to
//! whatever needs to make calls, clear it when the key is revoked. Sharing and
//! serialising mutation against in-flight calls is the owner's job; see
//! `AppState` for how the HTTP service does it.

use tracing::info;

use crate::llm_client::{Credential, LlmError};
use crate::transform::failure::TransformError;

/// Either Uninitialized (`None`) or Ready with a credential.
#[derive(Debug, Clone, Default)]
pub struct ModelSession {
    credential: Option<Credential>,
}

impl ModelSession {
    /// An uninitialized session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the credential and moves the session to Ready.
    ///
    /// Does not contact the model service: an unaccepted key surfaces as
    /// `InvalidCredential` on the first real transformation. On failure the
    /// previous state is left untouched.
    pub fn initialize(&mut self, api_key: &str) -> Result<(), TransformError> {
        let credential = Credential::new(api_key).map_err(|e| match e {
            LlmError::MalformedCredential(reason) => TransformError::Initialization(reason),
            other => TransformError::Initialization(other.to_string()),
        })?;

        self.credential = Some(credential);
        info!("Model session initialized");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.credential.is_some()
    }

    /// Discards the credential. Idempotent.
    pub fn clear(&mut self) {
        if self.credential.take().is_some() {
            info!("Model session cleared");
        }
    }

    pub(crate) fn require_ready(&self) -> Result<&Credential, TransformError> {
        self.credential
            .as_ref()
            .ok_or(TransformError::NotInitialized)
    }
}
