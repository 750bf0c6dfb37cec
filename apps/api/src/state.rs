use std::sync::Arc;

use tokio::sync::RwLock;

use crate::transform::client::TransformationClient;
use crate::transform::session::ModelSession;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one model session. Handlers take a snapshot under the read lock and
    /// release it before calling out, so `PUT`/`DELETE /session` never wait on
    /// a remote call and in-flight calls keep the credential they started with.
    pub session: Arc<RwLock<ModelSession>>,
    pub transformer: TransformationClient,
}

impl AppState {
    pub async fn session_snapshot(&self) -> ModelSession {
        self.session.read().await.clone()
    }
}
