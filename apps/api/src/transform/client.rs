//! Transformation client: turns page content into an adapted CV or a cover letter.
//!
//! Flow per call: input check → session check → truncate → build prompt →
//! one remote call → classify any failure. No retries, no caching, no state
//! kept between calls, so the two operations can run concurrently.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::llm_client::{ModelRequest, ModelTransport};
use crate::transform::failure::{classify, Operation, TransformError};
use crate::transform::prompts::{
    build_cover_letter_prompt, build_cv_prompt, truncate_chars, MAX_SOURCE_CHARS,
};
use crate::transform::session::ModelSession;

/// Output bound for the adapted or generated CV.
pub const CV_MAX_TOKENS: u32 = 4000;
/// Output bound for the cover letter.
pub const COVER_LETTER_MAX_TOKENS: u32 = 1000;

#[derive(Clone)]
pub struct TransformationClient {
    transport: Arc<dyn ModelTransport>,
}

impl TransformationClient {
    pub fn new(transport: Arc<dyn ModelTransport>) -> Self {
        Self { transport }
    }

    /// Adapts `cv_content` to the job posting in `page_content`, or drafts a CV
    /// template for it when no CV is given.
    pub async fn adapt_document(
        &self,
        session: &ModelSession,
        page_content: &str,
        cv_content: Option<&str>,
    ) -> Result<String, TransformError> {
        let operation = Operation::AdaptDocument;
        let request = {
            let page = clip_source(operation, page_content)?;
            let (prompt, variant) = build_cv_prompt(page, cv_content);
            debug!("CV prompt variant: {:?}", variant);
            ModelRequest::user_prompt(prompt, CV_MAX_TOKENS)
        };

        self.invoke(session, operation, &request).await
    }

    /// Writes a short cover letter for the job posting in `page_content`.
    pub async fn generate_companion_letter(
        &self,
        session: &ModelSession,
        page_content: &str,
    ) -> Result<String, TransformError> {
        let operation = Operation::CompanionLetter;
        let request = {
            let page = clip_source(operation, page_content)?;
            ModelRequest::user_prompt(build_cover_letter_prompt(page), COVER_LETTER_MAX_TOKENS)
        };

        self.invoke(session, operation, &request).await
    }

    async fn invoke(
        &self,
        session: &ModelSession,
        operation: Operation,
        request: &ModelRequest,
    ) -> Result<String, TransformError> {
        let credential = session.require_ready()?;

        info!(
            "Starting {} (prompt_chars={})",
            operation,
            request.prompt().chars().count()
        );

        match self.transport.send(credential, request).await {
            Ok(text) => {
                info!("Completed {} ({} chars returned)", operation, text.len());
                Ok(text)
            }
            Err(e) => {
                let classified = classify(operation, &e);
                warn!("Failed to {}: {} (classified: {})", operation, e, classified);
                Err(classified)
            }
        }
    }
}

/// Rejects empty content and clips the rest to `MAX_SOURCE_CHARS`.
fn clip_source(operation: Operation, page_content: &str) -> Result<&str, TransformError> {
    if page_content.is_empty() {
        return Err(TransformError::EmptyInput);
    }

    let (page, truncated) = truncate_chars(page_content, MAX_SOURCE_CHARS);
    if truncated {
        debug!(
            "{}: page content truncated to {} chars (was {} bytes)",
            operation,
            MAX_SOURCE_CHARS,
            page_content.len()
        );
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::llm_client::{Credential, LlmError};

    /// Records every request and answers with a canned result.
    /// A request whose prompt contains a key in `by_prompt` gets that reply instead.
    struct StubTransport {
        default_reply: Result<String, String>,
        by_prompt: Vec<(&'static str, &'static str)>,
        delay: Option<Duration>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl StubTransport {
        fn replying(text: &str) -> Self {
            Self {
                default_reply: Ok(text.to_string()),
                by_prompt: Vec::new(),
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                default_reply: Err(message.to_string()),
                ..Self::replying("")
            }
        }

        fn requests(&self) -> Vec<ModelRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelTransport for StubTransport {
        async fn send(
            &self,
            _credential: &Credential,
            request: &ModelRequest,
        ) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some((_, reply)) = self
                .by_prompt
                .iter()
                .find(|(needle, _)| request.prompt().contains(needle))
            {
                return Ok(reply.to_string());
            }
            self.default_reply
                .clone()
                .map_err(LlmError::Transport)
        }
    }

    fn ready_session() -> ModelSession {
        let mut session = ModelSession::new();
        session.initialize("k1").unwrap();
        session
    }

    fn client_with(stub: &Arc<StubTransport>) -> TransformationClient {
        TransformationClient::new(stub.clone())
    }

    #[tokio::test]
    async fn test_uninitialized_session_fails_before_remote_call() {
        let stub = Arc::new(StubTransport::replying("unused"));
        let client = client_with(&stub);
        let session = ModelSession::new();

        let long_page = "y".repeat(60_000);
        for page in ["<html>job</html>", "x", long_page.as_str()] {
            let err = client
                .adapt_document(&session, page, Some("cv"))
                .await
                .unwrap_err();
            assert!(matches!(err, TransformError::NotInitialized));

            let err = client
                .generate_companion_letter(&session, page)
                .await
                .unwrap_err();
            assert!(matches!(err, TransformError::NotInitialized));
        }
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cleared_session_fails_with_not_initialized() {
        let stub = Arc::new(StubTransport::replying("unused"));
        let client = client_with(&stub);
        let mut session = ready_session();
        session.clear();

        let err = client
            .generate_companion_letter(&session, "<html>job</html>")
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::NotInitialized));
    }

    #[tokio::test]
    async fn test_empty_content_fails_without_remote_call() {
        let stub = Arc::new(StubTransport::replying("unused"));
        let client = client_with(&stub);

        for session in [ready_session(), ModelSession::new()] {
            let err = client.adapt_document(&session, "", None).await.unwrap_err();
            assert!(matches!(err, TransformError::EmptyInput));

            let err = client
                .adapt_document(&session, "", Some("cv"))
                .await
                .unwrap_err();
            assert!(matches!(err, TransformError::EmptyInput));

            let err = client
                .generate_companion_letter(&session, "")
                .await
                .unwrap_err();
            assert!(matches!(err, TransformError::EmptyInput));
        }
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cover_letter_returns_stub_text() {
        let stub = Arc::new(StubTransport::replying("Dear hiring manager..."));
        let client = client_with(&stub);

        let letter = client
            .generate_companion_letter(&ready_session(), "<html>Senior Engineer role...</html>")
            .await
            .unwrap();

        assert_eq!(letter, "Dear hiring manager...");
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, COVER_LETTER_MAX_TOKENS);
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].role, "user");
        assert!(requests[0]
            .prompt()
            .contains("<html>Senior Engineer role...</html>"));
    }

    #[tokio::test]
    async fn test_result_is_returned_verbatim() {
        let reply = "  ```\n# CV\n```  \n";
        let stub = Arc::new(StubTransport::replying(reply));
        let client = client_with(&stub);

        let text = client
            .adapt_document(&ready_session(), "<html>job</html>", None)
            .await
            .unwrap();
        assert_eq!(text, reply);
    }

    #[tokio::test]
    async fn test_oversized_content_is_clipped_to_exact_prefix() {
        let stub = Arc::new(StubTransport::replying("ok"));
        let client = client_with(&stub);
        let session = ready_session();

        let head = "a".repeat(MAX_SOURCE_CHARS);
        let page = format!("{head}TAIL_MARKER{}", "b".repeat(1_000));

        client.adapt_document(&session, &page, None).await.unwrap();
        client
            .adapt_document(&session, &page, Some("my cv"))
            .await
            .unwrap();
        client.generate_companion_letter(&session, &page).await.unwrap();

        for request in stub.requests() {
            let prompt = request.prompt();
            assert!(prompt.contains(&format!("Page HTML Content:\n{head}\n")));
            assert!(!prompt.contains("TAIL_MARKER"));
            assert!(!prompt.contains(&"b".repeat(10)));
        }
    }

    #[tokio::test]
    async fn test_existing_cv_is_not_clipped() {
        let stub = Arc::new(StubTransport::replying("ok"));
        let client = client_with(&stub);
        let cv = format!("{}CV_END", "c".repeat(MAX_SOURCE_CHARS + 10));

        client
            .adapt_document(&ready_session(), "<html>job</html>", Some(&cv))
            .await
            .unwrap();

        let requests = stub.requests();
        assert!(requests[0].prompt().contains(&cv));
        assert_eq!(requests[0].max_tokens, CV_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_prompt_variant_follows_cv_presence() {
        let stub = Arc::new(StubTransport::replying("ok"));
        let client = client_with(&stub);
        let session = ready_session();

        client
            .adapt_document(&session, "<html>job</html>", Some("my cv"))
            .await
            .unwrap();
        client
            .adapt_document(&session, "<html>job</html>", None)
            .await
            .unwrap();

        let requests = stub.requests();
        assert_ne!(requests[0].prompt(), requests[1].prompt());
        assert!(requests[0].prompt().contains("adapt the CV"));
        assert!(requests[1].prompt().contains("create a CV template"));
    }

    #[tokio::test]
    async fn test_remote_failures_are_classified() {
        let session = ready_session();

        let client = client_with(&Arc::new(StubTransport::failing("rate limit exceeded")));
        let err = client
            .adapt_document(&session, "<html>job</html>", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::RateLimited));

        let client = client_with(&Arc::new(StubTransport::failing("invalid API key")));
        let err = client
            .generate_companion_letter(&session, "<html>job</html>")
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidCredential));

        let client = client_with(&Arc::new(StubTransport::failing("connection reset")));
        let err = client
            .generate_companion_letter(&session, "<html>job</html>")
            .await
            .unwrap_err();
        match err {
            TransformError::Failed { operation, message } => {
                assert_eq!(operation, Operation::CompanionLetter);
                assert_eq!(message, "connection reset");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_operations_do_not_share_prompts() {
        let stub = Arc::new(StubTransport {
            by_prompt: vec![
                ("expert cover letter writer", "LETTER TEXT"),
                ("Current CV:", "ADAPTED CV TEXT"),
            ],
            delay: Some(Duration::from_millis(50)),
            ..StubTransport::replying("unexpected")
        });
        let client = client_with(&stub);
        let session = ready_session();
        let html = "<html>Senior Engineer role</html>";

        let (cv, letter) = tokio::join!(
            client.adapt_document(&session, html, Some("my cv")),
            client.generate_companion_letter(&session, html),
        );

        assert_eq!(cv.unwrap(), "ADAPTED CV TEXT");
        assert_eq!(letter.unwrap(), "LETTER TEXT");

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        let letter_prompts = requests
            .iter()
            .filter(|r| r.prompt().contains("expert cover letter writer"))
            .count();
        assert_eq!(letter_prompts, 1);
        assert!(requests
            .iter()
            .filter(|r| r.prompt().contains("expert cover letter writer"))
            .all(|r| !r.prompt().contains("my cv")));
    }
}
