/*!
 * Integration tests for backend clients against local fake endpoints
 */

use better_translator::errors::ProviderError;
use better_translator::providers::ernie::Ernie;
use better_translator::providers::openai::OpenAI;
use better_translator::providers::Backend;
use better_translator::translation::{TranslationOptions, TranslationService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::common::fake_servers::{spawn_fake_ernie, spawn_fake_openai, ERNIE_CLIENT_ID, ERNIE_CLIENT_SECRET};
use crate::common::{document_of, init_test_logging, paragraphs_of};

fn ernie_client(api_url: &str, token_url: &str) -> Ernie {
    Ernie::new(ERNIE_CLIENT_ID, ERNIE_CLIENT_SECRET, api_url, token_url, 5)
}

#[tokio::test]
async fn test_openai_translate_withFakeServer_shouldReturnNormalizedText() {
    init_test_logging();
    let server = spawn_fake_openai().await;
    let client = OpenAI::new("sk-test", &server.endpoint, "gpt-4o", 5);

    let translated = client.translate("Hello\n\nWorld").await.unwrap();

    assert_eq!(translated, "[ZH] Hello\n\nWorld");
    assert_eq!(server.state.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        server.state.last_authorization.lock().as_deref(),
        Some("Bearer sk-test")
    );
}

#[tokio::test]
async fn test_openai_translate_withErrorStatus_shouldClassifyError() {
    let server = spawn_fake_openai().await;
    let client = OpenAI::new("sk-test", &server.endpoint, "gpt-4o", 5);

    *server.state.fail_status.lock() = Some(401);
    assert!(matches!(
        client.translate("Hello").await,
        Err(ProviderError::AuthenticationError(_))
    ));

    *server.state.fail_status.lock() = Some(429);
    assert!(matches!(
        client.translate("Hello").await,
        Err(ProviderError::RateLimitExceeded(_))
    ));

    *server.state.fail_status.lock() = Some(500);
    assert!(matches!(
        client.translate("Hello").await,
        Err(ProviderError::ApiError { status_code: 500, .. })
    ));
}

#[tokio::test]
async fn test_openai_translate_withoutChoices_shouldBeProtocolError() {
    let server = spawn_fake_openai().await;
    server.state.omit_choices.store(true, Ordering::SeqCst);
    let client = OpenAI::new("sk-test", &server.endpoint, "gpt-4o", 5);

    let error = client.translate("Hello").await.unwrap_err();
    assert!(error.is_protocol_error());
}

#[tokio::test]
async fn test_openai_translate_withUnreachableEndpoint_shouldBeConnectionError() {
    // Bind then drop a listener to get a port nobody is listening on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = OpenAI::new("sk-test", format!("http://{}/v1", addr), "gpt-4o", 5);
    assert!(matches!(
        client.translate("Hello").await,
        Err(ProviderError::ConnectionError(_))
    ));
}

#[tokio::test]
async fn test_openai_translate_withSlowServer_shouldHonourTimeout() {
    let server = spawn_fake_openai().await;
    server.state.delay_ms.store(2_500, Ordering::SeqCst);
    let client = OpenAI::new("sk-test", &server.endpoint, "gpt-4o", 1);

    assert!(matches!(
        client.translate("Hello").await,
        Err(ProviderError::Timeout(_))
    ));
}

#[tokio::test]
async fn test_ernie_translate_withManyCalls_shouldFetchTokenOnce() {
    init_test_logging();
    let server = spawn_fake_ernie(Some(2_592_000)).await;
    let client = ernie_client(&server.api_url, &server.token_url);
    client.initialize().await.unwrap();

    for i in 0..5 {
        let translated = client.translate(&format!("Line {}\n\nNext", i)).await.unwrap();
        assert_eq!(translated, format!("[ZH] Line {}\n\nNext", i));
    }

    assert_eq!(client.token_requests(), 1);
    assert_eq!(server.state.token_requests.load(Ordering::SeqCst), 1);
    assert_eq!(server.state.chat_calls.load(Ordering::SeqCst), 5);
    client.close().await;
}

#[tokio::test]
async fn test_ernie_translate_withConcurrentCalls_shouldShareOneToken() {
    let server = spawn_fake_ernie(None).await;
    let client = Arc::new(ernie_client(&server.api_url, &server.token_url));
    client.initialize().await.unwrap();

    let service = TranslationService::new(
        client.clone(),
        TranslationOptions {
            chunk_size: 1000,
            max_concurrent: 8,
            protect_code_blocks: false,
        },
    );
    let outcome = service
        .translate_chunks_with(&document_of(&paragraphs_of(8, 900)), 1000, 8)
        .await
        .unwrap();

    assert!(!outcome.is_partial());
    assert_eq!(outcome.chunk_count, 8);
    assert_eq!(client.token_requests(), 1);
}

#[tokio::test]
async fn test_ernie_translate_withExpiredToken_shouldRefresh() {
    // Lifetimes inside the refresh margin are already expired locally
    let server = spawn_fake_ernie(Some(30)).await;
    let client = ernie_client(&server.api_url, &server.token_url);
    client.initialize().await.unwrap();

    client.translate("one").await.unwrap();
    client.translate("two").await.unwrap();

    assert_eq!(client.token_requests(), 2);
}

#[tokio::test]
async fn test_ernie_translate_withRejectedToken_shouldFailThenRefresh() {
    let server = spawn_fake_ernie(Some(2_592_000)).await;
    let client = ernie_client(&server.api_url, &server.token_url);
    client.initialize().await.unwrap();

    client.translate("warm up").await.unwrap();
    assert_eq!(client.token_requests(), 1);

    server.state.expire_next_call.store(true, Ordering::SeqCst);
    let error = client.translate("rejected").await.unwrap_err();
    assert!(matches!(error, ProviderError::AuthenticationError(_)));

    let translated = client.translate("retried").await.unwrap();
    assert_eq!(translated, "[ZH] retried");
    assert_eq!(client.token_requests(), 2);
}

#[tokio::test]
async fn test_ernie_translate_withWrongCredentials_shouldFailAuthentication() {
    let server = spawn_fake_ernie(None).await;
    let client = Ernie::new("wrong", "credentials", &server.api_url, &server.token_url, 5);
    client.initialize().await.unwrap();

    assert!(matches!(
        client.translate("Hello").await,
        Err(ProviderError::AuthenticationError(_))
    ));
    assert_eq!(server.state.chat_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ernie_close_shouldForgetTokenAndSession() {
    let server = spawn_fake_ernie(None).await;
    let client = ernie_client(&server.api_url, &server.token_url);

    client.initialize().await.unwrap();
    client.translate("first").await.unwrap();
    client.close().await;

    assert!(matches!(
        client.translate("closed").await,
        Err(ProviderError::ConnectionError(_))
    ));

    client.initialize().await.unwrap();
    client.translate("reopened").await.unwrap();
    assert_eq!(client.token_requests(), 2);
}

#[tokio::test]
async fn test_ernie_translate_withLateStaleRejection_shouldKeepFreshToken() {
    init_test_logging();
    let server = spawn_fake_ernie(None).await;
    {
        let mut rejections = server.state.delayed_rejections.lock();
        rejections.insert("fast stale".to_string(), 10);
        rejections.insert("slow stale".to_string(), 300);
    }
    let client = Arc::new(ernie_client(&server.api_url, &server.token_url));
    client.initialize().await.unwrap();

    // Both calls go out with token-1
    let fast = tokio::spawn({
        let client = client.clone();
        async move { client.translate("fast stale").await }
    });
    let slow = tokio::spawn({
        let client = client.clone();
        async move { client.translate("slow stale").await }
    });

    // The fast rejection has dropped token-1; this call fetches token-2
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.translate("fresh").await.unwrap(), "[ZH] fresh");
    assert_eq!(client.token_requests(), 2);

    assert!(matches!(
        fast.await.unwrap(),
        Err(ProviderError::AuthenticationError(_))
    ));
    assert!(matches!(
        slow.await.unwrap(),
        Err(ProviderError::AuthenticationError(_))
    ));

    // The late rejection of token-1 must not discard token-2
    assert_eq!(client.translate("after").await.unwrap(), "[ZH] after");
    assert_eq!(client.token_requests(), 2);
    assert_eq!(server.state.token_requests.load(Ordering::SeqCst), 2);
}
