//! Retry and alternate-endpoint behavior

use crate::mock_server::MockServerFixture;
use std::time::Duration;
use futures::TryStreamExt;
use textgen_client::{QueryClassification, StreamChunk};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn retries_on_the_alternate_endpoint_after_a_transient_failure() {
    let mut primary = MockServerFixture::new().await;
    let mut backup = MockServerFixture::new().await;
    let failing = primary.mock_generate(503, "loading model").await;
    let succeeding = backup
        .mock_generate(200, r#"{"response":"from backup","done":true}"#)
        .await;

    let client = primary
        .builder()
        .max_retry_attempts(1)
        .alternate_endpoint(backup.base_url.clone())
        .build()
        .unwrap();

    let text = client
        .generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "from backup");
    failing.assert_async().await;
    succeeding.assert_async().await;
}

#[tokio::test]
async fn non_retryable_failures_are_not_retried() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_generate_expecting(400, r#"{"error":"bad request"}"#, 1)
        .await;

    let client = fixture.builder().max_retry_attempts(3).build().unwrap();
    let err = client
        .generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    mock.assert_async().await;
}

#[tokio::test]
async fn exhausted_retries_return_the_last_raw_failure() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_generate_expecting(503, "busy", 3).await;

    let client = fixture
        .builder()
        .max_retry_attempts(2)
        .retry_delay(Duration::from_millis(5))
        .build()
        .unwrap();
    let err = client
        .generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    mock.assert_async().await;
}

#[tokio::test]
async fn stream_connection_is_retried_on_the_alternate() {
    let mut primary = MockServerFixture::new().await;
    let mut backup = MockServerFixture::new().await;
    let _failing = primary
        .server
        .mock("POST", crate::mock_server::GENERATE_PATH)
        .with_status(502)
        .create_async()
        .await;
    let _succeeding = backup
        .mock_ndjson_stream(&[r#"{"response":"ok","done":true}"#])
        .await;

    let client = primary
        .builder()
        .max_retry_attempts(1)
        .alternate_endpoints([backup.base_url.clone()])
        .build()
        .unwrap();
    let chunks: Vec<StreamChunk> = client
        .stream_generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "ok");
}
