//! Timeout and caller cancellation

use crate::mock_server::{fast_builder, silent_server};
use std::time::{Duration, Instant};
use textgen_client::error_code::codes;
use textgen_client::{classify, Error, QueryClassification, Severity};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn timeout_surfaces_as_cancellation_caused_by_timeout() {
    let (base_url, _server) = silent_server().await;
    let client = fast_builder(&base_url)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client
        .generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled { cause: Some(_) }), "got {err:?}");
    assert!(!err.is_caller_cancellation());

    let record = classify(&err, None);
    assert_eq!(record.code(), codes::REQUEST_TIMEOUT);
    assert_eq!(record.severity(), Severity::Error);
    assert!(record.is_retryable());
}

#[tokio::test]
async fn timeouts_are_retried() {
    let (base_url, _server) = silent_server().await;
    let client = fast_builder(&base_url)
        .timeout(Duration::from_millis(100))
        .max_retry_attempts(2)
        .retry_delay(Duration::from_millis(10))
        .build()
        .unwrap();

    let started = Instant::now();
    let err = client
        .generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled { cause: Some(_) }));
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn caller_cancellation_is_reported_and_not_retried() {
    let (base_url, _server) = silent_server().await;
    let client = fast_builder(&base_url)
        .max_retry_attempts(5)
        .retry_delay(Duration::from_secs(1))
        .build()
        .unwrap();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .generate("hi", QueryClassification::General, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_caller_cancellation(), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(1));

    let record = classify(&err, None);
    assert_eq!(record.code(), codes::REQUEST_CANCELLED);
    assert_eq!(record.severity(), Severity::Warning);
}

#[tokio::test]
async fn already_cancelled_token_fails_fast() {
    let (base_url, _server) = silent_server().await;
    let client = fast_builder(&base_url).build().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = match client
        .stream_generate("hi", QueryClassification::General, &cancel)
        .await
    {
        Ok(_) => panic!("stream should not open"),
        Err(e) => e,
    };
    assert!(err.is_caller_cancellation());
}
