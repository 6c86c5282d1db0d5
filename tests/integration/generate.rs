//! Non-streaming generate calls

use crate::mock_server::{MockServerFixture, GENERATE_PATH};
use mockito::Matcher;
use serde_json::json;
use textgen_client::error_code::codes;
use textgen_client::{classify, Error, GenerationRequest, QueryClassification, Severity};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn returns_the_response_text() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", GENERATE_PATH)
        .match_body(Matcher::Json(json!({
            "model": "llama3",
            "prompt": "Say X",
            "stream": false
        })))
        .with_status(200)
        .with_body(r#"{"response":"X","done":true}"#)
        .create_async()
        .await;

    let client = fixture.client();
    let text = assert_ok!(
        client
            .generate("Say X", QueryClassification::General, &CancellationToken::new())
            .await
    );
    assert_eq!(text, "X");
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_response_is_returned_verbatim() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_generate(200, r#"{"response":"","done":true}"#)
        .await;

    let text = fixture
        .client()
        .generate("anything", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "");
}

#[tokio::test]
async fn classification_picks_the_model() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", GENERATE_PATH)
        .match_body(Matcher::PartialJson(json!({ "model": "codellama" })))
        .with_status(200)
        .with_body(r#"{"response":"fn main() {}","done":true}"#)
        .create_async()
        .await;

    let request = GenerationRequest::new("write a main function")
        .classification(QueryClassification::Code);
    let text = fixture.client().generate_request(&request).await.unwrap();
    assert_eq!(text, "fn main() {}");
    mock.assert_async().await;
}

#[tokio::test]
async fn not_found_is_distinguishable_from_server_errors() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_generate(404, "404 page not found").await;
    let client = fixture.client();
    let cancel = CancellationToken::new();

    let not_found = assert_err!(
        client
            .generate("hi", QueryClassification::General, &cancel)
            .await
    );
    assert_eq!(not_found.status(), Some(404));
    let record = classify(&not_found, Some("chat"));
    assert_eq!(record.code(), codes::HTTP_NOT_FOUND);
    assert_eq!(record.severity(), Severity::Critical);
    assert!(!record.is_retryable());
    assert!(record.technical_details().contains("404"));
    assert!(record.suggested_action().is_some());

    let mut failing = MockServerFixture::new().await;
    let _mock_500 = failing.mock_generate(500, r#"{"error":"boom"}"#).await;
    let server_error = assert_err!(
        failing
            .client()
            .generate("hi", QueryClassification::General, &cancel)
            .await
    );
    let record_500 = classify(&server_error, Some("chat"));
    assert_eq!(record_500.code(), codes::HTTP_INTERNAL_ERROR);
    assert_ne!(record_500.user_message(), record.user_message());
    assert_ne!(server_error.to_string(), not_found.to_string());
}

#[tokio::test]
async fn malformed_success_body_is_a_serialization_error() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_generate(200, "this is not json").await;

    let err = fixture
        .client()
        .generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Serialization(_)), "got {err:?}");
    assert_eq!(classify(&err, None).code(), codes::INVALID_JSON);
}

#[tokio::test]
async fn bearer_token_and_request_id_are_sent() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", GENERATE_PATH)
        .match_header("authorization", "Bearer secret-key")
        .match_header(
            "x-request-id",
            Matcher::Regex("^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}$".into()),
        )
        .with_status(200)
        .with_body(r#"{"response":"ok","done":true}"#)
        .create_async()
        .await;

    let client = fixture.builder().api_key("secret-key").build().unwrap();
    let text = client
        .generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn refused_connection_is_classified_as_critical() {
    let base_url = crate::mock_server::closed_port_url().await;
    let client = crate::mock_server::fast_builder(&base_url).build().unwrap();

    let err = client
        .generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");

    let record = classify(&err, Some("chat"));
    assert_eq!(record.code(), codes::CONNECTION_REFUSED);
    assert_eq!(record.severity(), Severity::Critical);
    assert!(record.is_retryable());

    let message = serde_json::to_value(record.to_message()).unwrap();
    assert_eq!(message["type"], "error");
    assert_eq!(message["metadata"]["errorCode"], codes::CONNECTION_REFUSED);
    assert_eq!(message["metadata"]["context"], "chat");
}
