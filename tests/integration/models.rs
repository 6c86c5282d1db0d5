//! Model catalog calls

use crate::mock_server::MockServerFixture;
use textgen_client::Error;
use tokio_util::sync::CancellationToken;

const TAGS: &str = r#"{"models":[
    {"name":"llama3:8b","size":4661224676,"digest":"365c0bd3c000"},
    {"name":"codellama:latest","size":"3.8GB"}
]}"#;

#[tokio::test]
async fn lists_installed_model_names() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_tags(200, TAGS).await;
    let cancel = CancellationToken::new();
    let client = fixture.client();

    assert_eq!(
        client.get_available_models(&cancel).await,
        vec!["llama3:8b", "codellama:latest"]
    );

    let models = client.list_models(&cancel).await.unwrap();
    assert_eq!(models[0].size.as_deref(), Some("4661224676"));
    assert_eq!(models[1].size.as_deref(), Some("3.8GB"));
}

#[tokio::test]
async fn unavailable_service_degrades_to_an_empty_list() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_tags(503, "service unavailable").await;
    let cancel = CancellationToken::new();
    let client = fixture.client();

    assert!(client.get_available_models(&cancel).await.is_empty());
    assert!(!client.is_available(&cancel).await);

    let err = client.list_models(&cancel).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn malformed_catalog_degrades_to_an_empty_list() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_tags(200, "<html>").await;
    let client = fixture.client();
    let cancel = CancellationToken::new();

    assert!(client.get_available_models(&cancel).await.is_empty());
    assert!(matches!(
        client.list_models(&cancel).await,
        Err(Error::Serialization(_))
    ));
}

#[tokio::test]
async fn cancelled_catalog_request_degrades_to_an_empty_list() {
    let fixture = MockServerFixture::new().await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(fixture.client().get_available_models(&cancel).await.is_empty());
}

#[tokio::test]
async fn has_model_matches_with_or_without_tag() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_tags(200, TAGS).await;
    let client = fixture.client();
    let cancel = CancellationToken::new();

    assert!(client.is_available(&cancel).await);
    assert!(client.has_model("llama3", &cancel).await);
    assert!(client.has_model("llama3:8b", &cancel).await);
    assert!(client.has_model("codellama", &cancel).await);
    assert!(!client.has_model("mistral", &cancel).await);
}
