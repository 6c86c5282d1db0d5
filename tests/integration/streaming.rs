//! Streaming generate calls

use crate::mock_server::{stalling_stream_server, fast_builder, MockServerFixture};
use futures::{StreamExt, TryStreamExt};
use std::time::Duration;
use textgen_client::error_code::codes;
use textgen_client::{classify, Error, QueryClassification, StreamChunk};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn malformed_lines_are_skipped() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_ndjson_stream(&[
            r#"{"response":"Hello","done":false}"#,
            "{garbage}",
            r#"{"response":" World","done":false}"#,
            r#"{"response":"","done":true}"#,
        ])
        .await;

    let stream = fixture
        .client()
        .stream_generate("greet", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap();
    let chunks: Vec<StreamChunk> = stream.try_collect().await.unwrap();

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello", " World", ""]);
    assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(chunks.last().unwrap().done);
    mock.assert_async().await;
}

#[tokio::test]
async fn chunks_arrive_in_order_and_concatenate() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_ndjson_stream(&[
            r#"{"response":"The","done":false}"#,
            r#"{"response":" borrow","done":false}"#,
            r#"{"response":" checker","done":false}"#,
            r#"{"response":".","done":true}"#,
        ])
        .await;

    let text: String = fixture
        .client()
        .stream_generate("explain", QueryClassification::Technical, &CancellationToken::new())
        .await
        .unwrap()
        .map_ok(|c| c.text)
        .try_collect::<Vec<_>>()
        .await
        .unwrap()
        .concat();
    assert_eq!(text, "The borrow checker.");
}

#[tokio::test]
async fn error_status_fails_before_streaming() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("POST", crate::mock_server::GENERATE_PATH)
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let err = match fixture
        .client()
        .stream_generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
    {
        Ok(_) => panic!("stream should not open on 404"),
        Err(e) => e,
    };
    assert_eq!(err.status(), Some(404));
    assert_eq!(classify(&err, None).code(), codes::HTTP_NOT_FOUND);
}

#[tokio::test]
async fn stalled_stream_times_out_after_delivered_chunks() {
    let (base_url, _server) =
        stalling_stream_server(&[r#"{"response":"partial","done":false}"#]).await;
    let client = fast_builder(&base_url)
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();

    let mut stream = client
        .stream_generate("hi", QueryClassification::General, &CancellationToken::new())
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.text, "partial");

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Cancelled { cause: Some(_) }), "got {err:?}");
    assert_eq!(classify(&err, None).code(), codes::REQUEST_TIMEOUT);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn cancelling_mid_stream_ends_it() {
    let (base_url, _server) =
        stalling_stream_server(&[r#"{"response":"first","done":false}"#]).await;
    let client = fast_builder(&base_url).build().unwrap();
    let cancel = CancellationToken::new();

    let mut stream = client
        .stream_generate("hi", QueryClassification::General, &cancel)
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap().text, "first");

    cancel.cancel();
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(err.is_caller_cancellation());
    assert_eq!(classify(&err, None).code(), codes::REQUEST_CANCELLED);
    assert!(stream.next().await.is_none());
}
