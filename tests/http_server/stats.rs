use serde_json::{Value, json};

use crate::helpers::*;

#[tokio::test]
async fn test_all_returns_every_block_from_the_given_height() {
    let server = TestServer::new(create_test_config(5, false)).await;

    let resp = server.get("/all").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "10": {
                "messageCount": 1,
                "avgLatency": 30.0,
                "missingMessages": 0,
                "missingReception": 0,
                "missingRelay": 0
            },
            "11": {
                "messageCount": 0,
                "avgLatency": 0.0,
                "missingMessages": 1,
                "missingReception": 1,
                "missingRelay": 0
            }
        })
    );

    let body: Value = server.get("/all?from=11").await.json().await.unwrap();
    assert_eq!(body.as_object().unwrap().keys().collect::<Vec<_>>(), vec!["11"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_all_with_bin_groups_blocks() {
    let server = TestServer::new(create_test_config(5, false)).await;

    let resp = server.get("/all?bin=4").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "8": {
                "messageCount": 1,
                "avgLatency": 30.0,
                "missingMessages": 1,
                "missingReception": 1,
                "missingRelay": 0
            }
        })
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_all_rejects_invalid_parameters() {
    let server = TestServer::new(create_test_config(5, false)).await;

    for (path, message) in [
        ("/all?from=abc", "Invalid `from` value"),
        ("/all?from=-1", "Invalid `from` value"),
        ("/all?bin=0", "Invalid `bin` value"),
        ("/all?bin=x", "Invalid `bin` value"),
    ] {
        let resp = server.get(path).await;
        assert_eq!(resp.status(), 400, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], message, "{path}");
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_latest_defaults_to_one_window() {
    let server = TestServer::new(create_test_config(5, false)).await;

    let resp = server.get("/latest").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "messageCount": 1,
            "totalLatency": "30",
            "avgLatency": 30.0,
            "sentMessages": 2,
            "receivedMessages": 1,
            "missingRelay": 0,
            "missingReception": 1
        })
    );

    // Blocks 11..=12 are in range; block 11 holds the unmatched send.
    let body: Value = server.get("/latest?count=1").await.json().await.unwrap();
    assert_eq!(body["sentMessages"], 1);
    assert_eq!(body["messageCount"], 0);
    assert_eq!(body["missingReception"], 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_latest_rejects_invalid_counts() {
    let server = TestServer::new(create_test_config(5, true)).await;

    let resp = server.get("/latest?count=ten").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid `count` value");

    let resp = server.get("/latest?count=11").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "`count` too large; purgeOldBlocks is set to true");

    let resp = server.get("/latest?count=10").await;
    assert_eq!(resp.status(), 200);

    server.shutdown().await;
}

#[tokio::test]
async fn test_latest_allows_large_counts_without_block_purging() {
    let server = TestServer::new(create_test_config(5, false)).await;

    let resp = server.get("/latest?count=1000").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["messageCount"], 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_queries_fail_with_503_once_the_service_is_gone() {
    let mut server = TestServer::new(create_test_config(5, false)).await;
    server.stop_service().await;

    let resp = server.get("/latest").await;
    assert_eq!(resp.status(), 503);

    let resp = server.get("/all").await;
    assert_eq!(resp.status(), 503);

    server.shutdown().await;
}
