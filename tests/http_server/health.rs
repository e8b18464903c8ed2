use crate::helpers::*;

#[tokio::test]
async fn test_index_returns_ok() {
    let server = TestServer::new(create_test_config(5, false)).await;

    let resp = server.get("/").await;

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Ok!");

    server.shutdown().await;
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let server = TestServer::new(create_test_config(5, false)).await;

    let resp = server.get("/health").await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");

    server.shutdown().await;
}
