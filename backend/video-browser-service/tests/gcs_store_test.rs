use std::sync::OnceLock;

use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use video_browser_service::storage::{
    GcsObjectStore, ObjectStore, ServiceAccountKey, StorageError, TokenProvider, TokenSource,
};

fn private_key_pem() -> &'static str {
    static PEM: OnceLock<String> = OnceLock::new();
    PEM.get_or_init(|| {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
    })
}

fn service_account(token_uri: String) -> ServiceAccountKey {
    let pem = private_key_pem();

    ServiceAccountKey::from_json(
        &json!({
            "type": "service_account",
            "client_email": "reader@example.iam.gserviceaccount.com",
            "private_key": pem,
            "token_uri": token_uri,
        })
        .to_string(),
    )
    .unwrap()
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn store(server: &MockServer) -> GcsObjectStore {
    let http_client = reqwest::Client::new();
    let key = service_account(format!("{}/token", server.uri()));
    GcsObjectStore::new(
        format!("{}/storage/v1", server.uri()),
        http_client.clone(),
        TokenProvider::new(TokenSource::ServiceAccount(key), http_client),
    )
}

#[tokio::test]
async fn test_list_objects_follows_pagination() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/videos.example.com/o"))
        .and(query_param("pageToken", "page-2"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "storage#objects",
            "items": [
                {"name": "c.mp4", "updated": "2023-03-01T00:00:00.000Z", "size": "3"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/videos.example.com/o"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "storage#objects",
            "nextPageToken": "page-2",
            "items": [
                {"name": "a.mp4", "updated": "2023-01-01T00:00:00.000Z", "size": "1"},
                {"name": "b.txt", "updated": "2023-02-01T00:00:00.000Z", "size": "2"}
            ]
        })))
        .mount(&server)
        .await;

    let objects = store(&server).list_objects("videos.example.com").await.unwrap();
    let names: Vec<_> = objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["a.mp4", "b.txt", "c.mp4"]);
    assert_eq!(objects[2].size, 3);
}

#[tokio::test]
async fn test_get_object_encodes_name() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/videos.example.com/o/trips%2Fday%20one.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "trips/day one.mp4",
            "updated": "2023-01-01T00:00:00.000Z",
            "size": "42",
            "contentType": "video/mp4"
        })))
        .mount(&server)
        .await;

    let object = store(&server)
        .get_object("videos.example.com", "trips/day one.mp4")
        .await
        .unwrap();
    assert_eq!(object.name, "trips/day one.mp4");
    assert_eq!(object.size, 42);
    assert_eq!(object.content_type.as_deref(), Some("video/mp4"));
}

#[tokio::test]
async fn test_get_missing_object_is_not_found() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/videos.example.com/o/missing.mp4"))
        .respond_with(ResponseTemplate::new(404).set_body_string("No such object"))
        .mount(&server)
        .await;

    let err = store(&server)
        .get_object("videos.example.com", "missing.mp4")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/videos.example.com/o"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let err = store(&server)
        .list_objects("videos.example.com")
        .await
        .unwrap_err();
    match err {
        StorageError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "backend unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_access_token_is_cached_between_calls() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/videos.example.com/o"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "storage#objects"})))
        .expect(2)
        .mount(&server)
        .await;

    let store = store(&server);
    assert!(store.list_objects("videos.example.com").await.unwrap().is_empty());
    assert!(store.list_objects("videos.example.com").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_token_request_fails_listing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let err = store(&server)
        .list_objects("videos.example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Auth(_)));
}

#[tokio::test]
async fn test_metadata_server_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/computeMetadata/v1/instance/service-accounts/default/token"))
        .and(header("metadata-flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "metadata-token",
            "expires_in": 1800
        })))
        .mount(&server)
        .await;

    let provider = TokenProvider::new(
        TokenSource::MetadataServer {
            url: format!(
                "{}/computeMetadata/v1/instance/service-accounts/default/token",
                server.uri()
            ),
        },
        reqwest::Client::new(),
    );

    assert_eq!(provider.access_token().await.unwrap(), "metadata-token");
}
