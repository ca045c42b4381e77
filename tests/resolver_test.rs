//! 公开资源解析测试（wiremock 模拟 Disk API）

mod common;

use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yadisk_relay::yadisk::{
    self, AccessToken, FileCategory, PublicLink, ResourceCache, ResourceEntry, ResourceType,
};

const LINK: &str = "https://disk.yandex.ru/d/shared-folder";

fn link() -> PublicLink {
    PublicLink::parse(LINK, &["https://disk.yandex.ru/".to_string()]).unwrap()
}

fn token() -> AccessToken {
    AccessToken::new("test-token")
}

fn folder_body() -> serde_json::Value {
    json!({
        "_embedded": {
            "items": [
                {
                    "name": "cat.png",
                    "type": "file",
                    "path": "/cat.png",
                    "mime_type": "image/png",
                    "file": "https://downloader.example/a?filename=cat.png"
                },
                {"name": "docs", "type": "dir", "path": "/docs"}
            ]
        }
    })
}

/// 记录读写次数的缓存
#[derive(Default)]
struct CountingCache {
    inner: Mutex<HashMap<String, Vec<ResourceEntry>>>,
    sets: AtomicUsize,
    ttls: Mutex<Vec<Duration>>,
}

impl ResourceCache for CountingCache {
    fn get(&self, key: &str) -> Option<Vec<ResourceEntry>> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, entries: Vec<ResourceEntry>, ttl: Duration) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.ttls.lock().unwrap().push(ttl);
        self.inner.lock().unwrap().insert(key.to_string(), entries);
    }

    fn invalidate(&self, key: &str) {
        self.inner.lock().unwrap().remove(key);
    }
}

#[tokio::test]
async fn test_folder_listing_is_flattened() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/public/resources"))
        .and(query_param("public_key", LINK))
        .and(header("authorization", "OAuth test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body()))
        .expect(1)
        .mount(&server)
        .await;

    let state = common::mock_state(&server);
    let entries = yadisk::resolve_public_resources(&state, &link(), &token())
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "cat.png");
    assert_eq!(entries[1].kind, ResourceType::Folder);

    let images = yadisk::filter_entries(entries.clone(), FileCategory::Images);
    assert_eq!(images, vec![entries[0].clone()]);
}

#[tokio::test]
async fn test_requests_only_needed_fields() {
    let server = MockServer::start().await;

    let fields = "name,type,path,mime_type,file,\
_embedded.items.name,_embedded.items.type,_embedded.items.path,\
_embedded.items.mime_type,_embedded.items.file";

    Mock::given(method("GET"))
        .and(path("/v1/disk/public/resources"))
        .and(query_param("fields", fields))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "dir"})))
        .expect(1)
        .mount(&server)
        .await;

    let state = common::mock_state(&server);
    let entries = yadisk::resolve_public_resources(&state, &link(), &token())
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_single_file_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/public/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "track.mp3",
            "type": "file",
            "path": "/",
            "mime_type": "audio/mpeg",
            "file": "https://downloader.example/t?filename=track.mp3"
        })))
        .mount(&server)
        .await;

    let state = common::mock_state(&server);
    let entries = yadisk::resolve_public_resources(&state, &link(), &token())
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "track.mp3");
    assert_eq!(entries[0].mime_type.as_deref(), Some("audio/mpeg"));
}

#[tokio::test]
async fn test_second_resolve_hits_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/public/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(CountingCache::default());
    let state = common::mock_state_with_cache(&server, cache.clone());

    let first = yadisk::resolve_public_resources(&state, &link(), &token())
        .await
        .unwrap();
    let second = yadisk::resolve_public_resources(&state, &link(), &token())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 1);
    assert_eq!(*cache.ttls.lock().unwrap(), vec![Duration::from_secs(300)]);
}

#[tokio::test]
async fn test_cache_is_shared_across_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/public/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body()))
        .expect(1)
        .mount(&server)
        .await;

    let state = common::mock_state_with_cache(&server, common::memory_cache());

    yadisk::resolve_public_resources(&state, &link(), &AccessToken::new("user-a"))
        .await
        .unwrap();
    let entries = yadisk::resolve_public_resources(&state, &link(), &AccessToken::new("user-b"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn test_upstream_error_leaves_cache_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/public/resources"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "DiskNotFoundError",
            "message": "Resource not found."
        })))
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(CountingCache::default());
    let state = common::mock_state_with_cache(&server, cache.clone());

    for _ in 0..2 {
        let err = yadisk::resolve_public_resources(&state, &link(), &token())
            .await
            .unwrap_err();
        match err {
            yadisk::RelayError::Upstream { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    assert!(cache.get(LINK).is_none());
}

#[tokio::test]
async fn test_unauthorized_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/public/resources"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let state = common::mock_state(&server);
    let err = yadisk::resolve_public_resources(&state, &link(), &token())
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_malformed_body_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/public/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let cache = common::memory_cache();
    let state = common::mock_state_with_cache(&server, cache.clone());
    let err = yadisk::resolve_public_resources(&state, &link(), &token())
        .await
        .unwrap_err();
    assert!(matches!(err, yadisk::RelayError::Upstream { .. }));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_is_upstream_error() {
    let state = common::unreachable_state();

    let err = yadisk::resolve_public_resources(&state, &link(), &token())
        .await
        .unwrap_err();
    assert!(matches!(err, yadisk::RelayError::Upstream { status: None, .. }));
}
