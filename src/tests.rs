//! Integration tests for the audio file service.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::auth::create_access_token;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::models::{NewUser, User};
use crate::oauth::YandexOAuth;
use crate::storage::AudioStorage;
use crate::{create_router, AppState};

const TEST_SECRET: &str = "integration-test-secret";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    repo: Arc<Repository>,
    pool: SqlitePool,
    audio_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let audio_dir = temp_dir.path().join("audio_files");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool.clone()));

        // Initialize content storage
        let storage = Arc::new(
            AudioStorage::open(&audio_dir)
                .await
                .expect("Failed to init storage"),
        );

        // Create config
        let config = Config {
            db_path,
            secret_key: TEST_SECRET.to_string(),
            access_token_expire_minutes: 30,
            yandex_client_id: "test-client".to_string(),
            yandex_client_secret: "test-secret".to_string(),
            yandex_redirect_uri: "http://localhost:8000/auth/yandex/callback".to_string(),
            superuser_email: String::new(),
            audio_files_dir: audio_dir.clone(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let oauth = Arc::new(YandexOAuth::new(&config));

        let state = AppState {
            repo: repo.clone(),
            storage,
            oauth,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
            base_url,
            repo,
            pool,
            audio_dir,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create_user(&self, yandex_id: &str, email: &str, is_superuser: bool) -> User {
        self.repo
            .create_user(&NewUser {
                yandex_id: yandex_id.to_string(),
                email: email.to_string(),
                username: "Test User".to_string(),
                is_superuser,
            })
            .await
            .expect("Failed to create user")
    }

    fn token_for(&self, user: &User) -> String {
        create_access_token(&user.id, TEST_SECRET, 30).expect("Failed to mint token")
    }

    fn mp3_upload(content: &[u8], name: &str) -> reqwest::multipart::Form {
        let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name(name.to_string());
        reqwest::multipart::Form::new().part("file", part)
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_root_message() {
    let fixture = TestFixture::new().await;

    let resp = fixture.client.get(fixture.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Welcome to Audio File Service");
}

#[tokio::test]
async fn test_oauth_start_redirects_to_yandex() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/auth/yandex"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 307);

    let location = resp.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://oauth.yandex.ru/authorize"));
    assert!(location.contains("client_id=test-client"));
    assert!(location.contains("response_type=code"));
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/users/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/users/me"))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "a@example.com", false).await;

    let expired = create_access_token(&user.id, TEST_SECRET, -5).unwrap();
    let resp = fixture
        .client
        .get(fixture.url("/users/me"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_token_for_deleted_user_rejected() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "a@example.com", false).await;
    let token = fixture.token_for(&user);

    fixture.repo.delete_user(&user.id).await.unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/users/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_inactive_user_rejected() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "a@example.com", false).await;

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(&user.id)
        .execute(&fixture.pool)
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/users/me"))
        .bearer_auth(fixture.token_for(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_read_users_me() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "me@example.com", false).await;

    let resp = fixture
        .client
        .get(fixture.url("/users/me"))
        .bearer_auth(fixture.token_for(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], user.id.as_str());
    assert_eq!(body["email"], "me@example.com");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["is_superuser"], false);
    // Internal fields must not leak
    assert!(body.get("yandex_id").is_none());
}

#[tokio::test]
async fn test_update_username() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "me@example.com", false).await;

    let resp = fixture
        .client
        .patch(fixture.url("/users/me?username=Renamed"))
        .bearer_auth(fixture.token_for(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["username"], "Renamed");

    let stored = fixture.repo.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "Renamed");
}

#[tokio::test]
async fn test_read_other_user_requires_superuser() {
    let fixture = TestFixture::new().await;
    let alice = fixture.create_user("ya-1", "alice@example.com", false).await;
    let bob = fixture.create_user("ya-2", "bob@example.com", false).await;

    let resp = fixture
        .client
        .get(fixture.url(&format!("/users/{}", bob.id)))
        .bearer_auth(fixture.token_for(&alice))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_superuser_reads_and_deletes_users() {
    let fixture = TestFixture::new().await;
    let admin = fixture.create_user("ya-1", "admin@example.com", true).await;
    let victim = fixture.create_user("ya-2", "bob@example.com", false).await;
    let admin_token = fixture.token_for(&admin);

    let resp = fixture
        .client
        .get(fixture.url(&format!("/users/{}", victim.id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["email"], "bob@example.com");

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/users/{}", victim.id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User deleted successfully");

    assert!(fixture.repo.get_user(&victim.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_read_unknown_user_not_found() {
    let fixture = TestFixture::new().await;
    let admin = fixture.create_user("ya-1", "admin@example.com", true).await;

    let resp = fixture
        .client
        .get(fixture.url("/users/no-such-id"))
        .bearer_auth(fixture.token_for(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_upload_rejects_unknown_extension() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "me@example.com", false).await;

    let resp = fixture
        .client
        .post(fixture.url("/audio/upload"))
        .bearer_auth(fixture.token_for(&user))
        .multipart(TestFixture::mp3_upload(b"hello", "notes.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "me@example.com", false).await;

    let form = reqwest::multipart::Form::new().text("other", "value");
    let resp = fixture
        .client
        .post(fixture.url("/audio/upload"))
        .bearer_auth(fixture.token_for(&user))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_upload_and_list_audio_files() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "me@example.com", false).await;
    let token = fixture.token_for(&user);

    let resp = fixture
        .client
        .post(fixture.url("/audio/upload"))
        .bearer_auth(&token)
        .multipart(TestFixture::mp3_upload(b"fake mp3 bytes", "My Song.mp3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["filename"], "My Song");
    assert_eq!(body["owner_id"], user.id.as_str());
    let record_id = body["id"].as_str().unwrap();

    // Content is stored under the record id, not the upload name
    let stored = fixture.audio_dir.join(format!("{}.mp3", record_id));
    assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"fake mp3 bytes");

    let resp = fixture
        .client
        .get(fixture.url("/audio/files"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let files: Value = resp.json().await.unwrap();
    let files = files.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], record_id);
}

#[tokio::test]
async fn test_upload_filename_override() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "me@example.com", false).await;

    let resp = fixture
        .client
        .post(fixture.url("/audio/upload?filename=renamed"))
        .bearer_auth(fixture.token_for(&user))
        .multipart(TestFixture::mp3_upload(b"bytes", "original.ogg"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["filename"], "renamed");
}

#[tokio::test]
async fn test_audio_files_scoped_to_owner() {
    let fixture = TestFixture::new().await;
    let alice = fixture.create_user("ya-1", "alice@example.com", false).await;
    let bob = fixture.create_user("ya-2", "bob@example.com", false).await;

    let resp = fixture
        .client
        .post(fixture.url("/audio/upload"))
        .bearer_auth(fixture.token_for(&alice))
        .multipart(TestFixture::mp3_upload(b"alice audio", "alice.wav"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/audio/files"))
        .bearer_auth(fixture.token_for(&bob))
        .send()
        .await
        .unwrap();
    let files: Value = resp.json().await.unwrap();
    assert_eq!(files.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_delete_user_removes_audio_content() {
    let fixture = TestFixture::new().await;
    let admin = fixture.create_user("ya-1", "admin@example.com", true).await;
    let victim = fixture.create_user("ya-2", "bob@example.com", false).await;

    let resp = fixture
        .client
        .post(fixture.url("/audio/upload"))
        .bearer_auth(fixture.token_for(&victim))
        .multipart(TestFixture::mp3_upload(b"doomed", "doomed.mp3"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let stored = PathBuf::from(body["file_path"].as_str().unwrap());
    assert!(tokio::fs::metadata(&stored).await.is_ok());

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/users/{}", victim.id)))
        .bearer_auth(fixture.token_for(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert!(tokio::fs::metadata(&stored).await.is_err());
    assert!(fixture
        .repo
        .list_audio_files(&victim.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_token_refresh() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_user("ya-1", "me@example.com", false).await;

    let resp = fixture
        .client
        .post(fixture.url("/token/refresh"))
        .bearer_auth(fixture.token_for(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");

    // The refreshed token is itself accepted
    let refreshed = body["access_token"].as_str().unwrap().to_string();
    let resp = fixture
        .client
        .get(fixture.url("/users/me"))
        .bearer_auth(refreshed)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/auth/yandex/callback"))
        .send()
        .await
        .unwrap();
    // Missing required query parameter
    assert_eq!(resp.status(), 400);
}
