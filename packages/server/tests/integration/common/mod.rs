use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tempfile::TempDir;

use vaultbox_common::Cipher;
use vaultbox_common::config::{EncryptionConfig, StorageAppConfig};
use vaultbox_common::storage::filesystem::FilesystemBlobStore;
use vaultbox_server::config::{AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig};
use vaultbox_server::files::{FileService, MemoryMetadataStore};
use vaultbox_server::state::AppState;
use vaultbox_server::utils::jwt;

const JWT_SECRET: &str = "test-secret-for-integration-tests";

/// Upload ceiling used by every test server.
pub const MAX_UPLOAD_SIZE: u64 = 64 * 1024;

pub mod routes {
    pub const HEALTH: &str = "/api/health";
    pub const FILES: &str = "/api/v1/files";

    pub fn file(id: &str) -> String {
        format!("/api/v1/files/{id}")
    }
}

/// A running test server with its own blob directory and in-memory records.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    blob_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// Raw download response; bodies are arbitrary bytes.
pub struct TestDownload {
    pub status: u16,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let blob_dir = TempDir::new().expect("Failed to create blob directory");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "unused://in-memory".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            storage: StorageAppConfig {
                max_upload_size: MAX_UPLOAD_SIZE,
                ..Default::default()
            },
            encryption: EncryptionConfig {
                key: Cipher::generate_key_hex(),
            },
        };

        let blobs = FilesystemBlobStore::new(blob_dir.path().to_path_buf())
            .await
            .expect("Failed to create blob store");
        let cipher =
            Cipher::from_hex(&app_config.encryption.key).expect("Generated key should be valid");
        let files = FileService::new(
            Arc::new(blobs),
            Arc::new(MemoryMetadataStore::new()),
            cipher,
            MAX_UPLOAD_SIZE,
        );

        let state = AppState {
            config: Arc::new(app_config),
            files,
        };
        let app = vaultbox_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            blob_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Issue a bearer token for `user_id`, as the identity provider would.
    pub fn token_for(&self, user_id: i32) -> String {
        jwt::sign(user_id, &format!("user{user_id}"), JWT_SECRET, Duration::hours(1))
            .expect("Failed to sign token")
    }

    /// Every encrypted blob stored for `user_id`.
    pub fn blob_paths(&self, user_id: i32) -> Vec<PathBuf> {
        let dir = self.blob_dir.path().join("files").join(user_id.to_string());
        match std::fs::read_dir(&dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Flip one bit of a stored blob in place.
    pub fn corrupt_blob(path: &Path, index: usize) {
        let mut bytes = std::fs::read(path).expect("Failed to read blob");
        bytes[index] ^= 0x01;
        std::fs::write(path, bytes).expect("Failed to write blob");
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn download_with_token(&self, path: &str, token: &str) -> TestDownload {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.unwrap_or_default().to_vec();
        TestDownload {
            status,
            headers,
            bytes,
        }
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn upload_with_token(
        &self,
        file_name: &str,
        mime_type: Option<&str>,
        file_bytes: Vec<u8>,
        token: &str,
    ) -> TestResponse {
        let mut part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        if let Some(mime) = mime_type {
            part = part.mime_str(mime).expect("Failed to set MIME type");
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(routes::FILES))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload a file and return its `id`.
    pub async fn upload_file(&self, token: &str, file_name: &str, file_bytes: Vec<u8>) -> String {
        let res = self
            .upload_with_token(file_name, Some("application/octet-stream"), file_bytes, token)
            .await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        res.id()
    }

    /// Make a file public as its owner.
    pub async fn publish(&self, token: &str, id: &str) {
        let res = self
            .patch_with_token(
                &routes::file(id),
                &serde_json::json!({ "visibility": "public" }),
                token,
            )
            .await;
        assert_eq!(res.status, 200, "publish failed: {}", res.text);
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
