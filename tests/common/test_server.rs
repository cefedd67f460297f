use std::sync::{Arc, LazyLock};

use tempfile::TempDir;
use tokio::task::JoinHandle;

use apotek::auth::{PasswordHasher, SessionKey};
use apotek::server::{AppState, create_router};
use apotek::store::{SqliteStore, Store};
use apotek::types::SUPERADMIN_ROLE;

pub const SUPERADMIN_PASSWORD: &str = "sandi-rahasia-123";

/// Hashing is the slow part of setup; every seeded account shares one hash.
static PASSWORD_HASH: LazyLock<String> = LazyLock::new(|| {
    PasswordHasher::new()
        .hash(SUPERADMIN_PASSWORD)
        .expect("hash test password")
});

pub struct TestServer {
    _temp_dir: TempDir,
    pub base_url: String,
    pub store: Arc<SqliteStore>,
    server_task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");

        let store = Arc::new(
            SqliteStore::new(temp_dir.path().join("apotek.db")).expect("open test db"),
        );
        store.initialize().expect("initialize schema");
        store
            .create_user(
                "superadmin",
                &PASSWORD_HASH,
                SUPERADMIN_ROLE,
                None,
                "active",
            )
            .expect("seed superadmin");

        let state = Arc::new(AppState::new(store.clone(), SessionKey::generate()));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{addr}");

        let server_task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            _temp_dir: temp_dir,
            base_url,
            store,
            server_task,
        }
    }

    /// Seeds an account directly in the store with the shared test password.
    pub fn seed_user(&self, username: &str, role: &str, outlet_id: Option<i64>) {
        self.store
            .create_user(username, &PASSWORD_HASH, role, outlet_id, "active")
            .expect("seed user");
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let client = reqwest::Client::new();
        let resp: serde_json::Value = client
            .post(format!("{}/api/login", self.base_url))
            .json(&serde_json::json!({"username": username, "password": password}))
            .send()
            .await
            .expect("login request")
            .json()
            .await
            .expect("parse login response");
        resp["token"]
            .as_str()
            .unwrap_or_else(|| panic!("no token in login response: {resp}"))
            .to_string()
    }

    pub async fn superadmin_token(&self) -> String {
        self.login("superadmin", SUPERADMIN_PASSWORD).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}
