// tests/common/mod.rs

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use quiz_service::{
    build_state,
    config::Config,
    db::{PgStore, PoolSettings, QuestionRepository, SqliteStore, Store},
    models::question::NewQuestion,
    routes,
    services::auth::seed_admin_user,
};
use serde_json::{Value, json};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    /// Base URL, e.g. "http://127.0.0.1:12345".
    pub address: String,
    pub store: Arc<SqliteStore>,
    pub client: reqwest::Client,
    _db: TempSqlite,
}

/// A migrated SQLite store in a throw-away file, removed on drop.
pub struct TempSqlite {
    pub store: Arc<SqliteStore>,
    pub database_url: String,
    path: PathBuf,
}

impl Drop for TempSqlite {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.path.display(), suffix));
        }
    }
}

pub async fn temp_sqlite() -> TempSqlite {
    let path = std::env::temp_dir().join(format!("quiz_{}.db", uuid::Uuid::new_v4()));
    let database_url = format!("sqlite://{}", path.display());

    let store = SqliteStore::connect(&database_url, &PoolSettings::default())
        .await
        .expect("Failed to open SQLite test database");
    store.migrate().await.expect("Failed to migrate database");

    TempSqlite {
        store: Arc::new(store),
        database_url,
        path,
    }
}

/// Connects to the Postgres named by `TEST_POSTGRES_URL` and migrates it.
/// Returns `None` (and the caller skips) when the variable is unset.
pub async fn postgres_store() -> Option<Arc<PgStore>> {
    let Ok(database_url) = std::env::var("TEST_POSTGRES_URL") else {
        eprintln!("TEST_POSTGRES_URL not set; skipping Postgres test");
        return None;
    };

    let store = PgStore::connect(&database_url, &PoolSettings::default())
        .await
        .expect("Failed to connect to Postgres for testing. Check TEST_POSTGRES_URL.");
    store.migrate().await.expect("Failed to migrate database");

    Some(Arc::new(store))
}

/// Username that does not collide with other tests sharing a database.
pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..12])
}

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        log_dir: std::env::temp_dir().display().to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        db_max_connections: 8,
        identity_url: None,
        identity_timeout_secs: 2,
        admin_username: Some(ADMIN_USERNAME.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        cors_origins: vec!["http://localhost:5173".to_string()],
    }
}

/// Spawns the app on a random port, backed by a fresh SQLite file,
/// resolving tokens locally.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like `spawn_app`, with a hook to adjust the configuration first.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let db = temp_sqlite().await;
    let store = db.store.clone();

    let mut config = test_config(&db.database_url);
    configure(&mut config);

    let dyn_store: Arc<dyn Store> = store.clone();
    seed_admin_user(dyn_store.as_ref(), &config)
        .await
        .expect("Failed to seed admin user");

    let state = build_state(config, dyn_store).expect("Failed to build state");
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
        _db: db,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Registers `username` and returns a token for it.
    pub async fn token_for(&self, username: &str) -> String {
        let res = self.register(username, "password123").await;
        assert_eq!(res.status().as_u16(), 201, "registration failed");
        self.login_token(username, "password123").await
    }

    pub async fn admin_token(&self) -> String {
        self.login_token(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    async fn login_token(&self, username: &str, password: &str) -> String {
        let res = self.login(username, password).await;
        assert_eq!(res.status().as_u16(), 200, "login failed");
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Inserts a question directly through the store and returns its id.
    pub async fn seed_question(&self, text: &str, correct: &str) -> i64 {
        self.store
            .create_question(&NewQuestion {
                question_text: text.to_string(),
                option_a: "first".to_string(),
                option_b: "second".to_string(),
                option_c: "third".to_string(),
                option_d: "fourth".to_string(),
                correct_option: correct.to_string(),
            })
            .await
            .expect("Failed to seed question")
    }

    pub async fn submit(&self, token: &str, answers: Value) -> reqwest::Response {
        self.client
            .post(self.url("/submit"))
            .query(&[("token", token)])
            .json(&json!({ "answers": answers }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn latest(&self, token: &str) -> reqwest::Response {
        self.client
            .get(self.url("/submissions/latest"))
            .query(&[("token", token)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn submission_count(&self, username: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE username = ?")
            .bind(username)
            .fetch_one(self.store.pool())
            .await
            .unwrap()
    }

    pub async fn answer_row_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM submission_answers")
            .fetch_one(self.store.pool())
            .await
            .unwrap()
    }
}
