//! Shared setup for integration tests.

#![allow(dead_code)]

use pvz_service::{App, AppConfig};
use tempfile::TempDir;

/// An application backed by a SQLite file in a temporary directory.
pub struct TestApp {
    pub app: App,
    // Removed on drop, after the pool is gone
    _dir: TempDir,
}

impl std::ops::Deref for TestApp {
    type Target = App;

    fn deref(&self) -> &App {
        &self.app
    }
}

pub fn config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::for_database(dir.path().join("pvz.db"));
    config.db_max_connections = 8;
    config.argon2_memory_kib = 8;
    config.argon2_iterations = 1;
    config
}

pub async fn spawn_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let app = App::build(config(&dir)).await.unwrap();
    TestApp { app, _dir: dir }
}

/// Bearer header for a synthetic user with the given role.
pub fn bearer(app: &App, role: pvz_core::UserRole) -> String {
    let tokens = app.users().dummy_login(role).unwrap();
    format!("Bearer {}", tokens.access_token)
}

