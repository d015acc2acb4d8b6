use chrono::Utc;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

use medlife::commands::AppContext;
use medlife::config::Config;
use medlife::storage::MemoryStore;
use medlife::HttpBackend;

pub const EMAIL: &str = "jane@example.com";

/// Context over an in-memory store talking to `server`
#[allow(dead_code)]
pub fn context_for(server: &MockServer) -> AppContext {
    let mut config = Config::default();
    config.backend.base_url = server.uri();
    let backend = HttpBackend::new(&config.backend).expect("failed to build backend");
    AppContext::with_parts(config, Arc::new(MemoryStore::new()), Arc::new(backend))
}

/// Same as [`context_for`] with [`EMAIL`] signed in
#[allow(dead_code)]
pub fn logged_in_context(server: &MockServer) -> AppContext {
    let ctx = context_for(server);
    ctx.repo
        .record_login(EMAIL, "token", Utc::now())
        .expect("failed to record login");
    ctx
}

#[allow(dead_code)]
pub fn temp_store() -> (TempDir, String) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let path = tmp.path().join("store").to_string_lossy().to_string();
    (tmp, path)
}
