//! Test helpers: build AppState and router for integration tests.
//!
//! Every test app gets its own scratch directory and its own stub upstream
//! (a mockito server standing in for pomf, catbox and litterbox).
//! Run from workspace root: `cargo test -p fatbox-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use fatbox_api::setup::routes;
use fatbox_api::state::AppState;
use fatbox_core::{Config, HostingEndpoints, UpstreamConfig};
use fatbox_services::HostingClient;
use fatbox_storage::LocalChunkStore;
use mockito::ServerGuard;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const POMF_PATH: &str = "/upload.php";
pub const CATBOX_PATH: &str = "/user/api.php";
pub const LITTERBOX_PATH: &str = "/resources/internals/api.php";

/// Test application: server, stub upstream, and owned scratch directory.
pub struct TestApp {
    pub server: TestServer,
    pub upstream: ServerGuard,
    pub scratch: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.scratch.path().join("uploads")
    }

    pub fn session_dir(&self, upload_id: &str) -> PathBuf {
        self.uploads_dir().join(upload_id)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.scratch.path().join("temp")
    }

    /// Files currently left in the temp scratch directory.
    pub fn temp_files(&self) -> Vec<PathBuf> {
        list_dir(&self.temp_dir())
    }

    /// Session directories currently in the uploads scratch directory.
    pub fn sessions(&self) -> Vec<PathBuf> {
        list_dir(&self.uploads_dir())
    }
}

pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn stub_endpoints(base: &str) -> HostingEndpoints {
    HostingEndpoints {
        pomf_upload_url: format!("{}{}", base, POMF_PATH),
        catbox_api_url: format!("{}{}", base, CATBOX_PATH),
        litterbox_api_url: format!("{}{}", base, LITTERBOX_PATH),
    }
}

/// Setup test app with an isolated scratch dir and a stub upstream.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Same as [`setup_test_app`], with a hook to adjust the configuration.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let upstream = mockito::Server::new_async().await;
    let scratch = tempfile::tempdir().expect("Failed to create scratch directory");

    let mut config = Config::default().with_scratch_dir(scratch.path());
    config.endpoints = stub_endpoints(&upstream.url());
    config.upstream = UpstreamConfig {
        timeout: Duration::from_secs(5),
        max_retries: 0,
        retry_base_delay: Duration::from_millis(1),
    };
    customize(&mut config);
    config.validate().expect("Invalid test configuration");

    let store = LocalChunkStore::from_config(&config)
        .await
        .expect("Failed to create chunk store");
    let forwarder = HostingClient::new(config.endpoints.clone(), &config.upstream)
        .expect("Failed to create hosting client");

    let state = Arc::new(AppState::new(Arc::new(store), Arc::new(forwarder)));
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        upstream,
        scratch,
    }
}

/// Send one chunk through `/chunk` and assert it was accepted.
pub async fn upload_chunk(app: &TestApp, upload_id: &str, index: u64, data: &[u8]) {
    let form = MultipartForm::new()
        .add_text("uploadId", upload_id)
        .add_text("index", index.to_string())
        .add_part(
            "chunk",
            Part::bytes(bytes::Bytes::copy_from_slice(data)).file_name("blob"),
        );
    let response = app.client().post("/chunk").multipart(form).await;
    assert_eq!(response.status_code(), 200, "chunk {} rejected", index);
}
