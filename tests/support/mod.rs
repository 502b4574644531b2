//! Local stand-in for the remote gameday host

use axum::Router;
use chrono::NaiveDate;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

/// Game present in the fixture tree
pub const FIXTURE_GAME: &str = "gid_2017_05_29_anamlb_tormlb_1";

/// Root of the static fixture tree
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// The one day with fixture data
pub fn may_29() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 5, 29).unwrap()
}

/// Serves `tests/fixtures` over HTTP on an ephemeral port until dropped.
pub struct FixtureServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl FixtureServer {
    pub async fn start() -> Self {
        let app = Router::new().fallback_service(ServeDir::new(fixtures_dir()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, handle }
    }

    /// Remote root with the usual three-segment API prefix
    pub fn remote_root(&self) -> String {
        format!("http://{}/components/game/mlb", self.addr)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
