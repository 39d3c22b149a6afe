//! App server lifecycle: spawning mathboard-server or attaching to a
//! running deployment, with health polling

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// What the harness drives: a binary it spawns itself, or an app that is
/// already running somewhere.
#[derive(Debug, Clone)]
pub enum Target {
    Spawn(SpawnConfig),
    Attach { base_url: String },
}

/// Configuration for spawning the mathboard-server binary
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Path to the mathboard-server binary
    pub binary_path: PathBuf,

    /// Directory containing the built frontend
    pub static_dir: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for server startup
    pub startup_timeout: Duration,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("target/debug/mathboard-server"),
            static_dir: PathBuf::from("frontend/dist"),
            port: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle to the app under test
pub struct AppHandle {
    child: Option<Child>,
    base_url: String,
    /// Scratch dir holding the run's SQLite database. Dropping it removes
    /// the database, so reruns never trip the UNIQUE profile-name
    /// constraint.
    _scratch: Option<TempDir>,
}

impl AppHandle {
    /// Bring up the target: spawn and poll, or just poll
    pub async fn start(target: &Target) -> E2eResult<Self> {
        match target {
            Target::Spawn(config) => Self::spawn(config).await,
            Target::Attach { base_url } => Self::attach(base_url).await,
        }
    }

    /// Spawn the mathboard-server binary with a fresh database
    pub async fn spawn(config: &SpawnConfig) -> E2eResult<Self> {
        let port = config.port.unwrap_or_else(find_free_port);
        let base_url = format!("http://127.0.0.1:{}", port);

        let scratch = tempfile::tempdir()?;
        let db_path = scratch.path().join("mathboard.db");

        info!("Spawning app server on port {}", port);

        let child = Command::new(&config.binary_path)
            .env("MATHBOARD_ADDR", format!("127.0.0.1:{}", port))
            .env("MATHBOARD_DB_PATH", &db_path)
            .env("MATHBOARD_STATIC_DIR", &config.static_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                E2eError::AppStartup(format!(
                    "Failed to spawn {}: {}",
                    config.binary_path.display(),
                    e
                ))
            })?;

        let handle = AppHandle {
            child: Some(child),
            base_url: base_url.clone(),
            _scratch: Some(scratch),
        };

        handle.wait_for_healthy(config.startup_timeout).await?;

        info!("App server is healthy at {}", base_url);
        Ok(handle)
    }

    /// Attach to an already-running deployment
    pub async fn attach(base_url: &str) -> E2eResult<Self> {
        let handle = AppHandle {
            child: None,
            base_url: base_url.trim_end_matches('/').to_string(),
            _scratch: None,
        };

        handle.wait_for_healthy(Duration::from_secs(5)).await?;

        info!("Attached to running app at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll GET /api/health until the app responds
    async fn wait_for_healthy(&self, timeout: Duration) -> E2eResult<()> {
        let health_url = format!("{}/api/health", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    warn!("Health check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for app server...");
                    }
                    // Connection refused is expected while the server starts
                    if !e.is_connect() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::AppHealthCheck(attempts))
    }

    /// Base URL the browser should navigate against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the app if we spawned it. SIGTERM first, then kill.
    pub fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        info!("Stopping app server (pid: {})", child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .unwrap_or(0)
}
