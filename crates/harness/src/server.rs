//! Site-under-test lifecycle: spawn, health check, teardown

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use snapcheck_core::SiteConfig;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Handle to a running site process. The process is torn down on drop, so
/// a run that errors out never leaves the site behind.
pub struct SiteServer {
    child: Child,
    base_url: String,
}

impl SiteServer {
    pub async fn spawn(config: &SiteConfig) -> HarnessResult<Self> {
        let base_url = config.base_url();

        info!("spawning site under test on port {}", config.port);

        let child = Command::new(&config.command)
            .args(&config.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                HarnessError::SiteStartup(format!("failed to spawn {}: {}", config.command, e))
            })?;

        let server = Self { child, base_url };

        server
            .wait_for_healthy(
                Duration::from_secs(config.startup_timeout_secs),
                &config.health_path,
            )
            .await?;

        info!("site is healthy at {}", server.base_url);
        Ok(server)
    }

    async fn wait_for_healthy(
        &self,
        timeout_duration: Duration,
        health_path: &str,
    ) -> HarnessResult<()> {
        let health_url = format!(
            "{}/{}",
            self.base_url,
            health_path.trim_start_matches('/')
        );
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => warn!("health check returned {}", resp.status()),
                Err(e) => {
                    if attempts == 1 {
                        info!("waiting for site to start...");
                    }
                    // Connection refused is expected while the site starts
                    if !e.is_connect() {
                        warn!("health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(HarnessError::SiteHealthCheck(attempts))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stop(&mut self) {
        info!("stopping site (pid: {})", self.child.id());

        // Graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for SiteServer {
    fn drop(&mut self) {
        self.stop();
    }
}
