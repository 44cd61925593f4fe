use std::{
    process::Child,
    time::{Duration, Instant},
};

use miette::IntoDiagnostic;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::command::{assert_success_command, spawn_command, Capture};
use crate::result::{bail, Result};

const READY_POLL: Duration = Duration::from_millis(200);

/// A `chromedriver` process started for the duration of the run.
///
/// The process is killed when the handle is dropped.
#[derive(Debug)]
pub struct Chromedriver {
    child: Child,
    url: String,
}

impl Chromedriver {
    /// Start the driver on the given local port and wait for it to accept sessions
    pub fn launch(program: &str, port: u16, start_timeout: Duration) -> Result<Self> {
        assert_success_command(program, |cmd| cmd.arg("--version"))
            .map_err(|err| err.wrap_err_with(|| format!("{program} is not usable")))?;

        let child = spawn_command(
            program,
            |cmd| cmd.arg(format!("--port={port}")),
            Capture::empty(),
        )?;
        let mut driver = Self {
            child,
            url: format!("http://127.0.0.1:{port}"),
        };

        info!("Started {program} on port {port}, waiting for it to be ready");
        driver.wait_ready(start_timeout)?;
        Ok(driver)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn wait_ready(&mut self, start_timeout: Duration) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .into_diagnostic()?;
        let status_url = format!("{}/status", self.url);
        let deadline = Instant::now() + start_timeout;

        loop {
            if let Some(status) = self.child.try_wait().into_diagnostic()? {
                return bail(format!("The driver exited early with status {status}"));
            }

            let ready = client
                .get(&status_url)
                .send()
                .and_then(|res| res.json::<Value>())
                .map(|json| json.pointer("/value/ready") == Some(&Value::Bool(true)));
            match ready {
                Ok(true) => return Ok(()),
                Ok(false) => debug!("Driver is up but not ready yet"),
                Err(err) => debug!("Driver is not reachable yet: {err}"),
            }

            if Instant::now() >= deadline {
                return bail(format!(
                    "The driver did not become ready in {}s",
                    start_timeout.as_secs()
                ));
            }
            std::thread::sleep(READY_POLL);
        }
    }
}

impl Drop for Chromedriver {
    fn drop(&mut self) {
        debug!("Stopping the driver process");
        if let Err(err) = self.child.kill() {
            warn!("Could not stop the driver process: {err}");
        }
        let _ = self.child.wait();
    }
}
