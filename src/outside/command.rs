use std::process::{Child, Command, Stdio};

use bitflags::bitflags;
use miette::{Context, IntoDiagnostic};
use tracing::{debug, trace, Level};

use crate::result::{bail, Result};

pub const CHROMEDRIVER: &str = "chromedriver";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capture: u8 {
        const STDOUT = 0b0000010;
        const STDERR = 0b0000100;
    }
}

/// Pick how an output stream of the child is handled.
///
/// Captured streams are piped, others are shown when debugging and discarded otherwise.
fn get_io(capture: bool, is_debug: bool) -> Stdio {
    if capture {
        Stdio::piped()
    } else if is_debug {
        Stdio::inherit()
    } else {
        Stdio::null()
    }
}

fn configure<'a>(cmd: &'a mut Command, capture: Capture) -> &'a mut Command {
    let is_debug = tracing::enabled!(Level::DEBUG);
    cmd.stdin(Stdio::null())
        .stdout(get_io(capture.contains(Capture::STDOUT), is_debug))
        .stderr(get_io(capture.contains(Capture::STDERR), is_debug))
}

/// Start a long running program and return its handle without waiting for it.
pub fn spawn_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
) -> Result<Child> {
    let mut cmd = Command::new(program);
    let cmd = configure(f(&mut cmd), capture);

    debug!("Spawning command: {cmd:?}");
    let child = cmd
        .spawn()
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not start {program}"))?;
    Ok(child)
}

/// Run the command to completion and verify that it has returned a success status code.
pub fn assert_success_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
) -> Result<()> {
    let mut cmd = Command::new(program);
    let cmd = configure(f(&mut cmd), Capture::STDOUT | Capture::STDERR);

    debug!("Executing command: {cmd:?}");
    let res = cmd
        .output()
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not run {program}"))?;

    debug!("status: {}", res.status);
    trace!("stdout: {:?}", String::from_utf8_lossy(&res.stdout));
    trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));

    if res.status.success() {
        Ok(())
    } else {
        bail(format!("{program} did run but was not successful"))
    }
}
