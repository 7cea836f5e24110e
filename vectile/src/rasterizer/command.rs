//! Command line rasterizer backend
//!
//! Drives an Inkscape-compatible executable, one subprocess per tile:
//!
//! ```text
//! inkscape {source} --export-overwrite --export-filename={out} \
//!     --export-area={l}:{t}:{r}:{b} --export-width={w} --export-height={h}
//! ```
//!
//! The export flag surface above shipped with Inkscape 1.0; older binaries
//! are rejected by the version probe.

use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use semver::Version;
use tracing::trace;

use super::{RasterizeRequest, Rasterizer, RasterizerError};

/// Program invoked when none is configured.
pub const DEFAULT_PROGRAM: &str = "inkscape";

/// Oldest rasterizer version with the supported export flags.
pub const MINIMUM_VERSION: Version = Version::new(1, 0, 0);

/// How often a timed invocation polls for child exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// [`Rasterizer`] backed by an external command line tool.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    program: String,
    timeout: Option<Duration>,
}

impl CommandRasterizer {
    /// Creates a rasterizer invoking `program`, with no time limit.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Sets a per-invocation time limit. On expiry the subprocess is killed
    /// and the tile fails with [`RasterizerError::TimedOut`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs `{program} --version` and parses the reported version.
    pub fn probe_version(&self) -> Result<Version, RasterizerError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RasterizerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RasterizerError::VersionProbe(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_version(&String::from_utf8_lossy(&output.stdout))
    }

    /// Probes the program and rejects versions older than
    /// [`MINIMUM_VERSION`].
    ///
    /// # Returns
    ///
    /// The detected version on success.
    pub fn ensure_available(&self) -> Result<Version, RasterizerError> {
        let found = self.probe_version()?;
        if found < MINIMUM_VERSION {
            return Err(RasterizerError::UnsupportedVersion {
                found,
                minimum: MINIMUM_VERSION,
            });
        }
        Ok(found)
    }

    fn spawn_error(&self, source: std::io::Error) -> RasterizerError {
        RasterizerError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    /// Spawns the command and polls for exit, killing the child once the
    /// limit passes. Stderr is drained only after exit; rasterizer
    /// diagnostics are far smaller than the pipe buffer.
    fn run_with_timeout(
        &self,
        command: &mut Command,
        limit: Duration,
    ) -> Result<Output, RasterizerError> {
        let mut child = command.spawn().map_err(|source| self.spawn_error(source))?;
        let deadline = Instant::now() + limit;

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let mut stderr = Vec::new();
                    if let Some(mut pipe) = child.stderr.take() {
                        let _ = pipe.read_to_end(&mut stderr);
                    }
                    return Ok(Output {
                        status,
                        stdout: Vec::new(),
                        stderr,
                    });
                }
                Ok(None) if Instant::now() >= deadline => {
                    // A failed kill means the child exited in the meantime;
                    // wait() reaps it either way
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RasterizerError::TimedOut(limit));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.spawn_error(source));
                }
            }
        }
    }
}

impl Default for CommandRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Rasterizer for CommandRasterizer {
    fn rasterize(&self, request: &RasterizeRequest<'_>) -> Result<(), RasterizerError> {
        let mut command = Command::new(&self.program);
        command
            .arg(request.source())
            .arg("--export-overwrite")
            .arg(format!(
                "--export-filename={}",
                request.output().display()
            ))
            .arg(format!("--export-area={}", request.region().export_area()))
            .arg(format!("--export-width={}", request.width()))
            .arg(format!("--export-height={}", request.height()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        trace!(
            "invoking {} for area {} -> {}",
            self.program,
            request.region().export_area(),
            request.output().display()
        );

        let output = match self.timeout {
            Some(limit) => self.run_with_timeout(&mut command, limit)?,
            None => command.output().map_err(|source| self.spawn_error(source))?,
        };

        if !output.status.success() {
            return Err(RasterizerError::CommandFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // Some tools exit zero yet silently skip the export
        if !request.output().exists() {
            return Err(RasterizerError::MissingOutput(request.output().to_path_buf()));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Extracts a semantic version from `--version` output such as
/// `Inkscape 1.3.2 (091e20e, 2023-11-25)`. A missing patch number is
/// treated as zero.
fn parse_version(text: &str) -> Result<Version, RasterizerError> {
    let pattern = Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("Valid regex");
    let line = text.lines().next().unwrap_or("").trim();

    let captures = pattern
        .captures(line)
        .ok_or_else(|| RasterizerError::VersionProbe(line.to_string()))?;
    let number = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
    };

    match (number(1), number(2)) {
        (Some(major), Some(minor)) => Ok(Version::new(major, minor, number(3).unwrap_or(0))),
        _ => Err(RasterizerError::VersionProbe(line.to_string())),
    }
}
