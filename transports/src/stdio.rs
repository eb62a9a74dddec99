use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_once_cell::OnceCell;
use async_trait::async_trait;
use courier_core::transport::{RemoteCall, RemoteResult, Transport, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to a backend executable over standard input/output, one process per call.
///
/// ## Communication Protocol:
/// - **Stdin:** the request envelope, `{"command": "...", "params": {...}}`,
///   after which stdin is closed.
/// - **Stdout:** exactly one result, `{"success": true, "data": ...}` or
///   `{"success": false, "error": "..."}`.
/// - **Stderr:** free-form diagnostics. Forwarded to the log, never parsed.
///
/// ## Exit status:
/// A backend that rejects a call may exit non-zero. Stdout is still checked
/// first: if it holds a failure result, that result is returned as a normal
/// backend rejection. Otherwise the call fails with
/// [`TransportError::ProcessFailed`] carrying the exit status and stderr.
///
/// ## Program lookup:
/// The first call resolves the program (a path, or a bare name looked up on
/// `PATH`) and caches the outcome, including a failed lookup. Only executable
/// files match. A `PATH` passed through [`envs`](Self::envs) is searched
/// instead of this process's own.
pub struct StdioTransport {
    program: PathBuf,
    args: Vec<String>,
    env_vars: HashMap<String, String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
    resolved: OnceCell<Result<PathBuf, String>>,
}

impl StdioTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        StdioTransport {
            program: program.into(),
            args: Vec::new(),
            env_vars: HashMap::new(),
            working_dir: None,
            timeout: DEFAULT_TIMEOUT,
            resolved: OnceCell::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, vars: HashMap<String, String>) -> Self {
        self.env_vars.extend(vars);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn resolve(&self) -> Result<PathBuf, String> {
        let program = self.program.clone();
        // A PATH given in the backend's environment takes precedence for lookup too.
        let search_path: Option<OsString> = self
            .env_vars
            .get("PATH")
            .map(OsString::from)
            .or_else(|| std::env::var_os("PATH"));

        let lookup = tokio::task::spawn_blocking(move || {
            let cwd = std::env::current_dir()?;
            which::which_in(&program, search_path, cwd).map_err(std::io::Error::other)
        })
        .await;

        match lookup {
            Ok(Ok(path)) => {
                tracing::info!("Using backend program: {}", path.display());
                Ok(path)
            }
            Ok(Err(e)) => {
                tracing::error!("Backend program {:?} not found: {}", self.program, e);
                Err(format!("backend program {:?} not found: {}", self.program, e))
            }
            Err(join_err) => Err(format!("backend program lookup failed: {}", join_err)),
        }
    }

    async fn run(&self, program: &Path, call: &RemoteCall) -> Result<RemoteResult, TransportError> {
        let request_json = call.to_json()?;

        let mut command = Command::new(program);
        command
            .args(&self.args)
            .envs(&self.env_vars)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        let mut child = command.spawn().map_err(|e| {
            TransportError::Unavailable(format!("failed to spawn {}: {}", program.display(), e))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Io(std::io::Error::other("failed to open backend stdin")))?;
        // Written from its own task so a backend that answers before draining
        // stdin cannot deadlock us on a full pipe.
        let write_task = tokio::spawn(async move {
            stdin.write_all(&request_json).await?;
            stdin.shutdown().await?;
            Ok::<(), std::io::Error>(())
        });

        let mut stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Io(std::io::Error::other("failed to open backend stdout")))?;
        let mut stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| TransportError::Io(std::io::Error::other("failed to open backend stderr")))?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let (stdout_res, stderr_res) = tokio::join!(
            stdout_handle.read_to_end(&mut stdout_buf),
            stderr_handle.read_to_end(&mut stderr_buf)
        );

        let status = child.wait().await?;

        let stderr_str = String::from_utf8_lossy(&stderr_buf).to_string();
        if !stderr_str.trim().is_empty() {
            if status.success() {
                tracing::debug!("Backend '{}' stderr: {}", call.command(), stderr_str.trim_end());
            } else {
                tracing::warn!("Backend '{}' stderr: {}", call.command(), stderr_str.trim_end());
            }
        }

        stdout_res?;
        stderr_res?;

        // A backend that exits without reading its input closes the pipe under us.
        // That is only an error if it also failed to answer.
        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if status.success() && !stdout_buf.is_empty() => {
                tracing::debug!("Backend '{}' did not consume its input: {}", call.command(), e);
            }
            Ok(Err(e)) => return Err(TransportError::Io(e)),
            Err(join_err) => return Err(TransportError::Io(std::io::Error::other(join_err))),
        }

        if status.success() {
            return RemoteResult::from_slice(call.command(), &stdout_buf);
        }

        if stdout_buf.is_empty() {
            tracing::warn!("Backend '{}' exited with {} and no output", call.command(), status);
        } else {
            match RemoteResult::from_slice(call.command(), &stdout_buf) {
                Ok(failure @ RemoteResult::Failure { .. }) => return Ok(failure),
                Ok(RemoteResult::Success { .. }) => {
                    tracing::error!(
                        "Backend '{}' exited with {} but reported success. Treating as process failure.",
                        call.command(),
                        status
                    );
                }
                Err(parse_err) => {
                    tracing::warn!(
                        "Backend '{}' exited with {} and stdout was not a result: {}",
                        call.command(),
                        status,
                        parse_err
                    );
                }
            }
        }

        Err(TransportError::ProcessFailed {
            status,
            stderr: stderr_str,
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn invoke(&self, call: RemoteCall) -> Result<RemoteResult, TransportError> {
        let program = self
            .resolved
            .get_or_init(self.resolve())
            .await
            .as_ref()
            .map_err(|e| TransportError::Unavailable(e.clone()))?
            .clone();

        tracing::debug!(call_id = %call.id(), command = call.command(), "Spawning backend");
        match tokio::time::timeout(self.timeout, self.run(&program, &call)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Backend call '{}' timed out after {:?}", call.command(), self.timeout);
                Err(TransportError::Timeout {
                    command: call.command().to_string(),
                    after: self.timeout,
                })
            }
        }
    }
}
