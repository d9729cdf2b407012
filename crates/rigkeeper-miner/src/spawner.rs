use crate::backend::LaunchSpec;
use crate::error::{LaunchError, StopError};
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

/// A launched miner process owned by the supervisor.
#[async_trait]
pub trait ProcessHandle: Send {
    fn pid(&self) -> Option<u32>;

    /// Non-blocking exit check.
    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>>;

    /// Polite termination, escalating to a kill once `grace` elapses.
    async fn terminate(&mut self, grace: Duration) -> Result<(), StopError>;
}

#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    async fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError>;
}

/// Spawns real miner binaries through `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSpawner;

#[async_trait]
impl ProcessSpawner for OsSpawner {
    async fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError> {
        if !spec.program.exists() {
            return Err(LaunchError::ExecutableNotFound(spec.program.clone()));
        }

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command
            .spawn()
            .map_err(|e| LaunchError::Spawn(format!("{}: {}", spec.program.display(), e)))?;

        let label = spec.backend.to_string();
        if let Some(stdout) = child.stdout.take() {
            drain_output(label.clone(), stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            drain_output(label, stderr);
        }

        info!("Launched {} (pid {:?})", spec.backend, child.id());
        Ok(Box::new(OsHandle { child }))
    }
}

// Miners are chatty; an unread pipe would eventually block them.
fn drain_output<R>(label: String, stream: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("{}: {}", label, line);
        }
    });
}

struct OsHandle {
    child: Child,
}

#[async_trait]
impl ProcessHandle for OsHandle {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        Ok(self.child.try_wait()?.map(|status| ProcessExit { code: status.code() }))
    }

    async fn terminate(&mut self, grace: Duration) -> Result<(), StopError> {
        if self.try_wait().map_err(|e| StopError::Wait(e.to_string()))?.is_some() {
            return Ok(());
        }

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => return Err(StopError::Signal(e.to_string())),
            }

            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(Ok(status)) => {
                    debug!("Miner pid {} exited with {}", pid, status);
                    return Ok(());
                }
                Ok(Err(e)) => return Err(StopError::Wait(e.to_string())),
                Err(_) => warn!("Miner pid {} ignored SIGTERM for {:?}, killing", pid, grace),
            }
        }

        #[cfg(not(unix))]
        let _ = grace;

        self.child.kill().await.map_err(|e| StopError::Kill(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MinerBackend;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_executable_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec = LaunchSpec {
            backend: MinerBackend::TRex,
            program: dir.path().join("t-rex"),
            args: vec![],
            working_dir: dir.path().to_path_buf(),
        };

        match OsSpawner.launch(&spec).await {
            Err(LaunchError::ExecutableNotFound(path)) => assert_eq!(path, dir.path().join("t-rex")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("launch should fail"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_running_process() {
        let spec = LaunchSpec {
            backend: MinerBackend::TRex,
            program: PathBuf::from("/bin/sleep"),
            args: vec!["30".into()],
            working_dir: std::env::temp_dir(),
        };
        if !spec.program.exists() {
            return;
        }

        let mut handle = OsSpawner.launch(&spec).await.expect("launch sleep");
        assert!(handle.pid().is_some());
        assert_eq!(handle.try_wait().expect("try_wait"), None);

        handle.terminate(Duration::from_secs(5)).await.expect("terminate");
        assert!(handle.try_wait().expect("try_wait").is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_kills_process_ignoring_sigterm() {
        let spec = LaunchSpec {
            backend: MinerBackend::TRex,
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "trap '' TERM; sleep 30".into()],
            working_dir: std::env::temp_dir(),
        };
        if !spec.program.exists() {
            return;
        }

        let mut handle = OsSpawner.launch(&spec).await.expect("launch sh");
        // Let the shell install its trap before the SIGTERM arrives.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(handle.try_wait().expect("try_wait"), None);

        let grace = Duration::from_millis(500);
        let started = std::time::Instant::now();
        handle.terminate(grace).await.expect("terminate");
        let elapsed = started.elapsed();

        assert!(elapsed >= grace, "returned after {:?}, before the grace period", elapsed);
        assert!(elapsed < grace + Duration::from_secs(3), "took {:?} to kill", elapsed);
        let exit = handle.try_wait().expect("try_wait").expect("process gone");
        assert_eq!(exit.code, None);
    }
}
