//! In-memory process spawner for exercising the supervisor without real miners.

use crate::backend::LaunchSpec;
use crate::error::{LaunchError, StopError};
use crate::spawner::{ProcessExit, ProcessHandle, ProcessSpawner};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct ProcessFlags {
    crashed: AtomicBool,
    terminated: AtomicBool,
}

impl ProcessFlags {
    fn is_live(&self) -> bool {
        !self.crashed.load(Ordering::SeqCst) && !self.terminated.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct ScriptState {
    next_pid: AtomicU32,
    missing_executable: AtomicBool,
    fail_next: Mutex<Option<LaunchError>>,
    processes: Mutex<Vec<Arc<ProcessFlags>>>,
    specs: Mutex<Vec<LaunchSpec>>,
    last_grace: Mutex<Option<Duration>>,
}

/// Spawner whose processes only exist as flags. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedSpawner {
    state: Arc<ScriptState>,
}

impl ScriptedSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launches(&self) -> usize {
        self.state.specs.lock().len()
    }

    pub fn last_spec(&self) -> Option<LaunchSpec> {
        self.state.specs.lock().last().cloned()
    }

    pub fn live_processes(&self) -> usize {
        self.state.processes.lock().iter().filter(|p| p.is_live()).count()
    }

    /// Grace period handed to the most recent `terminate`.
    pub fn last_grace(&self) -> Option<Duration> {
        *self.state.last_grace.lock()
    }

    /// Every launch fails with `ExecutableNotFound` until cleared.
    pub fn set_missing_executable(&self, missing: bool) {
        self.state.missing_executable.store(missing, Ordering::SeqCst);
    }

    pub fn fail_next_launch(&self, error: LaunchError) {
        *self.state.fail_next.lock() = Some(error);
    }

    /// Makes the most recently launched process exit on its own.
    pub fn crash_current(&self) {
        if let Some(flags) = self.state.processes.lock().last() {
            flags.crashed.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ProcessSpawner for ScriptedSpawner {
    async fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError> {
        if self.state.missing_executable.load(Ordering::SeqCst) {
            return Err(LaunchError::ExecutableNotFound(spec.program.clone()));
        }
        if let Some(error) = self.state.fail_next.lock().take() {
            return Err(error);
        }

        let flags = Arc::new(ProcessFlags::default());
        self.state.processes.lock().push(flags.clone());
        self.state.specs.lock().push(spec.clone());

        let pid = 1000 + self.state.next_pid.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedHandle {
            pid,
            flags,
            state: self.state.clone(),
        }))
    }
}

struct ScriptedHandle {
    pid: u32,
    flags: Arc<ProcessFlags>,
    state: Arc<ScriptState>,
}

#[async_trait]
impl ProcessHandle for ScriptedHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        if self.flags.crashed.load(Ordering::SeqCst) {
            Ok(Some(ProcessExit { code: Some(1) }))
        } else if self.flags.terminated.load(Ordering::SeqCst) {
            Ok(Some(ProcessExit { code: None }))
        } else {
            Ok(None)
        }
    }

    async fn terminate(&mut self, grace: Duration) -> Result<(), StopError> {
        *self.state.last_grace.lock() = Some(grace);
        self.flags.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }
}
