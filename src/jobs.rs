//! The background job table.
//!
//! Jobs are keyed by a shell-local ID recycled to the smallest non-negative
//! integer not held by a live job. Exited children are collected by a
//! non-blocking reaper invoked at safe points from the main loop; the
//! SIGCHLD handler itself never touches the table.

use std::collections::BTreeMap;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// Lifecycle state of a job. Non-running entries exist only transiently
/// inside a reconciliation pass; the listing never shows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Finished,
    Signaled,
}

/// One background job.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: u32,
    pub pid: Pid,
    pub command_text: String,
    pub state: JobState,
    pub started_at: Instant,
}

/// Mapping from job ID to job, with lowest-free-slot ID assignment.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: BTreeMap<u32, Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every exited child and drop its table entry.
    ///
    /// Repeats `waitpid(-1, WNOHANG)` until no zombie remains. Idempotent:
    /// a second pass with no new terminations changes nothing.
    pub fn reconcile(&mut self) {
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(pid, _)) => self.mark(pid, JobState::Finished),
                Ok(WaitStatus::Signaled(pid, _, _)) => self.mark(pid, JobState::Signaled),
                Ok(WaitStatus::StillAlive) => break,
                Err(Errno::ECHILD) => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
        self.jobs.retain(|_, job| job.state == JobState::Running);
    }

    fn mark(&mut self, pid: Pid, state: JobState) {
        if let Some(job) = self.jobs.values_mut().find(|j| j.pid == pid) {
            job.state = state;
        }
    }

    /// Register a new background job and return its ID.
    ///
    /// Reaps first, so a slot freed by an already-dead job is reused. The ID
    /// is the smallest non-negative integer not held by a live job.
    pub fn add(&mut self, pid: Pid, command_text: impl Into<String>) -> u32 {
        self.reconcile();
        let id = self.lowest_free_id();
        self.jobs.insert(
            id,
            Job {
                id,
                pid,
                command_text: command_text.into(),
                state: JobState::Running,
                started_at: Instant::now(),
            },
        );
        id
    }

    fn lowest_free_id(&self) -> u32 {
        let mut candidate = 0;
        for &id in self.jobs.keys() {
            if id == candidate {
                candidate += 1;
            } else {
                break;
            }
        }
        candidate
    }

    pub fn get(&self, id: u32) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn remove(&mut self, id: u32) -> Option<Job> {
        self.jobs.remove(&id)
    }

    /// The most recently assigned live ID (the largest one).
    pub fn max_id(&self) -> Option<u32> {
        self.jobs.keys().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Print the listing: one line per running job, ascending ID.
    pub fn list(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for job in self.jobs.values() {
            writeln!(
                out,
                "[{}] {} : {} {} secs",
                job.id,
                job.command_text,
                job.pid,
                job.started_at.elapsed().as_secs()
            )?;
        }
        Ok(())
    }

    /// `quit kill` sweep: SIGTERM every running job, give it a grace period,
    /// escalate to SIGKILL for survivors. Empties the table.
    pub fn kill_all(&mut self, out: &mut dyn Write) -> std::io::Result<()> {
        let ids: Vec<u32> = self.jobs.keys().copied().collect();
        for id in ids {
            let (pid, text) = {
                let job = &self.jobs[&id];
                (job.pid, job.command_text.clone())
            };
            write!(out, "[{}] {} - sending SIGTERM... {}", id, text, pid)?;
            out.flush()?;
            let _ = signal::kill(pid, Signal::SIGTERM);
            if wait_with_grace(pid, Duration::from_secs(5)) {
                writeln!(out)?;
            } else {
                let _ = signal::kill(pid, Signal::SIGKILL);
                let _ = waitpid(pid, None);
                writeln!(out, " done")?;
            }
            self.jobs.remove(&id);
        }
        Ok(())
    }
}

/// Poll for the child's termination for up to `grace`. Returns whether it
/// was collected in time.
fn wait_with_grace(pid: Pid, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    loop {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {}
            Ok(_) | Err(_) => return true,
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
