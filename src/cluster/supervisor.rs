//! Worker pool supervision.
//!
//! # Responsibilities
//! - Keep `worker_count` live workers for the master's lifetime
//! - Track per-worker state from asynchronous lifecycle notifications
//! - Restart on unexpected exit; leave shutdown-era exits terminal
//! - Emit one structured log event per state transition
//!
//! # Design Decisions
//! - All notifications funnel through one channel and are processed in
//!   arrival order; workers share no in-process state with the master
//! - A dead worker's handle is dropped only after its replacement exists
//! - Worker exits are never fatal to the supervisor; crash loops restart
//!   unboundedly, with the exit cause logged every time

use std::collections::HashMap;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

use crate::cluster::launcher::WorkerLauncher;
use crate::cluster::worker::{WorkerExit, WorkerHandle, WorkerMessage, WorkerState};
use crate::error::SupervisorError;
use crate::lifecycle::Shutdown;

/// Lifecycle notifications delivered to the supervisor loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The worker's runtime came up.
    Online { id: u32 },
    /// The worker bound its listener.
    Listening { id: u32, address: String, port: u16 },
    /// The worker's stdout pipe closed.
    Disconnected { id: u32 },
    /// The worker process was reaped.
    Exited { id: u32, exit: WorkerExit },
}

/// Supervises a pool of worker processes in the master.
pub struct Supervisor {
    launcher: WorkerLauncher,
    target: usize,
    workers: HashMap<u32, WorkerHandle>,
    next_id: u32,
    events_tx: mpsc::UnboundedSender<LifecycleEvent>,
    events_rx: mpsc::UnboundedReceiver<LifecycleEvent>,
    shutdown: Shutdown,
    shutting_down: bool,
}

impl Supervisor {
    /// Create a supervisor for `worker_count` workers.
    pub fn new(launcher: WorkerLauncher, worker_count: usize, shutdown: Shutdown) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            launcher,
            target: worker_count.max(1),
            workers: HashMap::new(),
            next_id: 1,
            events_tx,
            events_rx,
            shutdown,
            shutting_down: false,
        }
    }

    /// Number of workers not in a terminal state.
    pub fn live_count(&self) -> usize {
        self.workers
            .values()
            .filter(|worker| worker.state != WorkerState::Exited)
            .count()
    }

    /// Tracked worker ids, ascending.
    pub fn worker_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.workers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Tracking record for one worker.
    pub fn worker(&self, id: u32) -> Option<&WorkerHandle> {
        self.workers.get(&id)
    }

    /// Spawn the initial pool.
    pub fn spawn_all(&mut self) -> Result<(), SupervisorError> {
        for _ in 0..self.target {
            self.spawn_worker()?;
        }
        Ok(())
    }

    /// Receive the next lifecycle notification.
    pub async fn next_event(&mut self) -> Option<LifecycleEvent> {
        self.events_rx.recv().await
    }

    /// Request a graceful stop: exits observed from here on are terminal
    /// and trigger no replacement.
    pub fn begin_shutdown(&mut self) {
        self.shutting_down = true;
        self.shutdown.trigger();
        tracing::info!(live = self.live_count(), "Supervisor shutting down");
    }

    /// Run the supervisor: spawn the pool, then process notifications
    /// until shutdown has been requested and the pool has drained.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        self.spawn_all()?;

        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event);
                }
                () = self.shutdown.triggered(), if !self.shutting_down => {
                    self.shutting_down = true;
                    tracing::info!(live = self.live_count(), "Supervisor shutting down");
                }
            }

            if self.shutting_down && self.live_count() == 0 {
                break;
            }
        }

        tracing::info!("Supervisor stopped");
        Ok(())
    }

    /// Apply one lifecycle notification.
    pub fn handle_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Online { id } => {
                if let Some(worker) = self.workers.get_mut(&id) {
                    worker.state = WorkerState::Online;
                    tracing::info!(worker_id = id, pid = worker.pid, "Worker online");
                }
            }
            LifecycleEvent::Listening { id, address, port } => {
                if let Some(worker) = self.workers.get_mut(&id) {
                    worker.state = WorkerState::Listening;
                    tracing::info!(
                        worker_id = id,
                        pid = worker.pid,
                        address = %address,
                        port,
                        "Worker listening"
                    );
                }
            }
            LifecycleEvent::Disconnected { id } => {
                if let Some(worker) = self.workers.get_mut(&id) {
                    worker.state = WorkerState::Disconnected;
                    tracing::info!(worker_id = id, pid = worker.pid, "Worker disconnected");
                }
            }
            LifecycleEvent::Exited { id, exit } => self.handle_exit(id, exit),
        }
    }

    fn spawn_worker(&mut self) -> Result<u32, SupervisorError> {
        let id = self.next_id;
        self.next_id += 1;

        let child = self.launcher.spawn(id)?;
        let pid = child.id().unwrap_or(0);

        tracing::info!(worker_id = id, pid, "Worker spawn requested");
        self.workers.insert(
            id,
            WorkerHandle {
                id,
                pid,
                state: WorkerState::Spawning,
            },
        );

        tokio::spawn(monitor_worker(
            id,
            child,
            self.events_tx.clone(),
            self.shutdown.clone(),
        ));

        Ok(id)
    }

    fn handle_exit(&mut self, id: u32, exit: WorkerExit) {
        let pid = self.workers.get(&id).map_or(0, |worker| worker.pid);
        tracing::info!(worker_id = id, pid, exit = %exit.describe(), "Worker exited");

        if self.shutting_down {
            if let Some(worker) = self.workers.get_mut(&id) {
                worker.state = WorkerState::Exited;
            }
            return;
        }

        if let Some(worker) = self.workers.get_mut(&id) {
            worker.state = WorkerState::Restarting;
        }
        tracing::info!(worker_id = id, pid, "Worker restarting");

        match self.spawn_worker() {
            Ok(replacement) => {
                // The dead handle leaves tracking only now that its
                // replacement exists.
                self.workers.remove(&id);
                tracing::debug!(worker_id = id, replacement_id = replacement, "Worker replaced");
            }
            Err(error) => {
                if let Some(worker) = self.workers.get_mut(&id) {
                    worker.state = WorkerState::Exited;
                }
                tracing::error!(worker_id = id, error = %error, "Failed to replace worker");
            }
        }
    }
}

/// Per-worker monitor: forwards pipe messages, then reports the exit.
///
/// The pipe reader finishes (sending `Disconnected`) before the exit
/// notification goes out, so the supervisor always observes the states in
/// lifecycle order.
async fn monitor_worker(
    id: u32,
    mut child: Child,
    events: mpsc::UnboundedSender<LifecycleEvent>,
    shutdown: Shutdown,
) {
    let stdout = child.stdout.take();
    let pipe_events = events.clone();
    let reader = tokio::spawn(async move {
        let Some(stdout) = stdout else { return };
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match serde_json::from_str::<WorkerMessage>(&line) {
                Ok(WorkerMessage::Online) => {
                    let _ = pipe_events.send(LifecycleEvent::Online { id });
                }
                Ok(WorkerMessage::Listening { address, port }) => {
                    let _ = pipe_events.send(LifecycleEvent::Listening { id, address, port });
                }
                Err(_) => {
                    tracing::trace!(worker_id = id, line = %line, "Ignoring worker output");
                }
            }
        }
        let _ = pipe_events.send(LifecycleEvent::Disconnected { id });
    });

    let early_status = tokio::select! {
        status = child.wait() => Some(status),
        () = shutdown.triggered() => None,
    };
    let status = match early_status {
        Some(status) => status,
        // Shutdown won the race: take the worker down, then reap it.
        None => {
            let _ = child.start_kill();
            child.wait().await
        }
    };

    // Drain the pipe before reporting the exit.
    let _ = reader.await;

    match status {
        Ok(status) => {
            let _ = events.send(LifecycleEvent::Exited {
                id,
                exit: WorkerExit::from_status(status),
            });
        }
        Err(error) => {
            tracing::error!(worker_id = id, error = %error, "Failed to reap worker");
            let _ = events.send(LifecycleEvent::Exited {
                id,
                exit: WorkerExit {
                    code: None,
                    signal: None,
                },
            });
        }
    }
}
