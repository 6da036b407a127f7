//! Process topology selection.
//!
//! Decides, once per process, whether this process supervises a worker pool
//! or binds a listener itself. Pure decision; the caller supplies the role
//! (workers are re-executed with a flag that marks them as such).

use crate::config::ServerConfig;

/// Role of the current process within the cluster topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// The initially launched process.
    Master,
    /// A process spawned by a supervising master.
    Worker,
}

/// What the current process should do at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupAction {
    /// Spawn and supervise workers; bind no sockets.
    RunAsSupervisor,
    /// Resolve TLS material and bind a listener.
    RunAsListener,
}

/// Select the startup action for this process.
///
/// Only a master with clustering enabled supervises; every other
/// combination listens (a worker, or a standalone master).
pub fn select(server: &ServerConfig, role: ProcessRole) -> StartupAction {
    match role {
        ProcessRole::Master if server.cluster_enabled => StartupAction::RunAsSupervisor,
        _ => StartupAction::RunAsListener,
    }
}
