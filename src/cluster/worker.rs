//! Worker process bookkeeping and the master/worker wire protocol.
//!
//! Workers report lifecycle progress to the supervising master as JSON
//! documents, one per line, over their stdout pipe. The master never
//! blocks on a worker; it only reacts to these messages and to process
//! exit.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

/// Lifecycle states of a supervised worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Process created; runtime not yet confirmed.
    Spawning,
    /// Worker signalled its runtime is up.
    Online,
    /// Worker reported a bound address.
    Listening,
    /// The stdout pipe closed; an exit notification is pending.
    Disconnected,
    /// Process exited. Terminal unless a replacement was spawned.
    Exited,
    /// Unexpected exit observed; a replacement spawn is in progress.
    Restarting,
}

/// Tracking record for one spawned worker.
///
/// Owned by the supervisor; removed from tracking only once a replacement
/// exists or the supervisor is shutting down.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    /// Supervisor-assigned id, unique for the master's lifetime.
    pub id: u32,
    /// OS process id.
    pub pid: u32,
    /// Last observed lifecycle state.
    pub state: WorkerState,
}

/// Messages a worker writes to its stdout pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// The worker's runtime is up.
    Online,
    /// The worker bound its listener.
    Listening { address: String, port: u16 },
}

/// Emit a lifecycle message on stdout for the supervising master.
///
/// The pipe is block-buffered, so every message is flushed immediately.
pub fn report(message: &WorkerMessage) -> io::Result<()> {
    let line = serde_json::to_string(message).map_err(io::Error::other)?;
    let mut out = io::stdout().lock();
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

/// How a worker process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    /// Exit code, when the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal number, when killed by a signal.
    pub signal: Option<i32>,
}

impl WorkerExit {
    /// Classify a reaped exit status.
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }

    /// Log rendering: the signal name when signal-terminated, else the
    /// numeric exit code.
    pub fn describe(&self) -> String {
        match self.signal {
            Some(signal) => signal_name(signal),
            None => self
                .code
                .map_or_else(|| "unknown".to_string(), |code| code.to_string()),
        }
    }
}

/// Conventional name for a POSIX signal number.
pub fn signal_name(signal: i32) -> String {
    let name = match signal {
        1 => "SIGHUP",
        2 => "SIGINT",
        3 => "SIGQUIT",
        6 => "SIGABRT",
        9 => "SIGKILL",
        11 => "SIGSEGV",
        13 => "SIGPIPE",
        15 => "SIGTERM",
        _ => return format!("SIG{signal}"),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_round_trip_as_json_lines() {
        let message = WorkerMessage::Listening {
            address: "127.0.0.1".to_string(),
            port: 8081,
        };
        let line = serde_json::to_string(&message).unwrap();
        assert_eq!(
            line,
            r#"{"event":"listening","address":"127.0.0.1","port":8081}"#
        );
        let parsed: WorkerMessage = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn online_message_is_tag_only() {
        let line = serde_json::to_string(&WorkerMessage::Online).unwrap();
        assert_eq!(line, r#"{"event":"online"}"#);
    }

    #[test]
    fn signal_exits_describe_by_name() {
        let exit = WorkerExit {
            code: None,
            signal: Some(9),
        };
        assert_eq!(exit.describe(), "SIGKILL");

        let exit = WorkerExit {
            code: None,
            signal: Some(42),
        };
        assert_eq!(exit.describe(), "SIG42");
    }

    #[test]
    fn code_exits_describe_numerically() {
        let exit = WorkerExit {
            code: Some(3),
            signal: None,
        };
        assert_eq!(exit.describe(), "3");
    }
}
