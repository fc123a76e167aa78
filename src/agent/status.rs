//! Connection lifecycle state machine and diagnostic-event classifier.
//!
//! The connection primitive gives no synchronous feedback, so the state
//! machine is reconstructed from the engine's diagnostic stream: trimmed
//! message text is matched against the connect/disconnect/failure
//! patterns the integrated engine emits, plus the discrete index-stop
//! signal on the lifecycle stream. The message patterns are an external
//! contract with the engine and may change with its version; they are
//! centralized in [`classify`] for that reason.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{LifecycleEvent, LogSeverity};

/// Lifecycle status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    /// Unconnected; SNMP object registrations possible.
    Registration,
    /// No more registrations; first connection attempt in flight.
    FirstConnect,
    /// First connection attempt failed (fatal).
    ConnectFailed,
    /// Connected to a running master agent.
    Connected,
    /// Got disconnected; the engine retries autonomously.
    Reconnecting,
}

/// The agent's status cell, shared with the engine-callback context.
///
/// Callbacks may run on a different thread than the control loop, so
/// every read and write takes the lock.
pub(crate) struct StatusCell {
    current: Mutex<AgentStatus>,
}

impl StatusCell {
    pub(crate) fn new() -> Self {
        Self {
            current: Mutex::new(AgentStatus::Registration),
        }
    }

    pub(crate) fn get(&self) -> AgentStatus {
        *self.current.lock()
    }

    pub(crate) fn set(&self, next: AgentStatus) {
        let mut current = self.current.lock();
        if *current != next {
            tracing::debug!(from = ?*current, to = ?next, "agent status transition");
            *current = next;
        }
    }
}

/// Classification of one diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogClass {
    ConnectFailure,
    Connected,
    Disconnected,
    Other,
}

/// Strip trailing line feeds and a leading severity prefix.
///
/// The engine prefixes some messages with `"Warning: "` or `"Error: "`
/// even though the severity is delivered separately; the prefix is
/// removed before pattern matching and before forwarding to the sink.
pub(crate) fn strip_severity_prefix(raw: &str) -> &str {
    let message = raw.trim_end_matches(['\n', '\r']);
    for prefix in ["Warning:", "Error:"] {
        if let Some(rest) = message.strip_prefix(prefix) {
            return rest.trim_start_matches(' ');
        }
    }
    message
}

/// Classify a trimmed diagnostic message.
///
/// The matched texts come from the integrated engine's connection code
/// and are version-dependent; keep them in sync with the engine release
/// in use.
pub(crate) fn classify(severity: LogSeverity, message: &str) -> LogClass {
    match severity {
        LogSeverity::Warning | LogSeverity::Error
            if message.starts_with("Failed to ")
                && message.contains("the agentx master agent") =>
        {
            LogClass::ConnectFailure
        }
        LogSeverity::Info if message.starts_with("AgentX subagent connected") => {
            LogClass::Connected
        }
        LogSeverity::Info if message.starts_with("AgentX master disconnected") => {
            LogClass::Disconnected
        }
        _ => LogClass::Other,
    }
}

/// Sink receiving diagnostic messages the state machine did not consume.
pub type LogSink = Arc<dyn Fn(LogSeverity, &str) + Send + Sync>;

/// The default sink forwards onto `tracing`, mapping engine severities
/// to levels.
pub(crate) fn default_log_sink() -> LogSink {
    Arc::new(|severity, message| match severity {
        LogSeverity::Emergency | LogSeverity::Alert | LogSeverity::Critical | LogSeverity::Error => {
            tracing::error!(severity = %severity, "{message}");
        }
        LogSeverity::Warning => tracing::warn!(severity = %severity, "{message}"),
        LogSeverity::Notice | LogSeverity::Info => {
            tracing::info!(severity = %severity, "{message}");
        }
        LogSeverity::Debug => tracing::debug!(severity = %severity, "{message}"),
    })
}

/// Applies classified events to the status cell and forwards everything
/// else to the sink.
pub(crate) struct LogDispatcher {
    status: Arc<StatusCell>,
    sink: LogSink,
}

impl LogDispatcher {
    pub(crate) fn new(status: Arc<StatusCell>, sink: LogSink) -> Self {
        Self { status, sink }
    }

    /// Entry point for the engine's diagnostic stream.
    pub(crate) fn on_log(&self, severity: LogSeverity, raw: &str) {
        let message = strip_severity_prefix(raw);
        match classify(severity, message) {
            LogClass::ConnectFailure => {
                if self.status.get() == AgentStatus::FirstConnect {
                    // First attempt: fatal. The caller sees the raised
                    // error, so the message is suppressed from the sink.
                    self.status.set(AgentStatus::ConnectFailed);
                    return;
                }
                // After a prior successful connection the engine keeps
                // retrying; stay in Reconnecting and log like any other
                // message.
                tracing::warn!("{message}");
            }
            LogClass::Connected => {
                if matches!(
                    self.status.get(),
                    AgentStatus::FirstConnect | AgentStatus::Reconnecting
                ) {
                    self.status.set(AgentStatus::Connected);
                }
            }
            LogClass::Disconnected => {
                if self.status.get() == AgentStatus::Connected {
                    self.status.set(AgentStatus::Reconnecting);
                }
            }
            LogClass::Other => {}
        }
        (self.sink)(severity, message);
    }

    /// Entry point for the engine's lifecycle stream.
    pub(crate) fn on_lifecycle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::IndexStop => {
                if self.status.get() == AgentStatus::Connected {
                    self.status.set(AgentStatus::Reconnecting);
                }
            }
        }
    }
}
