//! External protocol-engine seams.
//!
//! The management core never touches the wire. Everything that encodes,
//! decodes, or transports PDUs lives behind [`MasterEngine`], a narrow
//! trait mirroring the handful of calls the core actually needs: open the
//! master session, register objects, process one pending request, send a
//! trap. MIB symbol resolution is a second, even narrower seam
//! ([`MibResolver`]).
//!
//! Connection establishment is feedback-poor by design: opening the
//! master session reports success or failure only through the engine's
//! diagnostic stream. The core therefore subscribes two callbacks - a
//! general log stream and a discrete lifecycle stream - and reconstructs
//! the connection state from them (see [`crate::agent`]).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::handler::HandlerChain;
use crate::oid::Oid;
use crate::scalar::Scalar;
use crate::table::{ColumnDef, Table};
use crate::value::ValueKind;
use crate::varbind::VarBind;

/// Type alias for boxed async return type (dyn-compatible).
///
/// Async trait methods cannot be object-safe, and engines are stored as
/// `Arc<dyn MasterEngine>`, so the async engine calls return `BoxFuture`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Severity labels of the engine's diagnostic stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl std::fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Emergency => "Emergency",
            Self::Alert => "Alert",
            Self::Critical => "Critical",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Notice => "Notice",
            Self::Info => "Info",
            Self::Debug => "Debug",
        };
        f.write_str(label)
    }
}

/// Discrete events on the engine's lifecycle stream.
///
/// The stream carries a single signal: the master agent stopped the
/// session's index allocations, which the state machine treats as a
/// disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    IndexStop,
}

/// Outcome of a single request-processing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// One pending request was handled.
    Processed,
    /// Nothing was pending (non-blocking mode only).
    Idle,
}

/// Whether a registered object accepts SET requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    /// Build from a writability flag.
    pub fn from_writable(writable: bool) -> Self {
        if writable {
            Self::ReadWrite
        } else {
            Self::ReadOnly
        }
    }
}

/// Opaque handle to a completed object registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle(pub u64);

/// Opaque handle to a table schema under construction in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaHandle(pub u64);

/// Callback receiving the engine's diagnostic stream.
pub type LogCallback = Box<dyn Fn(LogSeverity, &str) + Send + Sync>;

/// Callback receiving the engine's lifecycle stream.
pub type LifecycleCallback = Box<dyn Fn(LifecycleEvent) + Send + Sync>;

/// Pass-through configuration applied before engine initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Run as a sub-agent rather than a standalone agent.
    pub agent_role: bool,
    /// Transport specification of the master agent's control socket.
    pub master_socket: Option<String>,
    /// Directory for the engine's persistence files.
    pub persistence_dir: Option<String>,
}

/// A scalar registration handed to the engine.
pub struct ScalarRegistration {
    /// The OID string the object was registered under.
    pub oidstr: String,
    /// The resolved OID.
    pub oid: Oid,
    /// SET permission.
    pub access: AccessMode,
    /// Registration context (namespace partition).
    pub context: String,
    /// The object; the engine reads and writes it while serving requests.
    pub scalar: Arc<Scalar>,
    /// Optional handler stages run ahead of the engine's built-in
    /// processing.
    pub chain: Option<Arc<HandlerChain>>,
}

/// A table registration handed to the engine.
pub struct TableRegistration {
    /// The OID string the table was registered under.
    pub oidstr: String,
    /// The resolved OID.
    pub oid: Oid,
    /// SET permission for externally-created rows.
    pub access: AccessMode,
    /// Registration context (namespace partition).
    pub context: String,
    /// The table; the engine resolves and mutates rows while serving
    /// requests.
    pub table: Arc<Table>,
    /// Optional handler stages run ahead of the engine's built-in
    /// processing.
    pub chain: Option<Arc<HandlerChain>>,
}

/// The external protocol engine.
///
/// Implementations wrap a real agent stack; tests use a scripted
/// in-memory engine. All registration-style calls report failure through
/// [`Error::AgentOperation`](crate::error::Error::AgentOperation) result
/// codes and are never retried by the core.
pub trait MasterEngine: Send + Sync + 'static {
    /// Apply pass-through configuration. Called once, before `init`.
    fn configure(&self, config: &EngineConfig) -> Result<()>;

    /// Initialize the engine under the given agent name.
    fn init(&self, name: &str) -> Result<()>;

    /// Subscribe the diagnostic/log stream.
    fn subscribe_log(&self, callback: LogCallback) -> Result<()>;

    /// Subscribe the lifecycle stream.
    fn subscribe_lifecycle(&self, callback: LifecycleCallback) -> Result<()>;

    /// Open the connection to the master agent.
    ///
    /// This primitive gives no synchronous success/failure feedback;
    /// outcome is reported through the subscribed streams, possibly after
    /// this call returns.
    fn open_master_session<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Register a scalar leaf object.
    fn register_scalar(&self, registration: ScalarRegistration) -> Result<RegistrationHandle>;

    /// Create a table schema with the given ordered index kinds.
    fn create_table_schema(&self, name: &str, index_kinds: &[ValueKind]) -> Result<SchemaHandle>;

    /// Append a default-row column to a schema under construction.
    fn add_default_column(&self, schema: SchemaHandle, column: &ColumnDef) -> Result<()>;

    /// Complete a table registration.
    fn register_table(
        &self,
        schema: SchemaHandle,
        registration: TableRegistration,
    ) -> Result<RegistrationHandle>;

    /// Process one pending request.
    ///
    /// In blocking mode this may wait indefinitely for a request to
    /// arrive; in non-blocking mode it returns
    /// [`ProcessOutcome::Idle`] immediately when nothing is pending.
    fn process_once<'a>(&'a self, blocking: bool) -> BoxFuture<'a, Result<ProcessOutcome>>;

    /// Send a notification built from an ordered varbind list.
    fn send_trap(&self, varbinds: &[VarBind], context: Option<&str>) -> Result<()>;

    /// Send a v1-style trap from generic/specific codes.
    fn send_easy_trap(&self, generic: i32, specific: i32) -> Result<()>;

    /// Shut the engine down.
    fn shutdown(&self, name: &str) -> Result<()>;

    /// Render an OID in the engine's canonical display form.
    ///
    /// The default renders dotted numeric; engines wrapping a real stack
    /// substitute their own formatter so that core-produced text agrees
    /// with tool-produced text.
    fn format_oid(&self, oid: &Oid) -> String {
        oid.to_string()
    }
}

/// MIB symbol resolution.
pub trait MibResolver: Send + Sync + 'static {
    /// Resolve symbolic-or-numeric OID text to an OID, or `None` if the
    /// text does not resolve.
    fn resolve(&self, text: &str) -> Option<Oid>;

    /// Load an additional MIB module from a file path.
    fn load_module(&self, _path: &str) -> Result<()> {
        Ok(())
    }
}
