//! The agent: construction, connection lifecycle, and registration
//! entry points.
//!
//! An [`Agent`] is built once, has its objects registered while the
//! status is [`AgentStatus::Registration`], then [`start`](Agent::start)s
//! the master session and serves requests via
//! [`process_once`](Agent::process_once). Registration after start fails;
//! the only fatal connection error is a failure of the *first* attempt -
//! afterwards the engine reconnects autonomously and the agent only
//! tracks the status.

mod builder;
mod registry;
mod status;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::engine::{
    AccessMode, MasterEngine, ProcessOutcome, RegistrationHandle, ScalarRegistration,
};
use crate::error::{Error, Result};
use crate::handler::HandlerChain;
use crate::oid::{Oid, OidCodec};
use crate::scalar::Scalar;
use crate::table::{Table, TableBuilder};
use crate::trap::TrapBuilder;
use crate::value::Value;

pub use builder::AgentBuilder;
pub use registry::{ObjectExport, RegisteredEntry, RegisteredObject};
pub use status::{AgentStatus, LogSink};

use registry::ObjectRegistry;
use status::StatusCell;

/// An SNMP sub-agent.
pub struct Agent {
    name: String,
    master_socket: Option<String>,
    engine: Arc<dyn MasterEngine>,
    codec: OidCodec,
    status: Arc<StatusCell>,
    registry: ObjectRegistry,
    stopping: AtomicBool,
    stop: Notify,
}

impl Agent {
    /// Start building an agent on top of the given engine.
    pub fn builder(engine: Arc<dyn MasterEngine>) -> AgentBuilder {
        AgentBuilder::new(engine)
    }

    /// The agent's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle status.
    pub fn status(&self) -> AgentStatus {
        self.status.get()
    }

    /// Connect to the master agent.
    ///
    /// No-op when a connection already exists (`Connected` or
    /// `Reconnecting`). Otherwise registration closes, the status moves
    /// to `FirstConnect`, and the engine's connection primitive runs. If
    /// its asynchronous diagnostics classify this first attempt as
    /// failed, the failure is fatal: `ConnectionFailed` names the
    /// configured master socket. Later failures are logged, never
    /// raised - the engine retries on its own.
    pub async fn start(&self) -> Result<()> {
        if matches!(
            self.status.get(),
            AgentStatus::Connected | AgentStatus::Reconnecting
        ) {
            return Ok(());
        }
        self.status.set(AgentStatus::FirstConnect);
        self.engine.open_master_session(&self.name).await?;
        if self.status.get() == AgentStatus::ConnectFailed {
            return Err(Error::ConnectionFailed {
                target: self.master_socket.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Process one pending request.
    ///
    /// With `blocking` set, waits until a request arrives; otherwise
    /// returns [`ProcessOutcome::Idle`] immediately when nothing is
    /// pending.
    pub async fn process_once(&self, blocking: bool) -> Result<ProcessOutcome> {
        self.engine.process_once(blocking).await
    }

    /// Process requests until [`shutdown`](Agent::shutdown) is called.
    ///
    /// Convenience loop over blocking `process_once`; an extension over
    /// the narrow per-request interface.
    pub async fn serve(&self) -> Result<()> {
        loop {
            if self.stopping.load(Ordering::Acquire) {
                return Ok(());
            }
            tokio::select! {
                _ = self.stop.notified() => return Ok(()),
                outcome = self.process_once(true) => {
                    outcome?;
                }
            }
        }
    }

    /// Shut the agent down: stops [`serve`](Agent::serve) and tells the
    /// engine to release the session.
    pub fn shutdown(&self) -> Result<()> {
        self.stopping.store(true, Ordering::Release);
        self.stop.notify_waiters();
        self.engine.shutdown(&self.name)
    }

    // ------------------------------------------------------------------
    // Scalar registration - one constructor per value kind.
    // ------------------------------------------------------------------

    /// Register an `Integer32` scalar.
    pub fn integer32(
        &self,
        oidstr: &str,
        initval: i32,
        writable: bool,
        context: &str,
        chain: Option<HandlerChain>,
    ) -> Result<Arc<Scalar>> {
        self.register_scalar_value(oidstr, Value::Integer32(initval), writable, context, chain)
    }

    /// Register an `Unsigned32` scalar.
    pub fn unsigned32(
        &self,
        oidstr: &str,
        initval: u32,
        writable: bool,
        context: &str,
        chain: Option<HandlerChain>,
    ) -> Result<Arc<Scalar>> {
        self.register_scalar_value(oidstr, Value::Unsigned32(initval), writable, context, chain)
    }

    /// Register a `Counter32` scalar.
    pub fn counter32(
        &self,
        oidstr: &str,
        initval: u32,
        writable: bool,
        context: &str,
        chain: Option<HandlerChain>,
    ) -> Result<Arc<Scalar>> {
        self.register_scalar_value(oidstr, Value::Counter32(initval), writable, context, chain)
    }

    /// Register a `Counter64` scalar.
    pub fn counter64(
        &self,
        oidstr: &str,
        initval: u64,
        writable: bool,
        context: &str,
        chain: Option<HandlerChain>,
    ) -> Result<Arc<Scalar>> {
        self.register_scalar_value(oidstr, Value::Counter64(initval), writable, context, chain)
    }

    /// Register a `TimeTicks` scalar.
    pub fn time_ticks(
        &self,
        oidstr: &str,
        initval: u32,
        writable: bool,
        context: &str,
        chain: Option<HandlerChain>,
    ) -> Result<Arc<Scalar>> {
        self.register_scalar_value(oidstr, Value::TimeTicks(initval), writable, context, chain)
    }

    /// Register an `IpAddress` scalar (octets in network byte order).
    pub fn ip_address(
        &self,
        oidstr: &str,
        initval: [u8; 4],
        writable: bool,
        context: &str,
        chain: Option<HandlerChain>,
    ) -> Result<Arc<Scalar>> {
        self.register_scalar_value(oidstr, Value::IpAddress(initval), writable, context, chain)
    }

    /// Register an `OctetString` scalar.
    pub fn octet_string(
        &self,
        oidstr: &str,
        initval: impl Into<String>,
        writable: bool,
        context: &str,
        chain: Option<HandlerChain>,
    ) -> Result<Arc<Scalar>> {
        self.register_scalar_value(oidstr, Value::string(initval), writable, context, chain)
    }

    fn register_scalar_value(
        &self,
        oidstr: &str,
        initial: Value,
        writable: bool,
        context: &str,
        chain: Option<HandlerChain>,
    ) -> Result<Arc<Scalar>> {
        self.ensure_registration_open(oidstr)?;
        let oid = self.parse_oid(oidstr)?;
        let scalar = Arc::new(Scalar::new(
            oidstr.to_string(),
            oid.clone(),
            context.to_string(),
            writable,
            initial,
        ));
        let handle = self.engine.register_scalar(ScalarRegistration {
            oidstr: oidstr.to_string(),
            oid,
            access: AccessMode::from_writable(writable),
            context: context.to_string(),
            scalar: Arc::clone(&scalar),
            chain: chain.map(Arc::new),
        })?;
        self.registry.insert(
            context,
            oidstr,
            RegisteredObject::Scalar(Arc::clone(&scalar)),
            handle,
        );
        Ok(scalar)
    }

    // ------------------------------------------------------------------
    // Tables and traps
    // ------------------------------------------------------------------

    /// Start building a table registered at the given OID string.
    pub fn table(&self, oidstr: impl Into<String>) -> TableBuilder<'_> {
        TableBuilder::new(self, oidstr.into())
    }

    /// Start composing a notification identified by the given OID
    /// string.
    pub fn trap(&self, oidstr: impl Into<String>) -> TrapBuilder<'_> {
        TrapBuilder::new(self, oidstr.into())
    }

    /// Send a v1-style trap from generic/specific codes.
    pub fn send_easy_trap(&self, generic: i32, specific: i32) -> Result<()> {
        self.engine.send_easy_trap(generic, specific)
    }

    // ------------------------------------------------------------------
    // Registry views
    // ------------------------------------------------------------------

    /// Contexts with at least one registration.
    pub fn contexts(&self) -> Vec<String> {
        self.registry.contexts()
    }

    /// The registered objects of one context: OID string to kind name
    /// and externalized value.
    pub fn registered(&self, context: &str) -> BTreeMap<String, RegisteredEntry> {
        self.registry.registered(context)
    }

    // ------------------------------------------------------------------
    // OID conversion
    // ------------------------------------------------------------------

    /// Resolve an OID string through the configured codec.
    pub fn resolve_oid(&self, text: &str) -> Result<Oid> {
        self.codec.parse(text)
    }

    /// Render an OID in the engine's canonical display form.
    pub fn format_oid(&self, oid: &Oid) -> String {
        self.engine.format_oid(oid)
    }

    // ------------------------------------------------------------------
    // Crate-internal seams for the table and trap builders
    // ------------------------------------------------------------------

    pub(crate) fn ensure_registration_open(&self, oidstr: &str) -> Result<()> {
        if self.status.get() != AgentStatus::Registration {
            return Err(Error::RegistrationAfterStart {
                oidstr: oidstr.into(),
            });
        }
        Ok(())
    }

    pub(crate) fn parse_oid(&self, text: &str) -> Result<Oid> {
        self.codec.parse(text)
    }

    pub(crate) fn engine(&self) -> &Arc<dyn MasterEngine> {
        &self.engine
    }

    pub(crate) fn register_table_object(
        &self,
        context: &str,
        oidstr: &str,
        table: Arc<Table>,
        handle: RegistrationHandle,
    ) {
        self.registry
            .insert(context, oidstr, RegisteredObject::Table(table), handle);
    }
}
