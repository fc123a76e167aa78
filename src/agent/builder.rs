//! Agent construction.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::Notify;

use crate::engine::{EngineConfig, LogSeverity, MasterEngine, MibResolver};
use crate::error::Result;
use crate::oid::OidCodec;

use super::registry::ObjectRegistry;
use super::status::{LogDispatcher, LogSink, StatusCell, default_log_sink};
use super::Agent;

/// Builder for [`Agent`].
///
/// Created via [`Agent::builder`]. Everything here is a pass-through the
/// engine or resolver consumes during `build`; the agent itself only
/// keeps the name and master socket (the latter for the fatal
/// first-connect error message).
pub struct AgentBuilder {
    engine: Arc<dyn MasterEngine>,
    name: String,
    master_socket: Option<String>,
    persistence_dir: Option<String>,
    use_mib_files: bool,
    mib_files: Vec<String>,
    resolver: Option<Arc<dyn MibResolver>>,
    log_sink: Option<LogSink>,
}

impl AgentBuilder {
    pub(crate) fn new(engine: Arc<dyn MasterEngine>) -> Self {
        Self {
            engine,
            name: "subagent".into(),
            master_socket: None,
            persistence_dir: None,
            use_mib_files: true,
            mib_files: Vec::new(),
            resolver: None,
            log_sink: None,
        }
    }

    /// The agent's name, used for engine initialization and shutdown.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Transport specification of the master agent's control socket
    /// (e.g. `tcp:localhost:705` or a unix socket path).
    pub fn master_socket(mut self, socket: impl Into<String>) -> Self {
        self.master_socket = Some(socket.into());
        self
    }

    /// Directory the engine stores persistence information in.
    pub fn persistence_dir(mut self, dir: impl Into<String>) -> Self {
        self.persistence_dir = Some(dir.into());
        self
    }

    /// Disable MIB files entirely: OID strings are then parsed
    /// numeric-only, even when a resolver is configured.
    pub fn use_mib_files(mut self, use_mib_files: bool) -> Self {
        self.use_mib_files = use_mib_files;
        self
    }

    /// Load an additional MIB file (repeatable). Required when
    /// registered OIDs belong to MIBs outside the resolver's default
    /// search path.
    pub fn mib_file(mut self, path: impl Into<String>) -> Self {
        self.mib_files.push(path.into());
        self
    }

    /// MIB symbol resolver enabling symbolic OID strings.
    pub fn resolver(mut self, resolver: Arc<dyn MibResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Receive every diagnostic message the state machine did not
    /// consume. Without a sink, messages go to `tracing`.
    pub fn log_sink(
        mut self,
        sink: impl Fn(LogSeverity, &str) + Send + Sync + 'static,
    ) -> Self {
        self.log_sink = Some(Arc::new(sink));
        self
    }

    /// Wire the engine subscriptions, apply configuration, initialize
    /// the engine, and load MIB modules.
    pub fn build(self) -> Result<Agent> {
        let status = Arc::new(StatusCell::new());
        let sink = self.log_sink.unwrap_or_else(default_log_sink);
        let dispatcher = Arc::new(LogDispatcher::new(Arc::clone(&status), sink));

        let log_dispatcher = Arc::clone(&dispatcher);
        self.engine.subscribe_log(Box::new(move |severity, message| {
            log_dispatcher.on_log(severity, message);
        }))?;

        let lifecycle_dispatcher = Arc::clone(&dispatcher);
        self.engine.subscribe_lifecycle(Box::new(move |event| {
            lifecycle_dispatcher.on_lifecycle(event);
        }))?;

        self.engine.configure(&EngineConfig {
            agent_role: true,
            master_socket: self.master_socket.clone(),
            persistence_dir: self.persistence_dir.clone(),
        })?;
        self.engine.init(&self.name)?;

        let codec = match (&self.resolver, self.use_mib_files) {
            (Some(resolver), true) => OidCodec::symbolic(Arc::clone(resolver)),
            _ => OidCodec::numeric(),
        };

        if self.use_mib_files
            && let Some(resolver) = &self.resolver
        {
            for path in &self.mib_files {
                resolver.load_module(path)?;
            }
        }

        Ok(Agent {
            name: self.name,
            master_socket: self.master_socket,
            engine: self.engine,
            codec,
            status,
            registry: ObjectRegistry::new(),
            stopping: AtomicBool::new(false),
            stop: Notify::new(),
        })
    }
}
