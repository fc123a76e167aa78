//! A scripted in-memory master engine and MIB resolver.
//!
//! `MockEngine` records every call the core makes and replays a
//! connect-time event script through the subscribed callbacks, which is
//! how the connection state machine is driven in tests. The log message
//! texts mirror what the real integrated engine emits; they are an
//! external contract that could change with the engine's version.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use subagent::engine::{
    AccessMode, BoxFuture, EngineConfig, LifecycleCallback, LifecycleEvent, LogCallback,
    LogSeverity, MasterEngine, MibResolver, ProcessOutcome, RegistrationHandle,
    ScalarRegistration, SchemaHandle, TableRegistration,
};
use subagent::error::{Error, Result};
use subagent::oid::Oid;
use subagent::table::{ColumnDef, Table};
use subagent::value::ValueKind;
use subagent::varbind::VarBind;
use subagent::{Agent, oid};

/// Connection-failure line as the engine logs it.
pub const CONNECT_FAIL_MSG: &str = "Failed to connect to the agentx master agent ([NIL]):";
/// Connect line as the engine logs it.
pub const CONNECTED_MSG: &str = "AgentX subagent connected";
/// Disconnect line as the engine logs it.
pub const DISCONNECTED_MSG: &str = "AgentX master disconnected us, reconnecting";

/// One scripted event emitted while `open_master_session` runs.
#[derive(Clone, Copy)]
pub enum ConnectEvent {
    Log(LogSeverity, &'static str),
    IndexStop,
}

#[derive(Default)]
pub struct MockEngine {
    log_callback: Mutex<Option<LogCallback>>,
    lifecycle_callback: Mutex<Option<LifecycleCallback>>,
    connect_script: Mutex<Vec<ConnectEvent>>,
    next_handle: AtomicU64,

    pub configs: Mutex<Vec<EngineConfig>>,
    pub inits: Mutex<Vec<String>>,
    pub opens: Mutex<Vec<String>>,
    pub scalars: Mutex<Vec<(String, String)>>,
    pub schemas: Mutex<Vec<(SchemaHandle, String, Vec<ValueKind>)>>,
    pub columns: Mutex<Vec<(SchemaHandle, u32, ValueKind)>>,
    pub tables: Mutex<Vec<(String, String, AccessMode, Arc<Table>)>>,
    pub traps: Mutex<Vec<(Vec<VarBind>, Option<String>)>>,
    pub easy_traps: Mutex<Vec<(i32, i32)>>,
    pub shutdowns: Mutex<Vec<String>>,
    /// When set, the next registration-style call fails with this code.
    pub fail_next: Mutex<Option<i32>>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine whose `open_master_session` replays the given events.
    pub fn with_connect_script(script: Vec<ConnectEvent>) -> Arc<Self> {
        let engine = Self::default();
        *engine.connect_script.lock() = script;
        Arc::new(engine)
    }

    /// Deliver a diagnostic line to the subscribed log callback.
    pub fn emit_log(&self, severity: LogSeverity, message: &str) {
        if let Some(callback) = self.log_callback.lock().as_ref() {
            callback(severity, message);
        }
    }

    /// Deliver the index-stop signal to the lifecycle callback.
    pub fn emit_index_stop(&self) {
        if let Some(callback) = self.lifecycle_callback.lock().as_ref() {
            callback(LifecycleEvent::IndexStop);
        }
    }

    fn check_fail(&self, operation: &'static str) -> Result<()> {
        if let Some(code) = self.fail_next.lock().take() {
            return Err(Error::operation(operation, code));
        }
        Ok(())
    }

    fn handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl MasterEngine for MockEngine {
    fn configure(&self, config: &EngineConfig) -> Result<()> {
        self.configs.lock().push(config.clone());
        Ok(())
    }

    fn init(&self, name: &str) -> Result<()> {
        self.inits.lock().push(name.to_string());
        Ok(())
    }

    fn subscribe_log(&self, callback: LogCallback) -> Result<()> {
        *self.log_callback.lock() = Some(callback);
        Ok(())
    }

    fn subscribe_lifecycle(&self, callback: LifecycleCallback) -> Result<()> {
        *self.lifecycle_callback.lock() = Some(callback);
        Ok(())
    }

    fn open_master_session<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.opens.lock().push(name.to_string());
            let script: Vec<ConnectEvent> = std::mem::take(&mut *self.connect_script.lock());
            for event in script {
                match event {
                    ConnectEvent::Log(severity, message) => self.emit_log(severity, message),
                    ConnectEvent::IndexStop => self.emit_index_stop(),
                }
            }
            Ok(())
        })
    }

    fn register_scalar(&self, registration: ScalarRegistration) -> Result<RegistrationHandle> {
        self.check_fail("netsnmp_register_watched_scalar")?;
        self.scalars
            .lock()
            .push((registration.context.clone(), registration.oidstr.clone()));
        Ok(RegistrationHandle(self.handle()))
    }

    fn create_table_schema(&self, name: &str, index_kinds: &[ValueKind]) -> Result<SchemaHandle> {
        self.check_fail("netsnmp_create_table_data_set")?;
        let handle = SchemaHandle(self.handle());
        self.schemas
            .lock()
            .push((handle, name.to_string(), index_kinds.to_vec()));
        Ok(handle)
    }

    fn add_default_column(&self, schema: SchemaHandle, column: &ColumnDef) -> Result<()> {
        self.check_fail("netsnmp_table_set_add_default_row")?;
        self.columns
            .lock()
            .push((schema, column.number, column.kind()));
        Ok(())
    }

    fn register_table(
        &self,
        _schema: SchemaHandle,
        registration: TableRegistration,
    ) -> Result<RegistrationHandle> {
        self.check_fail("netsnmp_register_table_data_set")?;
        self.tables.lock().push((
            registration.context.clone(),
            registration.oidstr.clone(),
            registration.access,
            Arc::clone(&registration.table),
        ));
        Ok(RegistrationHandle(self.handle()))
    }

    fn process_once<'a>(&'a self, blocking: bool) -> BoxFuture<'a, Result<ProcessOutcome>> {
        Box::pin(async move {
            Ok(if blocking {
                ProcessOutcome::Processed
            } else {
                ProcessOutcome::Idle
            })
        })
    }

    fn send_trap(&self, varbinds: &[VarBind], context: Option<&str>) -> Result<()> {
        self.check_fail("snmp_add_var")?;
        self.traps
            .lock()
            .push((varbinds.to_vec(), context.map(str::to_string)));
        Ok(())
    }

    fn send_easy_trap(&self, generic: i32, specific: i32) -> Result<()> {
        self.easy_traps.lock().push((generic, specific));
        Ok(())
    }

    fn shutdown(&self, name: &str) -> Result<()> {
        self.shutdowns.lock().push(name.to_string());
        Ok(())
    }
}

/// Resolver with a small fixed symbol table plus numeric fallback
/// (tolerating a leading dot, as a MIB-aware parser does).
pub struct MockResolver {
    symbols: Mutex<BTreeMap<String, Oid>>,
    pub loaded: Mutex<Vec<String>>,
}

impl MockResolver {
    pub fn new() -> Arc<Self> {
        let resolver = Self {
            symbols: Mutex::new(BTreeMap::new()),
            loaded: Mutex::new(Vec::new()),
        };
        resolver.define("TEST-MIB::testScalar.0", oid!(1, 3, 6, 1, 4, 1, 8072, 1, 0));
        resolver.define("TEST-MIB::testTable", oid!(1, 3, 6, 1, 4, 1, 8072, 2));
        resolver.define(
            "TEST-MIB::testNotification",
            oid!(1, 3, 6, 1, 4, 1, 8072, 9999),
        );
        Arc::new(resolver)
    }

    pub fn define(&self, name: &str, oid: Oid) {
        self.symbols.lock().insert(name.to_string(), oid);
    }
}

impl MibResolver for MockResolver {
    fn resolve(&self, text: &str) -> Option<Oid> {
        if let Some(oid) = self.symbols.lock().get(text) {
            return Some(oid.clone());
        }
        let numeric = text.strip_prefix('.').unwrap_or(text);
        numeric
            .split('.')
            .map(|component| component.parse::<u32>().ok())
            .collect::<Option<Vec<u32>>>()
            .map(|arcs| Oid::from_slice(&arcs))
    }

    fn load_module(&self, path: &str) -> Result<()> {
        self.loaded.lock().push(path.to_string());
        Ok(())
    }
}

/// An agent over the given engine with the standard test configuration.
pub fn test_agent(engine: Arc<MockEngine>) -> Agent {
    Agent::builder(engine)
        .name("test-agent")
        .master_socket("tcp:localhost:705")
        .resolver(MockResolver::new())
        .build()
        .expect("agent build")
}
