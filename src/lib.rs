//! # subagent
//!
//! The management core of an SNMP sub-agent: connection lifecycle
//! tracking to a master agent, a registry of exposed management objects
//! (scalars and tables), the table data model with canonical composite
//! row indexes, and trap composition.
//!
//! The wire-level protocol work - transport, PDU codec, MIB compilation -
//! is *not* here. It lives behind two narrow seams the application
//! supplies: [`engine::MasterEngine`] (open session, register objects,
//! process one request, send trap) and [`engine::MibResolver`] (symbolic
//! name to OID).
//!
//! # Lifecycle
//!
//! 1. Build an [`Agent`] over an engine with [`Agent::builder`].
//! 2. Register scalars and tables while the status is
//!    [`AgentStatus::Registration`]; registration afterwards fails with
//!    [`Error::RegistrationAfterStart`].
//! 3. [`Agent::start`] opens the master session. The connection
//!    primitive is feedback-poor: success and failure are reconstructed
//!    from the engine's diagnostic stream. A failed *first* attempt
//!    raises [`Error::ConnectionFailed`]; once connected, disconnects
//!    and reconnect failures only move the observable
//!    [`AgentStatus`] - the engine retries on its own.
//! 4. Repeatedly call [`Agent::process_once`] (or [`Agent::serve`])
//!    while the engine reads and mutates the registered objects.
//!
//! # Tables
//!
//! Rows are identified by a canonical index string derived from the OID
//! suffix the index tuple occupies on the wire, so application-side
//! lookups agree byte-for-byte with rows created by a management
//! station. See [`table`].

pub mod agent;
pub mod engine;
pub mod error;
pub mod handler;
pub mod oid;
pub mod prelude;
pub mod scalar;
pub mod table;
pub mod trap;
pub mod value;
pub mod varbind;

pub use agent::{Agent, AgentBuilder, AgentStatus, ObjectExport, RegisteredEntry};
pub use error::{Error, ErrorStatus, Result};
pub use oid::{MAX_OID_LEN, Oid, OidCodec};
pub use scalar::Scalar;
pub use table::{Table, TableBuilder, TableSnapshot};
pub use trap::TrapBuilder;
pub use value::{Value, ValueKind};
pub use varbind::VarBind;
