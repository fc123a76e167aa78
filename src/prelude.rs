//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,no_run
//! use subagent::prelude::*;
//! ```
//!
//! This imports the agent and builder types, the value and OID types,
//! error handling, and the [`oid!`] macro.

pub use crate::agent::{Agent, AgentBuilder, AgentStatus};
pub use crate::engine::{MasterEngine, MibResolver, ProcessOutcome};
pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::value::{Value, ValueKind};
pub use crate::varbind::VarBind;

#[doc(no_inline)]
pub use crate::oid;
