//! Outbound notification composition.
//!
//! A trap's variable list has a fixed shape: optionally the sender's
//! uptime, then the notification identity (`snmpTrapOID.0` carrying the
//! trap OID as a value), then the payload varbinds in the order they
//! were added. [`TrapBuilder`] assembles that list and hands it to the
//! engine's trap primitive; a context string turns the v2-style trap
//! into a v3-style one.

use crate::agent::Agent;
use crate::error::Result;
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

/// `SNMPv2-MIB::sysUpTime.0`
const SYS_UPTIME_INSTANCE: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 3, 0];

/// `SNMPv2-MIB::snmpTrapOID.0`
const SNMP_TRAP_OID_INSTANCE: &[u32] = &[1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0];

/// Builder for an outbound notification.
///
/// Created via [`Agent::trap`](crate::agent::Agent::trap).
pub struct TrapBuilder<'a> {
    agent: &'a Agent,
    oidstr: String,
    uptime: Option<u32>,
    entries: Vec<(String, Value)>,
    context: Option<String>,
}

impl<'a> TrapBuilder<'a> {
    pub(crate) fn new(agent: &'a Agent, oidstr: String) -> Self {
        Self {
            agent,
            oidstr,
            uptime: None,
            entries: Vec::new(),
            context: None,
        }
    }

    /// Override the uptime varbind. Without this the engine supplies
    /// the agent's own uptime.
    pub fn uptime(mut self, ticks: u32) -> Self {
        self.uptime = Some(ticks);
        self
    }

    /// Append a payload varbind.
    pub fn varbind(mut self, oidstr: impl Into<String>, value: Value) -> Self {
        self.entries.push((oidstr.into(), value));
        self
    }

    /// Send within the given context (v3-style).
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Resolve all OIDs, assemble the variable list, and send.
    pub fn send(self) -> Result<()> {
        let trap_oid = self.agent.parse_oid(&self.oidstr)?;

        let mut varbinds = Vec::with_capacity(self.entries.len() + 2);
        if let Some(ticks) = self.uptime {
            varbinds.push(VarBind::new(
                Oid::from_slice(SYS_UPTIME_INSTANCE),
                Value::TimeTicks(ticks),
            ));
        }
        varbinds.push(VarBind::new(
            Oid::from_slice(SNMP_TRAP_OID_INSTANCE),
            Value::ObjectIdentifier(trap_oid),
        ));
        for (oidstr, value) in self.entries {
            varbinds.push(VarBind::new(self.agent.parse_oid(&oidstr)?, value));
        }

        self.agent
            .engine()
            .send_trap(&varbinds, self.context.as_deref())
    }
}
