//! Scalar registered objects.

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::value::{Value, ValueKind};

/// A single typed management variable exposed at one OID.
///
/// The current value sits behind a lock: the application reads and
/// writes it from its control flow while the engine reads and (for
/// writable scalars) writes it while serving requests.
#[derive(Debug)]
pub struct Scalar {
    oidstr: String,
    oid: Oid,
    context: String,
    kind: ValueKind,
    writable: bool,
    value: Mutex<Value>,
}

impl Scalar {
    pub(crate) fn new(
        oidstr: String,
        oid: Oid,
        context: String,
        writable: bool,
        initial: Value,
    ) -> Self {
        Self {
            oidstr,
            oid,
            context,
            kind: initial.kind(),
            writable,
            value: Mutex::new(initial),
        }
    }

    /// The OID string this scalar was registered under.
    pub fn name(&self) -> &str {
        &self.oidstr
    }

    /// The resolved OID.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// The registration context.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The value kind, fixed at construction.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether SET requests may modify this scalar.
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// Current value.
    pub fn get(&self) -> Value {
        self.value.lock().clone()
    }

    /// Replace the value. The kind is fixed: a value of any other kind
    /// is rejected with `TypeMismatch` and the stored value is untouched.
    pub fn set(&self, value: Value) -> Result<()> {
        if value.kind() != self.kind {
            return Err(Error::TypeMismatch {
                expected: self.kind,
                actual: value.kind(),
            });
        }
        *self.value.lock() = value;
        Ok(())
    }

    /// Store a row count, coerced to this scalar's kind.
    ///
    /// Only meaningful for the integer kinds; table registration rejects
    /// other kinds as row counters.
    pub(crate) fn store_count(&self, count: u64) {
        let value = match self.kind {
            ValueKind::Counter64 => Value::Counter64(count),
            ValueKind::Counter32 => Value::Counter32(count.min(u64::from(u32::MAX)) as u32),
            ValueKind::Unsigned32 => Value::Unsigned32(count.min(u64::from(u32::MAX)) as u32),
            ValueKind::TimeTicks => Value::TimeTicks(count.min(u64::from(u32::MAX)) as u32),
            ValueKind::Integer32 => Value::Integer32(count.min(i32::MAX as u64) as i32),
            _ => {
                tracing::warn!(scalar = %self.oidstr, kind = %self.kind, "row counter has non-integer kind");
                return;
            }
        };
        *self.value.lock() = value;
    }
}
