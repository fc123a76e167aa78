//! Registry of exposed management objects.
//!
//! A two-level mapping: context name to OID string to registered object.
//! Identity is the `(context, OID string)` pair; re-registering the same
//! pair overwrites (last registration wins). Populated only while the
//! agent is in the registration phase - the agent checks that before
//! anything reaches this module.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::RegistrationHandle;
use crate::scalar::Scalar;
use crate::table::{Table, TableSnapshot};
use crate::value::Value;

/// A registered object, scalar or table.
#[derive(Clone)]
pub enum RegisteredObject {
    Scalar(Arc<Scalar>),
    Table(Arc<Table>),
}

impl RegisteredObject {
    /// Kind name as reported by [`registered`](crate::agent::Agent::registered):
    /// the scalar's value kind, or `"Table"`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(scalar) => scalar.kind().name(),
            Self::Table(_) => "Table",
        }
    }

    /// Externalized value: the scalar's current value, or the table's
    /// full row/column dump.
    pub fn export(&self) -> ObjectExport {
        match self {
            Self::Scalar(scalar) => ObjectExport::Scalar(scalar.get()),
            Self::Table(table) => ObjectExport::Table(table.snapshot()),
        }
    }
}

/// Externalized value of a registered object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectExport {
    Scalar(Value),
    Table(TableSnapshot),
}

/// One entry of a registry listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredEntry {
    /// Kind name (`"Integer32"`, `"OctetString"`, ..., or `"Table"`).
    pub kind: &'static str,
    /// Externalized value.
    pub value: ObjectExport,
}

struct Registration {
    object: RegisteredObject,
    #[allow(dead_code)] // kept for future unregistration support
    handle: RegistrationHandle,
}

pub(crate) struct ObjectRegistry {
    objects: Mutex<BTreeMap<String, BTreeMap<String, Registration>>>,
}

impl ObjectRegistry {
    pub(crate) fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    pub(crate) fn insert(
        &self,
        context: &str,
        oidstr: &str,
        object: RegisteredObject,
        handle: RegistrationHandle,
    ) {
        self.objects
            .lock()
            .entry(context.to_string())
            .or_default()
            .insert(oidstr.to_string(), Registration { object, handle });
    }

    pub(crate) fn contexts(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    pub(crate) fn registered(&self, context: &str) -> BTreeMap<String, RegisteredEntry> {
        self.objects
            .lock()
            .get(context)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(oidstr, registration)| {
                        (
                            oidstr.clone(),
                            RegisteredEntry {
                                kind: registration.object.kind_name(),
                                value: registration.object.export(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
