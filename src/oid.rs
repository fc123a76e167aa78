//! Object identifier type and parsing.
//!
//! An [`Oid`] is an ordered sequence of unsigned 32-bit arcs, bounded by
//! [`MAX_OID_LEN`]. OIDs compare lexicographically, which is the ordering
//! management tooling relies on for row traversal.
//!
//! String-to-OID conversion goes through [`OidCodec`], which supports two
//! modes: symbolic resolution through a [`MibResolver`](crate::engine::MibResolver)
//! (mixed symbol/numeric text such as `MY-MIB::myTable`), and numeric-only
//! parsing of dotted-decimal text.

use smallvec::SmallVec;
use std::sync::Arc;

use crate::engine::MibResolver;
use crate::error::{Error, OidErrorKind, Result};

/// Maximum number of arcs in an OID (net-snmp's `MAX_OID_LEN`).
pub const MAX_OID_LEN: usize = 128;

/// Object identifier - an ordered sequence of unsigned integer arcs.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// The arcs of this OID.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Returns `true` if the OID has no arcs.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Append a single arc.
    pub fn push(&mut self, arc: u32) {
        self.arcs.push(arc);
    }

    /// Returns `true` if this OID starts with the given prefix.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// Return a new OID with the given arcs appended.
    pub fn concat(&self, suffix: &[u32]) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend_from_slice(suffix);
        Oid { arcs }
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

// Debug renders the dotted form; the raw arc list adds nothing over it.
impl std::fmt::Debug for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Oid::from_slice(arcs)
    }
}

/// Construct an [`Oid`] from a comma-separated list of arcs.
///
/// ```rust
/// use subagent::oid;
///
/// let oid = oid!(1, 3, 6, 1, 4, 1);
/// assert_eq!(oid.to_string(), "1.3.6.1.4.1");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),+ $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),+])
    };
}

/// String-to-OID converter with symbolic and numeric-only modes.
///
/// In symbolic mode, dotted-and-named component text is resolved through
/// the configured [`MibResolver`](crate::engine::MibResolver). In
/// numeric-only mode the text is split on `.` and every component must
/// parse as a non-negative integer.
///
/// ```rust
/// use subagent::oid::OidCodec;
///
/// let codec = OidCodec::numeric();
/// let oid = codec.parse("1.3.6.1.2.1.1.3.0").unwrap();
/// assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.3.0");
/// assert!(codec.parse("1.3.six").is_err());
/// ```
#[derive(Clone)]
pub struct OidCodec {
    resolver: Option<Arc<dyn MibResolver>>,
}

impl OidCodec {
    /// Numeric-only codec: no MIB resolution, dotted-decimal text only.
    pub fn numeric() -> Self {
        Self { resolver: None }
    }

    /// Symbolic codec resolving text through the given resolver.
    pub fn symbolic(resolver: Arc<dyn MibResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// Returns `true` if this codec resolves symbolic names.
    pub fn is_symbolic(&self) -> bool {
        self.resolver.is_some()
    }

    /// Parse an OID string.
    pub fn parse(&self, text: &str) -> Result<Oid> {
        if text.is_empty() {
            return Err(Error::invalid_oid(text, OidErrorKind::Empty));
        }

        let oid = match &self.resolver {
            Some(resolver) => resolver
                .resolve(text)
                .ok_or_else(|| Error::invalid_oid(text, OidErrorKind::Unresolved))?,
            None => {
                let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();
                for component in text.split('.') {
                    let arc = component
                        .parse::<u32>()
                        .map_err(|_| Error::invalid_oid(text, OidErrorKind::InvalidComponent))?;
                    arcs.push(arc);
                }
                Oid { arcs }
            }
        };

        if oid.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid(
                text,
                OidErrorKind::TooManyArcs {
                    count: oid.len(),
                    max: MAX_OID_LEN,
                },
            ));
        }
        Ok(oid)
    }
}
