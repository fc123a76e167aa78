//! Typed management values.
//!
//! [`Value`] is the closed set of value kinds a sub-agent can expose:
//! the SMI scalar types plus `ObjectIdentifier`, which exists for trap
//! composition (the notification identity varbind carries an OID value)
//! and is not offered as a scalar registration kind.

use bytes::Bytes;

use crate::oid::Oid;

/// The kind of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer32,
    Unsigned32,
    Counter32,
    Counter64,
    TimeTicks,
    IpAddress,
    OctetString,
    ObjectIdentifier,
}

impl ValueKind {
    /// Canonical kind name, as reported by registry and table exports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer32 => "Integer32",
            Self::Unsigned32 => "Unsigned32",
            Self::Counter32 => "Counter32",
            Self::Counter64 => "Counter64",
            Self::TimeTicks => "TimeTicks",
            Self::IpAddress => "IpAddress",
            Self::OctetString => "OctetString",
            Self::ObjectIdentifier => "ObjectIdentifier",
        }
    }

    /// The default value for this kind (zero, empty, or 0.0.0.0).
    pub fn default_value(&self) -> Value {
        match self {
            Self::Integer32 => Value::Integer32(0),
            Self::Unsigned32 => Value::Unsigned32(0),
            Self::Counter32 => Value::Counter32(0),
            Self::Counter64 => Value::Counter64(0),
            Self::TimeTicks => Value::TimeTicks(0),
            Self::IpAddress => Value::IpAddress([0; 4]),
            Self::OctetString => Value::OctetString(Bytes::new()),
            Self::ObjectIdentifier => Value::ObjectIdentifier(Oid::default()),
        }
    }

    /// Returns `true` for the integer-valued kinds that can track a row
    /// count.
    pub fn is_counter_kind(&self) -> bool {
        matches!(
            self,
            Self::Integer32
                | Self::Unsigned32
                | Self::Counter32
                | Self::Counter64
                | Self::TimeTicks
        )
    }

    /// Parse a human type tag as used in trap definitions.
    ///
    /// Accepts the single-character tags of command-line tooling (`i`,
    /// `u`, `c`, `C`, `t`, `a`, `s`, `o`) and the spelled-out aliases
    /// (`integer32`, `gauge`, `counter64`, `ipaddress`, ...). Note that
    /// `c`/`C` are case-significant, matching the tooling convention.
    ///
    /// ```rust
    /// use subagent::value::ValueKind;
    ///
    /// assert_eq!(ValueKind::from_tag("counter64"), Some(ValueKind::Counter64));
    /// assert_eq!(ValueKind::from_tag("C"), Some(ValueKind::Counter64));
    /// assert_eq!(ValueKind::from_tag("gauge"), Some(ValueKind::Unsigned32));
    /// assert_eq!(ValueKind::from_tag("float"), None);
    /// ```
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.len() == 1 {
            return match tag {
                "i" => Some(Self::Integer32),
                "u" | "3" => Some(Self::Unsigned32),
                "c" => Some(Self::Counter32),
                "C" => Some(Self::Counter64),
                "t" => Some(Self::TimeTicks),
                "a" => Some(Self::IpAddress),
                "s" | "x" | "d" => Some(Self::OctetString),
                "o" => Some(Self::ObjectIdentifier),
                _ => None,
            };
        }

        let lower = tag.to_ascii_lowercase();
        match lower.as_str() {
            "integer" | "integer32" => Some(Self::Integer32),
            "gauge" | "gauge32" | "unsigned32" | "uinteger" => Some(Self::Unsigned32),
            "counter" | "counter32" => Some(Self::Counter32),
            "counter64" => Some(Self::Counter64),
            "timeticks" => Some(Self::TimeTicks),
            _ if lower.starts_with("ip") => Some(Self::IpAddress),
            _ if lower.starts_with("obj") || lower.starts_with("oid") => {
                Some(Self::ObjectIdentifier)
            }
            "string" | "octetstring" | "octet_str" => Some(Self::OctetString),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed management value.
///
/// `IpAddress` holds the four octets in network byte order. `Counter64`
/// is unsigned 64-bit end to end and is never routed through a narrower
/// signed type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer32(i32),
    Unsigned32(u32),
    Counter32(u32),
    Counter64(u64),
    TimeTicks(u32),
    IpAddress([u8; 4]),
    OctetString(Bytes),
    ObjectIdentifier(Oid),
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Integer32(_) => ValueKind::Integer32,
            Self::Unsigned32(_) => ValueKind::Unsigned32,
            Self::Counter32(_) => ValueKind::Counter32,
            Self::Counter64(_) => ValueKind::Counter64,
            Self::TimeTicks(_) => ValueKind::TimeTicks,
            Self::IpAddress(_) => ValueKind::IpAddress,
            Self::OctetString(_) => ValueKind::OctetString,
            Self::ObjectIdentifier(_) => ValueKind::ObjectIdentifier,
        }
    }

    /// Convenience constructor for string payloads.
    pub fn string(text: impl Into<String>) -> Self {
        Self::OctetString(Bytes::from(text.into()))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer32(v) => write!(f, "{}", v),
            Self::Unsigned32(v) | Self::Counter32(v) | Self::TimeTicks(v) => write!(f, "{}", v),
            Self::Counter64(v) => write!(f, "{}", v),
            Self::IpAddress(octets) => write!(
                f,
                "{}.{}.{}.{}",
                octets[0], octets[1], octets[2], octets[3]
            ),
            Self::OctetString(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Self::ObjectIdentifier(oid) => write!(f, "{}", oid),
        }
    }
}
