//! Canonical row-index encoding.
//!
//! A row's identity inside its table is the OID suffix its index tuple
//! would occupy in the registered subtree. The canonical index *string*
//! is derived from that suffix - not from the tuple directly - so that
//! rows created or looked up from the application side render
//! byte-for-byte like rows created from the wire side, and like the
//! composite indexes standard display tooling prints: integer components
//! as decimal, string components as their packed bytes decoded back to
//! text with the surrounding quotes stripped.

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::value::{Value, ValueKind};

/// Encode an index tuple into its OID suffix arcs.
///
/// Components are matched positionally against the declared index kinds:
/// integer kinds occupy one arc, octet strings a length arc followed by
/// one arc per byte, IP addresses four arcs, and sub-OIDs a length arc
/// followed by their arcs.
pub(crate) fn encode_index_arcs(
    table: &str,
    kinds: &[ValueKind],
    values: &[Value],
) -> Result<Vec<u32>> {
    if values.len() != kinds.len() {
        return Err(Error::IndexMismatch {
            table: table.into(),
            expected: kinds.len(),
            actual: values.len(),
        });
    }

    let mut arcs = Vec::new();
    for (kind, value) in kinds.iter().zip(values) {
        if value.kind() != *kind {
            return Err(Error::TypeMismatch {
                expected: *kind,
                actual: value.kind(),
            });
        }
        match value {
            Value::Integer32(v) => {
                let arc = u32::try_from(*v).map_err(|_| {
                    Error::invalid_oid(v.to_string(), crate::error::OidErrorKind::InvalidComponent)
                })?;
                arcs.push(arc);
            }
            Value::Unsigned32(v) | Value::Counter32(v) | Value::TimeTicks(v) => arcs.push(*v),
            Value::Counter64(v) => {
                let arc = u32::try_from(*v).map_err(|_| {
                    Error::invalid_oid(v.to_string(), crate::error::OidErrorKind::InvalidComponent)
                })?;
                arcs.push(arc);
            }
            Value::IpAddress(octets) => {
                arcs.extend(octets.iter().map(|&o| u32::from(o)));
            }
            Value::OctetString(bytes) => {
                arcs.push(bytes.len() as u32);
                arcs.extend(bytes.iter().map(|&b| u32::from(b)));
            }
            Value::ObjectIdentifier(oid) => {
                arcs.push(oid.len() as u32);
                arcs.extend_from_slice(oid.arcs());
            }
        }
    }
    Ok(arcs)
}

/// Canonical index string for a row, given its suffix arcs.
///
/// Builds the full row OID the way the wire side would - registered
/// table OID, the entry arc, a placeholder column arc, then the index
/// arcs - and renders everything after the entry prefix. The placeholder
/// column never appears in the output; it only keeps the suffix aligned
/// with real row OIDs.
pub(crate) fn canonical_index(table_oid: &Oid, kinds: &[ValueKind], index_arcs: &[u32]) -> String {
    let mut full = table_oid.clone();
    full.push(1); // entry
    full.push(2); // placeholder column
    for &arc in index_arcs {
        full.push(arc);
    }
    let suffix = &full.arcs()[table_oid.len() + 2..];
    render_index(kinds, suffix)
}

/// Render suffix arcs as the display form of the composite index.
///
/// Malformed suffixes (arcs that do not fit the declared kinds, as a
/// buggy wire peer could produce) degrade to plain dotted numeric for
/// the remainder rather than panicking.
fn render_index(kinds: &[ValueKind], arcs: &[u32]) -> String {
    let mut out = String::new();
    let mut pos = 0;

    for kind in kinds {
        if pos >= arcs.len() {
            break;
        }
        if !out.is_empty() {
            out.push('.');
        }
        match kind {
            ValueKind::OctetString => {
                let len = arcs[pos] as usize;
                pos += 1;
                let Some(packed) = arcs.get(pos..pos + len) else {
                    return render_numeric_rest(out, &arcs[pos..]);
                };
                let bytes: Vec<u8> = packed.iter().map(|&a| a as u8).collect();
                out.push_str(&String::from_utf8_lossy(&bytes));
                pos += len;
            }
            ValueKind::IpAddress => {
                let Some(quad) = arcs.get(pos..pos + 4) else {
                    return render_numeric_rest(out, &arcs[pos..]);
                };
                for (i, arc) in quad.iter().enumerate() {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(&arc.to_string());
                }
                pos += 4;
            }
            ValueKind::ObjectIdentifier => {
                let len = arcs[pos] as usize;
                pos += 1;
                let Some(sub) = arcs.get(pos..pos + len) else {
                    return render_numeric_rest(out, &arcs[pos..]);
                };
                for (i, arc) in sub.iter().enumerate() {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(&arc.to_string());
                }
                pos += len;
            }
            _ => {
                out.push_str(&arcs[pos].to_string());
                pos += 1;
            }
        }
    }

    if pos < arcs.len() {
        return render_numeric_rest(out, &arcs[pos..]);
    }
    out
}

fn render_numeric_rest(mut out: String, arcs: &[u32]) -> String {
    for arc in arcs {
        if !out.is_empty() && !out.ends_with('.') {
            out.push('.');
        }
        out.push_str(&arc.to_string());
    }
    out
}
