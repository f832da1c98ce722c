//! Identifier normalization.
//!
//! Logical table ids are arbitrary strings; physical relation names must use
//! the store's identifier alphabet (`A-Z`, `0-9`, `_`) and fit its length
//! limit. The encoding below is prefix-free, so distinct logical ids always
//! produce distinct physical ids:
//!
//! ```text
//!  logical char    physical
//!  ────────────    ─────────────────────────
//!  a-z             A-Z
//!  0-9             0-9
//!  A-Z             _A-_Z
//!  _               __
//!  anything else   _0 + 6 hex digits of the code point
//! ```
//!
//! The configured namespace prefix is prepended to keep user tables away
//! from the store's own relations.

use tabula_common::{BinderConfig, LogicalTableId, PhysicalId, TabulaError, TabulaResult};

/// Converts logical table ids into physical relation names.
#[derive(Debug, Clone)]
pub struct IdentifierNormalizer {
    prefix: String,
    max_len: usize,
}

impl IdentifierNormalizer {
    /// Creates a normalizer from the binder configuration.
    pub fn new(config: &BinderConfig) -> Self {
        Self {
            prefix: config.namespace_prefix.clone(),
            max_len: config.max_identifier_length,
        }
    }

    /// Returns the namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the maximum identifier length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Normalizes a logical table id.
    ///
    /// Fails with `InvalidIdentifier` if the id is empty or the encoded name
    /// exceeds the maximum identifier length.
    pub fn normalize(&self, logical: &LogicalTableId) -> TabulaResult<PhysicalId> {
        if logical.is_empty() {
            return Err(TabulaError::invalid_identifier(
                logical.as_str(),
                "table id is empty",
            ));
        }

        let mut out = String::with_capacity(self.prefix.len() + logical.as_str().len());
        out.push_str(&self.prefix);
        for ch in logical.as_str().chars() {
            match ch {
                'a'..='z' => out.push(ch.to_ascii_uppercase()),
                '0'..='9' => out.push(ch),
                'A'..='Z' => {
                    out.push('_');
                    out.push(ch);
                }
                '_' => out.push_str("__"),
                other => out.push_str(&format!("_0{:06X}", u32::from(other))),
            }
            if out.len() > self.max_len {
                return Err(TabulaError::invalid_identifier(
                    logical.as_str(),
                    format!(
                        "normalized name exceeds the {}-character identifier limit",
                        self.max_len
                    ),
                ));
            }
        }

        Ok(PhysicalId::new(out))
    }

    /// Recovers the logical table id from a physical name produced by
    /// [`normalize`](Self::normalize).
    ///
    /// Returns `None` if the name does not carry this normalizer's prefix or
    /// is not a valid encoding.
    pub fn denormalize(&self, physical: &PhysicalId) -> Option<LogicalTableId> {
        let encoded = physical.as_str().strip_prefix(self.prefix.as_str())?;
        if encoded.is_empty() {
            return None;
        }

        let mut out = String::with_capacity(encoded.len());
        let mut chars = encoded.chars();
        while let Some(ch) = chars.next() {
            match ch {
                'A'..='Z' => out.push(ch.to_ascii_lowercase()),
                '0'..='9' => out.push(ch),
                '_' => match chars.next()? {
                    '_' => out.push('_'),
                    '0' => {
                        let hex: String = chars.by_ref().take(6).collect();
                        if hex.len() != 6 {
                            return None;
                        }
                        let code = u32::from_str_radix(&hex, 16).ok()?;
                        out.push(char::from_u32(code)?);
                    }
                    upper @ 'A'..='Z' => out.push(upper),
                    _ => return None,
                },
                _ => return None,
            }
        }

        Some(LogicalTableId::new(out))
    }
}

/// Normalizes a column name taken from the catalog.
///
/// Column names are stored upper-cased, so names differing only in case
/// surface as collisions. Fails with `InvalidIdentifier` if the name is
/// empty, longer than `max_len`, or uses characters outside `[A-Za-z0-9_]`.
pub fn normalize_column_name(name: &str, max_len: usize) -> TabulaResult<String> {
    if name.is_empty() {
        return Err(TabulaError::invalid_identifier(name, "column name is empty"));
    }
    if name.len() > max_len {
        return Err(TabulaError::invalid_identifier(
            name,
            format!("column name exceeds the {max_len}-character identifier limit"),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(TabulaError::invalid_identifier(
            name,
            format!("column name contains illegal character {bad:?}"),
        ));
    }
    Ok(name.to_ascii_uppercase())
}
