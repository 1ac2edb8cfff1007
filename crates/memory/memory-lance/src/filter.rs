//! Filter expressions over the primary-key column.
//!
//! Keys are never spliced into a predicate as raw text. Each key becomes a single-quoted SQL
//! string literal with embedded quotes doubled, so a key like `a' OR '1'='1` matches only the
//! row whose id is exactly that string. Keys containing characters the Lance SQL parser may
//! interpret inside a literal (NUL, backslash) are refused before any request is made.

use memory_core::{MemoryError, Result};

use crate::schema::ID;

/// Rejects keys that cannot be expressed safely as a string literal.
pub fn check_key(key: &str) -> Result<()> {
    if key.contains('\0') {
        return Err(MemoryError::MalformedFilter {
            key: key.to_string(),
            reason: "key contains a NUL character",
        });
    }
    if key.contains('\\') {
        return Err(MemoryError::MalformedFilter {
            key: key.to_string(),
            reason: "key contains a backslash",
        });
    }
    Ok(())
}

/// Quotes `value` as a SQL string literal.
pub fn quote_literal(value: &str) -> Result<String> {
    check_key(value)?;
    Ok(format!("'{}'", value.replace('\'', "''")))
}

/// Builds `id IN ('k1', 'k2', ...)`. `keys` must not be empty.
pub fn id_in<S: AsRef<str>>(keys: &[S]) -> Result<String> {
    if keys.is_empty() {
        return Err(MemoryError::MalformedFilter {
            key: String::new(),
            reason: "empty key set",
        });
    }
    let literals = keys
        .iter()
        .map(|k| quote_literal(k.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{} IN ({})", ID, literals.join(", ")))
}
