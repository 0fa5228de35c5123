// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composite key construction.
//
// A table has no existence in the store; it is only a prefix baked into each
// flat key. The layout is `{byte length of table}:{table}:{key}`. The decimal
// length ends at the first `:` and the table is then taken by exact byte
// count, so no table or key content can shift the boundary.

/// Derive the flat store key for `key` in `table`.
///
/// ```rust
/// assert_eq!(kvbridge_core::compose_key("users", "u1"), "5:users:u1");
/// ```
pub fn compose_key(table: &str, key: &str) -> String {
    let mut flat = String::with_capacity(table.len() + key.len() + 6);
    flat.push_str(&table.len().to_string());
    flat.push(':');
    flat.push_str(table);
    flat.push(':');
    flat.push_str(key);
    flat
}

/// Split a flat key produced by [`compose_key`] back into `(table, key)`.
///
/// Returns `None` for strings that are not in composite-key form.
pub fn decompose_key(flat: &str) -> Option<(&str, &str)> {
    let (len, rest) = flat.split_once(':')?;
    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if len.len() > 1 && len.starts_with('0') {
        return None;
    }
    let len: usize = len.parse().ok()?;
    let table = rest.get(..len)?;
    let key = rest.get(len..)?.strip_prefix(':')?;
    Some((table, key))
}
