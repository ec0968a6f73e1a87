//! Pure operations over field sequences.
//!
//! Every operation returns a fresh `Vec` instead of mutating in place, so
//! the cache can always fall back to the pre-mutation snapshot when a
//! remote call fails. Ordering is keyed on the server-assigned field id;
//! fields that have never been persisted (`id == None`) sort first.

use super::model::{Field, FieldRole};

/// Returns the fields sorted by id ascending, stably.
///
/// `Option<i64>` ordering places `None` before every `Some`, which is the
/// uniform rule for not-yet-persisted fields. Idempotent.
pub fn sorted_by_id(fields: &[Field]) -> Vec<Field> {
    let mut sorted = fields.to_vec();
    sorted.sort_by_key(|f| f.id);
    sorted
}

/// Appends a field without renumbering anything.
pub fn append(fields: &[Field], field: Field) -> Vec<Field> {
    let mut next = fields.to_vec();
    next.push(field);
    next
}

/// The role the "add field" operation should use next.
///
/// Alternates User/Assistant off the last field; an empty sequence is
/// treated as if it ended with a User turn. UI policy, not a data
/// invariant: any role sequence is accepted elsewhere.
pub fn next_role(fields: &[Field]) -> FieldRole {
    match fields.last().map(|f| f.role) {
        Some(FieldRole::User) | None => FieldRole::Assistant,
        Some(FieldRole::Assistant) | Some(FieldRole::System) => FieldRole::User,
    }
}

/// Whether the field at `index` is protected from deletion.
///
/// The lead system field anchors the template and is never user-deletable.
pub fn is_protected(fields: &[Field], index: usize) -> bool {
    index == 0
        && fields
            .first()
            .is_some_and(|f| f.role == FieldRole::System)
}

/// Removes the field at `index`, returning a new sequence.
///
/// A protected target or an out-of-bounds index yields the input unchanged
/// (callers observe a silent no-op, not an error).
pub fn remove_at(fields: &[Field], index: usize) -> Vec<Field> {
    if index >= fields.len() || is_protected(fields, index) {
        return fields.to_vec();
    }
    let mut next = fields.to_vec();
    next.remove(index);
    next
}
