//! Constraint key differs.
//!
//! Foreign keys, unique keys and indexes are compared with one matching
//! algorithm ([`diff_constraints`]) parameterized by a
//! [`ConstraintKeyDiffer`] per constraint kind. The differ decides what a
//! key's identity and structure are; the algorithm decides pairing.
//!
//! Pairing rules:
//!
//! 1. A previous key pairs with the first unmatched next key carrying the
//!    same constraint name. Auto-generated names never pair by name.
//! 2. A previous key still unmatched pairs with the first unmatched next key
//!    of the same structure (column fingerprint, plus referenced table for
//!    foreign keys).
//! 3. Unmatched previous keys are deleted, unmatched next keys are added.
//!
//! Within one table, a later key repeating an earlier key's name is ignored.

mod foreign_key;
mod index;
mod unique_key;

pub use foreign_key::ForeignKeyDiffer;
pub use index::IndexDiffer;
pub use unique_key::UniqueKeyDiffer;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assist;
use crate::database::DatabaseKind;
use crate::diff::{ConstraintDiff, NextPreviousDiff};
use crate::error::DiffError;
use crate::schema::TableModel;

/// Separator of the column fingerprint.
pub const FINGERPRINT_SEPARATOR: &str = ",";

/// Kind of constraint a differ handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    /// Foreign key.
    ForeignKey,
    /// Unique key, including the primary key.
    UniqueKey,
    /// Index.
    Index,
}

impl ConstraintKind {
    /// Returns the key used in snapshot documents.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::ForeignKey => "foreignKey",
            Self::UniqueKey => "uniqueKey",
            Self::Index => "index",
        }
    }

    /// Returns a human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ForeignKey => "foreign key",
            Self::UniqueKey => "unique key",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ConstraintKind {
    type Err = DiffError;

    /// Resolves a constraint kind key. Kinds without a differ are rejected
    /// instead of being skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "foreignKey" => Ok(Self::ForeignKey),
            "uniqueKey" => Ok(Self::UniqueKey),
            "index" => Ok(Self::Index),
            other => Err(DiffError::UnknownConstraintKind(other.to_string())),
        }
    }
}

/// Per-kind capabilities used by [`diff_constraints`].
pub trait ConstraintKeyDiffer {
    /// Structural model of one constraint.
    type Key;
    /// Diff record produced for this kind.
    type Diff: ConstraintDiff;

    /// Constraint kind handled by this differ.
    fn constraint_kind(&self) -> ConstraintKind;

    /// Database the compared snapshots come from.
    fn database(&self) -> DatabaseKind;

    /// All keys of this kind in the table, in declaration order.
    fn key_list<'t>(&self, table: &'t TableModel) -> &'t [Self::Key];

    /// Constraint name of a key.
    fn constraint_name<'k>(&self, key: &'k Self::Key) -> Option<&'k str>;

    /// Comma-joined column names of a key, in key order.
    fn column(&self, key: &Self::Key) -> String;

    /// Returns true if both names denote the same constraint identity.
    /// Absent and auto-generated names never do.
    fn is_same_constraint_name(&self, next: Option<&str>, previous: Option<&str>) -> bool {
        match (next, previous) {
            (Some(next), Some(previous))
                if !self.is_auto_generated_name(next) && !self.is_auto_generated_name(previous) =>
            {
                assist::is_same(Some(next), Some(previous))
            }
            _ => false,
        }
    }

    /// Returns true if the name was assigned by the database.
    fn is_auto_generated_name(&self, name: &str) -> bool {
        self.database()
            .is_auto_generated_name(self.constraint_kind(), name)
    }

    /// Returns true if both keys have the same structure.
    fn is_same_structure(&self, next: &Self::Key, previous: &Self::Key) -> bool {
        assist::is_same(Some(&self.column(next)), Some(&self.column(previous)))
    }

    /// Fills the kind-specific fields of a diff record from a pair of keys.
    /// Either key is absent for added/deleted constraints.
    fn diff(&self, diff: &mut Self::Diff, next: Option<&Self::Key>, previous: Option<&Self::Key>);

    /// Creates the record of a constraint present only in next.
    fn create_added_diff(&self, name: Option<&str>) -> Self::Diff;

    /// Creates the record of a constraint present on both sides.
    fn create_changed_diff(&self, name: Option<&str>) -> Self::Diff;

    /// Creates the record of a constraint present only in previous.
    fn create_deleted_diff(&self, name: Option<&str>) -> Self::Diff;
}

/// Joins column names into a structural fingerprint.
#[must_use]
pub fn fingerprint(columns: &[String]) -> String {
    columns.join(FINGERPRINT_SEPARATOR)
}

/// Diff of the constraint names of a paired key.
///
/// Two auto-generated (or absent) names are not a rename: the database
/// renumbered its own name.
pub(crate) fn rename_diff<D: ConstraintKeyDiffer + ?Sized>(
    differ: &D,
    next: Option<&str>,
    previous: Option<&str>,
) -> Option<NextPreviousDiff<String>> {
    let generated = |name: Option<&str>| name.map_or(true, |n| differ.is_auto_generated_name(n));
    if generated(next) && generated(previous) {
        return None;
    }
    assist::diff_text(next, previous)
}

/// Drops keys repeating the name of an earlier key of the same list.
fn distinct_keys<'k, D: ConstraintKeyDiffer>(differ: &D, keys: &'k [D::Key]) -> Vec<&'k D::Key> {
    let mut seen: HashSet<&'k str> = HashSet::new();
    keys.iter()
        .filter(|key| match differ.constraint_name(*key) {
            Some(name) if !seen.insert(name) => {
                debug!(
                    kind = %differ.constraint_kind(),
                    name,
                    "Ignoring duplicate constraint name"
                );
                false
            }
            _ => true,
        })
        .collect()
}

/// Compares the constraints of one kind between two versions of a table.
///
/// Returns only records with actual differences: changed and added records
/// in next declaration order, then deleted ones in previous declaration
/// order.
pub fn diff_constraints<D: ConstraintKeyDiffer>(
    differ: &D,
    next_table: &TableModel,
    previous_table: &TableModel,
) -> Vec<D::Diff> {
    let next_keys = distinct_keys(differ, differ.key_list(next_table));
    let previous_keys = distinct_keys(differ, differ.key_list(previous_table));

    // partner[n] = index of the previous key paired with next key n
    let mut partner = pair_by_name(differ, &next_keys, &previous_keys);
    let mut previous_matched = matched_previous(&partner, previous_keys.len());

    for (n, q) in ambiguous_name_pairs(differ, &next_keys, &previous_keys, &partner) {
        warn!(
            kind = %differ.constraint_kind(),
            name = ?differ.constraint_name(next_keys[n]),
            rival = ?differ.constraint_name(previous_keys[q]),
            "Constraint paired by name although another one has its structure"
        );
    }

    for (p, previous_key) in previous_keys.iter().enumerate() {
        if previous_matched[p] {
            continue;
        }
        let found = (0..next_keys.len()).find(|&n| {
            partner[n].is_none() && differ.is_same_structure(next_keys[n], previous_key)
        });
        if let Some(n) = found {
            debug!(
                table = %next_table.name,
                kind = %differ.constraint_kind(),
                next = ?differ.constraint_name(next_keys[n]),
                previous = ?differ.constraint_name(previous_key),
                "Paired constraints by structure"
            );
            partner[n] = Some(p);
            previous_matched[p] = true;
        }
    }

    let mut diffs = Vec::new();
    for (n, next_key) in next_keys.iter().enumerate() {
        let name = differ.constraint_name(next_key);
        match partner[n] {
            Some(p) => {
                let mut diff = differ.create_changed_diff(name);
                differ.diff(&mut diff, Some(*next_key), Some(previous_keys[p]));
                if diff.has_diff() {
                    diffs.push(diff);
                }
            }
            None => {
                let mut diff = differ.create_added_diff(name);
                differ.diff(&mut diff, Some(*next_key), None);
                diffs.push(diff);
            }
        }
    }
    for (p, previous_key) in previous_keys.iter().enumerate() {
        if previous_matched[p] {
            continue;
        }
        let mut diff = differ.create_deleted_diff(differ.constraint_name(previous_key));
        differ.diff(&mut diff, None, Some(*previous_key));
        diffs.push(diff);
    }
    diffs
}

/// Pairs next keys with previous keys of the same constraint name.
fn pair_by_name<D: ConstraintKeyDiffer>(
    differ: &D,
    next_keys: &[&D::Key],
    previous_keys: &[&D::Key],
) -> Vec<Option<usize>> {
    let mut partner: Vec<Option<usize>> = vec![None; next_keys.len()];
    for (p, previous_key) in previous_keys.iter().enumerate() {
        let previous_name = differ.constraint_name(previous_key);
        let found = (0..next_keys.len()).find(|&n| {
            partner[n].is_none()
                && differ
                    .is_same_constraint_name(differ.constraint_name(next_keys[n]), previous_name)
        });
        if let Some(n) = found {
            partner[n] = Some(p);
        }
    }
    partner
}

fn matched_previous(partner: &[Option<usize>], previous_len: usize) -> Vec<bool> {
    let mut matched = vec![false; previous_len];
    for p in partner.iter().flatten() {
        matched[*p] = true;
    }
    matched
}

/// Name pairing outranks structure pairing. Returns `(next, rival)` index
/// pairs where a name pair changed its structure while a name-unmatched
/// previous key has exactly the next key's structure.
fn ambiguous_name_pairs<D: ConstraintKeyDiffer>(
    differ: &D,
    next_keys: &[&D::Key],
    previous_keys: &[&D::Key],
    partner: &[Option<usize>],
) -> Vec<(usize, usize)> {
    let previous_matched = matched_previous(partner, previous_keys.len());
    let mut pairs = Vec::new();
    for (n, next_key) in next_keys.iter().enumerate() {
        let Some(p) = partner[n] else { continue };
        if differ.is_same_structure(next_key, previous_keys[p]) {
            continue;
        }
        let rival = (0..previous_keys.len()).find(|&q| {
            !previous_matched[q] && differ.is_same_structure(next_key, previous_keys[q])
        });
        if let Some(q) = rival {
            pairs.push((n, q));
        }
    }
    pairs
}
