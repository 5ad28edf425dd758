use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::LoanRecord;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// All loan records for one reporting period, in submitted order.
///
/// Loan IDs are expected to be unique but this is checked, not enforced:
/// duplicates are kept so the validator can report every repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<LoanRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<LoanRecord>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Raw row count, duplicates included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index the snapshot by first-seen loan ID.
    pub fn index(&self) -> SnapshotIndex<'_> {
        SnapshotIndex::build(self)
    }
}

impl FromIterator<LoanRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = LoanRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// A repeat occurrence of a loan ID already seen earlier in the snapshot.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DuplicateOccurrence {
    pub loan_id: String,
    /// 2 for the first repeat, 3 for the next, ...
    pub occurrence: usize,
    /// 0-based position of this repeat in the snapshot.
    pub position: usize,
    /// 0-based position of the first occurrence (the one that is kept).
    pub first_position: usize,
}

/// First-occurrence view of a [`Snapshot`].
///
/// Iteration over `by_id` is in loan-ID order, which is what makes every
/// downstream computation deterministic.
#[derive(Clone, Debug)]
pub struct SnapshotIndex<'a> {
    pub by_id: BTreeMap<&'a str, &'a LoanRecord>,
    /// Repeat occurrences in snapshot order.
    pub duplicates: Vec<DuplicateOccurrence>,
    pub raw_count: usize,
}

impl<'a> SnapshotIndex<'a> {
    fn build(snapshot: &'a Snapshot) -> Self {
        let mut by_id: BTreeMap<&'a str, &'a LoanRecord> = BTreeMap::new();
        let mut first_pos: BTreeMap<&'a str, (usize, usize)> = BTreeMap::new();
        let mut duplicates = Vec::new();

        for (position, rec) in snapshot.records.iter().enumerate() {
            let id = rec.loan_id.as_str();
            match first_pos.get_mut(id) {
                Some((first_position, seen)) => {
                    *seen += 1;
                    duplicates.push(DuplicateOccurrence {
                        loan_id: rec.loan_id.clone(),
                        occurrence: *seen,
                        position,
                        first_position: *first_position,
                    });
                }
                None => {
                    first_pos.insert(id, (position, 1));
                    by_id.insert(id, rec);
                }
            }
        }

        Self {
            by_id,
            duplicates,
            raw_count: snapshot.records.len(),
        }
    }

    /// Unique loan count.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, loan_id: &str) -> Option<&'a LoanRecord> {
        self.by_id.get(loan_id).copied()
    }

    pub fn contains(&self, loan_id: &str) -> bool {
        self.by_id.contains_key(loan_id)
    }

    pub fn ids(&self) -> BTreeSet<&'a str> {
        self.by_id.keys().copied().collect()
    }

    /// First-occurrence records in loan-ID order.
    pub fn records(&self) -> impl Iterator<Item = &'a LoanRecord> + '_ {
        self.by_id.values().copied()
    }
}

// ---------------------------------------------------------------------------
// Confirmation set
// ---------------------------------------------------------------------------

/// Loan IDs independently confirmed to have paid off, or to have been
/// legitimately boarded, between two periods. Order and duplicates are
/// irrelevant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationSet {
    ids: BTreeSet<String>,
}

impl ConfirmationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, loan_id: &str) -> bool {
        self.ids.contains(loan_id)
    }

    pub fn insert(&mut self, loan_id: impl Into<String>) -> bool {
        self.ids.insert(loan_id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ConfirmationSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
