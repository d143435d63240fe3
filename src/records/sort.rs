//! Ordering and aggregation of record sets.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::record::{RecUnit, Record, RecordKey, SubRecord};
use super::set::{RecordSet, RecordSetConfig};
use crate::error::{Error, Result};

/// Sort order for [`RecordSet::sort`] and [`RecordSet::group_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Descending = 0,
    Ascending = 1,
}

impl SortDirection {
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(SortDirection::Descending),
            1 => Ok(SortDirection::Ascending),
            _ => Err(Error::invalid_argument(format!("unknown sort direction {}", code))),
        }
    }

    fn is_ascending(self) -> bool {
        self == SortDirection::Ascending
    }
}

/// Ranks two records. `Greater` means `a` ranks above `b`.
pub trait RecordComparator {
    fn compare(&self, a: &Record, b: &Record) -> Ordering;
}

impl<F> RecordComparator for F
where
    F: Fn(&Record, &Record) -> Ordering,
{
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self(a, b)
    }
}

/// Default ranking: by score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByScore;

impl RecordComparator for ByScore {
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        a.score.cmp(&b.score)
    }
}

/// Derives the grouping key of a record. `None` leaves the record out.
pub trait GroupKey {
    fn group_key(&self, record: &Record) -> Option<Vec<u8>>;
}

impl<F> GroupKey for F
where
    F: Fn(&Record) -> Option<Vec<u8>>,
{
    fn group_key(&self, record: &Record) -> Option<Vec<u8>> {
        self(record)
    }
}

impl RecordSet {
    /// Order records by score and keep at most `limit` of them (0 keeps all).
    pub fn sort(&mut self, limit: usize, direction: SortDirection) {
        self.sort_by(limit, direction, &ByScore);
    }

    /// Order records with `cmp`. Ascending order is the exact reverse of
    /// descending order, ties included.
    pub fn sort_by(&mut self, limit: usize, direction: SortDirection, cmp: &dyn RecordComparator) {
        let mut records = self.records().to_vec();
        records.sort_by(|a, b| cmp.compare(b, a));
        if direction.is_ascending() {
            records.reverse();
        }
        if limit > 0 {
            records.truncate(limit);
        }
        self.replace_records(records);
    }

    /// Collapse section or position records into one record per document.
    ///
    /// The folded records become subrecords (at most `limit` of them, best
    /// first) and `n_subrecs` counts how many were folded.
    pub fn group(&mut self, limit: usize) -> Result<()> {
        let unit = self.config().record_unit;
        if !matches!(unit, RecUnit::Section | RecUnit::Position) {
            return Err(Error::invalid_argument(format!(
                "cannot group a {:?}-unit record set by document",
                unit
            )));
        }
        let groups = fold(self.records(), limit, SortDirection::Descending, |r| {
            Some(r.key.clone())
        });
        self.regroup(RecUnit::Document, unit, limit, groups)
    }

    /// Group records under keys derived by `key_fn`, then order the groups
    /// by aggregate score and keep at most `limit` (0 keeps all).
    pub fn group_by(
        &mut self,
        limit: usize,
        direction: SortDirection,
        key_fn: &dyn GroupKey,
    ) -> Result<()> {
        let unit = self.config().record_unit;
        let groups = fold(self.records(), limit, direction, |r| {
            key_fn.group_key(r).map(RecordKey::Bytes)
        });
        self.regroup(RecUnit::UserDef, unit, limit, groups)?;
        self.sort(limit, direction);
        Ok(())
    }

    fn regroup(
        &mut self,
        record_unit: RecUnit,
        subrec_unit: RecUnit,
        limit: usize,
        groups: Vec<Record>,
    ) -> Result<()> {
        let max_n_subrecs = u32::try_from(limit)
            .map_err(|_| Error::invalid_argument(format!("group limit {} too large", limit)))?;
        let config = RecordSetConfig::new(record_unit, subrec_unit, max_n_subrecs);
        config.validate()?;
        self.set_config(config);
        self.replace_records(groups);
        Ok(())
    }
}

fn fold<K>(records: &[Record], limit: usize, direction: SortDirection, key_of: K) -> Vec<Record>
where
    K: Fn(&Record) -> Option<RecordKey>,
{
    let mut slots: AHashMap<RecordKey, usize> = AHashMap::new();
    let mut groups: Vec<Record> = Vec::new();
    for rec in records {
        let Some(key) = key_of(rec) else {
            continue;
        };
        let idx = *slots.entry(key.clone()).or_insert_with(|| {
            groups.push(Record {
                key,
                section: 0,
                position: 0,
                score: 0,
                n_subrecs: 0,
                subrecs: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[idx];
        group.score = group.score.saturating_add(rec.score);
        group.n_subrecs += 1;
        group.retain_subrec(
            SubRecord {
                section: rec.section,
                position: rec.position,
                score: rec.score,
            },
            limit,
            direction.is_ascending(),
        );
    }
    groups
}
