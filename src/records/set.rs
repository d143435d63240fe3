//! The scored record collection and its set algebra.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use super::record::{RecUnit, Record, RecordId, RecordKey, SubRecord};
use crate::error::{Error, Result};
use crate::index::Posting;

/// Construction parameters of a [`RecordSet`], fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSetConfig {
    pub record_unit: RecUnit,
    pub subrec_unit: RecUnit,
    pub max_n_subrecs: u32,
}

impl Default for RecordSetConfig {
    fn default() -> Self {
        Self {
            record_unit: RecUnit::Document,
            subrec_unit: RecUnit::None,
            max_n_subrecs: 0,
        }
    }
}

impl RecordSetConfig {
    pub fn new(record_unit: RecUnit, subrec_unit: RecUnit, max_n_subrecs: u32) -> Self {
        Self {
            record_unit,
            subrec_unit,
            max_n_subrecs,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.record_unit == RecUnit::None {
            return Err(Error::invalid_argument("record unit NONE cannot hold records"));
        }
        // User-defined groups may fold earlier user-defined groups.
        let regroup =
            self.record_unit == RecUnit::UserDef && self.subrec_unit == RecUnit::UserDef;
        let nested = regroup || self.subrec_unit.is_finer_than(self.record_unit);
        if self.max_n_subrecs > 0 && !nested {
            return Err(Error::invalid_argument(format!(
                "subrecord unit {:?} is not finer than record unit {:?}",
                self.subrec_unit, self.record_unit
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Start,
    At(usize),
    Done,
}

/// Scored records in insertion order, keyed at the configured unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RecordSetData", into = "RecordSetData")]
pub struct RecordSet {
    config: RecordSetConfig,
    records: Vec<Record>,
    index: AHashMap<RecordId, usize>,
    cursor: Cursor,
}

#[derive(Serialize, Deserialize)]
struct RecordSetData {
    config: RecordSetConfig,
    records: Vec<Record>,
}

impl From<RecordSetData> for RecordSet {
    fn from(data: RecordSetData) -> Self {
        let mut set = RecordSet::empty(data.config);
        set.records = data.records;
        set.reindex();
        set
    }
}

impl From<RecordSet> for RecordSetData {
    fn from(set: RecordSet) -> Self {
        RecordSetData {
            config: set.config,
            records: set.records,
        }
    }
}

impl RecordSet {
    pub fn new(config: RecordSetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::empty(config))
    }

    /// An empty set sharing `self`'s configuration.
    pub fn empty_like(&self) -> Self {
        Self::empty(self.config)
    }

    fn empty(config: RecordSetConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            index: AHashMap::new(),
            cursor: Cursor::Start,
        }
    }

    pub fn config(&self) -> &RecordSetConfig {
        &self.config
    }

    pub fn nhits(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    fn max_subrecs(&self) -> usize {
        self.config.max_n_subrecs as usize
    }

    /// Fold one index posting into the set with an already-computed score.
    pub fn add_posting(&mut self, posting: &Posting, score: i32) {
        self.add(
            RecordId {
                key: posting.key.clone(),
                section: posting.section,
                position: posting.position,
            },
            score,
        );
    }

    /// Fold a raw hit into the set.
    ///
    /// Hits that land on an existing record sum into it and become one more
    /// subrecord.
    pub fn add(&mut self, hit: RecordId, score: i32) {
        let id = hit.project(self.config.record_unit);
        let sub_id = hit.project(self.config.subrec_unit);
        let sub = SubRecord {
            section: sub_id.section,
            position: sub_id.position,
            score,
        };
        let max = self.max_subrecs();
        let idx = self.slot(id);
        let rec = &mut self.records[idx];
        rec.score = rec.score.saturating_add(score);
        rec.n_subrecs += 1;
        rec.retain_subrec(sub, max, false);
    }

    fn slot(&mut self, id: RecordId) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        self.cursor = Cursor::Start;
        let idx = self.records.len();
        self.records.push(Record::new(id.clone(), 0));
        self.index.insert(id, idx);
        idx
    }

    /// Insert a whole record, merging with any record of the same id.
    pub fn insert(&mut self, record: Record) {
        let max = self.max_subrecs();
        self.merge_record(&record, max);
        self.cursor = Cursor::Start;
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        let id = id.project(self.config.record_unit);
        self.index.get(&id).map(|&idx| &self.records[idx])
    }

    pub fn at(&self, key: &RecordKey, section: u32, position: u32) -> Option<&Record> {
        self.get(&RecordId {
            key: key.clone(),
            section,
            position,
        })
    }

    /// Score of `key`, summed over every record carrying it.
    pub fn find(&self, key: &RecordKey) -> Option<i32> {
        match self.config.record_unit {
            RecUnit::Section | RecUnit::Position => {
                let mut found = None;
                for rec in self.records.iter().filter(|r| &r.key == key) {
                    found = Some(found.unwrap_or(0i32).saturating_add(rec.score));
                }
                found
            }
            _ => self.at(key, 0, 0).map(|r| r.score),
        }
    }

    pub fn rewind(&mut self) {
        self.cursor = Cursor::Start;
    }

    /// Advance the cursor and return the next key and score.
    pub fn next(&mut self) -> Option<(&RecordKey, i32)> {
        let next = match self.cursor {
            Cursor::Start => 0,
            Cursor::At(i) => i + 1,
            Cursor::Done => return None,
        };
        if next >= self.records.len() {
            self.cursor = Cursor::Done;
            return None;
        }
        self.cursor = Cursor::At(next);
        let rec = &self.records[next];
        Some((&rec.key, rec.score))
    }

    pub fn curr_rec(&self) -> Option<&Record> {
        match self.cursor {
            Cursor::At(i) => self.records.get(i),
            _ => None,
        }
    }

    pub fn curr_key(&self) -> Option<&RecordKey> {
        self.curr_rec().map(|r| &r.key)
    }

    /// Score under the cursor, 0 when the cursor is not on a record.
    pub fn curr_score(&self) -> i32 {
        self.curr_rec().map(|r| r.score).unwrap_or(0)
    }

    /// Document keys present in `self`.
    fn key_set(&self) -> AHashSet<&RecordKey> {
        self.records.iter().map(|r| &r.key).collect()
    }

    pub(crate) fn retain<F: FnMut(&Record) -> bool>(&mut self, f: F) -> usize {
        let before = self.records.len();
        self.records.retain(f);
        let removed = before - self.records.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    pub(crate) fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id(), i))
            .collect();
        self.cursor = Cursor::Start;
    }

    pub(crate) fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
        self.reindex();
    }

    pub(crate) fn set_config(&mut self, config: RecordSetConfig) {
        self.config = config;
    }

    /// Merge `other` into `self`: records with the same id sum, new ones are
    /// appended in `other`'s order.
    pub fn union_with(&mut self, other: &RecordSet) {
        let max = self.max_subrecs();
        for rec in &other.records {
            self.merge_record(rec, max);
        }
        self.cursor = Cursor::Start;
    }

    fn merge_record(&mut self, rec: &Record, max: usize) {
        let id = rec.id().project(self.config.record_unit);
        match self.index.get(&id) {
            Some(&idx) => merge_into(&mut self.records[idx], rec, max),
            None => {
                let mut rec = rec.clone();
                rec.section = id.section;
                rec.position = id.position;
                rec.subrecs.truncate(max);
                self.index.insert(id, self.records.len());
                self.records.push(rec);
            }
        }
    }

    /// Keep only documents present in both sets, summing their scores.
    ///
    /// Membership is decided by document key whatever the record unit, so
    /// two section records of one document meet here. Records of `other`
    /// for a shared document merge in like a union.
    pub fn intersect_with(&mut self, other: &RecordSet) {
        let ours: AHashSet<RecordKey> = self.records.iter().map(|r| r.key.clone()).collect();
        let theirs = other.key_set();
        self.retain(|r| theirs.contains(&r.key));
        let max = self.max_subrecs();
        for rec in other.records.iter().filter(|r| ours.contains(&r.key)) {
            self.merge_record(rec, max);
        }
        self.cursor = Cursor::Start;
    }

    /// Drop documents present in `other`; surviving scores are unchanged.
    pub fn subtract_with(&mut self, other: &RecordSet) {
        let theirs = other.key_set();
        self.retain(|r| !theirs.contains(&r.key));
    }

    /// Rescore records whose document is also in `other` with
    /// `f(own, other)`, `other` being that document's summed score.
    ///
    /// Membership is unchanged.
    pub fn adjust_with<F: Fn(i32, i32) -> i32>(&mut self, other: &RecordSet, f: F) {
        let mut penalties: AHashMap<&RecordKey, i32> = AHashMap::new();
        for rec in &other.records {
            let p = penalties.entry(&rec.key).or_insert(0);
            *p = p.saturating_add(rec.score);
        }
        for rec in &mut self.records {
            if let Some(&penalty) = penalties.get(&rec.key) {
                rec.score = f(rec.score, penalty);
            }
        }
    }

    /// Apply `f` to every score.
    pub fn map_scores<F: Fn(i32) -> i32>(&mut self, f: F) {
        for rec in &mut self.records {
            rec.score = f(rec.score);
        }
    }

    /// Remove from each side the documents present in the other.
    ///
    /// Both operands shrink to their mutually exclusive parts. Returns the
    /// number of records removed from `self`.
    pub fn difference(&mut self, other: &mut RecordSet) -> usize {
        let shared: AHashSet<RecordKey> = {
            let ours = self.key_set();
            other
                .records
                .iter()
                .filter(|r| ours.contains(&r.key))
                .map(|r| r.key.clone())
                .collect()
        };
        other.retain(|r| !shared.contains(&r.key));
        self.retain(|r| !shared.contains(&r.key))
    }

    /// Non-mutating union.
    pub fn union(&self, other: &RecordSet) -> RecordSet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    /// Non-mutating intersection.
    pub fn intersect(&self, other: &RecordSet) -> RecordSet {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    /// Non-mutating subtraction.
    pub fn subtract(&self, other: &RecordSet) -> RecordSet {
        let mut out = self.clone();
        out.subtract_with(other);
        out
    }
}

fn merge_into(dst: &mut Record, src: &Record, max: usize) {
    dst.score = dst.score.saturating_add(src.score);
    dst.n_subrecs = dst.n_subrecs.saturating_add(src.n_subrecs);
    dst.append_subrecs(&src.subrecs, max);
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
