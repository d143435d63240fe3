//! Evaluates a parsed query against an [`Index`] into a [`RecordSet`].

use super::ast::{BinaryKind, Node, Operator, Query, Term};
use super::parser::{DEFAULT_MAX_INTERVAL, DEFAULT_SIMILARITY_THRESHOLD};
use super::pragma::{Escalation, PragmaSet};
use super::scorer::{Scorer, ScoringPolicy, ScoringWeights};
use crate::config::QueryConfig;
use crate::error::Result;
use crate::index::{Encoding, Index, LookupRequest, MatchMode};
use crate::records::{RecordSet, RecordSetConfig};

/// Fallback tiers after an exact lookup finds nothing, loosest last.
const ESCALATION_TIERS: [MatchMode; 2] = [MatchMode::Unsplit, MatchMode::Partial];

/// Query executor
pub struct QueryExecutor<'a, I: Index + ?Sized, S: ScoringPolicy = Scorer> {
    index: &'a I,
    scorer: S,
    encoding: Encoding,
    records: RecordSetConfig,
    escalation: Option<Escalation>,
}

impl<'a, I: Index + ?Sized> QueryExecutor<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self::with_scorer(index, Scorer::with_defaults())
    }

    /// Create executor with custom scoring weights
    pub fn with_scoring_weights(index: &'a I, weights: ScoringWeights) -> Self {
        Self::with_scorer(index, Scorer::new(weights))
    }

    /// Create executor from a full configuration.
    pub fn with_config(index: &'a I, config: &QueryConfig) -> Self {
        Self::with_scoring_weights(index, config.scoring)
            .encoding(config.encoding)
            .record_config(config.records)
            .escalation(config.escalation)
    }
}

impl<'a, I: Index + ?Sized, S: ScoringPolicy> QueryExecutor<'a, I, S> {
    pub fn with_scorer(index: &'a I, scorer: S) -> Self {
        Self {
            index,
            scorer,
            encoding: Encoding::Default,
            records: RecordSetConfig::default(),
            escalation: None,
        }
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Shape of the record sets this executor creates.
    pub fn record_config(mut self, records: RecordSetConfig) -> Self {
        self.records = records;
        self
    }

    /// Escalation used by queries without an `*E` pragma.
    pub fn escalation(mut self, escalation: Option<Escalation>) -> Self {
        self.escalation = escalation;
        self
    }

    /// Execute a query into a fresh record set.
    pub fn execute(&self, query: &Query) -> Result<RecordSet> {
        let mut records = RecordSet::new(self.records)?;
        self.execute_into(query, &mut records, Operator::Or)?;
        Ok(records)
    }

    /// Execute a query and merge its result into `records` with `op`.
    pub fn execute_into(&self, query: &Query, records: &mut RecordSet, op: Operator) -> Result<()> {
        let escalation = query.pragmas.escalation.or(self.escalation);
        let mut state = ExecState {
            pragmas: &query.pragmas,
            steps: escalation.map_or(0, |e| e.steps()) as usize,
            budget: escalation.and_then(|e| e.budget()),
            template: records.empty_like(),
        };

        if records.is_empty() && op != Operator::Or {
            log::debug!("skipping query: nothing to {:?} against", op);
            return Ok(());
        }

        let result = self.eval(&query.root, &mut state)?;
        self.combine(records, &result, op.into());
        Ok(())
    }

    fn eval(&self, node: &Node, state: &mut ExecState<'_>) -> Result<RecordSet> {
        match node {
            Node::Empty => Ok(state.template.empty_like()),
            Node::Term(term) => self.eval_term(term, state),
            Node::Group { child } => self.eval(child, state),
            Node::BinaryOp { kind, left, right } => {
                let mut left = self.eval(left, state)?;
                if left.is_empty() && short_circuits(*kind) {
                    log::debug!("left operand empty, skipping {:?} operand", kind);
                    return Ok(left);
                }
                let right = self.eval(right, state)?;
                self.combine(&mut left, &right, *kind);
                Ok(left)
            }
        }
    }

    fn combine(&self, left: &mut RecordSet, right: &RecordSet, kind: BinaryKind) {
        match kind {
            BinaryKind::Or => left.union_with(right),
            BinaryKind::And => left.intersect_with(right),
            BinaryKind::But => left.subtract_with(right),
            BinaryKind::Adjust => left.adjust_with(right, |s, p| self.scorer.adjust(s, p)),
            BinaryKind::Lt | BinaryKind::Gt => {
                let left_ranks_lower = kind == BinaryKind::Lt;
                let mut right = right.clone();
                self.bias(left, left_ranks_lower);
                self.bias(&mut right, !left_ranks_lower);
                left.union_with(&right);
            }
        }
    }

    fn bias(&self, set: &mut RecordSet, demote: bool) {
        if demote {
            set.map_scores(|s| self.scorer.demote(s));
        } else {
            set.map_scores(|s| self.scorer.promote(s));
        }
    }

    fn eval_term(&self, term: &Term, state: &mut ExecState<'_>) -> Result<RecordSet> {
        let (mode, option) = match term.mode {
            Some(m) => (m.mode, m.option),
            None if term.is_prefix => (MatchMode::Prefix, 0),
            None => (MatchMode::Exact, 0),
        };
        let mut records = self.lookup(term, mode, option, term.weight, state)?;
        log::info!("hits({})={}", mode.name(), records.nhits());

        // Only plain exact lookups escalate.
        if mode != MatchMode::Exact || term.mode.is_some() {
            return Ok(records);
        }

        for (i, &tier) in ESCALATION_TIERS.iter().take(state.steps).enumerate() {
            if !records.is_empty() {
                break;
            }
            if let Some(budget) = state.budget.as_mut() {
                if *budget == 0 {
                    log::debug!("escalation budget spent, {:?} stays empty", term.text);
                    break;
                }
                *budget -= 1;
            }
            let weight = self.scorer.escalated_weight(term.weight, i + 1);
            log::debug!("escalating {:?} to {} with weight {}", term.text, tier.name(), weight);
            records = self.lookup(term, tier, 0, weight, state)?;
            log::info!("hits({})={}", tier.name(), records.nhits());
        }

        Ok(records)
    }

    fn lookup(
        &self,
        term: &Term,
        mode: MatchMode,
        option: i32,
        weight: i32,
        state: &ExecState<'_>,
    ) -> Result<RecordSet> {
        let option = match (mode, option) {
            (MatchMode::Near | MatchMode::Near2, 0) => DEFAULT_MAX_INTERVAL,
            (MatchMode::Similar, 0) => DEFAULT_SIMILARITY_THRESHOLD,
            _ => option,
        };
        let req = LookupRequest::new(&term.text, mode)
            .with_option(option)
            .with_encoding(self.encoding);

        let weights = &state.pragmas.section_weights;
        let mut records = state.template.empty_like();
        for posting in self.index.lookup(&req)? {
            let score = posting
                .score
                .saturating_mul(weights.weight(posting.section))
                .saturating_mul(weight);
            records.add_posting(&posting, score);
        }
        Ok(records)
    }
}

/// Operators whose result is empty whenever the left side is.
fn short_circuits(kind: BinaryKind) -> bool {
    matches!(kind, BinaryKind::And | BinaryKind::But | BinaryKind::Adjust)
}

struct ExecState<'q> {
    pragmas: &'q PragmaSet,
    steps: usize,
    /// Escalations left for the whole query, when bounded.
    budget: Option<u32>,
    /// Empty set with the target configuration.
    template: RecordSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;
    use crate::query::parser::parse;
    use crate::records::{RecUnit, RecordKey};

    fn index() -> MemoryIndex {
        let mut idx = MemoryIndex::new();
        idx.add_document("a", &["a"]);
        idx.add_document("b", &["b"]);
        idx.add_document("ab", &["a b"]);
        idx
    }

    fn run(idx: &MemoryIndex, text: &str, default_op: Operator) -> RecordSet {
        let (query, _) = parse(text, default_op, 32, Encoding::Utf8).unwrap();
        QueryExecutor::new(idx).execute(&query).unwrap()
    }

    fn keys(set: &RecordSet) -> Vec<String> {
        let mut keys: Vec<String> = set.iter().map(|r| r.key.to_string()).collect();
        keys.sort();
        keys
    }

    fn score(set: &RecordSet, key: &str) -> i32 {
        set.find(&RecordKey::from(key)).unwrap()
    }

    #[test]
    fn test_default_operators() {
        let idx = index();
        assert_eq!(keys(&run(&idx, "a b", Operator::Or)), vec!["a", "ab", "b"]);
        assert_eq!(keys(&run(&idx, "a b", Operator::And)), vec!["ab"]);
        assert_eq!(keys(&run(&idx, "a b", Operator::But)), vec!["a"]);
        for op in [Operator::Or, Operator::And, Operator::But] {
            assert_eq!(keys(&run(&idx, "+a +b", op)), vec!["ab"]);
        }
    }

    #[test]
    fn test_term_score() {
        let idx = index();
        let set = run(&idx, "a", Operator::Or);
        assert_eq!(score(&set, "a"), 5);
        let set = run(&idx, "a b", Operator::Or);
        assert_eq!(score(&set, "ab"), 10);
    }

    #[test]
    fn test_adjust_lowers_shared() {
        let idx = index();
        let set = run(&idx, "a ~b", Operator::And);
        assert_eq!(keys(&set), vec!["a", "ab"]);
        assert_eq!(score(&set, "a"), 5);
        assert!(score(&set, "ab") < 5);
    }

    #[test]
    fn test_directional() {
        let idx = index();
        let set = run(&idx, "<a b", Operator::Or);
        assert!(score(&set, "a") < score(&set, "b"));
        let set = run(&idx, "a >b", Operator::Or);
        assert!(score(&set, "a") > score(&set, "b"));
        let set = run(&idx, "a <b", Operator::Or);
        assert!(score(&set, "a") < score(&set, "b"));
    }

    #[test]
    fn test_grouped_exclusion() {
        let idx = index();
        let set = run(&idx, "(a OR b) -(+a +b)", Operator::Or);
        assert_eq!(keys(&set), vec!["a", "b"]);
    }

    #[test]
    fn test_section_weights() {
        let mut idx = MemoryIndex::new();
        idx.add_document("d", &["x", "x"]);
        idx.add_document("e", &["y", "x"]);
        let sections = RecordSetConfig::new(RecUnit::Section, RecUnit::None, 0);
        let exec = QueryExecutor::new(&idx).record_config(sections);

        let (q, _) = parse("*W1:2 x", Operator::Or, 32, Encoding::Utf8).unwrap();
        let set = exec.execute(&q).unwrap();
        // Unlisted sections stay in the set with a zero score.
        assert_eq!(set.nhits(), 3);
        assert_eq!(set.at(&"d".into(), 1, 0).unwrap().score, 10);
        assert_eq!(set.at(&"d".into(), 2, 0).unwrap().score, 0);

        let (q, _) = parse("*W x", Operator::Or, 32, Encoding::Utf8).unwrap();
        let set = exec.execute(&q).unwrap();
        assert!(set.iter().all(|r| r.score == 0));
    }

    #[test]
    fn test_escalation() {
        let mut idx = MemoryIndex::new();
        idx.add_document("d", &["searching engines"]);
        idx.add_document("e", &["search"]);

        let (q, _) = parse("arch", Operator::Or, 32, Encoding::Utf8).unwrap();
        assert!(QueryExecutor::new(&idx).execute(&q).unwrap().is_empty());

        let (q, _) = parse("*E-2 arch", Operator::Or, 32, Encoding::Utf8).unwrap();
        let set = QueryExecutor::new(&idx).execute(&q).unwrap();
        assert_eq!(set.nhits(), 2);
        // Unsplit tier: weight 5 - 2.
        assert_eq!(score(&set, "e"), 3);

        // Matched terms never escalate.
        let (q, _) = parse("*E-2 search", Operator::Or, 32, Encoding::Utf8).unwrap();
        let set = QueryExecutor::new(&idx).execute(&q).unwrap();
        assert_eq!(keys(&set), vec!["e"]);
    }

    #[test]
    fn test_escalation_budget_is_query_wide() {
        let mut idx = MemoryIndex::new();
        idx.add_document("d", &["searching engines"]);

        let (q, _) = parse("*E-2,1 arch gine", Operator::Or, 32, Encoding::Utf8).unwrap();
        let set = QueryExecutor::new(&idx).execute(&q).unwrap();
        // Only the first term may escalate.
        assert_eq!(set.nhits(), 1);
        assert_eq!(score(&set, "d"), 3);
    }

    #[test]
    fn test_prefix_term() {
        let mut idx = MemoryIndex::new();
        idx.add_document("d", &["other"]);
        idx.add_document("e", &["another"]);
        let (q, _) = parse("ot*", Operator::Or, 32, Encoding::Utf8).unwrap();
        let set = QueryExecutor::new(&idx).execute(&q).unwrap();
        assert_eq!(keys(&set), vec!["d"]);
    }

    #[test]
    fn test_execute_into() {
        let idx = index();
        let exec = QueryExecutor::new(&idx);
        let (a, _) = parse("a", Operator::Or, 32, Encoding::Utf8).unwrap();
        let (b, _) = parse("b", Operator::Or, 32, Encoding::Utf8).unwrap();

        let mut set = exec.execute(&a).unwrap();
        exec.execute_into(&b, &mut set, Operator::And).unwrap();
        assert_eq!(keys(&set), vec!["ab"]);

        let mut set = exec.execute(&a).unwrap();
        exec.execute_into(&b, &mut set, Operator::Adjust).unwrap();
        assert_eq!(set.nhits(), 2);
        assert_eq!(score(&set, "ab"), 0);

        let mut empty = RecordSet::new(RecordSetConfig::default()).unwrap();
        exec.execute_into(&a, &mut empty, Operator::And).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_empty_query() {
        let idx = index();
        assert!(run(&idx, "", Operator::Or).is_empty());
    }
}
