//! End-to-end tests: parse query text and execute it against an index.

mod fixtures;

use fixtures::{abc_index, corpus, keys, parse_query, run, sorted_keys};
use qrs::config::QueryConfig;
use qrs::index::Encoding;
use qrs::query::{Escalation, Operator, QueryExecutor, parse};
use qrs::records::{RecUnit, RecordKey, RecordSetConfig, SortDirection};

#[test]
fn test_default_operator_controls_plain_terms() {
    let idx = abc_index();
    assert_eq!(run(&idx, "a b", Operator::Or).nhits(), 3);

    let and = run(&idx, "a b", Operator::And);
    assert_eq!(keys(&and), vec!["a&b"]);

    let but = run(&idx, "a b", Operator::But);
    assert_eq!(keys(&but), vec!["a"]);
}

#[test]
fn test_explicit_operators_ignore_default() {
    let idx = abc_index();
    for op in [Operator::Or, Operator::And, Operator::But, Operator::Adjust] {
        assert_eq!(keys(&run(&idx, "+a +b", op)), vec!["a&b"], "default {:?}", op);
    }
}

#[test]
fn test_or_keyword_overrides_default() {
    let idx = abc_index();
    assert_eq!(run(&idx, "a OR b", Operator::And).nhits(), 3);
}

#[test]
fn test_default_op_pragma() {
    let idx = abc_index();
    assert_eq!(keys(&run(&idx, "*D+ a b", Operator::Or)), vec!["a&b"]);
    assert_eq!(keys(&run(&idx, "*D- a b", Operator::Or)), vec!["a"]);
    assert_eq!(run(&idx, "*DOR a b", Operator::And).nhits(), 3);
}

#[test]
fn test_paren_budget() {
    let text = format!("{}a", "(".repeat(31));
    let (query, rest) = parse(&text, Operator::Or, 32, Encoding::Utf8).unwrap();
    assert!(rest.is_empty());
    assert_eq!(query.terms().len(), 1);

    let (_, rest) = parse(&text, Operator::Or, 16, Encoding::Utf8).unwrap();
    assert!(!rest.is_empty());
    let opens = rest.matches('(').count();
    let closes = rest.matches(')').count();
    assert_ne!(opens, closes);
}

#[test]
fn test_phrase_and_prefix() {
    let idx = corpus();
    assert_eq!(keys(&run(&idx, "\"posting lists\"", Operator::Or)), vec!["2"]);
    assert!(run(&idx, "\"lists posting\"", Operator::Or).is_empty());
    assert_eq!(keys(&run(&idx, "pars*", Operator::Or)), vec!["1"]);
}

#[test]
fn test_terms_are_case_folded() {
    let idx = corpus();
    assert_eq!(sorted_keys(&run(&idx, "SEARCH", Operator::Or)), vec!["2", "3"]);
}

#[test]
fn test_exclusion_and_grouping() {
    let idx = corpus();
    assert_eq!(keys(&run(&idx, "boolean -phrase", Operator::Or)), vec!["1"]);
    assert_eq!(
        sorted_keys(&run(&idx, "(bread OR index) -flour", Operator::Or)),
        vec!["2"]
    );
}

#[test]
fn test_section_weights_scale_scores() {
    let idx = corpus();
    let set = run(&idx, "*W1:10,2:1 search", Operator::Or);
    assert_eq!(set.find(&RecordKey::from(2)), Some(50));
    assert_eq!(set.find(&RecordKey::from(3)), Some(5));
}

#[test]
fn test_unlisted_sections_keep_documents() {
    let idx = corpus();
    // "boolean" only occurs in bodies (section 2), which the list leaves out.
    let set = run(&idx, "*W1:10 boolean", Operator::Or);
    assert_eq!(sorted_keys(&set), vec!["1", "3"]);
    assert!(set.iter().all(|r| r.score == 0));
}

#[test]
fn test_escalation_loosens_empty_terms_only() {
    let idx = corpus();
    assert!(run(&idx, "pars", Operator::Or).is_empty());
    assert_eq!(keys(&run(&idx, "*E-1 pars", Operator::Or)), vec!["1"]);

    // `bread` matches exactly and never escalates, `pars` still does.
    let set = run(&idx, "*E-1 bread pars", Operator::Or);
    assert_eq!(sorted_keys(&set), vec!["1", "4"]);
}

#[test]
fn test_configured_escalation() {
    let idx = corpus();
    let config = QueryConfig {
        escalation: Some(Escalation {
            threshold: -1,
            secondary: None,
        }),
        ..QueryConfig::default()
    };
    let query = parse_query("pars", Operator::Or);
    let set = QueryExecutor::with_config(&idx, &config).execute(&query).unwrap();
    assert_eq!(keys(&set), vec!["1"]);
}

#[test]
fn test_directional_operators_order_results() {
    let idx = abc_index();
    let mut set = run(&idx, "<a b", Operator::Or);
    set.sort(0, SortDirection::Descending);
    // The shared document sums both sides and stays on top.
    assert_eq!(keys(&set), vec!["a&b", "b", "a"]);

    let mut set = run(&idx, "a >b", Operator::Or);
    set.sort(0, SortDirection::Descending);
    assert_eq!(keys(&set), vec!["a&b", "a", "b"]);
}

#[test]
fn test_directional_operators_with_negative_weights() {
    let idx = abc_index();
    let set = run(&idx, "*W1:-1 <a b", Operator::Or);
    let a = set.find(&"a".into()).unwrap();
    let b = set.find(&"b".into()).unwrap();
    assert!(a < 0 && b < 0);
    assert!(a < b, "a={} b={}", a, b);

    let set = run(&idx, "*W1:-1 a >b", Operator::Or);
    assert!(set.find(&"a".into()) > set.find(&"b".into()));
}

#[test]
fn test_adjust_keeps_membership() {
    let idx = abc_index();
    let plain = run(&idx, "a", Operator::Or);
    let adjusted = run(&idx, "a ~b", Operator::Or);
    assert_eq!(plain.nhits(), adjusted.nhits());
    assert!(adjusted.find(&"a&b".into()) < plain.find(&"a&b".into()));
    assert_eq!(adjusted.find(&"a".into()), plain.find(&"a".into()));
}

#[test]
fn test_section_unit_then_group() {
    let idx = corpus();
    let config = QueryConfig {
        records: RecordSetConfig::new(RecUnit::Section, RecUnit::None, 0),
        ..QueryConfig::default()
    };
    let query = parse_query("search OR queries", Operator::Or);
    let mut set = QueryExecutor::with_config(&idx, &config).execute(&query).unwrap();
    // 2:title, 3:body (search); 1:body, 3:body (queries) -> 3 distinct sections
    assert_eq!(set.nhits(), 3);

    set.group(2).unwrap();
    assert_eq!(set.config().record_unit, RecUnit::Document);
    assert_eq!(sorted_keys(&set), vec!["1", "2", "3"]);
    let three = set.iter().find(|r| r.key == RecordKey::from(3)).unwrap();
    assert_eq!(three.n_subrecs, 1);
}

#[test]
fn test_section_unit_operators_span_sections() {
    let idx = corpus();
    let config = QueryConfig {
        records: RecordSetConfig::new(RecUnit::Section, RecUnit::None, 0),
        ..QueryConfig::default()
    };
    let executor = QueryExecutor::with_config(&idx, &config);

    // Document 2 has "search" in its title and "inverted" in its body.
    let set = executor.execute(&parse_query("+search +inverted", Operator::Or)).unwrap();
    let hits: Vec<(String, u32)> = set.iter().map(|r| (r.key.to_string(), r.section)).collect();
    assert_eq!(hits, vec![("2".to_string(), 1), ("2".to_string(), 2)]);

    let set = executor.execute(&parse_query("search -inverted", Operator::Or)).unwrap();
    assert_eq!(keys(&set), vec!["3"]);
}

#[test]
fn test_remainder_can_be_executed_later() {
    let idx = abc_index();
    let (first, rest) = parse("a b", Operator::Or, 1, Encoding::Utf8).unwrap();
    assert_eq!(rest, "b");
    let exec = QueryExecutor::new(&idx);
    let mut set = exec.execute(&first).unwrap();
    let (second, rest) = parse(rest, Operator::Or, 1, Encoding::Utf8).unwrap();
    assert!(rest.is_empty());
    exec.execute_into(&second, &mut set, Operator::And).unwrap();
    assert_eq!(keys(&set), vec!["a&b"]);
}

#[test]
fn test_zero_budget_is_rejected() {
    assert!(matches!(
        parse("a", Operator::Or, 0, Encoding::Utf8),
        Err(qrs::Error::InvalidArgument(_))
    ));
}
