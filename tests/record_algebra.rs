//! Properties of the record-set algebra, checked over a spread of inputs.

mod fixtures;

use fixtures::{doc_set, keys, section_set};
use qrs::records::{Record, RecordId, RecordKey, RecordSet, RecordSetConfig, SortDirection};

/// Pairs of sets with no, partial and full overlap, plus empty operands.
fn pairs() -> Vec<(RecordSet, RecordSet)> {
    vec![
        (doc_set(&[(1, 5), (2, 3)]), doc_set(&[(3, 1), (4, 2)])),
        (doc_set(&[(1, 5), (2, 3), (3, 7)]), doc_set(&[(3, 1), (4, 2), (1, 9)])),
        (doc_set(&[(1, 5), (2, 3)]), doc_set(&[(2, 4), (1, 1)])),
        (doc_set(&[]), doc_set(&[(1, 1)])),
        (doc_set(&[(1, 1)]), doc_set(&[])),
        (doc_set(&[]), doc_set(&[])),
        (
            doc_set(&(0..50u32).map(|i| (i * 2, i as i32)).collect::<Vec<_>>()),
            doc_set(&(0..50u32).map(|i| (i * 3, 1)).collect::<Vec<_>>()),
        ),
    ]
}

#[test]
fn test_union_inclusion_exclusion() {
    for (a, b) in pairs() {
        let union = a.union(&b);
        let intersect = a.intersect(&b);
        assert_eq!(union.nhits(), a.nhits() + b.nhits() - intersect.nhits());
    }
}

#[test]
fn test_subtract_then_intersect_is_empty() {
    for (a, b) in pairs() {
        let diff = a.subtract(&b);
        assert!(diff.intersect(&b).is_empty());
    }
}

#[test]
fn test_difference_shrinks_both_sides() {
    for (mut a, mut b) in pairs() {
        let before = a.nhits() + b.nhits();
        let common = a.intersect(&b).nhits();

        let removed = a.difference(&mut b);
        assert_eq!(removed, common);
        assert!(a.intersect(&b).is_empty());
        assert_eq!(a.nhits() + b.nhits(), before - 2 * common);
    }
}

#[test]
fn test_operands_are_not_modified() {
    let a = doc_set(&[(1, 5), (2, 3)]);
    let b = doc_set(&[(2, 4), (3, 1)]);
    let _ = a.union(&b);
    let _ = a.intersect(&b);
    let _ = a.subtract(&b);
    assert_eq!(keys(&a), vec!["1", "2"]);
    assert_eq!(keys(&b), vec!["2", "3"]);
    assert_eq!(a.find(&RecordKey::from(2)), Some(3));
}

#[test]
fn test_union_order_and_scores() {
    let a = doc_set(&[(2, 1), (1, 1)]);
    let b = doc_set(&[(3, 1), (1, 4), (4, 1)]);
    let union = a.union(&b);
    assert_eq!(keys(&union), vec!["2", "1", "3", "4"]);
    assert_eq!(union.find(&RecordKey::from(1)), Some(5));
}

#[test]
fn test_intersect_sums_and_subtract_keeps_scores() {
    let a = doc_set(&[(1, 5), (2, 3)]);
    let b = doc_set(&[(2, 4), (3, 1)]);
    let both = a.intersect(&b);
    assert_eq!(keys(&both), vec!["2"]);
    assert_eq!(both.find(&RecordKey::from(2)), Some(7));

    let only = a.subtract(&b);
    assert_eq!(keys(&only), vec!["1"]);
    assert_eq!(only.find(&RecordKey::from(1)), Some(5));
}

/// Document-unit set with string keys.
fn named_doc_set(names: &[&str]) -> RecordSet {
    let mut set = RecordSet::new(RecordSetConfig::default()).unwrap();
    for name in names {
        set.add(RecordId::new(*name, 0, 0), 1);
    }
    set
}

fn sections(set: &RecordSet) -> Vec<(String, u32)> {
    set.iter().map(|r| (r.key.to_string(), r.section)).collect()
}

#[test]
fn test_section_sets_match_by_document() {
    let a = section_set(&[("d1", 1, 2), ("d2", 1, 1)]);
    let b = section_set(&[("d1", 2, 3), ("d3", 1, 1)]);

    let both = a.intersect(&b);
    assert_eq!(sections(&both), vec![("d1".to_string(), 1), ("d1".to_string(), 2)]);
    assert_eq!(both.find(&RecordKey::from("d1")), Some(5));

    let only = a.subtract(&b);
    assert_eq!(sections(&only), vec![("d2".to_string(), 1)]);

    let union = a.union(&b);
    assert_eq!(union.nhits(), 4);
    assert_eq!(union.find(&RecordKey::from("d1")), Some(5));

    let mut adjusted = a.clone();
    adjusted.adjust_with(&b, |s, p| s - p);
    assert_eq!(adjusted.find(&RecordKey::from("d1")), Some(-1));
    assert_eq!(adjusted.find(&RecordKey::from("d2")), Some(1));
}

#[test]
fn test_same_section_still_merges() {
    let a = section_set(&[("d1", 1, 2)]);
    let b = section_set(&[("d1", 1, 3)]);
    let both = a.intersect(&b);
    assert_eq!(sections(&both), vec![("d1".to_string(), 1)]);
    assert_eq!(both.records()[0].score, 5);
}

#[test]
fn test_difference_across_units() {
    let mut docs = named_doc_set(&["d1", "d2"]);
    let mut secs = section_set(&[("d1", 1, 4), ("d3", 2, 1)]);
    assert_eq!(docs.difference(&mut secs), 1);
    assert_eq!(keys(&docs), vec!["d2"]);
    assert_eq!(keys(&secs), vec!["d3"]);

    let mut secs = section_set(&[("d1", 1, 4), ("d1", 2, 4), ("d3", 1, 1)]);
    let mut docs = named_doc_set(&["d1"]);
    assert_eq!(secs.difference(&mut docs), 2);
    assert_eq!(keys(&secs), vec!["d3"]);
    assert!(docs.is_empty());
}

#[test]
fn test_sort_limit_directions_reverse() {
    let base = doc_set(&[(1, 10), (2, 30), (3, 20), (4, 5)]);

    let mut desc = base.clone();
    desc.sort(2, SortDirection::Descending);
    assert_eq!(keys(&desc), vec!["2", "3"]);

    let mut asc = base.clone();
    asc.sort(2, SortDirection::Ascending);
    assert_eq!(keys(&asc), vec!["4", "1"]);

    let mut full_desc = base.clone();
    full_desc.sort(0, SortDirection::Descending);
    let mut full_asc = base;
    full_asc.sort(0, SortDirection::Ascending);
    let mut reversed = keys(&full_asc);
    reversed.reverse();
    assert_eq!(keys(&full_desc), reversed);
}

#[test]
fn test_sort_with_comparator() {
    let mut set = doc_set(&[(3, 1), (1, 1), (2, 1)]);
    // Lower key ranks higher.
    let by_key = |a: &Record, b: &Record| b.key.as_u32().cmp(&a.key.as_u32());
    set.sort_by(0, SortDirection::Descending, &by_key);
    assert_eq!(keys(&set), vec!["1", "2", "3"]);
}

#[test]
fn test_group_sections_into_documents() {
    // 4 raw hits across 3 documents
    let mut set = section_set(&[("x", 1, 3), ("y", 1, 2), ("x", 2, 4), ("z", 3, 1)]);
    assert_eq!(set.nhits(), 4);

    set.group(0).unwrap();
    assert_eq!(set.nhits(), 3);
    let x = set.iter().find(|r| r.key == RecordKey::from("x")).unwrap();
    assert_eq!(x.n_subrecs, 2);
    assert_eq!(x.score, 7);
    assert!(set.iter().filter(|r| r.key != RecordKey::from("x")).all(|r| r.n_subrecs == 1));
}

#[test]
fn test_group_keeps_best_subrecords() {
    let mut set = section_set(&[("x", 1, 3), ("x", 2, 9), ("x", 3, 4)]);
    set.group(2).unwrap();
    let x = &set.records()[0];
    assert_eq!(x.n_subrecs, 3);
    assert_eq!(x.subrecs.len(), 2);
    assert_eq!(x.subrec(0).map(|s| (s.section, s.score)), Some((2, 9)));
    assert_eq!(x.subrec(1).map(|s| (s.section, s.score)), Some((3, 4)));
}

#[test]
fn test_group_by_section_number() {
    let mut set = section_set(&[("x", 1, 3), ("y", 1, 2), ("x", 2, 4), ("z", 2, 1), ("w", 3, 1)]);
    let by_section = |r: &Record| Some(r.section.to_le_bytes().to_vec());
    set.group_by(2, SortDirection::Descending, &by_section).unwrap();

    // Aggregates: section 1 = 5, section 2 = 5, section 3 = 1; ties keep first-seen order.
    assert_eq!(set.nhits(), 2);
    let sections: Vec<u32> = set
        .iter()
        .map(|r| {
            let bytes: [u8; 4] = r.key.as_bytes()[..].try_into().unwrap();
            u32::from_le_bytes(bytes)
        })
        .collect();
    assert_eq!(sections, vec![1, 2]);
    assert!(set.iter().all(|r| r.n_subrecs == 2));
}

#[test]
fn test_group_rejects_document_unit() {
    let mut set = doc_set(&[(1, 1)]);
    assert!(matches!(set.group(0), Err(qrs::Error::InvalidArgument(_))));
}

#[test]
fn test_cursor_walks_current_order() {
    let mut set = doc_set(&[(1, 10), (2, 30)]);
    set.sort(0, SortDirection::Descending);

    set.rewind();
    let mut seen = Vec::new();
    while let Some((key, score)) = set.next() {
        seen.push((key.clone(), score));
    }
    assert_eq!(seen, vec![(RecordKey::from(2), 30), (RecordKey::from(1), 10)]);
    assert!(set.next().is_none());

    set.rewind();
    assert_eq!(set.next().map(|(_, s)| s), Some(30));
    assert_eq!(set.curr_score(), 30);
}
