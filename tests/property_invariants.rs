//! Universal invariants (`spec.md` §8, invariants 1-3) checked over generated
//! tuple sets rather than the fixed orders/suppliers fixture.

mod common;

use proptest::prelude::*;
use relalg::{Attribute, DataType, Heading, Relation, Tuple, Value};

use common::{as_set, drain};

fn heading() -> Heading {
    Heading::new(vec![
        Attribute::new("a", DataType::Int),
        Attribute::new("b", DataType::Int),
    ])
    .unwrap()
}

fn relation_of(rows: &[(i64, i64)]) -> Relation {
    let h = heading();
    let tuples: Vec<Tuple> = rows
        .iter()
        .map(|(a, b)| Tuple::new(h.clone(), vec![Value::Int(*a), Value::Int(*b)]).unwrap())
        .collect();
    Relation::from_set("prop", h, tuples.into_iter().collect(), None)
}

proptest! {
    #[test]
    fn distinct_source_stays_distinct_through_project(
        rows in prop::collection::vec((0i64..20, 0i64..20), 0..200)
    ) {
        common::init_tracing();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let r = relation_of(&rows).project(vec!["a".into()]);
        let tuples = rt.block_on(drain(&r));
        prop_assert_eq!(as_set(&tuples).len(), tuples.len());
        for t in &tuples {
            prop_assert_eq!(t.heading(), r.heading());
        }
    }

    #[test]
    fn union_of_two_generated_sets_is_distinct(
        left in prop::collection::vec((0i64..20, 0i64..20), 0..100),
        right in prop::collection::vec((0i64..20, 0i64..20), 0..100),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let u = relation_of(&left).union(&relation_of(&right));
        let tuples = rt.block_on(drain(&u));
        prop_assert_eq!(as_set(&tuples).len(), tuples.len());
    }

    #[test]
    fn candidate_key_projection_has_no_duplicates(
        rows in prop::collection::vec((0i64..10, 0i64..20), 0..100)
    ) {
        // Dedup on `a` first so `a` is a genuine candidate key of the fixture.
        let mut seen = std::collections::HashSet::new();
        let deduped: Vec<(i64, i64)> = rows.into_iter().filter(|(a, _)| seen.insert(*a)).collect();
        let r = Relation::from_sequence(
            "keyed",
            heading(),
            deduped
                .iter()
                .map(|(a, b)| Tuple::new(heading(), vec![Value::Int(*a), Value::Int(*b)]).unwrap())
                .collect(),
            Some(vec![vec!["a".into()]]),
        );
        let rt = tokio::runtime::Runtime::new().unwrap();
        let tuples = rt.block_on(drain(&r));
        let keys: Vec<Option<&Value>> = tuples.iter().map(|t| t.get_by_name("a")).collect();
        let unique: std::collections::HashSet<_> = keys.iter().map(|v| format!("{v:?}")).collect();
        prop_assert_eq!(unique.len(), keys.len());
    }
}
