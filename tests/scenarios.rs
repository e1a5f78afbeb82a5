//! The numbered orders/suppliers scenarios.

mod common;

use relalg::{attr, cardinality, degree, Heading, Tuple, Value};

use common::{as_set, drain, orders, orders_heading, suppliers};

#[tokio::test]
async fn scenario_1_restrict_on_pno() {
    common::init_tracing();
    let r = orders().restrict(attr("PNO").eq(Value::Int(1)));
    assert_eq!(cardinality(&r).await, 6);
    assert_eq!(degree(&r), 3);
    assert!(r.err().is_none());
}

#[tokio::test]
async fn scenario_2_project_pno_qty() {
    let r = orders().project(vec!["PNO".into(), "Qty".into()]);
    assert_eq!(cardinality(&r).await, 10);
    assert_eq!(degree(&r), 2);
}

#[tokio::test]
async fn scenario_3_orders_minus_qty_200() {
    let qty_200 = orders().restrict(attr("Qty").eq(Value::Int(200)));
    let r = orders().difference(&qty_200);
    assert_eq!(cardinality(&r).await, 8);
}

#[tokio::test]
async fn scenario_4_orders_join_suppliers() {
    let r = orders().join(&suppliers());
    assert_eq!(cardinality(&r).await, 11);
    assert_eq!(degree(&r), 6);

    // The reported key must be {PNO,SNO}, not the bare shared attribute {SNO} —
    // SNO alone repeats across rows whenever two orders share a supplier (e.g.
    // (1,1,300) and (2,1,300) both have SNO=1).
    let keys: Vec<_> = r.candidate_keys().iter().collect();
    assert!(keys.iter().any(|k| {
        let names: std::collections::HashSet<&str> = k.iter().map(|n| n.as_ref()).collect();
        names == ["PNO", "SNO"].into_iter().collect()
    }));
    assert!(!keys.iter().any(|k| k.len() == 1 && k[0].as_ref() == "SNO"));

    let tuples = drain(&r).await;
    let sno_values: Vec<i64> = tuples
        .iter()
        .filter_map(|t| match t.get_by_name("SNO") {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        })
        .collect();
    let distinct_snos: std::collections::HashSet<_> = sno_values.iter().collect();
    assert!(distinct_snos.len() < sno_values.len(), "SNO must repeat in the join output");
}

#[tokio::test]
async fn scenario_5_group_by_pno_sum_qty() {
    let result_heading = vec![("Qty".to_string(), relalg::DataType::Int)];
    let r = orders().group_by(vec!["PNO".into()], result_heading, |values| {
        let sum: i64 = values
            .iter()
            .map(|t| match t.get_by_name("Qty") {
                Some(Value::Int(n)) => *n,
                _ => 0,
            })
            .sum();
        let h = Heading::new(vec![relalg::Attribute::new("Qty", relalg::DataType::Int)])?;
        Tuple::new(h, vec![Value::Int(sum)])
    });
    let tuples = drain(&r).await;
    assert!(r.err().is_none(), "group_by errored: {:?}", r.err());

    let expected: std::collections::HashMap<i64, i64> =
        [(1, 1300), (2, 700), (3, 200), (4, 900)].into_iter().collect();
    assert_eq!(tuples.len(), expected.len());
    for t in &tuples {
        let pno = match t.get_by_name("PNO") {
            Some(Value::Int(n)) => *n,
            _ => panic!("missing PNO"),
        };
        let qty = match t.get_by_name("Qty") {
            Some(Value::Int(n)) => *n,
            _ => panic!("missing Qty"),
        };
        assert_eq!(expected[&pno], qty, "group {pno}");
    }
}

#[tokio::test]
async fn scenario_6_rename_orders() {
    let r = orders().rename(vec!["PartNo".into(), "SupplyNo".into(), "Quantity".into()]);
    assert_eq!(cardinality(&r).await, 12);
    let keys: Vec<_> = r.candidate_keys().iter().collect();
    assert!(keys.iter().any(|k| {
        let names: std::collections::HashSet<&str> = k.iter().map(|n| n.as_ref()).collect();
        names == ["PartNo", "SupplyNo"].into_iter().collect()
    }));
}

#[tokio::test]
async fn orders_heading_is_as_specified() {
    assert_eq!(degree(&orders()), 3);
    assert_eq!(orders().heading(), &orders_heading());
}

#[tokio::test]
async fn orders_tuples_are_distinct_by_set() {
    let tuples = drain(&orders()).await;
    assert_eq!(as_set(&tuples).len(), tuples.len());
}

#[tokio::test]
async fn sequence_without_keys_deduplicates_on_construction() {
    let h = orders_heading();
    let one = Tuple::new(h.clone(), vec![Value::Int(1), Value::Int(1), Value::Int(300)]).unwrap();
    let dup = Tuple::new(h.clone(), vec![Value::Int(1), Value::Int(1), Value::Int(300)]).unwrap();
    let other = Tuple::new(h.clone(), vec![Value::Int(2), Value::Int(1), Value::Int(300)]).unwrap();

    let r = relalg::Relation::from_sequence("dup_test", h, vec![one, dup, other], None);
    let tuples = drain(&r).await;
    assert_eq!(tuples.len(), 2, "duplicate rows must be collapsed when no keys are supplied");
    assert_eq!(as_set(&tuples).len(), tuples.len());
}

#[tokio::test]
async fn group_by_reports_surviving_source_key_not_full_group_key() {
    // orders' key {PNO,SNO} is already a subset of the group key {PNO,SNO}, so the
    // minimal reported key should be {PNO,SNO} either way here; group instead by a
    // strict superset {PNO,SNO,Qty} to force a case where the *source* key
    // {PNO,SNO} is smaller than and still a subset of the group key.
    let result_heading = vec![];
    let r = orders().group_by(
        vec!["PNO".into(), "SNO".into(), "Qty".into()],
        result_heading,
        |_values| {
            let h = Heading::new(vec![])?;
            Tuple::new(h, vec![])
        },
    );
    assert!(r.err().is_none(), "group_by errored: {:?}", r.err());
    let keys: Vec<_> = r.candidate_keys().iter().collect();
    assert!(keys.iter().any(|k| {
        let names: std::collections::HashSet<&str> = k.iter().map(|n| n.as_ref()).collect();
        names == ["PNO", "SNO"].into_iter().collect()
    }));
    assert!(
        !keys.iter().any(|k| k.len() == 3),
        "the minimal surviving key {{PNO,SNO}} should be reported, not the full group key"
    );
}
