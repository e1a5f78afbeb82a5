use relalg::{Attribute, DataType, Heading, Relation, Tuple, Value};

/// Route `tracing` events to stdout for the duration of a test run. Cheap and
/// idempotent; every integration test file calls this once via `common::init_tracing`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn orders_heading() -> Heading {
    Heading::new(vec![
        Attribute::new("PNO", DataType::Int),
        Attribute::new("SNO", DataType::Int),
        Attribute::new("Qty", DataType::Int),
    ])
    .unwrap()
}

pub fn orders() -> Relation {
    let h = orders_heading();
    let rows: &[(i64, i64, i64)] = &[
        (1, 1, 300),
        (1, 2, 200),
        (1, 3, 400),
        (1, 4, 200),
        (1, 5, 100),
        (1, 6, 100),
        (2, 1, 300),
        (2, 2, 400),
        (3, 2, 200),
        (4, 2, 200),
        (4, 4, 300),
        (4, 5, 400),
    ];
    let tuples: Vec<Tuple> = rows
        .iter()
        .map(|(p, s, q)| Tuple::new(h.clone(), vec![Value::Int(*p), Value::Int(*s), Value::Int(*q)]).unwrap())
        .collect();
    Relation::from_sequence(
        "orders",
        h,
        tuples,
        Some(vec![vec!["PNO".into(), "SNO".into()]]),
    )
}

pub fn suppliers_heading() -> Heading {
    Heading::new(vec![
        Attribute::new("SNO", DataType::Int),
        Attribute::new("SName", DataType::Str),
        Attribute::new("Status", DataType::Int),
        Attribute::new("City", DataType::Str),
    ])
    .unwrap()
}

pub fn suppliers() -> Relation {
    let h = suppliers_heading();
    let rows: &[(i64, &str, i64, &str)] = &[
        (1, "Smith", 20, "London"),
        (2, "Jones", 10, "Paris"),
        (3, "Blake", 30, "Paris"),
        (4, "Clark", 20, "London"),
        (5, "Adams", 30, "Athens"),
    ];
    let tuples: Vec<Tuple> = rows
        .iter()
        .map(|(sno, name, status, city)| {
            Tuple::new(
                h.clone(),
                vec![
                    Value::Int(*sno),
                    Value::Str((*name).to_string()),
                    Value::Int(*status),
                    Value::Str((*city).to_string()),
                ],
            )
            .unwrap()
        })
        .collect();
    Relation::from_sequence("suppliers", h, tuples, Some(vec![vec!["SNO".into()]]))
}

pub async fn drain(r: &Relation) -> Vec<Tuple> {
    let mut s = r.stream();
    let mut out = Vec::new();
    while let Some(t) = s.rx.recv().await {
        out.push(t);
    }
    out
}

pub fn as_set(tuples: &[Tuple]) -> std::collections::HashSet<Tuple> {
    tuples.iter().cloned().collect()
}
