//! Operator throughput benchmarks: restrict, join, and group-by over varying
//! input sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use relalg::{attr, cardinality, Attribute, DataType, Heading, Relation, Tuple, Value};
use tokio::runtime::Runtime;

fn wide_heading() -> Heading {
    Heading::new(vec![
        Attribute::new("id", DataType::Int),
        Attribute::new("group", DataType::Int),
        Attribute::new("val", DataType::Int),
    ])
    .unwrap()
}

fn make_sequence(size: u32) -> Relation {
    let h = wide_heading();
    let tuples: Vec<Tuple> = (0..size)
        .map(|i| {
            Tuple::new(
                h.clone(),
                vec![
                    Value::Int(i64::from(i)),
                    Value::Int(i64::from(i % 10)),
                    Value::Int(i64::from(i)),
                ],
            )
            .unwrap()
        })
        .collect();
    Relation::from_sequence("bench", h, tuples, Some(vec![vec!["id".into()]]))
}

fn bench_restrict(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("restrict");
    for size in [1_000u32, 10_000] {
        let source = make_sequence(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let r = source.restrict(attr("val").ge(Value::Int(i64::from(size / 2))));
                rt.block_on(cardinality(&r))
            });
        });
    }
    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("join");
    for size in [1_000u32, 10_000] {
        let left = make_sequence(size);
        let right_heading = Heading::new(vec![
            Attribute::new("group", DataType::Int),
            Attribute::new("label", DataType::Str),
        ])
        .unwrap();
        let right_tuples: Vec<Tuple> = (0..10)
            .map(|g| Tuple::new(right_heading.clone(), vec![Value::Int(g), Value::Str(format!("g{g}"))]).unwrap())
            .collect();
        let right = Relation::from_sequence("groups", right_heading, right_tuples, Some(vec![vec!["group".into()]]));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let r = left.join(&right);
                rt.block_on(cardinality(&r))
            });
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("group_by");
    for size in [1_000u32, 10_000] {
        let source = make_sequence(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let result_heading = vec![("val".to_string(), DataType::Int)];
                let r = source.group_by(vec!["group".into()], result_heading, |values| {
                    let sum: i64 = values
                        .iter()
                        .map(|t| match t.get_by_name("val") {
                            Some(Value::Int(n)) => *n,
                            _ => 0,
                        })
                        .sum();
                    let h = Heading::new(vec![Attribute::new("val", DataType::Int)])?;
                    Tuple::new(h, vec![Value::Int(sum)])
                });
                rt.block_on(cardinality(&r))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_restrict, bench_join, bench_group_by);
criterion_main!(benches);
