//! Push-down rewrite equivalences from `spec.md` §4.5-§4.10: the rewritten tree
//! (what `build()` actually constructs) must produce the same tuples as the
//! naive, unrewritten tree would.

mod common;

use relalg::text::text;
use relalg::{attr, Value};

use common::{as_set, drain, orders, suppliers};

#[tokio::test]
async fn restrict_through_project_matches_naive_order() {
    common::init_tracing();
    let direct = orders()
        .project(vec!["PNO".into(), "Qty".into()])
        .restrict(attr("PNO").eq(Value::Int(1)));
    let naive = orders()
        .restrict(attr("PNO").eq(Value::Int(1)))
        .project(vec!["PNO".into(), "Qty".into()]);
    assert_eq!(as_set(&drain(&direct).await), as_set(&drain(&naive).await));
}

#[tokio::test]
async fn restrict_through_rename_matches_naive_order() {
    let renamed = orders().rename(vec!["PartNo".into(), "SupplyNo".into(), "Quantity".into()]);
    let direct = renamed.restrict(attr("PartNo").eq(Value::Int(1)));

    let naive = orders()
        .restrict(attr("PNO").eq(Value::Int(1)))
        .rename(vec!["PartNo".into(), "SupplyNo".into(), "Quantity".into()]);

    assert_eq!(as_set(&drain(&direct).await), as_set(&drain(&naive).await));
}

#[tokio::test]
async fn restrict_distributes_through_union() {
    let union = orders()
        .restrict(attr("PNO").eq(Value::Int(1)))
        .union(&orders().restrict(attr("PNO").eq(Value::Int(2))));
    let restricted = union.restrict(attr("Qty").ge(Value::Int(300)));

    let naive = orders()
        .restrict(attr("PNO").eq(Value::Int(1)))
        .restrict(attr("Qty").ge(Value::Int(300)))
        .union(
            &orders()
                .restrict(attr("PNO").eq(Value::Int(2)))
                .restrict(attr("Qty").ge(Value::Int(300))),
        );

    assert_eq!(as_set(&drain(&restricted).await), as_set(&drain(&naive).await));
}

#[tokio::test]
async fn restrict_pushes_into_owning_join_side() {
    let joined = orders().join(&suppliers());
    let restricted = joined.restrict(attr("City").eq(Value::Str("London".into())));

    let naive = orders().join(&suppliers().restrict(attr("City").eq(Value::Str("London".into()))));

    assert_eq!(as_set(&drain(&restricted).await), as_set(&drain(&naive).await));
}

#[tokio::test]
async fn project_fusion_matches_nested_projection() {
    let fused = orders().project(vec!["PNO".into(), "SNO".into()]);
    let nested = orders()
        .project(vec!["PNO".into(), "SNO".into(), "Qty".into()])
        .project(vec!["PNO".into(), "SNO".into()]);
    assert_eq!(as_set(&drain(&fused).await), as_set(&drain(&nested).await));
}

#[tokio::test]
async fn rename_fusion_matches_nested_rename() {
    let fused = orders().rename(vec!["A".into(), "B".into(), "C".into()]);
    let nested = orders()
        .rename(vec!["X".into(), "Y".into(), "Z".into()])
        .rename(vec!["A".into(), "B".into(), "C".into()]);
    assert_eq!(as_set(&drain(&fused).await), as_set(&drain(&nested).await));
}

#[tokio::test]
async fn text_rendering_is_nonempty_and_stable() {
    let r = orders().restrict(attr("PNO").eq(Value::Int(1))).project(vec!["Qty".into()]);
    let rendered = text(&r);
    assert!(!rendered.is_empty());
    assert_eq!(rendered, text(&r));
}

#[tokio::test]
async fn project_fusion_rejects_attribute_dropped_by_inner_projection() {
    // b drops "Qty"; projecting onto "Qty" through b must fail exactly like
    // building π_{PNO,Qty} against b directly would, not silently succeed by
    // resolving "Qty" against orders' wider heading.
    let b = orders().project(vec!["PNO".into(), "SNO".into()]);
    let direct_against_b = b.heading().project(&["PNO".to_string(), "Qty".to_string()]);
    assert!(direct_against_b.is_err());

    let a = b.project(vec!["PNO".into(), "Qty".into()]);
    assert!(a.err().is_some(), "projecting a dropped attribute through a fused projection must error");
}

#[tokio::test]
async fn rename_distributes_through_union() {
    let union = orders()
        .restrict(attr("PNO").eq(Value::Int(1)))
        .union(&orders().restrict(attr("PNO").eq(Value::Int(2))));
    let renamed = union.rename(vec!["PartNo".into(), "SupplyNo".into(), "Quantity".into()]);

    let naive = orders()
        .restrict(attr("PNO").eq(Value::Int(1)))
        .rename(vec!["PartNo".into(), "SupplyNo".into(), "Quantity".into()])
        .union(
            &orders()
                .restrict(attr("PNO").eq(Value::Int(2)))
                .rename(vec!["PartNo".into(), "SupplyNo".into(), "Quantity".into()]),
        );

    assert_eq!(as_set(&drain(&renamed).await), as_set(&drain(&naive).await));
}

#[tokio::test]
async fn rename_distributes_through_join_remapping_shared_attribute() {
    // Renaming SNO (the join's shared attribute) to "Supplier" must still produce
    // the same tuples as joining first and renaming the combined output after —
    // the pushed-down rename has to relabel SNO on *both* sides identically so
    // the join key still lines up.
    let joined = orders().join(&suppliers());
    let renamed = joined.rename(vec![
        "PartNo".into(),
        "Supplier".into(),
        "Quantity".into(),
        "SName".into(),
        "Status".into(),
        "City".into(),
    ]);

    let naive = orders().join(&suppliers()).rename(vec![
        "PartNo".into(),
        "Supplier".into(),
        "Quantity".into(),
        "SName".into(),
        "Status".into(),
        "City".into(),
    ]);

    assert_eq!(as_set(&drain(&renamed).await), as_set(&drain(&naive).await));
    assert!(renamed.err().is_none());
}

#[tokio::test]
async fn project_distributes_through_union_when_key_survives_both_sides() {
    let union = orders()
        .restrict(attr("PNO").eq(Value::Int(1)))
        .union(&orders().restrict(attr("PNO").eq(Value::Int(2))));
    let projected = union.project(vec!["PNO".into(), "SNO".into()]);

    let naive = orders()
        .restrict(attr("PNO").eq(Value::Int(1)))
        .project(vec!["PNO".into(), "SNO".into()])
        .union(
            &orders()
                .restrict(attr("PNO").eq(Value::Int(2)))
                .project(vec!["PNO".into(), "SNO".into()]),
        );

    assert_eq!(as_set(&drain(&projected).await), as_set(&drain(&naive).await));
}
