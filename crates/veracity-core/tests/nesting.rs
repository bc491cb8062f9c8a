//! Nesting tests: a chain used as a stage of another chain.

use std::sync::Arc;

use veracity_core::fakes::{Journal, StaticAdapter};
use veracity_core::{
    AdapterConfig, AdapterError, ChainParams, ChainedAdapter, DynAdapter, JsonParams, Prebound,
    TransformError, TruthAdapter, REASON_KEY, SOURCE_RESULT_KEY, TARGET_RESULT_KEY,
};

type Inner = ChainedAdapter<StaticAdapter, StaticAdapter>;
type Outer = ChainedAdapter<Inner, StaticAdapter>;

fn inner_config(
    a: &Arc<StaticAdapter>,
    b: &Arc<StaticAdapter>,
) -> AdapterConfig<ChainParams<StaticAdapter, StaticAdapter>> {
    AdapterConfig::new(
        "inner",
        "Inner",
        ChainParams::new(
            Arc::clone(a),
            AdapterConfig::bare("a", "A"),
            Arc::clone(b),
            AdapterConfig::bare("b", "B"),
        ),
    )
}

/// Three stages a → b → c built as (a AND b) AND c.
async fn three_stage(
    a: &Arc<StaticAdapter>,
    b: &Arc<StaticAdapter>,
    c: &Arc<StaticAdapter>,
) -> Outer {
    let inner = Arc::new(Inner::new());
    let outer = Outer::new();
    outer
        .configure(AdapterConfig::new(
            "outer",
            "Outer",
            ChainParams::new(
                inner,
                inner_config(a, b),
                Arc::clone(c),
                AdapterConfig::bare("c", "C"),
            ),
        ))
        .await
        .unwrap();
    outer
}

#[tokio::test]
async fn three_stages_all_true() {
    let a = Arc::new(StaticAdapter::new(true));
    let b = Arc::new(StaticAdapter::new(true));
    let c = Arc::new(StaticAdapter::new(true));
    let outer = three_stage(&a, &b, &c).await;

    let result = outer.evaluate().await.unwrap();

    assert!(result.answer);
    let inner_result = result.sub_result(SOURCE_RESULT_KEY).unwrap();
    assert!(inner_result.sub_result(SOURCE_RESULT_KEY).is_some());
    assert!(inner_result.sub_result(TARGET_RESULT_KEY).is_some());
    assert!(result.sub_result(TARGET_RESULT_KEY).is_some());
}

#[tokio::test]
async fn first_stage_false_skips_everything_downstream() {
    let a = Arc::new(StaticAdapter::new(false));
    let b = Arc::new(StaticAdapter::new(true));
    let c = Arc::new(StaticAdapter::new(true));
    let outer = three_stage(&a, &b, &c).await;

    let result = outer.evaluate().await.unwrap();

    assert!(!result.answer);
    assert!(result.get(REASON_KEY).is_some());
    let inner_result = result.sub_result(SOURCE_RESULT_KEY).unwrap();
    assert!(inner_result.get(REASON_KEY).is_some());
    assert_eq!(b.evaluate_count(), 0);
    assert_eq!(c.evaluate_count(), 0);
}

#[tokio::test]
async fn nested_configure_and_dispose_order() {
    let journal = Journal::new();
    let a = Arc::new(StaticAdapter::new(true).with_journal(&journal, "a"));
    let b = Arc::new(StaticAdapter::new(true).with_journal(&journal, "b"));
    let c = Arc::new(StaticAdapter::new(true).with_journal(&journal, "c"));
    let outer = three_stage(&a, &b, &c).await;

    outer.evaluate().await.unwrap();
    outer.dispose().await;

    assert_eq!(
        journal.entries(),
        vec![
            "a.configure",
            "b.configure",
            "c.configure",
            "a.evaluate",
            "b.evaluate",
            "c.evaluate",
            "a.dispose",
            "b.dispose",
            "c.dispose"
        ]
    );
}

#[tokio::test]
async fn inner_transform_failure_escapes_outer_chain() {
    let a = Arc::new(StaticAdapter::new(true));
    let b = Arc::new(StaticAdapter::new(true));
    let c = Arc::new(StaticAdapter::new(true));
    let inner = Arc::new(Inner::new());
    let inner_params = inner_config(&a, &b)
        .map_params(|p| p.with_transform(|_| Err(TransformError::new("bad wiring"))));
    let outer = Outer::new();
    outer
        .configure(AdapterConfig::new(
            "outer",
            "Outer",
            ChainParams::new(inner, inner_params, Arc::clone(&c), AdapterConfig::bare("c", "C")),
        ))
        .await
        .unwrap();

    let err = outer.evaluate().await.unwrap_err();

    assert!(matches!(err, AdapterError::Transform { ref chain, .. } if chain == "inner"));
    assert_eq!(c.evaluate_count(), 0);
}

#[tokio::test]
async fn outer_transform_can_rebuild_a_chain_target() {
    let a = Arc::new(StaticAdapter::new(true).with_metadata("value", "x"));
    let b = Arc::new(StaticAdapter::new(true));
    let c = Arc::new(StaticAdapter::new(true));
    let inner_target = Arc::new(Inner::new());
    let (b2, c2) = (Arc::clone(&b), Arc::clone(&c));

    let outer: ChainedAdapter<StaticAdapter, Inner> = ChainedAdapter::new();
    let params = ChainParams::new(
        Arc::clone(&a),
        AdapterConfig::bare("a", "A"),
        inner_target,
        inner_config(&b, &c),
    )
    .with_transform(move |result| {
        let value = result
            .get("value")
            .cloned()
            .ok_or_else(|| TransformError::new("missing value"))?;
        let mut params = JsonParams::new();
        params.insert("value".to_string(), value);
        Ok(AdapterConfig::new(
            "inner-rebuilt",
            "Inner rebuilt",
            ChainParams::new(
                Arc::clone(&b2),
                AdapterConfig::new("b", "B", params),
                Arc::clone(&c2),
                AdapterConfig::bare("c", "C"),
            ),
        ))
    });
    outer
        .configure(AdapterConfig::new("outer", "Outer", params))
        .await
        .unwrap();

    assert!(outer.evaluate().await.unwrap().answer);
    assert_eq!(b.configure_count(), 2);
    assert_eq!(b.last_config().unwrap().params["value"], "x");
}

#[tokio::test]
async fn dyn_stages_mix_freely() {
    let leaf: Arc<DynAdapter> = Arc::new(StaticAdapter::new(true));
    let a = Arc::new(StaticAdapter::new(true));
    let b = Arc::new(StaticAdapter::new(true));
    let prebound: Arc<DynAdapter> =
        Arc::new(Prebound::new(Arc::new(Inner::new()), inner_config(&a, &b)));

    let chain: ChainedAdapter<DynAdapter, DynAdapter> = ChainedAdapter::new();
    chain
        .configure(AdapterConfig::new(
            "mixed",
            "Mixed",
            ChainParams::new(
                leaf,
                AdapterConfig::bare("leaf", "Leaf"),
                prebound,
                AdapterConfig::bare("inner", "Inner"),
            ),
        ))
        .await
        .unwrap();

    assert!(chain.evaluate().await.unwrap().answer);
    assert_eq!(a.evaluate_count(), 1);
    assert_eq!(b.evaluate_count(), 1);
}
