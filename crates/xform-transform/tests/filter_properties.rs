//! Property tests for INCLUDE / EXCLUDE
//!
//! Inputs are random metric lists over a small identity space so that
//! patterns hit, miss and duplicate identities regularly.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use xform_core::{Metric, MetricIdentity, MetricList, TimeRange};
use xform_transform::transforms::difference;
use xform_transform::{Function, QueryContext, TransformArgs, TransformCatalog};

// =============================================================================
// Strategies
// =============================================================================

fn metric_strategy() -> impl Strategy<Value = Arc<Metric>> {
    (
        prop::option::of(prop::sample::select(vec!["infra", "apps"])),
        prop::sample::select(vec!["host1", "host2", "web"]),
        prop::sample::select(vec!["cpu.load", "cpu.idle", "mem.used", "disk.io"]),
        prop::option::of(prop::sample::select(vec!["sfo", "nyc"])),
        prop::collection::vec((0i64..100, -1e6..1e6f64), 0..8),
    )
        .prop_map(|(namespace, scope, name, dc, points)| {
            let mut builder = Metric::builder(scope, name).datapoints(points);
            if let Some(ns) = namespace {
                builder = builder.namespace(ns);
            }
            if let Some(dc) = dc {
                builder = builder.tag("dc", dc);
            }
            Arc::new(builder.build().unwrap())
        })
}

fn patterns_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(vec![
            "cpu",
            "^host1:",
            "mem\\..*",
            "dc=sfo",
            "^infra:",
            "io$",
            "nomatch",
        ]),
        1..4,
    )
    .prop_map(|p| p.into_iter().map(String::from).collect())
}

// =============================================================================
// Helpers
// =============================================================================

fn run(function: Function, input: &[Arc<Metric>], patterns: &[String]) -> MetricList {
    let catalog = TransformCatalog::standard();
    let ctx = QueryContext::new(TimeRange::new(0, 100));
    catalog
        .invoke(function, &ctx, TransformArgs::WithConstants(input, patterns))
        .unwrap()
}

fn identities(list: &[Arc<Metric>]) -> Vec<MetricIdentity> {
    list.iter().map(|m| m.identity().clone()).collect()
}

/// Check that `sub` appears in `full` in the same relative order
fn is_subsequence(sub: &[MetricIdentity], full: &[MetricIdentity]) -> bool {
    let mut it = full.iter();
    sub.iter().all(|s| it.any(|f| f == s))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// INCLUDE and EXCLUDE partition the input by identity
    #[test]
    fn include_and_exclude_are_complements(
        input in prop::collection::vec(metric_strategy(), 0..20),
        patterns in patterns_strategy(),
    ) {
        let included = run(Function::Include, &input, &patterns);
        let excluded = run(Function::Exclude, &input, &patterns);

        prop_assert_eq!(included.len() + excluded.len(), input.len());

        let included_ids: HashSet<MetricIdentity> = identities(&included).into_iter().collect();
        for metric in &excluded {
            prop_assert!(!included_ids.contains(metric.identity()));
        }

        let all: HashSet<MetricIdentity> = identities(&input).into_iter().collect();
        let mut covered = included_ids.clone();
        covered.extend(identities(&excluded));
        prop_assert_eq!(covered, all);
    }

    /// Both filters preserve the relative order of their input
    #[test]
    fn filters_preserve_order(
        input in prop::collection::vec(metric_strategy(), 0..20),
        patterns in patterns_strategy(),
    ) {
        let input_ids = identities(&input);
        let included = identities(&run(Function::Include, &input, &patterns));
        let excluded = identities(&run(Function::Exclude, &input, &patterns));

        prop_assert!(is_subsequence(&included, &input_ids));
        prop_assert!(is_subsequence(&excluded, &input_ids));
    }

    /// Excluding twice with the same patterns changes nothing
    #[test]
    fn exclude_is_idempotent(
        input in prop::collection::vec(metric_strategy(), 0..20),
        patterns in patterns_strategy(),
    ) {
        let once = run(Function::Exclude, &input, &patterns);
        let twice = run(Function::Exclude, &once, &patterns);
        prop_assert_eq!(identities(&once), identities(&twice));
    }

    /// Removal keys on identity, so rebuilt instances with other payloads still match
    #[test]
    fn difference_ignores_payload(
        input in prop::collection::vec(metric_strategy(), 0..20),
        patterns in patterns_strategy(),
        shift in 1.0..1000.0f64,
    ) {
        let included = run(Function::Include, &input, &patterns);
        let rebuilt: MetricList = included
            .iter()
            .map(|m| Arc::new(m.map_values(|v| v + shift).with_datapoints([(7, shift)])))
            .collect();

        let excluded = run(Function::Exclude, &input, &patterns);
        prop_assert_eq!(identities(&difference(&input, &rebuilt)), identities(&excluded));
    }
}
