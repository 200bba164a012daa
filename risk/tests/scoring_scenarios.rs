use risk::{AnomalyFlag, PoolMetrics, assess, detect_anomalies, normalize, score};

fn placeholder_pool() -> PoolMetrics {
    PoolMetrics {
        volume_usd: 500_000.0,
        tvl_usd: 1_000_000.0,
        price_impact: 0.02,
        swap_count: 500,
        failed_tx_count: 5,
        gas_used: 1_000_000,
    }
}

fn stressed_pool() -> PoolMetrics {
    PoolMetrics {
        volume_usd: 2_000_000.0,
        tvl_usd: 50_000.0,
        price_impact: 0.1,
        swap_count: 2_000,
        failed_tx_count: 200,
        gas_used: 0,
    }
}

#[test]
fn placeholder_pool_breakdown() {
    let n = normalize(&placeholder_pool());
    let expected = [0.5, 0.0, 0.4, 0.5, 0.2];
    let got = [n.volume, n.tvl, n.price_impact, n.swap_count, n.failure_rate];

    for (g, e) in got.iter().zip(expected) {
        assert!((g - e).abs() < 1e-9, "got {g}, expected {e}");
    }
    assert!((n.weighted_sum() - 0.33).abs() < 1e-9);

    assert_eq!(score(&placeholder_pool()).value(), 33);
    assert!(detect_anomalies(&placeholder_pool()).is_empty());
}

#[test]
fn stressed_pool_trips_everything() {
    let a = assess(&stressed_pool());

    assert!((a.normalized.tvl - 0.5).abs() < 1e-9);
    assert!((a.normalized.weighted_sum() - 0.90).abs() < 1e-9);
    assert_eq!(a.score.value(), 90);
    assert_eq!(
        a.anomalies,
        vec![
            AnomalyFlag::HighVolume,
            AnomalyFlag::LowTvl,
            AnomalyFlag::HighPriceImpact,
            AnomalyFlag::HighSwapCount,
            AnomalyFlag::HighFailureRate,
        ]
    );
}

#[test]
fn zero_swaps_has_a_defined_score() {
    let m = PoolMetrics {
        volume_usd: 600_000.0,
        price_impact: 0.0,
        swap_count: 0,
        failed_tx_count: 0,
        ..placeholder_pool()
    };

    // only volume contributes: 0.6 * 0.25 = 0.15
    assert_eq!(score(&m).value(), 15);
    assert!(detect_anomalies(&m).is_empty());
}

#[test]
fn assessment_serializes_flags_by_name() {
    let json = serde_json::to_value(assess(&stressed_pool())).unwrap();

    assert_eq!(json["score"], 90);
    assert_eq!(json["anomalies"][1], "LOW_TVL");
}
