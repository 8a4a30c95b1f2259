use proptest::prelude::*;

use posture_engine::config::{EngineConfig, FatigueConfig, MetricConfig};
use posture_engine::pipeline::fatigue::FatigueTracker;
use posture_engine::pipeline::landmark::{
    angle_deg, PoseLandmark, LEFT_HIP, LEFT_SHOULDER, NOSE, RIGHT_HIP, RIGHT_SHOULDER,
};
use posture_engine::pipeline::metrics::compute_metrics;
use posture_engine::pipeline::risk::{classify_alert_risk, classify_risk};

fn build_landmarks(
    nose: (f64, f64),
    left_shoulder: (f64, f64),
    right_shoulder: (f64, f64),
    left_hip: (f64, f64),
    right_hip: (f64, f64),
) -> Vec<PoseLandmark> {
    let mut landmarks = vec![PoseLandmark::new(0.0, 0.0, 0.0); 25];
    landmarks[NOSE] = PoseLandmark::new(nose.0, nose.1, 0.0);
    landmarks[LEFT_SHOULDER] = PoseLandmark::new(left_shoulder.0, left_shoulder.1, 0.0);
    landmarks[RIGHT_SHOULDER] = PoseLandmark::new(right_shoulder.0, right_shoulder.1, 0.0);
    landmarks[LEFT_HIP] = PoseLandmark::new(left_hip.0, left_hip.1, 0.0);
    landmarks[RIGHT_HIP] = PoseLandmark::new(right_hip.0, right_hip.1, 0.0);
    landmarks
}

proptest! {
    #[test]
    fn pt_metrics_bounded_and_weighted(
        nose_x in 0.0_f64..1.0, nose_y in 0.0_f64..1.0,
        ls_x in 0.0_f64..1.0, ls_y in 0.0_f64..1.0,
        rs_x in 0.0_f64..1.0, rs_y in 0.0_f64..1.0,
        lh_x in 0.0_f64..1.0, lh_y in 0.0_f64..1.0,
        rh_x in 0.0_f64..1.0, rh_y in 0.0_f64..1.0,
    ) {
        let landmarks = build_landmarks(
            (nose_x, nose_y),
            (ls_x, ls_y),
            (rs_x, rs_y),
            (lh_x, lh_y),
            (rh_x, rh_y),
        );
        let m = compute_metrics(&landmarks, &MetricConfig::default()).unwrap();

        prop_assert!((0.0..=100.0).contains(&m.alignment));
        prop_assert!((0.0..=100.0).contains(&m.symmetry));
        prop_assert!((0.0..=100.0).contains(&m.stability));
        prop_assert!((0.0..=100.0).contains(&m.score));

        let expected = m.alignment * 0.4 + m.symmetry * 0.3 + m.stability * 0.3;
        prop_assert!((m.score - expected).abs() < 0.02);
    }

    #[test]
    fn pt_angle_stays_in_half_turn(
        ax in -1.0_f64..1.0, ay in -1.0_f64..1.0,
        bx in -1.0_f64..1.0, by in -1.0_f64..1.0,
        cx in -1.0_f64..1.0, cy in -1.0_f64..1.0,
    ) {
        let angle = angle_deg((ax, ay), (bx, by), (cx, cy));
        prop_assert!((0.0..=180.0).contains(&angle));
    }

    #[test]
    fn pt_risk_monotonic_in_score(s1 in 0.0_f64..100.0, s2 in 0.0_f64..100.0) {
        let (lower, higher) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
        prop_assert!(
            classify_risk(lower).severity() >= classify_risk(higher).severity()
        );
    }

    #[test]
    fn pt_risk_idempotent(score in proptest::num::f64::ANY) {
        prop_assert_eq!(classify_risk(score), classify_risk(score));
    }

    #[test]
    fn pt_alert_risk_pressure_never_lowers_severity(
        score in 0.0_f64..100.0,
        fatigue_minutes in 0.0_f64..120.0,
        slouch in 0_u32..20,
        forward in 0_u32..20,
    ) {
        let calm = classify_alert_risk(score, 0.0, 0, 0);
        let pressured = classify_alert_risk(score, fatigue_minutes, slouch, forward);
        prop_assert!(pressured.severity() >= calm.severity());
    }

    #[test]
    fn pt_fatigue_buffer_span_is_bounded(
        scores in proptest::collection::vec(0.0_f64..100.0, 1..600),
        step_ms in 200.0_f64..2000.0,
    ) {
        let mut tracker = FatigueTracker::new(FatigueConfig::default());
        let mut now = 0.0;
        for score in scores {
            tracker.push(score, now);
            now += step_ms;
        }
        prop_assert!(tracker.span_ms() <= FatigueConfig::default().max_window_ms);
    }

    #[test]
    fn pt_default_config_survives_roundtrip(extra in 0.0_f64..0.0001) {
        // serde 往返后仍通过校验；extra 仅用于驱动多组运行
        let mut cfg = EngineConfig::default();
        cfg.breaks.trend_margin += extra;
        let encoded = serde_json::to_string(&cfg).unwrap();
        let decoded: EngineConfig = serde_json::from_str(&encoded).unwrap();
        prop_assert!(decoded.validate().is_ok());
    }
}
