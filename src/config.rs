use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pipeline::alert::AlertKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfig {
    /// 肩-髋水平偏移的扣分比例系数
    pub alignment_scale: f64,
    /// 双肩高度差的扣分比例系数
    pub symmetry_scale: f64,
    /// 鼻尖-肩中点水平偏移的扣分比例系数
    pub stability_scale: f64,
    pub alignment_weight: f64,
    pub symmetry_weight: f64,
    pub stability_weight: f64,
    /// 关键点置信度门限；低于该值的可选关键点不参与信号提取
    pub min_visibility: f64,
    /// 耳-肩垂直间距的标称值（归一化坐标），耸肩量相对它计算
    pub nominal_ear_shoulder_gap: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            alignment_scale: 500.0,
            symmetry_scale: 600.0,
            stability_scale: 800.0,
            alignment_weight: 0.4,
            symmetry_weight: 0.3,
            stability_weight: 0.3,
            min_visibility: 0.5,
            nominal_ear_shoulder_gap: 0.18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueConfig {
    /// 样本最大留存窗（毫秒）
    pub max_window_ms: f64,
    pub high_window_ms: f64,
    pub high_score_below: f64,
    pub medium_window_ms: f64,
    pub medium_score_below: f64,
    pub low_window_ms: f64,
    pub low_score_below: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            max_window_ms: 300_000.0,
            high_window_ms: 300_000.0,
            high_score_below: 40.0,
            medium_window_ms: 180_000.0,
            medium_score_below: 50.0,
            low_window_ms: 120_000.0,
            low_score_below: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertThresholds {
    /// 头部前倾角阈值（度）
    pub forward_head_deg: f64,
    /// 驼背角阈值（度）
    pub slouch_deg: f64,
    /// 耸肩量阈值（归一化坐标）
    pub shoulder_raise: f64,
    /// 倾斜角阈值（度）
    pub tilt_deg: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            forward_head_deg: 15.0,
            slouch_deg: 12.0,
            shoulder_raise: 0.06,
            tilt_deg: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    /// 信号平滑窗（毫秒）
    pub smoothing_window_ms: f64,
    /// 越阈持续确认时长（毫秒）
    pub persistence_ms: f64,
    /// 同类告警冷却时长（毫秒）
    pub cooldown_ms: f64,
    pub thresholds: AlertThresholds,
}

impl AlertConfig {
    pub fn threshold(&self, kind: AlertKind) -> f64 {
        match kind {
            AlertKind::ForwardHead => self.thresholds.forward_head_deg,
            AlertKind::Slouch => self.thresholds.slouch_deg,
            AlertKind::ShoulderRaise => self.thresholds.shoulder_raise,
            AlertKind::Tilt => self.thresholds.tilt_deg,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            smoothing_window_ms: 1500.0,
            persistence_ms: 3000.0,
            cooldown_ms: 300_000.0,
            thresholds: AlertThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakConfig {
    /// 常规提醒冷却（毫秒）
    pub cooldown_ms: f64,
    /// 久坐提醒的时长门限（秒）
    pub sitting_interval_secs: f64,
    /// 用户暂停时长（毫秒）
    pub snooze_duration_ms: f64,
    pub trend_fast_alpha: f64,
    pub trend_slow_alpha: f64,
    /// 快慢均线差超过该幅度才判定走势（评分单位）
    pub trend_margin: f64,
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 900_000.0,
            sitting_interval_secs: 2700.0,
            snooze_duration_ms: 600_000.0,
            trend_fast_alpha: 0.2,
            trend_slow_alpha: 0.05,
            trend_margin: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    pub input_capacity: usize,
    pub output_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            input_capacity: 64,
            output_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub metrics: MetricConfig,
    pub fatigue: FatigueConfig,
    pub alerts: AlertConfig,
    pub breaks: BreakConfig,
    pub worker: WorkerConfig,
    /// 关键点不足的帧沿用上一评分喂给疲劳窗，保持时间基准连续
    pub hold_last_score: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metrics: MetricConfig::default(),
            fatigue: FatigueConfig::default(),
            alerts: AlertConfig::default(),
            breaks: BreakConfig::default(),
            worker: WorkerConfig::default(),
            hold_last_score: true,
        }
    }
}

impl EngineConfig {
    /// 部署期策略项的环境变量覆盖；其余保持编译期默认值
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.hold_last_score = env_or_bool("POSTURE_HOLD_LAST_SCORE", true);
        config.alerts.persistence_ms =
            env_or_parse("POSTURE_ALERT_PERSISTENCE_MS", config.alerts.persistence_ms);
        config.alerts.cooldown_ms =
            env_or_parse("POSTURE_ALERT_COOLDOWN_MS", config.alerts.cooldown_ms);
        config.breaks.sitting_interval_secs = env_or_parse(
            "POSTURE_BREAK_INTERVAL_SECS",
            config.breaks.sitting_interval_secs,
        );
        config.worker.input_capacity =
            env_or_parse("POSTURE_WORKER_INPUT_CAPACITY", config.worker.input_capacity);
        config.worker.output_capacity = env_or_parse(
            "POSTURE_WORKER_OUTPUT_CAPACITY",
            config.worker.output_capacity,
        );
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        let m = &self.metrics;
        if m.alignment_scale <= 0.0 || m.symmetry_scale <= 0.0 || m.stability_scale <= 0.0 {
            return Err("metrics scales must be > 0".to_string());
        }
        for (name, weight) in [
            ("metrics.alignment_weight", m.alignment_weight),
            ("metrics.symmetry_weight", m.symmetry_weight),
            ("metrics.stability_weight", m.stability_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!("{name} must be in [0,1]"));
            }
        }
        let weight_sum = m.alignment_weight + m.symmetry_weight + m.stability_weight;
        if (weight_sum - 1.0).abs() > 0.01 {
            return Err(format!(
                "metrics weights should sum to ~1.0 (got {weight_sum:.3})"
            ));
        }
        if !(0.0..=1.0).contains(&m.min_visibility) {
            return Err("metrics.min_visibility must be in [0,1]".to_string());
        }
        if m.nominal_ear_shoulder_gap <= 0.0 {
            return Err("metrics.nominal_ear_shoulder_gap must be > 0".to_string());
        }

        let f = &self.fatigue;
        if f.max_window_ms <= 0.0 {
            return Err("fatigue.max_window_ms must be > 0".to_string());
        }
        if !(f.low_window_ms < f.medium_window_ms && f.medium_window_ms < f.high_window_ms) {
            return Err("fatigue windows must be strictly nested: low < medium < high".to_string());
        }
        if f.high_window_ms > f.max_window_ms {
            return Err("fatigue.high_window_ms must be <= max_window_ms".to_string());
        }
        if !(f.high_score_below < f.medium_score_below
            && f.medium_score_below < f.low_score_below)
        {
            return Err(
                "fatigue score thresholds must tighten with severity: high < medium < low"
                    .to_string(),
            );
        }
        for (name, threshold) in [
            ("fatigue.high_score_below", f.high_score_below),
            ("fatigue.medium_score_below", f.medium_score_below),
            ("fatigue.low_score_below", f.low_score_below),
        ] {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(format!("{name} must be in [0,100]"));
            }
        }

        let a = &self.alerts;
        if a.smoothing_window_ms <= 0.0 {
            return Err("alerts.smoothing_window_ms must be > 0".to_string());
        }
        if a.persistence_ms <= 0.0 {
            return Err("alerts.persistence_ms must be > 0".to_string());
        }
        if a.cooldown_ms < a.persistence_ms {
            return Err("alerts.cooldown_ms must be >= persistence_ms".to_string());
        }
        if a.thresholds.forward_head_deg <= 0.0
            || a.thresholds.slouch_deg <= 0.0
            || a.thresholds.tilt_deg <= 0.0
            || a.thresholds.shoulder_raise < 0.0
        {
            return Err("alert thresholds must be positive".to_string());
        }

        let b = &self.breaks;
        if b.cooldown_ms <= 0.0 || b.sitting_interval_secs <= 0.0 || b.snooze_duration_ms <= 0.0 {
            return Err("break durations must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&b.trend_fast_alpha) || !(0.0..=1.0).contains(&b.trend_slow_alpha)
        {
            return Err("break trend alphas must be in [0,1]".to_string());
        }
        if b.trend_margin < 0.0 {
            return Err("breaks.trend_margin must be >= 0".to_string());
        }

        if self.worker.input_capacity == 0 || self.worker.output_capacity == 0 {
            return Err("worker channel capacities must be >= 1".to_string());
        }

        Ok(())
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Failed to parse env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => {
                tracing::warn!(key, value = %raw, "Failed to parse env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}
