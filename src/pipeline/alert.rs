//! 姿态告警管理模块
//!
//! 将四路连续偏差信号转换为离散、限频的告警事件。
//! 两阶段防抖：
//! 1. 持续确认：平滑均值越过阈值后需持续 3 秒才确认，单帧尖峰不触发
//! 2. 冷却抑制：同类告警 5 分钟内不重复触发，持续性问题不反复打扰
//!
//! 平滑均值取 1.5 秒滚动窗内的逐信号平均，抑制单帧抖动。

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AlertConfig;
use crate::pipeline::landmark::round2;
use crate::pipeline::metrics::PostureSample;

/// 告警类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ForwardHead,
    Slouch,
    ShoulderRaise,
    Tilt,
}

impl AlertKind {
    /// 固定评估顺序，先命中者胜出
    pub const ORDER: [AlertKind; 4] = [
        AlertKind::ForwardHead,
        AlertKind::Slouch,
        AlertKind::ShoulderRaise,
        AlertKind::Tilt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ForwardHead => "forward_head",
            Self::Slouch => "slouch",
            Self::ShoulderRaise => "shoulder_raise",
            Self::Tilt => "tilt",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::ForwardHead => "头部前倾明显，请收下巴、让耳朵对齐肩膀",
            Self::Slouch => "出现驼背趋势，请挺直背部",
            Self::ShoulderRaise => "肩膀持续耸起，试着放松双肩",
            Self::Tilt => "身体向一侧倾斜，请调正坐姿",
        }
    }

    fn signal(self, sample: &PostureSample) -> f64 {
        match self {
            Self::ForwardHead => sample.forward_head,
            Self::Slouch => sample.slouch,
            Self::ShoulderRaise => sample.shoulder_raise,
            Self::Tilt => sample.tilt,
        }
    }
}

/// 已确认并放行的告警事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureAlert {
    pub id: Uuid,
    pub kind: AlertKind,
    /// 触发时的平滑均值
    pub value: f64,
    pub triggered_at: f64,
    pub message: String,
}

/// 告警管理器
///
/// 持有滚动样本缓冲与逐类型的 first_detected / last_alert 时间戳，
/// 两张表只由本组件读写。
pub struct AlertManager {
    config: AlertConfig,
    samples: VecDeque<PostureSample>,
    first_detected: HashMap<AlertKind, f64>,
    last_alert: HashMap<AlertKind, f64>,
}

impl AlertManager {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            samples: VecDeque::with_capacity(64),
            first_detected: HashMap::new(),
            last_alert: HashMap::new(),
        }
    }

    /// 接收一帧偏差样本并评估
    ///
    /// 每次调用至多返回一条告警；按固定类型顺序评估，先命中者返回。
    pub fn update(&mut self, sample: PostureSample) -> Option<PostureAlert> {
        let now = sample.ts;

        self.samples.push_back(sample);
        let cutoff = now - self.config.smoothing_window_ms;
        while let Some(front) = self.samples.front() {
            if front.ts < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        for kind in AlertKind::ORDER {
            let avg = self.smoothed(kind);
            if avg < self.config.threshold(kind) {
                // 低于阈值：清除持续跟踪，重新计时
                self.first_detected.remove(&kind);
                continue;
            }

            let first = *self.first_detected.entry(kind).or_insert(now);
            if now - first < self.config.persistence_ms {
                continue;
            }

            if let Some(last) = self.last_alert.get(&kind) {
                if now - last < self.config.cooldown_ms {
                    continue;
                }
            }

            self.last_alert.insert(kind, now);
            self.first_detected.insert(kind, now);

            tracing::info!(kind = kind.as_str(), value = avg, "Posture alert fired");
            return Some(PostureAlert {
                id: Uuid::new_v4(),
                kind,
                value: round2(avg),
                triggered_at: now,
                message: kind.message().to_string(),
            });
        }

        None
    }

    /// 清空缓冲与全部计时状态，幂等
    pub fn reset(&mut self) {
        self.samples.clear();
        self.first_detected.clear();
        self.last_alert.clear();
    }

    /// 滚动窗内该信号的平均值
    fn smoothed(&self, kind: AlertKind) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| kind.signal(s)).sum();
        sum / self.samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AlertManager {
        AlertManager::new(AlertConfig::default())
    }

    fn sample(ts: f64, forward_head: f64) -> PostureSample {
        PostureSample {
            ts,
            forward_head,
            slouch: 0.0,
            shoulder_raise: 0.0,
            tilt: 0.0,
        }
    }

    #[test]
    fn single_frame_spike_does_not_fire() {
        let mut m = manager();
        assert!(m.update(sample(0.0, 60.0)).is_none());
        // 回落后持续跟踪被清除
        assert!(m.update(sample(100.0, 0.0)).is_none());
        assert!(m.first_detected.is_empty());
    }

    #[test]
    fn alert_fires_after_persistence() {
        let mut m = manager();
        let mut fired = Vec::new();
        for i in 0..40 {
            let ts = i as f64 * 100.0;
            if let Some(alert) = m.update(sample(ts, 30.0)) {
                fired.push(alert);
            }
        }

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, AlertKind::ForwardHead);
        assert!(fired[0].triggered_at >= 3000.0);
        assert!(!fired[0].message.is_empty());
    }

    #[test]
    fn cooldown_suppresses_refire() {
        let mut m = manager();
        let mut count = 0;
        // 持续越阈 4 分钟（冷却为 5 分钟），只应触发一次
        for i in 0..=2400 {
            let ts = i as f64 * 100.0;
            if m.update(sample(ts, 30.0)).is_some() {
                count += 1;
            }
        }
        assert_eq!(count, 1);
    }

    #[test]
    fn refires_after_cooldown_elapses() {
        let mut m = manager();
        let mut fired_at = Vec::new();
        // 持续越阈 6 分钟，冷却过后恰好再触发一次
        for i in 0..=3600 {
            let ts = i as f64 * 100.0;
            if let Some(alert) = m.update(sample(ts, 30.0)) {
                fired_at.push(alert.triggered_at);
            }
        }
        assert_eq!(fired_at.len(), 2);
        assert!(fired_at[1] - fired_at[0] >= AlertConfig::default().cooldown_ms);
    }

    #[test]
    fn dip_below_threshold_restarts_persistence() {
        let mut m = manager();
        // 2 秒越阈后回落，清空平滑窗
        for i in 0..20 {
            assert!(m.update(sample(i as f64 * 100.0, 30.0)).is_none());
        }
        for i in 0..20 {
            assert!(m.update(sample(2000.0 + i as f64 * 100.0, 0.0)).is_none());
        }
        // 再次越阈需要重新满足持续时长
        for i in 0..20 {
            assert!(m.update(sample(4000.0 + i as f64 * 100.0, 30.0)).is_none());
        }
        let alert = m.update(sample(7800.0, 30.0));
        assert!(alert.is_some());
    }

    #[test]
    fn first_qualifying_kind_wins() {
        let mut m = manager();
        let both = |ts: f64| PostureSample {
            ts,
            forward_head: 30.0,
            slouch: 30.0,
            shoulder_raise: 0.0,
            tilt: 0.0,
        };
        let mut fired = Vec::new();
        for i in 0..=30 {
            if let Some(alert) = m.update(both(i as f64 * 100.0)) {
                fired.push(alert);
            }
        }
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, AlertKind::ForwardHead);
    }

    #[test]
    fn reset_clears_timers() {
        let mut m = manager();
        for i in 0..40 {
            m.update(sample(i as f64 * 100.0, 30.0));
        }
        m.reset();
        m.reset();
        assert!(m.samples.is_empty());
        assert!(m.first_detected.is_empty());
        assert!(m.last_alert.is_empty());
    }
}
