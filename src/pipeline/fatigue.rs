//! 疲劳状态机模块
//!
//! 基于三个嵌套时间窗对综合评分做持续性低分判定：
//! - 2 分钟窗（low）: 窗内均分 < 60
//! - 3 分钟窗（medium）: 窗内均分 < 50
//! - 5 分钟窗（high）: 窗内均分 < 40
//!
//! 判定顺序从最严重的窗开始，先命中者生效。
//! 覆盖时长按"当前时刻 − 最旧留存样本时间戳"计算，会话刚开始、
//! 真实样本尚未积累够窗长时不会误报疲劳。
//! 每次写入样本前先裁剪最大窗（5 分钟）以外的旧样本，内存有界。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::FatigueConfig;
use crate::pipeline::landmark::{round2, sanitize};

/// 疲劳评分样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueSample {
    pub score: f64,
    /// 采样时间戳（毫秒）
    pub at: f64,
}

/// 疲劳等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    None,
    Low,
    Medium,
    High,
}

impl FatigueLevel {
    /// 等级对应的建议动作，调用方据此决定是否弹出 UI / 通知
    pub fn action(self) -> FatigueAction {
        match self {
            Self::None => FatigueAction::None,
            Self::Low => FatigueAction::Suggestion,
            Self::Medium => FatigueAction::Warning,
            Self::High => FatigueAction::BreakAlert,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Low => "姿态评分持续偏低，建议调整坐姿",
            Self::Medium => "疲劳迹象明显，建议活动肩颈",
            Self::High => "已持续疲劳超过 5 分钟，请起身休息",
        }
    }
}

/// 疲劳建议动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueAction {
    None,
    Suggestion,
    Warning,
    BreakAlert,
}

/// 疲劳评估结果，每次调用从当前样本集完整重算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueState {
    pub level: FatigueLevel,
    /// 覆盖时长（毫秒）
    pub duration_ms: f64,
    pub avg_score: f64,
    pub action: FatigueAction,
    pub message: String,
}

impl FatigueState {
    fn idle() -> Self {
        Self {
            level: FatigueLevel::None,
            duration_ms: 0.0,
            avg_score: 0.0,
            action: FatigueAction::None,
            message: String::new(),
        }
    }
}

/// 疲劳追踪器
///
/// 除样本缓冲外无隐藏状态：`evaluate` 是 (now, samples) 的纯函数，
/// 注入时间戳即可独立测试，无需 mock 时钟。
pub struct FatigueTracker {
    config: FatigueConfig,
    samples: VecDeque<FatigueSample>,
}

impl FatigueTracker {
    pub fn new(config: FatigueConfig) -> Self {
        Self {
            config,
            samples: VecDeque::with_capacity(512),
        }
    }

    /// 记录一帧评分样本
    ///
    /// 先裁剪最大窗以外的旧样本再追加，保证留存样本跨度不超过最大窗。
    /// 时间戳早于最新样本视为输入契约违规，丢弃并告警。
    pub fn push(&mut self, score: f64, now_ms: f64) {
        if let Some(newest) = self.samples.back() {
            if now_ms < newest.at {
                tracing::warn!(
                    timestamp = now_ms,
                    newest = newest.at,
                    "Out-of-order fatigue sample dropped"
                );
                return;
            }
        }

        let cutoff = now_ms - self.config.max_window_ms;
        while let Some(front) = self.samples.front() {
            if front.at < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        self.samples.push_back(FatigueSample {
            score: sanitize(score).clamp(0.0, 100.0),
            at: now_ms,
        });
    }

    /// 按嵌套窗评估当前疲劳状态；不修改样本
    pub fn evaluate(&self, now_ms: f64) -> FatigueState {
        let Some(oldest) = self.samples.front() else {
            return FatigueState::idle();
        };
        let coverage = (now_ms - oldest.at).max(0.0);

        let tiers = [
            (
                self.config.high_window_ms,
                self.config.high_score_below,
                FatigueLevel::High,
            ),
            (
                self.config.medium_window_ms,
                self.config.medium_score_below,
                FatigueLevel::Medium,
            ),
            (
                self.config.low_window_ms,
                self.config.low_score_below,
                FatigueLevel::Low,
            ),
        ];

        for (window_ms, score_below, level) in tiers {
            if coverage < window_ms {
                continue;
            }
            let Some(avg) = self.window_average(now_ms, window_ms) else {
                continue;
            };
            if avg < score_below {
                return FatigueState {
                    level,
                    duration_ms: coverage,
                    avg_score: round2(avg),
                    action: level.action(),
                    message: level.message().to_string(),
                };
            }
        }

        let avg = self
            .window_average(now_ms, self.config.low_window_ms)
            .unwrap_or(0.0);
        FatigueState {
            level: FatigueLevel::None,
            duration_ms: coverage,
            avg_score: round2(avg),
            action: FatigueAction::None,
            message: String::new(),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// 留存样本的时间跨度（毫秒）
    pub fn span_ms(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(front), Some(back)) => back.at - front.at,
            _ => 0.0,
        }
    }

    /// 清空样本缓冲，幂等
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// 窗内均分；窗内无样本时返回 None（该档无法判定）
    fn window_average(&self, now_ms: f64, window_ms: f64) -> Option<f64> {
        let cutoff = now_ms - window_ms;
        let mut sum = 0.0;
        let mut count = 0u32;
        for sample in self.samples.iter().rev() {
            if sample.at < cutoff {
                break;
            }
            sum += sample.score;
            count += 1;
        }
        if count == 0 {
            None
        } else {
            Some(sum / f64::from(count))
        }
    }
}
