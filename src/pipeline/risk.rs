//! 姿态风险分级模块
//!
//! 两套并存的分级标尺，阈值刻意不合并：
//! - `RiskLevel`: 主 4 级标尺，直接作用于综合评分
//! - `AlertRisk`: 告警卡片使用的 5 级标尺，在评分分档之上叠加疲劳时长与事件计数
//!
//! 两者都是纯组合逻辑：相同输入必得相同输出，评分越低严重度不降。
//! 所有时间平滑由疲劳状态机与告警管理器负责。

use serde::{Deserialize, Serialize};

/// 主风险等级（4 级）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskLevel {
    /// 严重度序数，用于单调性比较
    pub fn severity(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Moderate => 1,
            Self::High => 2,
            Self::Severe => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Severe => "Severe",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#22c55e",
            Self::Moderate => "#eab308",
            Self::High => "#f97316",
            Self::Severe => "#ef4444",
        }
    }
}

/// 告警卡片风险等级（5 级，含 Critical）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertRisk {
    Low,
    Moderate,
    High,
    Severe,
    Critical,
}

impl AlertRisk {
    pub fn severity(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Moderate => 1,
            Self::High => 2,
            Self::Severe => 3,
            Self::Critical => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Severe => "Severe",
            Self::Critical => "Critical",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#22c55e",
            Self::Moderate => "#eab308",
            Self::High => "#f97316",
            Self::Severe => "#ef4444",
            Self::Critical => "#991b1b",
        }
    }

    fn escalate(self) -> Self {
        match self {
            Self::Low => Self::Moderate,
            Self::Moderate => Self::High,
            Self::High => Self::Severe,
            Self::Severe | Self::Critical => Self::Critical,
        }
    }
}

/// 非有限评分按最坏情况记 0，其余裁剪到 [0,100]
fn normalize_score(avg_score: f64) -> f64 {
    if avg_score.is_finite() {
        avg_score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// 主分级：评分 > 85 → Low；≥ 70 → Moderate；≥ 50 → High；其余 Severe
pub fn classify_risk(avg_score: f64) -> RiskLevel {
    let score = normalize_score(avg_score);
    if score > 85.0 {
        RiskLevel::Low
    } else if score >= 70.0 {
        RiskLevel::Moderate
    } else if score >= 50.0 {
        RiskLevel::High
    } else {
        RiskLevel::Severe
    }
}

/// 告警卡片分级
///
/// 先按评分分为 5 档（新增 ≥30 的 Severe 档与更低的 Critical 档），
/// 再根据累计疲劳时长与驼背/前倾事件计数上调一档。
pub fn classify_alert_risk(
    avg_score: f64,
    fatigue_minutes: f64,
    slouch_events: u32,
    head_forward_events: u32,
) -> AlertRisk {
    let score = normalize_score(avg_score);
    let base = if score > 85.0 {
        AlertRisk::Low
    } else if score >= 70.0 {
        AlertRisk::Moderate
    } else if score >= 50.0 {
        AlertRisk::High
    } else if score >= 30.0 {
        AlertRisk::Severe
    } else {
        AlertRisk::Critical
    };

    let fatigue_minutes = if fatigue_minutes.is_finite() {
        fatigue_minutes.max(0.0)
    } else {
        0.0
    };
    let pressure =
        fatigue_minutes >= 20.0 || slouch_events.saturating_add(head_forward_events) >= 8;

    if pressure {
        base.escalate()
    } else {
        base
    }
}
