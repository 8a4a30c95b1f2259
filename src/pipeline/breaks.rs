//! 休息提醒模块
//!
//! 无状态决策函数 + 最小可变状态（上次提醒时间、暂停截止时间）。
//! 规则优先级（每次调用至多返回一条提醒）：
//! 1. 暂停生效期内静默一切提醒
//! 2. 高疲劳：紧急提醒，绕过常规冷却
//! 3. 常规冷却门（15 分钟）
//! 4. 久坐时长（45 分钟）→ 起身提醒
//! 5. 评分持续下滑 → 拉伸提醒

use serde::{Deserialize, Serialize};

use crate::config::BreakConfig;
use crate::pipeline::fatigue::FatigueLevel;

/// 评分走势，由调用方基于近期评分估计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTrend {
    Improving,
    Steady,
    Declining,
}

/// 提醒触发原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakReason {
    FatigueHigh,
    ElapsedTime,
    DecliningScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakUrgency {
    Normal,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakReminder {
    pub reason: BreakReason,
    pub urgency: BreakUrgency,
    pub message: String,
}

/// 提醒状态，生命周期由调用方掌控（通常随会话创建/丢弃）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakState {
    pub last_reminder_at: Option<f64>,
    pub snoozed_until: Option<f64>,
}

/// 单次评估的输入快照
#[derive(Debug, Clone, Copy)]
pub struct BreakInput {
    pub elapsed_secs: f64,
    pub fatigue_level: FatigueLevel,
    pub score_trend: ScoreTrend,
    pub now_ms: f64,
}

fn reminder(reason: BreakReason, urgency: BreakUrgency, message: &str) -> BreakReminder {
    BreakReminder {
        reason,
        urgency,
        message: message.to_string(),
    }
}

/// 评估是否需要提醒休息
///
/// 高疲劳绕过冷却门：只要疲劳为 High 且未被暂停，每次评估都会给出
/// 紧急提醒，直到用户暂停或疲劳回落。其余规则受 15 分钟冷却约束。
pub fn evaluate_break(
    input: &BreakInput,
    state: &mut BreakState,
    config: &BreakConfig,
) -> Option<BreakReminder> {
    if let Some(until) = state.snoozed_until {
        if input.now_ms < until {
            return None;
        }
    }

    if input.fatigue_level == FatigueLevel::High {
        state.last_reminder_at = Some(input.now_ms);
        return Some(reminder(
            BreakReason::FatigueHigh,
            BreakUrgency::Urgent,
            "疲劳程度较高，请立即起身走动片刻",
        ));
    }

    if let Some(last) = state.last_reminder_at {
        if input.now_ms - last < config.cooldown_ms {
            return None;
        }
    }

    if input.elapsed_secs >= config.sitting_interval_secs {
        state.last_reminder_at = Some(input.now_ms);
        return Some(reminder(
            BreakReason::ElapsedTime,
            BreakUrgency::Normal,
            "久坐时间较长，建议站起来活动一下",
        ));
    }

    if input.score_trend == ScoreTrend::Declining {
        state.last_reminder_at = Some(input.now_ms);
        return Some(reminder(
            BreakReason::DecliningScore,
            BreakUrgency::Normal,
            "姿态评分持续下滑，做组拉伸放松一下",
        ));
    }

    None
}

/// 用户主动暂停提醒；暂停期内评估一律返回 None
pub fn apply_snooze(state: &mut BreakState, now_ms: f64, config: &BreakConfig) {
    state.snoozed_until = Some(now_ms + config.snooze_duration_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(
        elapsed_secs: f64,
        fatigue_level: FatigueLevel,
        score_trend: ScoreTrend,
        now_ms: f64,
    ) -> BreakInput {
        BreakInput {
            elapsed_secs,
            fatigue_level,
            score_trend,
            now_ms,
        }
    }

    #[test]
    fn snooze_silences_everything() {
        let config = BreakConfig::default();
        let mut state = BreakState::default();
        apply_snooze(&mut state, 0.0, &config);

        // 暂停期内即使高疲劳 + 久坐 + 下滑也不提醒
        let worst = input(10_000.0, FatigueLevel::High, ScoreTrend::Declining, 1000.0);
        assert!(evaluate_break(&worst, &mut state, &config).is_none());

        // 暂停到期后规则恢复
        let after = input(
            10_000.0,
            FatigueLevel::High,
            ScoreTrend::Declining,
            config.snooze_duration_ms + 1.0,
        );
        let fired = evaluate_break(&after, &mut state, &config).unwrap();
        assert_eq!(fired.reason, BreakReason::FatigueHigh);
    }

    #[test]
    fn high_fatigue_bypasses_cooldown() {
        let config = BreakConfig::default();
        let mut state = BreakState {
            last_reminder_at: Some(0.0),
            snoozed_until: None,
        };

        // 冷却期内，常规规则静默
        let normal = input(10_000.0, FatigueLevel::Medium, ScoreTrend::Declining, 60_000.0);
        assert!(evaluate_break(&normal, &mut state, &config).is_none());

        // 高疲劳无视冷却
        let urgent = input(10_000.0, FatigueLevel::High, ScoreTrend::Steady, 60_000.0);
        let fired = evaluate_break(&urgent, &mut state, &config).unwrap();
        assert_eq!(fired.urgency, BreakUrgency::Urgent);
        assert_eq!(state.last_reminder_at, Some(60_000.0));
    }

    #[test]
    fn elapsed_time_beats_declining_trend() {
        let config = BreakConfig::default();
        let mut state = BreakState::default();

        let both = input(
            config.sitting_interval_secs + 1.0,
            FatigueLevel::Low,
            ScoreTrend::Declining,
            1_000_000.0,
        );
        let fired = evaluate_break(&both, &mut state, &config).unwrap();
        assert_eq!(fired.reason, BreakReason::ElapsedTime);
        assert_eq!(fired.urgency, BreakUrgency::Normal);
    }

    #[test]
    fn declining_trend_fires_stretch() {
        let config = BreakConfig::default();
        let mut state = BreakState::default();

        let declining = input(600.0, FatigueLevel::None, ScoreTrend::Declining, 500_000.0);
        let fired = evaluate_break(&declining, &mut state, &config).unwrap();
        assert_eq!(fired.reason, BreakReason::DecliningScore);

        // 紧随其后的第二次评估落入冷却
        let again = input(601.0, FatigueLevel::None, ScoreTrend::Declining, 501_000.0);
        assert!(evaluate_break(&again, &mut state, &config).is_none());
    }

    #[test]
    fn steady_posture_needs_no_reminder() {
        let config = BreakConfig::default();
        let mut state = BreakState::default();

        let quiet = input(600.0, FatigueLevel::None, ScoreTrend::Steady, 500_000.0);
        assert!(evaluate_break(&quiet, &mut state, &config).is_none());
        assert_eq!(state.last_reminder_at, None);
    }
}
