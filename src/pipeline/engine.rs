use serde::{Deserialize, Serialize};

use crate::config::{BreakConfig, EngineConfig};
use crate::pipeline::alert::{AlertManager, PostureAlert};
use crate::pipeline::breaks::{self, BreakInput, BreakReminder, BreakState, ScoreTrend};
use crate::pipeline::fatigue::{FatigueState, FatigueTracker};
use crate::pipeline::landmark::LandmarkFrame;
use crate::pipeline::metrics::{self, PostureMetrics};
use crate::pipeline::risk::{classify_risk, RiskLevel};

/// Per-frame output handed back to the UI / session-recording collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameResult {
    pub timestamp: f64,
    /// None when required landmarks were missing this frame
    pub metrics: Option<PostureMetrics>,
    pub risk: Option<RiskLevel>,
    pub fatigue: FatigueState,
    pub alert: Option<PostureAlert>,
    pub break_reminder: Option<BreakReminder>,
    /// True when the frame violated the monotonic-timestamp contract and was dropped
    pub skipped: bool,
}

/// Session counters reported to the collaborator at session end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub frames_out_of_order: u64,
    pub alerts_fired: u64,
    pub session_started_at: Option<f64>,
}

/// EMA pair used to estimate the short-term score trend for break reminders.
#[derive(Debug, Clone, Copy, Default)]
struct TrendEstimator {
    fast: Option<f64>,
    slow: Option<f64>,
}

impl TrendEstimator {
    fn update(&mut self, score: f64, config: &BreakConfig) {
        let fast = self.fast.get_or_insert(score);
        *fast += (score - *fast) * config.trend_fast_alpha;
        let slow = self.slow.get_or_insert(score);
        *slow += (score - *slow) * config.trend_slow_alpha;
    }

    fn trend(&self, margin: f64) -> ScoreTrend {
        match (self.fast, self.slow) {
            (Some(fast), Some(slow)) if fast < slow - margin => ScoreTrend::Declining,
            (Some(fast), Some(slow)) if fast > slow + margin => ScoreTrend::Improving,
            _ => ScoreTrend::Steady,
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Composition root: runs the full per-frame pipeline synchronously.
///
/// One instance per session; never shared across frame-processing contexts.
/// All accumulated state lives in explicit members and is cleared by `reset`.
pub struct PostureEngine {
    config: EngineConfig,
    fatigue: FatigueTracker,
    alerts: AlertManager,
    break_state: BreakState,
    trend: TrendEstimator,
    last_score: Option<f64>,
    last_ts: Option<f64>,
    stats: SessionStats,
}

impl PostureEngine {
    pub fn new(config: EngineConfig) -> Self {
        let fatigue = FatigueTracker::new(config.fatigue.clone());
        let alerts = AlertManager::new(config.alerts.clone());
        Self {
            config,
            fatigue,
            alerts,
            break_state: BreakState::default(),
            trend: TrendEstimator::default(),
            last_score: None,
            last_ts: None,
            stats: SessionStats::default(),
        }
    }

    /// Process one frame: metrics → risk, plus fatigue, alert and break
    /// evaluation. Synchronous, CPU-only, no I/O.
    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> FrameResult {
        let now = frame.timestamp;

        // Windowed components assume monotonic time; late frames are dropped.
        if let Some(last) = self.last_ts {
            if now < last {
                self.stats.frames_out_of_order += 1;
                tracing::warn!(timestamp = now, last, "Out-of-order frame dropped");
                return FrameResult {
                    timestamp: now,
                    metrics: None,
                    risk: None,
                    fatigue: self.fatigue.evaluate(last),
                    alert: None,
                    break_reminder: None,
                    skipped: true,
                };
            }
        }
        self.last_ts = Some(now);
        if self.stats.session_started_at.is_none() {
            self.stats.session_started_at = Some(now);
        }

        let metrics = metrics::compute_metrics(&frame.landmarks, &self.config.metrics);
        let risk = metrics.map(|m| classify_risk(m.score));

        match metrics {
            Some(m) => {
                self.last_score = Some(m.score);
                self.fatigue.push(m.score, now);
                self.trend.update(m.score, &self.config.breaks);
                self.stats.frames_processed += 1;
            }
            None => {
                self.stats.frames_skipped += 1;
                // Keep the windowed components' time base alive across
                // insufficient frames by holding the last known score over.
                if self.config.hold_last_score {
                    if let Some(score) = self.last_score {
                        self.fatigue.push(score, now);
                    }
                }
            }
        }

        let alert = metrics::extract_sample(&frame.landmarks, now, &self.config.metrics)
            .and_then(|sample| self.alerts.update(sample));
        if alert.is_some() {
            self.stats.alerts_fired += 1;
        }

        let fatigue = self.fatigue.evaluate(now);

        let elapsed_secs = self
            .stats
            .session_started_at
            .map(|started| (now - started) / 1000.0)
            .unwrap_or(0.0);
        let break_reminder = breaks::evaluate_break(
            &BreakInput {
                elapsed_secs,
                fatigue_level: fatigue.level,
                score_trend: self.trend.trend(self.config.breaks.trend_margin),
                now_ms: now,
            },
            &mut self.break_state,
            &self.config.breaks,
        );

        FrameResult {
            timestamp: now,
            metrics,
            risk,
            fatigue,
            alert,
            break_reminder,
            skipped: false,
        }
    }

    /// Snooze break reminders on the user's behalf.
    pub fn snooze_breaks(&mut self, now_ms: f64) {
        breaks::apply_snooze(&mut self.break_state, now_ms, &self.config.breaks);
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Clear all accumulated session state. Idempotent and immediate.
    pub fn reset(&mut self) {
        self.fatigue.reset();
        self.alerts.reset();
        self.break_state = BreakState::default();
        self.trend.reset();
        self.last_score = None;
        self.last_ts = None;
        self.stats = SessionStats::default();
        tracing::info!("Posture engine reset");
    }
}
