//! 姿态指标计算模块
//!
//! 将单帧人体关键点转换为三个正交的姿态质量子分数与综合评分：
//! - alignment: 肩中点相对髋中点的水平偏移（脊柱侧移）
//! - symmetry: 双肩水平度
//! - stability: 鼻尖相对肩中点的水平偏移（头部前倾/侧偏）
//!
//! 同时从关键点提取告警管理器消费的四路偏差信号。
//! 所有输出裁剪到 [0,100] 并保留两位小数；必需关键点缺失时返回 None，
//! 调用方应视为"本帧数据不足"跳过，而非错误。

use serde::{Deserialize, Serialize};

use crate::config::MetricConfig;
use crate::pipeline::landmark::{
    midpoint, offset_angle, round2, sanitize, PoseLandmark, LEFT_EAR, LEFT_HIP, LEFT_SHOULDER,
    NOSE, RIGHT_EAR, RIGHT_HIP, RIGHT_SHOULDER,
};

/// 单帧姿态指标，每项均在 [0,100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureMetrics {
    pub alignment: f64,
    pub symmetry: f64,
    pub stability: f64,
    pub score: f64,
}

/// 告警管理器消费的单帧偏差样本
///
/// 四路信号相互独立：前倾角、驼背角、耸肩量、倾斜角。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureSample {
    pub ts: f64,
    pub forward_head: f64,
    pub slouch: f64,
    pub shoulder_raise: f64,
    pub tilt: f64,
}

/// 偏差 → 子分数：100 − 偏差 × 比例系数，裁剪到 [0,100]
///
/// 非有限偏差按最坏情况处理，直接得 0 分。
fn sub_score(deviation: f64, scale: f64) -> f64 {
    if !deviation.is_finite() {
        return 0.0;
    }
    (100.0 - deviation * scale).clamp(0.0, 100.0)
}

/// 计算单帧姿态指标
///
/// 必需关键点：鼻尖(0)、双肩(11/12)、双髋(23/24)，任一缺失返回 None。
pub fn compute_metrics(
    landmarks: &[PoseLandmark],
    config: &MetricConfig,
) -> Option<PostureMetrics> {
    let nose = landmarks.get(NOSE)?;
    let left_shoulder = landmarks.get(LEFT_SHOULDER)?;
    let right_shoulder = landmarks.get(RIGHT_SHOULDER)?;
    let left_hip = landmarks.get(LEFT_HIP)?;
    let right_hip = landmarks.get(RIGHT_HIP)?;

    let (shoulder_mid_x, _) = midpoint(left_shoulder, right_shoulder);
    let (hip_mid_x, _) = midpoint(left_hip, right_hip);

    let alignment = sub_score(
        (shoulder_mid_x - hip_mid_x).abs(),
        config.alignment_scale,
    );
    let symmetry = sub_score(
        (left_shoulder.y - right_shoulder.y).abs(),
        config.symmetry_scale,
    );
    let stability = sub_score((nose.x - shoulder_mid_x).abs(), config.stability_scale);

    let score = alignment * config.alignment_weight
        + symmetry * config.symmetry_weight
        + stability * config.stability_weight;

    Some(PostureMetrics {
        alignment: round2(alignment),
        symmetry: round2(symmetry),
        stability: round2(stability),
        score: round2(score.clamp(0.0, 100.0)),
    })
}

/// 提取四路偏差信号
///
/// - 前倾角：肩中点到鼻尖连线偏离竖直方向的角度
/// - 驼背角：肩中点-髋中点连线偏离竖直方向的角度
/// - 耸肩量：耳-肩垂直间距相对标称间距的收缩量（双耳缺失或不可见时记 0）
/// - 倾斜角：双肩连线偏离水平方向的角度
pub fn extract_sample(
    landmarks: &[PoseLandmark],
    timestamp: f64,
    config: &MetricConfig,
) -> Option<PostureSample> {
    let nose = landmarks.get(NOSE)?;
    let left_shoulder = landmarks.get(LEFT_SHOULDER)?;
    let right_shoulder = landmarks.get(RIGHT_SHOULDER)?;
    let left_hip = landmarks.get(LEFT_HIP)?;
    let right_hip = landmarks.get(RIGHT_HIP)?;

    let (shoulder_mid_x, shoulder_mid_y) = midpoint(left_shoulder, right_shoulder);
    let (hip_mid_x, hip_mid_y) = midpoint(left_hip, right_hip);

    let forward_head = offset_angle(nose.x - shoulder_mid_x, shoulder_mid_y - nose.y);
    let slouch = offset_angle(shoulder_mid_x - hip_mid_x, hip_mid_y - shoulder_mid_y);
    let tilt = offset_angle(
        left_shoulder.y - right_shoulder.y,
        left_shoulder.x - right_shoulder.x,
    );

    let shoulder_raise = match (landmarks.get(LEFT_EAR), landmarks.get(RIGHT_EAR)) {
        (Some(left_ear), Some(right_ear))
            if left_ear.is_visible(config.min_visibility)
                && right_ear.is_visible(config.min_visibility) =>
        {
            let (_, ear_mid_y) = midpoint(left_ear, right_ear);
            sanitize((config.nominal_ear_shoulder_gap - (shoulder_mid_y - ear_mid_y)).max(0.0))
        }
        _ => 0.0,
    };

    Some(PostureSample {
        ts: timestamp,
        forward_head,
        slouch,
        shoulder_raise,
        tilt,
    })
}
