//! 人体关键点基础类型与平面几何计算
//!
//! 姿态检测模型输出的关键点按索引位置约定排列：
//! - 0: 鼻尖
//! - 7/8: 左右耳
//! - 11/12: 左右肩
//! - 23/24: 左右髋
//!
//! 所有坐标为归一化 [0,1] 图像空间，z 为相对深度。

use serde::{Deserialize, Serialize};

pub const NOSE: usize = 0;
pub const LEFT_EAR: usize = 7;
pub const RIGHT_EAR: usize = 8;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;

/// 归一化 3D 关键点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseLandmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// 检测置信度 (0.0-1.0)，缺省视为可见
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl PoseLandmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    /// 置信度低于阈值视为不可见；未提供置信度时视为可见
    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility.map_or(true, |v| v > threshold)
    }
}

/// 单帧输入：关键点序列 + 毫秒时间戳
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkFrame {
    pub landmarks: Vec<PoseLandmark>,
    pub timestamp: f64,
}

impl LandmarkFrame {
    pub fn new(landmarks: Vec<PoseLandmark>, timestamp: f64) -> Self {
        Self {
            landmarks,
            timestamp,
        }
    }
}

/// 非有限值折算为 0，避免 NaN 污染下游平均与分级
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 保留两位小数
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 以 b 为顶点、指向 a 与 c 两条射线的平面夹角（度）
///
/// 通过 atan2 差值计算，折叠到 [0,180]：优角取 360 − angle。
pub fn angle_deg(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    let raw = (c.1 - b.1).atan2(c.0 - b.0) - (a.1 - b.1).atan2(a.0 - b.0);
    let mut deg = raw.to_degrees().abs();
    if deg > 180.0 {
        deg = 360.0 - deg;
    }
    sanitize(deg)
}

/// 偏移量相对参考边的夹角（度），用于把归一化偏移表达为角度信号
pub(crate) fn offset_angle(offset: f64, reference: f64) -> f64 {
    sanitize(offset.abs().atan2(reference.abs()).to_degrees())
}

pub(crate) fn midpoint(a: &PoseLandmark, b: &PoseLandmark) -> (f64, f64) {
    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_is_180() {
        let angle = angle_deg((0.0, 0.0), (0.5, 0.0), (1.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn right_angle_is_90() {
        let angle = angle_deg((1.0, 0.0), (0.0, 0.0), (0.0, 1.0));
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn reflex_angles_are_folded() {
        // 顺时针与逆时针测得的同一夹角应一致
        let cw = angle_deg((1.0, 0.0), (0.0, 0.0), (-0.5, -0.5));
        let ccw = angle_deg((-0.5, -0.5), (0.0, 0.0), (1.0, 0.0));
        assert!((cw - ccw).abs() < 1e-9);
        assert!((0.0..=180.0).contains(&cw));
    }

    #[test]
    fn missing_visibility_counts_as_visible() {
        let lm = PoseLandmark::new(0.5, 0.5, 0.0);
        assert!(lm.is_visible(0.5));

        let hidden = PoseLandmark {
            visibility: Some(0.2),
            ..lm
        };
        assert!(!hidden.is_visible(0.5));
    }

    #[test]
    fn sanitize_folds_non_finite_to_zero() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(1.25), 1.25);
    }
}
