//! 实时姿态评估引擎
//!
//! 本库将姿态检测模型输出的人体关键点流转换为逐帧的姿态指标、
//! 风险等级、疲劳状态与防抖后的告警事件，供 UI / 会话记录方消费。
//!
//! ## 模块
//! - `pipeline`: 核心数值管线（指标计算、风险分级、疲劳状态机、告警、休息提醒）
//! - `worker`: 帧驱动的异步宿主，把管线隔离在独立任务中运行
//! - `config`: 全部可调策略参数与校验
//! - `logging`: tracing 初始化
//! - `error`: 宿主边界的错误类型

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod worker;

// 重新导出核心类型，方便外部使用
pub use error::EngineError;
pub use pipeline::engine::{FrameResult, PostureEngine, SessionStats};
pub use pipeline::landmark::{LandmarkFrame, PoseLandmark};
pub use worker::{PostureWorker, WorkerHandle, WorkerMessage};
