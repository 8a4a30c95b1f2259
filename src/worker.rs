//! 帧驱动的异步宿主
//!
//! 把姿态引擎隔离在独立的 tokio 任务中逐帧运行，保证每帧计算
//! 不阻塞调用方的渲染循环。输入输出都是有界通道，显式的
//! 背压策略是"落后即丢帧"：
//! - 输入侧 `submit_frame` 用 try_send，worker 落后时丢弃新帧并上报
//! - 输出侧消费者落后时丢弃计算结果并计数，从不阻塞帧循环
//!
//! 会话结束通过 broadcast 信号优雅停机；`Reset` 消息走队列，
//! 保证与已入队的帧保持顺序。

use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pipeline::engine::{FrameResult, PostureEngine};
use crate::pipeline::landmark::{LandmarkFrame, PoseLandmark};

/// worker 任务消费的消息
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Frame(LandmarkFrame),
    /// 清空全部会话状态（会话重开）
    Reset,
}

/// 生产侧句柄
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerMessage>,
    shutdown_tx: broadcast::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

pub struct PostureWorker;

impl PostureWorker {
    /// 启动 worker 任务
    ///
    /// 返回生产侧句柄与逐帧结果流。配置在启动前校验，非法配置直接拒绝。
    pub fn spawn(
        config: EngineConfig,
    ) -> Result<(WorkerHandle, ReceiverStream<FrameResult>), EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        let (tx, mut rx) = mpsc::channel::<WorkerMessage>(config.worker.input_capacity);
        let (out_tx, out_rx) = mpsc::channel::<FrameResult>(config.worker.output_capacity);
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let mut engine = PostureEngine::new(config);
        let join = tokio::spawn(async move {
            tracing::info!("Posture worker started");
            let mut dropped_results: u64 = 0;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    message = rx.recv() => {
                        let Some(message) = message else { break };
                        match message {
                            WorkerMessage::Frame(frame) => {
                                let result = engine.process_frame(&frame);
                                // 消费者落后不能拖慢帧循环，结果直接丢弃
                                if out_tx.try_send(result).is_err() {
                                    dropped_results += 1;
                                    tracing::debug!(
                                        dropped_results,
                                        "Result channel full, dropping frame result"
                                    );
                                }
                            }
                            WorkerMessage::Reset => engine.reset(),
                        }
                    }
                }
            }
            tracing::info!(dropped_results, "Posture worker stopped");
        });

        Ok((
            WorkerHandle {
                tx,
                shutdown_tx,
                join,
            },
            ReceiverStream::new(out_rx),
        ))
    }
}

impl WorkerHandle {
    /// 非阻塞提交一帧
    ///
    /// 返回 Ok(true) 表示已入队，Ok(false) 表示 worker 落后、本帧被丢弃。
    pub fn submit_frame(&self, frame: LandmarkFrame) -> Result<bool, EngineError> {
        match self.tx.try_send(WorkerMessage::Frame(frame)) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => Ok(false),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(EngineError::WorkerClosed),
        }
    }

    /// 提交一帧，时间戳由宿主按当前墙钟补齐
    ///
    /// 供不自带时间戳的采集方使用。
    pub fn submit_landmarks(&self, landmarks: Vec<PoseLandmark>) -> Result<bool, EngineError> {
        let timestamp = chrono::Utc::now().timestamp_millis() as f64;
        self.submit_frame(LandmarkFrame::new(landmarks, timestamp))
    }

    /// 入队一次状态重置；等待队列空位，保证重置不被丢弃
    pub async fn reset(&self) -> Result<(), EngineError> {
        self.tx
            .send(WorkerMessage::Reset)
            .await
            .map_err(|_| EngineError::WorkerClosed)
    }

    /// 发出停机信号并等待 worker 任务退出
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        drop(self.tx);
        let _ = self.join.await;
    }
}
