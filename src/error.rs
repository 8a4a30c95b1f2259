use thiserror::Error;

/// 宿主边界的错误类型
///
/// 纯计算管线从不返回错误：单帧数据不足以 None 表达，非有限数值
/// 在入口处折算为最坏情况。这里只覆盖配置校验与 worker 通道失效。
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("posture worker is not running")]
    WorkerClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_carries_reason() {
        let err = EngineError::InvalidConfig("metrics scales must be > 0".to_string());
        assert!(err.to_string().contains("metrics scales"));
    }
}
