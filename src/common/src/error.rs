//! 统一错误模型
//! 定义采集过程中所有错误类型
//!
//! 每个错误都对应采集流水线中的一个阶段（连接、认证、通道、执行、写入），
//! 驱动层据此记录日志后继续处理下一台设备

/// 应用错误类型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("SSH connection error: {0}")]
    SshConnectionError(String),

    #[error("SSH authentication failed: {0}")]
    SshAuthenticationError(String),

    #[error("SSH channel error: {0}")]
    SshChannelError(String),

    #[error("SSH execution error: {0}")]
    SshExecutionError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl AppError {
    /// 错误发生的阶段，用于日志字段
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Timeout(_) => "timeout",
            AppError::SshConnectionError(_) => "connect",
            AppError::SshAuthenticationError(_) => "auth",
            AppError::SshChannelError(_) => "channel",
            AppError::SshExecutionError(_) => "exec",
            AppError::IoError(_) => "write",
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 从 std::io::Error 转换
impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError(e.to_string())
    }
}
