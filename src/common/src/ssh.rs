//! SSH 连接设置
//!
//! 所有设备共用一份只读的连接设置（凭据、端口、超时、主机密钥策略），
//! 在调用执行器时显式传入

use secrecy::Secret;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// 标准 SSH 端口
pub const DEFAULT_SSH_PORT: u16 = 22;

/// 主机密钥验证策略
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyVerification {
    /// 严格模式：只接受已知的主机密钥
    Strict,
    /// 接受模式：已知主机校验指纹，未知主机记录指纹后接受
    #[default]
    Accept,
    /// 禁用验证（不安全，仅用于开发/测试）
    Disabled,
}

impl std::str::FromStr for HostKeyVerification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "accept" => Ok(Self::Accept),
            "disabled" | "none" | "false" => Ok(Self::Disabled),
            _ => Err(format!("Unknown host key verification mode: {}", s)),
        }
    }
}

/// SSH 认证方式
#[derive(Debug, Clone)]
pub enum SshAuth {
    /// 密码认证
    Password { password: Secret<String> },
    /// 私钥认证
    Key {
        /// 私钥内容（PEM/OpenSSH 格式）
        private_key: Secret<String>,
        /// 私钥密码（如果有）
        passphrase: Option<Secret<String>>,
    },
}

/// 共享的 SSH 连接设置
#[derive(Debug, Clone)]
pub struct SshSettings {
    /// 用户名
    pub username: String,

    /// 认证方式
    pub auth: SshAuth,

    /// 端口
    pub port: u16,

    /// 连接 + 握手 + 认证超时（秒），None 表示不限制
    pub connect_timeout_secs: Option<u64>,

    /// 单条命令超时（秒），None 表示不限制
    pub command_timeout_secs: Option<u64>,

    /// 主机密钥验证策略
    pub host_key_verification: HostKeyVerification,

    /// 已知主机指纹：`host:port` -> SHA-256 十六进制指纹
    pub known_hosts: HashMap<String, String>,
}

impl SshSettings {
    /// 创建新的连接设置
    pub fn new(username: String, auth: SshAuth) -> Self {
        Self {
            username,
            auth,
            port: DEFAULT_SSH_PORT,
            connect_timeout_secs: None,
            command_timeout_secs: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts: HashMap::new(),
        }
    }

    /// 设置端口
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 设置连接超时
    pub fn with_connect_timeout(mut self, timeout_secs: u64) -> Self {
        self.connect_timeout_secs = Some(timeout_secs);
        self
    }

    /// 设置命令超时
    pub fn with_command_timeout(mut self, timeout_secs: u64) -> Self {
        self.command_timeout_secs = Some(timeout_secs);
        self
    }

    /// 设置主机密钥验证策略
    pub fn with_host_key_verification(mut self, verification: HostKeyVerification) -> Self {
        self.host_key_verification = verification;
        self
    }

    /// 登记已知主机指纹
    pub fn with_known_host(mut self, host_port: String, fingerprint: String) -> Self {
        self.known_hosts.insert(host_port, fingerprint);
        self
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// known_hosts 中使用的键
    pub fn host_key(&self, target: &str) -> String {
        format!("{}:{}", target, self.port)
    }

    /// 日志用的目标描述
    pub fn endpoint(&self, target: &str) -> String {
        format!("{}@{}:{}", self.username, target, self.port)
    }
}
