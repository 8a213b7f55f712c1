//! 配置系统
//! 从配置文件和环境变量加载设备任务与凭据，使用 Secret 包装敏感信息

use crate::models::Task;
use common::{AppError, HostKeyVerification, SshAuth, SshSettings};
use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::collections::HashMap;
use validator::Validate;

/// 默认配置文件（不存在时忽略）
pub const DEFAULT_CONFIG_FILE: &str = "collect.toml";

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "COLLECT_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: text, json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// SSH 用户名（所有设备共用）
    pub username: String,
    /// SSH 密码（使用 Secret 包装，防止日志泄露）
    pub password: Secret<String>,
    /// SSH 私钥内容（可选，设置后优先于密码）
    #[serde(default)]
    pub private_key: Option<Secret<String>>,
    /// 私钥密码（可选）
    #[serde(default)]
    pub private_key_passphrase: Option<Secret<String>>,
    /// 端口
    pub port: u16,
    /// 连接超时（秒），不设置则不限制
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// 单条命令超时（秒），不设置则不限制
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    /// 主机密钥验证策略（strict/accept/disabled）
    pub host_key_verification: String,
    /// 已知主机指纹：`host:port` -> SHA-256 十六进制
    #[serde(default)]
    pub known_hosts: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 输出目录
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub ssh: SshConfig,
    pub output: OutputConfig,
    /// 设备任务列表，按顺序执行
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl SshConfig {
    /// 将配置转换为 SshAuth
    pub fn to_auth(&self) -> SshAuth {
        match self.private_key {
            Some(ref key) => SshAuth::Key {
                private_key: key.clone(),
                passphrase: self.private_key_passphrase.clone(),
            },
            None => SshAuth::Password {
                password: self.password.clone(),
            },
        }
    }

    /// 构建传给执行器的共享连接设置
    pub fn to_settings(&self) -> Result<SshSettings, AppError> {
        let verification: HostKeyVerification =
            self.host_key_verification.parse().map_err(AppError::Config)?;

        let mut settings = SshSettings::new(self.username.clone(), self.to_auth())
            .with_port(self.port)
            .with_host_key_verification(verification);
        if let Some(secs) = self.connect_timeout_secs {
            settings = settings.with_connect_timeout(secs);
        }
        if let Some(secs) = self.command_timeout_secs {
            settings = settings.with_command_timeout(secs);
        }
        for (host, fingerprint) in &self.known_hosts {
            settings = settings.with_known_host(host.clone(), fingerprint.to_lowercase());
        }

        Ok(settings)
    }
}

impl AppConfig {
    /// 加载配置：路径取自 `COLLECT_CONFIG`，否则尝试默认文件
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    /// 从指定文件（可选）和环境变量加载配置
    pub fn load_from(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            .set_default("ssh.password", "")?
            .set_default("ssh.port", 22)?
            .set_default("ssh.host_key_verification", "accept")?
            .set_default("output.dir", ".")?;

        // 显式指定的文件必须存在
        settings = match path {
            Some(path) => settings.add_source(File::with_name(path).required(true)),
            None => settings.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        // 环境变量覆盖（前缀为 COLLECT_）
        settings = settings.add_source(
            Environment::with_prefix("COLLECT")
                .prefix_separator("_")
                .separator("__"),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "text" | "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: text, json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.ssh.username.trim().is_empty() {
            return Err(ConfigError::Message("ssh.username must not be empty".to_string()));
        }

        if self.ssh.port == 0 {
            return Err(ConfigError::Message("ssh.port must be between 1 and 65535".to_string()));
        }

        if self.ssh.private_key.is_none() && self.ssh.password.expose_secret().is_empty() {
            return Err(ConfigError::Message(
                "either ssh.password or ssh.private_key must be set".to_string(),
            ));
        }

        let verification: HostKeyVerification = self
            .ssh
            .host_key_verification
            .parse()
            .map_err(ConfigError::Message)?;
        if verification == HostKeyVerification::Strict && self.ssh.known_hosts.is_empty() {
            return Err(ConfigError::Message(
                "strict host key verification requires ssh.known_hosts".to_string(),
            ));
        }

        if self.tasks.is_empty() {
            return Err(ConfigError::Message("no tasks configured".to_string()));
        }

        for (index, task) in self.tasks.iter().enumerate() {
            task.validate().map_err(|e| {
                ConfigError::Message(format!(
                    "tasks[{}] ({:?}) is invalid: {}",
                    index, task.target, e
                ))
            })?;
        }

        Ok(())
    }
}
