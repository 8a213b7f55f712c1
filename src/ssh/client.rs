//! 基于 russh 的 SSH 传输实现
//! 负责连接、认证、主机密钥校验以及单条命令的执行

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use async_trait::async_trait;
use russh::client::{self, Config, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::decode_secret_key;
use russh_keys::key::PublicKey;
use russh_keys::PublicKeyBase64;
use secrecy::ExposeSecret;
use sha2::Digest;

use common::{AppError, CommonResult as Result, HostKeyVerification, SshAuth, SshSettings};

use crate::ssh::transport::{CommandChannel, Connection, Connector};

/// SSH_EXTENDED_DATA_STDERR
const EXTENDED_DATA_STDERR: u32 = 1;

/// russh 连接器
pub struct RusshConnector {
    settings: Arc<SshSettings>,
}

impl RusshConnector {
    pub fn new(settings: SshSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    /// 创建带验证策略的会话处理器
    fn create_session(&self, target: &str) -> SshSession {
        let host_key = self.settings.host_key(target);
        SshSession {
            verification_mode: self.settings.host_key_verification.clone(),
            expected_fingerprint: self.settings.known_hosts.get(&host_key).cloned(),
            host_key,
        }
    }

    /// 建立 TCP 连接、完成握手并认证
    async fn establish(&self, target: &str) -> Result<Handle<SshSession>> {
        let client_config = Arc::new(Config {
            preferred: russh::Preferred::default(),
            ..Default::default()
        });

        let mut handle = client::connect(
            client_config,
            (target.to_string(), self.settings.port),
            self.create_session(target),
        )
        .await
        .map_err(|e| {
            error!(host = %target, error = %e, "SSH connection failed");
            AppError::SshConnectionError(format!("{}: {}", self.settings.endpoint(target), e))
        })?;

        let auth_result = match &self.settings.auth {
            SshAuth::Password { password } => {
                handle
                    .authenticate_password(
                        self.settings.username.clone(),
                        password.expose_secret().clone(),
                    )
                    .await
            }
            SshAuth::Key {
                private_key,
                passphrase,
            } => {
                let key = decode_secret_key(
                    private_key.expose_secret(),
                    passphrase.as_ref().map(|p| p.expose_secret().as_str()),
                )
                .map_err(|e| {
                    error!(error = %e, "Failed to decode SSH private key");
                    AppError::SshAuthenticationError(format!("invalid private key: {}", e))
                });
                match key {
                    Ok(key) => {
                        handle
                            .authenticate_publickey(self.settings.username.clone(), Arc::new(key))
                            .await
                    }
                    Err(e) => {
                        disconnect(&handle).await;
                        return Err(e);
                    }
                }
            }
        };

        match auth_result {
            Ok(true) => {
                debug!(endpoint = %self.settings.endpoint(target), "SSH authenticated");
                Ok(handle)
            }
            Ok(false) => {
                disconnect(&handle).await;
                Err(AppError::SshAuthenticationError(format!(
                    "{} rejected the credentials",
                    self.settings.endpoint(target)
                )))
            }
            Err(e) => {
                disconnect(&handle).await;
                Err(AppError::SshAuthenticationError(format!(
                    "{}: {}",
                    self.settings.endpoint(target),
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl Connector for RusshConnector {
    async fn connect(&self, target: &str) -> Result<Box<dyn Connection>> {
        let handle = match self.settings.connect_timeout() {
            Some(limit) => timeout(limit, self.establish(target)).await.map_err(|_| {
                AppError::Timeout(format!(
                    "connecting to {} exceeded {}s",
                    self.settings.endpoint(target),
                    limit.as_secs()
                ))
            })??,
            None => self.establish(target).await?,
        };

        Ok(Box::new(RusshConnection {
            handle,
            target: target.to_string(),
            command_timeout: self.settings.command_timeout(),
        }))
    }
}

async fn disconnect(handle: &Handle<SshSession>) {
    if let Err(e) = handle.disconnect(Disconnect::ByApplication, "", "").await {
        debug!(error = %e, "SSH disconnect failed");
    }
}

/// 已认证的 russh 连接
struct RusshConnection {
    handle: Handle<SshSession>,
    target: String,
    command_timeout: Option<Duration>,
}

#[async_trait]
impl Connection for RusshConnection {
    async fn open_channel(&mut self) -> Result<Box<dyn CommandChannel>> {
        let channel = self.handle.channel_open_session().await.map_err(|e| {
            error!(host = %self.target, error = %e, "Failed to open SSH channel");
            AppError::SshChannelError(format!("{}: {}", self.target, e))
        })?;

        Ok(Box::new(RusshChannel {
            channel,
            command_timeout: self.command_timeout,
        }))
    }

    async fn close(&mut self) {
        disconnect(&self.handle).await;
    }
}

/// 单条命令使用的会话通道
struct RusshChannel {
    channel: Channel<Msg>,
    command_timeout: Option<Duration>,
}

impl RusshChannel {
    async fn next_message(&mut self, command: &str) -> Result<Option<ChannelMsg>> {
        match self.command_timeout {
            Some(limit) => timeout(limit, self.channel.wait()).await.map_err(|_| {
                warn!(command = %command, "Command timed out");
                AppError::Timeout(format!("command `{}` exceeded {}s", command, limit.as_secs()))
            }),
            None => Ok(self.channel.wait().await),
        }
    }
}

#[async_trait]
impl CommandChannel for RusshChannel {
    async fn combined_output(&mut self, command: &str) -> Result<Vec<u8>> {
        self.channel.exec(true, command).await.map_err(|e| {
            error!(command = %command, error = %e, "Exec request failed");
            AppError::SshExecutionError(format!("command `{}`: {}", command, e))
        })?;

        // 读到通道关闭为止
        let mut output = ChannelOutput::default();
        while let Some(msg) = self.next_message(command).await? {
            output.push(msg);
        }

        output.finish(command)
    }

    async fn close(&mut self) {
        if let Err(e) = self.channel.close().await {
            debug!(error = %e, "SSH channel close failed");
        }
    }
}

/// 一条命令的通道消息累积结果
///
/// stdout 与 stderr 按到达顺序写入同一缓冲区，其他扩展数据流被忽略
#[derive(Debug, Default)]
struct ChannelOutput {
    output: Vec<u8>,
    exit_status: Option<u32>,
    exit_signal: Option<String>,
}

impl ChannelOutput {
    fn push(&mut self, msg: ChannelMsg) {
        match msg {
            ChannelMsg::Data { data } => self.output.extend_from_slice(&data),
            ChannelMsg::ExtendedData { data, ext } if ext == EXTENDED_DATA_STDERR => {
                self.output.extend_from_slice(&data)
            }
            ChannelMsg::ExitStatus { exit_status } => self.exit_status = Some(exit_status),
            ChannelMsg::ExitSignal { signal_name, .. } => {
                self.exit_signal = Some(format!("{:?}", signal_name))
            }
            _ => {}
        }
    }

    /// 只有退出码为 0 才算成功
    fn finish(self, command: &str) -> Result<Vec<u8>> {
        match (self.exit_status, self.exit_signal) {
            (Some(0), _) => Ok(self.output),
            (Some(status), _) => Err(AppError::SshExecutionError(format!(
                "command `{}` exited with status {}",
                command, status
            ))),
            (None, Some(signal)) => Err(AppError::SshExecutionError(format!(
                "command `{}` killed by signal {}",
                command, signal
            ))),
            (None, None) => Err(AppError::SshExecutionError(format!(
                "command `{}` finished without an exit status",
                command
            ))),
        }
    }
}

/// 主机公钥指纹：公钥 base64 的 SHA-256 十六进制
pub fn fingerprint(public_key_base64: &str) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(public_key_base64.as_bytes());
    hex::encode(hasher.finalize())
}

/// 主机密钥校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyDecision {
    /// 与登记的指纹一致
    Verified,
    /// 未登记，按策略接受
    AcceptedUnknown,
    /// 验证已禁用
    Unchecked,
    /// 与登记的指纹不一致
    Mismatch,
    /// 严格模式下的未知主机
    RejectedUnknown,
}

impl HostKeyDecision {
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            HostKeyDecision::Verified
                | HostKeyDecision::AcceptedUnknown
                | HostKeyDecision::Unchecked
        )
    }
}

/// 根据策略和登记的指纹决定是否接受主机密钥
pub fn decide_host_key(
    mode: &HostKeyVerification,
    expected: Option<&str>,
    actual: &str,
) -> HostKeyDecision {
    if *mode == HostKeyVerification::Disabled {
        return HostKeyDecision::Unchecked;
    }

    match expected {
        Some(expected) if expected.eq_ignore_ascii_case(actual) => HostKeyDecision::Verified,
        Some(_) => HostKeyDecision::Mismatch,
        None if *mode == HostKeyVerification::Accept => HostKeyDecision::AcceptedUnknown,
        None => HostKeyDecision::RejectedUnknown,
    }
}

/// SSH 客户端会话处理器
struct SshSession {
    verification_mode: HostKeyVerification,
    expected_fingerprint: Option<String>,
    host_key: String,
}

#[async_trait]
impl client::Handler for SshSession {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let actual = fingerprint(&server_public_key.public_key_base64());
        let decision = decide_host_key(
            &self.verification_mode,
            self.expected_fingerprint.as_deref(),
            &actual,
        );

        match decision {
            HostKeyDecision::Verified => debug!(host = %self.host_key, "Host key verified"),
            HostKeyDecision::AcceptedUnknown => info!(
                host = %self.host_key,
                fingerprint = %actual,
                "Unknown host - accepting host key"
            ),
            HostKeyDecision::Unchecked => warn!(
                host = %self.host_key,
                "Host key verification DISABLED - accepting all keys"
            ),
            HostKeyDecision::Mismatch => error!(
                host = %self.host_key,
                expected = ?self.expected_fingerprint,
                actual = %actual,
                "Host key mismatch - REJECTING CONNECTION"
            ),
            HostKeyDecision::RejectedUnknown => error!(
                host = %self.host_key,
                fingerprint = %actual,
                "Unknown host in strict mode - rejecting connection"
            ),
        }

        Ok(decision.is_accepted())
    }
}
