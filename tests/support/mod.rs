//! 测试公共模块
//! 提供按脚本应答的内存 SSH 传输，用于验证执行器和采集驱动的行为

#![allow(dead_code)]

use async_trait::async_trait;
use ops_collect::ssh::{CommandChannel, Connection, Connector};
use ops_collect::{AppError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 单台主机的应答脚本
#[derive(Debug, Clone, Default)]
pub struct HostScript {
    /// 连接阶段返回的错误
    pub connect_error: Option<AppError>,
    /// 第 N 次打开通道时返回的错误（从 0 开始）
    pub open_failure_at: Option<(usize, AppError)>,
    /// 命令 -> 合并输出或错误；未登记的命令回显 `<command>\n`
    pub commands: HashMap<String, std::result::Result<Vec<u8>, AppError>>,
}

impl HostScript {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn unreachable(error: AppError) -> Self {
        Self {
            connect_error: Some(error),
            ..Self::default()
        }
    }

    pub fn output(mut self, command: &str, bytes: &[u8]) -> Self {
        self.commands.insert(command.to_string(), Ok(bytes.to_vec()));
        self
    }

    pub fn failing(mut self, command: &str, error: AppError) -> Self {
        self.commands.insert(command.to_string(), Err(error));
        self
    }

    pub fn open_fails_at(mut self, index: usize, error: AppError) -> Self {
        self.open_failure_at = Some((index, error));
        self
    }
}

/// 传输层事件记录
#[derive(Debug, Default)]
pub struct TransportLog {
    /// 连接尝试（按顺序）
    pub connects: Vec<String>,
    /// 关闭的连接
    pub connection_closes: Vec<String>,
    /// 打开的通道：(target, channel id)
    pub channels_opened: Vec<(String, usize)>,
    /// 每个通道 id 被关闭的次数
    pub channel_closes: HashMap<usize, usize>,
    /// 执行的命令：(target, command)
    pub executed: Vec<(String, String)>,
}

impl TransportLog {
    pub fn channels_opened_for(&self, target: &str) -> usize {
        self.channels_opened.iter().filter(|(t, _)| t == target).count()
    }

    /// 每个打开的通道恰好关闭一次
    pub fn every_channel_closed_once(&self) -> bool {
        self.channels_opened
            .iter()
            .all(|(_, id)| self.channel_closes.get(id) == Some(&1))
            && self.channel_closes.len() == self.channels_opened.len()
    }
}

/// 按脚本应答的连接器
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    hosts: Arc<HashMap<String, HostScript>>,
    log: Arc<Mutex<TransportLog>>,
}

impl ScriptedConnector {
    pub fn new(hosts: Vec<(&str, HostScript)>) -> Self {
        Self {
            hosts: Arc::new(hosts.into_iter().map(|(h, s)| (h.to_string(), s)).collect()),
            log: Arc::new(Mutex::new(TransportLog::default())),
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, TransportLog> {
        self.log.lock().unwrap()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, target: &str) -> Result<Box<dyn Connection>> {
        self.log.lock().unwrap().connects.push(target.to_string());

        let script = self.hosts.get(target).cloned().ok_or_else(|| {
            AppError::SshConnectionError(format!("{}: no route to host", target))
        })?;
        if let Some(error) = script.connect_error.clone() {
            return Err(error);
        }

        Ok(Box::new(ScriptedConnection {
            target: target.to_string(),
            script,
            opened: 0,
            log: self.log.clone(),
        }))
    }
}

struct ScriptedConnection {
    target: String,
    script: HostScript,
    opened: usize,
    log: Arc<Mutex<TransportLog>>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn open_channel(&mut self) -> Result<Box<dyn CommandChannel>> {
        let index = self.opened;
        self.opened += 1;

        if let Some((fail_at, error)) = &self.script.open_failure_at {
            if *fail_at == index {
                return Err(error.clone());
            }
        }

        let mut log = self.log.lock().unwrap();
        let id = log.channels_opened.len();
        log.channels_opened.push((self.target.clone(), id));

        Ok(Box::new(ScriptedChannel {
            id,
            target: self.target.clone(),
            commands: self.script.commands.clone(),
            log: self.log.clone(),
        }))
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().connection_closes.push(self.target.clone());
    }
}

struct ScriptedChannel {
    id: usize,
    target: String,
    commands: HashMap<String, std::result::Result<Vec<u8>, AppError>>,
    log: Arc<Mutex<TransportLog>>,
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    async fn combined_output(&mut self, command: &str) -> Result<Vec<u8>> {
        self.log
            .lock()
            .unwrap()
            .executed
            .push((self.target.clone(), command.to_string()));

        match self.commands.get(command) {
            Some(result) => result.clone(),
            None => Ok(format!("{}\n", command).into_bytes()),
        }
    }

    async fn close(&mut self) {
        *self
            .log
            .lock()
            .unwrap()
            .channel_closes
            .entry(self.id)
            .or_insert(0) += 1;
    }
}

pub fn commands(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}
