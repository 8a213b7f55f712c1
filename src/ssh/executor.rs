//! SSH执行器模块
//! 在一条连接上依次执行一组命令，拼接合并输出

use std::time::Instant;
use tracing::{debug, info};

use common::CommonResult as Result;

use crate::ssh::transport::{Connection, Connector};

/// 远程执行器
///
/// 每次 `execute` 只建立一条连接；每条命令使用独立的会话通道，
/// 通道和连接在所有返回路径上都会被关闭
pub struct RemoteExecutor<C> {
    connector: C,
}

impl<C: Connector> RemoteExecutor<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// 在 `target` 上依次执行 `commands`
    ///
    /// 全部成功时返回按顺序拼接的输出；遇到第一个错误即停止并返回该错误，
    /// 之前命令的输出随之丢弃
    pub async fn execute(&self, target: &str, commands: &[String]) -> Result<Vec<u8>> {
        let start_time = Instant::now();

        debug!(host = %target, commands = commands.len(), "Connecting");

        let mut connection = self.connector.connect(target).await?;
        let result = run_commands(connection.as_mut(), target, commands).await;
        connection.close().await;

        if let Ok(ref output) = result {
            info!(
                host = %target,
                commands = commands.len(),
                output_len = output.len(),
                duration_secs = start_time.elapsed().as_secs_f64(),
                "Commands executed"
            );
        }

        result
    }
}

async fn run_commands(
    connection: &mut dyn Connection,
    target: &str,
    commands: &[String],
) -> Result<Vec<u8>> {
    let mut results = Vec::new();

    for (index, command) in commands.iter().enumerate() {
        let mut channel = connection.open_channel().await?;

        let output = channel.combined_output(command).await;
        channel.close().await;
        let output = output?;

        debug!(
            host = %target,
            index = index,
            command = %command,
            output_len = output.len(),
            "Command finished"
        );

        results.extend_from_slice(&output);
    }

    Ok(results)
}
