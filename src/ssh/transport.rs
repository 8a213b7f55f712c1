//! SSH 传输层抽象
//!
//! 执行器只依赖这三个 trait：建立连接、在连接上打开通道、在通道上执行命令。
//! 生产实现见 [`crate::ssh::client`]

use async_trait::async_trait;
use common::CommonResult as Result;

/// 建立到目标设备的已认证连接
#[async_trait]
pub trait Connector: Send + Sync {
    /// 连接并完成认证；失败时不会留下任何打开的连接
    async fn connect(&self, target: &str) -> Result<Box<dyn Connection>>;
}

/// 一条已认证的传输连接，可复用来打开多个会话通道
#[async_trait]
pub trait Connection: Send {
    /// 在现有连接上打开一个新的会话通道
    async fn open_channel(&mut self) -> Result<Box<dyn CommandChannel>>;

    /// 关闭连接，忽略关闭过程中的错误
    async fn close(&mut self);
}

/// 单个会话通道，只执行一条命令
#[async_trait]
pub trait CommandChannel: Send {
    /// 执行命令并返回合并后的 stdout/stderr 字节；
    /// 非零退出码、缺失退出码或超时均视为错误
    async fn combined_output(&mut self, command: &str) -> Result<Vec<u8>>;

    /// 关闭通道，忽略关闭过程中的错误
    async fn close(&mut self);
}
