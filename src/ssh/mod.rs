//! SSH执行模块
//! 传输抽象、russh 实现与多命令执行器

pub mod client;
pub mod executor;
pub mod transport;

pub use client::RusshConnector;
pub use executor::RemoteExecutor;
pub use transport::{CommandChannel, Connection, Connector};
