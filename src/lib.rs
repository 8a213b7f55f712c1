//! 网络设备命令采集库
//! 通过 SSH 在设备上依次执行命令，并将合并输出按设备存档

pub mod collector;
pub mod config;
pub mod models;
pub mod output;
pub mod ssh;
pub mod telemetry;

pub use common::{AppError, CommonResult as Result};
