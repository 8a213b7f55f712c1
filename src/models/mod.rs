//! 数据模型模块

pub mod task;

pub use task::Task;
