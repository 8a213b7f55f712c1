//! 采集驱动
//! 按顺序处理任务列表：执行命令、写入输出文件，单个任务失败只记录日志

use std::path::PathBuf;
use tracing::{error, info};

use common::{AppError, CommonResult as Result};

use crate::models::Task;
use crate::output::OutputArchive;
use crate::ssh::{Connector, RemoteExecutor};

/// 单个失败的任务
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub target: String,
    pub error: AppError,
}

/// 一次运行的结果汇总
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// 成功写入输出的目标
    pub succeeded: Vec<String>,
    /// 失败的目标及原因
    pub failed: Vec<TaskFailure>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// 采集驱动
pub struct Collector<C> {
    executor: RemoteExecutor<C>,
    archive: OutputArchive,
}

impl<C: Connector> Collector<C> {
    pub fn new(executor: RemoteExecutor<C>, archive: OutputArchive) -> Self {
        Self { executor, archive }
    }

    /// 依次处理所有任务，不因单个任务失败而中止
    pub async fn run(&self, tasks: &[Task]) -> RunSummary {
        let mut summary = RunSummary::default();

        for task in tasks {
            match self.collect(task).await {
                Ok(path) => {
                    info!(host = %task.target, path = %path.display(), "Output written");
                    summary.succeeded.push(task.target.clone());
                }
                Err(err) => {
                    error!(
                        host = %task.target,
                        commands = ?task.commands,
                        stage = err.stage(),
                        error = %err,
                        "Task failed, continuing with next target"
                    );
                    summary.failed.push(TaskFailure {
                        target: task.target.clone(),
                        error: err,
                    });
                }
            }
        }

        summary
    }

    /// 处理单个任务；只有全部命令成功才会写文件
    pub async fn collect(&self, task: &Task) -> Result<PathBuf> {
        let output = self.executor.execute(&task.target, &task.commands).await?;
        self.archive.write(&task.target, &output)
    }
}
