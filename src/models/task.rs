//! 采集任务模型
//! 一台设备及其需要依次执行的命令列表

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 采集任务 - 加载后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Task {
    /// 目标设备地址（同时用作输出文件名）
    #[validate(custom(function = "validate_target"))]
    pub target: String,

    /// 依次执行的命令
    #[validate(
        length(min = 1, message = "command list must not be empty"),
        custom(function = "validate_commands")
    )]
    pub commands: Vec<String>,
}

impl Task {
    pub fn new<T, I, S>(target: T, commands: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }
}

fn validate_target(target: &str) -> Result<(), ValidationError> {
    if target.trim().is_empty() {
        return Err(ValidationError::new("empty_target")
            .with_message("target must not be empty".into()));
    }
    // 目标地址会成为文件名，不能跳出输出目录
    if target.contains(['/', '\\']) || target == "." || target == ".." {
        return Err(ValidationError::new("invalid_target")
            .with_message("target must not contain path separators".into()));
    }
    Ok(())
}

fn validate_commands(commands: &[String]) -> Result<(), ValidationError> {
    if commands.iter().any(|c| c.trim().is_empty()) {
        return Err(ValidationError::new("blank_command")
            .with_message("commands must not be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_task() {
        let task = Task::new(
            "192.168.1.1",
            ["show interfaces detail", "show chassis hardware detail"],
        );
        assert!(task.validate().is_ok());
        assert_eq!(task.commands.len(), 2);
    }

    #[test]
    fn test_empty_target_rejected() {
        let task = Task::new("  ", ["echo A"]);
        let errors = task.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("target"));
    }

    #[test]
    fn test_path_like_target_rejected() {
        for target in ["../etc", "a/b", "..", "host\\1"] {
            let task = Task::new(target, ["echo A"]);
            assert!(task.validate().is_err(), "target {target:?} should be rejected");
        }
    }

    #[test]
    fn test_empty_command_list_rejected() {
        let task = Task::new("10.0.0.5", Vec::<String>::new());
        let errors = task.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("commands"));
    }

    #[test]
    fn test_blank_command_rejected() {
        let task = Task::new("10.0.0.5", ["echo A", ""]);
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_ipv6_target_allowed() {
        let task = Task::new("fe80::1", ["show version"]);
        assert!(task.validate().is_ok());
    }
}
