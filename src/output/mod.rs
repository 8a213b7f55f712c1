//! 输出存档模块
//! 每台设备一个 `<target>.txt` 文件，重复运行时覆盖

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use common::CommonResult as Result;

/// 输出文件权限：rwxr-xr-x
pub const OUTPUT_FILE_MODE: u32 = 0o755;

/// 输出存档器
#[derive(Debug, Clone)]
pub struct OutputArchive {
    dir: PathBuf,
}

impl OutputArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 目标设备对应的输出文件路径
    pub fn path_for(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", target))
    }

    /// 写入（覆盖）目标设备的输出文件
    pub fn write(&self, target: &str, output: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(target);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(OUTPUT_FILE_MODE);
        }

        let mut file = options.open(&path)?;
        file.write_all(output)?;
        file.flush()?;

        Ok(path)
    }
}
