//! 命令行分发：读取检查点并运行其中的计算器。

use super::snapshot::load_any;
use crate::error::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// 读取并运行 `args` 中唯一路径所指的计算器。
///
/// 路径个数不为一时什么也不做，返回 `Ok(None)`。
pub fn run_from_cli<I, S>(args: I) -> Result<Option<i32>>
where
    I: IntoIterator<Item = S>,
    S: Into<PathBuf>,
{
    let mut paths: Vec<PathBuf> = args.into_iter().map(Into::into).collect();
    if paths.len() != 1 {
        debug!(count = paths.len(), "需要恰好一个检查点路径，跳过");
        return Ok(None);
    }
    let path = paths.remove(0);
    let mut calculator = load_any(&path)?;
    info!(kind = calculator.kind(), path = %path.display(), "从检查点恢复计算器");
    let status = calculator.run()?;
    info!(status, "计算器运行结束");
    Ok(Some(status))
}
