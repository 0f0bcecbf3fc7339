//! 检查点与命令行分发
//!
//! 计算器可整体写入检查点文件，之后（在本进程或另一个进程中）恢复并运行。

mod dispatch;
mod snapshot;

pub use dispatch::run_from_cli;
pub use snapshot::{AnyCalculator, CHECKPOINT_SCHEMA_VERSION, Checkpoint, dump_any, load_any};
