//! 外部进程启动
//!
//! 后端都是外部可执行程序：这里负责拼接命令行、阻塞等待并取回退出码。

use crate::error::{CalcError, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// 把 `"mpirun -np 4"` 这样的启动命令拆成程序与前置参数。
///
/// 空串或全空白时返回 `None`。
pub fn split_launch_command(raw: &str) -> Option<(String, Vec<String>)> {
    let mut tokens = raw.split_whitespace().map(str::to_owned);
    let program = tokens.next()?;
    Some((program, tokens.collect()))
}

/// 运行 `program args…` 直至结束，返回退出码。
pub fn spawn_and_wait(program: &str, args: &[String], cwd: Option<&Path>) -> Result<i32> {
    info!(program, ?args, "启动后端进程");
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let status = cmd.status().map_err(|source| CalcError::Spawn {
        program: program.to_string(),
        source,
    })?;
    match status.code() {
        Some(0) => {
            debug!(program, "后端进程正常退出");
            Ok(0)
        }
        Some(code) => {
            warn!(program, code, "后端进程返回非零状态");
            Ok(code)
        }
        None => Err(CalcError::Backend {
            program: program.to_string(),
            reason: "terminated by a signal".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_launch_command_tokens() {
        assert_eq!(
            split_launch_command("mpirun -np 4"),
            Some(("mpirun".to_string(), vec!["-np".to_string(), "4".to_string()]))
        );
        assert_eq!(
            split_launch_command("  /opt/mcstas/bin/mcrun  "),
            Some(("/opt/mcstas/bin/mcrun".to_string(), Vec::new()))
        );
        assert_eq!(split_launch_command(""), None);
        assert_eq!(split_launch_command("   "), None);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = spawn_and_wait("simex-rs-no-such-program", &[], None).unwrap_err();
        assert!(matches!(err, CalcError::Spawn { .. }));
    }
}
