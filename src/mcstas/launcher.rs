//! mcrun 启动器
//!
//! 把 McStas 参数翻译成一次 `mcrun` 调用：
//! `mcrun -c -n <ncount> -d <目录> --mpi=<N> [附加参数…] <仪器文件> <参数>=<值>…`

use super::instrument::Instrument;
use crate::calc::BackendStatus;
use crate::error::{CalcError, Result};
use crate::launch::{spawn_and_wait, split_launch_command};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MCRUN: &str = "mcrun";

/// McStas 监视器与汇总数据文件的扩展名。
const DATA_EXTENSIONS: &[&str] = &["dat", "sim"];

/// 一次 `mcrun` 调用所需的全部参数。
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub instrument: &'a Instrument,
    pub pars: &'a BTreeMap<String, Value>,
    pub output_folder: &'a Path,
    pub mpi: u64,
    pub ncount: f64,
    pub increment_folder_name: bool,
    pub custom_flags: &'a str,
    pub forced_launch_command: &'a str,
}

/// 启动器报告的单次仪器运行结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// 实际写入的目录（已考虑自动编号）。
    pub output_folder: PathBuf,
    pub exit_code: i32,
    /// 运行结束后 `output_folder` 中的数据文件，已排序。
    #[serde(default)]
    pub data_files: Vec<PathBuf>,
}

impl BackendStatus for RunOutcome {
    fn status(&self) -> Option<i32> {
        Some(self.exit_code)
    }
}

/// 运行一次完整的仪器仿真。
pub trait InstrumentRunner {
    fn run_full_instrument(&mut self, req: &RunRequest<'_>) -> Result<RunOutcome>;
}

/// 启动 `mcrun`（或强制启动命令）并等待其结束。
#[derive(Debug, Default, Clone, Copy)]
pub struct McrunLauncher;

impl InstrumentRunner for McrunLauncher {
    fn run_full_instrument(&mut self, req: &RunRequest<'_>) -> Result<RunOutcome> {
        let folder = resolve_output_folder(req.output_folder, req.increment_folder_name);
        let (program, args) = command_line(req, &folder);
        let exit_code = spawn_and_wait(&program, &args, None)?;
        let data_files = list_data_files(&folder)?;
        debug!(files = data_files.len(), folder = %folder.display(), "收集输出数据文件");
        Ok(RunOutcome {
            output_folder: folder,
            exit_code,
            data_files,
        })
    }
}

/// 选择输出目录。
///
/// `increment` 为真且 `requested` 已存在时，改用从 0 开始第一个不存在的
/// `<requested>_<n>`。
pub fn resolve_output_folder(requested: &Path, increment: bool) -> PathBuf {
    if !increment || !requested.exists() {
        return requested.to_path_buf();
    }
    let base = requested.as_os_str().to_string_lossy().into_owned();
    (0_u64..)
        .map(|n| PathBuf::from(format!("{base}_{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| requested.to_path_buf())
}

/// 写入 `folder` 的一次运行对应的程序与参数列表。
pub fn command_line(req: &RunRequest<'_>, folder: &Path) -> (String, Vec<String>) {
    let (program, mut args) = split_launch_command(req.forced_launch_command)
        .unwrap_or_else(|| (MCRUN.to_string(), Vec::new()));

    args.push("-c".to_string());
    args.push("-n".to_string());
    args.push(format_ncount(req.ncount));
    args.push("-d".to_string());
    args.push(folder.display().to_string());
    args.push(format!("--mpi={}", req.mpi));
    args.extend(req.custom_flags.split_whitespace().map(str::to_owned));
    args.push(req.instrument.instr_file().display().to_string());
    args.extend(
        req.pars
            .iter()
            .map(|(name, value)| format!("{name}={}", format_par(value))),
    );
    (program, args)
}

/// 整数光线数不带小数部分。
fn format_ncount(ncount: f64) -> String {
    if ncount.fract() == 0.0 && ncount.abs() < 1e15 {
        format!("{}", ncount as u64)
    } else {
        format!("{ncount}")
    }
}

fn format_par(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list_data_files(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(folder).map_err(|e| CalcError::io(folder, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CalcError::io(folder, e))?.path();
        let is_data = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| DATA_EXTENSIONS.contains(&ext));
        if is_data {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
