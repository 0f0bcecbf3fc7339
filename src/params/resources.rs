//! 资源参数：每个任务的节点/CPU/GPU 数量与强制启动命令。

use crate::check::{
    check_non_negative_integer, check_positive_integer, check_string, non_negative, positive,
};
use crate::error::{CalcError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// [`ResourceParams::from_map`] 读取的键。
pub const RESOURCE_KEYS: &[&str] = &[
    "nodes_per_task",
    "cpus_per_task",
    "gpus_per_task",
    "forced_launch_command",
    "forced_mpi_command",
];

const MAX_SENTINEL: &str = "MAX";

/// 每任务 CPU 数：正整数，或“使用全部可用 CPU”。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum CpusPerTask {
    Count(u64),
    Max,
}

impl CpusPerTask {
    /// 解析 `"MAX"` 或正整数字面量。
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw == MAX_SENTINEL {
            return Ok(Self::Max);
        }
        match raw.parse::<i64>() {
            Ok(n) => Ok(Self::Count(positive("cpus_per_task", n)?)),
            Err(_) => Err(sentinel_error()),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) if s == MAX_SENTINEL => Ok(Self::Max),
            Value::String(_) => Err(sentinel_error()),
            other => Ok(Self::Count(check_positive_integer(
                "cpus_per_task",
                Some(other),
                1,
            )?)),
        }
    }

    pub fn count(self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(n),
            Self::Max => None,
        }
    }
}

fn sentinel_error() -> CalcError {
    CalcError::range(
        "cpus_per_task",
        format!("must be a positive integer or string \"{MAX_SENTINEL}\""),
    )
}

impl TryFrom<Value> for CpusPerTask {
    type Error = CalcError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

impl From<CpusPerTask> for Value {
    fn from(cpus: CpusPerTask) -> Value {
        match cpus {
            CpusPerTask::Count(n) => Value::from(n),
            CpusPerTask::Max => Value::from(MAX_SENTINEL),
        }
    }
}

impl fmt::Display for CpusPerTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Max => f.write_str(MAX_SENTINEL),
        }
    }
}

/// 所有计算器参数共享的资源字段。
///
/// 字段只能经由带校验的 setter 修改，已存在的值总在合法范围内。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceParams {
    nodes_per_task: u64,
    cpus_per_task: CpusPerTask,
    gpus_per_task: u64,
    forced_launch_command: String,
}

impl ResourceParams {
    /// 全部取默认值：1 个节点、无 GPU、无强制命令、`cpus_default` 个 CPU。
    pub fn new(cpus_default: CpusPerTask) -> Self {
        Self {
            nodes_per_task: 1,
            cpus_per_task: cpus_default,
            gpus_per_task: 0,
            forced_launch_command: String::new(),
        }
    }

    /// 从键值表构建，缺省的键取默认值。
    pub fn from_map(map: &Map<String, Value>, cpus_default: CpusPerTask) -> Result<Self> {
        let cpus_per_task = match map.get("cpus_per_task").filter(|v| !v.is_null()) {
            Some(v) => CpusPerTask::from_value(v)?,
            None => cpus_default,
        };
        let forced = map
            .get("forced_launch_command")
            .filter(|v| !v.is_null())
            .or_else(|| map.get("forced_mpi_command"));
        Ok(Self {
            nodes_per_task: check_positive_integer("nodes_per_task", map.get("nodes_per_task"), 1)?,
            cpus_per_task,
            gpus_per_task: check_non_negative_integer(
                "gpus_per_task",
                map.get("gpus_per_task"),
                0,
            )?,
            forced_launch_command: check_launch_command(check_string(
                "forced_launch_command",
                forced,
                "",
            )?)?,
        })
    }

    /// 用未定型的值设置一个资源字段。
    ///
    /// `key` 不是资源字段时返回 `Ok(false)`。
    pub fn set_from_value(&mut self, key: &str, value: &Value) -> Result<bool> {
        match key {
            "nodes_per_task" => {
                self.nodes_per_task = check_positive_integer(key, Some(value), 1)?;
            }
            "cpus_per_task" => self.cpus_per_task = CpusPerTask::from_value(value)?,
            "gpus_per_task" => {
                self.gpus_per_task = check_non_negative_integer(key, Some(value), 0)?;
            }
            "forced_launch_command" | "forced_mpi_command" => {
                self.set_forced_launch_command(check_string(
                    "forced_launch_command",
                    Some(value),
                    "",
                )?)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn nodes_per_task(&self) -> u64 {
        self.nodes_per_task
    }

    pub fn set_nodes_per_task(&mut self, value: i64) -> Result<()> {
        self.nodes_per_task = positive("nodes_per_task", value)?;
        Ok(())
    }

    pub fn cpus_per_task(&self) -> CpusPerTask {
        self.cpus_per_task
    }

    pub fn set_cpus_per_task(&mut self, value: CpusPerTask) -> Result<()> {
        if let CpusPerTask::Count(0) = value {
            return Err(sentinel_error());
        }
        self.cpus_per_task = value;
        Ok(())
    }

    pub fn gpus_per_task(&self) -> u64 {
        self.gpus_per_task
    }

    pub fn set_gpus_per_task(&mut self, value: i64) -> Result<()> {
        self.gpus_per_task = non_negative("gpus_per_task", value)?;
        Ok(())
    }

    pub fn forced_launch_command(&self) -> &str {
        &self.forced_launch_command
    }

    /// 空字符串表示不强制；非空时必须包含程序名。
    pub fn set_forced_launch_command(&mut self, value: impl Into<String>) -> Result<()> {
        self.forced_launch_command = check_launch_command(value.into())?;
        Ok(())
    }
}

fn check_launch_command(value: String) -> Result<String> {
    if !value.is_empty() && value.trim().is_empty() {
        return Err(CalcError::range(
            "forced_launch_command",
            "must name a program or be empty",
        ));
    }
    Ok(value)
}
