//! 检查点文件格式
//!
//! 检查点是带版本号与类型标签的 JSON：
//! `{ "schema_version": 1, "kind": "mcstas", "calculator": { … } }`。
//! 读取时先校验外壳，再按 `kind` 解码计算器本体（解码过程会重新执行全部字段校验）。

use crate::calc::Calculator;
use crate::command::CommandCalculator;
use crate::error::{CalcError, Result};
use crate::mcstas::McStasCalculator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

/// 检查点可保存的全部计算器类型。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "calculator", rename_all = "snake_case")]
pub enum AnyCalculator {
    Mcstas(McStasCalculator),
    Command(CommandCalculator),
}

impl AnyCalculator {
    pub const KINDS: &'static [&'static str] = &["mcstas", "command"];

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mcstas(_) => "mcstas",
            Self::Command(_) => "command",
        }
    }

    /// 运行一次内部的计算器，见 [`Calculator::run`]。
    pub fn run(&mut self) -> Result<i32> {
        match self {
            Self::Mcstas(calc) => calc.run(),
            Self::Command(calc) => calc.run(),
        }
    }
}

#[derive(Serialize)]
struct CheckpointFile<'a> {
    schema_version: u32,
    #[serde(flatten)]
    calculator: &'a AnyCalculator,
}

/// 把 `calculator` 以格式化 JSON 检查点写入 `path`。
pub fn dump_any(calculator: &AnyCalculator, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = CheckpointFile {
        schema_version: CHECKPOINT_SCHEMA_VERSION,
        calculator,
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| CalcError::io(path, io::Error::other(e)))?;
    fs::write(path, json).map_err(|e| CalcError::io(path, e))?;
    info!(kind = calculator.kind(), path = %path.display(), "💾 写出检查点");
    Ok(())
}

/// 读取任意类型的检查点。
pub fn load_any(path: impl AsRef<Path>) -> Result<AnyCalculator> {
    let path = path.as_ref();
    let raw = fs::read(path).map_err(|e| CalcError::io(path, e))?;
    let value: Value =
        serde_json::from_slice(&raw).map_err(|e| CalcError::CorruptCheckpoint {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let not_a_calculator = |reason: &str| CalcError::NotACalculator {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    let obj = value
        .as_object()
        .ok_or_else(|| not_a_calculator("top level is not an object"))?;
    let version = obj
        .get("schema_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| not_a_calculator("missing schema_version"))?;
    if version != u64::from(CHECKPOINT_SCHEMA_VERSION) {
        return Err(CalcError::UnsupportedCheckpoint {
            path: path.to_path_buf(),
            found: version,
            supported: CHECKPOINT_SCHEMA_VERSION,
        });
    }
    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| not_a_calculator("missing calculator kind"))?;
    if !AnyCalculator::KINDS.contains(&kind) {
        return Err(not_a_calculator(&format!("unknown calculator kind '{kind}'")));
    }
    let body = obj
        .get("calculator")
        .ok_or_else(|| not_a_calculator("missing calculator body"))?;

    let invalid = |e: serde_json::Error| CalcError::InvalidCheckpoint {
        path: path.to_path_buf(),
        kind: kind.to_string(),
        reason: e.to_string(),
    };
    let calculator = match kind {
        "mcstas" => AnyCalculator::Mcstas(serde_json::from_value(body.clone()).map_err(invalid)?),
        _ => AnyCalculator::Command(serde_json::from_value(body.clone()).map_err(invalid)?),
    };
    debug!(kind, path = %path.display(), "读取检查点");
    Ok(calculator)
}

/// 具体计算器类型的整体检查点读写。
pub trait Checkpoint: Sized {
    const KIND: &'static str;

    fn to_any(&self) -> AnyCalculator;

    /// 类型不符时原样交还计算器。
    fn from_any(any: AnyCalculator) -> std::result::Result<Self, AnyCalculator>;

    fn dump_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        dump_any(&self.to_any(), path)
    }

    /// 文件中是另一种计算器时返回类型错误。
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_any(load_any(path)?).map_err(|other| CalcError::KindMismatch {
            path: path.to_path_buf(),
            expected: Self::KIND,
            found: other.kind(),
        })
    }
}

impl Checkpoint for McStasCalculator {
    const KIND: &'static str = "mcstas";

    fn to_any(&self) -> AnyCalculator {
        AnyCalculator::Mcstas(self.clone())
    }

    fn from_any(any: AnyCalculator) -> std::result::Result<Self, AnyCalculator> {
        match any {
            AnyCalculator::Mcstas(calc) => Ok(calc),
            other => Err(other),
        }
    }
}

impl Checkpoint for CommandCalculator {
    const KIND: &'static str = "command";

    fn to_any(&self) -> AnyCalculator {
        AnyCalculator::Command(self.clone())
    }

    fn from_any(any: AnyCalculator) -> std::result::Result<Self, AnyCalculator> {
        match any {
            AnyCalculator::Command(calc) => Ok(calc),
            other => Err(other),
        }
    }
}
