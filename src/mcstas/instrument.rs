//! McStas 仪器引用：仪器名与其所在目录。

use crate::check::{check_object, check_string};
use crate::error::{CalcError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// 仪器定义，对应文件 `<input_path>/<name>.instr`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Instrument {
    name: String,
    input_path: PathBuf,
}

impl Instrument {
    /// 位于当前目录的仪器。
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_name(&name)?;
        Ok(Self {
            name,
            input_path: PathBuf::from("."),
        })
    }

    pub fn with_input_path(mut self, input_path: impl Into<PathBuf>) -> Self {
        self.input_path = input_path.into();
        self
    }

    /// 解码 `{"name": ..., "input_path": ...}`。
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        if value.is_none_or(Value::is_null) {
            return Err(CalcError::range("instrument", "an instrument must be defined"));
        }
        let map = check_object("instrument", value)?;
        let name = check_string("instrument.name", map.get("name"), "")?;
        let input_path = check_string("instrument.input_path", map.get("input_path"), ".")?;
        Ok(Self::new(name)?.with_input_path(input_path))
    }

    /// 目录改为绝对路径（仅做词法处理，不检查是否存在）。
    pub fn into_absolute(mut self) -> Result<Self> {
        let abs = std::path::absolute(&self.input_path)
            .map_err(|e| CalcError::io(&self.input_path, e))?;
        self.input_path = abs;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn instr_file(&self) -> PathBuf {
        self.input_path.join(format!("{}.instr", self.name))
    }
}

/// McStas 仪器名必须是 C 标识符。
fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(CalcError::range(
            "instrument.name",
            format!("'{name}' is not a valid instrument name"),
        ));
    }
    Ok(())
}

impl TryFrom<Value> for Instrument {
    type Error = CalcError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(Some(&value))
    }
}
