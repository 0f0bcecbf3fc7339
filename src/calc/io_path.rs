//! 输入/输出路径：单个路径或路径列表。

use crate::error::{CalcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// 单个路径或路径列表，序列化为 JSON 字符串或数组。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IoPath {
    Single(PathBuf),
    Many(Vec<PathBuf>),
}

impl IoPath {
    /// 没有路径或其中任一路径为空时为真。
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(p) => p.as_os_str().is_empty(),
            Self::Many(ps) => ps.is_empty() || ps.iter().any(|p| p.as_os_str().is_empty()),
        }
    }

    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::Single(p) => vec![p.as_path()],
            Self::Many(ps) => ps.iter().map(PathBuf::as_path).collect(),
        }
    }

    /// 第一个路径；对 [`IoPath::Single`] 即唯一路径。
    pub fn first(&self) -> Option<&Path> {
        self.paths().into_iter().next()
    }

    /// 各路径的词法绝对形式，不检查是否存在。
    pub fn absolute(&self) -> Result<IoPath> {
        let abs = |p: &PathBuf| std::path::absolute(p).map_err(|e| CalcError::io(p, e));
        Ok(match self {
            Self::Single(p) => Self::Single(abs(p)?),
            Self::Many(ps) => Self::Many(ps.iter().map(abs).collect::<Result<_>>()?),
        })
    }

    pub fn is_absolute(&self) -> bool {
        self.paths().iter().all(|p| p.is_absolute())
    }
}

impl From<&str> for IoPath {
    fn from(p: &str) -> Self {
        Self::Single(PathBuf::from(p))
    }
}

impl From<String> for IoPath {
    fn from(p: String) -> Self {
        Self::Single(PathBuf::from(p))
    }
}

impl From<&Path> for IoPath {
    fn from(p: &Path) -> Self {
        Self::Single(p.to_path_buf())
    }
}

impl From<PathBuf> for IoPath {
    fn from(p: PathBuf) -> Self {
        Self::Single(p)
    }
}

impl<T: Into<PathBuf>> From<Vec<T>> for IoPath {
    fn from(ps: Vec<T>) -> Self {
        Self::Many(ps.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for IoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

/// 校验（输入，输出）路径对。
///
/// 两者均必填且非空；输入转为绝对路径，输出保持原样。
pub fn check_io(input: Option<IoPath>, output: Option<IoPath>) -> Result<(IoPath, IoPath)> {
    let input = input
        .filter(|p| !p.is_empty())
        .ok_or(CalcError::MissingPath { which: "input_path" })?;
    let output = output
        .filter(|p| !p.is_empty())
        .ok_or(CalcError::MissingPath {
            which: "output_path",
        })?;
    Ok((input.absolute()?, output))
}
