//! 错误类型
//!
//! 所有校验、路径、检查点与后端调用失败都汇总为 [`CalcError`]，
//! 并按 [`ErrorClass`] 归为类型错误、取值错误或 I/O 错误三类。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 粗粒度的错误类别，供只关心类别的调用方使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 值或读取到的对象类型不符。
    Type,
    /// 类型正确但取值越界。
    Value,
    /// 路径缺失或无效，或文件无法读写。
    Io,
}

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("{field}: expected {expected}, found {found}")]
    Type {
        field: String,
        expected: String,
        found: String,
    },

    #[error("{field}: {reason}")]
    Range { field: String, reason: String },

    #[error("the parameter '{which}' must be a valid path or list of paths")]
    MissingPath { which: &'static str },

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read checkpoint {}: {reason}", path.display())]
    CorruptCheckpoint { path: PathBuf, reason: String },

    #[error("{} does not hold a calculator checkpoint: {reason}", path.display())]
    NotACalculator { path: PathBuf, reason: String },

    #[error("{}: unsupported checkpoint schema version {found} (supported: {supported})", path.display())]
    UnsupportedCheckpoint {
        path: PathBuf,
        found: u64,
        supported: u32,
    },

    #[error("{}: invalid {kind} calculator: {reason}", path.display())]
    InvalidCheckpoint {
        path: PathBuf,
        kind: String,
        reason: String,
    },

    #[error("{}: expected a {expected} calculator, found {found}", path.display())]
    KindMismatch {
        path: PathBuf,
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program}: {reason}")]
    Backend { program: String, reason: String },
}

impl CalcError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Type { .. }
            | Self::NotACalculator { .. }
            | Self::UnsupportedCheckpoint { .. }
            | Self::InvalidCheckpoint { .. }
            | Self::KindMismatch { .. } => ErrorClass::Type,
            Self::Range { .. } | Self::Backend { .. } => ErrorClass::Value,
            Self::MissingPath { .. }
            | Self::Io { .. }
            | Self::CorruptCheckpoint { .. }
            | Self::Spawn { .. } => ErrorClass::Io,
        }
    }

    pub(crate) fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::Type {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Range {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = CalcError> = std::result::Result<T, E>;
