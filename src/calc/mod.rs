//! 计算器核心模块
//!
//! 此模块包含计算器接口、参数与路径的组合体，以及路径校验。

mod base;
mod calculator;
mod io_path;

pub use base::BaseCalculator;
pub use calculator::{BackendStatus, Calculator};
pub use io_path::{IoPath, check_io};
