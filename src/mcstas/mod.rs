//! McStas 中子光线追踪后端
//!
//! 此模块包含仪器引用、McStas 参数、mcrun 启动器与计算器本身。

mod calculator;
mod instrument;
mod launcher;
mod parameters;

pub use calculator::McStasCalculator;
pub use instrument::Instrument;
pub use launcher::{
    InstrumentRunner, MCRUN, McrunLauncher, RunOutcome, RunRequest, command_line,
    resolve_output_folder,
};
pub use parameters::{DEFAULT_MPI, DEFAULT_NCOUNT, McStasParameters};
