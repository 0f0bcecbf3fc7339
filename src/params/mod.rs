//! 计算参数
//!
//! 所有计算器参数共享一组资源字段（[`ResourceParams`]），
//! 并由具体计算器通过 [`CalculatorParameters`] 提供各自的默认值与专属字段。

mod parameter_set;
mod resources;

pub use parameter_set::ParameterSet;
pub use resources::{CpusPerTask, RESOURCE_KEYS, ResourceParams};

/// 某一类计算器的参数。
pub trait CalculatorParameters {
    /// 调用方未指定时使用的每任务 CPU 数。
    fn default_cpus_per_task() -> CpusPerTask
    where
        Self: Sized;

    fn resources(&self) -> &ResourceParams;
    fn resources_mut(&mut self) -> &mut ResourceParams;
}
