//! 计算器接口
//!
//! 每种后端实现一次 [`Calculator`]：调用外部仿真（`backengine`）、
//! 声明数据契约，以及读写后端自有的结构化文件。

use super::IoPath;
use crate::error::Result;
use crate::params::CalculatorParameters;

/// 后端结果可能携带的退出状态。
pub trait BackendStatus {
    /// 后端未给出明确状态时为 `None`。
    fn status(&self) -> Option<i32>;
}

impl BackendStatus for () {
    fn status(&self) -> Option<i32> {
        None
    }
}

impl BackendStatus for i32 {
    fn status(&self) -> Option<i32> {
        Some(*self)
    }
}

impl<T: BackendStatus> BackendStatus for Option<T> {
    fn status(&self) -> Option<i32> {
        self.as_ref().and_then(BackendStatus::status)
    }
}

/// 绑定到某个外部仿真后端的参数与输入/输出路径。
pub trait Calculator {
    type Params: CalculatorParameters;
    /// 后端原生结果，由 [`Calculator::backengine`] 原样返回。
    type Output: BackendStatus;

    fn parameters(&self) -> &Self::Params;
    fn input_path(&self) -> &IoPath;
    fn output_path(&self) -> &IoPath;

    /// 调用后端并阻塞至其结束。
    fn backengine(&mut self) -> Result<Self::Output>;

    /// 该计算器读取的数据字段。
    fn expected_data(&self) -> &[&'static str];
    /// 该计算器产出的数据字段。
    fn provided_data(&self) -> &[&'static str];

    fn read_structured(&mut self) -> Result<()>;
    fn save_structured(&self) -> Result<()>;

    /// 运行一次后端并把结果映射为状态码（未给出状态时为 0）。
    fn run(&mut self) -> Result<i32> {
        let out = self.backengine()?;
        Ok(out.status().unwrap_or(0))
    }
}
