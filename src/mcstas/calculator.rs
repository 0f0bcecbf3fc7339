//! McStas 计算器：把参数绑定到 mcrun 后端。

use super::launcher::{InstrumentRunner, McrunLauncher, RunOutcome, RunRequest};
use super::parameters::McStasParameters;
use crate::calc::{BaseCalculator, Calculator, IoPath};
use crate::error::{CalcError, Result};
use crate::params::CalculatorParameters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "McStasRecord")]
pub struct McStasCalculator {
    #[serde(flatten)]
    base: BaseCalculator<McStasParameters>,
}

impl McStasCalculator {
    /// 输入路径始终为仪器所在目录。
    pub fn new(parameters: McStasParameters, output_path: impl Into<IoPath>) -> Result<Self> {
        let output_path = single_folder(output_path.into())?;
        let parameters = with_absolute_instrument(parameters)?;
        let input_path = IoPath::from(parameters.instrument().input_path());
        let base = BaseCalculator::new(parameters, Some(input_path), Some(output_path))?;
        Ok(Self { base })
    }

    /// 替换参数，并根据新仪器重新推导输入路径。
    pub fn set_parameters(&mut self, parameters: McStasParameters) -> Result<()> {
        let parameters = with_absolute_instrument(parameters)?;
        self.base
            .set_input_path(parameters.instrument().input_path())?;
        self.base.set_parameters(parameters);
        Ok(())
    }

    pub fn set_output_path(&mut self, output_path: impl Into<IoPath>) -> Result<()> {
        self.base.set_output_path(single_folder(output_path.into())?)
    }

    pub fn with_parameters(&self, parameters: McStasParameters) -> Result<Self> {
        let mut clone = self.clone();
        clone.set_parameters(parameters)?;
        Ok(clone)
    }

    pub fn with_output_path(&self, output_path: impl Into<IoPath>) -> Result<Self> {
        let mut clone = self.clone();
        clone.set_output_path(output_path)?;
        Ok(clone)
    }

    /// 通过 `runner` 运行仪器，而不是直接启动 `mcrun`。
    pub fn backengine_with(&self, runner: &mut dyn InstrumentRunner) -> Result<RunOutcome> {
        let params = self.base.parameters();
        let output_folder = self
            .base
            .output_path()
            .first()
            .ok_or(CalcError::MissingPath {
                which: "output_path",
            })?;
        let req = RunRequest {
            instrument: params.instrument(),
            pars: params.pars(),
            output_folder,
            mpi: params.mpi(),
            ncount: params.ncount(),
            increment_folder_name: params.increment_folder_name(),
            custom_flags: params.custom_flags(),
            forced_launch_command: params.resources().forced_launch_command(),
        };
        info!(
            instrument = params.instrument().name(),
            ncount = params.ncount(),
            mpi = params.mpi(),
            "▶️  运行 McStas 仪器"
        );
        let outcome = runner.run_full_instrument(&req)?;
        info!(
            exit_code = outcome.exit_code,
            folder = %outcome.output_folder.display(),
            "✅ McStas 运行结束"
        );
        Ok(outcome)
    }
}

/// 检查点中的仪器目录必须与工作目录无关。
fn with_absolute_instrument(mut parameters: McStasParameters) -> Result<McStasParameters> {
    let instrument = parameters.instrument().clone().into_absolute()?;
    parameters.set_instrument(instrument);
    Ok(parameters)
}

/// McStas 只写入一个输出目录。
fn single_folder(path: IoPath) -> Result<IoPath> {
    match path {
        IoPath::Many(mut ps) if ps.len() == 1 => Ok(IoPath::Single(ps.remove(0))),
        IoPath::Many(_) => Err(CalcError::range(
            "output_path",
            "McStas writes into a single output folder",
        )),
        single => Ok(single),
    }
}

impl Calculator for McStasCalculator {
    type Params = McStasParameters;
    type Output = RunOutcome;

    fn parameters(&self) -> &McStasParameters {
        self.base.parameters()
    }

    fn input_path(&self) -> &IoPath {
        self.base.input_path()
    }

    fn output_path(&self) -> &IoPath {
        self.base.output_path()
    }

    #[tracing::instrument(skip(self), fields(instrument = self.base.parameters().instrument().name()))]
    fn backengine(&mut self) -> Result<RunOutcome> {
        self.backengine_with(&mut McrunLauncher)
    }

    fn expected_data(&self) -> &[&'static str] {
        &[]
    }

    fn provided_data(&self) -> &[&'static str] {
        &["mccode.sim", "mccode.dat"]
    }

    fn read_structured(&mut self) -> Result<()> {
        debug!("McStas 输出由 mcrun 自行管理，无需读取");
        Ok(())
    }

    fn save_structured(&self) -> Result<()> {
        debug!("McStas 输出由 mcrun 自行管理，无需保存");
        Ok(())
    }
}

#[derive(Deserialize)]
struct McStasRecord {
    parameters: McStasParameters,
    #[serde(default)]
    output_path: Option<IoPath>,
}

impl TryFrom<McStasRecord> for McStasCalculator {
    type Error = CalcError;

    fn try_from(rec: McStasRecord) -> Result<Self> {
        let output_path = rec.output_path.ok_or(CalcError::MissingPath {
            which: "output_path",
        })?;
        Self::new(rec.parameters, output_path)
    }
}
