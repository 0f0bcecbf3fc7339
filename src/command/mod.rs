//! 外部命令计算器
//!
//! 适用于后端本身就是一个可执行程序的场景：
//! 参数中的 `{input}` / `{output}` 占位符会被替换为计算器的输入/输出路径，
//! 非空的 `forced_launch_command` 作为启动前缀（例如 `mpirun -np 4`）。

use crate::calc::{BackendStatus, BaseCalculator, Calculator, IoPath};
use crate::check::{check_string, check_string_list};
use crate::error::{CalcError, Result};
use crate::launch::{spawn_and_wait, split_launch_command};
use crate::params::{CalculatorParameters, CpusPerTask, ResourceParams};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct CommandParameters {
    #[serde(flatten)]
    resources: ResourceParams,
    program: String,
    args: Vec<String>,
}

impl CommandParameters {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Result<Self> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(CalcError::range("program", "must not be empty"));
        }
        Ok(Self {
            resources: ResourceParams::new(Self::default_cpus_per_task()),
            program,
            args,
        })
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let program = check_string("program", map.get("program"), "")?;
        let args = check_string_list("args", map.get("args"))?;
        let mut params = Self::new(program, args)?;
        params.resources = ResourceParams::from_map(map, Self::default_cpus_per_task())?;
        Ok(params)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl TryFrom<Map<String, Value>> for CommandParameters {
    type Error = CalcError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        Self::from_map(&map)
    }
}

impl CalculatorParameters for CommandParameters {
    fn default_cpus_per_task() -> CpusPerTask {
        CpusPerTask::Count(1)
    }

    fn resources(&self) -> &ResourceParams {
        &self.resources
    }

    fn resources_mut(&mut self) -> &mut ResourceParams {
        &mut self.resources
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub exit_code: i32,
}

impl BackendStatus for CommandOutcome {
    fn status(&self) -> Option<i32> {
        Some(self.exit_code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandCalculator {
    base: BaseCalculator<CommandParameters>,
}

impl CommandCalculator {
    pub fn new(
        parameters: CommandParameters,
        input_path: impl Into<IoPath>,
        output_path: impl Into<IoPath>,
    ) -> Result<Self> {
        let base = BaseCalculator::new(
            parameters,
            Some(input_path.into()),
            Some(output_path.into()),
        )?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &BaseCalculator<CommandParameters> {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseCalculator<CommandParameters> {
        &mut self.base
    }

    /// 替换占位符并加上启动前缀后的程序与参数。
    pub fn command_line(&self) -> (String, Vec<String>) {
        let params = self.base.parameters();
        let input = join_paths(self.base.input_path());
        let output = join_paths(self.base.output_path());
        let substituted = params.args.iter().map(|arg| {
            arg.replace(INPUT_PLACEHOLDER, &input)
                .replace(OUTPUT_PLACEHOLDER, &output)
        });

        match split_launch_command(params.resources.forced_launch_command()) {
            Some((launcher, mut args)) => {
                args.push(params.program.clone());
                args.extend(substituted);
                (launcher, args)
            }
            None => (params.program.clone(), substituted.collect()),
        }
    }
}

fn join_paths(path: &IoPath) -> String {
    path.paths()
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Calculator for CommandCalculator {
    type Params = CommandParameters;
    type Output = CommandOutcome;

    fn parameters(&self) -> &CommandParameters {
        self.base.parameters()
    }

    fn input_path(&self) -> &IoPath {
        self.base.input_path()
    }

    fn output_path(&self) -> &IoPath {
        self.base.output_path()
    }

    #[tracing::instrument(skip(self), fields(program = self.base.parameters().program()))]
    fn backengine(&mut self) -> Result<CommandOutcome> {
        let (program, args) = self.command_line();
        let exit_code = spawn_and_wait(&program, &args, None)?;
        Ok(CommandOutcome { exit_code })
    }

    fn expected_data(&self) -> &[&'static str] {
        &[]
    }

    fn provided_data(&self) -> &[&'static str] {
        &[]
    }

    fn read_structured(&mut self) -> Result<()> {
        debug!("外部命令的输出格式由命令自身决定");
        Ok(())
    }

    fn save_structured(&self) -> Result<()> {
        debug!("外部命令的输出格式由命令自身决定");
        Ok(())
    }
}
