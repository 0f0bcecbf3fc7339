//! Parameters plus validated I/O paths, composed into every calculator.

use super::io_path::{IoPath, check_io};
use crate::error::{CalcError, Result};
use crate::params::CalculatorParameters;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseCalculator<P> {
    parameters: P,
    input_path: IoPath,
    output_path: IoPath,
}

impl<P: CalculatorParameters> BaseCalculator<P> {
    /// 任一路径缺省或为空时返回 I/O 错误。
    pub fn new(
        parameters: P,
        input_path: Option<IoPath>,
        output_path: Option<IoPath>,
    ) -> Result<Self> {
        let (input_path, output_path) = check_io(input_path, output_path)?;
        Ok(Self {
            parameters,
            input_path,
            output_path,
        })
    }

    pub fn parameters(&self) -> &P {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut P {
        &mut self.parameters
    }

    pub fn set_parameters(&mut self, parameters: P) {
        self.parameters = parameters;
    }

    pub fn input_path(&self) -> &IoPath {
        &self.input_path
    }

    pub fn set_input_path(&mut self, path: impl Into<IoPath>) -> Result<()> {
        let path = path.into();
        if path.is_empty() {
            return Err(CalcError::MissingPath { which: "input_path" });
        }
        self.input_path = path.absolute()?;
        Ok(())
    }

    pub fn output_path(&self) -> &IoPath {
        &self.output_path
    }

    pub fn set_output_path(&mut self, path: impl Into<IoPath>) -> Result<()> {
        let path = path.into();
        if path.is_empty() {
            return Err(CalcError::MissingPath {
                which: "output_path",
            });
        }
        self.output_path = path;
        Ok(())
    }
}

impl<P: CalculatorParameters + Default> BaseCalculator<P> {
    /// 同 [`BaseCalculator::new`]，参数缺省时使用 `P::default()`。
    pub fn from_optional(
        parameters: Option<P>,
        input_path: Option<IoPath>,
        output_path: Option<IoPath>,
    ) -> Result<Self> {
        Self::new(parameters.unwrap_or_default(), input_path, output_path)
    }
}

impl<P: CalculatorParameters + Clone> BaseCalculator<P> {
    /// 替换参数后的副本。
    pub fn with_parameters(&self, parameters: P) -> Self {
        Self {
            parameters,
            ..self.clone()
        }
    }

    pub fn with_input_path(&self, path: impl Into<IoPath>) -> Result<Self> {
        let mut clone = self.clone();
        clone.set_input_path(path)?;
        Ok(clone)
    }

    pub fn with_output_path(&self, path: impl Into<IoPath>) -> Result<Self> {
        let mut clone = self.clone();
        clone.set_output_path(path)?;
        Ok(clone)
    }
}

#[derive(Deserialize)]
struct BaseRecord<P> {
    parameters: P,
    #[serde(default)]
    input_path: Option<IoPath>,
    #[serde(default)]
    output_path: Option<IoPath>,
}

impl<'de, P> Deserialize<'de> for BaseCalculator<P>
where
    P: CalculatorParameters + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rec = BaseRecord::<P>::deserialize(deserializer)?;
        Self::new(rec.parameters, rec.input_path, rec.output_path)
            .map_err(serde::de::Error::custom)
    }
}
