//! McStas 运行参数
//!
//! 除通用资源字段外，还包括仪器、运行时参数表、光线数、MPI 进程数、
//! 输出目录命名方式与附加的 mcrun 参数。

use super::instrument::Instrument;
use crate::check::{
    ValueKind, check_bool, check_instance, check_number, check_object, check_positive_integer,
    check_string, positive,
};
use crate::error::{CalcError, Result};
use crate::params::{CalculatorParameters, CpusPerTask, RESOURCE_KEYS, ResourceParams};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

pub const DEFAULT_NCOUNT: f64 = 1e6;
pub const DEFAULT_MPI: u64 = 1;

const MCSTAS_KEYS: &[&str] = &[
    "instrument",
    "pars",
    "mpi",
    "ncount",
    "increment_folder_name",
    "custom_flags",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct McStasParameters {
    #[serde(flatten)]
    resources: ResourceParams,
    instrument: Instrument,
    pars: BTreeMap<String, Value>,
    mpi: u64,
    ncount: f64,
    increment_folder_name: bool,
    custom_flags: String,
}

impl McStasParameters {
    pub fn new(instrument: Instrument, pars: BTreeMap<String, Value>) -> Result<Self> {
        for (name, value) in &pars {
            check_par(name, value)?;
        }
        Ok(Self {
            resources: ResourceParams::new(Self::default_cpus_per_task()),
            instrument,
            pars,
            mpi: DEFAULT_MPI,
            ncount: DEFAULT_NCOUNT,
            increment_folder_name: false,
            custom_flags: String::new(),
        })
    }

    /// 从键值表构建（参数文件与检查点中的格式）。
    ///
    /// `instrument` 与 `pars` 必填；未知键仅告警后忽略。
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let instrument = Instrument::from_value(map.get("instrument"))?;
        let pars = match map.get("pars").filter(|v| !v.is_null()) {
            Some(v) => check_object("pars", Some(v))?.into_iter().collect(),
            None => return Err(CalcError::range("pars", "pars must be defined")),
        };
        let mut params = Self::new(instrument, pars)?;
        params.resources = ResourceParams::from_map(map, Self::default_cpus_per_task())?;
        params.mpi = check_positive_integer("mpi", map.get("mpi"), DEFAULT_MPI)?;
        params.set_ncount(check_number("ncount", map.get("ncount"), DEFAULT_NCOUNT)?)?;
        params.increment_folder_name =
            check_bool("increment_folder_name", map.get("increment_folder_name"), false)?;
        params.custom_flags = check_string("custom_flags", map.get("custom_flags"), "")?;

        for key in map.keys() {
            if !MCSTAS_KEYS.contains(&key.as_str()) && !RESOURCE_KEYS.contains(&key.as_str()) {
                warn!(key = %key, "忽略未知的 McStas 参数");
            }
        }
        Ok(params)
    }

    /// 对已有参数应用一条 `key = value` 覆盖。
    pub fn set_from_value(&mut self, key: &str, value: &Value) -> Result<()> {
        if self.resources.set_from_value(key, value)? {
            return Ok(());
        }
        match key {
            "instrument" => self.instrument = Instrument::from_value(Some(value))?,
            "pars" => self.set_pars(check_object("pars", Some(value))?.into_iter().collect())?,
            "mpi" => self.mpi = check_positive_integer("mpi", Some(value), DEFAULT_MPI)?,
            "ncount" => self.set_ncount(check_number("ncount", Some(value), DEFAULT_NCOUNT)?)?,
            "increment_folder_name" => {
                self.increment_folder_name = check_bool(key, Some(value), false)?;
            }
            "custom_flags" => self.custom_flags = check_string(key, Some(value), "")?,
            _ => self.set_par(key, value.clone())?,
        }
        Ok(())
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
    }

    pub fn pars(&self) -> &BTreeMap<String, Value> {
        &self.pars
    }

    pub fn set_pars(&mut self, pars: BTreeMap<String, Value>) -> Result<()> {
        for (name, value) in &pars {
            check_par(name, value)?;
        }
        self.pars = pars;
        Ok(())
    }

    /// 设置一个仪器运行时参数。
    pub fn set_par(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        check_par(&name, &value)?;
        self.pars.insert(name, value);
        Ok(())
    }

    pub fn mpi(&self) -> u64 {
        self.mpi
    }

    pub fn set_mpi(&mut self, mpi: i64) -> Result<()> {
        self.mpi = positive("mpi", mpi)?;
        Ok(())
    }

    pub fn ncount(&self) -> f64 {
        self.ncount
    }

    pub fn set_ncount(&mut self, ncount: f64) -> Result<()> {
        if !ncount.is_finite() || ncount <= 0.0 {
            return Err(CalcError::range(
                "ncount",
                format!("number of rays must be a positive number, got {ncount}"),
            ));
        }
        self.ncount = ncount;
        Ok(())
    }

    pub fn increment_folder_name(&self) -> bool {
        self.increment_folder_name
    }

    pub fn set_increment_folder_name(&mut self, increment: bool) {
        self.increment_folder_name = increment;
    }

    pub fn custom_flags(&self) -> &str {
        &self.custom_flags
    }

    pub fn set_custom_flags(&mut self, flags: impl Into<String>) {
        self.custom_flags = flags.into();
    }
}

/// 运行时参数名非空，值为数字或字符串。
fn check_par(name: &str, value: &Value) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CalcError::range("pars", "parameter names must not be empty"));
    }
    check_instance(
        &format!("pars.{name}"),
        Some(value),
        &[ValueKind::Integer, ValueKind::Float, ValueKind::String],
        None,
    )?;
    Ok(())
}

impl TryFrom<Map<String, Value>> for McStasParameters {
    type Error = CalcError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        Self::from_map(&map)
    }
}

impl CalculatorParameters for McStasParameters {
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
