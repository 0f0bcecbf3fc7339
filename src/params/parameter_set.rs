//! Free-form parameter set used when a calculator is built without parameters.

use super::resources::{CpusPerTask, RESOURCE_KEYS, ResourceParams};
use super::CalculatorParameters;
use crate::error::{CalcError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ParameterSet {
    #[serde(flatten)]
    resources: ResourceParams,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            resources: ResourceParams::new(Self::default_cpus_per_task()),
            fields: BTreeMap::new(),
        }
    }
}

impl ParameterSet {
    /// 资源字段经过校验，其余键原样保留。
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let resources = ResourceParams::from_map(map, Self::default_cpus_per_task())?;
        let fields = map
            .iter()
            .filter(|(k, _)| !RESOURCE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self { resources, fields })
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(CalcError::range("field", "name must not be empty"));
        }
        if !self.resources.set_from_value(&name, &value)? {
            self.fields.insert(name, value);
        }
        Ok(())
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }
}

impl TryFrom<Map<String, Value>> for ParameterSet {
    type Error = CalcError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        Self::from_map(&map)
    }
}

impl CalculatorParameters for ParameterSet {
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
