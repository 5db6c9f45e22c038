//! Task Definition
//!
//! A scheduler task definition kept as an open JSON object. The engine only
//! interprets the handful of fields named in [`crate::constants::fields`];
//! everything else, including the caller-defined payload, is opaque.

use crate::constants::fields;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDefinition(Map<String, Value>);

impl TaskDefinition {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build from an arbitrary JSON value; anything but an object yields an
    /// empty definition
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn created(&self) -> Option<&str> {
        self.get_str(fields::CREATED)
    }

    pub fn task_group_id(&self) -> Option<&str> {
        self.get_str(fields::TASK_GROUP_ID)
    }

    pub fn set_task_group_id(&mut self, group_id: &str) {
        self.set(fields::TASK_GROUP_ID, Value::String(group_id.to_string()));
    }

    /// Dependency identifiers, ignoring any non-string entries
    pub fn dependencies(&self) -> Vec<String> {
        self.0
            .get(fields::DEPENDENCIES)
            .and_then(Value::as_array)
            .map(|deps| {
                deps.iter()
                    .filter_map(|d| d.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<String>) {
        self.set(
            fields::DEPENDENCIES,
            Value::Array(dependencies.into_iter().map(Value::String).collect()),
        );
    }

    /// Replace every `old_id` entry in the dependency list with `new_id`.
    ///
    /// Returns the number of entries replaced.
    pub fn replace_dependency(&mut self, old_id: &str, new_id: &str) -> usize {
        let Some(Value::Array(deps)) = self.0.get_mut(fields::DEPENDENCIES) else {
            return 0;
        };

        let mut replaced = 0;
        for dep in deps.iter_mut() {
            if dep.as_str() == Some(old_id) {
                *dep = Value::String(new_id.to_string());
                replaced += 1;
            }
        }
        replaced
    }
}

impl From<Map<String, Value>> for TaskDefinition {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<TaskDefinition> for Value {
    fn from(task: TaskDefinition) -> Self {
        task.into_value()
    }
}
