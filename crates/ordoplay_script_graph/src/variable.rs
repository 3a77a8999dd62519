// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph-scoped named variables.

use crate::data_object::DataObject;
use crate::types::TypeError;
use crate::uid::VariableId;
use crate::value::ScriptType;

/// A named value owned by a graph, with the default it resets to
#[derive(Debug)]
pub struct Variable {
    id: VariableId,
    name: String,
    data: DataObject,
    default: DataObject,
}

impl Variable {
    /// Create a variable whose current value starts as a copy of `default`
    pub fn new(name: impl Into<String>, default: DataObject) -> Self {
        Self {
            id: VariableId::mint(),
            name: name.into(),
            data: default.clone(),
            default,
        }
    }

    /// Variable ID
    pub fn id(&self) -> VariableId {
        self.id
    }

    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value
    pub fn data(&self) -> &DataObject {
        &self.data
    }

    /// Default value
    pub fn default_data(&self) -> &DataObject {
        &self.default
    }

    /// Read the current value as `T`
    pub fn get<T: ScriptType>(&self) -> Result<T, TypeError> {
        self.data.get()
    }

    /// Overwrite the current value
    pub fn set<T: ScriptType>(&mut self, value: T) -> Result<(), TypeError> {
        self.data.set(value)
    }

    pub(crate) fn data_mut(&mut self) -> &mut DataObject {
        &mut self.data
    }

    /// Restore the default value
    pub fn reset(&mut self) {
        self.data.assign_from(&self.default);
    }
}
