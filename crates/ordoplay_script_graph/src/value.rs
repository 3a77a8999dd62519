// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values that flow through pins and live in variables.
//!
//! The common kinds (bool, int, float, text) are stored inline in [`Value`].
//! Anything else is boxed behind [`CustomValue`], which is implemented for every
//! `Clone + PartialEq + Debug` type, so user types only need to opt in through
//! [`ScriptType`].

use crate::types::TypeKey;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Object-safe view of a user value stored in [`Value::Custom`]
pub trait CustomValue: Any + Send + Sync + fmt::Debug {
    /// Deep copy into a new box
    fn clone_box(&self) -> Box<dyn CustomValue>;
    /// Access as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;
    /// Compare against another boxed value
    fn eq_dyn(&self, other: &dyn CustomValue) -> bool;
    /// Full Rust name of the concrete type
    fn type_name(&self) -> &'static str;
}

impl<T> CustomValue for T
where
    T: Any + Clone + PartialEq + Send + Sync + fmt::Debug,
{
    fn clone_box(&self) -> Box<dyn CustomValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn CustomValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A type-erased script value
#[derive(Debug)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 32-bit float
    Float(f32),
    /// Text
    Text(String),
    /// Registered user type
    Custom(Box<dyn CustomValue>),
}

impl Value {
    /// Key of the concrete type held by this value
    pub fn type_key(&self) -> TypeKey {
        match self {
            Self::Bool(_) => TypeKey::of::<bool>(),
            Self::Int(_) => TypeKey::of::<i32>(),
            Self::Float(_) => TypeKey::of::<f32>(),
            Self::Text(_) => TypeKey::of::<String>(),
            Self::Custom(value) => TypeKey::from_type_id(value.as_any().type_id()),
        }
    }

    /// Full Rust name of the concrete type held by this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => std::any::type_name::<bool>(),
            Self::Int(_) => std::any::type_name::<i32>(),
            Self::Float(_) => std::any::type_name::<f32>(),
            Self::Text(_) => std::any::type_name::<String>(),
            Self::Custom(value) => value.type_name(),
        }
    }

    /// Try to read this value as `T`
    pub fn get<T: ScriptType>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Self::Bool(v) => Self::Bool(*v),
            Self::Int(v) => Self::Int(*v),
            Self::Float(v) => Self::Float(*v),
            Self::Text(v) => Self::Text(v.clone()),
            Self::Custom(v) => Self::Custom(v.clone_box()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a.eq_dyn(b.as_ref()),
            _ => false,
        }
    }
}

/// A Rust type that can be stored in pins and variables.
///
/// Built-in kinds map onto the inline [`Value`] variants. For a user type an
/// empty `impl ScriptType for MyType {}` is enough; the defaults box it into
/// [`Value::Custom`].
pub trait ScriptType: Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Wrap into a [`Value`]
    fn into_value(self) -> Value {
        Value::Custom(Box::new(self))
    }

    /// Unwrap from a [`Value`], `None` if the value holds another type
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Custom(custom) => custom.as_any().downcast_ref::<Self>().cloned(),
            _ => None,
        }
    }
}

impl ScriptType for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl ScriptType for i32 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl ScriptType for f32 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl ScriptType for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// 3D vector, registered as a plain-old-data user type
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vector3 {
    /// Create a new vector
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl ScriptType for Vector3 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_round_trip_through_value() {
        assert_eq!(f32::from_value(&2.5f32.into_value()), Some(2.5));
        assert_eq!(String::from_value(&"hi".to_string().into_value()), Some("hi".to_string()));
        assert_eq!(i32::from_value(&Value::Float(1.0)), None);
    }

    #[test]
    fn test_custom_value_downcast_and_equality() {
        let value = Vector3::new(1.0, 2.0, 3.0).into_value();
        assert_eq!(value.type_key(), TypeKey::of::<Vector3>());
        assert_eq!(value.get::<Vector3>(), Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(value.clone(), value);
        assert_ne!(value, Vector3::default().into_value());
    }
}
