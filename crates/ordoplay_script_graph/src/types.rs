// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type registry for values that can appear on pins and in variables.
//!
//! Every value type is described once by a [`TypeDescriptor`]: names, size,
//! display color, and the function table used to construct, destroy,
//! stringify and (de)serialize type-erased values.

use crate::value::{ScriptType, Value, Vector3};
use bytemuck::Pod;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::mem::size_of;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Stable key identifying a registered value type
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey(TypeId);

impl TypeKey {
    /// Key for `T`
    pub fn of<T: 'static>() -> Self {
        Self(TypeId::of::<T>())
    }

    /// Wrap a raw `TypeId`
    pub fn from_type_id(id: TypeId) -> Self {
        Self(id)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({:?})", self.0)
    }
}

/// RGBA color in 0-255 range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphColor {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl GraphColor {
    /// Opaque white
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque black
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    /// Create a new color
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Color in 0-1 range
    pub fn normalized(&self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }

    /// Packed as `0xAABBGGRR`
    pub fn as_u32(&self) -> u32 {
        u32::from(self.a) << 24 | u32::from(self.b) << 16 | u32::from(self.g) << 8 | u32::from(self.r)
    }
}

/// Errors raised by the type registry and by typed value access
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// A descriptor for this type already exists
    #[error("A handler for type {0} has already been registered")]
    AlreadyRegistered(String),

    /// Another type already uses this friendly name
    #[error("Friendly type name already in use: {0}")]
    DuplicateName(String),

    /// Type was never registered
    #[error("Type not registered: {0}")]
    NotRegistered(String),

    /// Value or request does not match the bound type
    #[error("Type mismatch: expected {expected}, found {found}")]
    Mismatch {
        /// Type bound to the storage
        expected: String,
        /// Type that was requested or supplied
        found: String,
    },

    /// Data object holds no value
    #[error("Data object is empty")]
    Empty,

    /// Bytes could not be decoded as the requested type
    #[error("Failed to decode {type_name}: {reason}")]
    Decode {
        /// Friendly name of the type
        type_name: String,
        /// What went wrong
        reason: String,
    },

    /// Value could not be encoded
    #[error("Failed to encode {type_name}: {reason}")]
    Encode {
        /// Friendly name of the type
        type_name: String,
        /// What went wrong
        reason: String,
    },
}

/// Construct a default value
pub type ConstructFn = fn() -> Value;
/// Tear down a value before its storage is released
pub type DestroyFn = fn(Value);
/// Human-readable rendering
pub type ToStringFn = fn(&Value) -> String;
/// Encode into bytes
pub type SerializeFn = fn(&Value) -> Result<Vec<u8>, TypeError>;
/// Decode from bytes
pub type DeserializeFn = fn(&[u8]) -> Result<Value, TypeError>;

/// Metadata and function table for one registered value type
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    type_name: &'static str,
    simple_name: String,
    friendly_name: String,
    size: usize,
    color: GraphColor,
    in_place_constructible: bool,
    construct: ConstructFn,
    destroy: DestroyFn,
    to_string: ToStringFn,
    serialize: SerializeFn,
    deserialize: DeserializeFn,
}

impl TypeDescriptor {
    /// Descriptor with a caller-supplied byte codec
    pub fn with_codec<T: ScriptType>(
        friendly_name: impl Into<String>,
        color: GraphColor,
        serialize: SerializeFn,
        deserialize: DeserializeFn,
    ) -> Self {
        let type_name = type_name::<T>();
        Self {
            key: TypeKey::of::<T>(),
            type_name,
            simple_name: simple_type_name(type_name),
            friendly_name: friendly_name.into(),
            size: size_of::<T>(),
            color,
            in_place_constructible: false,
            construct: construct_default::<T>,
            destroy: drop,
            to_string: debug_string::<T>,
            serialize,
            deserialize,
        }
    }

    /// Plain-old-data type, serialized as a raw byte copy of its memory
    pub fn pod<T: ScriptType + Pod>(friendly_name: impl Into<String>, color: GraphColor) -> Self {
        Self::with_codec::<T>(friendly_name, color, pod_serialize::<T>, pod_deserialize::<T>)
    }

    /// Type encoded through serde with bincode
    pub fn serde<T: ScriptType + Serialize + DeserializeOwned>(
        friendly_name: impl Into<String>,
        color: GraphColor,
    ) -> Self {
        Self::with_codec::<T>(friendly_name, color, serde_serialize::<T>, serde_deserialize::<T>)
    }

    /// Mark as editable in place by an editor widget
    pub fn in_place(mut self) -> Self {
        self.in_place_constructible = true;
        self
    }

    /// Override the string conversion
    pub fn with_display(mut self, to_string: ToStringFn) -> Self {
        self.to_string = to_string;
        self
    }

    /// Override the teardown hook
    pub fn with_destroy(mut self, destroy: DestroyFn) -> Self {
        self.destroy = destroy;
        self
    }

    /// Type key
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Full Rust type name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without module path or generic arguments
    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    /// Name shown to users
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// In-memory size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Display color
    pub fn color(&self) -> GraphColor {
        self.color
    }

    /// Whether an editor can construct this type in place
    pub fn is_in_place_constructible(&self) -> bool {
        self.in_place_constructible
    }

    /// Construct a default value
    pub fn construct(&self) -> Value {
        (self.construct)()
    }

    /// Run the teardown hook
    pub fn destroy(&self, value: Value) {
        (self.destroy)(value);
    }

    /// Render a value of this type
    pub fn to_string(&self, value: &Value) -> String {
        (self.to_string)(value)
    }

    /// Encode a value of this type
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, TypeError> {
        self.check(value)?;
        (self.serialize)(value)
    }

    /// Decode a value of this type
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value, TypeError> {
        (self.deserialize)(bytes)
    }

    /// Verify that `value` holds this type
    pub fn check(&self, value: &Value) -> Result<(), TypeError> {
        if value.type_key() == self.key {
            Ok(())
        } else {
            Err(TypeError::Mismatch {
                expected: self.friendly_name.clone(),
                found: value.type_name().to_string(),
            })
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("friendly_name", &self.friendly_name)
            .field("size", &self.size)
            .field("color", &self.color)
            .field("in_place_constructible", &self.in_place_constructible)
            .finish_non_exhaustive()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// Strip module path and generic arguments from a type name
fn simple_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn construct_default<T: ScriptType>() -> Value {
    T::default().into_value()
}

fn debug_string<T: ScriptType>(value: &Value) -> String {
    T::from_value(value).map(|v| format!("{v:?}")).unwrap_or_default()
}

fn expect_value<T: ScriptType>(value: &Value) -> Result<T, TypeError> {
    T::from_value(value).ok_or_else(|| TypeError::Mismatch {
        expected: type_name::<T>().to_string(),
        found: value.type_name().to_string(),
    })
}

fn pod_serialize<T: ScriptType + Pod>(value: &Value) -> Result<Vec<u8>, TypeError> {
    let value = expect_value::<T>(value)?;
    Ok(bytemuck::bytes_of(&value).to_vec())
}

fn pod_deserialize<T: ScriptType + Pod>(bytes: &[u8]) -> Result<Value, TypeError> {
    if bytes.len() != size_of::<T>() {
        return Err(TypeError::Decode {
            type_name: type_name::<T>().to_string(),
            reason: format!("expected {} bytes, got {}", size_of::<T>(), bytes.len()),
        });
    }
    Ok(bytemuck::pod_read_unaligned::<T>(bytes).into_value())
}

fn serde_serialize<T: ScriptType + Serialize>(value: &Value) -> Result<Vec<u8>, TypeError> {
    let value = expect_value::<T>(value)?;
    bincode::serialize(&value).map_err(|e| TypeError::Encode {
        type_name: type_name::<T>().to_string(),
        reason: e.to_string(),
    })
}

fn serde_deserialize<T: ScriptType + DeserializeOwned>(bytes: &[u8]) -> Result<Value, TypeError> {
    bincode::deserialize::<T>(bytes)
        .map(ScriptType::into_value)
        .map_err(|e| TypeError::Decode {
            type_name: type_name::<T>().to_string(),
            reason: e.to_string(),
        })
}

// bool is not Pod, so it gets a one-byte codec.
fn bool_serialize(value: &Value) -> Result<Vec<u8>, TypeError> {
    Ok(vec![u8::from(expect_value::<bool>(value)?)])
}

fn bool_deserialize(bytes: &[u8]) -> Result<Value, TypeError> {
    match bytes {
        [byte] => Ok(Value::Bool(*byte != 0)),
        _ => Err(TypeError::Decode {
            type_name: "bool".to_string(),
            reason: format!("expected 1 byte, got {}", bytes.len()),
        }),
    }
}

// Strings are stored as their UTF-8 bytes; the byte array length delimits them.
fn text_serialize(value: &Value) -> Result<Vec<u8>, TypeError> {
    Ok(expect_value::<String>(value)?.into_bytes())
}

fn text_deserialize(bytes: &[u8]) -> Result<Value, TypeError> {
    String::from_utf8(bytes.to_vec())
        .map(Value::Text)
        .map_err(|e| TypeError::Decode {
            type_name: "String".to_string(),
            reason: e.to_string(),
        })
}

fn float_display(value: &Value) -> String {
    f32::from_value(value).map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn int_display(value: &Value) -> String {
    i32::from_value(value).map(|v| v.to_string()).unwrap_or_default()
}

fn bool_display(value: &Value) -> String {
    match bool::from_value(value) {
        Some(true) => "True".to_string(),
        Some(false) => "False".to_string(),
        None => String::new(),
    }
}

fn text_display(value: &Value) -> String {
    String::from_value(value).unwrap_or_default()
}

/// Registry of value types, one descriptor per type
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexMap<TypeKey, Arc<TypeDescriptor>>,
    by_type_name: HashMap<&'static str, TypeKey>,
    by_friendly_name: HashMap<String, TypeKey>,
    friendly_names: Vec<String>,
    sorted_names: OnceLock<Vec<String>>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a descriptor; each type and friendly name may be registered once
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<Arc<TypeDescriptor>, TypeError> {
        if self.types.contains_key(&descriptor.key) {
            return Err(TypeError::AlreadyRegistered(descriptor.type_name.to_string()));
        }
        if self.by_friendly_name.contains_key(&descriptor.friendly_name) {
            return Err(TypeError::DuplicateName(descriptor.friendly_name.clone()));
        }

        tracing::debug!(
            type_name = descriptor.type_name,
            friendly_name = %descriptor.friendly_name,
            "Registered script type"
        );

        let descriptor = Arc::new(descriptor);
        self.by_type_name.insert(descriptor.type_name, descriptor.key);
        self.by_friendly_name
            .insert(descriptor.friendly_name.clone(), descriptor.key);
        self.friendly_names.push(descriptor.friendly_name.clone());
        self.sorted_names = OnceLock::new();
        self.types.insert(descriptor.key, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Descriptor for a key
    pub fn get(&self, key: TypeKey) -> Result<&Arc<TypeDescriptor>, TypeError> {
        self.types
            .get(&key)
            .ok_or_else(|| TypeError::NotRegistered(format!("{key:?}")))
    }

    /// Descriptor for `T`
    pub fn descriptor_of<T: 'static>(&self) -> Result<&Arc<TypeDescriptor>, TypeError> {
        self.types
            .get(&TypeKey::of::<T>())
            .ok_or_else(|| TypeError::NotRegistered(type_name::<T>().to_string()))
    }

    /// Descriptor by full Rust type name
    pub fn by_type_name(&self, name: &str) -> Result<&Arc<TypeDescriptor>, TypeError> {
        self.by_type_name
            .get(name)
            .and_then(|key| self.types.get(key))
            .ok_or_else(|| TypeError::NotRegistered(name.to_string()))
    }

    /// Descriptor by friendly name
    pub fn by_friendly_name(&self, name: &str) -> Result<&Arc<TypeDescriptor>, TypeError> {
        self.by_friendly_name
            .get(name)
            .and_then(|key| self.types.get(key))
            .ok_or_else(|| TypeError::NotRegistered(name.to_string()))
    }

    /// Descriptor by friendly name, falling back to the full type name
    pub fn by_name(&self, name: &str) -> Result<&Arc<TypeDescriptor>, TypeError> {
        self.by_friendly_name(name).or_else(|_| self.by_type_name(name))
    }

    /// Whether a key is registered
    pub fn contains(&self, key: TypeKey) -> bool {
        self.types.contains_key(&key)
    }

    /// All descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.types.values()
    }

    /// Encode a value of the given type
    pub fn serialize(&self, key: TypeKey, value: &Value) -> Result<Vec<u8>, TypeError> {
        self.get(key)?.serialize(value)
    }

    /// Decode a value of the given type
    pub fn deserialize(&self, key: TypeKey, bytes: &[u8]) -> Result<Value, TypeError> {
        self.get(key)?.deserialize(bytes)
    }

    /// Render a value of the given type
    pub fn to_string(&self, key: TypeKey, value: &Value) -> Result<String, TypeError> {
        Ok(self.get(key)?.to_string(value))
    }

    /// Display color for a type, white when unknown
    pub fn color(&self, key: TypeKey) -> GraphColor {
        self.get(key).map_or(GraphColor::WHITE, |d| d.color())
    }

    /// Friendly names of all registered types, sorted
    pub fn friendly_names(&self) -> &[String] {
        self.sorted_names.get_or_init(|| {
            let mut names = self.friendly_names.clone();
            names.sort();
            names
        })
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Register the value types every script graph relies on
pub fn register_builtin_types(registry: &mut TypeRegistry) -> Result<(), TypeError> {
    registry.register(
        TypeDescriptor::pod::<f32>("Float", GraphColor::new(156, 246, 60, 255))
            .in_place()
            .with_display(float_display),
    )?;
    registry.register(
        TypeDescriptor::with_codec::<bool>(
            "Bool",
            GraphColor::new(149, 0, 0, 255),
            bool_serialize,
            bool_deserialize,
        )
        .in_place()
        .with_display(bool_display),
    )?;
    registry.register(
        TypeDescriptor::with_codec::<String>(
            "String",
            GraphColor::new(250, 0, 208, 255),
            text_serialize,
            text_deserialize,
        )
        .in_place()
        .with_display(text_display),
    )?;
    registry.register(
        TypeDescriptor::pod::<i32>("Integer", GraphColor::new(14, 224, 161, 255))
            .in_place()
            .with_display(int_display),
    )?;
    registry.register(TypeDescriptor::pod::<Vector3>(
        "Vector3",
        GraphColor::new(255, 200, 40, 255),
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtins() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        register_builtin_types(&mut registry).unwrap();
        registry
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Inventory {
        items: Vec<String>,
        gold: u32,
    }

    impl ScriptType for Inventory {}

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = builtins();
        let err = registry
            .register(TypeDescriptor::pod::<f32>("Other Float", GraphColor::WHITE))
            .unwrap_err();
        assert!(matches!(err, TypeError::AlreadyRegistered(_)));
    }

    #[test]
    fn test_lookup_by_names() {
        let registry = builtins();
        let float = registry.by_friendly_name("Float").unwrap();
        assert_eq!(float.key(), TypeKey::of::<f32>());
        assert_eq!(float.size(), 4);
        assert_eq!(
            registry.by_type_name(type_name::<String>()).unwrap().friendly_name(),
            "String"
        );
        assert_eq!(registry.descriptor_of::<Vector3>().unwrap().simple_name(), "Vector3");
        assert!(registry.by_name("Quaternion").is_err());
    }

    #[test]
    fn test_friendly_names_sorted_after_mutation() {
        let mut registry = builtins();
        assert_eq!(registry.friendly_names()[0], "Bool");
        registry
            .register(TypeDescriptor::serde::<Inventory>("Armor", GraphColor::BLACK))
            .unwrap();
        assert_eq!(registry.friendly_names()[0], "Armor");
        assert_eq!(registry.friendly_names().len(), 6);
    }

    #[test]
    fn test_serialize_round_trip_laws() {
        let registry = builtins();
        let cases = [
            (TypeKey::of::<f32>(), Value::Float(-12.25)),
            (TypeKey::of::<i32>(), Value::Int(i32::MIN)),
            (TypeKey::of::<bool>(), Value::Bool(true)),
            (TypeKey::of::<Vector3>(), Vector3::new(1.0, -2.0, 3.5).into_value()),
        ];
        for (key, value) in cases {
            let bytes = registry.serialize(key, &value).unwrap();
            assert_eq!(bytes.len(), registry.get(key).unwrap().size());
            let decoded = registry.deserialize(key, &bytes).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(registry.serialize(key, &decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_string_round_trip_keeps_length_and_content() {
        let registry = builtins();
        let key = TypeKey::of::<String>();
        let text = "Hello, graph! åäö".to_string();
        let bytes = registry.serialize(key, &Value::Text(text.clone())).unwrap();
        assert_eq!(bytes.len(), text.len());
        assert_eq!(registry.deserialize(key, &bytes).unwrap(), Value::Text(text));
        assert_eq!(registry.deserialize(key, &[]).unwrap(), Value::Text(String::new()));
    }

    #[test]
    fn test_serde_codec_for_user_types() {
        let mut registry = builtins();
        registry
            .register(TypeDescriptor::serde::<Inventory>("Inventory", GraphColor::BLACK))
            .unwrap();
        let inventory = Inventory {
            items: vec!["sword".into(), "shield".into()],
            gold: 42,
        };
        let key = TypeKey::of::<Inventory>();
        let bytes = registry.serialize(key, &inventory.clone().into_value()).unwrap();
        let decoded = registry.deserialize(key, &bytes).unwrap();
        assert_eq!(decoded.get::<Inventory>(), Some(inventory));
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        let registry = builtins();
        let err = registry.deserialize(TypeKey::of::<f32>(), &[1, 2]).unwrap_err();
        assert!(matches!(err, TypeError::Decode { .. }));
    }

    #[test]
    fn test_serialize_checks_value_type() {
        let registry = builtins();
        let err = registry
            .serialize(TypeKey::of::<f32>(), &Value::Int(3))
            .unwrap_err();
        assert!(matches!(err, TypeError::Mismatch { .. }));
        assert_eq!(err.to_string(), "Type mismatch: expected Float, found i32");

        let err = registry
            .serialize(TypeKey::of::<f32>(), &Vector3::new(1.0, 2.0, 3.0).into_value())
            .unwrap_err();
        assert!(err.to_string().ends_with("found ordoplay_script_graph::value::Vector3"));
    }

    #[test]
    fn test_display_strings() {
        let registry = builtins();
        assert_eq!(registry.to_string(TypeKey::of::<bool>(), &Value::Bool(true)).unwrap(), "True");
        assert_eq!(registry.to_string(TypeKey::of::<f32>(), &Value::Float(1.5)).unwrap(), "1.500000");
        assert_eq!(registry.to_string(TypeKey::of::<i32>(), &Value::Int(-7)).unwrap(), "-7");
    }
}
