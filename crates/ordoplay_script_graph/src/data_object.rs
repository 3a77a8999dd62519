// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type-erased owned value storage.

use crate::types::{TypeDescriptor, TypeError, TypeKey, TypeRegistry};
use crate::uid::DataObjectId;
use crate::value::{ScriptType, Value};
use std::fmt;
use std::sync::Arc;

/// A single value bound to its type descriptor.
///
/// The object is live while it holds a value. Cloning deep-copies the value
/// and mints a new ID; [`DataObject::take`] moves the value out together with
/// the ID and leaves a null object behind.
pub struct DataObject {
    id: DataObjectId,
    descriptor: Option<Arc<TypeDescriptor>>,
    value: Option<Value>,
}

impl DataObject {
    /// An object with no type and no value
    pub fn null() -> Self {
        Self {
            id: DataObjectId::mint(),
            descriptor: None,
            value: None,
        }
    }

    /// Default-construct a `T` bound to its registered descriptor
    pub fn create<T: ScriptType>(registry: &TypeRegistry) -> Result<Self, TypeError> {
        Ok(Self::from_descriptor(Arc::clone(registry.descriptor_of::<T>()?)))
    }

    /// Default-construct a value of the descriptor's type
    pub fn from_descriptor(descriptor: Arc<TypeDescriptor>) -> Self {
        let value = descriptor.construct();
        Self {
            id: DataObjectId::mint(),
            descriptor: Some(descriptor),
            value: Some(value),
        }
    }

    /// Bind an existing value to a descriptor
    pub fn with_value(descriptor: Arc<TypeDescriptor>, value: Value) -> Result<Self, TypeError> {
        descriptor.check(&value)?;
        Ok(Self {
            id: DataObjectId::mint(),
            descriptor: Some(descriptor),
            value: Some(value),
        })
    }

    /// Object ID
    pub fn id(&self) -> DataObjectId {
        self.id
    }

    /// Whether a value is held
    pub fn is_live(&self) -> bool {
        self.value.is_some()
    }

    /// Bound descriptor
    pub fn descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        self.descriptor.as_ref()
    }

    /// Key of the bound type
    pub fn type_key(&self) -> Option<TypeKey> {
        self.descriptor.as_ref().map(|d| d.key())
    }

    /// Held value
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Read the value as `T`
    pub fn get<T: ScriptType>(&self) -> Result<T, TypeError> {
        let descriptor = self.descriptor.as_ref().ok_or(TypeError::Empty)?;
        if descriptor.key() != TypeKey::of::<T>() {
            return Err(TypeError::Mismatch {
                expected: descriptor.friendly_name().to_string(),
                found: std::any::type_name::<T>().to_string(),
            });
        }
        self.value
            .as_ref()
            .and_then(T::from_value)
            .ok_or(TypeError::Empty)
    }

    /// Overwrite the value with a `T`
    pub fn set<T: ScriptType>(&mut self, value: T) -> Result<(), TypeError> {
        self.set_value(value.into_value())
    }

    /// Overwrite with a type-erased value of the bound type
    pub fn set_value(&mut self, value: Value) -> Result<(), TypeError> {
        let descriptor = self.descriptor.as_ref().ok_or(TypeError::Empty)?;
        descriptor.check(&value)?;
        if let Some(old) = self.value.replace(value) {
            descriptor.destroy(old);
        }
        Ok(())
    }

    /// Encode the value with the descriptor's codec
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypeError> {
        match (&self.descriptor, &self.value) {
            (Some(descriptor), Some(value)) => descriptor.serialize(value),
            _ => Err(TypeError::Empty),
        }
    }

    /// Decode bytes into the value with the descriptor's codec
    pub fn set_from_bytes(&mut self, bytes: &[u8]) -> Result<(), TypeError> {
        let value = self
            .descriptor
            .as_ref()
            .ok_or(TypeError::Empty)?
            .deserialize(bytes)?;
        self.set_value(value)
    }

    /// Deep-copy another object's type and value into this one.
    ///
    /// Assigning from a null object clears this one. Self-assignment is a no-op.
    pub fn assign_from(&mut self, other: &DataObject) {
        if self.id == other.id {
            return;
        }
        self.clear();
        self.descriptor = other.descriptor.clone();
        self.value = other.value.clone();
    }

    /// Move the value out, keeping the ID on the returned object
    pub fn take(&mut self) -> DataObject {
        let moved = DataObject {
            id: self.id,
            descriptor: self.descriptor.take(),
            value: self.value.take(),
        };
        self.id = DataObjectId::mint();
        moved
    }

    /// Destroy the value and drop the type binding
    pub fn clear(&mut self) {
        if let (Some(descriptor), Some(value)) = (&self.descriptor, self.value.take()) {
            descriptor.destroy(value);
        }
        self.descriptor = None;
    }

    /// Render the value with the descriptor's string conversion
    pub fn display(&self) -> String {
        match (&self.descriptor, &self.value) {
            (Some(descriptor), Some(value)) => descriptor.to_string(value),
            _ => String::new(),
        }
    }
}

impl Default for DataObject {
    fn default() -> Self {
        Self::null()
    }
}

impl Clone for DataObject {
    fn clone(&self) -> Self {
        Self {
            id: DataObjectId::mint(),
            descriptor: self.descriptor.clone(),
            value: self.value.clone(),
        }
    }
}

impl Drop for DataObject {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataObject")
            .field("id", &self.id)
            .field("type", &self.descriptor.as_ref().map(|d| d.friendly_name()))
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{register_builtin_types, GraphColor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        register_builtin_types(&mut registry).unwrap();
        registry
    }

    #[test]
    fn test_create_default_constructs() {
        let object = DataObject::create::<f32>(&registry()).unwrap();
        assert!(object.is_live());
        assert_eq!(object.get::<f32>().unwrap(), 0.0);
    }

    #[test]
    fn test_type_checked_access() {
        let mut object = DataObject::create::<i32>(&registry()).unwrap();
        object.set(12).unwrap();
        assert_eq!(object.get::<i32>().unwrap(), 12);
        assert!(matches!(object.get::<f32>(), Err(TypeError::Mismatch { .. })));
        assert!(matches!(object.set(1.0f32), Err(TypeError::Mismatch { .. })));
        assert_eq!(object.get::<i32>().unwrap(), 12);
    }

    #[test]
    fn test_clone_gets_fresh_id_and_deep_copy() {
        let mut object = DataObject::create::<String>(&registry()).unwrap();
        object.set("first".to_string()).unwrap();
        let copy = object.clone();
        object.set("second".to_string()).unwrap();
        assert_ne!(copy.id(), object.id());
        assert_eq!(copy.get::<String>().unwrap(), "first");
    }

    #[test]
    fn test_take_keeps_id_and_nulls_source() {
        let mut object = DataObject::create::<bool>(&registry()).unwrap();
        let id = object.id();
        let moved = object.take();
        assert_eq!(moved.id(), id);
        assert!(moved.is_live());
        assert!(!object.is_live());
        assert_ne!(object.id(), id);
    }

    #[test]
    fn test_assign_from_null_clears() {
        let mut object = DataObject::create::<f32>(&registry()).unwrap();
        object.assign_from(&DataObject::null());
        assert!(!object.is_live());
        assert!(object.type_key().is_none());
    }

    #[test]
    fn test_bytes_round_trip() {
        let registry = registry();
        let mut source = DataObject::create::<f32>(&registry).unwrap();
        source.set(3.25f32).unwrap();
        let mut target = DataObject::create::<f32>(&registry).unwrap();
        target.set_from_bytes(&source.to_bytes().unwrap()).unwrap();
        assert_eq!(target.get::<f32>().unwrap(), 3.25);
        assert_eq!(target.display(), "3.250000");
    }

    static DESTROYED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Handle(u32);

    impl ScriptType for Handle {}

    fn count_destroy(_value: Value) {
        DESTROYED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_drop_runs_destroy_hook() {
        let mut registry = registry();
        registry
            .register(
                TypeDescriptor::with_codec::<Handle>(
                    "Handle",
                    GraphColor::WHITE,
                    |_| Ok(Vec::new()),
                    |_| Ok(Handle::default().into_value()),
                )
                .with_destroy(count_destroy),
            )
            .unwrap();
        let before = DESTROYED.load(Ordering::SeqCst);
        {
            let mut object = DataObject::create::<Handle>(&registry).unwrap();
            object.set(Handle(7)).unwrap();
        }
        assert_eq!(DESTROYED.load(Ordering::SeqCst), before + 2);
    }
}
