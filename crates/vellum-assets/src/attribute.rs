//! Attribute payload types and their serializer registry.
//!
//! Any `'static` type can be stored in a [`Blackboard`] once it implements
//! [`Attribute`]. To be persisted with its asset, the type must also be registered
//! with an [`AttributeRegistry`], which records how to default-construct it and how
//! to convert it to and from JSON. Types found in a file but unknown to the current
//! registry are skipped, so files stay readable across versions.

use std::any::{Any, TypeId};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use vellum_core::alloc::HashMap;

use crate::blackboard::Blackboard;
use crate::error::{AssetError, AssetResult};

/// A payload type that can live in a [`Blackboard`].
///
/// `TYPE_NAME` identifies the type in asset files and must be unique among the
/// registered attributes.
pub trait Attribute: Any + Send + Sync {
    const TYPE_NAME: &'static str;
}

/// Object-safe view of an [`Attribute`].
pub trait ErasedAttribute: Any + Send + Sync {
    fn attribute_type(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Attribute> ErasedAttribute for T {
    fn attribute_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type CreateFn = fn() -> Box<dyn ErasedAttribute>;
type SaveFn = fn(&dyn ErasedAttribute) -> serde_json::Result<Value>;
type LoadFn = fn(&mut dyn ErasedAttribute, Value) -> serde_json::Result<()>;

/// How to construct and (de)serialize one registered attribute type.
#[derive(Clone, Copy)]
pub struct AttributeVTable {
    type_id: TypeId,
    name: &'static str,
    create_default: CreateFn,
    save: SaveFn,
    load: LoadFn,
}

impl AttributeVTable {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Default-construct a boxed value of this type.
    pub fn create_default(&self) -> Box<dyn ErasedAttribute> {
        (self.create_default)()
    }
}

impl std::fmt::Debug for AttributeVTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeVTable")
            .field("name", &self.name)
            .finish()
    }
}

fn create_default<T: Attribute + Default>() -> Box<dyn ErasedAttribute> {
    Box::new(T::default())
}

fn save_erased<T: Attribute + Serialize>(value: &dyn ErasedAttribute) -> serde_json::Result<Value> {
    let value = value
        .as_any()
        .downcast_ref::<T>()
        .expect("attribute vtable used with the wrong type");
    serde_json::to_value(value)
}

fn load_erased<T: Attribute + DeserializeOwned>(
    target: &mut dyn ErasedAttribute,
    value: Value,
) -> serde_json::Result<()> {
    let target = target
        .as_any_mut()
        .downcast_mut::<T>()
        .expect("attribute vtable used with the wrong type");
    *target = serde_json::from_value(value)?;
    Ok(())
}

/// Key holding the list of stored type names in a saved blackboard.
pub const TYPES_KEY: &str = "types";
/// Key holding the per-type payloads in a saved blackboard.
pub const VALUES_KEY: &str = "values";

/// Registry of persistable attribute types.
///
/// Populated at start-up, before the asset system is built.
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    by_type: HashMap<TypeId, AttributeVTable>,
    by_name: HashMap<&'static str, TypeId>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` for persistence. Registering the same type twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if a different type is already registered under `T::TYPE_NAME`.
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: Attribute + Default + Serialize + DeserializeOwned,
    {
        let type_id = TypeId::of::<T>();
        if let Some(existing) = self.by_name.get(T::TYPE_NAME) {
            assert_eq!(
                *existing,
                type_id,
                "attribute name '{}' is registered by two types",
                T::TYPE_NAME
            );
            return self;
        }

        self.by_type.insert(
            type_id,
            AttributeVTable {
                type_id,
                name: T::TYPE_NAME,
                create_default: create_default::<T>,
                save: save_erased::<T>,
                load: load_erased::<T>,
            },
        );
        self.by_name.insert(T::TYPE_NAME, type_id);
        tracing::trace!("Registered attribute type {}", T::TYPE_NAME);
        self
    }

    pub fn is_registered<T: Attribute>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    pub fn get(&self, type_id: TypeId) -> Option<&AttributeVTable> {
        self.by_type.get(&type_id)
    }

    pub fn by_name(&self, name: &str) -> Option<&AttributeVTable> {
        self.by_name.get(name).and_then(|id| self.by_type.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Serialize every present, registered attribute of `blackboard`.
    ///
    /// The result is `{"types": [names...], "values": {name: payload, ...}}` with
    /// names in sorted order so saved files are stable.
    pub fn save_blackboard(&self, blackboard: &Blackboard) -> AssetResult<Value> {
        let mut present: Vec<(&AttributeVTable, &dyn ErasedAttribute)> = Vec::new();
        for value in blackboard.values() {
            match self.by_type.get(&value.attribute_type()) {
                Some(vtable) => present.push((vtable, value)),
                None => tracing::trace!(
                    "Attribute {} is not registered and will not be saved",
                    value.type_name()
                ),
            }
        }
        present.sort_by_key(|(vtable, _)| vtable.name);

        let mut values = Map::new();
        for (vtable, value) in &present {
            let payload = (vtable.save)(*value)
                .map_err(|e| AssetError::serialization(format!("attribute {}", vtable.name), e))?;
            values.insert(vtable.name.to_string(), payload);
        }

        let types = present
            .iter()
            .map(|(vtable, _)| Value::String(vtable.name.to_string()))
            .collect();

        let mut root = Map::new();
        root.insert(TYPES_KEY.to_string(), Value::Array(types));
        root.insert(VALUES_KEY.to_string(), Value::Object(values));
        Ok(Value::Object(root))
    }

    /// Rebuild a blackboard from the output of [`AttributeRegistry::save_blackboard`].
    ///
    /// Each listed type is default-constructed, then its payload (if any) is
    /// deserialized into it. Unregistered type names are skipped with a warning.
    pub fn load_blackboard(&self, saved: &Value) -> AssetResult<Blackboard> {
        let mut blackboard = Blackboard::new();
        let Some(root) = saved.as_object() else {
            if saved.is_null() {
                return Ok(blackboard);
            }
            return Err(AssetError::Other {
                message: "attribute data is not an object".to_string(),
            });
        };

        let names = root
            .get(TYPES_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let values = root.get(VALUES_KEY).and_then(Value::as_object);

        for name in names.iter().filter_map(Value::as_str) {
            let Some(vtable) = self.by_name(name) else {
                tracing::warn!("Skipping unregistered attribute type '{}'", name);
                continue;
            };

            let mut value = vtable.create_default();
            if let Some(payload) = values.and_then(|values| values.get(name)) {
                (vtable.load)(value.as_mut(), payload.clone())
                    .map_err(|e| AssetError::serialization(format!("attribute {}", name), e))?;
            }
            blackboard.insert_boxed(value);
        }

        Ok(blackboard)
    }
}
