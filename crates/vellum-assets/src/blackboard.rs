//! Per-asset store of heterogeneous typed payloads.

use std::any::TypeId;
use std::fmt;

use vellum_core::alloc::{HashMap, HashSet};

use crate::attribute::{Attribute, ErasedAttribute};

/// A bag holding at most one value per [`Attribute`] type.
///
/// Besides plain storage, a blackboard remembers which types were deliberately
/// evicted with [`Blackboard::unload`]. Saving an asset whose blackboard has
/// unloaded types merges the on-disk copy of those types back in first, so eviction
/// never erases persisted data.
#[derive(Default)]
pub struct Blackboard {
    entries: HashMap<TypeId, Box<dyn ErasedAttribute>>,
    unloaded: HashSet<TypeId>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`.
    ///
    /// # Panics
    ///
    /// Panics if a value of type `T` is already present.
    pub fn create<T: Attribute>(&mut self, value: T) -> &mut T {
        assert!(
            !self.contains::<T>(),
            "blackboard already contains a {}",
            T::TYPE_NAME
        );
        self.insert_boxed(Box::new(value));
        self.get_mut::<T>()
    }

    /// Return the value of type `T`, default-constructing it if absent.
    pub fn get_or_create<T: Attribute + Default>(&mut self) -> &mut T {
        if !self.contains::<T>() {
            self.insert_boxed(Box::new(T::default()));
        }
        self.get_mut::<T>()
    }

    /// # Panics
    ///
    /// Panics if no value of type `T` is present.
    pub fn get<T: Attribute>(&self) -> &T {
        self.find::<T>()
            .unwrap_or_else(|| panic!("blackboard does not contain a {}", T::TYPE_NAME))
    }

    /// # Panics
    ///
    /// Panics if no value of type `T` is present.
    pub fn get_mut<T: Attribute>(&mut self) -> &mut T {
        self.find_mut::<T>()
            .unwrap_or_else(|| panic!("blackboard does not contain a {}", T::TYPE_NAME))
    }

    pub fn find<T: Attribute>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.as_any().downcast_ref::<T>())
    }

    pub fn find_mut<T: Attribute>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.as_any_mut().downcast_mut::<T>())
    }

    pub fn contains<T: Attribute>(&self) -> bool {
        self.contains_type(TypeId::of::<T>())
    }

    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.entries.contains_key(&type_id)
    }

    /// Remove and return the value of the given type.
    pub fn remove(&mut self, type_id: TypeId) -> Option<Box<dyn ErasedAttribute>> {
        self.entries.remove(&type_id)
    }

    /// Move the value of `type_id` out of `other` into this blackboard, replacing any
    /// value already here. Returns `false` if `other` has no such value.
    pub fn move_type(&mut self, other: &mut Blackboard, type_id: TypeId) -> bool {
        match other.entries.remove(&type_id) {
            Some(value) => {
                self.unloaded.remove(&type_id);
                self.entries.insert(type_id, value);
                true
            }
            None => false,
        }
    }

    /// Drop the value of `type_id` and remember that it was evicted on purpose.
    ///
    /// Returns whether a value was present.
    pub fn unload(&mut self, type_id: TypeId) -> bool {
        self.unloaded.insert(type_id);
        self.entries.remove(&type_id).is_some()
    }

    /// Types evicted with [`Blackboard::unload`] and not restored since.
    pub fn unloaded_types(&self) -> Vec<TypeId> {
        self.unloaded.iter().copied().collect()
    }

    pub fn is_unloaded(&self, type_id: TypeId) -> bool {
        self.unloaded.contains(&type_id)
    }

    /// Types of the values currently present.
    pub fn types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.entries.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &dyn ErasedAttribute> + '_ {
        self.entries.values().map(|value| value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a type-erased value, replacing any value of the same type.
    pub fn insert_boxed(&mut self, value: Box<dyn ErasedAttribute>) {
        let type_id = value.attribute_type();
        self.unloaded.remove(&type_id);
        self.entries.insert(type_id, value);
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values().map(|value| value.type_name()).collect();
        names.sort_unstable();
        f.debug_struct("Blackboard")
            .field("attributes", &names)
            .field("unloaded", &self.unloaded.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Position(f32, f32);

    impl Attribute for Position {
        const TYPE_NAME: &'static str = "Position";
    }

    #[derive(Debug, Default, PartialEq)]
    struct Name(String);

    impl Attribute for Name {
        const TYPE_NAME: &'static str = "Name";
    }

    #[test]
    fn test_create_get_find() {
        let mut blackboard = Blackboard::new();
        blackboard.create(Position(1.0, 2.0));

        assert!(blackboard.contains::<Position>());
        assert_eq!(blackboard.get::<Position>(), &Position(1.0, 2.0));
        assert!(blackboard.find::<Name>().is_none());
        assert_eq!(blackboard.len(), 1);
    }

    #[test]
    fn test_get_or_create() {
        let mut blackboard = Blackboard::new();
        blackboard.get_or_create::<Name>().0.push_str("crate");
        blackboard.get_or_create::<Name>().0.push_str("s");
        assert_eq!(blackboard.get::<Name>().0, "crates");
    }

    #[test]
    fn test_get_mut() {
        let mut blackboard = Blackboard::new();
        blackboard.create(Position(0.0, 0.0));
        blackboard.get_mut::<Position>().0 = 5.0;
        assert_eq!(blackboard.find::<Position>(), Some(&Position(5.0, 0.0)));
    }

    #[test]
    #[should_panic(expected = "already contains a Position")]
    fn test_create_twice_panics() {
        let mut blackboard = Blackboard::new();
        blackboard.create(Position::default());
        blackboard.create(Position::default());
    }

    #[test]
    #[should_panic(expected = "does not contain a Name")]
    fn test_get_absent_panics() {
        Blackboard::new().get::<Name>();
    }

    #[test]
    fn test_remove() {
        let mut blackboard = Blackboard::new();
        blackboard.create(Name("a".to_string()));
        let removed = blackboard.remove(TypeId::of::<Name>()).unwrap();
        assert_eq!(removed.type_name(), "Name");
        assert!(blackboard.is_empty());
        assert!(blackboard.remove(TypeId::of::<Name>()).is_none());
    }

    #[test]
    fn test_unload_and_move_back() {
        let mut live = Blackboard::new();
        live.create(Position(1.0, 1.0));
        live.create(Name("live".to_string()));

        assert!(live.unload(TypeId::of::<Position>()));
        assert!(!live.contains::<Position>());
        assert!(live.is_unloaded(TypeId::of::<Position>()));
        assert_eq!(live.unloaded_types(), vec![TypeId::of::<Position>()]);

        let mut on_disk = Blackboard::new();
        on_disk.create(Position(9.0, 9.0));

        assert!(live.move_type(&mut on_disk, TypeId::of::<Position>()));
        assert_eq!(live.get::<Position>(), &Position(9.0, 9.0));
        assert!(!live.is_unloaded(TypeId::of::<Position>()));
        assert!(on_disk.is_empty());

        assert!(!live.move_type(&mut on_disk, TypeId::of::<Name>()));
        assert_eq!(live.get::<Name>().0, "live");
    }

    #[test]
    fn test_types_and_debug() {
        let mut blackboard = Blackboard::new();
        blackboard.create(Position::default());
        blackboard.create(Name::default());

        let mut types: Vec<_> = blackboard.types().collect();
        types.sort();
        let mut expected = vec![TypeId::of::<Position>(), TypeId::of::<Name>()];
        expected.sort();
        assert_eq!(types, expected);

        let debug = format!("{:?}", blackboard);
        assert!(debug.contains("Name") && debug.contains("Position"));
    }
}
