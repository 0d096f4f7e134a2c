//! Interned resource paths.
//!
//! A [`ResourcePath`] is a copyable reference to a process-lifetime record holding
//! the normalized path and its stable numeric id. Records are never removed, so a
//! `ResourcePath` can be handed out and stored anywhere without further locking.

use std::fmt;
use std::path::{Component, MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path};
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::alloc::HashMap;
use crate::hash::stable_hash64;
use crate::profiling::profile_function;

/// Numeric identity of an interned path.
pub type PathId = u64;

/// Id carried by the default (invalid) path.
pub const INVALID_PATH_ID: PathId = 0;

/// The interned record behind a [`ResourcePath`].
#[derive(Debug)]
pub struct PathRecord {
    normalized: String,
    id: PathId,
}

static INVALID_RECORD: PathRecord = PathRecord {
    normalized: String::new(),
    id: INVALID_PATH_ID,
};

static PATH_TABLE: LazyLock<PathTable> = LazyLock::new(PathTable::default);

#[derive(Default)]
struct PathTable {
    records: RwLock<HashMap<PathId, &'static PathRecord>>,
}

impl PathTable {
    fn get_or_create(&self, path: &Path) -> ResourcePath {
        profile_function!();
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            return ResourcePath::invalid();
        }
        let id = path_id(&normalized);

        if let Some(record) = self.records.read().get(&id).copied() {
            check_collision(record, &normalized);
            return ResourcePath(record);
        }

        let mut records = self.records.write();
        let record = *records.entry(id).or_insert_with(|| {
            tracing::trace!("Interning resource path {} ({:016x})", normalized, id);
            Box::leak(Box::new(PathRecord {
                normalized: normalized.clone(),
                id,
            }))
        });
        check_collision(record, &normalized);
        ResourcePath(record)
    }

    fn find(&self, path: &Path) -> Option<ResourcePath> {
        let normalized = normalize_path(path);
        let record = self.records.read().get(&path_id(&normalized)).copied()?;
        (record.normalized == normalized).then_some(ResourcePath(record))
    }

    fn from_id(&self, id: PathId) -> Option<ResourcePath> {
        self.records.read().get(&id).copied().map(ResourcePath)
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}

fn check_collision(record: &PathRecord, normalized: &str) {
    assert_eq!(
        record.normalized, normalized,
        "resource path id collision between '{}' and '{}'",
        record.normalized, normalized
    );
}

fn path_id(normalized: &str) -> PathId {
    match stable_hash64(normalized.as_bytes()) {
        INVALID_PATH_ID => 1,
        id => id,
    }
}

/// Lexically normalize a path: both `/` and `\` are treated as separators, `.` is
/// dropped, `..` pops the previous component, and the result is joined with the
/// native separator. The filesystem is never touched.
pub fn normalize_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace(['\\', '/'], MAIN_SEPARATOR_STR);
    let mut prefix = String::new();
    let mut parts: Vec<String> = Vec::new();

    for component in Path::new(&raw).components() {
        match component {
            Component::Prefix(p) => prefix.push_str(&p.as_os_str().to_string_lossy()),
            Component::RootDir => prefix.push(MAIN_SEPARATOR),
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(last) if last != ".." => {
                    parts.pop();
                }
                // `..` above a root stays at the root
                _ if !prefix.is_empty() => {}
                _ => parts.push("..".to_string()),
            },
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
        }
    }

    prefix + &parts.join(MAIN_SEPARATOR_STR)
}

/// A normalized, interned, numerically identified path.
///
/// Equality is identity of the interned record, which is equivalent to equality
/// of the normalized text.
#[derive(Clone, Copy)]
pub struct ResourcePath(&'static PathRecord);

impl ResourcePath {
    /// Normalize `path` and return its interned identity, interning it if needed.
    ///
    /// An empty path yields [`ResourcePath::invalid`].
    pub fn get_or_create(path: impl AsRef<Path>) -> Self {
        PATH_TABLE.get_or_create(path.as_ref())
    }

    /// Look up an already interned path without inserting it.
    pub fn find(path: impl AsRef<Path>) -> Option<Self> {
        PATH_TABLE.find(path.as_ref())
    }

    /// Look up an interned path by id.
    pub fn from_id(id: PathId) -> Option<Self> {
        PATH_TABLE.from_id(id)
    }

    /// Number of paths interned in this process.
    pub fn interned_count() -> usize {
        PATH_TABLE.len()
    }

    /// The sentinel path with id [`INVALID_PATH_ID`].
    pub fn invalid() -> Self {
        ResourcePath(&INVALID_RECORD)
    }

    pub fn id(&self) -> PathId {
        self.0.id
    }

    pub fn is_valid(&self) -> bool {
        self.0.id != INVALID_PATH_ID
    }

    /// The normalized path text.
    pub fn as_str(&self) -> &'static str {
        &self.0.normalized
    }

    pub fn as_path(&self) -> &'static Path {
        Path::new(&self.0.normalized)
    }

    /// Whether the path is relative and never climbs above the directory it is
    /// joined to. Absolute paths and paths starting with `..` are not contained.
    pub fn is_contained(&self) -> bool {
        self.is_valid()
            && self
                .as_path()
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
    }

    /// File name without its extension, used as the display name of assets.
    pub fn stem(&self) -> &'static str {
        self.as_path()
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("")
    }

    pub fn extension(&self) -> Option<&'static str> {
        self.as_path().extension().and_then(|ext| ext.to_str())
    }
}

impl Default for ResourcePath {
    fn default() -> Self {
        Self::invalid()
    }
}

impl PartialEq for ResourcePath {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for ResourcePath {}

impl std::hash::Hash for ResourcePath {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePath")
            .field("path", &self.0.normalized)
            .field("id", &format_args!("{:016x}", self.0.id))
            .finish()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.normalized)
    }
}

impl<P: AsRef<Path>> From<P> for ResourcePath {
    fn from(path: P) -> Self {
        ResourcePath::get_or_create(path)
    }
}

impl Serialize for ResourcePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourcePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(ResourcePath::get_or_create(text))
    }
}

static_assertions::assert_eq_size!(ResourcePath, usize);

#[cfg(test)]
mod tests {
    use super::*;

    fn native(path: &str) -> String {
        path.replace('/', MAIN_SEPARATOR_STR)
    }

    #[test]
    fn test_normalize_lexical() {
        assert_eq!(normalize_path(Path::new("Dir/./A.asset")), native("Dir/A.asset"));
        assert_eq!(normalize_path(Path::new("Dir/Sub/../A.asset")), native("Dir/A.asset"));
        assert_eq!(normalize_path(Path::new("Dir\\A.asset")), native("Dir/A.asset"));
        assert_eq!(normalize_path(Path::new("../A.asset")), native("../A.asset"));
    }

    #[test]
    fn test_same_path_same_identity() {
        let a = ResourcePath::get_or_create("Textures/./Brick.asset");
        let b = ResourcePath::get_or_create("Textures/Brick.asset");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
    }

    #[test]
    fn test_different_paths_differ() {
        let a = ResourcePath::get_or_create("Meshes/A.asset");
        let b = ResourcePath::get_or_create("Meshes/B.asset");
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_invalid_path() {
        let invalid = ResourcePath::default();
        assert!(!invalid.is_valid());
        assert_eq!(invalid.id(), INVALID_PATH_ID);
        assert_eq!(ResourcePath::get_or_create(""), invalid);
    }

    #[test]
    fn test_lookup_by_id_and_find() {
        let path = ResourcePath::get_or_create("Lookup/ById.asset");
        assert_eq!(ResourcePath::from_id(path.id()), Some(path));
        assert_eq!(ResourcePath::find("Lookup/ById.asset"), Some(path));
        assert!(ResourcePath::find("Lookup/NeverInterned.asset").is_none());
    }

    #[test]
    fn test_contained_paths() {
        assert!(ResourcePath::get_or_create("Dir/A.asset").is_contained());
        assert!(ResourcePath::get_or_create("Dir/Sub/../A.asset").is_contained());
        assert!(!ResourcePath::get_or_create("../A.asset").is_contained());
        assert!(!ResourcePath::get_or_create("Dir/../../A.asset").is_contained());
        assert!(!ResourcePath::get_or_create("/tmp/A.asset").is_contained());
        assert!(!ResourcePath::default().is_contained());
    }

    #[test]
    fn test_stem_and_extension() {
        let path = ResourcePath::get_or_create("Dir/A.asset");
        assert_eq!(path.stem(), "A");
        assert_eq!(path.extension(), Some("asset"));
    }

    #[test]
    fn test_serde_as_string() {
        let path = ResourcePath::get_or_create("Serde/Path.asset");
        let json = serde_json::to_string(&path).unwrap();
        let back: ResourcePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_concurrent_interning() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| ResourcePath::get_or_create("Concurrent/Same.asset")))
            .collect();
        let paths: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(paths.windows(2).all(|w| w[0] == w[1]));
    }
}
