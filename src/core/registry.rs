// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Type registry: resolves message specifications to type descriptors.
//!
//! Types enter the registry from three places:
//! - the predefined builtin set ([`TypeRegistry::with_builtin_types`])
//! - .msg definition text, e.g. schemas embedded in a recording
//!   ([`TypeRegistry::register_definition`])
//! - .msg files under a share directory laid out as
//!   `<dir>/<package>/<category>/<Name>.<category>`, either loaded eagerly
//!   ([`TypeRegistry::load_from_path`]) or looked up on demand
//!   ([`TypeRegistry::register_search_path`])

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use super::error::{BagError, Result};
use crate::schema::{builtin_types, parse_schema, MessageSchema, MessageSpec, MessageType};
use crate::schema::TypeDescriptor;

/// Thread-safe registry of message types keyed by spec string.
///
/// Uses RwLock for concurrent read access with exclusive write access.
#[derive(Debug)]
pub struct TypeRegistry {
    inner: RwLock<TypeRegistryInner>,
}

#[derive(Debug, Default)]
struct TypeRegistryInner {
    types: HashMap<String, MessageType>,
    search_paths: Vec<PathBuf>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> BagError {
    BagError::Other(format!("Registry lock poisoned: {e}"))
}

impl TypeRegistry {
    /// Create a new empty type registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TypeRegistryInner::default()),
        }
    }

    /// Create a registry preloaded with the builtin types.
    pub fn with_builtin_types() -> Result<Self> {
        let registry = Self::new();
        for msg_type in builtin_types::get_all()? {
            registry.register(msg_type)?;
        }
        Ok(registry)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TypeRegistryInner>> {
        self.inner.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TypeRegistryInner>> {
        self.inner.write().map_err(poisoned)
    }

    /// Register a single type under its own name.
    pub fn register(&self, msg_type: MessageType) -> Result<()> {
        let mut inner = self.write()?;
        inner.types.insert(msg_type.name.clone(), msg_type);
        Ok(())
    }

    /// Register every type of a parsed schema.
    pub fn register_schema(&self, schema: MessageSchema) -> Result<()> {
        let mut inner = self.write()?;
        for (name, msg_type) in schema.types {
            inner.types.insert(name, msg_type);
        }
        Ok(())
    }

    /// Register every type of a parsed schema, returning what each name held
    /// before so the change can be undone with [`restore`](Self::restore).
    pub fn overlay_schema(&self, schema: MessageSchema) -> Result<Vec<(String, Option<MessageType>)>> {
        let mut inner = self.write()?;
        let mut displaced = Vec::with_capacity(schema.types.len());
        for (name, msg_type) in schema.types {
            let previous = inner.types.insert(name.clone(), msg_type);
            displaced.push((name, previous));
        }
        Ok(displaced)
    }

    /// Undo overlays, newest first.
    pub fn restore(&self, displaced: Vec<(String, Option<MessageType>)>) -> Result<()> {
        let mut inner = self.write()?;
        for (name, previous) in displaced.into_iter().rev() {
            match previous {
                Some(msg_type) => inner.types.insert(name, msg_type),
                None => inner.types.remove(&name),
            };
        }
        Ok(())
    }

    /// Parse .msg text for `specification` and register it with its dependencies.
    pub fn register_definition(&self, specification: &str, definition: &str) -> Result<()> {
        let spec = MessageSpec::parse(specification)?;
        let schema = parse_schema(&spec.to_string(), definition)?;
        debug!(
            type_name = %spec,
            types = schema.types.len(),
            "registered message definition"
        );
        self.register_schema(schema)
    }

    /// Add a directory consulted when a type is not registered yet.
    pub fn register_search_path(&self, dir: impl Into<PathBuf>) -> Result<()> {
        let dir = dir.into();
        let mut inner = self.write()?;
        if !inner.search_paths.contains(&dir) {
            debug!(path = %dir.display(), "added message search path");
            inner.search_paths.push(dir);
        }
        Ok(())
    }

    /// Eagerly register every `<package>/msg/<Name>.msg` under `dir`.
    ///
    /// Returns the number of files loaded.
    pub fn load_from_path(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let mut loaded = 0;

        for package in std::fs::read_dir(dir)? {
            let package = package?;
            let package_name = package.file_name().to_string_lossy().into_owned();
            let msg_dir = package.path().join("msg");
            if !msg_dir.is_dir() {
                continue;
            }
            for file in std::fs::read_dir(&msg_dir)? {
                let path = file?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("msg") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let definition = std::fs::read_to_string(&path)?;
                self.register_definition(&format!("{package_name}/msg/{stem}"), &definition)?;
                loaded += 1;
            }
        }

        debug!(path = %dir.display(), loaded, "loaded message definitions");
        Ok(loaded)
    }

    /// Get a type by spec string, consulting search paths if needed.
    pub fn get(&self, name: &str) -> Result<Option<MessageType>> {
        if let Some(found) = self.read()?.types.get(name).cloned() {
            return Ok(Some(found));
        }
        self.load_from_search_paths(name)
    }

    fn load_from_search_paths(&self, name: &str) -> Result<Option<MessageType>> {
        let Ok(spec) = MessageSpec::parse(name) else {
            return Ok(None);
        };
        let search_paths = self.read()?.search_paths.clone();

        for dir in search_paths {
            let path = dir.join(spec.relative_path());
            if !path.is_file() {
                continue;
            }
            let definition = std::fs::read_to_string(&path)?;
            match parse_schema(name, &definition) {
                Ok(schema) => {
                    let root = schema.root().cloned();
                    debug!(type_name = name, path = %path.display(), "loaded message definition");
                    self.register_schema(schema)?;
                    return Ok(root);
                }
                Err(e) => {
                    warn!(type_name = name, path = %path.display(), error = %e, "skipping unparsable definition");
                }
            }
        }
        Ok(None)
    }

    /// Check if a type is registered.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.read()?.types.contains_key(name))
    }

    /// Get all registered type names, sorted.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.read()?.types.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Remove a type from the registry.
    pub fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.write()?.types.remove(name).is_some())
    }

    /// Clear all types (search paths are kept).
    pub fn clear(&self) -> Result<()> {
        self.write()?.types.clear();
        Ok(())
    }

    /// Get the number of registered types.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.types.len())
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Resolve a specification string into a descriptor.
    ///
    /// The specification format is checked before any lookup. The root and
    /// every type it references must be resolvable.
    pub fn resolve(&self, type_name: &str) -> Result<TypeDescriptor> {
        let spec = MessageSpec::parse(type_name)?;
        let root_name = spec.to_string();

        let mut types = HashMap::new();
        let mut seen = HashSet::new();
        let mut pending = VecDeque::from([root_name.clone()]);
        seen.insert(root_name.clone());

        while let Some(name) = pending.pop_front() {
            let msg_type = self
                .get(&name)?
                .ok_or_else(|| BagError::type_resolution(name.clone()))?;
            for field in &msg_type.fields {
                if let Some(nested) = field.type_name.nested_name() {
                    if seen.insert(nested.to_string()) {
                        pending.push_back(nested.to_string());
                    }
                }
            }
            types.insert(name, msg_type);
        }

        Ok(TypeDescriptor::new(root_name, types))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bagrecord_registry_{tag}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_type_registry() {
        let registry = TypeRegistry::new();

        registry
            .register(MessageType::new("pkg/msg/Test".to_string()))
            .unwrap();
        assert!(registry.get("pkg/msg/Test").unwrap().is_some());
        assert!(registry.contains("pkg/msg/Test").unwrap());
        assert_eq!(registry.len().unwrap(), 1);
        assert!(!registry.is_empty().unwrap());

        assert!(registry.remove("pkg/msg/Test").unwrap());
        assert!(!registry.contains("pkg/msg/Test").unwrap());
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_overlay_and_restore() {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        let builtin_fields = registry.get("std_msgs/msg/String").unwrap().unwrap().fields.len();

        let mut displaced = registry
            .overlay_schema(parse_schema("std_msgs/msg/String", "string data\nint32 extra").unwrap())
            .unwrap();
        displaced.extend(
            registry
                .overlay_schema(parse_schema("my_pkg/msg/Note", "string text").unwrap())
                .unwrap(),
        );
        assert_eq!(registry.get("std_msgs/msg/String").unwrap().unwrap().fields.len(), 2);
        assert!(registry.contains("my_pkg/msg/Note").unwrap());

        registry.restore(displaced).unwrap();
        assert_eq!(
            registry.get("std_msgs/msg/String").unwrap().unwrap().fields.len(),
            builtin_fields
        );
        assert!(!registry.contains("my_pkg/msg/Note").unwrap());
    }

    #[test]
    fn test_builtin_types_resolve() {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        let descriptor = registry.resolve("example_interfaces/msg/String").unwrap();
        assert_eq!(descriptor.type_name(), "example_interfaces/msg/String");
        assert_eq!(descriptor.fields()[0].name, "data");
    }

    #[test]
    fn test_resolve_collects_transitive_types() {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        registry
            .register_definition("my_pkg/msg/Tagged", "std_msgs/Header header\ngeometry_msgs/Pose pose")
            .unwrap();

        let descriptor = registry.resolve("my_pkg/msg/Tagged").unwrap();
        assert!(descriptor.get_type("builtin_interfaces/msg/Time").is_some());
        assert!(descriptor.get_type("geometry_msgs/msg/Quaternion").is_some());
        assert_eq!(descriptor.type_count(), 6);
    }

    #[test]
    fn test_resolve_rejects_malformed_spec_first() {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        let err = registry.resolve("bad/spec").unwrap_err();
        assert!(matches!(err, BagError::SpecificationFormat { .. }));
    }

    #[test]
    fn test_resolve_unknown_type() {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        let err = registry.resolve("pkg/msg/Missing").unwrap_err();
        assert!(matches!(err, BagError::TypeResolution { ref type_name } if type_name == "pkg/msg/Missing"));
    }

    #[test]
    fn test_resolve_unknown_dependency() {
        let registry = TypeRegistry::new();
        registry
            .register_definition("pkg/msg/Outer", "Inner inner")
            .unwrap();
        let err = registry.resolve("pkg/msg/Outer").unwrap_err();
        assert!(matches!(err, BagError::TypeResolution { ref type_name } if type_name == "pkg/msg/Inner"));
    }

    #[test]
    fn test_search_path_lookup() {
        let dir = temp_dir("search");
        fs::create_dir_all(dir.join("demo_msgs/msg")).unwrap();
        fs::write(dir.join("demo_msgs/msg/Reading.msg"), "Unit unit\nfloat64 value\n").unwrap();
        fs::write(dir.join("demo_msgs/msg/Unit.msg"), "string name\n").unwrap();

        let registry = TypeRegistry::new();
        registry.register_search_path(&dir).unwrap();
        assert!(!registry.contains("demo_msgs/msg/Reading").unwrap());

        let descriptor = registry.resolve("demo_msgs/msg/Reading").unwrap();
        assert!(descriptor.get_type("demo_msgs/msg/Unit").is_some());
        assert!(registry.contains("demo_msgs/msg/Reading").unwrap());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_from_path() {
        let dir = temp_dir("load");
        fs::create_dir_all(dir.join("a_msgs/msg")).unwrap();
        fs::create_dir_all(dir.join("not_a_package")).unwrap();
        fs::write(dir.join("a_msgs/msg/One.msg"), "int8 x\n").unwrap();
        fs::write(dir.join("a_msgs/msg/Two.msg"), "One one\n").unwrap();
        fs::write(dir.join("a_msgs/msg/README.md"), "ignored").unwrap();

        let registry = TypeRegistry::new();
        assert_eq!(registry.load_from_path(&dir).unwrap(), 2);
        assert_eq!(
            registry.names().unwrap(),
            vec!["a_msgs/msg/One".to_string(), "a_msgs/msg/Two".to_string()]
        );

        let _ = fs::remove_dir_all(&dir);
    }
}
