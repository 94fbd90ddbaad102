use std::{
    any::{Any, TypeId},
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use tracing::{debug, warn};

use super::{package::PackageFile, read_lock, Resource, Shared};

type AnyResource = Arc<dyn Any + Send + Sync>;

/// Named resources by type, plus the file sources (packages, directories)
/// that back plain file reads.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: HashMap<TypeId, HashMap<String, AnyResource>>,
    packages: Vec<PackageFile>,
    resource_dirs: Vec<PathBuf>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        ResourceRegistry::default()
    }

    pub fn get<T: Resource>(&self, name: &str) -> Option<Shared<T>> {
        let res = self.resources.get(&TypeId::of::<T>())?.get(name)?;
        res.clone().downcast::<RwLock<T>>().ok()
    }

    pub fn contains<T: Resource>(&self, name: &str) -> bool {
        self.resources
            .get(&TypeId::of::<T>())
            .is_some_and(|by_name| by_name.contains_key(name))
    }

    /// Registers a resource that is not backed by a file. Rejected when
    /// the resource has no name or the name is taken for this type.
    pub fn add_manual_resource<T: Resource>(&mut self, res: Shared<T>) -> bool {
        let name = read_lock(&res).name().to_owned();
        if name.is_empty() {
            warn!("Manual {} resource has no name, not adding", T::type_name());
            return false;
        }

        let by_name = self.resources.entry(TypeId::of::<T>()).or_default();
        if by_name.contains_key(&name) {
            warn!("{} resource {name} already registered", T::type_name());
            return false;
        }

        debug!("Added manual {} resource {name}", T::type_name());
        by_name.insert(name, res as AnyResource);
        true
    }

    pub fn len<T: Resource>(&self) -> usize {
        self.resources
            .get(&TypeId::of::<T>())
            .map_or(0, |by_name| by_name.len())
    }

    pub fn add_package(&mut self, package: PackageFile) {
        self.packages.push(package);
    }

    pub fn packages(&self) -> &[PackageFile] {
        &self.packages
    }

    pub fn add_resource_dir(&mut self, dir: impl Into<PathBuf>) {
        self.resource_dirs.push(dir.into());
    }

    /// Reads a file from packages first, then resource directories.
    pub fn read_file(&self, name: &str) -> Option<Vec<u8>> {
        if let Some(data) = self
            .packages
            .iter()
            .find_map(|package| package.read_entry(name))
        {
            return Some(data.to_vec());
        }

        self.resource_dirs
            .iter()
            .map(|dir| dir.join(name))
            .filter(|path| path.is_file())
            .find_map(|path| std::fs::read(path).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{json_file::JsonFile, package, script_file::ScriptFile, write_lock};

    fn named<T: Resource + Default>(name: &str) -> Shared<T> {
        let res = Arc::new(RwLock::new(T::default()));
        write_lock(&res).set_name(name);
        res
    }

    #[test]
    fn lookups_are_per_type() {
        let mut registry = ResourceRegistry::new();
        let json = named::<JsonFile>("Data/a");
        assert!(registry.add_manual_resource(json.clone()));

        let found = registry.get::<JsonFile>("Data/a").unwrap();
        assert!(Arc::ptr_eq(&found, &json));
        assert!(registry.get::<ScriptFile>("Data/a").is_none());
    }

    #[test]
    fn duplicate_and_unnamed_resources_are_rejected() {
        let mut registry = ResourceRegistry::new();
        assert!(registry.add_manual_resource(named::<JsonFile>("a.json")));
        assert!(!registry.add_manual_resource(named::<JsonFile>("a.json")));
        assert!(!registry.add_manual_resource(named::<JsonFile>("")));
        assert_eq!(registry.len::<JsonFile>(), 1);
    }

    #[test]
    fn packages_are_read_before_directories() {
        let mut registry = ResourceRegistry::new();
        let bytes = package::build_package(&[("a.txt", b"from package")]);
        registry.add_package(PackageFile::from_bytes("Data.pak", bytes).unwrap());
        registry.add_resource_dir("/nonexistent-resource-dir");

        assert_eq!(registry.read_file("a.txt"), Some(b"from package".to_vec()));
        assert_eq!(registry.read_file("b.txt"), None);
    }
}
