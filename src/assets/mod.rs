pub mod error;
pub mod json_file;
pub mod memory_buffer;
pub mod package;
pub mod registry;
pub mod remote;
pub mod resource_cache;
pub mod resource_cmd;
pub mod script_file;
pub mod scripting;
pub mod xml_file;

use std::{
    any::Any,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// A named, registry-managed resource.
pub trait Resource: Any + Send + Sync {
    fn type_name() -> &'static str
    where
        Self: Sized;

    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);
    fn uuid(&self) -> uuid::Uuid;
}

pub type Shared<T> = Arc<RwLock<T>>;

pub fn read_lock<T>(res: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    res.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_lock<T>(res: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    res.write().unwrap_or_else(PoisonError::into_inner)
}

/// Where a queued item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOrigin {
    Host,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    pub name: String,
    pub content: Vec<u8>,
    pub origin: ItemOrigin,
}

impl PendingItem {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        PendingItem {
            name: name.into(),
            content: content.into(),
            origin: ItemOrigin::Host,
        }
    }

    pub fn remote(name: impl Into<String>, content: Vec<u8>) -> Self {
        PendingItem {
            name: name.into(),
            content,
            origin: ItemOrigin::Remote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetType {
    Script,
    LuaScript,
    Xml,
    Json,
    Shader,
    Model,
    Image,
    JavaScript,
    Unknown,
}

// Checked in order, first suffix match wins.
const EXTENSIONS: &[(&str, AssetType)] = &[
    (".as", AssetType::Script),
    (".lua", AssetType::LuaScript),
    (".xml", AssetType::Xml),
    (".json", AssetType::Json),
    (".glsl", AssetType::Shader),
    (".mdl", AssetType::Model),
    (".dds", AssetType::Image),
    (".jpg", AssetType::Image),
    (".jpeg", AssetType::Image),
    (".png", AssetType::Image),
    (".icns", AssetType::Image),
    (".js", AssetType::JavaScript),
];

impl AssetType {
    pub fn from_name(name: &str) -> AssetType {
        EXTENSIONS
            .iter()
            .find(|(ext, _)| name.ends_with(ext))
            .map(|(_, asset_type)| *asset_type)
            .unwrap_or(AssetType::Unknown)
    }
}

/// Second dispatch level for `.xml` payloads, picked by root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlKind {
    Material,
    Technique,
    Generic,
}

impl XmlKind {
    pub fn from_root(root: &str) -> XmlKind {
        match root {
            "material" => XmlKind::Material,
            "technique" => XmlKind::Technique,
            _ => XmlKind::Generic,
        }
    }
}

/// Fully resolved materializer target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Script,
    LuaScript,
    Xml(XmlKind),
    Json,
    Shader,
    Model,
    Image,
    JavaScript,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_table_routes_known_extensions() {
        let cases = [
            ("Scripts/Main.as", AssetType::Script),
            ("Scripts/Main.lua", AssetType::LuaScript),
            ("UI/Layout.xml", AssetType::Xml),
            ("Data/config.json", AssetType::Json),
            ("Shaders/GLSL/Unlit.glsl", AssetType::Shader),
            ("Models/Box.mdl", AssetType::Model),
            ("Textures/a.dds", AssetType::Image),
            ("Textures/a.jpg", AssetType::Image),
            ("Textures/a.jpeg", AssetType::Image),
            ("Textures/a.png", AssetType::Image),
            ("Textures/a.icns", AssetType::Image),
            ("boot.js", AssetType::JavaScript),
        ];

        for (name, expected) in cases {
            assert_eq!(AssetType::from_name(name), expected, "{name}");
        }
    }

    #[test]
    fn unknown_suffixes_are_unrecognized() {
        assert_eq!(AssetType::from_name("Music/Theme.ogg"), AssetType::Unknown);
        assert_eq!(AssetType::from_name("noextension"), AssetType::Unknown);
        assert_eq!(AssetType::from_name("Textures/a.PNG"), AssetType::Unknown);
    }

    #[test]
    fn json_is_not_mistaken_for_js() {
        assert_eq!(AssetType::from_name("a.json"), AssetType::Json);
    }

    #[test]
    fn xml_roots_pick_subkind() {
        assert_eq!(XmlKind::from_root("material"), XmlKind::Material);
        assert_eq!(XmlKind::from_root("technique"), XmlKind::Technique);
        assert_eq!(XmlKind::from_root("scene"), XmlKind::Generic);
    }
}
