use super::{
    error::{CacheError, CacheResult},
    Resource,
};

/// Generic XML document resource. Keeps the validated source and its root
/// element name; `roxmltree` documents borrow their input, so consumers
/// re-parse `source` on demand.
#[derive(Debug)]
pub struct XmlFile {
    pub name: String,
    pub uuid: uuid::Uuid,
    pub source: String,
    pub root: String,
}

impl Default for XmlFile {
    fn default() -> Self {
        XmlFile {
            name: String::new(),
            uuid: uuid::Uuid::new_v4(),
            source: String::new(),
            root: String::new(),
        }
    }
}

/// Root element name of an XML payload.
pub fn root_name(name: &str, content: &[u8]) -> CacheResult<String> {
    let text = std::str::from_utf8(content).map_err(|err| CacheError::parse("XMLFile", name, err))?;
    let doc = roxmltree::Document::parse(text).map_err(|err| CacheError::parse("XMLFile", name, err))?;
    Ok(doc.root_element().tag_name().name().to_owned())
}

impl XmlFile {
    pub fn load(&mut self, content: &[u8]) -> CacheResult<()> {
        let root = root_name(&self.name, content)?;
        self.source = String::from_utf8_lossy(content).into_owned();
        self.root = root;
        Ok(())
    }
}

impl Resource for XmlFile {
    fn type_name() -> &'static str {
        "XMLFile"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn uuid(&self) -> uuid::Uuid {
        self.uuid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_name_ignores_prolog() {
        let xml = br#"<?xml version="1.0"?><!-- ui --><element type="UIElement"/>"#;
        assert_eq!(root_name("UI/a.xml", xml).unwrap(), "element");
    }

    #[test]
    fn malformed_xml_is_a_parse_failure() {
        let mut file = XmlFile::default();
        file.set_name("UI/broken.xml");
        let err = file.load(b"<element>").unwrap_err();
        assert!(matches!(err, CacheError::ParseFailure { kind: "XMLFile", .. }));
        assert!(file.source.is_empty());
    }
}
