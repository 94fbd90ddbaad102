use super::{
    error::{CacheError, CacheResult},
    Resource,
};

#[derive(Debug)]
pub struct JsonFile {
    pub name: String,
    pub uuid: uuid::Uuid,
    pub root: serde_json::Value,
}

impl Default for JsonFile {
    fn default() -> Self {
        JsonFile {
            name: String::new(),
            uuid: uuid::Uuid::new_v4(),
            root: serde_json::Value::Null,
        }
    }
}

impl JsonFile {
    pub fn load(&mut self, content: &[u8]) -> CacheResult<()> {
        self.root = serde_json::from_slice(content)
            .map_err(|err| CacheError::parse(Self::type_name(), &self.name, err))?;
        Ok(())
    }
}

impl Resource for JsonFile {
    fn type_name() -> &'static str {
        "JSONFile"
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
    fn reload_replaces_root() {
        let mut file = JsonFile::default();
        file.load(br#"{"speed": 2}"#).unwrap();
        assert_eq!(file.root["speed"], 2);

        file.load(br#"{"speed": 5}"#).unwrap();
        assert_eq!(file.root["speed"], 5);
    }

    #[test]
    fn invalid_json_keeps_previous_root() {
        let mut file = JsonFile::default();
        file.load(b"[1, 2]").unwrap();
        assert!(file.load(b"[1,").is_err());
        assert_eq!(file.root, serde_json::json!([1, 2]));
    }
}
