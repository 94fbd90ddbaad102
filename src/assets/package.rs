use std::path::Path;

use tracing::info;

use super::{
    error::{CacheError, CacheResult},
    memory_buffer::MemoryBuffer,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub name: String,
    pub offset: usize,
    pub size: usize,
    pub checksum: u32,
}

/// An uncompressed `UPAK` resource archive held in memory.
#[derive(Debug)]
pub struct PackageFile {
    pub name: String,
    pub checksum: u32,
    entries: Vec<PackageEntry>,
    data: Vec<u8>,
}

impl PackageFile {
    pub fn open(path: &Path) -> CacheResult<Self> {
        let name = path.display().to_string();
        let data = std::fs::read(path).map_err(|err| CacheError::parse("Package", &name, err))?;
        Self::from_bytes(&name, data)
    }

    pub fn from_bytes(name: &str, data: Vec<u8>) -> CacheResult<Self> {
        let mut buffer = MemoryBuffer::new(&data);
        let fail = |reason: String| CacheError::parse("Package", name, reason);

        let id = buffer.read_file_id().map_err(|err| fail(err.to_string()))?;
        match &id {
            b"UPAK" => {}
            b"ULZ4" => {
                return Err(CacheError::UnsupportedFeature(format!(
                    "Compressed package {name} is not supported"
                )))
            }
            _ => return Err(fail(format!("{name} is not a valid package file"))),
        }

        let num_files = buffer.read_u32().map_err(|err| fail(err.to_string()))?;
        let checksum = buffer.read_u32().map_err(|err| fail(err.to_string()))?;

        let mut entries = Vec::new();
        for _ in 0..num_files {
            let entry_name = buffer.read_cstring().map_err(|err| fail(err.to_string()))?;
            let offset = buffer.read_u32().map_err(|err| fail(err.to_string()))? as usize;
            let size = buffer.read_u32().map_err(|err| fail(err.to_string()))? as usize;
            let entry_checksum = buffer.read_u32().map_err(|err| fail(err.to_string()))?;

            if offset.checked_add(size).map_or(true, |end| end > data.len()) {
                return Err(fail(format!(
                    "entry {entry_name} points outside of the package"
                )));
            }

            entries.push(PackageEntry {
                name: entry_name,
                offset,
                size,
                checksum: entry_checksum,
            });
        }

        info!("Opened package {name} with {} entries", entries.len());

        Ok(PackageFile {
            name: name.to_owned(),
            checksum,
            entries,
            data,
        })
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn read_entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &self.data[entry.offset..entry.offset + entry.size])
    }
}

#[cfg(test)]
pub(crate) fn build_package(files: &[(&str, &[u8])]) -> Vec<u8> {
    let header_len: usize = 12 + files.iter().map(|(name, _)| name.len() + 1 + 12).sum::<usize>();

    let mut out = b"UPAK".to_vec();
    out.extend_from_slice(&(files.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    let mut offset = header_len;
    for (name, content) in files {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        out.extend_from_slice(&(content.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        offset += content.len();
    }
    for (_, content) in files {
        out.extend_from_slice(content);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_and_reads_entries() {
        let bytes = build_package(&[
            ("Scripts/Main.as", b"void Start() {}"),
            ("Data/a.json", b"{}"),
        ]);
        let package = PackageFile::from_bytes("Data.pak", bytes).unwrap();

        let names: Vec<&str> = package.entry_names().collect();
        assert_eq!(names, vec!["Scripts/Main.as", "Data/a.json"]);
        assert_eq!(package.read_entry("Data/a.json"), Some(&b"{}"[..]));
        assert_eq!(package.read_entry("missing"), None);
    }

    #[test]
    fn compressed_packages_are_rejected() {
        let mut bytes = build_package(&[]);
        bytes[..4].copy_from_slice(b"ULZ4");
        let err = PackageFile::from_bytes("Data.pak", bytes).unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedFeature(_)));
    }

    #[test]
    fn entries_outside_the_file_fail() {
        let mut bytes = build_package(&[("a.txt", b"abc")]);
        bytes.truncate(bytes.len() - 1);
        assert!(PackageFile::from_bytes("Data.pak", bytes).is_err());
    }
}
