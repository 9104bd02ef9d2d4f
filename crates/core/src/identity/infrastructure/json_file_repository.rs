use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identity::domain::identity_repository::IdentityRepository;
use crate::identity::domain::registered_identity::RegisteredIdentity;
use crate::shared::embedding::Embedding;
use crate::shared::engine_error::RepositoryError;

/// Stores the registry as one JSON object mapping label to embedding:
///
/// ```json
/// {"s-001": [0.012, -0.334, ...], "s-002": [...]}
/// ```
///
/// Every save rewrites the whole document through a temp file and rename,
/// so readers never observe a half-written registry.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<file name>.part` beside the registry, never equal to it.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".part");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> RepositoryError {
        RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> RepositoryError {
        RepositoryError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl IdentityRepository for JsonFileRepository {
    fn load(&self) -> Result<Vec<RegisteredIdentity>, RepositoryError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        let document: RegistryDocument =
            serde_json::from_str(&json).map_err(|e| self.corrupt(e.to_string()))?;

        let mut identities: Vec<RegisteredIdentity> = Vec::with_capacity(document.entries.len());
        for (label, values) in document.entries {
            let embedding =
                Embedding::new(values).map_err(|e| self.corrupt(format!("{label}: {e}")))?;
            if let Some(first) = identities.first() {
                if first.embedding().dimension() != embedding.dimension() {
                    return Err(self.corrupt(format!(
                        "{label}: dimension {} differs from {}",
                        embedding.dimension(),
                        first.embedding().dimension()
                    )));
                }
            }
            identities.push(RegisteredIdentity::new(label, embedding));
        }
        Ok(identities)
    }

    fn save(&self, identities: &[RegisteredIdentity]) -> Result<(), RepositoryError> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;

        let json = serde_json::to_vec(&RegistryView(identities))
            .map_err(RepositoryError::Serialize)?;

        // Write to a temp file first, then rename for atomicity
        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).map_err(|e| self.io_error(&temp_path, e))?;
        file.write_all(&json)
            .and_then(|_| file.sync_all())
            .map_err(|e| self.io_error(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(&self.path, e))?;
        // The rename only survives a crash once the directory entry is flushed.
        sync_dir(parent).map_err(|e| self.io_error(parent, e))?;
        log::debug!(
            "Persisted {} identities to {}",
            identities.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Borrowed serialization view that keeps registration order.
struct RegistryView<'a>(&'a [RegisteredIdentity]);

impl Serialize for RegistryView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for identity in self.0 {
            map.serialize_entry(identity.label(), identity.embedding().values())?;
        }
        map.end()
    }
}

/// Parsed document in file order. A repeated label keeps its first
/// position and its last value.
struct RegistryDocument {
    entries: Vec<(String, Vec<f32>)>,
}

impl<'de> Deserialize<'de> for RegistryDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = RegistryDocument;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of label to embedding array")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, Vec<f32>)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, values)) = access.next_entry::<String, Vec<f32>>()? {
                    match entries.iter_mut().find(|(l, _)| *l == label) {
                        Some(entry) => entry.1 = values,
                        None => entries.push((label, values)),
                    }
                }
                Ok(RegistryDocument { entries })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn identity(label: &str, values: &[f32]) -> RegisteredIdentity {
        RegisteredIdentity::new(label, Embedding::new(values.to_vec()).unwrap())
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(tmp.path().join("ids.json"));
        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(tmp.path().join("ids.json"));
        let identities = vec![
            identity("zeta", &[0.5, -0.25]),
            identity("alpha", &[1.0, 0.0]),
        ];

        repo.save(&identities).unwrap();

        assert_eq!(repo.load().unwrap(), identities);
    }

    #[test]
    fn test_save_writes_flat_label_map() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ids.json");
        let repo = JsonFileRepository::new(&path);
        repo.save(&[identity("s-001", &[0.5, 1.0])]).unwrap();

        let json = fs::read_to_string(&path).unwrap();

        assert_eq!(json, r#"{"s-001":[0.5,1.0]}"#);
        assert!(!tmp.path().join("ids.json.part").exists());
    }

    #[test]
    fn test_save_to_part_suffixed_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ids.part");
        let repo = JsonFileRepository::new(&path);

        repo.save(&[identity("a", &[1.0, 2.0])]).unwrap();

        assert_eq!(repo.temp_path(), tmp.path().join("ids.part.part"));
        assert!(!repo.temp_path().exists());
        assert_eq!(repo.load().unwrap(), vec![identity("a", &[1.0, 2.0])]);
    }

    #[test]
    fn test_relative_path_temp_location() {
        let repo = JsonFileRepository::new("ids.json");
        assert_eq!(repo.parent_dir(), Path::new("."));
        assert_eq!(repo.temp_path(), PathBuf::from("ids.json.part"));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dir").join("ids.json");
        JsonFileRepository::new(&path)
            .save(&[identity("a", &[1.0])])
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(tmp.path().join("ids.json"));
        repo.save(&[identity("a", &[1.0]), identity("b", &[2.0])])
            .unwrap();
        repo.save(&[identity("b", &[3.0])]).unwrap();

        let loaded = repo.load().unwrap();
        assert_eq!(loaded, vec![identity("b", &[3.0])]);
    }

    #[test]
    fn test_loads_float64_documents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ids.json");
        fs::write(&path, r#"{"s-9": [0.123456789012, -1e-5, 3]}"#).unwrap();

        let loaded = JsonFileRepository::new(&path).load().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].embedding().dimension(), 3);
    }

    #[test]
    fn test_duplicate_label_keeps_last_value() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ids.json");
        fs::write(&path, r#"{"a": [1.0], "b": [2.0], "a": [4.0]}"#).unwrap();

        let loaded = JsonFileRepository::new(&path).load().unwrap();

        assert_eq!(loaded, vec![identity("a", &[4.0]), identity("b", &[2.0])]);
    }

    #[test]
    fn test_invalid_json_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ids.json");
        fs::write(&path, r#"{"a": [1.0, "#).unwrap();
        assert!(matches!(
            JsonFileRepository::new(&path).load(),
            Err(RepositoryError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ids.json");
        fs::write(&path, r#"[[1.0, 2.0]]"#).unwrap();
        assert!(matches!(
            JsonFileRepository::new(&path).load(),
            Err(RepositoryError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_empty_embedding_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ids.json");
        fs::write(&path, r#"{"a": []}"#).unwrap();
        let err = JsonFileRepository::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("a: invalid embedding"));
    }

    #[test]
    fn test_mixed_dimensions_are_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ids.json");
        fs::write(&path, r#"{"a": [1.0, 0.0], "b": [1.0]}"#).unwrap();
        assert!(matches!(
            JsonFileRepository::new(&path).load(),
            Err(RepositoryError::Corrupt { .. })
        ));
    }
}
