//! Scene documents as JSON files in one directory (native only).

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::codec::SceneDocument;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// One `<id>.json` file per saved scene.
///
/// Ids are restricted to ASCII letters, digits, `-` and `_` so that every id
/// maps to exactly one file and `list` returns the ids that were saved.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

/// Reject ids that would not survive as a plain file stem.
fn check_id(id: &str) -> StorageResult<()> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io(format!("{action} {}: {e}", path.display()))
}

impl FileStorage {
    /// Open the store at `root`, creating the directory when missing.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error("Cannot create", &root, e))?;
        Ok(Self { root })
    }

    /// Store under the platform data directory, `<data>/skyink/scenes`.
    pub fn default_location() -> StorageResult<Self> {
        let data = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("No data or home directory".to_string()))?;
        Self::new(data.join("skyink").join("scenes"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, id: &str) -> StorageResult<PathBuf> {
        check_id(id)?;
        Ok(self.root.join(id).with_extension(EXTENSION))
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, document: &SceneDocument) -> BoxFuture<'_, StorageResult<()>> {
        let target = self.file_for(id);
        let encoded = document
            .to_json_pretty()
            .map_err(|e| StorageError::Serialization(e.to_string()));
        Box::pin(async move {
            let target = target?;
            let json = encoded?;
            // Write beside the target and rename so a crash never leaves a
            // half-written scene behind.
            let staging = target.with_extension("json.part");
            fs::write(&staging, json).map_err(|e| io_error("Cannot write", &staging, e))?;
            fs::rename(&staging, &target).map_err(|e| io_error("Cannot replace", &target, e))?;
            log::info!("Saved scene to {}", target.display());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SceneDocument>> {
        let source = self.file_for(id);
        let id = id.to_string();
        Box::pin(async move {
            let source = source?;
            let json = match fs::read_to_string(&source) {
                Ok(json) => json,
                Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(id)),
                Err(e) => return Err(io_error("Cannot read", &source, e)),
            };
            let document = SceneDocument::from_json(&json)
                .map_err(|e| StorageError::Serialization(format!("{}: {e}", source.display())))?;
            log::info!("Loaded scene from {}", source.display());
            Ok(document)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let target = self.file_for(id);
        Box::pin(async move {
            let target = target?;
            match fs::remove_file(&target) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error("Cannot delete", &target, e)),
                _ => Ok(()),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.root).map_err(|e| io_error("Cannot list", &self.root, e))?;
            let mut ids: Vec<String> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION))
                .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
                .filter(|id| check_id(id).is_ok())
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let target = self.file_for(id);
        Box::pin(async move { Ok(target?.is_file()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSettings;
    use crate::scene::Scene;
    use crate::storage::block_on;
    use kurbo::Point;
    use tempfile::tempdir;

    fn document() -> SceneDocument {
        let mut scene = Scene::new();
        scene.set_moon(Some(Point::new(-40.0, 80.0)));
        scene.add_star(Point::new(1.0, 2.0));
        SceneDocument::capture(&scene, &[], &ToolSettings::default())
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let doc = document();

        block_on(storage.save("night-sky", &doc)).unwrap();
        assert!(dir.path().join("night-sky.json").is_file());
        assert!(!dir.path().join("night-sky.json.part").exists());
        assert_eq!(block_on(storage.load("night-sky")).unwrap(), doc);
    }

    #[test]
    fn test_creates_missing_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("a").join("b");
        let storage = FileStorage::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(storage.root(), root.as_path());
    }

    #[test]
    fn test_missing_scene() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let result = block_on(storage.load("nothing-here"));
        assert!(matches!(result, Err(StorageError::NotFound(id)) if id == "nothing-here"));
    }

    #[test]
    fn test_corrupt_scene() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        assert!(matches!(
            block_on(storage.load("broken")),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_rejects_unsafe_ids() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        for id in ["", "../escape", "a/b", "sky.json", "ünï"] {
            assert!(matches!(
                block_on(storage.save(id, &document())),
                Err(StorageError::InvalidId(_))
            ));
            assert!(block_on(storage.exists(id)).is_err());
        }
        assert!(block_on(storage.list()).unwrap().is_empty());
    }

    #[test]
    fn test_list_sorted_and_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let doc = document();
        block_on(storage.save("zodiac", &doc)).unwrap();
        block_on(storage.save("aurora", &doc)).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("bad name.json"), "{}").unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["aurora", "zodiac"]);

        block_on(storage.delete("zodiac")).unwrap();
        assert!(!block_on(storage.exists("zodiac")).unwrap());
        block_on(storage.delete("zodiac")).unwrap();
        assert_eq!(block_on(storage.list()).unwrap(), vec!["aurora"]);
    }
}
