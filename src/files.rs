use std::{
    fs, io,
    path::{Path, PathBuf},
};

use uuid::Uuid;

/// An uploaded file, fully read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

impl Upload {
    fn extension(&self) -> Option<String> {
        let name = self.file_name.as_deref()?;
        let ext = Path::new(name).extension()?.to_str()?;
        if ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(ext.to_ascii_lowercase())
        } else {
            None
        }
    }
}

/// Writes uploads below a root directory, one folder per resource kind.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saves the upload under a fresh unique name and returns the reference
    /// stored in the row, `<folder>/<uuid>.<ext>`.
    pub fn save(&self, folder: &str, upload: &Upload) -> io::Result<String> {
        let dir = self.root.join(folder);
        fs::create_dir_all(&dir)?;

        let name = match upload.extension() {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        fs::write(dir.join(&name), &upload.content)?;
        log::debug!("stored upload {:?} as {}/{}", upload.file_name, folder, name);
        Ok(format!("{folder}/{name}"))
    }

    /// Removes a stored upload that no committed row refers to.
    pub fn discard(&self, reference: &str) {
        match fs::remove_file(self.root.join(reference)) {
            Ok(()) => log::debug!("discarded upload {}", reference),
            Err(e) => log::warn!("could not discard upload {}: {}", reference, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_under_folder_with_unique_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let upload = Upload {
            file_name: Some("Burger.PNG".to_string()),
            content: b"png".to_vec(),
        };

        let first = store.save("FoodItem", &upload).unwrap();
        let second = store.save("FoodItem", &upload).unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("FoodItem/"));
        assert!(first.ends_with(".png"));
        assert_eq!(fs::read(dir.path().join(&first)).unwrap(), b"png");
    }

    #[test]
    fn discard_removes_the_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let upload = Upload {
            file_name: Some("tmp.jpg".to_string()),
            content: b"jpg".to_vec(),
        };
        let reference = store.save("FoodItem", &upload).unwrap();

        store.discard(&reference);
        assert!(!dir.path().join(&reference).exists());
        // already gone: only logged
        store.discard(&reference);
    }

    #[test]
    fn drops_suspicious_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let upload = Upload {
            file_name: Some("evil.p/../hp".to_string()),
            content: vec![1, 2, 3],
        };
        let reference = store.save("FoodCategory", &upload).unwrap();
        assert!(!reference.contains(".."));
        assert_eq!(reference.matches('/').count(), 1);
    }
}
