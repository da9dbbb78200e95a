use include_dir::Dir;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Flat collection of named files a corpus is read from.
pub trait AssetSource {
    fn read(&self, name: &str) -> Result<Cow<'_, [u8]>>;

    /// File names at the root, sorted lexically.
    fn list_files(&self) -> Result<Vec<String>>;
}

/// Files compiled into the binary with `include_dir!`.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedAssets {
    dir: &'static Dir<'static>,
}

impl EmbeddedAssets {
    pub const fn new(dir: &'static Dir<'static>) -> Self {
        Self { dir }
    }
}

impl AssetSource for EmbeddedAssets {
    fn read(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        self.dir
            .get_file(name)
            .map(|file| Cow::Borrowed(file.contents()))
            .ok_or_else(|| Error::asset_io(name, "file is missing"))
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .dir
            .files()
            .filter_map(|file| file.path().file_name()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Files read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl AssetSource for DirectoryAssets {
    fn read(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        let path = self.root.join(name);
        fs::read(&path)
            .map(Cow::Owned)
            .map_err(|err| Error::asset_io(path.display().to_string(), err))
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|err| Error::asset_io(self.root.display().to_string(), err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| Error::asset_io(self.root.display().to_string(), err))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use include_dir::include_dir;
    use tempfile::tempdir;

    static DOCS: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets/docs");

    #[test]
    fn embedded_docs_are_listed_sorted() {
        let assets = EmbeddedAssets::new(&DOCS);
        let names = assets.list_files().unwrap();
        assert!(!names.is_empty());
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
        let first = assets.read(&names[0]).unwrap();
        assert!(!first.is_empty());
    }

    #[test]
    fn embedded_missing_file() {
        let assets = EmbeddedAssets::new(&DOCS);
        assert_matches!(assets.read("nope.txt"), Err(Error::AssetIo { .. }));
    }

    #[test]
    fn directory_lists_files_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let assets = DirectoryAssets::new(dir.path());
        assert_eq!(assets.list_files().unwrap(), vec!["a.txt", "b.txt"]);
        assert_eq!(&*assets.read("b.txt").unwrap(), b"b");
        assert_matches!(assets.read("c.txt"), Err(Error::AssetIo { .. }));
    }

    #[test]
    fn missing_directory_is_an_asset_error() {
        let assets = DirectoryAssets::new("/definitely/not/here");
        assert_matches!(assets.list_files(), Err(Error::AssetIo { .. }));
    }
}
