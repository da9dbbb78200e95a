//! Corpus discovery and loading.
//!
//! A corpus comes either from a manifest (numeric ids, titles) or from a flat
//! directory of `*.txt` files whose names double as display names.

mod assets;
pub mod manifest;

pub use assets::{AssetSource, DirectoryAssets, EmbeddedAssets};

use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::menu::SearchDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ContentMode {
    Manifest,
    Directory,
}

/// Stable identifier of a corpus in the state store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Numeric(u32),
    Named(String),
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKey::Numeric(id) => write!(f, "{id}"),
            SourceKey::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDescriptor {
    pub id: u32,
    pub name: String,
    pub key: SourceKey,
}

#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub descriptor: CorpusDescriptor,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSearch {
    pub query: String,
    pub direction: SearchDirection,
}

/// Keeps printable ASCII, `\n` and `\t`; drops every other byte.
pub fn ascii_filter(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|&&b| b == b'\n' || b == b'\t' || (0x20..=0x7E).contains(&b))
        .map(|&b| char::from(b))
        .collect()
}

fn display_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(".txt")?;
    Some(stem.replace('-', "/"))
}

fn file_name_for(display_name: &str) -> String {
    format!("{}.txt", display_name.replace('/', "-"))
}

pub struct ContentManager {
    assets: Box<dyn AssetSource>,
    mode: ContentMode,
    available: Vec<CorpusDescriptor>,
    filenames: HashMap<u32, String>,
    current: Option<LoadedCorpus>,
    last_search: Option<LastSearch>,
    pending_flash: Option<String>,
}

impl fmt::Debug for ContentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentManager")
            .field("mode", &self.mode)
            .field("available", &self.available.len())
            .field("current", &self.current.as_ref().map(|c| &c.descriptor.name))
            .finish_non_exhaustive()
    }
}

impl ContentManager {
    pub fn new(assets: Box<dyn AssetSource>, mode: ContentMode) -> Result<Self> {
        Self::with_rng(assets, mode, &mut rand::thread_rng())
    }

    /// Like [`ContentManager::new`] with the initial corpus drawn from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        assets: Box<dyn AssetSource>,
        mode: ContentMode,
        rng: &mut R,
    ) -> Result<Self> {
        let mut manager = Self {
            assets,
            mode,
            available: Vec::new(),
            filenames: HashMap::new(),
            current: None,
            last_search: None,
            pending_flash: None,
        };
        manager.discover()?;
        info!(mode = %mode, corpora = manager.available.len(), "content discovered");

        if !manager.available.is_empty() {
            let id = manager.available[rng.gen_range(0..manager.available.len())].id;
            if let Err(err) = manager.load_by_id(id) {
                warn!(id, %err, "could not preload initial corpus");
            }
        }
        Ok(manager)
    }

    fn discover(&mut self) -> Result<()> {
        match self.mode {
            ContentMode::Manifest => {
                let bytes = self.assets.read(manifest::MANIFEST_FILE)?;
                for entry in manifest::parse(&bytes)? {
                    if let Some(filename) = entry.filename {
                        self.filenames.insert(entry.id, filename);
                    }
                    self.available.push(CorpusDescriptor {
                        id: entry.id,
                        key: SourceKey::Numeric(entry.id),
                        name: entry.title,
                    });
                }
            }
            ContentMode::Directory => {
                let names = self.assets.list_files()?;
                let corpora = names.iter().filter_map(|file| display_name(file));
                for (id, name) in (0u32..).zip(corpora) {
                    self.available.push(CorpusDescriptor {
                        id,
                        key: SourceKey::Named(name.clone()),
                        name,
                    });
                }
            }
        }
        self.available
            .sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(())
    }

    pub fn mode(&self) -> ContentMode {
        self.mode
    }

    pub fn available(&self) -> &[CorpusDescriptor] {
        &self.available
    }

    pub fn source_key_for(&self, descriptor: &CorpusDescriptor) -> String {
        descriptor.key.to_string()
    }

    pub fn load_by_id(&mut self, id: u32) -> Result<&LoadedCorpus> {
        let descriptor = self
            .available
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("content with id {id}")))?;
        let file = match self.mode {
            ContentMode::Manifest => self
                .filenames
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::asset_io(manifest::MANIFEST_FILE, format!("no filename for id {id}")))?,
            ContentMode::Directory => file_name_for(&descriptor.name),
        };
        self.load(descriptor, &file)
    }

    pub fn load_by_name(&mut self, name: &str) -> Result<&LoadedCorpus> {
        if self.mode == ContentMode::Manifest {
            return Err(Error::invalid_input(
                "loading by name is not supported for manifest content",
            ));
        }
        let descriptor = self
            .available
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("content \"{name}\"")))?;
        self.load(descriptor, &file_name_for(name))
    }

    fn load(&mut self, descriptor: CorpusDescriptor, file: &str) -> Result<&LoadedCorpus> {
        let text = ascii_filter(&self.assets.read(file)?);
        debug!(name = %descriptor.name, file, bytes = text.len(), "corpus loaded");
        Ok(&*self.current.insert(LoadedCorpus { descriptor, text }))
    }

    pub fn current_text(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.text.as_str())
    }

    pub fn current_descriptor(&self) -> Option<&CorpusDescriptor> {
        self.current.as_ref().map(|c| &c.descriptor)
    }

    pub fn set_last_search(&mut self, query: impl Into<String>, direction: SearchDirection) {
        self.last_search = Some(LastSearch {
            query: query.into(),
            direction,
        });
    }

    pub fn last_search(&self) -> Option<&LastSearch> {
        self.last_search.as_ref()
    }

    pub fn set_pending_flash(&mut self, message: impl Into<String>) {
        self.pending_flash = Some(message.into());
    }

    /// Returns the pending flash once; later calls get `None`.
    pub fn take_pending_flash(&mut self) -> Option<String> {
        self.pending_flash.take()
    }
}
