//! Object library resolver
//!
//! An `<Object Name="Shop"/>` without `<Content>` is an instance of a
//! definition found elsewhere: in the importing document's own `<Objects>`
//! section or in a set file referenced from `<Sets>`. Precedence:
//!
//! - definitions local to the document always win
//! - across referenced sets the first definition seen wins
//! - each set file is read at most once per import
//!
//! The library lives inside one import context and is dropped with it.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::path_utils::resolve_reference;
use crate::xml::{self, XmlError, XmlNode};

/// Set kinds that contribute definitions
const SET_KINDS: [&str; 2] = ["City", "Ground"];

/// Deprecated set kind, recognized and skipped
const LEGACY_SET_KIND: &str = "Library";

/// Error types for set file loading
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
}

/// Name-keyed object definitions for one import
#[derive(Debug, Default)]
pub struct ObjectLibrary {
    definitions: HashMap<String, XmlNode>,
    loaded: HashSet<PathBuf>,
}

impl ObjectLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definition(&self, name: &str) -> Option<&XmlNode> {
        self.definitions.get(name)
    }

    /// Set files read so far
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.contains(path)
    }

    /// Load every `City`/`Ground` set referenced by `document`, then the sets
    /// they reference. Missing or unreadable sets are logged and skipped.
    pub fn load_referenced_sets(&mut self, base_dir: &Path, document: &XmlNode) {
        let Some(sets) = document.child("Sets") else {
            return;
        };

        for reference in &sets.children {
            if reference.name == LEGACY_SET_KIND {
                tracing::debug!("Skipping deprecated <{}> set", LEGACY_SET_KIND);
                continue;
            }
            if !SET_KINDS.contains(&reference.name.as_str()) {
                continue;
            }
            let Some(file_name) = reference.attr("FileName").filter(|f| !f.trim().is_empty()) else {
                continue;
            };

            let path = resolve_reference(base_dir, file_name);
            if !self.loaded.insert(path.clone()) {
                tracing::debug!("Set already loaded: {}", path.display());
                continue;
            }
            if !path.exists() {
                tracing::warn!("Missing referenced set: {}", path.display());
                continue;
            }
            if let Err(e) = self.load_set_file(&path) {
                tracing::warn!("Skipping set {}: {}", path.display(), e);
            }
        }
    }

    fn load_set_file(&mut self, path: &Path) -> Result<(), LibraryError> {
        let source = std::fs::read_to_string(path)?;
        let document = xml::parse_document(&source)?;

        let set_dir = path.parent().unwrap_or(Path::new(""));
        self.load_referenced_sets(set_dir, &document);

        if let Some(objects) = document.child("Objects") {
            let added = self.register(objects);
            tracing::debug!("Loaded {} definitions from {}", added, path.display());
        }
        Ok(())
    }

    /// Register the `<Object>` children of a section without replacing
    /// existing names. Returns how many were added.
    pub fn register(&mut self, objects: &XmlNode) -> usize {
        let mut added = 0;
        for (name, object) in named_objects(objects) {
            if !self.definitions.contains_key(name) {
                self.definitions.insert(name.to_string(), object.clone());
                added += 1;
            }
        }
        added
    }

    /// Register the importing document's own objects over any loaded ones
    pub fn register_local(&mut self, objects: &XmlNode) {
        for (name, object) in named_objects(objects) {
            self.definitions.insert(name.to_string(), object.clone());
        }
    }

    /// Effective element for an instance.
    ///
    /// Only `<Object>` elements without `<Content>` are merged: attributes of
    /// the instance win, missing ones come from the definition, and the
    /// definition's `<Content>` is copied verbatim. Everything else is
    /// returned unchanged.
    pub fn resolve<'x>(&self, instance: &'x XmlNode) -> Cow<'x, XmlNode> {
        if instance.name != "Object" || instance.child("Content").is_some() {
            return Cow::Borrowed(instance);
        }
        let Some(name) = instance.attr("Name").filter(|n| !n.trim().is_empty()) else {
            return Cow::Borrowed(instance);
        };
        let Some(definition) = self.definitions.get(name) else {
            return Cow::Borrowed(instance);
        };
        let Some(content) = definition.child("Content") else {
            return Cow::Borrowed(instance);
        };

        let mut merged = instance.clone();
        for (key, value) in &definition.attributes {
            if !merged.has_attr(key) {
                merged.set_attr(key, value.as_str());
            }
        }
        merged.push_child(content.clone());
        Cow::Owned(merged)
    }
}

fn named_objects(section: &XmlNode) -> impl Iterator<Item = (&str, &XmlNode)> {
    section.children_named("Object").filter_map(|object| {
        object
            .attr("Name")
            .filter(|n| !n.trim().is_empty())
            .map(|name| (name, object))
    })
}
