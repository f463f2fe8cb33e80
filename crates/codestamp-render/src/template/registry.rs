//! Template registry for file-based templates spread over several search roots.
//!
//! This module provides [`TemplateRegistry`], which maps template identifiers
//! to template files under one or more directories.
//!
//! # Template Resolution
//!
//! Identifiers are relative, `/`-separated paths. They resolve using these rules:
//!
//! 1. An identifier naming an existing file exactly (`"crud/create.py"`) resolves
//!    to it. Exact matches are collected from every root first.
//! 2. Only when no root holds the identifier exactly is it treated as a name
//!    without extension (`"crud/create"`) and matched against the files in
//!    that folder. A `greeting.txt.j2` in one root never shadows or collides
//!    with a `greeting.txt` in another.
//! 3. Every search root is consulted; two matches of the same kind in
//!    different roots are a [`RegistryError::Collision`], never a silent
//!    "first root wins"
//!
//! # Extensions
//!
//! By default every regular, non-hidden file is a template. A registry built
//! with [`TemplateRegistry::with_extensions`] only recognizes files ending in
//! one of the given extensions, and uses the list order as priority when two
//! files in one folder share a base name:
//!
//! | Files in folder | Lookup `"config"` without filter | With `[".jinja", ".txt"]` |
//! |-----------------|----------------------------------|---------------------------|
//! | `config.jinja` | `config.jinja` | `config.jinja` |
//! | `config.jinja`, `config.txt` | [`RegistryError::Ambiguous`] | `config.jinja` |
//!
//! # Caching
//!
//! Successful resolutions are cached per identifier. Call
//! [`TemplateRegistry::reload`] after templates are added, moved or removed on
//! disk so later lookups observe the change.
//!
//! # Example
//!
//! ```rust,ignore
//! use codestamp_render::TemplateRegistry;
//!
//! let registry = TemplateRegistry::new(["./templates", "./vendor/templates"])?;
//! let source = registry.read_raw("crud/create")?;
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Directory used when no search root is configured.
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// A resolved template: where its source lives and the name it resolved to.
///
/// # Fields
///
/// - `id`: The identifier as requested (e.g., `"crud/create"`)
/// - `name`: The canonical relative path with extension (e.g., `"crud/create.py"`)
/// - `path`: Absolute or root-relative filesystem path for reading content
/// - `root`: The search root this file came from (for collision reporting)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateHandle {
    /// Identifier as requested by the caller.
    pub id: String,
    /// Canonical name relative to the root, including extension.
    pub name: String,
    /// Path to the template file.
    pub path: PathBuf,
    /// The search root this file belongs to.
    pub root: PathBuf,
}

/// Error type for template registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A configured search root does not exist or is not a directory.
    #[error("template directory not found: {}", .path.display())]
    RootNotFound {
        /// The missing directory
        path: PathBuf,
    },

    /// The identifier is not a valid relative template name.
    #[error("invalid template name \"{name}\": {reason}")]
    InvalidName {
        /// The rejected identifier
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Template not found in any search root.
    #[error("template not found: \"{name}\"")]
    NotFound {
        /// The name that was requested
        name: String,
    },

    /// Two search roots contain files that resolve to the same identifier.
    ///
    /// This is a configuration error that must be fixed by whoever lays out
    /// the template directories.
    #[error(
        "template collision detected for \"{name}\":\n  - {} (from {})\n  - {} (from {})",
        .existing_path.display(),
        .existing_dir.display(),
        .conflicting_path.display(),
        .conflicting_dir.display()
    )]
    Collision {
        /// The template name that has conflicting sources
        name: String,
        /// Path to the first match
        existing_path: PathBuf,
        /// Root containing the first match
        existing_dir: PathBuf,
        /// Path to the conflicting match
        conflicting_path: PathBuf,
        /// Root containing the conflicting match
        conflicting_dir: PathBuf,
    },

    /// Several files in one folder match an extensionless identifier and no
    /// extension priority is configured to pick one.
    #[error("template name \"{name}\" is ambiguous: {}", join_paths(.candidates))]
    Ambiguous {
        /// The name that was requested
        name: String,
        /// Matching files
        candidates: Vec<PathBuf>,
    },

    /// Failed to read a template file or directory from disk.
    #[error("failed to read \"{}\": {message}", .path.display())]
    ReadError {
        /// Path that failed to read
        path: PathBuf,
        /// Error message
        message: String,
    },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Registry resolving template identifiers against ordered search roots.
///
/// The registry is shared between the generator and the rendering engine's
/// loader, so every method takes `&self`; the resolution cache sits behind a
/// lock.
#[derive(Debug)]
pub struct TemplateRegistry {
    roots: Vec<PathBuf>,
    extensions: Option<Vec<String>>,
    cache: RwLock<HashMap<String, TemplateHandle>>,
}

impl TemplateRegistry {
    /// Creates a registry over the given search roots.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RootNotFound`] if any root is not an existing
    /// directory.
    pub fn new<I, P>(roots: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots: Vec<PathBuf> = roots.into_iter().map(Into::into).collect();
        for root in &roots {
            if !root.is_dir() {
                return Err(RegistryError::RootNotFound { path: root.clone() });
            }
        }
        Ok(Self {
            roots,
            extensions: None,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Creates a registry over [`DEFAULT_TEMPLATE_DIR`], relative to the
    /// working directory.
    pub fn with_default_root() -> Result<Self, RegistryError> {
        Self::new([DEFAULT_TEMPLATE_DIR])
    }

    /// Restricts templates to files ending in one of `extensions`.
    ///
    /// Earlier extensions take precedence for extensionless lookups. A
    /// leading dot is added when missing.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions = extensions
            .into_iter()
            .map(Into::into)
            .map(|ext: String| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        self.extensions = Some(extensions);
        self.reload();
        self
    }

    /// The search roots, in registration order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// The recognized extensions, if a filter is configured.
    pub fn extensions(&self) -> Option<&[String]> {
        self.extensions.as_deref()
    }

    /// Looks up a template by identifier.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidName`] for empty, absolute, or `..` identifiers
    /// - [`RegistryError::NotFound`] if no root holds the template
    /// - [`RegistryError::Collision`] if more than one root holds it
    /// - [`RegistryError::Ambiguous`] if an extensionless name matches several files
    pub fn resolve(&self, id: &str) -> Result<TemplateHandle, RegistryError> {
        validate_name(id)?;

        if let Ok(cache) = self.cache.read() {
            if let Some(handle) = cache.get(id) {
                return Ok(handle.clone());
            }
        }

        let handle = self.locate(id)?;
        tracing::debug!(template_id = %id, path = ?handle.path, "Resolved template");

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id.to_string(), handle.clone());
        }
        Ok(handle)
    }

    /// Returns true if `id` resolves to exactly one template.
    pub fn exists(&self, id: &str) -> bool {
        self.resolve(id).is_ok()
    }

    /// Returns the unrendered source of a template.
    pub fn read_raw(&self, id: &str) -> Result<String, RegistryError> {
        let handle = self.resolve(id)?;
        fs::read_to_string(&handle.path).map_err(|e| RegistryError::ReadError {
            path: handle.path,
            message: e.to_string(),
        })
    }

    /// Source lookup in the shape a template loader expects.
    ///
    /// A missing template is `Ok(None)`; every other failure is an error.
    pub fn load_source(&self, id: &str) -> Result<Option<String>, RegistryError> {
        match self.read_raw(id) {
            Ok(source) => Ok(Some(source)),
            Err(RegistryError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Lists the templates at the top level of every root.
    ///
    /// Names include their extension. Subdirectories are not descended into,
    /// so `sub/c.py` is resolvable but not listed. Names present in several
    /// roots appear once.
    pub fn list(&self) -> Result<BTreeSet<String>, RegistryError> {
        let mut names = BTreeSet::new();
        for root in &self.roots {
            let entries = fs::read_dir(root).map_err(|e| RegistryError::ReadError {
                path: root.clone(),
                message: e.to_string(),
            })?;
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !self.is_template_file(file_name) {
                    continue;
                }
                if !names.insert(file_name.to_string()) {
                    tracing::warn!(
                        name = %file_name,
                        ?root,
                        "Template present in more than one search root"
                    );
                }
            }
        }
        Ok(names)
    }

    /// Drops cached resolutions so later lookups see filesystem changes.
    pub fn reload(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        tracing::debug!("Template resolution cache cleared");
    }

    fn locate(&self, id: &str) -> Result<TemplateHandle, RegistryError> {
        let exact: Vec<TemplateHandle> = self
            .roots
            .iter()
            .filter_map(|root| self.exact_in_root(root, id))
            .collect();
        if !exact.is_empty() {
            return single(id, exact);
        }

        let mut stems = Vec::new();
        for root in &self.roots {
            if let Some(handle) = self.stem_in_root(root, id)? {
                stems.push(handle);
            }
        }
        single(id, stems)
    }

    fn exact_in_root(&self, root: &Path, id: &str) -> Option<TemplateHandle> {
        let base = id.rsplit_once('/').map_or(id, |(_, base)| base);
        let path = root.join(id);
        (path.is_file() && self.is_template_file(base)).then(|| TemplateHandle {
            id: id.to_string(),
            name: id.to_string(),
            path,
            root: root.to_path_buf(),
        })
    }

    fn stem_in_root(
        &self,
        root: &Path,
        id: &str,
    ) -> Result<Option<TemplateHandle>, RegistryError> {
        let (folder, base) = match id.rsplit_once('/') {
            Some((folder, base)) => (Some(folder), base),
            None => (None, id),
        };

        let dir = folder.map_or_else(|| root.to_path_buf(), |f| root.join(f));
        if !dir.is_dir() {
            return Ok(None);
        }
        let entries = fs::read_dir(&dir).map_err(|e| RegistryError::ReadError {
            path: dir.clone(),
            message: e.to_string(),
        })?;

        let mut candidates: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|file_name| self.is_template_file(file_name))
            .filter(|file_name| self.strip_extension(file_name) == base)
            .collect();

        let chosen = match candidates.len() {
            0 => return Ok(None),
            1 => candidates.remove(0),
            _ => match &self.extensions {
                Some(_) => {
                    candidates.sort_by_key(|name| self.extension_priority(name));
                    candidates.remove(0)
                }
                None => {
                    candidates.sort();
                    return Err(RegistryError::Ambiguous {
                        name: id.to_string(),
                        candidates: candidates.iter().map(|c| dir.join(c)).collect(),
                    });
                }
            },
        };

        let name = match folder {
            Some(folder) => format!("{folder}/{chosen}"),
            None => chosen.clone(),
        };
        Ok(Some(TemplateHandle {
            id: id.to_string(),
            name,
            path: dir.join(chosen),
            root: root.to_path_buf(),
        }))
    }

    fn is_template_file(&self, file_name: &str) -> bool {
        if file_name.starts_with('.') {
            return false;
        }
        match &self.extensions {
            Some(exts) => exts.iter().any(|ext| file_name.ends_with(ext.as_str())),
            None => true,
        }
    }

    fn extension_priority(&self, file_name: &str) -> usize {
        self.extensions
            .as_ref()
            .and_then(|exts| exts.iter().position(|ext| file_name.ends_with(ext.as_str())))
            .unwrap_or(usize::MAX)
    }

    fn strip_extension<'a>(&self, file_name: &'a str) -> &'a str {
        if let Some(exts) = &self.extensions {
            for ext in exts {
                if let Some(stripped) = file_name.strip_suffix(ext.as_str()) {
                    return stripped;
                }
            }
            return file_name;
        }
        match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        }
    }
}

/// Exactly one match resolves; two or more across roots collide.
fn single(id: &str, matches: Vec<TemplateHandle>) -> Result<TemplateHandle, RegistryError> {
    let mut matches = matches.into_iter();
    let Some(first) = matches.next() else {
        return Err(RegistryError::NotFound {
            name: id.to_string(),
        });
    };
    match matches.next() {
        None => Ok(first),
        Some(second) => Err(RegistryError::Collision {
            name: id.to_string(),
            existing_path: first.path,
            existing_dir: first.root,
            conflicting_path: second.path,
            conflicting_dir: second.root,
        }),
    }
}

fn validate_name(id: &str) -> Result<(), RegistryError> {
    let invalid = |reason| {
        Err(RegistryError::InvalidName {
            name: id.to_string(),
            reason,
        })
    };

    if id.is_empty() {
        return invalid("name is empty");
    }
    if id.starts_with('/') || id.contains('\\') || Path::new(id).is_absolute() {
        return invalid("name must be a relative, '/'-separated path");
    }
    if id.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return invalid("name must not contain empty, '.' or '..' segments");
    }
    Ok(())
}
