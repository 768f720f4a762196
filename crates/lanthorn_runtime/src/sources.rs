//! Reading world files and expanding `include` directives.
//!
//! An include path is relative to the directory of the file that names it.
//! Every file is read at most once, which also breaks include cycles: a file
//! that includes one of its own includers gets nothing back for that line.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use lanthorn_engine::{EngineConfig, LoadErrors, World, load_world};
use lanthorn_foundation::{Error, ErrorKind};
use lanthorn_language::{Item, parse_recovering};
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

/// Why a world could not be built from files.
#[derive(Debug, ThisError)]
pub enum SourceError {
    /// A file could not be read.
    #[error("{0}")]
    Read(Error),
    /// Every file was read, but the declarations did not load.
    #[error("{0}")]
    Load(#[from] LoadErrors),
}

/// A declaration that did not parse, with the file it came from.
#[derive(Clone, Debug)]
pub struct Skipped {
    /// File containing the malformed declaration.
    pub path: PathBuf,
    /// The parse error.
    pub error: Error,
}

/// Declarations gathered from one or more world files.
#[derive(Debug, Default)]
pub struct SourceSet {
    items: Vec<Item>,
    skipped: Vec<Skipped>,
    seen: HashSet<PathBuf>,
    files: Vec<PathBuf>,
}

impl SourceSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path` and, recursively, everything it includes.
    ///
    /// Included declarations take the place of the `include` line, so the
    /// combined order is the order a reader would meet them in.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` if `path` or one of its includes cannot be read.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let resolved = fs::canonicalize(path).map_err(|e| read_error(path, &e))?;
        if !self.seen.insert(resolved.clone()) {
            debug!(path = %path.display(), "already read, skipping");
            return Ok(());
        }
        let source = fs::read_to_string(&resolved).map_err(|e| read_error(path, &e))?;
        self.files.push(resolved.clone());

        let (items, errors) = parse_recovering(&source);
        for error in errors {
            warn!(path = %path.display(), %error, "declaration skipped");
            self.skipped.push(Skipped {
                path: resolved.clone(),
                error,
            });
        }

        let base = resolved.parent().map(Path::to_path_buf).unwrap_or_default();
        for item in items {
            match item {
                Item::Include(name, span) => {
                    self.add_file(base.join(&name))
                        .map_err(|e| e.in_operation("include").at(span.line, span.column))?;
                }
                Item::Declaration(_) => self.items.push(item),
            }
        }
        Ok(())
    }

    /// Adds declarations from text that has no file of its own.
    ///
    /// Includes in `source` resolve against `base`.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` if an included file cannot be read.
    pub fn add_source(&mut self, source: &str, base: impl AsRef<Path>) -> Result<(), Error> {
        let (items, errors) = parse_recovering(source);
        self.skipped.extend(errors.into_iter().map(|error| Skipped {
            path: PathBuf::new(),
            error,
        }));
        for item in items {
            match item {
                Item::Include(name, span) => {
                    self.add_file(base.as_ref().join(&name))
                        .map_err(|e| e.in_operation("include").at(span.line, span.column))?;
                }
                Item::Declaration(_) => self.items.push(item),
            }
        }
        Ok(())
    }

    /// The declarations read so far, in load order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Malformed declarations that were left out.
    #[must_use]
    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// Every file read, in the order they were opened.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Builds a world from the gathered declarations.
    ///
    /// # Errors
    ///
    /// Returns the load errors if the declarations do not form a world.
    pub fn load(&self, config: EngineConfig) -> Result<World, LoadErrors> {
        let world = load_world(&self.items, config)?;
        info!(
            files = self.files.len(),
            declarations = self.items.len(),
            skipped = self.skipped.len(),
            "sources loaded"
        );
        Ok(world)
    }
}

fn read_error(path: &Path, err: &std::io::Error) -> Error {
    Error::new(ErrorKind::IoError(format!(
        "failed to read '{}': {err}",
        path.display()
    )))
}

/// Reads every file in `paths` and builds one world from all of them.
///
/// # Errors
///
/// Returns [`SourceError::Read`] if a file is unreadable, or
/// [`SourceError::Load`] if the combined declarations fail to load.
pub fn load_files<P: AsRef<Path>>(paths: &[P], config: EngineConfig) -> Result<(World, Vec<Skipped>), SourceError> {
    let mut set = SourceSet::new();
    for path in paths {
        set.add_file(path).map_err(SourceError::Read)?;
    }
    let world = set.load(config)?;
    Ok((world, set.skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A scratch directory removed on drop.
    struct Scratch(PathBuf);

    impl Scratch {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("lanthorn_{name}_{}", std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn write(&self, name: &str, contents: &str) -> PathBuf {
            let path = self.0.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, contents).unwrap();
            path
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn names(set: &SourceSet) -> Vec<String> {
        set.items()
            .iter()
            .filter_map(|item| match item {
                Item::Declaration(decl) => Some(decl.name.clone()),
                Item::Include(..) => None,
            })
            .collect()
    }

    #[test]
    fn includes_are_relative_to_the_including_file() {
        let dir = Scratch::new("relative");
        dir.write("areas/cellar.lan", "def location cellar {}");
        dir.write("areas/town.lan", "include \"cellar.lan\";\ndef location square {}");
        let main = dir.write("world.lan", "def location hall {}\ninclude \"areas/town.lan\";\ndef entity lamp {}");

        let mut set = SourceSet::new();
        set.add_file(&main).unwrap();
        assert_eq!(names(&set), vec!["hall", "cellar", "square", "lamp"]);
        assert_eq!(set.files().len(), 3);
    }

    #[test]
    fn include_cycles_and_repeats_read_once() {
        let dir = Scratch::new("cycle");
        dir.write("a.lan", "include \"b.lan\";\ndef entity a {}");
        dir.write("b.lan", "include \"a.lan\";\ninclude \"b.lan\";\ndef entity b {}");
        let main = dir.write("main.lan", "include \"a.lan\";\ninclude \"b.lan\";");

        let mut set = SourceSet::new();
        set.add_file(&main).unwrap();
        assert_eq!(names(&set), vec!["b", "a"]);
    }

    #[test]
    fn missing_include_reports_position() {
        let dir = Scratch::new("missing");
        let main = dir.write("main.lan", "def entity a {}\ninclude \"nowhere.lan\";");

        let err = SourceSet::new().add_file(&main).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::IoError(ref m) if m.contains("nowhere.lan")));
        let ctx = err.context.unwrap();
        assert_eq!(ctx.source.as_deref(), Some("include"));
        assert_eq!(ctx.line, Some(2));
    }

    #[test]
    fn malformed_declarations_are_skipped_per_file() {
        let dir = Scratch::new("skipped");
        let main = dir.write("main.lan", "def entity good {}\ndef entity bad { x = ; }\ndef entity also {}");

        let (world, skipped) = load_files(&[main], EngineConfig::testing()).unwrap();
        assert_eq!(skipped.len(), 1);
        assert!(world.lookup("good").is_some());
        assert!(world.lookup("also").is_some());
        assert!(world.lookup("bad").is_none());
    }

    #[test]
    fn load_errors_come_back_whole() {
        let dir = Scratch::new("load");
        let main = dir.write("main.lan", "def entity a : ghost {}");
        let err = load_files(&[main], EngineConfig::testing()).unwrap_err();
        assert!(matches!(err, SourceError::Load(_)));
    }
}
