//! Migration script discovery.

use std::path::{Path, PathBuf};

use crate::error::MigratorResult;

/// Returns true for file names the runner treats as migration scripts.
///
/// Accepts `.cjs`, `.js` and `.ts` files while excluding TypeScript
/// declaration files (`*.d.ts`).
#[must_use]
pub fn is_migration_script(name: &str) -> bool {
    if name.ends_with(".d.ts") {
        return false;
    }
    name.ends_with(".cjs") || name.ends_with(".js") || name.ends_with(".ts")
}

/// Discovery parameters for migration scripts: a directory and the
/// filename filter above.
#[derive(Debug, Clone)]
pub struct ScriptDiscovery {
    dir: PathBuf,
}

impl ScriptDiscovery {
    /// Creates discovery parameters for the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the scripts directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists the script file names in the directory, sorted by name.
    ///
    /// A missing directory yields an empty list; migration ordering is
    /// derived from the lexicographic file name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn discover(&self) -> MigratorResult<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_migration_script(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
