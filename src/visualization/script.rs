//! Visualization script discovery
//!
//! An explicitly configured script path always wins. Without one, the
//! project root is guessed by walking up from the working directory: first a
//! fixed number of levels, then a bounded search one level at a time.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::VisualizationError;

/// Where the script lives and where it must run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScript {
    pub script_path: PathBuf,
    /// The script's containing directory; also where the output appears
    pub working_dir: PathBuf,
}

impl ResolvedScript {
    fn from_script(script_path: PathBuf) -> Self {
        let working_dir = script_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            script_path,
            working_dir,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptLocator {
    pub explicit: Option<PathBuf>,
    /// Script path relative to the project root
    pub relative_path: PathBuf,
    /// Parent levels between the working directory and the project root
    pub primary_depth: usize,
    pub max_search_attempts: usize,
}

impl ScriptLocator {
    pub fn locate(&self, cwd: &Path) -> Result<ResolvedScript, VisualizationError> {
        if let Some(explicit) = &self.explicit {
            let script = absolutize(cwd, explicit);
            debug!("Using configured script path {}", script.display());
            return if script.is_file() {
                Ok(ResolvedScript::from_script(script))
            } else {
                Err(VisualizationError::ScriptNotFound { last_tried: script })
            };
        }

        let primary = walk_up(cwd, self.primary_depth).join(&self.relative_path);
        debug!("Looking for script at {}", primary.display());
        if primary.is_file() {
            return Ok(ResolvedScript::from_script(primary));
        }

        warn!(
            "Script not at {}; searching parent directories of {} (set GALILEO_SCRIPT_PATH to skip this)",
            primary.display(),
            cwd.display()
        );

        let mut last_tried = primary;
        for attempt in 0..self.max_search_attempts {
            let candidate = walk_up(cwd, attempt).join(&self.relative_path);
            debug!("Attempt {}: testing {}", attempt + 1, candidate.display());
            if candidate.is_file() {
                info!("Found script at {}", candidate.display());
                return Ok(ResolvedScript::from_script(candidate));
            }
            last_tried = candidate;
        }

        Err(VisualizationError::ScriptNotFound { last_tried })
    }
}

/// `dir` followed by `levels` `..` components, stopping at the filesystem root
fn walk_up(dir: &Path, levels: usize) -> PathBuf {
    dir.ancestors()
        .nth(levels)
        .or_else(|| dir.ancestors().last())
        .unwrap_or(dir)
        .to_path_buf()
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RELATIVE: &str = "public/standalone-viz/iMSMS_emperor.py";

    fn locator() -> ScriptLocator {
        ScriptLocator {
            explicit: None,
            relative_path: PathBuf::from(RELATIVE),
            primary_depth: 5,
            max_search_attempts: 10,
        }
    }

    fn place_script(root: &Path) -> PathBuf {
        let script = root.join(RELATIVE);
        std::fs::create_dir_all(script.parent().unwrap()).unwrap();
        std::fs::write(&script, "print('viz')").unwrap();
        script
    }

    fn nested(root: &Path, depth: usize) -> PathBuf {
        let mut dir = root.to_path_buf();
        for i in 0..depth {
            dir = dir.join(format!("level{i}"));
        }
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_walk_up_stops_at_root() {
        assert_eq!(walk_up(Path::new("/a/b"), 1), PathBuf::from("/a"));
        assert_eq!(walk_up(Path::new("/a/b"), 10), PathBuf::from("/"));
    }

    #[test]
    fn test_primary_location() {
        let root = TempDir::new().unwrap();
        let script = place_script(root.path());
        let cwd = nested(root.path(), 5);

        let resolved = locator().locate(&cwd).unwrap();
        assert_eq!(resolved.script_path, script);
        assert_eq!(resolved.working_dir, script.parent().unwrap());
    }

    #[test]
    fn test_fallback_search_finds_shallower_root() {
        let root = TempDir::new().unwrap();
        let script = place_script(root.path());
        let cwd = nested(root.path(), 2);

        let resolved = locator().locate(&cwd).unwrap();
        assert_eq!(resolved.script_path, script);
    }

    #[test]
    fn test_fallback_search_at_working_directory() {
        let root = TempDir::new().unwrap();
        let script = place_script(root.path());

        let resolved = locator().locate(root.path()).unwrap();
        assert_eq!(resolved.script_path, script);
    }

    #[test]
    fn test_search_gives_up_after_max_attempts() {
        let root = TempDir::new().unwrap();
        place_script(root.path());
        let cwd = nested(root.path(), 4);

        let mut short = locator();
        short.primary_depth = 1;
        short.max_search_attempts = 3;

        let err = short.locate(&cwd).unwrap_err();
        match err {
            VisualizationError::ScriptNotFound { last_tried } => {
                assert_eq!(last_tried, walk_up(&cwd, 2).join(RELATIVE));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_explicit_path_used_verbatim() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("viz.py");
        std::fs::write(&script, "").unwrap();

        let mut explicit = locator();
        explicit.explicit = Some(script.clone());
        let resolved = explicit.locate(Path::new("/")).unwrap();
        assert_eq!(resolved.script_path, script);
        assert_eq!(resolved.working_dir, root.path());
    }

    #[test]
    fn test_explicit_path_missing_does_not_search() {
        let root = TempDir::new().unwrap();
        place_script(root.path());

        let mut explicit = locator();
        explicit.explicit = Some(root.path().join("missing.py"));
        assert!(matches!(
            explicit.locate(root.path()),
            Err(VisualizationError::ScriptNotFound { .. })
        ));
    }
}
