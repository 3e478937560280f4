//! Pre-flight checks for the target program.
//!
//! Validates the target before anything starts and resolves the invocation
//! context. All failures here are [`ConfigError`]s: they abort startup with
//! a usage error, never surface once the server is running.

use crate::domain::ConfigError;
use std::path::{Path, PathBuf};

/// A validated target: absolute program path plus the working directory the
/// child runs in (the program's own directory, so its relative paths
/// resolve the way they do when launched by hand from there).
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub program: PathBuf,
    pub workdir: PathBuf,
    /// What the user typed; used as the report title.
    pub display_name: String,
}

/// Resolve and validate a target program path.
pub fn resolve_target(raw: &str) -> Result<ResolvedTarget, ConfigError> {
    let path = Path::new(raw);
    if !path.exists() {
        return Err(ConfigError::TargetNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()));
    }
    check_executable(path)?;

    let program = path
        .canonicalize()
        .map_err(|_| ConfigError::TargetNotFound(path.to_path_buf()))?;
    let workdir = program
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    Ok(ResolvedTarget { program, workdir, display_name: raw.to_owned() })
}

#[cfg(unix)]
fn check_executable(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = path
        .metadata()
        .map_err(|_| ConfigError::TargetNotFound(path.to_path_buf()))?
        .permissions()
        .mode();
    if mode & 0o111 == 0 {
        return Err(ConfigError::NotExecutable(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_executable(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_target_is_rejected() {
        let err = resolve_target("/no/such/program").unwrap_err();
        assert!(matches!(err, ConfigError::TargetNotFound(_)));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_target(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAFile(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "not a program").unwrap();
        let err = resolve_target(file.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::NotExecutable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn workdir_is_the_program_directory() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool");
        std::fs::write(&file, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o755)).unwrap();

        let target = resolve_target(file.to_str().unwrap()).unwrap();
        assert_eq!(target.workdir, dir.path().canonicalize().unwrap());
        assert_eq!(target.display_name, file.to_str().unwrap());
    }
}
