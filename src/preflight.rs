use std::{
    env,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{config::REQUIRED_TOOLS, error::AppError};

/// Fails on the first required tool missing from PATH
pub fn check_required_tools() -> Result<(), AppError> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    check_tools_in(&REQUIRED_TOOLS, &path_var)
}

/// Checks each tool against the directories listed in `path_var`
pub fn check_tools_in(tools: &[&str], path_var: &OsStr) -> Result<(), AppError> {
    for tool in tools {
        match find_executable(tool, path_var) {
            Some(location) => debug!(tool, location = %location.display(), "found"),
            None => return Err(AppError::MissingTool(tool.to_string())),
        }
    }
    Ok(())
}

/// Resolves `name` against a PATH-style list of directories
pub fn find_executable(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, name))
        .find(|candidate| is_executable(candidate))
}

fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![dir.join(format!("{}.exe", name)), dir.join(name)]
    } else {
        vec![dir.join(name)]
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
