//! Configuration and artifact paths

use std::io;
use std::path::{Path, PathBuf};

/// Name used for per-user directories
const APP_NAME: &str = "board-e2e";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "e2e.toml";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/board-e2e/`
/// - macOS: `~/Library/Application Support/board-e2e/`
/// - Windows: `%APPDATA%\board-e2e\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the per-user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the configuration file in the working directory
pub fn local_config_path() -> PathBuf {
    PathBuf::from(LOCAL_CONFIG_FILE)
}

/// Turn a scenario name into something safe to use as a file name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("scenario");
    }
    slug
}

/// Path of the screenshot taken when a scenario fails
pub fn failure_screenshot_path(folder: &Path, scenario: &str) -> PathBuf {
    folder.join(format!("{} (failed).png", slugify(scenario)))
}

/// Path of a single recorded frame
pub fn frame_path(folder: &Path, scenario: &str, index: usize) -> PathBuf {
    folder
        .join(slugify(scenario))
        .join(format!("frame-{:03}.png", index))
}

/// Ensure the parent directory of `path` exists
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_valid() {
        let dir = config_dir();
        assert!(dir.is_some());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("basic app flow and use"), "basic-app-flow-and-use");
        assert_eq!(slugify("  Level: 1!  "), "level-1");
        assert_eq!(slugify("???"), "scenario");
    }

    #[test]
    fn test_artifact_paths() {
        let folder = Path::new("e2e/screenshots");
        assert_eq!(
            failure_screenshot_path(folder, "basic app flow and use"),
            PathBuf::from("e2e/screenshots/basic-app-flow-and-use (failed).png")
        );
        assert_eq!(
            frame_path(Path::new("e2e/videos"), "Board", 7),
            PathBuf::from("e2e/videos/board/frame-007.png")
        );
    }

    #[test]
    fn test_ensure_parent_dir_creates_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a").join("b").join("shot.png");
        ensure_parent_dir(&path).unwrap();
        assert!(tmp.path().join("a").join("b").is_dir());
    }
}
