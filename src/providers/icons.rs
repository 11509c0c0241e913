//! Icon lookup on the local filesystem

use std::path::{Path, PathBuf};

const ICON_EXTENSIONS: &[&str] = &["png", "svg", "xpm"];
const HICOLOR_SIZES: &[&str] = &["128x128", "64x64", "48x48", "scalable"];

/// Default directories searched for application icons
pub fn default_icon_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/pixmaps"),
        PathBuf::from("/usr/share/icons/hicolor/48x48/apps"),
        PathBuf::from("/usr/share/icons/hicolor/scalable/apps"),
    ];
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join(".local/share/icons"));
    }
    dirs
}

/// Default Flatpak export icon roots
pub fn default_flatpak_icon_roots() -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from("/var/lib/flatpak/exports/share/icons")];
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".local/share/flatpak/exports/share/icons"));
    }
    roots
}

/// Resolve a desktop-entry `Icon` value to a file path, or `fallback`
///
/// Absolute values must exist. Names are looked up in each directory as-is
/// and then with each known image extension.
pub fn find_icon(icon: Option<&str>, dirs: &[PathBuf], fallback: &str) -> String {
    let Some(icon) = icon.map(str::trim).filter(|i| !i.is_empty()) else {
        return fallback.to_string();
    };

    let as_path = Path::new(icon);
    if as_path.is_absolute() {
        return if as_path.exists() {
            icon.to_string()
        } else {
            fallback.to_string()
        };
    }

    for dir in dirs.iter().filter(|d| d.is_dir()) {
        let exact = dir.join(icon);
        if exact.is_file() {
            return exact.to_string_lossy().into_owned();
        }

        for ext in ICON_EXTENSIONS {
            let candidate = dir.join(format!("{}.{}", icon, ext));
            if candidate.is_file() {
                return candidate.to_string_lossy().into_owned();
            }
        }
    }

    fallback.to_string()
}

/// Resolve a Flatpak application id to an exported hicolor icon, or `fallback`
pub fn find_flatpak_icon(app_id: &str, roots: &[PathBuf], fallback: &str) -> String {
    for hicolor in roots.iter().map(|r| r.join("hicolor")).filter(|h| h.is_dir()) {
        for size in HICOLOR_SIZES {
            for ext in ["png", "svg"] {
                let candidate = hicolor
                    .join(size)
                    .join("apps")
                    .join(format!("{}.{}", app_id, ext));
                if candidate.is_file() {
                    return candidate.to_string_lossy().into_owned();
                }
            }
        }
    }

    fallback.to_string()
}
