//! Staleness selection for incremental builds.
//!
//! Decides which sources must be (re)compiled by comparing each source
//! against the object file with the matching name stem in the object
//! directory. Staleness is the safe default: a missing object, an
//! unreadable timestamp, or a timestamp tie all mean "recompile".

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File extensions recognized as compilable sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "rc"];

/// Extensions of compiled outputs a source can be matched against.
const OBJECT_EXTENSIONS: &[&str] = &["o", "obj", "res"];

/// Check whether a path has a recognized source extension.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

/// Select the sources that need (re)compilation.
///
/// Non-source and unreadable candidates are logged and dropped, never
/// errors. A candidate with no extension at all cannot be matched to an
/// object and is simply treated as stale. With incremental mode
/// disabled, every qualifying source is returned.
pub fn select_stale(sources: &[PathBuf], obj_dir: &Path, incremental: bool) -> Vec<PathBuf> {
    let mut qualifying = Vec::new();

    for source in sources {
        if source.extension().is_some() && !is_source_file(source) {
            tracing::warn!("skipping non-source file {}", source.display());
            continue;
        }
        if source.metadata().is_err() {
            tracing::warn!("skipping unreadable file {}", source.display());
            continue;
        }
        qualifying.push(source.clone());
    }

    if !incremental {
        return qualifying;
    }

    let objects = object_timestamps(obj_dir);

    qualifying
        .into_iter()
        .filter(|source| {
            let Some(src_mtime) = mtime(source) else {
                return true;
            };
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            match objects.get(&stem) {
                // Up to date only when the object is strictly newer.
                Some(obj_mtime) => *obj_mtime <= src_mtime,
                None => true,
            }
        })
        .collect()
}

/// Map object-file stems in a directory to their modification times.
///
/// When a stem has both an object and a compiled resource, the newer
/// timestamp wins.
fn object_timestamps(obj_dir: &Path) -> HashMap<String, SystemTime> {
    let mut map = HashMap::new();

    let Ok(entries) = std::fs::read_dir(obj_dir) else {
        return map;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_object = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| OBJECT_EXTENSIONS.iter().any(|o| e.eq_ignore_ascii_case(o)));
        if !is_object {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        if let Some(obj_mtime) = mtime(&path) {
            map.entry(stem)
                .and_modify(|existing: &mut SystemTime| {
                    if obj_mtime > *existing {
                        *existing = obj_mtime;
                    }
                })
                .or_insert(obj_mtime);
        }
    }

    map
}

fn mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}
