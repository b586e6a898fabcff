//! Path normalization for the virtual filesystem
//!
//! Every stored key is a canonical absolute path: leading `/`, `/` as the only
//! separator, no empty segments and no trailing slash (except the root).
//! Directories never exist as keys; they are inferred from key prefixes.

/// Root path
pub const ROOT: &str = "/";

/// Conventional application locations
///
/// Nothing in the VFS enforces these; they are shared so that applications
/// and agent tools agree on where each app keeps its state.
pub mod app {
    pub const NOTES_DIR: &str = "/notes";
    pub const TODO_TASKS: &str = "/todo/tasks.json";
    pub const CALENDAR_EVENTS: &str = "/calendar/events.json";
    pub const TIMER_STATE: &str = "/timer/state.json";
    pub const WHITEBOARD_DEFAULT: &str = "/whiteboard/default.json";
    pub const EMAIL_DRAFT: &str = "/email/draft.json";
}

/// Normalize a path into its canonical key form
///
/// Backslashes become `/`, surrounding whitespace is trimmed, a leading `/` is
/// ensured and empty segments are dropped. Never fails; an empty input maps to
/// the root.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = path.trim().split('/').filter(|s| !s.is_empty()).collect();

    // Dropping a trailing separator can expose whitespace at the end again
    while let Some(last) = segments.pop() {
        let last = last.trim_end();
        if !last.is_empty() {
            segments.push(last);
            break;
        }
    }

    if segments.is_empty() {
        return ROOT.to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Directory prefix used for key scans: `/a` -> `/a/`, root stays `/`
pub fn dir_prefix(path: &str) -> String {
    let path = normalize_path(path);
    if path == ROOT {
        path
    } else {
        format!("{path}/")
    }
}

/// Whether `key` lies inside the directory described by `prefix`
///
/// Matches the directory path itself or anything below it on a separator
/// boundary, so `/a` never matches `/ab/c`.
pub fn in_prefix(key: &str, prefix: &str) -> bool {
    let dir = dir_prefix(prefix);
    if dir == ROOT {
        return true;
    }
    key == &dir[..dir.len() - 1] || key.starts_with(&dir)
}

/// First segment of `key` below `dir` and whether the key continues past it
///
/// `dir` must already be a directory prefix (see [`dir_prefix`]). Returns
/// `None` when the key is not below `dir`.
pub fn child_of<'a>(key: &'a str, dir: &str) -> Option<(&'a str, bool)> {
    let rest = key.strip_prefix(dir)?;
    if rest.is_empty() {
        return None;
    }
    match rest.split_once('/') {
        Some((name, _)) if !name.is_empty() => Some((name, true)),
        Some(_) => None,
        None => Some((rest, false)),
    }
}

/// Get parent path
pub fn parent_path(path: &str) -> Option<String> {
    let path = normalize_path(path);
    if path == ROOT {
        return None;
    }
    let idx = path.rfind('/')?;
    if idx == 0 {
        Some(ROOT.to_string())
    } else {
        Some(path[..idx].to_string())
    }
}
