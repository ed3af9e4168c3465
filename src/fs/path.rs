//! Lexical path manipulation.
//!
//! Paths are plain `/`-separated strings. Nothing here touches a file tree:
//! `..` is resolved textually, without following anything.

use crate::fs::{FsError, FsResult};

pub const SEPARATOR: char = '/';

/// Normalize a path: collapse repeated separators, resolve `.` and `..`
/// segments and drop trailing separators. The result is always absolute, and
/// `..` above the root stays at the root.
///
/// ```
/// use simfs::fs::path::simplify;
///
/// assert_eq!(simplify("foo/bar/../"), "/foo");
/// assert_eq!(simplify("../../"), "/");
/// ```
pub fn simplify(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    format!("{SEPARATOR}{}", segments.join("/"))
}

/// Split a path into its parent and its leaf. No normalization happens.
///
/// `"/a/b"` splits into `("/a", "b")`, `"/"` into `("/", "")` and a bare
/// `"a"` into `("", "a")`.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind(SEPARATOR) {
        None => ("", path),
        Some(0) => ("/", &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
    }
}

/// Resolve `path` relative to the mount point `mount`.
///
/// The mount must be absolute and clean, trailing separators aside. The
/// path is normalized first and must then be the mount itself or one of its
/// descendants.
pub fn resolve_at_mount(path: &str, mount: &str) -> FsResult<String> {
    let mount = clean_mount(mount)?;
    let path = simplify(path);

    if mount == "/" {
        return Ok(path);
    }

    if path == mount {
        return Ok("/".to_string());
    }

    match path.strip_prefix(mount) {
        Some(rest) if rest.starts_with(SEPARATOR) => Ok(rest.to_string()),
        _ => Err(FsError::InvalidPath(format!(
            "{path} is not under mount point {mount}"
        ))),
    }
}

/// Whether a raw path can only designate a directory: it ends with a
/// separator, or its last segment is `.` or `..`.
pub fn is_directory_like(path: &str) -> bool {
    let (_, leaf) = split(path);
    leaf.is_empty() || leaf == "." || leaf == ".."
}

/// Whether `ancestor` is a strict ancestor of `path`. Both must be clean.
pub(crate) fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor == path {
        return false;
    }

    ancestor == "/"
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Strip trailing separators off a mount point and check that what remains
/// is absolute and clean.
pub(crate) fn clean_mount(mount: &str) -> FsResult<&str> {
    if mount.is_empty() {
        return Err(FsError::InvalidArgument("empty mount point".to_string()));
    }

    let trimmed = mount.trim_end_matches(SEPARATOR);
    let trimmed = if trimmed.is_empty() { "/" } else { trimmed };

    if !trimmed.starts_with(SEPARATOR) || simplify(trimmed) != trimmed {
        return Err(FsError::InvalidArgument(format!(
            "mount point {mount} is not an absolute clean path"
        )));
    }

    Ok(trimmed)
}
