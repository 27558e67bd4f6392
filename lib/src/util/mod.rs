use std::path::{Component, Path, PathBuf};

/// Joins the relative path `path` onto `base`, lexically resolving `.` and
/// `..` components.
///
/// Returns `None` if `path` is absolute or if resolving it would climb out of
/// `base`. The file system is never consulted, so symlinks inside `base` are
/// not followed.
///
/// ```
/// use std::path::Path;
/// use portfolio::util::confined_join;
///
/// let out = Path::new("/site");
/// assert_eq!(confined_join(out, "index.html"), Some("/site/index.html".into()));
/// assert_eq!(confined_join(out, "blog/./a.html"), Some("/site/blog/a.html".into()));
/// assert_eq!(confined_join(out, "blog/../a.html"), Some("/site/a.html".into()));
///
/// assert_eq!(confined_join(out, "../a.html"), None);
/// assert_eq!(confined_join(out, "blog/../../a.html"), None);
/// assert_eq!(confined_join(out, "/etc/passwd"), None);
/// assert_eq!(confined_join(out, ""), None);
/// ```
pub fn confined_join<B, P>(base: B, path: P) -> Option<PathBuf>
    where B: AsRef<Path>, P: AsRef<Path>
{
    let mut parts: Vec<&std::ffi::OsStr> = vec![];
    for component in path.as_ref().components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => continue,
            Component::ParentDir => { parts.pop()?; }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        return None;
    }

    let mut joined = base.as_ref().to_path_buf();
    joined.extend(parts);
    Some(joined)
}
