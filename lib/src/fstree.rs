use std::sync::Arc;
use std::path::Path;
use std::collections::VecDeque;
use std::{fs, fmt};

use rustc_hash::FxHashMap;

use crate::error::Result;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) usize);

/// An in-memory snapshot of a directory tree.
#[derive(Debug)]
pub struct FsTree {
    entries: Vec<Entry>,
    map: FxHashMap<Arc<Path>, EntryId>,
}

#[derive(Debug)]
pub struct Entry {
    pub id: EntryId,
    pub path: Arc<Path>,
    pub metadata: fs::Metadata,
    pub file_name: String,
    pub file_type: fs::FileType,
    pub parent: Option<EntryId>,
    pub children: Vec<EntryId>,
    pub depth: usize,
}

#[derive(Default, Debug)]
struct FsMetadata(Option<fs::Metadata>);

impl FsTree {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            entries: vec![],
        }
    }

    pub fn build<P: AsRef<Path>>(root: P) -> Result<Self> {
        use jwalk::{Parallelism, WalkDirGeneric};

        let root = root.as_ref();
        let walker = WalkDirGeneric::<FsMetadata>::new(root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(true)
            .process_read_dir(|_, _, _, entries| {
                entries.iter_mut()
                    .filter_map(|e| e.as_mut().ok())
                    .for_each(|e| e.client_state = FsMetadata(e.metadata().ok()))
            });

        let mut tree: FsTree = FsTree::new();
        for f in walker.into_iter().filter_map(|e| e.ok()) {
            let metadata = f.client_state.0.clone().or_else(|| fs::metadata(f.path()).ok());
            tree.insert(f, metadata);
        }

        if tree.len() == 0 {
            return err! {
                "file system tree discovery yielded zero files",
                "search root" => root.display(),
            }
        }

        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn root(&self) -> &Entry {
        &self[self.root_id()]
    }

    pub fn root_id(&self) -> EntryId {
        EntryId(0)
    }

    #[inline]
    pub fn get<R, P>(&self, root: R, path: P) -> Option<&Entry>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        self.get_id(root.into(), path.as_ref()).map(|id| &self[id])
    }

    pub fn get_file_id<R, P>(&self, root: R, path: P) -> Option<EntryId>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        let id = self.get_id(root.into(), path.as_ref())?;
        self[id].file_type.is_file().then_some(id)
    }

    pub fn get_id<R, P>(&self, root: R, path: P) -> Option<EntryId>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        let root = root.into().unwrap_or(self.root_id());
        let full_path = self[root].path.join(path.as_ref());
        self.map.get(&*full_path).cloned()
    }

    pub fn iter_depth_first(&self, root: EntryId) -> Dfs<'_> {
        Dfs {
            tree: self,
            stack: { let mut q = VecDeque::new(); q.push_back(root); q },
        }
    }

    fn insert(&mut self, entry: jwalk::DirEntry<FsMetadata>, metadata: Option<fs::Metadata>) {
        let Some(metadata) = metadata else { return };
        let entry = Entry {
            id: EntryId(self.entries.len()),
            path: Arc::from(entry.path().into_boxed_path()),
            file_type: metadata.file_type(),
            metadata,
            file_name: entry.file_name.to_string_lossy().into_owned(),
            parent: self.map.get(&*entry.parent_path).cloned(),
            children: vec![],
            depth: entry.depth,
        };

        self.map.insert(entry.path.clone(), entry.id);
        if let Some(parent) = entry.parent {
            self.entries[parent.0].children.push(entry.id);
        }

        self.entries.push(entry);
    }
}

impl Entry {
    /// Path relative to `other`. `self` must be super-path of `other`.
    pub fn path_relative_to(&self, other: &Entry) -> Option<&Path> {
        if !self.path.starts_with(&other.path) {
            return None;
        }

        let n = self.depth - other.depth;
        let mut components = self.path.components();
        for _ in 0..(self.path.components().count() - n) {
            components.next();
        }

        Some(components.as_path())
    }
}

pub struct Dfs<'a> {
    tree: &'a FsTree,
    stack: VecDeque<EntryId>,
}

impl Iterator for Dfs<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop_front()?;
        for &child in self.tree[node].children.iter().rev() {
            self.stack.push_front(child);
        }

        Some(node)
    }
}

impl jwalk::ClientState for FsMetadata {
    type ReadDirState = ();
    type DirEntryState = Self;
}

impl std::ops::Index<EntryId> for FsTree {
    type Output = Entry;

    fn index(&self, index: EntryId) -> &Self::Output {
        &self.entries[index.0]
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets/css")).unwrap();
        fs::write(dir.path().join("index.html"), "").unwrap();
        fs::write(dir.path().join("assets/css/site.css"), "").unwrap();

        let tree = FsTree::build(dir.path()).unwrap();
        assert!(tree.get_file_id(None, "index.html").is_some());
        assert!(tree.get_file_id(None, "assets").is_none());
        assert!(tree.get(None, "assets").unwrap().file_type.is_dir());

        let assets = tree.get_id(None, "assets").unwrap();
        let css = tree.get(assets, "css/site.css").unwrap();
        assert_eq!(css.path_relative_to(&tree[assets]), Some(Path::new("css/site.css")));

        let files: Vec<_> = tree.iter_depth_first(tree.root_id())
            .map(|id| &tree[id])
            .filter(|e| e.file_type.is_file())
            .map(|e| e.file_name.as_str())
            .collect();

        assert_eq!(files, ["site.css", "index.html"]);
    }

    #[test]
    fn hidden_entries_are_included() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".well-known")).unwrap();
        fs::write(dir.path().join(".well-known/security.txt"), "").unwrap();
        fs::write(dir.path().join(".nojekyll"), "").unwrap();

        let tree = FsTree::build(dir.path()).unwrap();
        assert!(tree.get_file_id(None, ".nojekyll").is_some());
        assert!(tree.get_file_id(None, ".well-known/security.txt").is_some());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsTree::build(dir.path().join("nope")).is_err());
    }
}
