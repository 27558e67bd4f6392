use std::fs;
use std::path::Path;

use crate::error::{Chainable, Result};
use crate::event::{Event, Recorder};
use crate::fstree::FsTree;

/// The template directory whose contents are copied verbatim to the output.
pub const ASSETS_DIR: &str = "assets";

/// Copies `<tree root>/assets` to `<output>/assets`, keeping its layout and
/// overwriting existing files. Returns the number of files copied.
///
/// A template without an assets directory is not an error.
pub fn copy_assets(tree: &FsTree, output: &Path, recorder: &dyn Recorder) -> Result<usize> {
    let Some(assets) = tree.get_id(None, ASSETS_DIR).filter(|&id| tree[id].file_type.is_dir()) else {
        recorder.record(Event::AssetsMissing { path: tree.root().path.join(ASSETS_DIR) });
        return Ok(0);
    };

    let dest_root = output.join(ASSETS_DIR);
    let mut files = 0;
    for id in tree.iter_depth_first(assets) {
        let entry = &tree[id];
        let Some(relative) = entry.path_relative_to(&tree[assets]) else { continue };
        let dest = dest_root.join(relative);
        if entry.file_type.is_dir() {
            fs::create_dir_all(&dest).chain_with(|| error! {
                [OutputWrite] "failed to create asset directory",
                "directory" => dest.display(),
            })?;
        } else if entry.file_type.is_file() {
            fs::copy(&entry.path, &dest).chain_with(|| error! {
                [OutputWrite] "failed to copy asset",
                "source" => entry.path.display(),
                "destination" => dest.display(),
            })?;

            files += 1;
        }
    }

    recorder.record(Event::AssetsCopied { path: dest_root, files });
    Ok(files)
}
