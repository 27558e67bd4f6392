use std::path::{Path, PathBuf};

use derive_more::Debug;

use crate::error::{Chainable, Result};
use crate::event::Recorder;
use crate::fstree::FsTree;
use crate::taxonomy::{FailurePolicy, Renderer, Site};
use crate::templating::{Engine, EngineInit, Layout, BASE_TEMPLATE};
use crate::util::confined_join;
use crate::value::{Sink, Value};

/// Knobs for [`SiteRenderer`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub policy: FailurePolicy,
    /// Reject output paths that would land outside the output directory.
    pub confine_output: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions { policy: FailurePolicy::FailFast, confine_output: true }
    }
}

/// Renders a [`Site`] from a template directory into an output directory.
#[derive(Debug)]
pub struct SiteRenderer<'r, E: Engine> {
    tree: FsTree,
    engine: E,
    output: PathBuf,
    options: RenderOptions,
    #[debug(skip)]
    recorder: &'r dyn Recorder,
}

impl<'r, E: Engine> SiteRenderer<'r, E> {
    pub fn init<I>(
        templates: &Path,
        output: &Path,
        options: RenderOptions,
        recorder: &'r dyn Recorder,
    ) -> Result<Self>
        where I: EngineInit<Engine = E>
    {
        let tree = FsTree::build(templates).chain_with(|| error! {
            [TemplateNotFound] "template directory is missing or unreadable",
            "directory" => templates.display(),
        })?;

        Ok(SiteRenderer {
            engine: I::init(templates),
            output: output.to_path_buf(),
            tree,
            options,
            recorder,
        })
    }

    /// The snapshot of the template directory.
    pub fn tree(&self) -> &FsTree {
        &self.tree
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn require(&self, template: &str) -> Result<()> {
        match self.tree.get_file_id(None, template) {
            Some(_) => Ok(()),
            None => err! {
                [TemplateNotFound] "template file not found",
                "template" => template,
                "directory" => self.tree.root().path.display(),
            },
        }
    }
}

impl<E: Engine> Renderer for SiteRenderer<'_, E> {
    fn recorder(&self) -> &dyn Recorder {
        self.recorder
    }

    fn policy(&self) -> FailurePolicy {
        self.options.policy
    }

    fn resolve(&self, site: &Site, template: &str) -> Result<Layout> {
        self.require(template)?;
        if !site.has_base() {
            return Ok(Layout::standalone(template));
        }

        self.require(BASE_TEMPLATE)?;
        Ok(Layout::with_base(template))
    }

    fn output_path(&self, file: &str) -> Result<PathBuf> {
        if !self.options.confine_output {
            return Ok(self.output.join(file));
        }

        match confined_join(&self.output, file) {
            Some(path) => Ok(path),
            None => err! {
                [OutputWrite] "output path escapes the output directory",
                "path" => file,
                "output directory" => self.output.display(),
                "hint" => "pass --allow-outside-output to permit this",
            },
        }
    }

    fn render(&self, layout: &Layout, context: &Value) -> Result<String> {
        self.engine.render(layout, context)
    }

    fn emit(&self, path: &Path, contents: String) -> Result<()> {
        path.write(contents)
    }
}
