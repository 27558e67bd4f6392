use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::error::{Chainable, Result};
use crate::event::{Event, Recorder};
use crate::value::Source;

/// The subdirectory holding page and collection templates, when present.
pub const PAGES_DIR: &str = "pages";

/// The schema file shipped alongside a template.
pub const SCHEMA_FILE: &str = "schema.json";

/// A template materialized on the local file system.
///
/// Templates downloaded into a temporary directory keep it alive for as long
/// as this value lives.
#[derive(Debug)]
pub struct TemplateDir {
    root: PathBuf,
    _temp: Option<TempDir>,
}

impl TemplateDir {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        TemplateDir { root: root.into(), _temp: None }
    }

    pub fn temporary<P: Into<PathBuf>>(root: P, temp: TempDir) -> Self {
        TemplateDir { root: root.into(), _temp: Some(temp) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where page, collection and base templates are looked up: `pages/` if
    /// the template has one, the root otherwise.
    pub fn pages(&self) -> PathBuf {
        let pages = self.root.join(PAGES_DIR);
        match pages.is_dir() {
            true => pages,
            false => self.root.clone(),
        }
    }
}

/// Somewhere templates and their schemas come from.
pub trait TemplateSource {
    fn fetch(&self, template_id: &str, recorder: &dyn Recorder) -> Result<TemplateDir>;

    /// The JSON schema for `template_id`, if the source has one.
    fn schema(&self, template_id: &str) -> Result<Option<serde_json::Value>>;
}

/// A template directory that already exists locally.
#[derive(Debug, Clone)]
pub struct LocalTemplate {
    pub root: PathBuf,
}

impl LocalTemplate {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        LocalTemplate { root: root.into() }
    }
}

impl TemplateSource for LocalTemplate {
    fn fetch(&self, template_id: &str, recorder: &dyn Recorder) -> Result<TemplateDir> {
        if !self.root.is_dir() {
            return err! {
                [TemplateNotFound] "template directory does not exist",
                "directory" => self.root.display(),
            };
        }

        recorder.record(Event::TemplateReady {
            template_id: template_id.into(),
            path: self.root.clone(),
        });

        Ok(TemplateDir::new(&self.root))
    }

    fn schema(&self, _: &str) -> Result<Option<serde_json::Value>> {
        let path = self.root.join(SCHEMA_FILE);
        if !path.is_file() {
            return Ok(None);
        }

        let text = path.as_path().try_read::<Arc<str>>()?;
        let schema = serde_json::from_str(&text).chain_with(|| error! {
            [SchemaValidation] "schema file is not valid JSON",
            "path" => path.display(),
        })?;

        Ok(Some(schema))
    }
}
