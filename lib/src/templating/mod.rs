pub mod minijinja;

use std::fmt::Debug;
use std::path::Path;

use crate::error::Result;
use crate::value::Value;

/// The name of the shared layout template.
pub const BASE_TEMPLATE: &str = "base.html";

/// The alias under which the page template is visible to the base template.
pub const PAGE_ALIAS: &str = "page";

/// Which templates take part in rendering one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// The page or collection template, e.g. `about.html`.
    pub page: String,
    /// The entry point when a base context is declared: `base.html`.
    pub base: Option<String>,
}

impl Layout {
    pub fn standalone<S: Into<String>>(page: S) -> Self {
        Layout { page: page.into(), base: None }
    }

    pub fn with_base<S: Into<String>>(page: S) -> Self {
        Layout { page: page.into(), base: Some(BASE_TEMPLATE.into()) }
    }

    /// The template execution starts from.
    pub fn entry(&self) -> &str {
        self.base.as_deref().unwrap_or(&self.page)
    }
}

pub trait EngineInit {
    type Engine: Engine + 'static;

    fn init(root: &Path) -> Self::Engine;
}

pub trait Engine: Debug {
    fn render(&self, layout: &Layout, context: &Value) -> Result<String>;
}
