use std::sync::Arc;

use crate::value::Value;

/// A declared page: rendered from `<name>.html` into `<name>.html`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub name: Arc<str>,
    pub context: Value,
}

impl Page {
    pub fn new<N: Into<Arc<str>>>(name: N, context: Value) -> Self {
        Page { name: name.into(), context }
    }

    pub fn template_name(&self) -> String {
        format!("{}.html", self.name)
    }

    pub fn output_file(&self) -> String {
        self.template_name()
    }
}
