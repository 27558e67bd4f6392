use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::path::Path;

use minijinja::{path_loader, AutoEscape, Environment};
use minijinja::value::Value as JinjaValue;
use rustc_hash::FxHashMap;

use crate::error::{Chainable, Result};
use crate::templating::{Engine, EngineInit, Layout, PAGE_ALIAS};
use crate::value::{Dict, Value};

/// A minijinja environment loading templates from one directory.
///
/// Every template is treated as HTML, so interpolated values are escaped.
/// When a [`Layout`] has a base, the page template is additionally made
/// available to the base as `"page"` and its real name is exposed as the
/// global `page_template`, so either of the following pulls it in:
///
/// ```jinja
/// {% include "page" %}
/// {% include page_template %}
/// ```
///
/// The environment for each page rendered through a base is built once and
/// reused for later renders of the same page template.
#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    layouts: RefCell<FxHashMap<String, Environment<'static>>>,
}

fn init_env(root: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(root));
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_filter("deslug", ext::deslug);
    env.add_filter("split", ext::split);
    env
}

impl EngineInit for MiniJinjaEngine {
    type Engine = Self;

    fn init(root: &Path) -> Self::Engine {
        MiniJinjaEngine { env: init_env(root), layouts: RefCell::default() }
    }
}

/// Only mappings can act as a template's root namespace: any other value is
/// replaced by an empty one, so lookups render as empty.
fn root_context(context: &Value) -> JinjaValue {
    match context {
        Value::Dict(_) => JinjaValue::from_serializable(context),
        _ => JinjaValue::from_serializable(&<Dict>::new()),
    }
}

impl MiniJinjaEngine {
    /// An environment where `page` is visible to the base as [`PAGE_ALIAS`].
    fn layout_env(&self, page: &str) -> Result<Environment<'static>> {
        let mut env = self.env.clone();
        let page_source = env.get_template(page)
            .chain_with(|| error!("failed to load page template", "template" => page))?
            .source()
            .to_owned();

        env.add_template_owned(PAGE_ALIAS, page_source)?;
        env.add_global("page_template", page.to_owned());
        Ok(env)
    }
}

impl Engine for MiniJinjaEngine {
    fn render(&self, layout: &Layout, context: &Value) -> Result<String> {
        let context = root_context(context);
        let Some(base) = &layout.base else {
            let template = self.env.get_template(&layout.page)?;
            return Ok(template.render(context)?);
        };

        let mut layouts = self.layouts.borrow_mut();
        let env = match layouts.entry(layout.page.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.layout_env(&layout.page)?),
        };

        let template = env.get_template(base)
            .chain_with(|| error!("failed to load base template", "template" => base))?;

        Ok(template.render(context)?)
    }
}

mod ext {
    use minijinja::{value::Value, Error};

    pub fn deslug(value: &str) -> String {
        value.replace('-', " ")
    }

    pub fn split(value: &str, pat: &str, n: Option<usize>) -> Result<Value, Error> {
        match n {
            Some(n) => Ok(value.split(pat).nth(n).map(Value::from).unwrap_or(Value::UNDEFINED)),
            None => Ok(Value::from(value.split(pat).map(String::from).collect::<Vec<_>>())),
        }
    }
}

impl_error_detail_with_std_error!(minijinja::Error);

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::value::{Json, Mapper};

    fn engine(files: &[(&str, &str)]) -> (tempfile::TempDir, MiniJinjaEngine) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }

        let engine = MiniJinjaEngine::init(dir.path());
        (dir, engine)
    }

    #[test]
    fn standalone_page_renders_its_own_context() {
        let (_dir, engine) = engine(&[("post.html", "<h1>{{ title }}</h1>")]);
        let context = Json.map(r#"{"title": "A & B"}"#).unwrap();
        let html = engine.render(&Layout::standalone("post.html"), &context).unwrap();
        assert_eq!(html, "<h1>A &amp; B</h1>");
    }

    #[test]
    fn base_includes_page_by_alias_and_name() {
        let (_dir, engine) = engine(&[
            ("base.html", "<title>{{ base.site }}</title>{% include \"page\" %}|{% include page_template %}"),
            ("index.html", "<p>{{ title }}</p>"),
        ]);

        let context = Json.map(r#"{"base": {"site": "MySite"}, "title": "Hi"}"#).unwrap();
        let html = engine.render(&Layout::with_base("index.html"), &context).unwrap();
        assert_eq!(html, "<title>MySite</title><p>Hi</p>|<p>Hi</p>");
    }

    #[test]
    fn non_mapping_context_renders_lookups_empty() {
        let (_dir, engine) = engine(&[("about.html", "[{{ title }}]")]);
        let html = engine.render(&Layout::standalone("about.html"), &Value::from("scalar")).unwrap();
        assert_eq!(html, "[]");
    }

    #[test]
    fn syntax_errors_are_reported() {
        let (_dir, engine) = engine(&[("broken.html", "{% if %}")]);
        assert!(engine.render(&Layout::standalone("broken.html"), &Value::Null).is_err());
    }

    #[test]
    fn filters_are_registered() {
        let (_dir, engine) = engine(&[("slug.html", "{{ slug | deslug }}/{{ slug | split('-', 1) }}")]);
        let context = Json.map(r#"{"slug": "hello-big-world"}"#).unwrap();
        let html = engine.render(&Layout::standalone("slug.html"), &context).unwrap();
        assert_eq!(html, "hello big world/big");
    }

    #[test]
    fn layouts_are_built_once_per_page() {
        let (_dir, engine) = engine(&[
            ("base.html", "[{% include \"page\" %}]"),
            ("post.html", "{{ title }}"),
            ("about.html", "about"),
        ]);

        let post = Layout::with_base("post.html");
        for title in ["A", "B"] {
            let context = Json.map(&*format!(r#"{{"title": "{title}"}}"#)).unwrap();
            assert_eq!(engine.render(&post, &context).unwrap(), format!("[{title}]"));
        }

        assert_eq!(engine.layouts.borrow().len(), 1);
        assert_eq!(engine.render(&Layout::with_base("about.html"), &Value::Null).unwrap(), "[about]");
        assert_eq!(engine.layouts.borrow().len(), 2);
    }
}
