use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Chainable, Error, Result};
use crate::event::{Event, Recorder};
use crate::taxonomy::*;
use crate::templating::Layout;
use crate::value::Value;

/// What to do when a page or item fails to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run on the first failure.
    #[default]
    FailFast,
    /// Build everything that can be built, then report every failure.
    KeepGoing,
}

/// The page or collection item an output file belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Page(Arc<str>),
    Item { collection: Arc<str>, output_file: Arc<str> },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Page(name) => name.fmt(f),
            Target::Item { collection, output_file } => write!(f, "{collection}/{output_file}"),
        }
    }
}

/// One output file, ready to be rendered.
#[derive(Debug, Clone)]
pub struct Job {
    pub target: Target,
    pub layout: Layout,
    pub context: Value,
    pub output: PathBuf,
}

/// Counts of files written by [`render_site`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub pages: usize,
    pub items: usize,
}

pub trait Renderer {
    fn recorder(&self) -> &dyn Recorder;

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::FailFast
    }

    /// Finds the templates for `template`, which is `<name>.html` for a page
    /// or collection, failing if any file is missing.
    fn resolve(&self, site: &Site, template: &str) -> Result<Layout>;

    /// Where the output file `file`, relative to the output directory, goes.
    fn output_path(&self, file: &str) -> Result<PathBuf>;

    fn render(&self, layout: &Layout, context: &Value) -> Result<String>;

    fn emit(&self, path: &Path, contents: String) -> Result<()>;

    #[inline(always)]
    fn render_site(&self, site: &Site) -> Result<Summary> {
        render_site(self, site)
    }
}

/// Renders every page, then every collection item.
///
/// Templates and output paths for all targets are resolved before anything is
/// written, so a missing template leaves the output directory untouched.
pub fn render_site<R>(renderer: &R, site: &Site) -> Result<Summary>
    where R: Renderer + ?Sized
{
    let mut failures = Failures::new(renderer.policy());
    let mut jobs = vec![];

    for page in &site.pages {
        let target = Target::Page(page.name.clone());
        let job = plan(renderer, site, target, &page.template_name(), &page.output_file(), &page.context);
        jobs.extend(failures.settle(renderer, &page.name, job)?);
    }

    for collection in &site.collections {
        let template = collection.template_name();
        let layout = renderer.resolve(site, &template).chain_with(|| error! {
            "error parsing templates for collection",
            "collection" => &collection.name,
        });

        let Some(layout) = failures.settle(renderer, &collection.name, layout)? else {
            continue;
        };

        for item in &collection.items {
            let target = Target::Item {
                collection: collection.name.clone(),
                output_file: item.output_file.clone(),
            };

            let job = plan_with(renderer, site, target.clone(), layout.clone(), &item.output_file, &item.context);
            jobs.extend(failures.settle(renderer, &target.to_string(), job)?);
        }
    }

    let mut summary = Summary::default();
    for job in jobs {
        let label = job.target.to_string();
        let result = run(renderer, job).map(|target| match target {
            Target::Page(_) => summary.pages += 1,
            Target::Item { .. } => summary.items += 1,
        });

        failures.settle(renderer, &label, result)?;
    }

    failures.finish(summary)
}

fn plan<R: Renderer + ?Sized>(
    renderer: &R,
    site: &Site,
    target: Target,
    template: &str,
    output_file: &str,
    context: &Value,
) -> Result<Job> {
    let layout = renderer.resolve(site, template).chain_with(|| error! {
        "error parsing templates for page",
        "page" => &target,
    })?;

    plan_with(renderer, site, target, layout, output_file, context)
}

fn plan_with<R: Renderer + ?Sized>(
    renderer: &R,
    site: &Site,
    target: Target,
    layout: Layout,
    output_file: &str,
    context: &Value,
) -> Result<Job> {
    let output = renderer.output_path(output_file)?;
    let recorder = renderer.recorder();
    let name: Arc<str> = target.to_string().into();
    if site.base.is_none() && !matches!(context, Value::Dict(_) | Value::Null) {
        recorder.record(Event::NonMappingContext { target: name.clone(), kind: context.kind() });
    }

    if shadows_base(site.base.as_ref(), context) {
        recorder.record(Event::BaseKeyShadowed { target: name });
    }

    let context = merge_context(site.base.as_ref(), context);
    Ok(Job { target, layout, context, output })
}

fn run<R: Renderer + ?Sized>(renderer: &R, job: Job) -> Result<Target> {
    let Job { target, layout, context, output } = job;
    let contents = renderer.render(&layout, &context).chain_with(|| match &target {
        Target::Page(page) => error! {
            [Render] "error executing template for page",
            "page" => page,
            "template" => layout.entry(),
        },
        Target::Item { output_file, .. } => error! {
            [Render] "error executing template for item",
            "item" => output_file,
            "template" => layout.entry(),
        },
    })?;

    renderer.emit(&output, contents)?;
    let event = match &target {
        Target::Page(page) => Event::PageGenerated { page: page.clone(), path: output },
        Target::Item { collection, .. } => {
            Event::ItemGenerated { collection: collection.clone(), path: output }
        }
    };

    renderer.recorder().record(event);
    Ok(target)
}

/// Applies a [`FailurePolicy`] to each fallible step.
struct Failures {
    policy: FailurePolicy,
    count: usize,
    error: Option<Error>,
}

impl Failures {
    fn new(policy: FailurePolicy) -> Self {
        Failures { policy, count: 0, error: None }
    }

    /// Passes successes through as `Some`. A failure aborts under
    /// [`FailurePolicy::FailFast`] and is recorded and set aside otherwise.
    fn settle<R, T>(&mut self, renderer: &R, target: &str, result: Result<T>) -> Result<Option<T>>
        where R: Renderer + ?Sized
    {
        let error = match result {
            Ok(value) => return Ok(Some(value)),
            Err(e) if self.policy == FailurePolicy::FailFast => return Err(e),
            Err(e) => e,
        };

        renderer.recorder().record(Event::Failed {
            target: target.into(),
            message: error.to_string().lines().next().unwrap_or_default().into(),
        });

        self.count += 1;
        self.error = Some(match self.error.take() {
            Some(previous) => error.chain(previous),
            None => error,
        });

        Ok(None)
    }

    fn finish(self, summary: Summary) -> Result<Summary> {
        match self.error {
            None => Ok(summary),
            Some(error) => Err(error).chain(error! {
                format!("{} target(s) failed to build", self.count),
                "pages written" => summary.pages,
                "items written" => summary.items,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::Configuration;
    use crate::error::ErrorKind;
    use crate::event::MemoryRecorder;

    /// Renders `entry|context-as-json` and keeps outputs in memory.
    #[derive(Default)]
    struct Fake {
        templates: Vec<&'static str>,
        failing: Vec<&'static str>,
        policy: FailurePolicy,
        written: RefCell<Vec<(PathBuf, String)>>,
        recorder: MemoryRecorder,
    }

    impl Renderer for Fake {
        fn recorder(&self) -> &dyn Recorder {
            &self.recorder
        }

        fn policy(&self) -> FailurePolicy {
            self.policy
        }

        fn resolve(&self, site: &Site, template: &str) -> Result<Layout> {
            if !self.templates.contains(&template) {
                return err!([TemplateNotFound] "template file not found", "template" => template);
            }

            match site.has_base() {
                true => Ok(Layout::with_base(template)),
                false => Ok(Layout::standalone(template)),
            }
        }

        fn output_path(&self, file: &str) -> Result<PathBuf> {
            Ok(Path::new("out").join(file))
        }

        fn render(&self, layout: &Layout, context: &Value) -> Result<String> {
            if self.failing.contains(&&*layout.page) {
                return err!("boom");
            }

            Ok(format!("{}|{}", layout.entry(), serde_json::to_string(context)?))
        }

        fn emit(&self, path: &Path, contents: String) -> Result<()> {
            self.written.borrow_mut().push((path.to_path_buf(), contents));
            Ok(())
        }
    }

    fn site(yaml: &str) -> Site {
        Site::new(&Configuration::from_yaml(yaml).unwrap(), &MemoryRecorder::new())
    }

    #[test]
    fn pages_render_through_base_with_merged_context() {
        let fake = Fake { templates: vec!["index.html", "about.html"], ..Default::default() };
        let site = site("base: { site: MySite }\npages: { index: { title: Hi }, about: plain }");

        let summary = fake.render_site(&site).unwrap();
        assert_eq!(summary, Summary { pages: 2, items: 0 });
        assert_eq!(*fake.written.borrow(), [
            (PathBuf::from("out/about.html"), r#"base.html|{"base":{"site":"MySite"}}"#.to_string()),
            (PathBuf::from("out/index.html"), r#"base.html|{"base":{"site":"MySite"},"title":"Hi"}"#.into()),
        ]);
    }

    #[test]
    fn pages_without_base_render_their_raw_context() {
        let fake = Fake { templates: vec!["about.html"], ..Default::default() };
        let summary = fake.render_site(&site("pages: { about: plain }")).unwrap();

        assert_eq!(summary.pages, 1);
        assert_eq!(fake.written.borrow()[0].1, r#"about.html|"plain""#);
        assert_eq!(fake.recorder.count(|e| matches!(e, Event::NonMappingContext { .. })), 1);
    }

    #[test]
    fn collection_items_render_in_order_and_skip_malformed() {
        let fake = Fake { templates: vec!["posts.html"], ..Default::default() };
        let site = site(r#"
            collections:
              posts:
                items:
                  - { output_file: post1.html, title: A }
                  - { title: B }
                  - { output_file: post3.html, title: C }
              drafts: { entries: [] }
        "#);

        let summary = fake.render_site(&site).unwrap();
        assert_eq!(summary, Summary { pages: 0, items: 2 });

        let written = fake.written.borrow();
        let files: Vec<_> = written.iter().map(|(p, _)| p.to_str().unwrap()).collect();
        assert_eq!(files, ["out/post1.html", "out/post3.html"]);
        assert!(written[0].1.contains(r#""title":"A""#));
    }

    #[test]
    fn missing_template_writes_nothing() {
        let fake = Fake { templates: vec!["about.html", "index.html"], ..Default::default() };
        let site = site("pages: { about: {}, contact: {}, index: {} }");

        let error = fake.render_site(&site).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TemplateNotFound);
        assert!(error.mentions("contact"));
        assert!(fake.written.borrow().is_empty());
    }

    #[test]
    fn missing_collection_template_writes_nothing() {
        let fake = Fake { templates: vec!["index.html"], ..Default::default() };
        let site = site("pages: { index: {} }\ncollections: { posts: { items: [{ output_file: a.html }] } }");

        let error = fake.render_site(&site).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TemplateNotFound);
        assert!(error.mentions("collection: posts"));
        assert!(fake.written.borrow().is_empty());
    }

    #[test]
    fn item_render_failures_abort_by_default() {
        let fake = Fake {
            templates: vec!["index.html", "posts.html"],
            failing: vec!["posts.html"],
            ..Default::default()
        };

        let site = site(r#"
            pages: { index: {} }
            collections:
              posts: { items: [{ output_file: a.html }, { output_file: b.html }] }
        "#);

        let error = fake.render_site(&site).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Render);
        assert!(error.mentions("item: a.html"));
        assert!(!error.mentions("b.html"));
        assert_eq!(*fake.written.borrow(), [(PathBuf::from("out/index.html"), "index.html|{}".to_string())]);
        assert_eq!(fake.recorder.count(|e| matches!(e, Event::ItemGenerated { .. })), 0);
    }

    #[test]
    fn render_failures_abort_by_default() {
        let fake = Fake {
            templates: vec!["a.html", "b.html", "c.html"],
            failing: vec!["b.html"],
            ..Default::default()
        };

        let error = fake.render_site(&site("pages: { a: {}, b: {}, c: {} }")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Render);
        assert_eq!(fake.written.borrow().len(), 1);
    }

    #[test]
    fn keep_going_builds_the_rest_and_reports_all() {
        let fake = Fake {
            templates: vec!["a.html", "b.html", "d.html"],
            failing: vec!["b.html"],
            policy: FailurePolicy::KeepGoing,
            ..Default::default()
        };

        let error = fake.render_site(&site("pages: { a: {}, b: {}, c: {}, d: {} }")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TemplateNotFound);
        assert!(error.mentions("2 target(s) failed to build"));
        assert!(error.mentions("error executing template for page"));
        assert_eq!(fake.written.borrow().len(), 2);
        assert_eq!(fake.recorder.count(|e| matches!(e, Event::Failed { .. })), 2);
    }
}
