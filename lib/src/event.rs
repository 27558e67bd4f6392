//! Observability events emitted while building a site.
//!
//! Nothing in this crate logs directly. Components report what they did to a
//! [`Recorder`]; the binary forwards events to the `log` facade via
//! [`LogRecorder`] while tests capture them with [`MemoryRecorder`].

use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Something that happened while building a site.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ConfigFetched { template_id: Arc<str>, path: PathBuf },
    ConfigValid,
    SchemaViolation { message: String },
    ValidationSkipped { reason: String },
    TemplateFileDownloaded { path: PathBuf },
    TemplateReady { template_id: Arc<str>, path: PathBuf },
    AssetsCopied { path: PathBuf, files: usize },
    AssetsMissing { path: PathBuf },
    PageGenerated { page: Arc<str>, path: PathBuf },
    ItemGenerated { collection: Arc<str>, path: PathBuf },
    CollectionSkipped { collection: Arc<str>, reason: &'static str },
    ItemSkipped { collection: Arc<str>, index: usize, reason: &'static str },
    BaseKeyShadowed { target: Arc<str> },
    NonMappingContext { target: Arc<str>, kind: &'static str },
    Failed { target: Arc<str>, message: String },
}

impl Event {
    pub fn level(&self) -> log::Level {
        use log::Level;

        match self {
            Event::SchemaViolation { .. } | Event::Failed { .. } => Level::Error,
            Event::ValidationSkipped { .. }
            | Event::BaseKeyShadowed { .. }
            | Event::NonMappingContext { .. } => Level::Warn,
            Event::TemplateFileDownloaded { .. }
            | Event::AssetsMissing { .. }
            | Event::CollectionSkipped { .. }
            | Event::ItemSkipped { .. } => Level::Debug,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ConfigFetched { template_id, path } => write!(f,
                "fetched configuration for template '{template_id}' into {}; \
                update it as needed, then run again without --template", path.display()),
            Event::ConfigValid => write!(f, "config is valid"),
            Event::SchemaViolation { message } => write!(f, "- {message}"),
            Event::ValidationSkipped { reason } => write!(f, "skipping validation: {reason}"),
            Event::TemplateFileDownloaded { path } => write!(f, "downloaded: {}", path.display()),
            Event::TemplateReady { template_id, path } => {
                write!(f, "template '{template_id}' ready in {}", path.display())
            }
            Event::AssetsCopied { path, files } => {
                write!(f, "copied folder: {} ({files} files)", path.display())
            }
            Event::AssetsMissing { path } => {
                write!(f, "no assets folder at {}, nothing to copy", path.display())
            }
            Event::PageGenerated { path, .. } => write!(f, "generated page: {}", path.display()),
            Event::ItemGenerated { path, .. } => {
                write!(f, "generated collection item: {}", path.display())
            }
            Event::CollectionSkipped { collection, reason } => {
                write!(f, "skipping collection '{collection}': {reason}")
            }
            Event::ItemSkipped { collection, index, reason } => {
                write!(f, "skipping item #{index} of collection '{collection}': {reason}")
            }
            Event::BaseKeyShadowed { target } => write!(f,
                "'{target}' defines a field named 'base' which replaces the base context"),
            Event::NonMappingContext { target, kind } => write!(f,
                "context of '{target}' is a {kind}, not a mapping; its fields will render empty"),
            Event::Failed { target, message } => write!(f, "failed to build '{target}': {message}"),
        }
    }
}

/// A sink for [`Event`]s.
pub trait Recorder {
    fn record(&self, event: Event);
}

impl<R: Recorder + ?Sized> Recorder for &R {
    fn record(&self, event: Event) {
        (**self).record(event)
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRecorder;

impl Recorder for LogRecorder {
    fn record(&self, event: Event) {
        log::log!(target: "portfolio", event.level(), "{event}");
    }
}

/// Keeps every recorded event in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: RefCell<Vec<Event>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count<F: Fn(&Event) -> bool>(&self, predicate: F) -> usize {
        self.events.borrow().iter().filter(|e| predicate(e)).count()
    }
}

impl Recorder for MemoryRecorder {
    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}
