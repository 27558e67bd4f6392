//! Building blocks for rendering a static portfolio site from a YAML
//! configuration and a directory of HTML templates.
//!
//! # Overview
//!
//! A **configuration** declares three things:
//!
//! ```text
//!   base:         shared data, optional
//!   pages:        name -> context          renders <name>.html -> <name>.html
//!   collections:  name -> { items: [...] } renders <name>.html -> item.output_file
//! ```
//!
//! When `base` is present every output goes through `base.html`, which pulls
//! the page in with `{% include "page" %}`, and the context of each page or
//! item is merged with `{ "base": base }`. When it is absent, each template is
//! rendered on its own with the raw context.
//!
//! ## Building
//!
//! 1. A [`template::TemplateSource`] materializes a template directory, either
//!    [`remote::Remote`] or [`template::LocalTemplate`].
//! 2. The [`config::Configuration`] is checked with a [`validate::Validator`].
//! 3. [`assets::copy_assets`] copies the template's `assets/` directory.
//! 4. A [`taxonomy::Site`] is built from the configuration and rendered by a
//!    [`taxonomy::Renderer`] such as [`render::SiteRenderer`].
//!
//! Every step reports progress to an [`event::Recorder`] instead of logging.

#[macro_use]
pub mod error;
pub mod util;
pub mod fstree;
pub mod value;
pub mod event;
pub mod config;
pub mod taxonomy;
pub mod templating;
pub mod template;
pub mod remote;
pub mod validate;
pub mod assets;
pub mod render;

pub use taxonomy::*;
