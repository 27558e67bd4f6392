use std::fs;
use std::path::{Path, PathBuf};

use portfolio::assets::copy_assets;
use portfolio::config::Configuration;
use portfolio::error;
use portfolio::error::{Chainable, Result};
use portfolio::event::{Event, Recorder};
use portfolio::remote::Remote;
use portfolio::render::{RenderOptions, SiteRenderer};
use portfolio::template::{LocalTemplate, TemplateSource};
use portfolio::templating::minijinja::MiniJinjaEngine;
use portfolio::validate::Validator;
use portfolio::{FailurePolicy, Renderer, Site, Summary};

use crate::settings::Settings;

/// Downloads the sample config of `template_id` to `dest`.
pub fn fetch_config(settings: &Settings, template_id: &str, dest: &Path, recorder: &dyn Recorder) -> Result<()> {
    Remote::new(settings.remote.clone())?.fetch_config(template_id, dest, recorder)
}

/// A full site build.
#[derive(Debug)]
pub struct Build {
    pub config: PathBuf,
    pub output_dir: PathBuf,
    pub template_dir: Option<PathBuf>,
    pub keep_going: bool,
    pub allow_outside_output: bool,
}

impl Build {
    pub fn run(&self, settings: &Settings, recorder: &dyn Recorder) -> Result<Summary> {
        let config = Configuration::load(&self.config)?;
        let source: Box<dyn TemplateSource> = match &self.template_dir {
            Some(dir) => Box::new(LocalTemplate::new(dir)),
            None => Box::new(Remote::new(settings.remote.clone())?),
        };

        match source.schema(&config.template_id)? {
            Some(schema) => Validator::new(&schema)?.validate(&config, recorder)?,
            None => recorder.record(Event::ValidationSkipped {
                reason: "the template has no schema.json".into(),
            }),
        }

        let template = source.fetch(&config.template_id, recorder)?;
        fs::create_dir_all(&self.output_dir).chain_with(|| error! {
            [OutputWrite] "failed to create output directory",
            "directory" => self.output_dir.display(),
        })?;

        let renderer = SiteRenderer::init::<MiniJinjaEngine>(
            &template.pages(),
            &self.output_dir,
            self.options(),
            recorder,
        )?;

        copy_assets(renderer.tree(), renderer.output(), recorder)?;
        let site = Site::new(&config, recorder);
        renderer.render_site(&site)
    }

    fn options(&self) -> RenderOptions {
        RenderOptions {
            policy: match self.keep_going {
                true => FailurePolicy::KeepGoing,
                false => FailurePolicy::FailFast,
            },
            confine_output: !self.allow_outside_output,
        }
    }
}
