use std::process::ExitCode;

use portfolio::error::Result;
use portfolio::event::LogRecorder;

use crate::pipeline::Build;
use crate::settings::Settings;

mod pipeline;
mod settings;

pub const DEFAULT_CONFIG: &str = "config.yml";
pub const DEFAULT_OUTPUT_DIR: &str = ".";

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Builds a static portfolio site from a template and a YAML config.
        ///
        /// Run with `--template <id>` first to download that template's sample
        /// config, edit it, then run without `--template` to generate the site.
        cmd portfolio-builder {
            /// Download the config for template <id> and exit.
            optional --template id: String
            /// Path to the config file (default: config.yml).
            optional --config path: PathBuf
            /// Directory to write the site into (default: .).
            optional --output-dir path: PathBuf
            /// Use a local template directory instead of downloading one.
            optional --template-dir path: PathBuf
            /// Build every page and item that can be built, then report all failures.
            optional --keep-going
            /// Allow output files outside of the output directory.
            optional --allow-outside-output
            /// Log debug messages.
            optional -v, --verbose
        }
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(flags: flags::PortfolioBuilder) -> Result<()> {
    let settings = Settings::from_env()?;
    let recorder = LogRecorder;
    let config = flags.config.unwrap_or_else(|| DEFAULT_CONFIG.into());

    if let Some(template_id) = &flags.template {
        log::info!("fetching template configuration for id: {template_id}");
        return pipeline::fetch_config(&settings, template_id, &config, &recorder);
    }

    let build = Build {
        config,
        output_dir: flags.output_dir.unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into()),
        template_dir: flags.template_dir,
        keep_going: flags.keep_going,
        allow_outside_output: flags.allow_outside_output,
    };

    let summary = build.run(&settings, &recorder)?;
    log::info!("portfolio generation completed: {} page(s), {} collection item(s)",
        summary.pages, summary.items);

    log::info!("your portfolio is ready in '{}'", build.output_dir.display());
    Ok(())
}

pub fn main() -> ExitCode {
    let flags = flags::PortfolioBuilder::from_env_or_exit();
    init_logger(flags.verbose);

    match run(flags) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
