//! Templates, configurations and schemas hosted in a GitHub repository.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Chainable, Result};
use crate::event::{Event, Recorder};
use crate::template::{TemplateDir, TemplateSource};

/// Where templates are hosted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// `<owner>/<name>` of the repository.
    pub repository: String,
    pub branch: String,
    pub raw_host: String,
    pub api_host: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            repository: "saksham-ghimire/portfolio-builder".into(),
            branch: "main".into(),
            raw_host: "https://raw.githubusercontent.com".into(),
            api_host: "https://api.github.com".into(),
        }
    }
}

impl RemoteSettings {
    pub fn file_url(&self, path: &str) -> String {
        format!("{}/{}/{}/{path}", self.raw_host, self.repository, self.branch)
    }

    pub fn config_url(&self, template_id: &str) -> String {
        self.file_url(&format!("{}config.yml", template_prefix(template_id)))
    }

    pub fn schema_url(&self, template_id: &str) -> String {
        self.file_url(&format!("{}schema.json", template_prefix(template_id)))
    }

    pub fn tree_url(&self) -> String {
        format!("{}/repos/{}/git/trees/{}?recursive=1", self.api_host, self.repository, self.branch)
    }
}

fn template_prefix(template_id: &str) -> String {
    format!("templates/{template_id}/")
}

/// A git tree listing, as returned by the GitHub API.
#[derive(Debug, Deserialize)]
pub struct Tree {
    pub tree: Vec<TreeItem>,
}

#[derive(Debug, Deserialize)]
pub struct TreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The files making up `template_id`: `(repository path, path relative to
/// the template root)` for every blob under `templates/<template_id>/`.
pub fn template_files<'a>(tree: &'a Tree, template_id: &str) -> Vec<(&'a str, &'a str)> {
    let prefix = template_prefix(template_id);
    tree.tree.iter()
        .filter(|item| item.kind == "blob")
        .filter_map(|item| {
            let relative = item.path.strip_prefix(&prefix)?;
            (!relative.is_empty()).then_some((item.path.as_str(), relative))
        })
        .collect()
}

#[derive(Debug)]
pub struct Remote {
    settings: RemoteSettings,
    client: reqwest::blocking::Client,
}

impl Remote {
    pub fn new(settings: RemoteSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("portfolio-builder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Remote { settings, client })
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let response = self.client.get(url).send().chain_with(|| error! {
            [RemoteFetch] "request failed",
            "url" => url,
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return err! {
                [RemoteFetch] "unexpected response status",
                "url" => url,
                "status" => status,
            };
        }

        Ok(response)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self.get(url)?;
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).chain_with(|| error! {
                [OutputWrite] "failed to create directory",
                "directory" => parent.display(),
            })?;
        }

        let mut file = fs::File::create(dest).chain_with(|| error! {
            [OutputWrite] "failed to create file",
            "path" => dest.display(),
        })?;

        io::copy(&mut response, &mut file).chain_with(|| error! {
            [RemoteFetch] "failed to download file",
            "url" => url,
            "path" => dest.display(),
        })?;

        Ok(())
    }

    /// Downloads the sample configuration of `template_id` to `dest`.
    pub fn fetch_config(&self, template_id: &str, dest: &Path, recorder: &dyn Recorder) -> Result<()> {
        self.download(&self.settings.config_url(template_id), dest)
            .chain_with(|| error!("failed to fetch configuration", "template" => template_id))?;

        recorder.record(Event::ConfigFetched { template_id: template_id.into(), path: dest.to_path_buf() });
        Ok(())
    }

    fn tree(&self) -> Result<Tree> {
        let url = self.settings.tree_url();
        let response = self.get(&url)?;
        serde_json::from_reader(response).chain_with(|| error! {
            [RemoteFetch] "malformed repository tree",
            "url" => url,
        })
    }
}

impl TemplateSource for Remote {
    fn fetch(&self, template_id: &str, recorder: &dyn Recorder) -> Result<TemplateDir> {
        let tree = self.tree()?;
        let files = template_files(&tree, template_id);
        if files.is_empty() {
            return err! {
                [RemoteFetch] "no files found for template",
                "template" => template_id,
                "repository" => &self.settings.repository,
            };
        }

        let temp = tempfile::tempdir()?;
        let root: PathBuf = temp.path().join("templates").join(template_id);
        for (path, relative) in files {
            let dest = root.join(relative);
            self.download(&self.settings.file_url(path), &dest)?;
            recorder.record(Event::TemplateFileDownloaded { path: relative.into() });
        }

        recorder.record(Event::TemplateReady { template_id: template_id.into(), path: root.clone() });
        Ok(TemplateDir::temporary(root, temp))
    }

    fn schema(&self, template_id: &str) -> Result<Option<serde_json::Value>> {
        let url = self.settings.schema_url(template_id);
        let response = self.get(&url)?;
        let schema = serde_json::from_reader(response).chain_with(|| error! {
            [SchemaValidation] "schema is not valid JSON",
            "url" => url,
        })?;

        Ok(Some(schema))
    }
}
