use std::path::PathBuf;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};

use locflow_client::{ApiClient, ClientOptions};
use locflow_config::LocflowConfig;
use locflow_services::{output_path_for, PollOptions, SyncSettings};

const DEFAULT_API_BASE: &str = "https://api.locflow.dev";
const DEFAULT_OUTPUT_TEMPLATE: &str = "locales/{locale}/{name}";

/// Everything a command needs, assembled once from config + environment.
/// The client handle is constructed here and passed down explicitly.
pub struct ProjectContext {
    pub root: PathBuf,
    pub config: LocflowConfig,
}

impl ProjectContext {
    pub fn load() -> Result<Self> {
        let root = std::env::current_dir()?;
        let config = locflow_config::load_config().unwrap_or_default();
        Ok(ProjectContext { root, config })
    }

    pub fn include(&self) -> Vec<String> {
        self.config
            .files
            .as_ref()
            .and_then(|f| f.include.clone())
            .unwrap_or_else(|| vec!["content".to_string()])
    }

    pub fn output_template(&self) -> String {
        self.config
            .files
            .as_ref()
            .and_then(|f| f.output.clone())
            .unwrap_or_else(|| DEFAULT_OUTPUT_TEMPLATE.to_string())
    }

    pub fn branch_id(&self) -> String {
        self.config.branch.clone().unwrap_or_else(|| "main".to_string())
    }

    pub fn source_locale(&self) -> String {
        self.config
            .source_locale
            .clone()
            .unwrap_or_else(|| "en".to_string())
    }

    pub fn target_locales(&self) -> Result<Vec<String>> {
        self.config
            .target_locales
            .clone()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| eyre!("no target_locales configured in locflow.toml"))
    }

    pub fn client(&self) -> Result<ApiClient> {
        let project_id = self
            .config
            .project_id
            .clone()
            .ok_or_else(|| eyre!("no project_id configured in locflow.toml"))?;
        let api_key = locflow_config::api_key_from_env().ok_or_else(|| {
            eyre!("{} is not set", locflow_config::API_KEY_ENV)
        })?;
        let api_base = self
            .config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Ok(ApiClient::new(ClientOptions::new(api_base, project_id, api_key))?)
    }

    pub fn settings(&self, force: bool) -> Result<SyncSettings> {
        Ok(SyncSettings {
            branch_id: self.branch_id(),
            source_locale: self.source_locale(),
            target_locales: self.target_locales()?,
            timeout: Duration::from_secs(
                self.config
                    .push
                    .as_ref()
                    .and_then(|p| p.timeout_secs)
                    .unwrap_or(600),
            ),
            force,
        })
    }

    pub fn poll_options(&self) -> PollOptions {
        let poll = self.config.poll.as_ref();
        PollOptions {
            tick: Duration::from_millis(poll.and_then(|p| p.tick_ms).unwrap_or(5000)),
            timeout: Duration::from_secs(poll.and_then(|p| p.timeout_secs).unwrap_or(600)),
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(".locflow").join("versions.json")
    }

    /// Output resolver closure handed to the tracker builder.
    pub fn output_resolver(&self) -> impl Fn(&str, &str) -> Option<PathBuf> + '_ {
        let template = self.output_template();
        move |rel_path, locale| output_path_for(&self.root, &template, rel_path, locale)
    }
}
