use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocflowConfig {
    /// Base URL of the translation service, e.g. "https://api.locflow.dev".
    pub api_base: Option<String>,
    pub project_id: Option<String>,
    /// Branch namespace on the service; defaults to "main".
    pub branch: Option<String>,
    pub source_locale: Option<String>,
    pub target_locales: Option<Vec<String>>,
    pub list_limit: Option<usize>,
    pub files: Option<FilesCfg>,
    pub push: Option<PushCfg>,
    pub pull: Option<PullCfg>,
    pub poll: Option<PollCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesCfg {
    /// Directories scanned for translatable source files.
    pub include: Option<Vec<String>>,
    /// Output path template; `{locale}` and `{name}` are substituted,
    /// e.g. "locales/{locale}/{name}".
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushCfg {
    pub force: Option<bool>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullCfg {
    pub backup: Option<bool>,
    pub force: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollCfg {
    pub tick_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Other(String),
}

/// Name of the environment variable holding the API key. Credential
/// acquisition beyond reading this variable is out of scope.
pub const API_KEY_ENV: &str = "LOCFLOW_API_KEY";

pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|s| !s.is_empty())
}

pub fn load_config() -> Result<LocflowConfig, ConfigError> {
    // Search order: CWD/locflow.toml, $HOME/.config/locflow/locflow.toml
    let mut merged = LocflowConfig::default();
    if let Ok(p) = std::env::current_dir() {
        let path = p.join("locflow.toml");
        if let Ok(s) = std::fs::read_to_string(&path) {
            if let Ok(cfg) = toml::from_str::<LocflowConfig>(&s) {
                merged = merge(merged, cfg);
            }
        }
    }
    if let Some(base) = dirs::config_dir() {
        let path = base.join("locflow").join("locflow.toml");
        if let Ok(s) = std::fs::read_to_string(&path) {
            if let Ok(cfg) = toml::from_str::<LocflowConfig>(&s) {
                merged = merge(merged, cfg);
            }
        }
    }
    Ok(merged)
}

/// Parse a config from a string, without the search path. Used by tests and
/// by callers that pass `--config <path>` explicitly.
pub fn parse_config(s: &str) -> Result<LocflowConfig, ConfigError> {
    toml::from_str::<LocflowConfig>(s).map_err(|e| ConfigError::Other(e.to_string()))
}

fn merge(mut a: LocflowConfig, b: LocflowConfig) -> LocflowConfig {
    if a.api_base.is_none() {
        a.api_base = b.api_base;
    }
    if a.project_id.is_none() {
        a.project_id = b.project_id;
    }
    if a.branch.is_none() {
        a.branch = b.branch;
    }
    if a.source_locale.is_none() {
        a.source_locale = b.source_locale;
    }
    if a.target_locales.is_none() {
        a.target_locales = b.target_locales;
    }
    if a.list_limit.is_none() {
        a.list_limit = b.list_limit;
    }
    a.files = merge_opt(a.files, b.files, merge_files);
    a.push = merge_opt(a.push, b.push, merge_push);
    a.pull = merge_opt(a.pull, b.pull, merge_pull);
    a.poll = merge_opt(a.poll, b.poll, merge_poll);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_files(mut a: FilesCfg, b: FilesCfg) -> FilesCfg {
    if a.include.is_none() {
        a.include = b.include;
    }
    if a.output.is_none() {
        a.output = b.output;
    }
    a
}

fn merge_push(mut a: PushCfg, b: PushCfg) -> PushCfg {
    if a.force.is_none() {
        a.force = b.force;
    }
    if a.timeout_secs.is_none() {
        a.timeout_secs = b.timeout_secs;
    }
    a
}

fn merge_pull(mut a: PullCfg, b: PullCfg) -> PullCfg {
    if a.backup.is_none() {
        a.backup = b.backup;
    }
    if a.force.is_none() {
        a.force = b.force;
    }
    a
}

fn merge_poll(mut a: PollCfg, b: PollCfg) -> PollCfg {
    if a.tick_ms.is_none() {
        a.tick_ms = b.tick_ms;
    }
    if a.timeout_secs.is_none() {
        a.timeout_secs = b.timeout_secs;
    }
    a
}
