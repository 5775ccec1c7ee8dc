use crate::app::AppSettings;
use crate::cli::CliArgs;
use crate::pages::Page;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConsoleConfig {
    pub source: Option<String>,
    pub api_url: String,
    pub log_tail: u32,
    pub metrics_interval: Duration,
    pub recent_events_limit: u32,
    pub request_timeout: Option<Duration>,
    pub start_page: Page,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            source: None,
            api_url: DEFAULT_API_URL.to_string(),
            log_tail: 100,
            metrics_interval: Duration::from_secs(30),
            recent_events_limit: 5,
            request_timeout: None,
            start_page: Page::Dashboard,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default, alias = "api")]
    api_url: Option<String>,
    #[serde(default)]
    log_tail: Option<u32>,
    #[serde(default, alias = "metrics_interval")]
    metrics_interval_secs: Option<u64>,
    #[serde(default)]
    recent_events_limit: Option<u32>,
    #[serde(default, alias = "timeout_secs")]
    request_timeout_secs: Option<u64>,
    #[serde(default, alias = "page")]
    start_page: Option<String>,
}

impl ConsoleConfig {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let path = args.config.clone().or_else(discover_config_path);
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                let mut config = Self::from_yaml(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))?;
                config.source = Some(path.display().to_string());
                config
            }
            None => Self::default(),
        };
        config.apply_cli(args)?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut config = Self::default();
        if raw.trim().is_empty() {
            return Ok(config);
        }

        let file: ConfigFile = serde_yaml::from_str(raw)?;
        if let Some(api_url) = file.api_url {
            config.api_url = api_url;
        }
        if let Some(log_tail) = file.log_tail {
            config.log_tail = log_tail;
        }
        if let Some(secs) = file.metrics_interval_secs {
            config.metrics_interval = interval_from_secs(secs);
        }
        if let Some(limit) = file.recent_events_limit {
            config.recent_events_limit = limit;
        }
        config.request_timeout = file
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        if let Some(page) = file.start_page {
            config.start_page = parse_page(&page)?;
        }
        Ok(config)
    }

    pub fn apply_cli(&mut self, args: &CliArgs) -> Result<()> {
        if let Some(api_url) = &args.api_url {
            self.api_url = api_url.clone();
        }
        if let Some(log_tail) = args.log_tail {
            self.log_tail = log_tail;
        }
        if let Some(secs) = args.metrics_interval_secs {
            self.metrics_interval = interval_from_secs(secs);
        }
        if let Some(limit) = args.recent_events {
            self.recent_events_limit = limit;
        }
        if let Some(page) = &args.page {
            self.start_page = parse_page(page)?;
        }
        Ok(())
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            api_url: self.api_url.clone(),
            start_page: self.start_page,
            log_tail: self.log_tail,
            recent_events_limit: self.recent_events_limit,
        }
    }
}

fn interval_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

fn parse_page(token: &str) -> Result<Page> {
    match Page::from_token(token) {
        Some(page) => Ok(page),
        None => bail!("unknown page '{token}'"),
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KUBELENS_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("kubelens.yaml"),
        PathBuf::from("kubelens.yml"),
        PathBuf::from(".kubelens.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/kubelens/config.yaml"),
            PathBuf::from(&home).join(".kubelens.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::ConsoleConfig;
    use crate::cli::CliArgs;
    use crate::pages::Page;
    use std::time::Duration;

    #[test]
    fn empty_file_yields_defaults() {
        let config = ConsoleConfig::from_yaml("").expect("empty config");
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.metrics_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn file_values_override_defaults() {
        let raw = r#"
api_url: http://console.internal:9000
log_tail: 250
metrics_interval_secs: 0
request_timeout_secs: 15
start_page: workloads
"#;
        let config = ConsoleConfig::from_yaml(raw).expect("valid config");
        assert_eq!(config.api_url, "http://console.internal:9000");
        assert_eq!(config.log_tail, 250);
        assert_eq!(config.metrics_interval, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.start_page, Page::Workloads);
        assert_eq!(config.recent_events_limit, 5);
    }

    #[test]
    fn cli_flags_win_over_file() {
        let mut config = ConsoleConfig::from_yaml("log_tail: 250\n").expect("valid config");
        let args = CliArgs {
            log_tail: Some(20),
            page: Some("top".to_string()),
            ..CliArgs::default()
        };
        config.apply_cli(&args).expect("valid flags");
        assert_eq!(config.log_tail, 20);
        assert_eq!(config.start_page, Page::NodeMetrics);
    }

    #[test]
    fn rejects_unknown_page_and_keys() {
        assert!(ConsoleConfig::from_yaml("start_page: nowhere\n").is_err());
        assert!(ConsoleConfig::from_yaml("refresh_ms: 10\n").is_err());
    }
}
