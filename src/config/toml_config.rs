use crate::domain::model::AmbiguousFolderPolicy;
use crate::utils::error::{RelocatorError, Result};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{
    validate_api_version, validate_login_domain, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const PRODUCTION_DOMAIN: &str = "login";
pub const SANDBOX_DOMAIN: &str = "test";
pub const DEFAULT_API_VERSION: &str = "59.0";

const PRODUCTION_LOGIN_HOST: &str = "login.salesforce.com";
const SANDBOX_LOGIN_HOST: &str = "test.salesforce.com";

/// Optional settings file. Every section and key has a default, so an empty
/// file (or no file) gives a production login with standard retries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocatorConfig {
    pub salesforce: SalesforceSettings,
    pub retry: RetrySettings,
    pub folders: FolderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesforceSettings {
    /// `login` for production, `test` for sandboxes, or a My Domain prefix.
    pub domain: String,
    pub api_version: String,
    /// Full login base URL; overrides `domain` when set.
    pub login_url: Option<String>,
}

impl Default for SalesforceSettings {
    fn default() -> Self {
        Self {
            domain: PRODUCTION_DOMAIN.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            login_url: None,
        }
    }
}

impl SalesforceSettings {
    pub fn login_base_url(&self) -> String {
        match &self.login_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.salesforce.com", self.domain),
        }
    }

    fn login_host(&self) -> Option<String> {
        Url::parse(&self.login_base_url())
            .ok()?
            .host_str()
            .map(str::to_ascii_lowercase)
    }

    /// Judged from the effective login URL, so a `login_url` override wins over `domain`.
    pub fn is_sandbox(&self) -> bool {
        self.login_host().as_deref() == Some(SANDBOX_LOGIN_HOST)
    }

    /// Label for logs: `production`, `sandbox`, or `custom domain`.
    pub fn environment(&self) -> &'static str {
        match self.login_host().as_deref() {
            Some(PRODUCTION_LOGIN_HOST) => "production",
            Some(SANDBOX_LOGIN_HOST) => "sandbox",
            _ => "custom domain",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
            .with_base_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderSettings {
    pub on_ambiguous: AmbiguousFolderPolicy,
}

impl RelocatorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| RelocatorError::ConfigError {
                message: format!("cannot read settings file {}: {}", path.display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${SF_DOMAIN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RelocatorError::ConfigError {
            message: format!("env var pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_login_domain("salesforce.domain", &self.salesforce.domain)?;
        validate_api_version("salesforce.api_version", &self.salesforce.api_version)?;
        if let Some(url) = &self.salesforce.login_url {
            validate_url("salesforce.login_url", url)?;
        }

        validate_range("retry.max_retries", self.retry.max_retries, 0, 10)?;
        validate_range("retry.initial_delay_ms", self.retry.initial_delay_ms, 1, 60_000)?;
        validate_range(
            "retry.max_delay_ms",
            self.retry.max_delay_ms,
            self.retry.initial_delay_ms,
            300_000,
        )?;

        Ok(())
    }
}

impl Validate for RelocatorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
