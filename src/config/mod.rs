pub mod credentials;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::logger::LogFormat;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_login_domain, validate_path, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "report-relocator")]
#[command(about = "Move Salesforce reports into the folders listed in a CSV mapping file")]
pub struct CliConfig {
    /// CSV with report_id, destination_folder, is_private and owner_username columns
    #[arg(default_value = "report_mapping.csv")]
    pub mapping_file: String,

    /// Optional TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log in to a sandbox (test.salesforce.com)
    #[arg(long)]
    pub sandbox: bool,

    /// Custom login domain prefix, e.g. mycompany.my
    #[arg(long, conflicts_with = "sandbox")]
    pub domain: Option<String>,

    /// Resolve folders and validate rows without moving anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Command-line flags win over the settings file.
    pub fn apply_to(&self, config: &mut toml_config::RelocatorConfig) {
        if self.sandbox {
            config.salesforce.domain = toml_config::SANDBOX_DOMAIN.to_string();
        }
        if let Some(domain) = &self.domain {
            config.salesforce.domain = domain.clone();
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        validate_path("mapping_file", &self.mapping_file)?;
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        if let Some(domain) = &self.domain {
            validate_login_domain("domain", domain)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::toml_config::RelocatorConfig;
    use super::*;

    #[test]
    fn test_no_arguments_uses_defaults() {
        let cli = CliConfig::parse_from(["report-relocator"]);

        assert_eq!(cli.mapping_file, "report_mapping.csv");
        assert!(!cli.sandbox);
        assert!(!cli.dry_run);
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_sandbox_flag_switches_domain() {
        let cli = CliConfig::parse_from(["report-relocator", "moves.csv", "--sandbox"]);
        let mut config = RelocatorConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(cli.mapping_file, "moves.csv");
        assert!(config.salesforce.is_sandbox());
    }

    #[test]
    fn test_custom_domain_and_json_logs() {
        let cli = CliConfig::parse_from([
            "report-relocator",
            "--domain",
            "acme.my",
            "--log-format",
            "json",
        ]);
        let mut config = RelocatorConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.salesforce.domain, "acme.my");
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_sandbox_conflicts_with_domain() {
        let result =
            CliConfig::try_parse_from(["report-relocator", "--sandbox", "--domain", "acme.my"]);
        assert!(result.is_err());
    }
}
