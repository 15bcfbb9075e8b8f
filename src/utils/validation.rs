use crate::utils::error::{RelocatorError, Result};
use regex::Regex;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(RelocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RelocatorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(RelocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RelocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RelocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| RelocatorError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RelocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Salesforce API versions look like `59.0`.
pub fn validate_api_version(field_name: &str, version: &str) -> Result<()> {
    let re = Regex::new(r"^\d{2,3}\.0$").map_err(|e| RelocatorError::ConfigError {
        message: e.to_string(),
    })?;
    if !re.is_match(version) {
        return Err(RelocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: version.to_string(),
            reason: "API version must look like 59.0".to_string(),
        });
    }
    Ok(())
}

/// Login domains are a single DNS label prefix (`login`, `test`, `acme.my`).
pub fn validate_login_domain(field_name: &str, domain: &str) -> Result<()> {
    let re = Regex::new(r"^[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*$").map_err(|e| {
        RelocatorError::ConfigError {
            message: e.to_string(),
        }
    })?;
    if !re.is_match(domain) {
        return Err(RelocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: domain.to_string(),
            reason: "Domain must be a host prefix such as login, test or mycompany.my".to_string(),
        });
    }
    Ok(())
}
