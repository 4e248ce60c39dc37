//! Layered configuration
//!
//! Values come from four layers, lowest precedence first: built-in defaults,
//! the TOML configuration file, `ORG_INVENTORY_*` environment variables and
//! the command line. Each layer is read into a [`RawConfig`] of unvalidated
//! values; the merged result is validated once by [`RawConfig::resolve`].

use crate::app::cli::args::Args;
use crate::aws::api::DEFAULT_SESSION_DURATION;
use crate::core::logging::{LOG_FORMATS, LOG_LEVELS};
use crate::core::validation::{
    split_and_collect, validate_account_id, validate_positive_int, validate_regions,
    validate_role_name, ValidationError, ValidationResult,
};
use crate::inventory::api::{InventoryResult, ScanSettings, DEFAULT_MAX_CONCURRENCY};
use crate::report::api::{ExportFormat, DEFAULT_ERROR_DISPLAY_LIMIT};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "org-inventory.toml";
pub const CONFIG_DIR_NAME: &str = "OrgInventory";
pub const ENV_PREFIX: &str = "ORG_INVENTORY_";
pub const DEFAULT_ROLE_NAME: &str = "AWSControlTowerExecution";
pub const DEFAULT_REGIONS: [&str; 2] = ["us-east-1", "us-west-2"];
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const SESSION_DURATION_RANGE: std::ops::RangeInclusive<u32> = 900..=43200;

/// Unvalidated values from one configuration layer
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawConfig {
    pub role_name: Option<String>,
    pub regions: Option<Vec<String>>,
    pub max_concurrency: Option<String>,
    pub exclude_accounts: Option<Vec<String>>,
    pub session_duration: Option<String>,
    pub unit_timeout: Option<String>,
    pub output_dir: Option<String>,
    pub formats: Option<Vec<String>>,
    pub s3_bucket: Option<String>,
    pub s3_prefix: Option<String>,
    pub error_display_limit: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
    pub color: Option<bool>,
}

/// Validated configuration for one run
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryConfig {
    pub role_name: String,
    pub regions: Vec<String>,
    pub max_concurrency: usize,
    pub exclude_accounts: Vec<String>,
    pub session_duration: u32,
    pub unit_timeout: Option<Duration>,
    pub output_dir: PathBuf,
    pub formats: Vec<ExportFormat>,
    pub s3_bucket: Option<String>,
    pub s3_prefix: Option<String>,
    pub error_display_limit: usize,
    pub log_level: Option<String>,
    pub log_format: String,
    pub log_file: Option<PathBuf>,
    pub color: Option<bool>,
}

impl InventoryConfig {
    pub fn scan_settings(&self) -> InventoryResult<ScanSettings> {
        Ok(ScanSettings::new(self.regions.clone(), self.max_concurrency)?
            .with_excluded_accounts(self.exclude_accounts.iter().cloned())
            .with_unit_timeout(self.unit_timeout))
    }
}

fn string_or_list(key: &str, value: &toml::Value) -> ValidationResult<Vec<String>> {
    if let Some(s) = value.as_str() {
        return Ok(vec![s.to_string()]);
    }
    if let Some(items) = value.as_array() {
        return items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ValidationError::new(format!("'{}' must contain only strings", key))
                })
            })
            .collect();
    }
    Err(ValidationError::new(format!(
        "'{}' must be a string or an array of strings",
        key
    )))
}

fn scalar(key: &str, value: &toml::Value) -> ValidationResult<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        _ => Err(ValidationError::new(format!(
            "'{}' must be a string or an integer",
            key
        ))),
    }
}

fn parse_bool(key: &str, value: &str) -> ValidationResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ValidationError::new(format!(
            "{}: '{}' is not a boolean",
            key, value
        ))),
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

impl RawConfig {
    /// Values present in a parsed configuration file
    pub fn apply_toml_values(config: &toml::Table) -> ValidationResult<Self> {
        let mut raw = Self::default();
        for (key, value) in config {
            match key.as_str() {
                "role-name" => raw.role_name = Some(scalar(key, value)?),
                "regions" => raw.regions = Some(string_or_list(key, value)?),
                "max-concurrency" => raw.max_concurrency = Some(scalar(key, value)?),
                "exclude-accounts" => raw.exclude_accounts = Some(string_or_list(key, value)?),
                "session-duration" => raw.session_duration = Some(scalar(key, value)?),
                "unit-timeout" => raw.unit_timeout = Some(scalar(key, value)?),
                "output-dir" => raw.output_dir = Some(scalar(key, value)?),
                "format" => raw.formats = Some(string_or_list(key, value)?),
                "s3-bucket" => raw.s3_bucket = Some(scalar(key, value)?),
                "s3-prefix" => raw.s3_prefix = Some(scalar(key, value)?),
                "error-display-limit" => raw.error_display_limit = Some(scalar(key, value)?),
                "log-level" => raw.log_level = Some(scalar(key, value)?),
                "log-format" => raw.log_format = Some(scalar(key, value)?),
                "log-file" => raw.log_file = Some(scalar(key, value)?),
                "color" | "no-color" => {
                    let enabled = value.as_bool().ok_or_else(|| {
                        ValidationError::new(format!("'{}' must be true or false", key))
                    })?;
                    raw.color = Some(if key == "color" { enabled } else { !enabled });
                }
                _ => log::warn!("Ignoring unknown configuration key '{}'", key),
            }
        }
        Ok(raw)
    }

    /// Values from `ORG_INVENTORY_*` variables, read through `lookup`
    pub fn from_env_vars<F>(lookup: F) -> ValidationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let list = |name: &str| var(name).map(|v| vec![v]);
        let color = match (var("COLOR"), var("NO_COLOR")) {
            (Some(v), _) => Some(parse_bool("ORG_INVENTORY_COLOR", &v)?),
            (None, Some(v)) => Some(!parse_bool("ORG_INVENTORY_NO_COLOR", &v)?),
            (None, None) => None,
        };
        Ok(Self {
            role_name: var("ROLE_NAME"),
            regions: list("REGIONS"),
            max_concurrency: var("MAX_CONCURRENCY"),
            exclude_accounts: list("EXCLUDE_ACCOUNTS"),
            session_duration: var("SESSION_DURATION"),
            unit_timeout: var("UNIT_TIMEOUT"),
            output_dir: var("OUTPUT_DIR"),
            formats: list("FORMAT"),
            s3_bucket: var("S3_BUCKET"),
            s3_prefix: var("S3_PREFIX"),
            error_display_limit: var("ERROR_DISPLAY_LIMIT"),
            log_level: var("LOG_LEVEL"),
            log_format: var("LOG_FORMAT"),
            log_file: var("LOG_FILE"),
            color,
        })
    }

    pub fn from_env() -> ValidationResult<Self> {
        Self::from_env_vars(|name| std::env::var(name).ok())
    }

    pub fn from_args(args: &Args) -> Self {
        Self {
            role_name: args.role_name.clone(),
            regions: non_empty(args.regions.clone()),
            max_concurrency: args.max_concurrency.clone(),
            exclude_accounts: non_empty(args.exclude_accounts.clone()),
            session_duration: args.session_duration.clone(),
            unit_timeout: args.unit_timeout.clone(),
            output_dir: args
                .output_dir
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            formats: non_empty(args.formats.clone()),
            s3_bucket: args.s3_bucket.clone(),
            s3_prefix: args.s3_prefix.clone(),
            error_display_limit: args.error_display_limit.clone(),
            log_level: args.log_level.clone(),
            log_format: args.log_format.clone(),
            log_file: args.log_file.clone(),
            color: args.color_choice(),
        }
    }

    /// Let every value present in `higher` replace ours
    pub fn overlay(mut self, higher: RawConfig) -> Self {
        macro_rules! take {
            ($($field:ident),+) => {
                $( if higher.$field.is_some() { self.$field = higher.$field; } )+
            };
        }
        take!(
            role_name,
            regions,
            max_concurrency,
            exclude_accounts,
            session_duration,
            unit_timeout,
            output_dir,
            formats,
            s3_bucket,
            s3_prefix,
            error_display_limit,
            log_level,
            log_format,
            log_file,
            color
        );
        self
    }

    /// Apply defaults and validate
    pub fn resolve(self) -> ValidationResult<InventoryConfig> {
        let role_name = validate_role_name(self.role_name.as_deref().unwrap_or(DEFAULT_ROLE_NAME))?;

        let regions = match self.regions {
            Some(regions) => validate_regions(&regions)?,
            None => DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
        };

        let max_concurrency = match self.max_concurrency {
            Some(value) => validate_positive_int("max-concurrency", &value)?,
            None => DEFAULT_MAX_CONCURRENCY,
        };

        let exclude_accounts = split_and_collect(self.exclude_accounts.unwrap_or_default())
            .iter()
            .map(|id| validate_account_id(id))
            .collect::<ValidationResult<Vec<_>>>()?;

        let session_duration = match self.session_duration {
            Some(value) => parse_session_duration(&value)?,
            None => DEFAULT_SESSION_DURATION,
        };

        let unit_timeout = self
            .unit_timeout
            .map(|value| validate_positive_int("unit-timeout", &value))
            .transpose()?
            .map(|secs| Duration::from_secs(secs as u64));

        let formats = match self.formats {
            Some(values) => parse_formats(&values)?,
            None => vec![ExportFormat::Csv],
        };

        let error_display_limit = match self.error_display_limit {
            Some(value) => value.trim().parse::<usize>().map_err(|_| {
                ValidationError::new(format!(
                    "error-display-limit: '{}' is not a valid non-negative integer",
                    value
                ))
            })?,
            None => DEFAULT_ERROR_DISPLAY_LIMIT,
        };

        let log_level = self
            .log_level
            .map(|level| {
                LOG_LEVELS
                    .iter()
                    .find(|l| l.eq_ignore_ascii_case(level.trim()))
                    .map(|l| l.to_string())
                    .ok_or_else(|| {
                        ValidationError::new(format!(
                            "log-level: '{}' is not one of {}",
                            level,
                            LOG_LEVELS.join(", ")
                        ))
                    })
            })
            .transpose()?;

        let log_format = match self.log_format {
            Some(format) if LOG_FORMATS.contains(&format.trim()) => format.trim().to_string(),
            Some(format) => {
                return Err(ValidationError::new(format!(
                    "log-format: '{}' is not one of {}",
                    format,
                    LOG_FORMATS.join(", ")
                )))
            }
            None => "text".to_string(),
        };

        Ok(InventoryConfig {
            role_name,
            regions,
            max_concurrency,
            exclude_accounts,
            session_duration,
            unit_timeout,
            output_dir: PathBuf::from(
                self.output_dir
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            formats,
            s3_bucket: trimmed(self.s3_bucket),
            s3_prefix: trimmed(self.s3_prefix),
            error_display_limit,
            log_level,
            log_format,
            log_file: self
                .log_file
                .filter(|f| !(f.eq_ignore_ascii_case("none") || f == "-" || f.trim().is_empty()))
                .map(PathBuf::from),
            color: self.color,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_session_duration(value: &str) -> ValidationResult<u32> {
    match value.trim().parse::<u32>() {
        Ok(secs) if SESSION_DURATION_RANGE.contains(&secs) => Ok(secs),
        _ => Err(ValidationError::new(format!(
            "session-duration: '{}' must be between {} and {} seconds",
            value,
            SESSION_DURATION_RANGE.start(),
            SESSION_DURATION_RANGE.end()
        ))),
    }
}

fn parse_formats(values: &[String]) -> ValidationResult<Vec<ExportFormat>> {
    let mut formats = Vec::new();
    for name in split_and_collect(values) {
        let format = ExportFormat::from_str(&name).ok_or_else(|| {
            ValidationError::new(format!(
                "format: '{}' is not one of {}",
                name,
                ExportFormat::names().collect::<Vec<_>>().join(", ")
            ))
        })?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    if formats.is_empty() {
        return Err(ValidationError::new("at least one report format is required"));
    }
    Ok(formats)
}

/// Configuration file to read, if any
///
/// An explicit path must exist. Otherwise `./org-inventory.toml` is tried,
/// then `<config dir>/OrgInventory/org-inventory.toml`.
pub fn locate_config_file(explicit: Option<&Path>) -> ValidationResult<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ValidationError::new(format!(
                "The specified configuration file does not exist: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }
    Ok(dirs::config_dir()
        .map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|p| p.exists()))
}

pub async fn read_config_file(path: &Path) -> ValidationResult<RawConfig> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        ValidationError::new(format!(
            "Error reading configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    let table = toml::from_str::<toml::Table>(&contents).map_err(|e| {
        ValidationError::new(format!(
            "Error parsing configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    RawConfig::apply_toml_values(&table).map_err(|e| {
        ValidationError::new(format!(
            "Error in configuration file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Merge every layer for `args` and validate the result
pub async fn load_config(args: &Args) -> ValidationResult<InventoryConfig> {
    let mut raw = RawConfig::default();
    if let Some(path) = locate_config_file(args.config_file.as_deref())? {
        log::debug!("Reading configuration from {}", path.display());
        raw = raw.overlay(read_config_file(&path).await?);
    }
    raw.overlay(RawConfig::from_env()?)
        .overlay(RawConfig::from_args(args))
        .resolve()
}
