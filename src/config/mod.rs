//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;
use crate::params::Params;

const LOCAL_CONFIG_BASENAME: &str = "storefront";
const ENV_PREFIX: &str = "STOREFRONT";

/// Command-line arguments for the storefront-query binary.
#[derive(Debug, Parser)]
#[command(
    name = "storefront-query",
    version,
    about = "Inspect the shopper API cache maintenance rules"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "STOREFRONT_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List every query and mutation with its parameters.
    #[command(name = "operations")]
    Operations(OperationsArgs),
    /// Print the cache effects of one successful mutation as JSON.
    #[command(name = "plan")]
    Plan(PlanArgs),
}

#[derive(Debug, Args, Clone, Default)]
pub struct OperationsArgs {
    /// Only list mutations.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub mutations: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PlanArgs {
    /// Mutation name, e.g. `updateItemInBasket`.
    #[arg(value_name = "MUTATION")]
    pub mutation: String,

    /// Request parameter as NAME=VALUE; repeatable.
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Acting customer; omitted for a guest.
    #[arg(long = "customer-id", value_name = "ID")]
    pub customer_id: Option<String>,

    /// Request body as JSON.
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,

    /// Response body as JSON; `null` when omitted.
    #[arg(long, value_name = "JSON", conflicts_with = "response_file")]
    pub response: Option<String>,

    /// File holding the response body.
    #[arg(long = "response-file", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub response_file: Option<PathBuf>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    if name.is_empty() {
        return Err("parameter name must not be empty".to_string());
    }
    Ok((name.to_string(), value.to_string()))
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the organization every request is scoped to.
    #[arg(long = "organization-id", value_name = "ID", global = true)]
    pub organization_id: Option<String>,

    /// Override the site every request is scoped to.
    #[arg(long = "site-id", value_name = "ID", global = true)]
    pub site_id: Option<String>,

    /// Override the default locale.
    #[arg(long = "locale", value_name = "LOCALE", global = true)]
    pub locale: Option<String>,

    /// Override the default currency.
    #[arg(long = "currency", value_name = "CODE", global = true)]
    pub currency: Option<String>,

    /// Toggle the query cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_enabled: Option<bool>,

    /// Override the maximum number of cached queries.
    #[arg(long = "cache-max-entries", value_name = "COUNT", global = true)]
    pub cache_max_entries: Option<usize>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub client: ClientSettings,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Parameters every request starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
    pub organization_id: Option<String>,
    pub site_id: Option<String>,
    pub locale: Option<String>,
    pub currency: Option<String>,
}

impl ClientSettings {
    /// Client-wide default parameters.
    pub fn default_params(&self) -> Params {
        [
            ("organizationId", &self.organization_id),
            ("siteId", &self.site_id),
            ("locale", &self.locale),
            ("currency", &self.currency),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|value| (name, value)))
        .collect()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    client: RawClientSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(organization_id) = overrides.organization_id.as_ref() {
            self.client.organization_id = Some(organization_id.clone());
        }
        if let Some(site_id) = overrides.site_id.as_ref() {
            self.client.site_id = Some(site_id.clone());
        }
        if let Some(locale) = overrides.locale.as_ref() {
            self.client.locale = Some(locale.clone());
        }
        if let Some(currency) = overrides.currency.as_ref() {
            self.client.currency = Some(currency.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(max_entries) = overrides.cache_max_entries {
            self.cache.max_entries = Some(max_entries);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            client,
            cache,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let client = build_client_settings(client)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self {
            logging,
            client,
            cache,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_client_settings(client: RawClientSettings) -> Result<ClientSettings, LoadError> {
    Ok(ClientSettings {
        organization_id: non_blank(client.organization_id, "client.organization_id")?,
        site_id: non_blank(client.site_id, "client.site_id")?,
        locale: non_blank(client.locale, "client.locale")?,
        currency: non_blank(client.currency, "client.currency")?,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheConfig, LoadError> {
    let defaults = CacheConfig::default();

    let max_entries = cache.max_entries.unwrap_or(defaults.max_entries);
    if max_entries == 0 {
        return Err(LoadError::invalid(
            "cache.max_entries",
            "must be greater than zero",
        ));
    }

    let event_capacity = cache.event_capacity.unwrap_or(defaults.event_capacity);
    if event_capacity == 0 {
        return Err(LoadError::invalid(
            "cache.event_capacity",
            "must be greater than zero",
        ));
    }

    Ok(CacheConfig {
        enabled: cache.enabled.unwrap_or(defaults.enabled),
        max_entries,
        event_capacity,
    })
}

/// Trimmed value; present but blank is an error.
fn non_blank(value: Option<String>, key: &'static str) -> Result<Option<String>, LoadError> {
    match value {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(LoadError::invalid(key, "must not be blank"));
            }
            Ok(Some(trimmed.to_string()))
        }
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawClientSettings {
    organization_id: Option<String>,
    site_id: Option<String>,
    locale: Option<String>,
    currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    max_entries: Option<usize>,
    event_capacity: Option<usize>,
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
