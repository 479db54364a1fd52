pub mod toml_config;

use crate::utils::error::{CatalogueError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_non_empty_string, validate_positive_number,
    validate_s3_bucket_name, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::env;

#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: String,
    pub server: ServerConfig,
    pub aws: AwsConfig,
    pub tables: TableNames,
    pub auth: AuthConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin, `*` mirrors the caller's origin.
    pub cors_origin: String,
    pub max_request_size: usize,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,
    pub s3_bucket: String,
    /// LocalStack or DynamoDB Local endpoint; unset talks to AWS.
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub products: String,
    pub categories: String,
    pub testimonials: String,
    pub enquiries: String,
    pub users: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_token_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub mailjet: Option<MailjetConfig>,
    pub admin_phone_numbers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailjetConfig {
    pub api_key: String,
    pub api_secret: String,
    pub sender_email: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_mailjet_endpoint")]
    pub endpoint: String,
}

fn default_mailjet_endpoint() -> String {
    "https://api.mailjet.com".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            server: ServerConfig::default(),
            aws: AwsConfig::default(),
            tables: TableNames::default(),
            auth: AuthConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origin: "*".to_string(),
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            cookie_secure: true,
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "ap-south-1".to_string(),
            s3_bucket: String::new(),
            endpoint_url: None,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            products: "product-catalogue".to_string(),
            categories: "product-categories".to_string(),
            testimonials: "testimonials".to_string(),
            enquiries: "customer-enquiries".to_string(),
            users: "app-config".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_token_secret: String::new(),
            token_ttl_minutes: 30,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(environment) = var("ENVIRONMENT").or_else(|| var("NODE_ENV")) {
            config.environment = environment;
        }

        if let Some(host) = var("HOST") {
            config.server.host = host;
        }
        if let Some(port) = var("PORT") {
            config.server.port = parse_var("PORT", &port)?;
        }
        if let Some(origin) = var("ORIGIN") {
            config.server.cors_origin = origin;
        }
        if let Some(size) = var("MAX_REQUEST_SIZE") {
            config.server.max_request_size = parse_var("MAX_REQUEST_SIZE", &size)?;
        }
        if let Some(secure) = var("COOKIE_SECURE") {
            config.server.cookie_secure = parse_var("COOKIE_SECURE", &secure)?;
        }

        if let Some(region) = var("AWS_REGION") {
            config.aws.region = region;
        }
        config.aws.s3_bucket = var("S3_BUCKET_NAME").ok_or(CatalogueError::MissingConfigError {
            field: "S3_BUCKET_NAME".to_string(),
        })?;
        config.aws.endpoint_url = var("AWS_ENDPOINT_URL");

        let tables = &mut config.tables;
        for (key, slot) in [
            ("PRODUCTS_TABLE", &mut tables.products),
            ("CATEGORIES_TABLE", &mut tables.categories),
            ("TESTIMONIALS_TABLE", &mut tables.testimonials),
            ("ENQUIRIES_TABLE", &mut tables.enquiries),
            ("USERS_TABLE", &mut tables.users),
        ] {
            if let Some(name) = var(key) {
                *slot = name;
            }
        }

        config.auth.admin_token_secret =
            var("ADMIN_TOKEN").ok_or(CatalogueError::MissingConfigError {
                field: "ADMIN_TOKEN".to_string(),
            })?;
        if let Some(ttl) = var("TOKEN_TTL_MINUTES") {
            config.auth.token_ttl_minutes = parse_var("TOKEN_TTL_MINUTES", &ttl)?;
        }

        config.notifications.mailjet = match (var("MAILJET_API_KEY"), var("MAILJET_API_SECRET")) {
            (Some(api_key), Some(api_secret)) => Some(MailjetConfig {
                api_key,
                api_secret,
                sender_email: var("SENDER_EMAIL").unwrap_or_default(),
                recipients: split_list(var("RECIPIENT_EMAIL").as_deref()),
                endpoint: var("MAILJET_ENDPOINT").unwrap_or_else(default_mailjet_endpoint),
            }),
            _ => None,
        };
        config.notifications.admin_phone_numbers =
            split_list(var("ADMIN_PHONE_NUMBER").as_deref());

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "prod" | "production")
    }

    /// Public base URL of the image bucket, e.g. `https://bucket.s3.ap-south-1.amazonaws.com`.
    pub fn bucket_url(&self) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com",
            self.aws.s3_bucket, self.aws.region
        )
    }

    #[cfg(feature = "cli")]
    pub fn apply_cli(&mut self, cli: &CliConfig) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }
}

fn parse_var<T: std::str::FromStr>(field: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| CatalogueError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_non_empty_string("server.cors_origin", &self.server.cors_origin)?;
        validate_positive_number("server.max_request_size", self.server.max_request_size, 1)?;

        validate_aws_region("aws.region", &self.aws.region)?;
        validate_s3_bucket_name("aws.s3_bucket", &self.aws.s3_bucket)?;
        if let Some(endpoint) = &self.aws.endpoint_url {
            validate_url("aws.endpoint_url", endpoint)?;
        }

        for (field, name) in [
            ("tables.products", &self.tables.products),
            ("tables.categories", &self.tables.categories),
            ("tables.testimonials", &self.tables.testimonials),
            ("tables.enquiries", &self.tables.enquiries),
            ("tables.users", &self.tables.users),
        ] {
            validate_non_empty_string(field, name)?;
        }

        validate_non_empty_string("auth.admin_token_secret", &self.auth.admin_token_secret)?;
        if self.auth.token_ttl_minutes <= 0 {
            return Err(CatalogueError::InvalidConfigValueError {
                field: "auth.token_ttl_minutes".to_string(),
                value: self.auth.token_ttl_minutes.to_string(),
                reason: "Token lifetime must be positive".to_string(),
            });
        }

        if let Some(mailjet) = &self.notifications.mailjet {
            validate_url("notifications.mailjet.endpoint", &mailjet.endpoint)?;
            validate_non_empty_string("notifications.mailjet.sender_email", &mailjet.sender_email)?;
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "catalogue-api")]
#[command(about = "Catalogue storefront REST API")]
pub struct CliConfig {
    /// TOML config file; without it the environment is used.
    #[arg(long, env = "CATALOGUE_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
