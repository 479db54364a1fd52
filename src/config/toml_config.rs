use super::AppConfig;
use crate::utils::error::{CatalogueError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern compiles"));

impl AppConfig {
    /// Loads the config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CatalogueError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML after replacing `${VAR}` with environment values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CatalogueError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

// Unknown variables are left as-is so validation reports them.
fn substitute_env_vars(content: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_toml_config() {
        let toml_content = r#"
environment = "staging"

[server]
port = 9000
cors_origin = "https://shop.example.com"

[aws]
region = "eu-west-1"
s3_bucket = "catalogue-images"

[tables]
products = "products-staging"

[auth]
admin_token_secret = "secret"

[notifications]
admin_phone_numbers = ["+15550001111"]

[notifications.mailjet]
api_key = "key"
api_secret = "shh"
sender_email = "shop@example.com"
recipients = ["owner@example.com"]
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.environment, "staging");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.tables.products, "products-staging");
        assert_eq!(config.tables.categories, "product-categories");
        assert_eq!(config.auth.token_ttl_minutes, 30);
        let mailjet = config.notifications.mailjet.as_ref().unwrap();
        assert_eq!(mailjet.endpoint, "https://api.mailjet.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CATALOGUE_TEST_ADMIN_TOKEN", "from-env");

        let toml_content = r#"
[aws]
s3_bucket = "catalogue-images"

[auth]
admin_token_secret = "${CATALOGUE_TEST_ADMIN_TOKEN}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.auth.admin_token_secret, "from-env");

        std::env::remove_var("CATALOGUE_TEST_ADMIN_TOKEN");
    }

    #[test]
    fn test_unset_variable_is_kept() {
        assert_eq!(
            substitute_env_vars("secret = \"${CATALOGUE_TEST_UNSET_VAR}\""),
            "secret = \"${CATALOGUE_TEST_UNSET_VAR}\""
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[aws]\ns3_bucket = \"catalogue-images\"\n\n[auth]\nadmin_token_secret = \"secret\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.aws.s3_bucket, "catalogue-images");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml_str("[server\nport = 1");
        assert!(matches!(result, Err(CatalogueError::ConfigError { .. })));
    }
}
