use std::{env, net::SocketAddr, str::FromStr};
use thiserror::Error;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_CREDENTIAL_TTL_SECS: u64 = 3600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(String),
    #[error("invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub bucket_name: String,
    // Store region as string for simplicity here, aws_clients can convert
    pub aws_region: String,
    // Optional endpoint for LocalStack/MinIO
    pub endpoint_url: Option<String>,
    // Base the public image URLs are built from; virtual-hosted S3 form when unset
    pub public_base_url: Option<String>,
    pub admin_password: String,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub credential_ttl_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables. A `.env` file is
    /// honored when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_address_str =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = SocketAddr::from_str(&bind_address_str)
            .map_err(|e| ConfigError::InvalidVar("BIND_ADDRESS".into(), e.to_string()))?;

        let bucket_name = env::var("S3_BUCKET_NAME")
            .map_err(|_| ConfigError::MissingVar("S3_BUCKET_NAME".into()))?;

        let aws_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        // Allow overriding endpoint for localstack/testing
        let endpoint_url = env::var("AWS_ENDPOINT_URL").ok();

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string());

        let admin_password = env::var("ADMIN_PASSWORD")
            .map_err(|_| ConfigError::MissingVar("ADMIN_PASSWORD".into()))?;
        if admin_password.is_empty() {
            return Err(ConfigError::InvalidVar(
                "ADMIN_PASSWORD".into(),
                "must not be empty".into(),
            ));
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::InvalidVar("MAX_UPLOAD_BYTES".into(), v))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let credential_ttl_secs = match env::var("CREDENTIAL_TTL_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::InvalidVar("CREDENTIAL_TTL_SECS".into(), v))?,
            Err(_) => DEFAULT_CREDENTIAL_TTL_SECS,
        };

        Ok(Config {
            bind_address,
            bucket_name,
            aws_region,
            endpoint_url,
            public_base_url,
            admin_password,
            allowed_origins,
            max_upload_bytes,
            credential_ttl_secs,
        })
    }

    /// Base URL public image addresses are built from: the configured
    /// override, or the bucket's virtual-hosted S3 address.
    pub fn public_image_base(&self) -> String {
        match &self.public_base_url {
            Some(base) => base.clone(),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                self.bucket_name, self.aws_region
            ),
        }
    }
}

/// Splits a comma-separated origin list, dropping empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_split_on_commas_and_trim() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn empty_origin_entries_dropped() {
        assert_eq!(parse_origins(",, https://a.example ,"), vec!["https://a.example"]);
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn public_base_prefers_configured_override() {
        let config = crate::test_support::test_config();
        assert_eq!(config.public_image_base(), "https://photos.test");
    }

    #[test]
    fn public_base_defaults_to_virtual_hosted_form() {
        let mut config = crate::test_support::test_config();
        config.public_base_url = None;
        assert_eq!(
            config.public_image_base(),
            "https://test-bucket.s3.us-east-1.amazonaws.com"
        );
    }
}
