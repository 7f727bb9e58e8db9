//! Environment configuration for different deployment stages

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;

use super::StorageConfig;

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Accept `<user_id>:<username>` bearer tokens without verification
        disable_auth: bool,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let disable_auth = env::var("DISABLE_AUTH")
                    .map(|val| val.trim().eq_ignore_ascii_case("true"))
                    .unwrap_or(false);

                Self::Development { disable_auth }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Path of the JSON file holding the object storage credentials
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        env::var("CONFIG_PATH").map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    }

    /// Returns the Dynamo DB table holding image records
    ///
    /// # Panics
    ///
    /// Panics if the `IMAGES_TABLE_NAME` environment variable is not set outside development
    #[must_use]
    pub fn images_table_name(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("IMAGES_TABLE_NAME")
                .expect("IMAGES_TABLE_NAME environment variable is not set"),
            Self::Development { .. } => {
                env::var("IMAGES_TABLE_NAME").unwrap_or_else(|_| "flashcards-images".to_string())
            }
        }
    }

    /// Returns the HMAC secret used to verify access tokens
    ///
    /// # Panics
    ///
    /// Panics if the `JWT_SECRET` environment variable is not set outside development
    #[must_use]
    pub fn jwt_secret(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("JWT_SECRET").expect("JWT_SECRET environment variable is not set")
            }
            Self::Development { .. } => {
                env::var("JWT_SECRET").unwrap_or_else(|_| "flashcards-development-secret".to_string())
            }
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Whether bearer tokens are trusted without verification
    #[must_use]
    pub const fn disable_auth(&self) -> bool {
        matches!(self, Self::Development { disable_auth: true })
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development { .. } => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration built from the static credentials file, with retry and timeout settings
    pub async fn aws_config(&self, storage: &StorageConfig) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let credentials = Credentials::new(
            storage.access_key_id.clone(),
            storage.secret_access_key.clone(),
            None,
            None,
            "storage-config-file",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(storage.region.clone()))
            .credentials_provider(credentials)
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }

    /// AWS S3 service configuration
    #[must_use]
    pub fn s3_client_config(&self, aws_config: &aws_config::SdkConfig) -> aws_sdk_s3::Config {
        let s3_config: aws_sdk_s3::Config = aws_config.into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }
}
