//! Object storage credentials loaded from a static JSON file

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::Environment;

/// Errors raised while loading the storage configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path of the configuration file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or a key is missing
    #[error("Malformed storage configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A key is present but blank
    #[error("Storage configuration value {0} is empty")]
    EmptyValue(&'static str),
}

/// Static credentials, region and bucket for the object store
#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    /// AWS access key id
    #[serde(rename = "AWS_ACCESS_KEY_ID")]
    pub access_key_id: String,
    /// AWS secret access key
    #[serde(rename = "AWS_SECRET_ACCESS_KEY")]
    pub secret_access_key: String,
    /// Region the bucket lives in
    #[serde(rename = "AWS_REGION")]
    pub region: String,
    /// Bucket receiving uploads
    #[serde(rename = "AWS_STORAGE_BUCKET_NAME")]
    pub bucket_name: String,
}

impl StorageConfig {
    /// Reads and validates the configuration file at `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, malformed, or has a blank value
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&raw)
    }

    /// Parses and validates a configuration document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for invalid JSON or missing keys and
    /// `ConfigError::EmptyValue` for blank values
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;

        for (name, value) in [
            ("AWS_ACCESS_KEY_ID", &config.access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &config.secret_access_key),
            ("AWS_REGION", &config.region),
            ("AWS_STORAGE_BUCKET_NAME", &config.bucket_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyValue(name));
            }
        }

        Ok(config)
    }

    /// Public URL prefix under which uploaded objects are reachable
    #[must_use]
    pub fn public_base_url(&self, environment: &Environment) -> String {
        match environment.override_aws_endpoint_url() {
            Some(endpoint) => format!("{endpoint}/{}", self.bucket_name),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                self.bucket_name, self.region
            ),
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"{
        "AWS_ACCESS_KEY_ID": "AKIAEXAMPLE",
        "AWS_SECRET_ACCESS_KEY": "very-secret",
        "AWS_REGION": "us-west-2",
        "AWS_STORAGE_BUCKET_NAME": "flashcards-media"
    }"#;

    #[test]
    fn test_parse_valid_config() {
        let config = StorageConfig::from_json(VALID).unwrap();
        assert_eq!(config.access_key_id, "AKIAEXAMPLE");
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.bucket_name, "flashcards-media");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let raw = r#"{"AWS_ACCESS_KEY_ID": "a", "AWS_SECRET_ACCESS_KEY": "b", "AWS_REGION": "c"}"#;
        let err = StorageConfig::from_json(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("AWS_STORAGE_BUCKET_NAME"));
    }

    #[test]
    fn test_blank_value_is_rejected() {
        let raw = VALID.replace("us-west-2", "  ");
        let err = StorageConfig::from_json(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue("AWS_REGION")));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(
            StorageConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let config = StorageConfig::load(file.path()).unwrap();
        assert_eq!(config.secret_access_key, "very-secret");
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = StorageConfig::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/config.json"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StorageConfig::from_json(VALID).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("AKIAEXAMPLE"));
        assert!(debug.contains("flashcards-media"));
    }

    #[test]
    fn test_public_base_url_uses_configured_region() {
        let config = StorageConfig::from_json(&VALID.replace("us-west-2", "eu-central-1")).unwrap();

        assert_eq!(
            config.public_base_url(&Environment::Production),
            "https://flashcards-media.s3.eu-central-1.amazonaws.com"
        );
        assert_eq!(
            config.public_base_url(&Environment::Development {
                disable_auth: false
            }),
            "http://localhost:4566/flashcards-media"
        );
    }
}
