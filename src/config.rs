use std::time::Duration;

use crate::error::OptimizerError;

/// Canonical Tinify host. Every request carries it as `Host`, including the
/// resize call whose URL comes from a `Location` header.
pub const API_HOST: &str = "api.tinify.com";
pub const API_ENDPOINT: &str = "https://api.tinify.com";
pub const API_USERNAME: &str = "api";
pub const API_KEY_VAR: &str = "TINYAPIKEY";

pub const IMAGES_BUCKET: &str = "bolha-images";

pub const UNCOMPRESSED_MARKER: &str = "_uncompressed.jpg";
pub const COMPRESSED_MARKER: &str = ".jpg";

/// The one resize policy applied to every compressed image.
pub const RESIZE_METHOD: &str = "scale";
pub const RESIZE_WIDTH: u32 = 640;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const STORAGE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub bucket: String,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, OptimizerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, OptimizerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or(OptimizerError::MissingEnv(API_KEY_VAR))?;

        Ok(Self {
            api_key,
            bucket: IMAGES_BUCKET.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_api_key_from_lookup() {
        let lookup = |name: &str| (name == API_KEY_VAR).then(|| "secret".to_string());
        let config = Config::from_lookup(lookup).unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.bucket, IMAGES_BUCKET);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = Config::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, OptimizerError::MissingEnv(API_KEY_VAR)));
    }

    #[test]
    fn blank_api_key_is_an_error() {
        let err = Config::from_lookup(|_| Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, OptimizerError::MissingEnv(_)));
    }
}
