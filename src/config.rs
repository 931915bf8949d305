use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use crate::api::API_HOST;
use crate::error::Result;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    API_HOST.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl Config {
    pub fn from_file(file_name: &str) -> Result<Self> {
        let conf = config::Config::builder()
            .add_source(config::File::with_name(file_name))
            .build()?;
        Ok(conf.try_deserialize()?)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let conf = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(conf.try_deserialize()?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::client::Client;
    use secrecy::ExposeSecret;
    use std::time::Duration;

    #[test]
    fn defaults() {
        let conf = Config::from_toml("").unwrap();

        assert_eq!(conf.base_url, "https://shapeshift.io");
        assert!(conf.api_key.is_none());
        assert_eq!(conf.timeout(), None);
    }

    #[test]
    fn full() {
        let conf = Config::from_toml(
            r#"
            base_url = "http://localhost:3000"
            api_key = "secret-key"
            timeout_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(conf.base_url, "http://localhost:3000");
        assert_eq!(
            conf.api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("secret-key")
        );
        assert_eq!(conf.timeout(), Some(Duration::from_secs(15)));
        assert!(!format!("{:?}", conf).contains("secret-key"));

        let client = Client::from_config(&conf).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3000/");
    }

    #[test]
    fn bad_timeout() {
        let err = Config::from_toml("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, crate::error::Error::Settings(_)));
    }

    #[test]
    fn bad_base_url() {
        let conf = Config::from_toml("base_url = \"::nope\"").unwrap();
        assert!(Client::from_config(&conf).is_err());
    }

    #[test]
    fn missing_file() {
        assert!(Config::from_file("does-not-exist.toml").is_err());
    }
}
