//! Configuration management for the route generator
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use routes::region::Region;
use serde::Deserialize;
use url::Url;

use crate::config::error::RouteConfigError;
use crate::config::serialization::feed_url;
use crate::config::serialization::timeout_seconds;
use crate::platform::Platform;

mod error;
mod serialization;

/// Where APNIC publishes its latest delegation file.
pub const DEFAULT_FEED_URL: &str = "http://ftp.apnic.net/apnic/stats/apnic/delegated-apnic-latest";

/// The smallest route metric accepted.
pub const MIN_METRIC: u32 = 1;

/// The largest route metric accepted. Windows rejects anything above this.
pub const MAX_METRIC: u32 = 9999;

/// Trait for validating configuration values.
trait Validatable {
    /// Validate the configuration values.
    fn validate(&self, cfg: &Settings) -> Result<(), ConfigError>;
}

/// Top-level configuration for the route generator
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    /// Delegation feed configuration
    pub feed: FeedConfig,
    /// What to generate
    pub routes: RoutesConfig,
    /// Where to put the generated scripts
    pub output: OutputConfig,
}

/// Configuration used for the [`FeedClient`](crate::feed::FeedClient).
#[derive(Deserialize, Clone, Debug)]
pub struct FeedConfig {
    /// The URL of the delegation file.
    #[serde(deserialize_with = "feed_url")]
    pub url: Url,
    /// Only records whose first column matches this registry are read.
    pub registry: String,
    /// The maximum duration of the whole download.
    #[serde(deserialize_with = "timeout_seconds")]
    pub timeout: Duration,
}

impl Validatable for FeedConfig {
    fn validate(&self, _: &Settings) -> Result<(), ConfigError> {
        if !["http", "https"].contains(&self.url.scheme()) {
            let err = RouteConfigError::UnsupportedFeedScheme(self.url.scheme().to_string());
            return Err(ConfigError::Message(err.to_string()));
        }
        if self.registry.trim().is_empty() {
            return Err(ConfigError::Message(
                RouteConfigError::EmptyRegistry.to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Message(
                RouteConfigError::ZeroDurationForbidden("feed.timeout").to_string(),
            ));
        }

        Ok(())
    }
}

/// Which routes to generate, and for which client.
#[derive(Deserialize, Clone, Debug)]
pub struct RoutesConfig {
    /// The region the routes cover.
    pub region: Region,
    /// The client platform the scripts are written for.
    pub platform: Platform,
    /// The metric written into openvpn and windows routes.
    pub metric: u32,
}

impl Validatable for RoutesConfig {
    fn validate(&self, _: &Settings) -> Result<(), ConfigError> {
        if !(MIN_METRIC..=MAX_METRIC).contains(&self.metric) {
            let err = RouteConfigError::InvalidMetric(self.metric);
            return Err(ConfigError::Message(err.to_string()));
        }

        Ok(())
    }
}

/// Output configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct OutputConfig {
    /// The directory scripts are written to. It is created if missing.
    pub directory: PathBuf,
}

impl Settings {
    /// Initializing the config first with default values, then with the
    /// optional configuration file and finally with provided/overwritten
    /// environment variables. The explicit separator with double
    /// underscores is needed to correctly parse the nested config
    /// structure.
    ///
    /// The environment variables are prefixed with `ROUTE_GENERATOR_` and
    /// the nested fields are separated with double underscores. For
    /// example, the path `routes.metric` is parsed as following:
    ///
    /// ```text
    /// ROUTE_GENERATOR_ROUTES__METRIC
    /// ^^^^^^^^^^^^^^^ ^^^^^^  ^^^^^^
    ///        │       ^  │   ^^  │
    ///        │       │  │   │   └ The `metric` field of the `routes` object
    ///        │       │  │   └ separator("__")
    ///        │       │  └ The `routes` field of the root object (`Settings`)
    ///        │       └ prefix_separator("_")
    ///        └ with_prefix("ROUTE_GENERATOR")
    /// ```
    pub fn new(config_path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        Self::load(config_path, environment())
    }

    fn load(config_path: Option<impl AsRef<Path>>, env: Environment) -> Result<Self, ConfigError> {
        let mut cfg_builder = Config::builder();

        cfg_builder = cfg_builder.set_default("feed.url", DEFAULT_FEED_URL)?;
        cfg_builder = cfg_builder.set_default("feed.registry", "apnic")?;
        cfg_builder = cfg_builder.set_default("feed.timeout", 600)?;
        cfg_builder = cfg_builder.set_default("routes.region", Region::default().as_str())?;
        cfg_builder = cfg_builder.set_default("routes.platform", Platform::default().as_str())?;
        cfg_builder = cfg_builder.set_default("routes.metric", 5)?;
        cfg_builder = cfg_builder.set_default("output.directory", ".")?;

        if let Some(path) = config_path {
            cfg_builder = cfg_builder.add_source(File::from(path.as_ref()));
        }
        cfg_builder = cfg_builder.add_source(env);

        let cfg = cfg_builder.build()?;

        let settings: Settings = cfg.try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Perform validation on the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.feed.validate(self)?;
        self.routes.validate(self)?;

        Ok(())
    }
}

/// The environment source every configuration is layered with.
fn environment() -> Environment {
    Environment::with_prefix("ROUTE_GENERATOR")
        .separator("__")
        .try_parsing(true)
        .prefix_separator("_")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use test_case::test_case;

    use crate::testing::DEFAULT_CONFIG_PATH;

    use super::*;

    /// Load settings as if the process environment held exactly `vars`.
    fn settings_with_env(
        path: Option<&Path>,
        vars: &[(&str, &str)],
    ) -> Result<Settings, ConfigError> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<config::Map<String, String>>();
        Settings::load(path, environment().source(Some(vars)))
    }

    fn default_path() -> Option<&'static Path> {
        DEFAULT_CONFIG_PATH.map(Path::new)
    }

    // !! NOTE: This test needs to be updated if the default values in the
    // !! default.toml file are changed.
    #[test]
    fn default_config_toml_loads() {
        let settings = settings_with_env(default_path(), &[]).unwrap();

        assert_eq!(settings.feed.url.as_str(), DEFAULT_FEED_URL);
        assert_eq!(settings.feed.registry, "apnic");
        assert_eq!(settings.feed.timeout, Duration::from_secs(600));
        assert_eq!(settings.routes.region, Region::NotAsia);
        assert_eq!(settings.routes.platform, Platform::Openvpn);
        assert_eq!(settings.routes.metric, 5);
        assert_eq!(settings.output.directory, PathBuf::from("."));
    }

    #[test]
    fn built_in_defaults_match_default_toml() {
        let from_file = settings_with_env(default_path(), &[]).unwrap();
        let built_in = settings_with_env(None, &[]).unwrap();

        assert_eq!(from_file.feed.url, built_in.feed.url);
        assert_eq!(from_file.feed.registry, built_in.feed.registry);
        assert_eq!(from_file.feed.timeout, built_in.feed.timeout);
        assert_eq!(from_file.routes.region, built_in.routes.region);
        assert_eq!(from_file.routes.platform, built_in.routes.platform);
        assert_eq!(from_file.routes.metric, built_in.routes.metric);
        assert_eq!(from_file.output.directory, built_in.output.directory);
    }

    #[test]
    fn default_config_toml_loads_with_process_environment() {
        // Nothing in the test suite sets ROUTE_GENERATOR_ variables.
        let settings = Settings::new_from_default_config().unwrap();
        assert_eq!(settings.feed.registry, "apnic");
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = settings_with_env(
            default_path(),
            &[
                ("ROUTE_GENERATOR_FEED__URL", "https://example.com/delegated"),
                ("ROUTE_GENERATOR_FEED__TIMEOUT", "30"),
                ("ROUTE_GENERATOR_ROUTES__REGION", "china"),
                ("ROUTE_GENERATOR_ROUTES__PLATFORM", "routeos"),
                ("ROUTE_GENERATOR_ROUTES__METRIC", "20"),
                ("ROUTE_GENERATOR_OUTPUT__DIRECTORY", "/tmp/routes"),
            ],
        )
        .unwrap();

        assert_eq!(settings.feed.url.as_str(), "https://example.com/delegated");
        assert_eq!(settings.feed.timeout, Duration::from_secs(30));
        assert_eq!(settings.routes.region, Region::China);
        assert_eq!(settings.routes.platform, Platform::Routeos);
        assert_eq!(settings.routes.metric, 20);
        assert_eq!(settings.output.directory, PathBuf::from("/tmp/routes"));
    }

    #[test]
    fn config_file_overrides_defaults_and_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[routes]\nregion = \"asia\"\nplatform = \"mac\"\nmetric = 7"
        )
        .unwrap();

        let settings = settings_with_env(
            Some(file.path()),
            &[("ROUTE_GENERATOR_ROUTES__METRIC", "9")],
        )
        .unwrap();

        assert_eq!(settings.routes.region, Region::Asia);
        assert_eq!(settings.routes.platform, Platform::Mac);
        assert_eq!(settings.routes.metric, 9);
        assert_eq!(settings.feed.registry, "apnic");
    }

    #[test_case("ROUTE_GENERATOR_FEED__URL", "ftp://ftp.apnic.net/delegated", RouteConfigError::UnsupportedFeedScheme("ftp".into()); "ftp feed")]
    #[test_case("ROUTE_GENERATOR_FEED__REGISTRY", " ", RouteConfigError::EmptyRegistry; "blank registry")]
    #[test_case("ROUTE_GENERATOR_FEED__TIMEOUT", "0", RouteConfigError::ZeroDurationForbidden("feed.timeout"); "zero timeout")]
    #[test_case("ROUTE_GENERATOR_ROUTES__METRIC", "0", RouteConfigError::InvalidMetric(0); "zero metric")]
    #[test_case("ROUTE_GENERATOR_ROUTES__METRIC", "10000", RouteConfigError::InvalidMetric(10000); "metric too large")]
    fn invalid_values_return_correct_error(key: &str, value: &str, expected: RouteConfigError) {
        let err = settings_with_env(default_path(), &[(key, value)]).unwrap_err();
        assert!(
            matches!(&err, ConfigError::Message(msg) if msg == &expected.to_string()),
            "unexpected error: {err}"
        );
    }

    #[test_case("ROUTE_GENERATOR_ROUTES__REGION", "europe"; "unknown region")]
    #[test_case("ROUTE_GENERATOR_ROUTES__PLATFORM", "symbian"; "unknown platform")]
    #[test_case("ROUTE_GENERATOR_FEED__URL", "not a url"; "malformed url")]
    fn unparseable_values_are_rejected(key: &str, value: &str) {
        assert!(settings_with_env(default_path(), &[(key, value)]).is_err());
    }
}
