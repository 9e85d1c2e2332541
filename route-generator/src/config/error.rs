/// Configuration error variants.
#[derive(Debug, thiserror::Error)]
pub enum RouteConfigError {
    /// The feed must be fetched over HTTP or HTTPS.
    #[error("[feed.url] Invalid URL scheme: must be HTTP or HTTPS, got '{0}'")]
    UnsupportedFeedScheme(String),

    /// Records are matched on their registry column, which is never empty.
    #[error("[feed.registry] The registry name cannot be empty")]
    EmptyRegistry,

    /// An error returned for duration parameters that must be positive.
    #[error("Duration for {0} must be nonzero")]
    ZeroDurationForbidden(&'static str),

    /// Route metrics outside the range accepted by the client platforms.
    #[error("[routes.metric] The metric must be between 1 and 9999, got {0}")]
    InvalidMetric(u32),
}
