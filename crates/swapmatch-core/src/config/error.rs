use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading or validating [`super::Config`].
pub enum ConfigError {
    /// Port was parseable but out of range (0).
    #[error("invalid port number: {value}")]
    InvalidPort {
        /// Raw environment value.
        value: String,
    },

    /// Port could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        /// Raw environment value.
        value: String,
        /// Parse error.
        source: std::num::ParseIntError,
    },

    /// Bind address could not be parsed.
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        /// Raw environment value.
        value: String,
        /// Parse error.
        source: std::net::AddrParseError,
    },

    /// A numeric variable could not be parsed.
    #[error("failed to parse {var}='{value}' as a number")]
    InvalidNumber {
        /// Environment variable name.
        var: &'static str,
        /// Raw environment value.
        value: String,
    },

    /// A numeric variable was below its minimum.
    #[error("{var} must be at least {min}")]
    ValueTooSmall {
        /// Environment variable name.
        var: &'static str,
        /// Minimum accepted value.
        min: u64,
    },

    /// The candidate pool cannot be narrower than the final result width.
    #[error("candidate pool ({pool}) must be at least the final result width ({width})")]
    PoolTooNarrow {
        /// Configured candidate pool.
        pool: usize,
        /// Configured max substitutes.
        width: usize,
    },
}
