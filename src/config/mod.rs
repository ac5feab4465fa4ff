#[cfg(feature = "cli")]
pub mod cli;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use storage::LocalStorage;
pub use toml_config::TomlConfig;

/// Converts a signature lifetime in minutes; `None` when it does not fit a `Duration`.
/// Out-of-range values are still reported by `validate()`.
pub(crate) fn expiry_from_minutes(minutes: u64) -> Option<std::time::Duration> {
    match minutes.checked_mul(60) {
        Some(secs) => Some(std::time::Duration::from_secs(secs)),
        None => {
            tracing::warn!("Ignoring expiry of {} minutes: too large", minutes);
            None
        }
    }
}
