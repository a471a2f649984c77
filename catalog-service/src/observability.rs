//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// JSON lines in production, human-readable output otherwise. Calling this
/// twice is harmless: the second subscriber is not installed.
pub fn init_tracing(config: &Config) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));

    let installed = if config.is_production() {
        builder.json().try_init().is_ok()
    } else {
        builder.pretty().try_init().is_ok()
    };

    if installed {
        tracing::info!("Tracing initialized for service: {}", config.service.name);
    } else {
        tracing::debug!("Tracing subscriber already installed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        let config = Config::default();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&config).is_ok());
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let mut config = Config::default();
        config.service.log_level = "catalog=loud".to_string();
        let filter = env_filter(&config);
        assert_eq!(filter.to_string(), EnvFilter::new("info").to_string());
    }
}
