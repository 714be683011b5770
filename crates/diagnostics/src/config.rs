use crate::error::{Result, StoreError};
use std::time::Duration;

/// Tunables for the issue store.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Coalescing window between buffering an issue and publishing it.
    /// Multiple issues arriving inside the window collapse into one publish.
    pub flush_debounce: Duration,
    /// Optional ceiling on a run's duration; an expired run finalizes as
    /// errored. `None` leaves run duration unbounded.
    pub run_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            flush_debounce: Duration::from_millis(75),
            run_timeout: None,
        }
    }
}

impl StoreConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.flush_debounce.is_zero() {
            return Err(StoreError::InvalidConfig(
                "flush_debounce must be non-zero".to_string(),
            ));
        }
        if let Some(timeout) = self.run_timeout {
            if timeout <= self.flush_debounce {
                return Err(StoreError::InvalidConfig(format!(
                    "run_timeout ({timeout:?}) must exceed flush_debounce ({:?})",
                    self.flush_debounce
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.flush_debounce, Duration::from_millis(75));
        assert!(config.run_timeout.is_none());
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let config = StoreConfig {
            flush_debounce: Duration::ZERO,
            run_timeout: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_must_exceed_debounce() {
        let config = StoreConfig {
            flush_debounce: Duration::from_millis(75),
            run_timeout: Some(Duration::from_millis(50)),
        };
        assert!(config.validate().is_err());

        let config = StoreConfig {
            flush_debounce: Duration::from_millis(75),
            run_timeout: Some(Duration::from_secs(30)),
        };
        assert!(config.validate().is_ok());
    }
}
