use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse};

/// Retry policy for establishing database connections at startup
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds
    pub max_delay_ms: u64,

    /// Growth factor applied after every failed attempt
    pub backoff_multiplier: f64,

    /// Randomize each delay to between 50% and 100% of its nominal value
    pub use_jitter: bool,
}

impl RetryConfig {
    /// Defaults: 3 retries, 100ms initial delay, 5s cap, doubling, jitter on.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    pub fn with_max_delay(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Nominal (un-jittered) delays, one per retry.
    pub fn delays(&self) -> Backoff {
        Backoff {
            next_ms: self.initial_delay_ms,
            max_ms: self.max_delay_ms,
            multiplier: self.backoff_multiplier,
            remaining: self.max_retries,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

/// Load the startup retry policy from environment variables
///
/// - `DB_CONNECT_RETRIES` (optional, default: 3)
/// - `DB_RETRY_INITIAL_DELAY_MS` (optional, default: 100)
/// - `DB_RETRY_MAX_DELAY_MS` (optional, default: 5000)
#[cfg(feature = "config")]
impl FromEnv for RetryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_retries: env_parse("DB_CONNECT_RETRIES", defaults.max_retries)?,
            initial_delay_ms: env_parse("DB_RETRY_INITIAL_DELAY_MS", defaults.initial_delay_ms)?,
            max_delay_ms: env_parse("DB_RETRY_MAX_DELAY_MS", defaults.max_delay_ms)?,
            ..defaults
        })
    }
}

/// Iterator over exponential backoff delays in milliseconds
#[derive(Debug, Clone)]
pub struct Backoff {
    next_ms: u64,
    max_ms: u64,
    multiplier: f64,
    remaining: u32,
}

impl Iterator for Backoff {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let current = self.next_ms.min(self.max_ms);
        self.next_ms = ((self.next_ms as f64 * self.multiplier) as u64).min(self.max_ms);
        Some(current)
    }
}

/// Retry an async operation with exponential backoff
///
/// ```ignore
/// use database::common::{RetryConfig, retry_with_backoff};
///
/// let db = retry_with_backoff(
///     || database::postgres::connect_with_options(options.clone()),
///     RetryConfig::new().with_max_retries(5),
/// )
/// .await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delays = config.delays();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let Some(nominal) = delays.next() else {
            warn!(attempts = attempt, error = %err, "Giving up after retries");
            return Err(err);
        };

        let delay = if config.use_jitter {
            apply_jitter(nominal)
        } else {
            nominal
        };

        debug!(
            attempt,
            max_retries = config.max_retries,
            delay_ms = delay,
            error = %err,
            "Operation failed, retrying"
        );
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

/// Scale a delay to between 50% and 100% of its value
fn apply_jitter(delay: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let random_factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    (delay as f64 * random_factor) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig::new()
            .with_max_retries(5)
            .with_initial_delay(100)
            .with_max_delay(500);

        let delays: Vec<u64> = config.delays().collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn test_backoff_without_retries_is_empty() {
        let config = RetryConfig::new().with_max_retries(0);
        assert_eq!(config.delays().count(), 0);
    }

    #[test]
    fn test_apply_jitter_stays_in_range() {
        for _ in 0..10 {
            let jittered = apply_jitter(1000);
            assert!((500..=1000).contains(&jittered));
        }
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("connected")
                }
            },
            RetryConfig::default(),
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();
        let config = RetryConfig::new().with_initial_delay(5).without_jitter();

        let result = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(format!("connection refused ({})", n + 1))
                    } else {
                        Ok("connected")
                    }
                }
            },
            config,
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_with_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();
        let config = RetryConfig::new()
            .with_max_retries(2)
            .with_initial_delay(5)
            .without_jitter();

        let result = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("connection refused")
                }
            },
            config,
        )
        .await;

        assert_eq!(result.unwrap_err(), "connection refused");
        // 1 initial + 2 retries
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_retry_config_from_env() {
        temp_env::with_vars(
            [
                ("DB_CONNECT_RETRIES", Some("7")),
                ("DB_RETRY_INITIAL_DELAY_MS", Some("250")),
                ("DB_RETRY_MAX_DELAY_MS", None),
            ],
            || {
                let config = RetryConfig::from_env().unwrap();
                assert_eq!(config.max_retries, 7);
                assert_eq!(config.initial_delay_ms, 250);
                assert_eq!(config.max_delay_ms, 5000);
                assert!(config.use_jitter);
            },
        );
    }
}
