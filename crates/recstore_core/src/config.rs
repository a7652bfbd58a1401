//! Database configuration.

use crate::error::{CoreError, CoreResult};

/// Default namespace for backend keys.
pub const DEFAULT_KEY_PREFIX: &str = "recstore";

/// Configuration shared by every driver.
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace prepended to every backend key.
    ///
    /// Lets several databases share one key/value store.
    pub key_prefix: String,

    /// Largest page a listing call returns. Larger limits are clamped.
    pub max_page_size: usize,

    /// Largest batch a batch insert accepts.
    pub max_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            max_page_size: 10_000,
            max_batch_size: 100_000,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend key namespace.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the largest page size.
    #[must_use]
    pub const fn max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    /// Sets the largest batch size.
    #[must_use]
    pub const fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Checks that the configuration can serve requests.
    ///
    /// A page size of zero would end every listing before its first record,
    /// and a batch size of zero would refuse every batch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming the first unusable setting.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_page_size == 0 {
            return Err(CoreError::invalid_argument("max_page_size must be positive"));
        }
        if self.max_batch_size == 0 {
            return Err(CoreError::invalid_argument("max_batch_size must be positive"));
        }
        Ok(())
    }
}
