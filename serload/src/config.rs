//! Runtime configuration and the compile-time capacities

use crate::error::Error;
use crate::session::{parse_name, Name};

/// Bytes held by one intake line buffer
pub const LINE_SIZE: usize = 16;

/// Slots in the transfer queue (one slot is kept free by the queue)
pub const QUEUE_DEPTH: usize = 16;

/// Slots in the buffer pool free-list
pub const POOL_DEPTH: usize = 8;

/// Longest line the editor holds
pub const MAX_LINE: usize = 128;

/// Longest file name accepted by the shell and the storage
pub const MAX_NAME_LEN: usize = 16;

/// Size of one storage region
pub const MAX_CODE_LEN: usize = 4096;

/// Default shell prompt
pub const DEFAULT_PROMPT: &str = "\x1b[33macm> \x1b[39m";

const DEFAULT_FILENAME: &str = "test.js";

#[derive(Debug, Clone)]
pub struct Config {
    /// Buffers allowed in circulation before released ones are freed
    pub recycle_cap: usize,
    /// Bytes that must be buffered for an end-of-burst flush
    pub flush_threshold: usize,
    /// Timer ticks without data before a partial buffer is dropped, 0 disables
    pub idle_timeout: u32,
    /// Echo every byte seen by the record decoder
    pub echo: bool,
    /// Added to every record address before it hits storage
    pub base_address: u32,
    pub filename: Name,
    pub prompt: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recycle_cap: 2,
            flush_threshold: 1,
            idle_timeout: 0,
            echo: false,
            base_address: 0,
            filename: Name::try_from(DEFAULT_FILENAME).unwrap_or_default(),
            prompt: DEFAULT_PROMPT,
        }
    }
}

/// Builder for [`Config`].
///
/// # Example
/// ```
/// use serload::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .with_recycle_cap(4)
///     .with_echo(true)
///     .with_filename("boot.js")
///     .unwrap()
///     .build();
///
/// assert_eq!(config.filename.as_str(), "boot.js");
/// ```
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Pool entries kept for reuse, capped by the free-list depth
    pub fn with_recycle_cap(mut self, cap: usize) -> Self {
        self.config.recycle_cap = cap.min(POOL_DEPTH - 1);
        self
    }

    pub fn with_flush_threshold(mut self, bytes: usize) -> Self {
        self.config.flush_threshold = bytes.clamp(1, LINE_SIZE);
        self
    }

    pub fn with_idle_timeout(mut self, ticks: u32) -> Self {
        self.config.idle_timeout = ticks;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.config.echo = echo;
        self
    }

    pub fn with_base_address(mut self, base: u32) -> Self {
        self.config.base_address = base;
        self
    }

    /// Target file name used when commands are given none
    pub fn with_filename(mut self, name: &str) -> Result<Self, Error> {
        self.config.filename = parse_name(name)?;
        Ok(self)
    }

    pub fn with_prompt(mut self, prompt: &'static str) -> Self {
        self.config.prompt = prompt;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.recycle_cap, 2);
        assert_eq!(config.filename.as_str(), "test.js");
        assert_eq!(config.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn builder_clamps() {
        let config = ConfigBuilder::new()
            .with_recycle_cap(100)
            .with_flush_threshold(0)
            .build();

        assert_eq!(config.recycle_cap, POOL_DEPTH - 1);
        assert_eq!(config.flush_threshold, 1);
    }

    #[test]
    fn builder_rejects_long_names() {
        assert!(matches!(
            ConfigBuilder::new().with_filename("a-very-long-file-name.js"),
            Err(Error::NameTooLong)
        ));
    }
}
