//! Harness configuration

use std::time::Duration;

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// One line per case instead of progress markers
    pub verbose: bool,
    /// Stop executing after the first failed case
    pub stop_on_fail: bool,
    /// Only run cases whose full name contains this keyword
    pub filter: Option<String>,
    /// Fail async cases that do not settle within this duration
    pub async_timeout: Option<Duration>,
    /// Emit ANSI colors in console output
    pub color: bool,
    /// Report format
    pub format: OutputFormat,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            stop_on_fail: false,
            filter: None,
            async_timeout: None,
            color: true,
            format: OutputFormat::Console,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_stop_on_fail(mut self, stop: bool) -> Self {
        self.stop_on_fail = stop;
        self
    }

    /// Set the keyword filter. An empty keyword clears it.
    pub fn with_filter(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.filter = if keyword.is_empty() { None } else { Some(keyword) };
        self
    }

    pub fn with_async_timeout(mut self, limit: Duration) -> Self {
        self.async_timeout = Some(limit);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Whether a case with this full name passes the keyword filter
    pub fn selects(&self, full_name: &str) -> bool {
        self.filter.as_deref().is_none_or(|keyword| full_name.contains(keyword))
    }
}
