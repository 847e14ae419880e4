//! Durability mode configuration
//!
//! Controls record log sync behavior (Cache, Standard, Always).

/// Durability mode for record log writes
///
/// Controls when the log is fsynced to disk.
///
/// # Modes
///
/// | Mode | fsync | Data Loss Window |
/// |------|-------|-----------------|
/// | Cache | Never | Everything (no files) |
/// | Always | Every commit | Zero |
/// | Standard | Periodic | Up to interval_ms of OS-buffered writes |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// In-memory only; nothing is written and everything is lost on exit
    ///
    /// Use case: tests, scratch indexes.
    Cache,

    /// fsync after every commit (slow, maximum durability)
    Always,

    /// Write through to the OS on every commit, fsync periodically
    ///
    /// A process crash loses nothing; an OS crash or power loss may lose up
    /// to `interval_ms` of commits.
    Standard {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
    },
}

impl DurabilityMode {
    /// Check if this mode writes a record log
    ///
    /// Returns false for Cache mode, true for all others.
    pub fn requires_log(&self) -> bool {
        !matches!(self, DurabilityMode::Cache)
    }

    /// Check if this mode requires immediate fsync on every commit
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Always)
    }

    /// Configuration name of the mode
    pub fn name(&self) -> &'static str {
        match self {
            DurabilityMode::Cache => "cache",
            DurabilityMode::Always => "always",
            DurabilityMode::Standard { .. } => "standard",
        }
    }

    /// Parse a configuration name
    ///
    /// Only `standard` and `always` are accepted. Cache mode is reachable
    /// programmatically, never from a configuration file.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(DurabilityMode::standard_default()),
            "always" => Some(DurabilityMode::Always),
            _ => None,
        }
    }

    /// Human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::Cache => "Cache (fastest, all data lost on exit)",
            DurabilityMode::Always => "Always sync (safest, slowest)",
            DurabilityMode::Standard { .. } => "Standard (balanced speed/safety)",
        }
    }

    /// Create a standard mode with the default 100ms interval
    pub fn standard_default() -> Self {
        DurabilityMode::Standard { interval_ms: 100 }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        DurabilityMode::standard_default()
    }
}

impl std::fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
