//! CLI Exit Code Registry
//!
//! Single source of truth for `nodewatch` exit codes. Cron jobs and
//! wrapper scripts rely on them.
//!
//! | Code | Meaning                                                     |
//! |------|-------------------------------------------------------------|
//! | 0    | Every configured source was reconciled                      |
//! | 1    | At least one source failed (transport or persistence)       |
//! | 2    | CLI usage error (bad args; emitted by clap)                 |
//! | 3    | Configuration failure; the run aborted before any fetch     |
//!
//! A source whose payload had no usable node list still counts as
//! reconciled (exit 0): its snapshot is rewritten empty and the
//! degradation is logged.
//!
//! Configuration failures are written to the log file as well (the
//! configured one, else the `--log-file` or default path). Only when no
//! log file can be opened are they printed to stderr alone.

/// Success - all sources reconciled.
pub const EXIT_SUCCESS: u8 = 0;

/// One or more sources failed; the others were still processed.
pub const EXIT_SOURCE_FAILED: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Configuration missing or invalid (config file, sources list, log file).
pub const EXIT_CONFIG: u8 = 3;
