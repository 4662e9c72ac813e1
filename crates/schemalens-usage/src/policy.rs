//! Usage classification policy constants.
//!
//! Every weight, uptime gate, and classification threshold lives here so the
//! scoring model can be reviewed in one place. Weights are summed per object
//! across the signals that fired; the thresholds below cut the sum into
//! usage levels.

/// Seconds per day, for the uptime windows below.
const DAY_SECS: u64 = 86_400;

// ---------------------------------------------------------------------------
// Execution-telemetry signal
// ---------------------------------------------------------------------------

/// An object with recorded executions since engine start.
pub const WEIGHT_EXECUTED: f64 = 2.0;

/// A procedure or function with zero recorded executions, only emitted once
/// the engine has been up long enough for the absence to mean something.
pub const WEIGHT_NEVER_EXECUTED: f64 = -2.0;

/// Minimum uptime before "no executions" becomes evidence of disuse. Below
/// this the signal stays silent to avoid false "unused" verdicts right after
/// a restart.
pub const MIN_UPTIME_FOR_NEVER_EXECUTED_SECS: u64 = 7 * DAY_SECS;

// ---------------------------------------------------------------------------
// Persisted-query-telemetry signal
// ---------------------------------------------------------------------------

/// An object with executions recorded in the persisted query store (survives
/// restarts, so no uptime gate).
pub const WEIGHT_QUERY_STORE_EXECUTED: f64 = 2.0;

/// A table referenced by captured ad-hoc query text.
pub const WEIGHT_ADHOC_REFERENCE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Access-statistics signal
// ---------------------------------------------------------------------------

/// A table with nonzero read or write counters.
pub const WEIGHT_ACCESSED: f64 = 1.5;

/// A table with zero reads and zero writes over the long window.
pub const WEIGHT_NO_ACCESS: f64 = -1.5;

/// Minimum uptime before nonzero counters count as positive evidence.
pub const MIN_UPTIME_FOR_ACCESS_SECS: u64 = DAY_SECS;

/// Minimum uptime before all-zero counters count as negative evidence; the
/// longer window guards against quiet periods after a restart.
pub const MIN_UPTIME_FOR_NO_ACCESS_SECS: u64 = 14 * DAY_SECS;

// ---------------------------------------------------------------------------
// Row-count signal
// ---------------------------------------------------------------------------

/// An empty table: mild structural evidence of disuse.
pub const WEIGHT_EMPTY_TABLE: f64 = -0.5;

/// A populated table: mild structural evidence of use.
pub const WEIGHT_POPULATED_TABLE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Dependency-orphan signal
// ---------------------------------------------------------------------------

/// An object with zero incoming and zero outgoing structural edges.
pub const WEIGHT_ORPHAN: f64 = -1.0;

/// An object referenced through two or more distinct relationship kinds.
pub const WEIGHT_MULTI_RELATION: f64 = 1.0;

// ---------------------------------------------------------------------------
// Naming-pattern signal
// ---------------------------------------------------------------------------

/// A name matching a suspicious prefix or substring.
pub const WEIGHT_SUSPICIOUS_NAME: f64 = -1.0;

/// Prefixes that mark scratch or leftover objects.
pub const SUSPICIOUS_PREFIXES: &[&str] = &["tmp", "temp", "bak", "old_", "zz", "test_"];

/// Substrings that mark scratch or leftover objects.
pub const SUSPICIOUS_SUBSTRINGS: &[&str] = &["backup", "deprecated", "obsolete", "_copy", "archive"];

// ---------------------------------------------------------------------------
// Classification thresholds
// ---------------------------------------------------------------------------

/// Summed score at or above this is Active.
pub const ACTIVE_THRESHOLD: f64 = 2.0;

/// Summed score below this is Unused; between the thresholds is Low.
pub const UNUSED_THRESHOLD: f64 = -1.0;
