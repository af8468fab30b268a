//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Input error - unreadable manifest or invalid machine network
pub const INPUT_ERROR: i32 = 2;

/// Translation error - the tenant cluster cannot be translated
pub const TRANSLATION_ERROR: i32 = 3;

/// Cluster error - API server unreachable, conflict, credentials missing
pub const CLUSTER_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Interrupted - the run was cancelled (128 + SIGINT)
pub const INTERRUPTED: i32 = 130;
