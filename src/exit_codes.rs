//! Stable exit codes for the supervisor binary.

/// Completion marker observed, or the targeted story passed.
pub const OK: i32 = 0;
/// Targeted story failed, iteration budget exhausted, or invalid arguments.
pub const FAILURE: i32 = 1;
