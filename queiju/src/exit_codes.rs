//! Stable exit codes for the `queiju` binary.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid configuration, path, command, or any other wrapper error.
pub const INVALID: i32 = 1;
/// The QE binary exited with a non-zero status under the strict exit policy.
pub const CHILD_FAILED: i32 = 2;
/// The QE binary was killed after exceeding the configured timeout.
pub const TIMEOUT: i32 = 3;
