//! Process exit codes. Part of the public contract for schedulers and CI.

pub const SUCCESS: i32 = 0;
pub const COMPLETION_FAILED: i32 = 1; // At least one run could not be completed
pub const CONFIG_ERROR: i32 = 2; // Missing credentials, bad settings or unreadable input
