//! Pure decision logic for the supervision loop.
//!
//! Nothing in this module performs I/O; every function is deterministic
//! over its inputs so stop conditions can be tested in isolation from
//! process invocation.

pub mod completion;
pub mod stop_gate;
