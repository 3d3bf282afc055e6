//! GPIO assignments for the power controller board.
//!
//! Single source of truth; drivers reference this module rather than
//! hard-coding pin numbers.

/// Digital output driving the SSR input (active HIGH = load on).
pub const SSR_GPIO: i32 = 2;
