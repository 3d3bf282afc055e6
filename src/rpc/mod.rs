//! JSON-RPC command channel.
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────────────────────┐
//! │ UDP      │──▶│ request  │──▶│ listener (dispatch)          │
//! │ socket   │   │ (decode) │   │  level → LevelStore          │
//! └──────────┘   └──────────┘   │  other → CMD_CHANNEL → loop  │
//!                               └──────────────────────────────┘
//! ```

pub mod channels;
pub mod listener;
pub mod request;
