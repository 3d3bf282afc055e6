//! Listener → control-loop command channel.
//!
//! Uses an `embassy-sync` bounded channel so the UDP listener thread and
//! the synchronous control loop share a static queue without extra heap
//! allocation.  Level setpoints bypass it and go straight to the
//! [`LevelStore`](crate::level::LevelStore).
//!
//! ```text
//! ┌──────────────┐  AppCommand  ┌──────────────┐
//! │ UDP listener │─────────────▶│ Control Loop │
//! │  (thread)    │              │  (sync)      │
//! └──────────────┘              └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};

use crate::app::commands::AppCommand;

/// Channel depth for inbound commands.
pub const CMD_DEPTH: usize = 8;

pub type CommandChannel = Channel<CriticalSectionRawMutex, AppCommand, CMD_DEPTH>;
pub type CommandSender = Sender<'static, CriticalSectionRawMutex, AppCommand, CMD_DEPTH>;

/// Inbound command channel: listener → control loop.
pub static CMD_CHANNEL: CommandChannel = Channel::new();
