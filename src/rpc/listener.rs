//! UDP command listener.
//!
//! Blocks on a socket bound to `0.0.0.0:<port>` and dispatches each
//! decoded request:
//!
//! - `set_power_level` → written straight into the shared [`LevelStore`]
//! - everything else   → queued on the command channel for the control loop
//!
//! Bad datagrams are logged and dropped; the listener never exits on a
//! request error.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;

use log::{info, warn};

use crate::app::commands::AppCommand;
use crate::error::{InitError, Result};
use crate::level::{LevelStore, PowerLevel};

use super::channels::CommandSender;
use super::request::{self, RequestError, MAX_DATAGRAM};

/// What happened to one datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Level written to the store (after clamping).
    LevelStored(PowerLevel),
    /// Controller has shut down; the store refused the level.
    LevelRefused,
    /// Command queued for the control loop.
    Queued,
    /// Channel full; command dropped.
    QueueFull,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStats {
    pub received: u32,
    pub rejected: u32,
    pub dropped: u32,
}

/// Request decoding and dispatch, independent of the socket.
pub struct CommandDispatcher {
    store: Arc<LevelStore>,
    commands: CommandSender,
    stats: ListenerStats,
}

impl CommandDispatcher {
    pub fn new(store: Arc<LevelStore>, commands: CommandSender) -> Self {
        Self {
            store,
            commands,
            stats: ListenerStats::default(),
        }
    }

    pub fn dispatch(&mut self, datagram: &[u8]) -> core::result::Result<Dispatch, RequestError> {
        self.stats.received = self.stats.received.wrapping_add(1);
        let cmd = request::decode(datagram).inspect_err(|_| {
            self.stats.rejected = self.stats.rejected.wrapping_add(1);
        })?;

        Ok(match cmd {
            AppCommand::SetPowerLevel(percent) => match self.store.set_percent(percent) {
                Some(level) => {
                    info!("RPC: power level {} (requested {:.1})", level, percent);
                    Dispatch::LevelStored(level)
                }
                None => {
                    warn!("RPC: power level {:.1} ignored after shutdown", percent);
                    Dispatch::LevelRefused
                }
            },
            other => match self.commands.try_send(other) {
                Ok(()) => Dispatch::Queued,
                Err(_) => {
                    self.stats.dropped = self.stats.dropped.wrapping_add(1);
                    warn!("RPC: command channel full, dropping command");
                    Dispatch::QueueFull
                }
            },
        })
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats
    }
}

pub struct CommandListener {
    socket: UdpSocket,
    dispatcher: CommandDispatcher,
}

impl CommandListener {
    /// Bind the command socket on all interfaces.
    pub fn bind(port: u16, dispatcher: CommandDispatcher) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).map_err(|e| {
            warn!("RPC: bind to port {} failed ({})", port, e);
            InitError::SocketBindFailed
        })?;
        info!("RPC: listening on UDP port {}", port);
        Ok(Self { socket, dispatcher })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    /// Receive and dispatch one datagram.  Returns `None` on a socket error.
    pub fn serve_one(&mut self) -> Option<core::result::Result<Dispatch, RequestError>> {
        // One spare byte so an oversized datagram is detectable.
        let mut buf = [0u8; MAX_DATAGRAM + 1];
        match self.socket.recv_from(&mut buf) {
            Ok((len, peer)) => {
                let result = self.dispatcher.dispatch(&buf[..len]);
                if let Err(e) = &result {
                    warn!("RPC: request from {} rejected: {}", peer, e);
                }
                Some(result)
            }
            Err(e) => {
                warn!("RPC: recv failed ({})", e);
                None
            }
        }
    }

    /// Serve forever.
    pub fn run(mut self) {
        loop {
            self.serve_one();
        }
    }

    pub fn stats(&self) -> ListenerStats {
        self.dispatcher.stats()
    }
}
