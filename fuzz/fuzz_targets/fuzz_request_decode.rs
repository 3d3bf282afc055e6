//! Fuzz target: `rpc::request::decode`
//!
//! Drives arbitrary datagrams into the JSON-RPC decoder and asserts that
//! it never panics and that any accepted setpoint lands in range once
//! stored.
//!
//! cargo fuzz run fuzz_request_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use powerctl::app::commands::AppCommand;
use powerctl::level::{LevelStore, PowerLevel};
use powerctl::rpc::request;

fuzz_target!(|data: &[u8]| {
    if let Ok(AppCommand::SetPowerLevel(percent)) = request::decode(data) {
        assert!(!percent.is_nan(), "decoder must reject NaN levels");
        let store = LevelStore::default();
        let level = store.set_percent(percent);
        assert!(level.is_some_and(|l| l.percent() <= PowerLevel::MAX));
    }
});
