//! HTTP setpoint form.
//!
//! A browser-friendly alternative to the JSON-RPC datagrams:
//!
//! ```text
//! GET /                     → form showing the current level
//! GET /?power_level=42.2    → store 42 %, then the form
//! GET /favicon.ico          → 404
//! ```
//!
//! Query handling is plain string work and runs on the host; only the
//! server binding is ESP-IDF specific.  Like the UDP listener, the handler
//! writes the [`LevelStore`] directly from the httpd task.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::server::EspHttpServer`.
//! - **all other targets**: parsing and rendering only.

use core::fmt::Write as _;
use std::sync::Arc;

use log::{info, warn};

use crate::level::{LevelStore, PowerLevel};

/// Query parameter carrying the setpoint.
pub const LEVEL_PARAM: &str = "power_level";

/// Pairs kept per query; the rest are ignored.
pub const MAX_PARAMS: usize = 8;

const DEVICE_NAME: &str = "PowerCtl";

// ───────────────────────────────────────────────────────────────
// Query string
// ───────────────────────────────────────────────────────────────

/// Decoded `key=value` pairs of one request target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: heapless::Vec<(String, String), MAX_PARAMS>,
}

impl QueryParams {
    /// First value for `key`.  A key given without `=` has an empty value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Only the escapes a form submission of a number can produce.
fn unescape(raw: &str) -> String {
    raw.replace('+', " ")
        .replace("%3F", "?")
        .replace("%3f", "?")
        .replace("%21", "!")
}

/// Parse a request target such as `/?power_level=42.2`.
///
/// `/` alone yields no parameters.  Any other path that does not start
/// with a query is a file request and yields `None`.
pub fn parse_target(target: &str) -> Option<QueryParams> {
    let rest = target.strip_prefix('/')?;
    let mut params = QueryParams::default();
    if rest.is_empty() {
        return Some(params);
    }

    let decoded = unescape(rest);
    let query = decoded.strip_prefix('?')?;
    for element in query.split('&').filter(|e| !e.is_empty()) {
        let mut parts = element.split('=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        if params.pairs.push((key.to_owned(), value.to_owned())).is_err() {
            warn!("HTTP: more than {} query parameters, ignoring the rest", MAX_PARAMS);
            break;
        }
    }
    Some(params)
}

// ───────────────────────────────────────────────────────────────
// Form handling
// ───────────────────────────────────────────────────────────────

/// What one request did to the level store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    /// Plain page view; nothing written.
    Viewed,
    /// Level written (after clamping).
    Stored(PowerLevel),
    /// `power_level` present but not a number.
    Invalid,
    /// Controller has shut down; the store refused the level.
    Refused,
    /// Not a form request.
    NotFound,
}

pub struct SetpointForm {
    store: Arc<LevelStore>,
}

impl SetpointForm {
    pub fn new(store: Arc<LevelStore>) -> Self {
        Self { store }
    }

    /// Apply the query of `target` to the store.
    pub fn handle(&self, target: &str) -> FormOutcome {
        let Some(params) = parse_target(target) else {
            return FormOutcome::NotFound;
        };
        let Some(raw) = params.get(LEVEL_PARAM) else {
            return FormOutcome::Viewed;
        };

        let percent = match raw.trim().parse::<f32>() {
            Ok(p) if !p.is_nan() => p,
            _ => {
                warn!("HTTP: power_level '{}' is not numeric", raw);
                return FormOutcome::Invalid;
            }
        };
        match self.store.set_percent(percent) {
            Some(level) => {
                info!("HTTP: power level {} (requested {:.1})", level, percent);
                FormOutcome::Stored(level)
            }
            None => {
                warn!("HTTP: power level {:.1} ignored after shutdown", percent);
                FormOutcome::Refused
            }
        }
    }

    /// HTML form pre-filled with the current level.
    pub fn render(&self) -> String {
        render_page(self.store.level())
    }
}

pub fn render_page(level: PowerLevel) -> String {
    let mut page = String::with_capacity(640);
    let _ = write!(
        page,
        concat!(
            "<html>\n<head>\n<title>{name} Web Server</title>\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
            "<style>\n",
            "html {{font-family: Helvetica; display: inline-block; margin: 0px auto; text-align: center;}}\n",
            "h1 {{color: #0F3376; padding: 2vh;}}\n",
            "p {{font-size: 1.5rem;}}\n",
            "</style>\n</head>\n<body>\n<h1>{name} Web Server</h1>\n",
            "<form>\n<p>\nPower Level<input name=\"{param}\" type=\"text\" value=\"{value:.1}\"/>\n</p>\n",
            "<p>\n<input type=\"submit\" value=\"Update\" />\n</p>\n</form>\n</body></html>\n",
        ),
        name = DEVICE_NAME,
        param = LEVEL_PARAM,
        value = f32::from(level.percent()),
    );
    page
}

// ───────────────────────────────────────────────────────────────
// HTTP server (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::WebServer;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::http::Method;
    use esp_idf_svc::io::{EspIOError, Write};
    use log::{info, warn};

    use super::{FormOutcome, SetpointForm};
    use crate::error::InitError;

    /// Running httpd instance; dropping it stops the server.
    pub struct WebServer {
        _server: EspHttpServer<'static>,
    }

    impl WebServer {
        pub fn start(port: u16, form: SetpointForm) -> Result<Self, InitError> {
            let fail = |e: esp_idf_svc::sys::EspError| {
                warn!("HTTP: {}", e);
                InitError::HttpServerFailed(e.code())
            };

            let mut server = EspHttpServer::new(&Configuration {
                http_port: port,
                uri_match_wildcard: true,
                ..Default::default()
            })
            .map_err(fail)?;

            server
                .fn_handler::<EspIOError, _>("/*", Method::Get, move |req| {
                    if form.handle(req.uri()) == FormOutcome::NotFound {
                        req.into_status_response(404)?.write_all(b"Not found")?;
                        return Ok(());
                    }
                    let page = form.render();
                    req.into_response(200, None, &[("Content-Type", "text/html")])?
                        .write_all(page.as_bytes())?;
                    Ok(())
                })
                .map_err(fail)?;

            info!("HTTP: setpoint form on TCP port {}", port);
            Ok(Self { _server: server })
        }
    }
}
