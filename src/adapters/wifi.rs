//! WiFi station-mode adapter.
//!
//! Brings the network up so the JSON-RPC listener can receive datagrams.
//! Credentials are baked in at build time (`POWERCTL_WIFI_SSID`,
//! `POWERCTL_WIFI_PASS`); a build without an SSID runs offline and only
//! the initial level applies.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: credential validation only.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(creds)
    }

    /// Credentials compiled into the image, if an SSID was supplied.
    pub fn from_build_env() -> Result<Self, ConnectivityError> {
        let ssid = option_env!("POWERCTL_WIFI_SSID").ok_or(ConnectivityError::NoCredentials)?;
        Self::new(ssid, option_env!("POWERCTL_WIFI_PASS").unwrap_or(""))
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::WifiAdapter;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::modem::Modem;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{ConnectivityError, WifiCredentials};

    pub struct WifiAdapter {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl WifiAdapter {
        /// Start the STA interface and block until it has an address.
        pub fn connect(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: Option<EspDefaultNvsPartition>,
            creds: &WifiCredentials,
        ) -> Result<Self, ConnectivityError> {
            let fail = |e: esp_idf_svc::sys::EspError| {
                warn!("WiFi: {}", e);
                ConnectivityError::ConnectionFailed
            };

            let driver = EspWifi::new(modem, sysloop.clone(), nvs).map_err(fail)?;
            let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(fail)?;

            let auth_method = if creds.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            wifi.set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: creds.ssid.clone(),
                password: creds.password.clone(),
                auth_method,
                ..Default::default()
            }))
            .map_err(fail)?;

            info!("WiFi: connecting to '{}'", creds.ssid());
            wifi.start().map_err(fail)?;
            wifi.connect().map_err(fail)?;
            wifi.wait_netif_up().map_err(fail)?;

            if let Ok(ip) = wifi.wifi().sta_netif().get_ip_info() {
                info!("WiFi: connected, ip={}", ip.ip);
            }
            Ok(Self { wifi })
        }

        pub fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }

        /// Reconnect after a dropped link.  Cheap when already connected.
        pub fn poll(&mut self) {
            if self.is_connected() {
                return;
            }
            warn!("WiFi: link lost, reconnecting");
            if let Err(e) = self.wifi.connect().and_then(|()| self.wifi.wait_netif_up()) {
                warn!("WiFi: reconnect failed ({})", e);
            }
        }
    }
}
