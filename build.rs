fn main() {
    // Build-time overrides baked in via `option_env!`.
    for var in ["POWERCTL_CONFIG_JSON", "POWERCTL_WIFI_SSID", "POWERCTL_WIFI_PASS"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
