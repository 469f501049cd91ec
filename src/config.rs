use anyhow::{Context, Result};

/// Build-time debug switch. Never enable in production!
///
/// When on, the asset cache is bypassed and failures are reported as raw
/// 500 responses instead of the not-found page.
pub const DEBUG: bool = false;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Assets
    pub assets_dir: String,

    // Behaviour
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Server
            port: match std::env::var("PORT") {
                Ok(port) => port
                    .parse()
                    .with_context(|| format!("PORT is not a valid port: {}", port))?,
                Err(_) => 8787,
            },

            // Assets
            assets_dir: std::env::var("ASSETS_DIR").unwrap_or_else(|_| "public".to_string()),

            // Compiled in, not read from the environment
            debug: DEBUG,
        })
    }
}
