/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How often the quote expiry sweep runs, in seconds (default: `900`).
    pub expiry_sweep_interval_secs: u64,
    /// Template code used when a quote has no selection or the selected
    /// code is unknown (default: `ESTANDAR`).
    pub default_template_code: String,
    /// Base URL of the external HTML -> PDF renderer. When unset, offer
    /// emission skips PDF generation.
    pub renderer_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default      |
    /// |-----------------------------|--------------|
    /// | `HOST`                      | `0.0.0.0`    |
    /// | `PORT`                      | `3000`       |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`         |
    /// | `EXPIRY_SWEEP_INTERVAL_SECS`| `900`        |
    /// | `DEFAULT_TEMPLATE_CODE`     | `ESTANDAR`   |
    /// | `RENDERER_URL`              | unset        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let expiry_sweep_interval_secs: u64 = std::env::var("EXPIRY_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("EXPIRY_SWEEP_INTERVAL_SECS must be a valid u64");

        let default_template_code = std::env::var("DEFAULT_TEMPLATE_CODE")
            .unwrap_or_else(|_| "ESTANDAR".into());

        let renderer_url = std::env::var("RENDERER_URL").ok().filter(|s| !s.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            expiry_sweep_interval_secs,
            default_template_code,
            renderer_url,
        }
    }
}
