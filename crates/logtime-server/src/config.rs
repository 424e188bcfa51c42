use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Server settings, read from `LOGTIME_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Every log must name an existing user.
    pub require_user: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = get("LOGTIME_DB_PATH").unwrap_or_else(|| "logtime.db".into());
        let host = get("LOGTIME_HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = get("LOGTIME_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("LOGTIME_PORT must be a port number")?;
        let require_user = match get("LOGTIME_REQUIRE_USER") {
            Some(v) => parse_flag(&v).context("LOGTIME_REQUIRE_USER")?,
            None => false,
        };

        Ok(Self {
            db_path: db_path.into(),
            host,
            port,
            require_user,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}
