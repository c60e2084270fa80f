use super::Vars;
use crate::core::Result;

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub(crate) fn from_vars(vars: &Vars<'_>) -> Result<Self> {
        Ok(Self {
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.parse_or("PORT", 8080)?,
            workers: vars.parse_or("SERVER_WORKERS", default_workers())?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
