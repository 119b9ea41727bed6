//! Server configuration loaded from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    /// Load server config from TANDEM_HOST / TANDEM_PORT, falling back to
    /// 0.0.0.0:7270 when unset or unparsable.
    pub fn from_env() -> Self {
        let host = match std::env::var("TANDEM_HOST") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("TANDEM_HOST '{}' is not a valid IP address, using 0.0.0.0", raw);
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            }),
            Err(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match std::env::var("TANDEM_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("TANDEM_PORT '{}' is not a valid port, using 7270", raw);
                7270
            }),
            Err(_) => 7270,
        };
        Self { host, port }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
