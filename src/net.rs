// Connectivity detection.
// A reachability probe against the backend stands in for the browser's online flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::error::{AppError, Result};

/// Answers whether the backend is currently reachable.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Probes the backend by opening a TCP connection to its host and port.
#[derive(Debug, Clone)]
pub struct ServerProbe {
    addr: String,
    timeout: Duration,
}

impl ServerProbe {
    /// Build a probe for the host and port of `server_url`.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            addr: host_port(server_url)?,
            timeout,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Connectivity for ServerProbe {
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                log::debug!("Probe to {} failed: {}", self.addr, e);
                false
            }
            Err(_) => {
                log::debug!("Probe to {} timed out", self.addr);
                false
            }
        }
    }
}

/// A manually controlled online flag.
#[derive(Debug, Clone, Default)]
pub struct OnlineFlag(Arc<AtomicBool>);

impl OnlineFlag {
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub fn set(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for OnlineFlag {
    async fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Extract `host:port` from an http(s) URL, using the scheme's default port.
fn host_port(url: &str) -> Result<String> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| AppError::Other(format!("not an absolute URL: {}", url)))?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit('@').next().unwrap_or_default();
    if authority.is_empty() {
        return Err(AppError::Other(format!("URL has no host: {}", url)));
    }

    let has_port = match authority.rfind(':') {
        Some(i) => !authority[i..].contains(']'),
        None => false,
    };
    if has_port {
        return Ok(authority.to_string());
    }

    let port = match scheme {
        "http" => 80,
        "https" => 443,
        other => return Err(AppError::Other(format!("unsupported scheme: {}", other))),
    };
    Ok(format!("{}:{}", authority, port))
}
