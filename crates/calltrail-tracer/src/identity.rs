//! Host and user identity of the calling process.

use calltrail_types::CallerIdentity;
use std::net::{IpAddr, ToSocketAddrs};
use tracing::debug;

/// Environment variables consulted for the process user, in order.
const USER_VARS: [&str; 3] = ["USER", "USERNAME", "LOGNAME"];

/// Supplies the identity stamped on audit records.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self) -> CallerIdentity;
}

/// Resolves identity from the operating system.
///
/// Host name and address are looked up once, when the resolver is built, so
/// the blocking resolver call never runs inside an audited call. The user is
/// read from the environment on every call.
#[derive(Debug, Clone)]
pub struct SystemIdentity {
    hostname: String,
    ip_address: Option<String>,
}

impl SystemIdentity {
    pub fn new() -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|e| {
                debug!(error = %e, "Host name unavailable");
                "localhost".to_string()
            });
        let ip_address = resolve_address(&hostname);

        Self {
            hostname,
            ip_address,
        }
    }
}

impl Default for SystemIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver for SystemIdentity {
    fn resolve(&self) -> CallerIdentity {
        CallerIdentity {
            hostname: self.hostname.clone(),
            ip_address: self.ip_address.clone(),
            user_login: user_login(),
        }
    }
}

/// First IPv4 address the host name resolves to, else the first address.
fn resolve_address(host: &str) -> Option<String> {
    let addresses: Vec<IpAddr> = match (host, 0).to_socket_addrs() {
        Ok(addrs) => addrs.map(|a| a.ip()).collect(),
        Err(e) => {
            debug!(host, error = %e, "Host address lookup failed");
            return None;
        }
    };

    addresses
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addresses.first())
        .map(IpAddr::to_string)
}

fn user_login() -> Option<String> {
    USER_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
}

/// Always reports the same identity.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub CallerIdentity);

impl IdentityResolver for StaticIdentity {
    fn resolve(&self) -> CallerIdentity {
        self.0.clone()
    }
}
