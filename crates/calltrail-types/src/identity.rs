//! Identity of the host and user issuing a traced call.

use serde::{Deserialize, Serialize};

/// Host and operating-system user a call ran under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Local host name.
    pub hostname: String,
    /// Address the host name resolves to, if resolution succeeded.
    pub ip_address: Option<String>,
    /// Login of the process user, if known.
    pub user_login: Option<String>,
}

impl CallerIdentity {
    /// Create an identity for a host.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip_address: None,
            user_login: None,
        }
    }

    /// Set the resolved address.
    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Set the user login.
    pub fn with_user_login(mut self, user: impl Into<String>) -> Self {
        self.user_login = Some(user.into());
        self
    }
}
