//! Network origin of an incoming query

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Where a query came from, used to infer the caller's city
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    /// Caller address, if known
    pub ip: Option<IpAddr>,
}

impl RequestOrigin {
    /// Origin for a caller at the given address
    #[must_use]
    pub fn from_ip(ip: IpAddr) -> Self {
        Self { ip: Some(ip) }
    }

    /// Origin of the local machine (interactive and one-shot modes)
    #[must_use]
    pub fn local() -> Self {
        Self::default()
    }

    /// Publicly routable caller address, if any.
    ///
    /// Loopback, private and link-local addresses cannot be geolocated and
    /// yield `None`.
    #[must_use]
    pub fn public_ip(&self) -> Option<IpAddr> {
        self.ip.filter(|ip| match ip {
            IpAddr::V4(v4) => {
                !(v4.is_loopback()
                    || v4.is_private()
                    || v4.is_link_local()
                    || v4.is_unspecified()
                    || v4.is_broadcast())
            }
            IpAddr::V6(v6) => {
                let segments = v6.segments();
                let unique_local = (segments[0] & 0xfe00) == 0xfc00;
                let link_local = (segments[0] & 0xffc0) == 0xfe80;
                !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
            }
        })
    }
}
