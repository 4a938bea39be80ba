use crate::core::errors::{Error, Result};
use std::fmt;
use std::net::IpAddr;

/*-------------------------------------------------------------------------------------------------
  Address Family
-------------------------------------------------------------------------------------------------*/

/// IP address family. Addresses and blocks of different families are never compared.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AddressFamily {
    IPv4,
    IPv6,
}

impl AddressFamily {
    pub fn is_ipv4(&self) -> bool {
        match self {
            AddressFamily::IPv4 => true,
            AddressFamily::IPv6 => false,
        }
    }

    pub fn is_ipv6(&self) -> bool {
        match self {
            AddressFamily::IPv4 => false,
            AddressFamily::IPv6 => true,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::IPv4 => f.write_str("IPv4"),
            AddressFamily::IPv6 => f.write_str("IPv6"),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Classified Address
-------------------------------------------------------------------------------------------------*/

/// A validated IP address literal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Address(IpAddr);

impl Address {
    pub fn family(&self) -> AddressFamily {
        match self.0 {
            IpAddr::V4(_) => AddressFamily::IPv4,
            IpAddr::V6(_) => AddressFamily::IPv6,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }

    /// Canonical text form (e.g. `2001:db8::1` for `2001:0db8:0:0::1`).
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        Address(ip)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Classify `input` as an IPv4 or IPv6 address literal.
///
/// Only bare dotted-decimal IPv4 and colon-hex IPv6 literals are accepted. Hostnames, CIDR
/// notation, surrounding whitespace, and empty input are rejected with
/// [Error::InvalidAddress].
pub fn classify(input: &str) -> Result<Address> {
    input
        .parse::<IpAddr>()
        .map(Address)
        .map_err(|_| Error::InvalidAddress(input.to_string()))
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
