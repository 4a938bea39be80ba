use std::collections::BTreeSet;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  Utilities
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Work with Shared String Slices
--------------------------------------------------------------------------------------*/

/// Return the shared copy of `value` from `set`, inserting it first when missing.
pub fn intern_arc_str(value: &str, set: &mut BTreeSet<Arc<str>>) -> Arc<str> {
    match set.get(value) {
        Some(item) => Arc::clone(item),
        None => {
            let item: Arc<str> = Arc::from(value);
            set.insert(Arc::clone(&item));
            item
        }
    }
}

/*--------------------------------------------------------------------------------------
  IP Network Supplemental Functions
--------------------------------------------------------------------------------------*/

pub mod ipnetwork {
    use ipnetwork::{IpNetworkError, Ipv4Network, Ipv6Network};

    /*
        `Ipv4Network`/`Ipv6Network` parsing accepts a bare address as a host
        network (`52.1.1.1` parses as `52.1.1.1/32`). Published prefixes must
        carry an explicit prefix length.
    */

    fn require_prefix_length(cidr: &str) -> Result<(), IpNetworkError> {
        if cidr.contains('/') {
            Ok(())
        } else {
            Err(IpNetworkError::InvalidCidrFormat(format!(
                "{cidr:?} has no prefix length"
            )))
        }
    }

    /// Parse an IPv4 CIDR with an explicit prefix length, clearing any host bits.
    pub fn parse_ipv4_cidr(cidr: &str) -> Result<Ipv4Network, IpNetworkError> {
        require_prefix_length(cidr)?;
        cidr.parse::<Ipv4Network>().map(ipv4_network_prefix)
    }

    /// Parse an IPv6 CIDR with an explicit prefix length, clearing any host bits.
    pub fn parse_ipv6_cidr(cidr: &str) -> Result<Ipv6Network, IpNetworkError> {
        require_prefix_length(cidr)?;
        cidr.parse::<Ipv6Network>().map(ipv6_network_prefix)
    }

    /*
        The IpNetwork types keep whatever host bits were written in the CIDR
        string (`10.1.2.3/8` stays `10.1.2.3/8`). These helpers reduce a network
        to its network prefix, where all host bits are `0`.
    */

    pub fn ipv4_network_prefix(network: Ipv4Network) -> Ipv4Network {
        Ipv4Network::new(network.network(), network.prefix()).unwrap_or(network)
    }

    pub fn ipv6_network_prefix(network: Ipv6Network) -> Ipv6Network {
        Ipv6Network::new(network.network(), network.prefix()).unwrap_or(network)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::ipnetwork::*;
    use super::*;
    use ::ipnetwork::{Ipv4Network, Ipv6Network};

    #[test]
    fn test_intern_arc_str_shares_values() {
        let mut set = BTreeSet::new();
        let first = intern_arc_str("us-east-1", &mut set);
        let second = intern_arc_str("us-east-1", &mut set);
        let third = intern_arc_str("us-west-2", &mut set);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*third, "us-west-2");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_network_prefix_clears_host_bits() {
        let ipv4: Ipv4Network = "10.1.2.3/8".parse().unwrap();
        let ipv6: Ipv6Network = "2001:db8::1/32".parse().unwrap();

        assert_eq!(ipv4_network_prefix(ipv4), "10.0.0.0/8".parse::<Ipv4Network>().unwrap());
        assert_eq!(ipv6_network_prefix(ipv6), "2001:db8::/32".parse::<Ipv6Network>().unwrap());
    }

    #[test]
    fn test_parse_cidr_requires_prefix_length() {
        assert!(parse_ipv4_cidr("52.1.1.1").is_err());
        assert!(parse_ipv6_cidr("2600:1f18::1").is_err());
        assert!(parse_ipv4_cidr("").is_err());

        assert_eq!(
            parse_ipv4_cidr("52.1.1.1/32").unwrap(),
            "52.1.1.1/32".parse::<Ipv4Network>().unwrap()
        );
        assert_eq!(
            parse_ipv6_cidr("2600:1f18::1/33").unwrap(),
            "2600:1f18::/33".parse::<Ipv6Network>().unwrap()
        );
    }
}
