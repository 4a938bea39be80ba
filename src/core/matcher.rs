use crate::core::address::Address;
use crate::core::block_table::{AwsIpBlock, BlockTable};
use ipnetwork::IpNetwork;
use std::net::IpAddr;

/*-------------------------------------------------------------------------------------------------
  Containment Matcher
-------------------------------------------------------------------------------------------------*/

/// Return every block in `table` whose network contains `address`, in table order.
///
/// Only the blocks of the address's own family are considered. Overlapping blocks (the same
/// CIDR published for `AMAZON` and for a specific service, or a prefix and its supernet) are
/// all returned; there is no longest-prefix ranking and no deduplication.
pub fn find_containing_blocks<'t>(
    address: &Address,
    table: &'t BlockTable,
) -> Vec<&'t AwsIpBlock> {
    table
        .blocks(address.family())
        .iter()
        .filter(|block| contains(block, address.ip()))
        .collect()
}

/// Whether `block` contains `ip`. Mixed-family pairs never match.
pub fn contains(block: &AwsIpBlock, ip: IpAddr) -> bool {
    match (&block.network, ip) {
        (IpNetwork::V4(network), IpAddr::V4(ipv4)) => network.contains(ipv4),
        (IpNetwork::V6(network), IpAddr::V6(ipv6)) => network.contains(ipv6),
        _ => false,
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
