use crate::core::address::Address;
use crate::core::block_table::AwsIpBlock;
use crate::core::fetcher::Provenance;
use serde::Serialize;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  Lookup Result
-------------------------------------------------------------------------------------------------*/

/// The AWS IP blocks containing a requested address.
#[derive(Clone, Debug, Serialize)]
pub struct LookupResult {
    /// The address as it was requested.
    #[serde(rename = "requested_ip")]
    pub requested_address: String,

    /// The classified address.
    #[serde(skip)]
    pub address: Address,

    /// How the table used for this lookup was obtained.
    #[serde(rename = "cache_status")]
    pub provenance: Provenance,

    /// Every containing block, in dataset order; empty when the address is not an AWS address.
    pub matches: Vec<Match>,
}

impl LookupResult {
    pub fn is_match(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// One containing block.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Match {
    #[serde(rename = "ip_prefix")]
    pub prefix: Arc<str>,
    pub region: Arc<str>,
    pub service: Arc<str>,
    pub network_border_group: Arc<str>,
}

impl From<&AwsIpBlock> for Match {
    fn from(block: &AwsIpBlock) -> Self {
        Match {
            prefix: Arc::clone(&block.prefix),
            region: Arc::clone(&block.region),
            service: Arc::clone(&block.service),
            network_border_group: Arc::clone(&block.network_border_group),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
