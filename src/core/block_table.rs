use crate::core::address::AddressFamily;
use crate::core::errors::Result;
use crate::core::json::{self, JsonIpRanges};
use crate::core::utils::{self, intern_arc_str};
use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use log::{info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  AWS IP Block
-------------------------------------------------------------------------------------------------*/

/// One parsed AWS IP Ranges entry: the decoded network plus the entry's source metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AwsIpBlock {
    /// Network prefix (host bits cleared) decoded from [AwsIpBlock::prefix].
    pub network: IpNetwork,

    /// The prefix string exactly as published.
    pub prefix: Arc<str>,

    /// AWS region the prefix is associated with.
    pub region: Arc<str>,

    /// AWS service that uses the prefix.
    pub service: Arc<str>,

    /// Network border group the prefix is associated with (empty when not published).
    pub network_border_group: Arc<str>,
}

impl AwsIpBlock {
    pub fn family(&self) -> AddressFamily {
        match self.network {
            IpNetwork::V4(_) => AddressFamily::IPv4,
            IpNetwork::V6(_) => AddressFamily::IPv6,
        }
    }

    pub fn prefix_len(&self) -> u8 {
        self.network.prefix()
    }
}

/*-------------------------------------------------------------------------------------------------
  Block Table
-------------------------------------------------------------------------------------------------*/

/// Immutable snapshot of the AWS IP Ranges, partitioned by address family. Blocks keep the
/// order they were published in.
#[derive(Clone, Debug, Default)]
pub struct BlockTable {
    sync_token: Option<String>,
    create_date: Option<DateTime<Utc>>,

    regions: BTreeSet<Arc<str>>,
    network_border_groups: BTreeSet<Arc<str>>,
    services: BTreeSet<Arc<str>>,

    ipv4_blocks: Vec<AwsIpBlock>,
    ipv6_blocks: Vec<AwsIpBlock>,

    skipped_entries: usize,
}

/*--------------------------------------------------------------------------------------
  Block Table Implementation
--------------------------------------------------------------------------------------*/

impl BlockTable {
    /// Deserialize and parse the AWS IP Ranges JSON. Fails only when the document itself
    /// cannot be deserialized; entries with unparsable prefixes are skipped.
    pub fn from_json(json: &str) -> Result<BlockTable> {
        let json_ip_ranges = json::parse(json)?;
        Ok(BlockTable::from(json_ip_ranges))
    }

    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    /// Publication time of the dataset in Unix epoch time format, when published.
    pub fn sync_token(&self) -> Option<&str> {
        self.sync_token.as_deref()
    }

    /// Publication time of the dataset in UTC `DateTime` format, when published.
    pub fn create_date(&self) -> Option<&DateTime<Utc>> {
        self.create_date.as_ref()
    }

    pub fn regions(&self) -> &BTreeSet<Arc<str>> {
        &self.regions
    }

    pub fn network_border_groups(&self) -> &BTreeSet<Arc<str>> {
        &self.network_border_groups
    }

    pub fn services(&self) -> &BTreeSet<Arc<str>> {
        &self.services
    }

    pub fn ipv4_blocks(&self) -> &[AwsIpBlock] {
        &self.ipv4_blocks
    }

    pub fn ipv6_blocks(&self) -> &[AwsIpBlock] {
        &self.ipv6_blocks
    }

    /// Blocks of a single address family.
    pub fn blocks(&self, family: AddressFamily) -> &[AwsIpBlock] {
        match family {
            AddressFamily::IPv4 => &self.ipv4_blocks,
            AddressFamily::IPv6 => &self.ipv6_blocks,
        }
    }

    /// Number of dataset entries dropped because their prefix could not be parsed.
    pub fn skipped_entries(&self) -> usize {
        self.skipped_entries
    }

    pub fn len(&self) -> usize {
        self.ipv4_blocks.len() + self.ipv6_blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4_blocks.is_empty() && self.ipv6_blocks.is_empty()
    }

    /*-------------------------------------------------------------------------
      Private Methods
    -------------------------------------------------------------------------*/

    fn push_block(
        &mut self,
        network: IpNetwork,
        prefix: &str,
        region: &str,
        service: &str,
        network_border_group: &str,
    ) {
        let block = AwsIpBlock {
            network,
            prefix: Arc::from(prefix),
            region: intern_arc_str(region, &mut self.regions),
            service: intern_arc_str(service, &mut self.services),
            network_border_group: intern_arc_str(
                network_border_group,
                &mut self.network_border_groups,
            ),
        };

        match network {
            IpNetwork::V4(_) => self.ipv4_blocks.push(block),
            IpNetwork::V6(_) => self.ipv6_blocks.push(block),
        }
    }

    fn skip_entry(&mut self, family: AddressFamily, prefix: &str, error: impl std::fmt::Display) {
        warn!("Skipping AWS IP Ranges entry with invalid {family} prefix {prefix:?}: {error}");
        self.skipped_entries += 1;
    }
}

/*--------------------------------------------------------------------------------------
  Build Block Table from JSON IP Ranges
--------------------------------------------------------------------------------------*/

impl From<JsonIpRanges<'_>> for BlockTable {
    fn from(json_ip_ranges: JsonIpRanges<'_>) -> Self {
        let mut block_table = BlockTable {
            sync_token: json_ip_ranges.sync_token.map(|token| token.into_owned()),
            create_date: json_ip_ranges.create_date,
            ipv4_blocks: Vec::with_capacity(json_ip_ranges.prefixes.len()),
            ipv6_blocks: Vec::with_capacity(json_ip_ranges.ipv6_prefixes.len()),
            ..BlockTable::default()
        };

        for entry in &json_ip_ranges.prefixes {
            match utils::ipnetwork::parse_ipv4_cidr(&entry.ip_prefix) {
                Ok(network) => block_table.push_block(
                    IpNetwork::V4(network),
                    &entry.ip_prefix,
                    &entry.region,
                    &entry.service,
                    &entry.network_border_group,
                ),
                Err(error) => block_table.skip_entry(AddressFamily::IPv4, &entry.ip_prefix, error),
            }
        }

        for entry in &json_ip_ranges.ipv6_prefixes {
            match utils::ipnetwork::parse_ipv6_cidr(&entry.ipv6_prefix) {
                Ok(network) => block_table.push_block(
                    IpNetwork::V6(network),
                    &entry.ipv6_prefix,
                    &entry.region,
                    &entry.service,
                    &entry.network_border_group,
                ),
                Err(error) => {
                    block_table.skip_entry(AddressFamily::IPv6, &entry.ipv6_prefix, error)
                }
            }
        }

        info!(
            "Parsed {} IPv4 and {} IPv6 AWS IP blocks ({} skipped)",
            block_table.ipv4_blocks.len(),
            block_table.ipv6_blocks.len(),
            block_table.skipped_entries
        );

        block_table
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use test_log::test;

    /*----------------------------------------------------------------------------------
      Test Helper Functions
    ----------------------------------------------------------------------------------*/

    pub(crate) const TEST_JSON: &str = r#"{
      "syncToken": "1640995200",
      "createDate": "2022-01-01-00-00-00",
      "prefixes": [
        {"ip_prefix": "10.0.0.0/8", "region": "us-east-1", "network_border_group": "us-east-1", "service": "AMAZON"},
        {"ip_prefix": "10.0.0.0/8", "region": "us-east-1", "network_border_group": "us-east-1", "service": "EC2"},
        {"ip_prefix": "10.1.0.0/16", "region": "us-east-1", "network_border_group": "us-east-1", "service": "S3"},
        {"ip_prefix": "52.94.76.0/22", "region": "us-west-2", "network_border_group": "us-west-2", "service": "AMAZON"}
      ],
      "ipv6_prefixes": [
        {"ipv6_prefix": "2600:1f00::/24", "region": "us-east-1", "network_border_group": "us-east-1", "service": "AMAZON"},
        {"ipv6_prefix": "2600:1f18::/33", "region": "us-east-1", "network_border_group": "us-east-1", "service": "EC2"}
      ]
    }"#;

    pub(crate) fn test_block_table() -> BlockTable {
        BlockTable::from_json(TEST_JSON).unwrap()
    }

    /*----------------------------------------------------------------------------------
      BlockTable
    ----------------------------------------------------------------------------------*/

    #[test]
    fn test_block_table_from_json() {
        let block_table = test_block_table();

        assert_eq!(block_table.sync_token(), Some("1640995200"));
        assert!(block_table.create_date().is_some());
        assert_eq!(block_table.ipv4_blocks().len(), 4);
        assert_eq!(block_table.ipv6_blocks().len(), 2);
        assert_eq!(block_table.len(), 6);
        assert_eq!(block_table.skipped_entries(), 0);

        assert_eq!(block_table.regions().len(), 2);
        assert_eq!(block_table.services().len(), 3);
        assert_eq!(block_table.network_border_groups().len(), 2);
    }

    #[test]
    fn test_block_table_preserves_dataset_order() {
        let block_table = test_block_table();

        let prefixes: Vec<(&str, &str)> = block_table
            .ipv4_blocks()
            .iter()
            .map(|block| (&*block.prefix, &*block.service))
            .collect();

        assert_eq!(
            prefixes,
            vec![
                ("10.0.0.0/8", "AMAZON"),
                ("10.0.0.0/8", "EC2"),
                ("10.1.0.0/16", "S3"),
                ("52.94.76.0/22", "AMAZON"),
            ]
        );
    }

    #[test]
    fn test_block_table_partitions_by_family() {
        let block_table = test_block_table();

        assert!(block_table
            .blocks(AddressFamily::IPv4)
            .iter()
            .all(|block| block.family().is_ipv4()));
        assert!(block_table
            .blocks(AddressFamily::IPv6)
            .iter()
            .all(|block| block.family().is_ipv6()));
    }

    #[test]
    fn test_block_table_skips_unparsable_entries() {
        let json = r#"{
          "prefixes": [
            {"ip_prefix": "not-a-cidr", "region": "us-east-1", "service": "AMAZON"},
            {"ip_prefix": "10.0.0.0/33", "region": "us-east-1", "service": "AMAZON"},
            {"ip_prefix": "2001:db8::/32", "region": "us-east-1", "service": "AMAZON"},
            {"ip_prefix": "52.0.0.0/15", "region": "us-east-1", "service": "EC2"}
          ],
          "ipv6_prefixes": [
            {"ipv6_prefix": "10.0.0.0/8", "region": "us-east-1", "service": "AMAZON"},
            {"ipv6_prefix": "2600:1f00::/24", "region": "us-east-1", "service": "AMAZON"}
          ]
        }"#;

        let block_table = BlockTable::from_json(json).unwrap();

        assert_eq!(block_table.skipped_entries(), 4);
        assert_eq!(block_table.ipv4_blocks().len(), 1);
        assert_eq!(&*block_table.ipv4_blocks()[0].prefix, "52.0.0.0/15");
        assert_eq!(block_table.ipv6_blocks().len(), 1);
        assert_eq!(&*block_table.ipv6_blocks()[0].prefix, "2600:1f00::/24");
    }

    #[test]
    fn test_block_table_skips_prefixes_without_length() {
        let json = r#"{
          "prefixes": [
            {"ip_prefix": "52.1.1.1", "region": "us-east-1", "service": "EC2"},
            {"ip_prefix": "52.1.1.1/32", "region": "us-east-1", "service": "EC2"}
          ],
          "ipv6_prefixes": [
            {"ipv6_prefix": "2600:1f18::1", "region": "us-east-1", "service": "EC2"}
          ]
        }"#;

        let block_table = BlockTable::from_json(json).unwrap();

        assert_eq!(block_table.skipped_entries(), 2);
        assert_eq!(block_table.ipv4_blocks().len(), 1);
        assert_eq!(&*block_table.ipv4_blocks()[0].prefix, "52.1.1.1/32");
        assert!(block_table.ipv6_blocks().is_empty());
    }

    #[test]
    fn test_block_table_clears_host_bits() {
        let json = r#"{"prefixes": [{"ip_prefix": "10.1.2.3/8", "region": "us-east-1", "service": "EC2"}]}"#;

        let block_table = BlockTable::from_json(json).unwrap();
        let block = &block_table.ipv4_blocks()[0];

        assert_eq!(block.network, "10.0.0.0/8".parse::<IpNetwork>().unwrap());
        assert_eq!(block.prefix_len(), 8);
        assert_eq!(&*block.prefix, "10.1.2.3/8");
    }

    #[test]
    fn test_block_table_shares_metadata_strings() {
        let block_table = test_block_table();
        let first = &block_table.ipv4_blocks()[0];
        let second = &block_table.ipv4_blocks()[1];

        assert!(Arc::ptr_eq(&first.region, &second.region));
        assert!(Arc::ptr_eq(
            &first.network_border_group,
            &second.network_border_group
        ));
    }

    #[test]
    fn test_block_table_malformed_document() {
        let error = BlockTable::from_json(r#"{"prefixes": "nope"}"#).unwrap_err();
        assert!(error.is_fetch_failed());
    }
}
