//! Find the published [AWS IP address ranges](https://docs.aws.amazon.com/vpc/latest/userguide/aws-ip-ranges.html),
//! regions, and services that contain an IP address.
//!
//! The AWS IP Ranges JSON is retrieved on the first lookup, parsed into per-family tables of
//! network blocks, and kept in memory; later lookups are answered from that table.
//!
//! ```no_run
//! let lookup_result = awsiplookup::lookup("52.94.76.10")?;
//!
//! println!("Ranges obtained from: {}", lookup_result.provenance);
//! for aws_match in &lookup_result.matches {
//!     println!(
//!         "{} {} {} {}",
//!         aws_match.prefix, aws_match.region, aws_match.network_border_group, aws_match.service
//!     );
//! }
//! # Ok::<(), awsiplookup::Error>(())
//! ```
//!
//! Use a [ClientBuilder] to change the source URL, the fetch timeout, or to have tables expire
//! and reload after a time-to-live.

/*-------------------------------------------------------------------------------------------------
  Modules
-------------------------------------------------------------------------------------------------*/

mod core;

/*-------------------------------------------------------------------------------------------------
  Library Interface
-------------------------------------------------------------------------------------------------*/

pub use crate::core::address::{classify, Address, AddressFamily};
pub use crate::core::block_table::{AwsIpBlock, BlockTable};
pub use crate::core::cache::{CacheSnapshot, CacheState, RangeCache};
pub use crate::core::client::{get_ranges, lookup, Client, ClientBuilder};
pub use crate::core::errors::{Error, Result};
pub use crate::core::fetcher::{FetchedDataset, Fetcher, HttpFetcher, Provenance};
pub use crate::core::lookup_result::{LookupResult, Match};
pub use crate::core::matcher::find_containing_blocks;

/*--------------------------------------------------------------------------------------
  Re-exports
--------------------------------------------------------------------------------------*/

pub use ipnetwork;
