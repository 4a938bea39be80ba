/*-------------------------------------------------------------------------------------------------
  Core Modules
-------------------------------------------------------------------------------------------------*/

pub mod address;
pub mod block_table;
pub mod cache;
pub mod client;
pub mod datetime;
pub mod errors;
pub mod fetcher;
pub mod json;
pub mod lookup_result;
pub mod matcher;
pub mod utils;
