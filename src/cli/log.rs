use awsiplookup::LookupResult;
use log::{info, warn};

/*-------------------------------------------------------------------------------------------------
  Logging Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Lookup Results
--------------------------------------------------------------------------------------*/

pub fn lookup_results(addresses: &[String], lookup_results: &[LookupResult]) {
    let count_addresses = addresses.len();
    info!("Looked up {count_addresses} address(es) in the AWS IP Ranges");

    let count_found = lookup_results
        .iter()
        .filter(|lookup_result| lookup_result.is_match())
        .count();
    let count_matches: usize = lookup_results
        .iter()
        .map(|lookup_result| lookup_result.matches.len())
        .sum();
    if count_found > 0 {
        info!("Found {count_found} address(es) in {count_matches} AWS IP Prefix entries");
    };

    let count_not_found = lookup_results.len() - count_found;
    if count_not_found > 0 {
        warn!("Did not find {count_not_found} address(es)");
    };
}
