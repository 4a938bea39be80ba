use crate::core::address::classify;
use crate::core::block_table::BlockTable;
use crate::core::cache::RangeCache;
use crate::core::errors::Result;
use crate::core::fetcher::{Fetcher, HttpFetcher};
use crate::core::lookup_result::{LookupResult, Match};
use crate::core::matcher::find_containing_blocks;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use std::env;
use std::sync::Arc;
use std::time::Duration;

/*-------------------------------------------------------------------------------------------------
  Simple Interface
-------------------------------------------------------------------------------------------------*/

lazy_static! {
    static ref DEFAULT_CLIENT: Client = Client::new();
}

/// _**Simple library interface**_ finds the AWS IP blocks that contain `address` using a
/// process-wide [Client] configured from the environment (see [ClientBuilder::new]). The AWS IP
/// Ranges are fetched on the first call and reused by every later call.
///
/// ```no_run
/// let lookup_result = awsiplookup::lookup("52.94.76.10").unwrap();
///
/// for aws_match in &lookup_result.matches {
///     println!("{} {} {}", aws_match.prefix, aws_match.region, aws_match.service);
/// }
/// ```
pub fn lookup(address: &str) -> Result<LookupResult> {
    DEFAULT_CLIENT.lookup(address)
}

/// The AWS IP Ranges held by the process-wide [Client], loading them if needed.
pub fn get_ranges() -> Result<Arc<BlockTable>> {
    DEFAULT_CLIENT.get_ranges()
}

/*-------------------------------------------------------------------------------------------------
  Client Builder
-------------------------------------------------------------------------------------------------*/

/// A builder for the [Client] struct that allows you to customize the client configuration.
///
/// ```
/// let client = awsiplookup::ClientBuilder::new()
///     .url("https://ip-ranges.amazonaws.com/ip-ranges.json")
///     .timeout(5000) // 5 seconds
///     .ttl(60 * 60) // 1 hour
///     .build();
/// ```
///
/// The [ClientBuilder::new] method attempts to source configuration values from environment
/// variables when set and uses default values when the environment variables are not set.
///
/// If you want to use the default configuration values, ignoring any environment variables, use
/// the [ClientBuilder::default] method to create a new [ClientBuilder] instance.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    url: String,
    timeout: u64,
    ttl: u64,
}

/*--------------------------------------------------------------------------------------
  Client Builder Implementation
--------------------------------------------------------------------------------------*/

impl Default for ClientBuilder {
    /// Create a new [ClientBuilder] with default configuration values.
    ///
    /// ```
    /// let client = awsiplookup::ClientBuilder::default().build();
    ///
    /// assert_eq!(client.url(), "https://ip-ranges.amazonaws.com/ip-ranges.json");
    /// assert_eq!(client.timeout(), 10000);
    /// assert_eq!(client.ttl(), 0);
    /// ```
    fn default() -> Self {
        Self {
            url: "https://ip-ranges.amazonaws.com/ip-ranges.json".to_string(),
            timeout: 10_000, // 10 seconds
            ttl: 0,          // Keep the first table for the life of the process
        }
    }
}

impl ClientBuilder {
    /// Create a new [ClientBuilder] reading initial configuration values from
    /// environment variables when set and default values when the environment
    /// variables are not set.
    ///
    /// The environment variables used to set the initial configuration values
    /// are:
    /// - `AWSIPLOOKUP_URL`
    /// - `AWSIPLOOKUP_TIMEOUT`
    /// - `AWSIPLOOKUP_TTL`
    pub fn new() -> Self {
        let default = ClientBuilder::default();

        Self {
            url: get_env_var("AWSIPLOOKUP_URL", default.url),
            timeout: get_env_var("AWSIPLOOKUP_TIMEOUT", default.timeout),
            ttl: get_env_var("AWSIPLOOKUP_TTL", default.ttl),
        }
    }

    /*-------------------------------------------------------------------------
      Setters
    -------------------------------------------------------------------------*/

    /// Set the URL used to retrieve the AWS IP Ranges; defaults to
    /// `https://ip-ranges.amazonaws.com/ip-ranges.json` - see
    /// [AWS IP address ranges](https://docs.aws.amazon.com/vpc/latest/userguide/aws-ip-ranges.html)
    /// in the Amazon Virtual Private Cloud (VPC) User Guide for details.
    pub fn url<'s>(&'s mut self, url: &str) -> &'s mut Self {
        self.url = url.to_string();
        self
    }

    /// Set the maximum time (in milliseconds) to wait for the AWS IP Ranges
    /// JSON to be retrieved; defaults to `10000` milliseconds. `0` disables
    /// the timeout.
    pub fn timeout(&mut self, timeout: u64) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Set the time (in seconds) a loaded table is used before the next
    /// lookup reloads it; defaults to `0`, which keeps the first table for
    /// the life of the process.
    pub fn ttl(&mut self, ttl: u64) -> &mut Self {
        self.ttl = ttl;
        self
    }

    /*-------------------------------------------------------------------------
      Build Methods
    -------------------------------------------------------------------------*/

    /// Build a [Client] that retrieves the AWS IP Ranges over HTTP.
    pub fn build(&self) -> Client {
        let timeout = non_zero_duration(Duration::from_millis(self.timeout));
        let fetcher = HttpFetcher::new(&self.url, timeout);
        self.build_with_fetcher(fetcher)
    }

    /// Build a [Client] that retrieves the AWS IP Ranges with a custom [Fetcher].
    pub fn build_with_fetcher<F: Fetcher>(&self, fetcher: F) -> Client<F> {
        Client {
            url: self.url.clone(),
            timeout: self.timeout,
            ttl: self.ttl,
            cache: RangeCache::with_ttl(
                fetcher,
                non_zero_duration(Duration::from_secs(self.ttl)),
            ),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Client
-------------------------------------------------------------------------------------------------*/

/// A client for looking up IP addresses in the AWS IP Ranges. Each client owns its own
/// [RangeCache]: the ranges are retrieved on the first lookup and reused by later lookups.
/// A client is safe to share between threads.
///
/// The [Client::new] method attempts to source configuration values from environment variables
/// when set and uses default values when the environment variables are not set.
///
/// ```no_run
/// let client = awsiplookup::Client::new();
/// let lookup_result = client.lookup("2600:1f18::1").unwrap();
/// ```
#[derive(Debug)]
pub struct Client<F = HttpFetcher> {
    url: String,
    timeout: u64,
    ttl: u64,
    cache: RangeCache<F>,
}

/*--------------------------------------------------------------------------------------
  Client Implementation
--------------------------------------------------------------------------------------*/

impl Default for Client {
    /// Create a new [Client] with default configuration values.
    fn default() -> Self {
        ClientBuilder::default().build()
    }
}

impl Client {
    pub fn new() -> Self {
        ClientBuilder::new().build()
    }
}

impl<F: Fetcher> Client<F> {
    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    /// Get the URL used to retrieve the AWS IP Ranges.
    ///
    /// ```
    /// let client = awsiplookup::Client::default();
    /// assert_eq!(client.url(), "https://ip-ranges.amazonaws.com/ip-ranges.json");
    /// ```
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the fetch timeout in milliseconds (`0` means no timeout).
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Get the table time-to-live in seconds (`0` means the life of the process).
    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn cache(&self) -> &RangeCache<F> {
        &self.cache
    }

    /*-------------------------------------------------------------------------
      Lookup
    -------------------------------------------------------------------------*/

    /// Find every AWS IP block containing `address`.
    ///
    /// Invalid addresses are rejected before the ranges are loaded. An address outside the AWS
    /// IP Ranges is not an error; it yields an empty match list.
    pub fn lookup(&self, address: &str) -> Result<LookupResult> {
        let classified = classify(address)
            .inspect_err(|error| warn!("Rejected lookup: {}", error))?;

        let snapshot = self.cache.snapshot()?;

        let matches: Vec<Match> = find_containing_blocks(&classified, snapshot.table())
            .into_iter()
            .map(Match::from)
            .collect();

        debug!(
            "Lookup {} ({}): {} match(es), {}",
            address,
            classified.family(),
            matches.len(),
            snapshot.provenance
        );

        Ok(LookupResult {
            requested_address: address.to_string(),
            address: classified,
            provenance: snapshot.provenance,
            matches,
        })
    }

    /// Retrieve (on first use) and return the current AWS IP Ranges table.
    pub fn get_ranges(&self) -> Result<Arc<BlockTable>> {
        self.cache.current()
    }
}

/*-------------------------------------------------------------------------------------------------
  Helper Functions
-------------------------------------------------------------------------------------------------*/

/// Get and parse an environment variable value or return a default value.
fn get_env_var<T: std::str::FromStr>(env_var: &str, default: T) -> T {
    env::var(env_var)
        .ok()
        .and_then(|value| {
            value
                .parse::<T>()
                .inspect(|_| info!("Using {}: {}", env_var, value))
                .inspect_err(|_| warn!("Invalid {}: {}", env_var, value))
                .ok()
        })
        .unwrap_or(default)
}

fn non_zero_duration(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::address::AddressFamily;
    use crate::core::block_table::tests::TEST_JSON;
    use crate::core::cache::tests::FixtureFetcher;
    use crate::core::errors::log_error;
    use crate::core::fetcher::Provenance;
    use env::VarError;
    use test_log::test;

    const END_TO_END_JSON: &str = r#"{"prefixes":[{"ip_prefix":"52.0.0.0/15","region":"us-east-1","service":"AMAZON"},{"ip_prefix":"52.0.0.0/15","region":"us-east-1","service":"EC2"}]}"#;

    fn fixture_client(json: &str) -> Client<FixtureFetcher> {
        ClientBuilder::default().build_with_fetcher(FixtureFetcher::new(json))
    }

    /*-------------------------------------------------------------------------
      Test Lookup
    -------------------------------------------------------------------------*/

    #[test]
    fn test_lookup_end_to_end() {
        let client = fixture_client(END_TO_END_JSON);

        let lookup_result = client.lookup("52.1.1.1").inspect_err(log_error).unwrap();
        assert_eq!(lookup_result.requested_address, "52.1.1.1");
        assert_eq!(lookup_result.provenance, Provenance::ColdRetrieval);

        let services: Vec<&str> = lookup_result
            .matches
            .iter()
            .map(|aws_match| &*aws_match.service)
            .collect();
        assert_eq!(services, vec!["AMAZON", "EC2"]);
        assert!(lookup_result
            .matches
            .iter()
            .all(|aws_match| &*aws_match.prefix == "52.0.0.0/15"
                && &*aws_match.region == "us-east-1"
                && aws_match.network_border_group.is_empty()));

        let lookup_result = client.lookup("10.0.0.1").inspect_err(log_error).unwrap();
        assert!(lookup_result.matches.is_empty());
        assert!(!lookup_result.is_match());
        assert_eq!(lookup_result.provenance, Provenance::Local);

        assert_eq!(client.cache().fetcher().fetch_count(), 1);
    }

    #[test]
    fn test_lookup_ipv6() {
        let client = fixture_client(TEST_JSON);

        let lookup_result = client.lookup("2600:1f18:0:0::1").unwrap();
        assert_eq!(lookup_result.address.family(), AddressFamily::IPv6);
        assert_eq!(lookup_result.address.canonical(), "2600:1f18::1");
        assert_eq!(lookup_result.requested_address, "2600:1f18:0:0::1");
        assert_eq!(lookup_result.matches.len(), 2);

        let lookup_result = client.lookup("::ffff:10.1.2.3").unwrap();
        assert!(lookup_result.matches.is_empty());
    }

    #[test]
    fn test_lookup_invalid_address_does_not_fetch() {
        let client = fixture_client(TEST_JSON);

        for address in ["", "not-an-ip", "10.0.0.0/8", "999.1.1.1"] {
            let error = client.lookup(address).unwrap_err();
            assert!(error.is_invalid_address(), "{address:?} was accepted");
        }

        assert_eq!(client.cache().fetcher().fetch_count(), 0);
        assert!(client.cache().loaded().is_none());
    }

    #[test]
    fn test_lookup_fetch_failure_is_retried() {
        let client = fixture_client("{not json");

        let error = client.lookup("52.1.1.1").unwrap_err();
        assert!(error.is_fetch_failed());

        client.cache().fetcher().set_json(END_TO_END_JSON);
        let lookup_result = client.lookup("52.1.1.1").unwrap();
        assert_eq!(lookup_result.matches.len(), 2);
        assert_eq!(client.cache().fetcher().fetch_count(), 2);
    }

    #[test]
    fn test_get_ranges() {
        let client = fixture_client(TEST_JSON);
        let first = client.get_ranges().unwrap();
        let second = client.get_ranges().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    /*-------------------------------------------------------------------------
      Test Environment Variable Configuration
    -------------------------------------------------------------------------*/

    /// ENV_VAR: AWSIPLOOKUP_URL
    /// ENV_VAR: AWSIPLOOKUP_TIMEOUT
    /// ENV_VAR: AWSIPLOOKUP_TTL
    #[test]
    fn test_environment_variable_configuration() {
        let test_env_vars = [
            ("AWSIPLOOKUP_URL", "https://my-ip-ranges.com/ip-ranges.json"),
            ("AWSIPLOOKUP_TIMEOUT", "1000"),
            ("AWSIPLOOKUP_TTL", "3600"),
        ];

        let default = Client::default();

        // Store environment variable values
        let stored_env_vars: Vec<(String, std::result::Result<String, VarError>)> = test_env_vars
            .iter()
            .map(|(env_var, _)| (env_var.to_string(), env::var(env_var)))
            .collect();

        // Unset all environment variables
        test_env_vars.iter().for_each(|(env_var, _)| unsafe {
            std::env::remove_var(env_var);
        });

        // Test default cases
        let new = Client::new();
        assert_eq!(new.url(), default.url());
        assert_eq!(new.timeout(), default.timeout());
        assert_eq!(new.ttl(), default.ttl());

        // Set all environment variables
        for (env_var, value) in test_env_vars.iter() {
            unsafe { std::env::set_var(env_var, value) };
        }

        // Test environment variable configuration
        let env_config = Client::new();
        assert_eq!(env_config.url(), "https://my-ip-ranges.com/ip-ranges.json");
        assert_eq!(env_config.timeout(), 1000);
        assert_eq!(env_config.ttl(), 3600);
        assert_eq!(env_config.cache().ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(
            env_config.cache().fetcher().timeout(),
            Some(Duration::from_millis(1000))
        );

        // Invalid values fall back to the defaults
        unsafe { std::env::set_var("AWSIPLOOKUP_TTL", "one hour") };
        assert_eq!(Client::new().ttl(), default.ttl());

        // Reset environment variables
        for (env_var, value) in stored_env_vars {
            match value {
                Ok(value) => unsafe { std::env::set_var(env_var, value) },
                Err(VarError::NotPresent) => unsafe { std::env::remove_var(env_var) },
                Err(VarError::NotUnicode(value)) => unsafe { std::env::set_var(env_var, value) },
            }
        }
    }

    /*-------------------------------------------------------------------------
      Test Getter and Setter Methods
    -------------------------------------------------------------------------*/

    #[test]
    fn test_getter_and_setter_methods() {
        let client = ClientBuilder::default()
            .url("https://my-ip-ranges.com/ip-ranges.json")
            .timeout(0)
            .ttl(60)
            .build();

        assert_eq!(client.url(), "https://my-ip-ranges.com/ip-ranges.json");
        assert_eq!(client.timeout(), 0);
        assert_eq!(client.ttl(), 60);
        assert_eq!(client.cache().fetcher().url(), client.url());
        assert_eq!(client.cache().fetcher().timeout(), None);
        assert_eq!(client.cache().ttl(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_default_client_keeps_tables_for_process_lifetime() {
        let client = Client::default();
        assert_eq!(client.cache().ttl(), None);
        assert_eq!(
            client.cache().fetcher().timeout(),
            Some(Duration::from_secs(10))
        );
    }
}
