use crate::core::errors::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::borrow::Cow;

/*-------------------------------------------------------------------------------------------------
  Parse JSON
-------------------------------------------------------------------------------------------------*/

/// Deserialize the AWS IP Ranges JSON document. Prefix strings are kept as text so one bad
/// entry does not reject the whole document.
pub fn parse(json: &str) -> Result<JsonIpRanges<'_>> {
    Ok(serde_json::from_str(json)?)
}

/*-------------------------------------------------------------------------------------------------
  JSON Data Structures
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  JSON IP Ranges
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize, Eq, PartialEq)]
pub struct JsonIpRanges<'j> {
    #[serde(rename = "syncToken", default, borrow)]
    pub sync_token: Option<Cow<'j, str>>,

    #[serde(
        rename = "createDate",
        default,
        deserialize_with = "crate::core::datetime::deserialize_option"
    )]
    pub create_date: Option<DateTime<Utc>>,

    #[serde(borrow)]
    pub prefixes: Vec<JsonIpPrefix<'j>>,

    #[serde(default, borrow)]
    pub ipv6_prefixes: Vec<JsonIpv6Prefix<'j>>,
}

/*--------------------------------------------------------------------------------------
  JSON IP (IPv4) Prefix
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize, Eq, PartialEq)]
pub struct JsonIpPrefix<'j> {
    #[serde(borrow)]
    pub ip_prefix: Cow<'j, str>,
    #[serde(borrow)]
    pub region: Cow<'j, str>,
    #[serde(default, borrow)]
    pub network_border_group: Cow<'j, str>,
    #[serde(borrow)]
    pub service: Cow<'j, str>,
}

/*--------------------------------------------------------------------------------------
  JSON IPv6 Prefix
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize, Eq, PartialEq)]
pub struct JsonIpv6Prefix<'j> {
    #[serde(borrow)]
    pub ipv6_prefix: Cow<'j, str>,
    #[serde(borrow)]
    pub region: Cow<'j, str>,
    #[serde(default, borrow)]
    pub network_border_group: Cow<'j, str>,
    #[serde(borrow)]
    pub service: Cow<'j, str>,
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
