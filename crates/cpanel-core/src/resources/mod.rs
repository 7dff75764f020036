//! Managed cPanel resource kinds
//!
//! - [`DomainResource`]: addon/parked domains (`cpanel_domain`)
//! - [`SubdomainResource`]: subdomains (`cpanel_subdomain`)
//! - [`ZoneRecordResource`]: DNS zone records (`cpanel_zone_record`)
//!
//! Each kind is a stateless unit struct implementing [`crate::Resource`].
//! Shared helpers for naming and the domain listing live here.

pub mod domain;
pub mod subdomain;
pub mod zone_record;

pub use domain::{DOMAIN_SCHEMA, DomainResource};
pub use subdomain::{SUBDOMAIN_SCHEMA, SubdomainResource};
pub use zone_record::{RecordType, ZONE_RECORD_SCHEMA, ZoneRecordId, ZoneRecordResource};

use crate::api::ApiCall;
use crate::error::{Error, Result};
use crate::traits::{Attributes, CpanelApi};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Fully qualified form of a record name within a zone
///
/// `@`, an empty name, or the zone itself map to the zone apex; a name that
/// already ends in the zone is kept; anything else gets the zone appended.
///
/// ```
/// use cpanel_core::resources::fqdn;
///
/// assert_eq!(fqdn("@", "example.com"), "example.com");
/// assert_eq!(fqdn("www", "example.com"), "www.example.com");
/// assert_eq!(fqdn("www.example.com", "example.com"), "www.example.com");
/// ```
pub fn fqdn(name: &str, zone: &str) -> String {
    let zone = zone.trim().trim_end_matches('.');
    let name = name.trim().trim_end_matches('.');

    if name.is_empty() || name == "@" || name.eq_ignore_ascii_case(zone) {
        return zone.to_string();
    }

    let suffix = format!(".{}", zone.to_ascii_lowercase());
    if name.to_ascii_lowercase().ends_with(&suffix) {
        return name.to_string();
    }

    format!("{name}.{zone}")
}

/// Whether two DNS names are equal, ignoring case and a trailing dot
pub fn names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// First label of a domain (`shop` for `shop.example.com`)
pub fn first_label(domain: &str) -> &str {
    domain.split('.').next().unwrap_or(domain)
}

/// Domains hosted by the account, as reported by UAPI `DomainInfo::list_domains`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DomainListing {
    /// Primary domain of the account
    #[serde(default)]
    pub main_domain: Option<String>,
    /// Addon domains
    #[serde(default)]
    pub addon_domains: Vec<String>,
    /// Parked (alias) domains
    #[serde(default)]
    pub parked_domains: Vec<String>,
    /// Subdomains, fully qualified
    #[serde(default)]
    pub sub_domains: Vec<String>,
}

impl DomainListing {
    /// Fetch the listing
    pub async fn fetch(api: &dyn CpanelApi) -> Result<Self> {
        let call = ApiCall::uapi("DomainInfo", "list_domains");
        let data = api.submit(&call).await?;
        decode_payload(&call, data)
    }

    /// Whether `domain` is an addon or parked domain
    pub fn has_addon_or_parked(&self, domain: &str) -> bool {
        self.addon_domains
            .iter()
            .chain(self.parked_domains.iter())
            .any(|d| names_equal(d, domain))
    }

    /// Whether `name` is a subdomain
    pub fn has_subdomain(&self, name: &str) -> bool {
        self.sub_domains.iter().any(|d| names_equal(d, name))
    }
}

/// Decode a success payload into a typed shape
pub(crate) fn decode_payload<T: DeserializeOwned>(call: &ApiCall, data: Value) -> Result<T> {
    if !data.is_object() {
        return Err(Error::malformed(format!(
            "{call}: expected an object payload, got {data}"
        )));
    }
    serde_json::from_value(data)
        .map_err(|e| Error::malformed(format!("{call}: unexpected payload shape: {e}")))
}

/// Decode normalized attributes into a typed declaration
pub(crate) fn decode_attributes<T: DeserializeOwned>(
    type_name: &str,
    attributes: &Attributes,
) -> Result<T> {
    serde_json::from_value(Value::Object(attributes.clone()))
        .map_err(|e| Error::invalid_input(format!("{type_name}: {e}")))
}

/// String attribute by name, if present
pub(crate) fn string_attr<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes.get(key).and_then(Value::as_str)
}
