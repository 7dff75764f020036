// # DNS Zone Record Resource
//
// A record inside a zone hosted on the account. The backend addresses records
// by their position (line) in the zone, so the identifier is `<zone>:<line>`.
// The add call does not reliably report the line it assigned; creation
// therefore re-reads the zone and matches on name, type and value.
//
// ## API Calls (all API2 `ZoneEdit`)
//
// - Create: `add_zone_record(domain, name, type, address, ttl)`
// - Read:   `fetchzone_records(domain, line)`
// - Update: `edit_zone_record(domain, line, [address], [ttl])`
// - Delete: `remove_zone_record(domain, line)`
//
// ## Line Stability
//
// Lines are not stable across edits to the same zone by other actors. A read
// that finds a different name or type at the tracked line reports the record
// as gone instead of adopting the stranger.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{decode_attributes, fqdn, names_equal, string_attr};
use crate::api::ApiCall;
use crate::error::{Error, Result};
use crate::schema::{FieldDefault, FieldSchema, ResourceSchema};
use crate::traits::{Attributes, CpanelApi, Resource, ResourceState};

/// TTL applied when none is declared
pub const DEFAULT_TTL: u64 = 14400;

/// Record types accepted by the schema
pub const RECORD_TYPES: &[&str] = &["A", "AAAA", "CNAME", "TXT", "MX", "SRV", "NS", "PTR"];

/// Schema of `cpanel_zone_record`
pub static ZONE_RECORD_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "cpanel_zone_record",
    fields: &[
        FieldSchema::string("zone")
            .required()
            .force_new()
            .describe("Zone (domain) the record belongs to"),
        FieldSchema::string("name")
            .required()
            .force_new()
            .describe("`@` for the apex, a relative label, or a name inside the zone"),
        FieldSchema::string("type")
            .default(FieldDefault::Str("A"))
            .one_of(RECORD_TYPES)
            .force_new()
            .describe("Record type"),
        FieldSchema::string("address")
            .required()
            .describe("Record value: address, target host or text"),
        FieldSchema::int("ttl")
            .default(FieldDefault::Int(DEFAULT_TTL))
            .describe("Time to live in seconds"),
        FieldSchema::string("fqdn")
            .computed()
            .describe("Fully qualified record name"),
    ],
};

/// Supported record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Txt,
    Mx,
    Srv,
    Ns,
    Ptr,
}

impl RecordType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
            RecordType::Srv => "SRV",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
        }
    }

    /// Field of a fetched record that carries this type's value
    pub fn value_field(&self) -> &'static str {
        match self {
            RecordType::A | RecordType::Aaaa => "address",
            RecordType::Cname => "cname",
            RecordType::Txt => "txtdata",
            RecordType::Mx => "exchange",
            RecordType::Srv => "target",
            RecordType::Ns => "nsdname",
            RecordType::Ptr => "ptrdname",
        }
    }

    /// Whether the value is a host name
    pub fn is_hostname_valued(&self) -> bool {
        matches!(
            self,
            RecordType::Cname | RecordType::Mx | RecordType::Srv | RecordType::Ns | RecordType::Ptr
        )
    }

    /// Compare two record values the way the backend treats them
    pub fn values_equal(&self, a: &str, b: &str) -> bool {
        let (a, b) = (a.trim(), b.trim());
        match self {
            RecordType::A | RecordType::Aaaa => match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
                (Ok(a), Ok(b)) => a == b,
                _ => a == b,
            },
            RecordType::Txt => a.trim_matches('"') == b.trim_matches('"'),
            _ if self.is_hostname_valued() => names_equal(a, b),
            _ => a == b,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "TXT" => Ok(RecordType::Txt),
            "MX" => Ok(RecordType::Mx),
            "SRV" => Ok(RecordType::Srv),
            "NS" => Ok(RecordType::Ns),
            "PTR" => Ok(RecordType::Ptr),
            other => Err(Error::invalid_input(format!(
                "unsupported record type '{other}'"
            ))),
        }
    }
}

/// Identifier of a zone record: `<zone>:<line>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneRecordId {
    /// Zone the record lives in
    pub zone: String,
    /// Backend line number within the zone
    pub line: u64,
}

impl fmt::Display for ZoneRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.zone, self.line)
    }
}

impl FromStr for ZoneRecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || {
            Error::invalid_input(format!(
                "malformed zone record id '{s}', expected <zone>:<line>"
            ))
        };

        let (zone, line) = s.split_once(':').ok_or_else(malformed)?;
        if zone.is_empty() || line.contains(':') {
            return Err(malformed());
        }
        let line = line.parse().map_err(|_| malformed())?;

        Ok(Self {
            zone: zone.to_string(),
            line,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeclaredRecord {
    zone: String,
    name: String,
    #[serde(rename = "type")]
    record_type: RecordType,
    address: String,
    ttl: u64,
}

/// One line of a fetched zone
#[derive(Debug, Clone, PartialEq)]
struct ZoneLine {
    line: u64,
    name: String,
    record_type: Option<RecordType>,
    value: Option<String>,
    ttl: Option<u64>,
}

impl ZoneLine {
    /// Parse one element of a `fetchzone_records` payload
    ///
    /// Elements without a line number are skipped; control lines (`$TTL`,
    /// SOA, comments) parse with no record type and never match.
    fn parse(raw: &Value) -> Option<Self> {
        let line = raw.get("line").and_then(as_u64)?;
        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim_end_matches('.')
            .to_string();
        let record_type = raw
            .get("type")
            .and_then(Value::as_str)
            .and_then(|t| t.parse::<RecordType>().ok());
        let value = record_type.and_then(|t| {
            raw.get(t.value_field())
                .or_else(|| raw.get("address"))
                .and_then(Value::as_str)
                .map(|v| v.trim_end_matches('.').to_string())
        });
        let ttl = raw.get("ttl").and_then(as_u64);

        Some(Self {
            line,
            name,
            record_type,
            value,
            ttl,
        })
    }

    fn matches(&self, fqdn: &str, record_type: RecordType, address: &str) -> bool {
        self.record_type == Some(record_type)
            && names_equal(&self.name, fqdn)
            && self
                .value
                .as_deref()
                .is_some_and(|v| record_type.values_equal(v, address))
    }

    /// Fold observed value and TTL into `attributes`
    ///
    /// A value equal to the declared one under type-aware comparison keeps
    /// the declared spelling so that it does not show up as drift.
    fn observe_into(&self, attributes: &mut Attributes, record_type: RecordType) {
        if let Some(value) = &self.value {
            let unchanged = string_attr(attributes, "address")
                .is_some_and(|declared| record_type.values_equal(declared, value));
            if !unchanged {
                attributes.insert("address".into(), value.clone().into());
            }
        }
        if let Some(ttl) = self.ttl {
            attributes.insert("ttl".into(), ttl.into());
        }
    }
}

/// Numeric field that may come back as a number or a numeric string
fn as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Relative record name for a fully qualified one (`@` for the apex)
fn relative_name(fqdn: &str, zone: &str) -> String {
    let zone = zone.trim_end_matches('.');
    let fqdn = fqdn.trim_end_matches('.');
    if names_equal(fqdn, zone) {
        return "@".to_string();
    }

    if let Some(split) = fqdn.len().checked_sub(zone.len() + 1)
        && split > 0
        && let (Some(label), Some(rest)) = (fqdn.get(..split), fqdn.get(split..))
        && let Some(suffix) = rest.strip_prefix('.')
        && names_equal(suffix, zone)
    {
        return label.to_string();
    }

    fqdn.to_string()
}

async fn fetch_zone(api: &dyn CpanelApi, zone: &str, line: Option<u64>) -> Result<Vec<ZoneLine>> {
    let mut call = ApiCall::api2("ZoneEdit", "fetchzone_records").param("domain", zone);
    if let Some(line) = line {
        call = call.param("line", line.to_string());
    }

    match api.submit(&call).await? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().filter_map(ZoneLine::parse).collect()),
        other => Err(Error::malformed(format!(
            "{call}: expected a list of records, got {other}"
        ))),
    }
}

/// DNS zone record resource
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneRecordResource;

#[async_trait]
impl Resource for ZoneRecordResource {
    fn schema(&self) -> &'static ResourceSchema {
        &ZONE_RECORD_SCHEMA
    }

    async fn create(&self, api: &dyn CpanelApi, desired: &Attributes) -> Result<ResourceState> {
        let mut attributes = ZONE_RECORD_SCHEMA.normalize(desired)?;
        let declared: DeclaredRecord = decode_attributes(ZONE_RECORD_SCHEMA.type_name, &attributes)?;
        let fqdn = fqdn(&declared.name, &declared.zone);

        let existing: HashSet<u64> = fetch_zone(api, &declared.zone, None)
            .await?
            .iter()
            .filter(|l| l.matches(&fqdn, declared.record_type, &declared.address))
            .map(|l| l.line)
            .collect();

        api.submit(
            &ApiCall::api2("ZoneEdit", "add_zone_record")
                .param("domain", &declared.zone)
                .param("name", format!("{fqdn}."))
                .param("type", declared.record_type.as_str())
                .param("address", &declared.address)
                .param("ttl", declared.ttl.to_string()),
        )
        .await?;

        // The record now exists; anything below that fails leaves it untracked
        let confirmed = fetch_zone(api, &declared.zone, None).await.map_err(|e| {
            Error::identifier_resolution(
                &declared.zone,
                format!("re-reading the zone for {} {fqdn} failed: {e}", declared.record_type),
            )
        })?;

        let candidates: Vec<&ZoneLine> = confirmed
            .iter()
            .filter(|l| !existing.contains(&l.line))
            .filter(|l| l.matches(&fqdn, declared.record_type, &declared.address))
            .collect();

        let matched = match candidates.as_slice() {
            [] => {
                return Err(Error::identifier_resolution(
                    &declared.zone,
                    format!(
                        "no new line matches {} {fqdn} -> {}",
                        declared.record_type, declared.address
                    ),
                ));
            }
            [only] => *only,
            [first, ..] => {
                warn!(
                    "{} new lines in {} match {} {} -> {}; tracking line {}",
                    candidates.len(),
                    declared.zone,
                    declared.record_type,
                    fqdn,
                    declared.address,
                    first.line
                );
                *first
            }
        };

        let id = ZoneRecordId {
            zone: declared.zone.clone(),
            line: matched.line,
        };
        matched.observe_into(&mut attributes, declared.record_type);
        attributes.insert("fqdn".into(), fqdn.clone().into());

        info!("Created {} record {} as {}", declared.record_type, fqdn, id);
        Ok(ResourceState::new(id.to_string(), attributes))
    }

    async fn read(
        &self,
        api: &dyn CpanelApi,
        current: &ResourceState,
    ) -> Result<Option<Attributes>> {
        if !current.is_tracked() {
            return Ok(None);
        }

        let id: ZoneRecordId = current.id.parse()?;
        let lines = fetch_zone(api, &id.zone, Some(id.line)).await?;
        let Some(found) = lines.iter().find(|l| l.line == id.line) else {
            debug!("Zone record {} no longer present", id);
            return Ok(None);
        };
        let Some(found_type) = found.record_type else {
            debug!("Line {} no longer holds a supported record", id);
            return Ok(None);
        };

        let mut observed = current.attributes.clone();

        if let Some(declared) = string_attr(&observed, "type") {
            let declared: RecordType = declared.parse()?;
            if declared != found_type {
                warn!(
                    "Line {} now holds a {} record instead of {}; treating as gone",
                    id, found_type, declared
                );
                return Ok(None);
            }
        } else {
            observed.insert("type".into(), found_type.as_str().into());
        }

        match string_attr(&observed, "name") {
            Some(name) => {
                let expected = fqdn(name, &id.zone);
                if !names_equal(&expected, &found.name) {
                    warn!(
                        "Line {} now holds {} instead of {}; treating as gone",
                        id, found.name, expected
                    );
                    return Ok(None);
                }
            }
            None => {
                observed.insert("zone".into(), id.zone.clone().into());
                observed.insert("name".into(), relative_name(&found.name, &id.zone).into());
            }
        }

        found.observe_into(&mut observed, found_type);
        observed.insert("fqdn".into(), found.name.clone().into());
        Ok(Some(observed))
    }

    async fn update(
        &self,
        api: &dyn CpanelApi,
        current: &ResourceState,
        desired: &Attributes,
    ) -> Result<Attributes> {
        let desired = ZONE_RECORD_SCHEMA.normalize(desired)?;
        let diff = ZONE_RECORD_SCHEMA.diff(&current.attributes, &desired);

        let mutable: Vec<&str> = ["address", "ttl"]
            .into_iter()
            .filter(|field| diff.has_change(field))
            .collect();
        if mutable.is_empty() {
            debug!("Zone record {} unchanged", current.id);
            return Ok(current.attributes.clone());
        }

        let id: ZoneRecordId = current.id.parse()?;
        let mut call = ApiCall::api2("ZoneEdit", "edit_zone_record")
            .param("domain", &id.zone)
            .param("line", id.line.to_string());
        let mut merged = current.attributes.clone();

        for field in mutable {
            let Some(value) = desired.get(field) else {
                continue;
            };
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            call = call.param(field, rendered);
            merged.insert(field.to_string(), value.clone());
        }

        api.submit(&call).await?;

        info!("Updated zone record {}", id);
        Ok(merged)
    }

    async fn delete(&self, api: &dyn CpanelApi, current: &mut ResourceState) -> Result<()> {
        if !current.is_tracked() {
            return Ok(());
        }

        let id: ZoneRecordId = current.id.parse()?;
        api.submit(
            &ApiCall::api2("ZoneEdit", "remove_zone_record")
                .param("domain", &id.zone)
                .param("line", id.line.to_string()),
        )
        .await?;

        info!("Deleted zone record {}", id);
        current.clear();
        Ok(())
    }
}
