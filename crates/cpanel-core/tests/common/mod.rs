//! Test doubles and common utilities for resource contract tests
//!
//! The [`MockApi`] answers calls from per-call scripts (keyed by
//! `Module::function`) and records every call it receives, so tests can
//! assert both on results and on what was sent over the wire.

#![allow(dead_code)]

use cpanel_core::api::ApiCall;
use cpanel_core::error::{Error, Result};
use cpanel_core::traits::{Attributes, CpanelApi};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A scripted CpanelApi that tracks calls
#[derive(Default)]
pub struct MockApi {
    /// Queued responses per `Module::function`
    scripts: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    /// Every call received, in order
    calls: Mutex<Vec<ApiCall>>,
    /// Call counter for submit()
    submit_call_count: AtomicUsize,
}

impl MockApi {
    /// Create a mock with no scripted responses
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a success payload for the named call
    pub fn respond(&self, call: &str, data: Value) -> &Self {
        self.push(call, Ok(data))
    }

    /// Queue a failure for the named call
    pub fn fail(&self, call: &str, error: Error) -> &Self {
        self.push(call, Err(error))
    }

    fn push(&self, call: &str, response: Result<Value>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(call.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Get the number of times submit() was called
    pub fn call_count(&self) -> usize {
        self.submit_call_count.load(Ordering::SeqCst)
    }

    /// All received calls
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Received calls to one `Module::function`
    pub fn calls_to(&self, call: &str) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.to_string() == call)
            .collect()
    }
}

#[async_trait::async_trait]
impl CpanelApi for MockApi {
    async fn submit(&self, call: &ApiCall) -> Result<Value> {
        self.submit_call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call.clone());

        self.scripts
            .lock()
            .unwrap()
            .get_mut(&call.to_string())
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(Error::Other(format!("no scripted response for {call}"))))
    }
}

/// Build an attribute map from a JSON object literal
pub fn attrs(value: Value) -> Attributes {
    value
        .as_object()
        .cloned()
        .expect("attribute literal must be a JSON object")
}

/// A `DomainInfo::list_domains` payload
pub fn listing(addon: &[&str], parked: &[&str], subdomains: &[&str]) -> Value {
    json!({
        "main_domain": "example.com",
        "addon_domains": addon,
        "parked_domains": parked,
        "sub_domains": subdomains,
    })
}

/// One `fetchzone_records` element for an A record
pub fn a_record(line: u64, name: &str, address: &str, ttl: u64) -> Value {
    json!({
        "line": line,
        "name": format!("{name}."),
        "type": "A",
        "class": "IN",
        "address": address,
        "ttl": ttl,
    })
}

/// The control lines every zone starts with
pub fn zone_preamble() -> Vec<Value> {
    vec![
        json!({"line": 1, "type": ":RAW", "raw": "; cPanel first:11.0"}),
        json!({"line": 2, "type": "$TTL", "ttl": 14400}),
        json!({
            "line": 3,
            "name": "example.com.",
            "type": "SOA",
            "mname": "ns1.example.com",
            "ttl": 86400
        }),
    ]
}

/// Value of one query parameter of a recorded call
pub fn param<'a>(call: &'a ApiCall, key: &str) -> Option<&'a str> {
    call.params().get(key).map(String::as_str)
}
