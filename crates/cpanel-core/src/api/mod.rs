//! cPanel API call model
//!
//! One [`ApiCall`] describes a single logical request against either of the
//! two JSON dialects served by a cPanel host:
//!
//! - **UAPI**: `GET /execute/<module>/<function>?<params>`
//! - **API2**: `GET /json-api/cpanel?cpanel_jsonapi_user=..&cpanel_jsonapi_apiversion=2&..`
//!
//! Both dialects share transport; they differ only in URL shape, the fixed
//! bookkeeping parameters, and the envelope wrapped around the payload. The
//! envelope strategies live in [`envelope`].

pub mod envelope;

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// API2 query key naming the account user
pub const API2_USER: &str = "cpanel_jsonapi_user";
/// API2 query key naming the API version
pub const API2_VERSION: &str = "cpanel_jsonapi_apiversion";
/// API2 query key naming the module
pub const API2_MODULE: &str = "cpanel_jsonapi_module";
/// API2 query key naming the function
pub const API2_FUNC: &str = "cpanel_jsonapi_func";

/// Query keys the API2 dialect reserves for itself
pub const API2_RESERVED_PARAMS: [&str; 4] = [API2_USER, API2_VERSION, API2_MODULE, API2_FUNC];

/// Path of the API2 JSON endpoint
pub const API2_PATH: &str = "/json-api/cpanel";

/// Which of the two cPanel JSON interfaces a call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Unified API (`/execute/...`)
    Uapi,
    /// Legacy API2 (`/json-api/cpanel`)
    Api2,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Uapi => write!(f, "UAPI"),
            Dialect::Api2 => write!(f, "API2"),
        }
    }
}

/// A single request against the cPanel host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    dialect: Dialect,
    module: String,
    function: String,
    params: BTreeMap<String, String>,
}

impl ApiCall {
    /// Create a UAPI call
    pub fn uapi(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self::new(Dialect::Uapi, module, function)
    }

    /// Create an API2 call
    pub fn api2(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self::new(Dialect::Api2, module, function)
    }

    fn new(dialect: Dialect, module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            dialect,
            module: module.into(),
            function: function.into(),
            params: BTreeMap::new(),
        }
    }

    /// The lightweight read used to validate credentials at connect time
    pub fn verification() -> Self {
        Self::uapi("DomainInfo", "list_domains")
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Target dialect
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// cPanel module name
    pub fn module(&self) -> &str {
        &self.module
    }

    /// cPanel function name
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Caller-supplied parameters
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// URL path of the endpoint, relative to the host base URL
    pub fn path(&self) -> String {
        match self.dialect {
            Dialect::Uapi => format!("/execute/{}/{}", self.module, self.function),
            Dialect::Api2 => API2_PATH.to_string(),
        }
    }

    /// Query parameters in send order
    ///
    /// For API2 the four reserved parameters come first. A caller parameter
    /// reusing a reserved key is rejected instead of silently overriding it.
    pub fn query_pairs(&self, username: &str) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::with_capacity(self.params.len() + 4);

        if self.dialect == Dialect::Api2 {
            if let Some(key) = self
                .params
                .keys()
                .find(|key| API2_RESERVED_PARAMS.contains(&key.as_str()))
            {
                return Err(Error::invalid_input(format!(
                    "parameter '{key}' is reserved by the API2 dialect ({self})"
                )));
            }

            pairs.push((API2_USER.to_string(), username.to_string()));
            pairs.push((API2_VERSION.to_string(), "2".to_string()));
            pairs.push((API2_MODULE.to_string(), self.module.clone()));
            pairs.push((API2_FUNC.to_string(), self.function.clone()));
        }

        pairs.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(pairs)
    }

    /// Interpret a response body with this call's dialect
    ///
    /// Returns the success payload: UAPI `data` or API2 `cpanelresult.data`.
    pub fn interpret(&self, body: &str) -> Result<Value> {
        match self.dialect {
            Dialect::Uapi => envelope::interpret_uapi(&self.to_string(), body),
            Dialect::Api2 => envelope::interpret_api2(&self.to_string(), body),
        }
    }
}

impl fmt::Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.function)
    }
}
