// # cPanel API Trait
//
// The single capability every resource reconciler depends on: submit one
// call, get back either the dialect-normalized payload or a classified error.
//
// ## Implementations
//
// - HTTP: `cpanel-client` crate (`CpanelClient`)
// - Tests: scripted doubles that record submitted calls
//
// ## Usage
//
// ```rust,ignore
// use cpanel_core::api::ApiCall;
// use cpanel_core::CpanelApi;
//
// async fn zone(api: &dyn CpanelApi) -> cpanel_core::Result<()> {
//     let records = api
//         .submit(&ApiCall::api2("ZoneEdit", "fetchzone_records").param("domain", "example.com"))
//         .await?;
//     println!("{records}");
//     Ok(())
// }
// ```

use crate::api::ApiCall;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for cPanel API implementations
///
/// # Thread Safety
///
/// Implementations must be usable concurrently from multiple tasks. The
/// orchestrator may drive different resources at the same time against one
/// shared instance.
///
/// ## Allowed Capabilities
/// - ✅ Perform exactly one HTTP request per `submit`
/// - ✅ Interpret the dialect envelope of the response
///
/// ## Forbidden Capabilities
/// - ❌ Retry, back off, or poll (a failed call is surfaced immediately)
/// - ❌ Cache responses between calls
/// - ❌ Log or return the API token
#[async_trait]
pub trait CpanelApi: Send + Sync {
    /// Submit one call and return its success payload
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: UAPI `data` or API2 `cpanelresult.data` (`Null` when absent)
    /// - `Err(Error::Transport)`: The host could not be reached
    /// - `Err(Error::MalformedResponse)`: The body did not match the dialect envelope
    /// - `Err(Error::ApiRejected)`: The backend reported failure
    async fn submit(&self, call: &ApiCall) -> Result<Value, crate::Error>;

    /// Validate credentials and reachability with a harmless read
    ///
    /// Called once when a connection is set up, before any resource operation.
    async fn verify(&self) -> Result<(), crate::Error> {
        self.submit(&ApiCall::verification()).await.map(|_| ())
    }
}
