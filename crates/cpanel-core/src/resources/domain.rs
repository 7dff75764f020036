// # Addon/Parked Domain Resource
//
// Manages a secondary domain hosted under the account and mapped to a
// subdirectory. All fields are ForceNew; there is nothing to update in place.
//
// ## API Calls
//
// - Create: API2 `AddonDomain::addaddondomain(newdomain, subdomain, dir)`
// - Read:   UAPI `DomainInfo::list_domains` (addon and parked domains)
// - Delete: API2 `AddonDomain::deladdondomain(domain)`
//
// ## Identifier
//
// The domain itself, e.g. `shop.example.net`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{DomainListing, decode_attributes, first_label, string_attr};
use crate::api::ApiCall;
use crate::error::Result;
use crate::schema::{FieldSchema, ResourceSchema};
use crate::traits::{Attributes, CpanelApi, Resource, ResourceState};

/// Schema of `cpanel_domain`
pub static DOMAIN_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "cpanel_domain",
    fields: &[
        FieldSchema::string("domain")
            .required()
            .force_new()
            .describe("Addon domain to host, e.g. `shop.example.net`"),
        FieldSchema::string("subdomain")
            .computed()
            .force_new()
            .describe("Alias subdomain; defaults to the first label of `domain`"),
        FieldSchema::string("document_root")
            .computed()
            .force_new()
            .describe("Directory relative to the home directory; defaults to `public_html/<domain>`"),
    ],
};

#[derive(Debug, Deserialize)]
struct DeclaredDomain {
    domain: String,
    subdomain: Option<String>,
    document_root: Option<String>,
}

/// Addon/parked domain resource
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainResource;

#[async_trait]
impl Resource for DomainResource {
    fn schema(&self) -> &'static ResourceSchema {
        &DOMAIN_SCHEMA
    }

    async fn create(&self, api: &dyn CpanelApi, desired: &Attributes) -> Result<ResourceState> {
        let mut attributes = DOMAIN_SCHEMA.normalize(desired)?;
        let declared: DeclaredDomain = decode_attributes(DOMAIN_SCHEMA.type_name, &attributes)?;

        let subdomain = declared
            .subdomain
            .unwrap_or_else(|| first_label(&declared.domain).to_string());
        let document_root = declared
            .document_root
            .unwrap_or_else(|| format!("public_html/{}", declared.domain));

        api.submit(
            &ApiCall::api2("AddonDomain", "addaddondomain")
                .param("newdomain", &declared.domain)
                .param("subdomain", &subdomain)
                .param("dir", &document_root),
        )
        .await?;

        info!("Created addon domain {} in {}", declared.domain, document_root);

        attributes.insert("subdomain".into(), subdomain.into());
        attributes.insert("document_root".into(), document_root.into());
        Ok(ResourceState::new(declared.domain, attributes))
    }

    async fn read(
        &self,
        api: &dyn CpanelApi,
        current: &ResourceState,
    ) -> Result<Option<Attributes>> {
        if !current.is_tracked() {
            return Ok(None);
        }

        let listing = DomainListing::fetch(api).await?;
        if !listing.has_addon_or_parked(&current.id) {
            debug!("Addon domain {} no longer listed", current.id);
            return Ok(None);
        }

        let mut observed = current.attributes.clone();
        if string_attr(&observed, "domain").is_none() {
            observed.insert("domain".into(), current.id.clone().into());
        }
        Ok(Some(observed))
    }

    async fn update(
        &self,
        _api: &dyn CpanelApi,
        current: &ResourceState,
        desired: &Attributes,
    ) -> Result<Attributes> {
        // Every field is ForceNew, so validation is all that is left to do
        DOMAIN_SCHEMA.normalize(desired)?;
        Ok(current.attributes.clone())
    }

    async fn delete(&self, api: &dyn CpanelApi, current: &mut ResourceState) -> Result<()> {
        if !current.is_tracked() {
            return Ok(());
        }

        api.submit(&ApiCall::api2("AddonDomain", "deladdondomain").param("domain", &current.id))
            .await?;

        info!("Deleted addon domain {}", current.id);
        current.clear();
        Ok(())
    }
}
