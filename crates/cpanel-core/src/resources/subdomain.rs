// # Subdomain Resource
//
// ## API Calls
//
// - Create: UAPI `SubDomain::addsubdomain(domain, rootdomain, dir)`
// - Read:   UAPI `DomainInfo::list_domains` (`sub_domains`)
// - Delete: API2 `SubDomain::delsubdomain(domain)`
//
// ## Identifier
//
// `<subdomain>.<root domain>`, e.g. `www.example.com`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{DomainListing, decode_attributes, string_attr};
use crate::api::ApiCall;
use crate::error::Result;
use crate::schema::{FieldSchema, ResourceSchema};
use crate::traits::{Attributes, CpanelApi, Resource, ResourceState};

/// Schema of `cpanel_subdomain`
pub static SUBDOMAIN_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "cpanel_subdomain",
    fields: &[
        FieldSchema::string("subdomain")
            .required()
            .force_new()
            .describe("Subdomain label, e.g. `www`"),
        FieldSchema::string("root_domain")
            .required()
            .force_new()
            .describe("Domain the subdomain is created under"),
        FieldSchema::string("document_root")
            .computed()
            .force_new()
            .describe("Directory relative to the home directory; defaults to `public_html/<sub>.<root>`"),
    ],
};

#[derive(Debug, Deserialize)]
struct DeclaredSubdomain {
    subdomain: String,
    root_domain: String,
    document_root: Option<String>,
}

/// Subdomain resource
#[derive(Debug, Clone, Copy, Default)]
pub struct SubdomainResource;

#[async_trait]
impl Resource for SubdomainResource {
    fn schema(&self) -> &'static ResourceSchema {
        &SUBDOMAIN_SCHEMA
    }

    async fn create(&self, api: &dyn CpanelApi, desired: &Attributes) -> Result<ResourceState> {
        let mut attributes = SUBDOMAIN_SCHEMA.normalize(desired)?;
        let declared: DeclaredSubdomain = decode_attributes(SUBDOMAIN_SCHEMA.type_name, &attributes)?;

        let id = format!("{}.{}", declared.subdomain, declared.root_domain);
        let document_root = declared
            .document_root
            .unwrap_or_else(|| format!("public_html/{id}"));

        api.submit(
            &ApiCall::uapi("SubDomain", "addsubdomain")
                .param("domain", &declared.subdomain)
                .param("rootdomain", &declared.root_domain)
                .param("dir", &document_root),
        )
        .await?;

        info!("Created subdomain {} in {}", id, document_root);

        attributes.insert("document_root".into(), document_root.into());
        Ok(ResourceState::new(id, attributes))
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
        if !listing.has_subdomain(&current.id) {
            debug!("Subdomain {} no longer listed", current.id);
            return Ok(None);
        }

        let mut observed = current.attributes.clone();
        if string_attr(&observed, "subdomain").is_none()
            && let Some((subdomain, root)) = current.id.split_once('.')
        {
            observed.insert("subdomain".into(), subdomain.into());
            observed.insert("root_domain".into(), root.into());
        }
        Ok(Some(observed))
    }

    async fn update(
        &self,
        _api: &dyn CpanelApi,
        current: &ResourceState,
        desired: &Attributes,
    ) -> Result<Attributes> {
        SUBDOMAIN_SCHEMA.normalize(desired)?;
        Ok(current.attributes.clone())
    }

    async fn delete(&self, api: &dyn CpanelApi, current: &mut ResourceState) -> Result<()> {
        if !current.is_tracked() {
            return Ok(());
        }

        api.submit(&ApiCall::api2("SubDomain", "delsubdomain").param("domain", &current.id))
            .await?;

        info!("Deleted subdomain {}", current.id);
        current.clear();
        Ok(())
    }
}
