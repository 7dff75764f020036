//! Contract Test: Domain and Subdomain Lifecycle
//!
//! Domains and subdomains have identifiers computed from their inputs and
//! are observed through the account's domain listing.
//!
//! Constraints verified:
//! - Omitted attributes are derived by the documented default rules
//! - Identifiers are deterministic (`<domain>`, `<sub>.<root>`)
//! - Absence from the listing reads as NotFound, not as an error
//! - Delete clears the identifier only when the backend confirms
//! - Nothing in these kinds can be updated in place

mod common;

use common::*;
use cpanel_core::api::Dialect;
use cpanel_core::error::Error;
use cpanel_core::resources::{DomainResource, SubdomainResource};
use cpanel_core::traits::{Resource, ResourceState};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

const LIST: &str = "DomainInfo::list_domains";

#[tokio::test]
async fn domain_create_derives_defaults() {
    let api = MockApi::new();
    api.respond("AddonDomain::addaddondomain", json!([{"result": 1}]));

    let state = DomainResource
        .create(api.as_ref(), &attrs(json!({"domain": "shop.example.net"})))
        .await
        .unwrap();

    assert_eq!(state.id, "shop.example.net");
    assert_eq!(state.attributes["subdomain"], "shop");
    assert_eq!(state.attributes["document_root"], "public_html/shop.example.net");

    let call = &api.calls()[0];
    assert_eq!(call.dialect(), Dialect::Api2);
    assert_eq!(param(call, "newdomain"), Some("shop.example.net"));
    assert_eq!(param(call, "subdomain"), Some("shop"));
    assert_eq!(param(call, "dir"), Some("public_html/shop.example.net"));
}

#[tokio::test]
async fn domain_create_honours_declared_values() {
    let api = MockApi::new();
    api.respond("AddonDomain::addaddondomain", json!([{"result": 1}]));

    let state = DomainResource
        .create(
            api.as_ref(),
            &attrs(json!({
                "domain": "shop.example.net",
                "subdomain": "store",
                "document_root": "sites/shop"
            })),
        )
        .await
        .unwrap();

    assert_eq!(state.attributes["subdomain"], "store");
    assert_eq!(param(&api.calls()[0], "dir"), Some("sites/shop"));
}

#[tokio::test]
async fn domain_missing_required_attribute_makes_no_call() {
    let api = MockApi::new();

    let err = assert_err!(DomainResource.create(api.as_ref(), &attrs(json!({}))).await);

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn domain_read_checks_addon_and_parked_lists() {
    let api = MockApi::new();
    api.respond(LIST, listing(&[], &["shop.example.net"], &[]))
        .respond(LIST, listing(&["other.test"], &[], &["shop.example.com"]));

    let state = ResourceState::new("shop.example.net", attrs(json!({"domain": "shop.example.net"})));

    let present = assert_ok!(DomainResource.read(api.as_ref(), &state).await);
    assert!(present.is_some());

    let gone = assert_ok!(DomainResource.read(api.as_ref(), &state).await);
    assert_eq!(gone, None);
}

#[tokio::test]
async fn domain_read_rejects_non_object_listing() {
    let api = MockApi::new();
    api.respond(LIST, json!(["shop.example.net"]));

    let state = ResourceState::new("shop.example.net", attrs(json!({})));
    let err = assert_err!(DomainResource.read(api.as_ref(), &state).await);
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn domain_update_makes_zero_calls() {
    let api = MockApi::new();
    let state = ResourceState::new(
        "shop.example.net",
        attrs(json!({
            "domain": "shop.example.net",
            "subdomain": "shop",
            "document_root": "public_html/shop.example.net"
        })),
    );

    let attributes = DomainResource
        .update(api.as_ref(), &state, &attrs(json!({"domain": "shop.example.net"})))
        .await
        .unwrap();

    assert_eq!(attributes, state.attributes);
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn domain_delete_clears_identifier() {
    let api = MockApi::new();
    api.respond("AddonDomain::deladdondomain", json!([{"result": 1}]));
    let mut state = ResourceState::new("shop.example.net", attrs(json!({})));

    assert_ok!(DomainResource.delete(api.as_ref(), &mut state).await);

    assert!(!state.is_tracked());
    assert_eq!(param(&api.calls()[0], "domain"), Some("shop.example.net"));
}

#[tokio::test]
async fn subdomain_round_trip() {
    let api = MockApi::new();
    api.respond("SubDomain::addsubdomain", json!(null))
        .respond(LIST, listing(&[], &[], &["www.example.com"]))
        .respond("SubDomain::delsubdomain", json!([{"result": 1}]))
        .respond(LIST, listing(&[], &[], &[]));

    let mut state = SubdomainResource
        .create(
            api.as_ref(),
            &attrs(json!({"subdomain": "www", "root_domain": "example.com"})),
        )
        .await
        .unwrap();

    assert_eq!(state.id, "www.example.com");
    assert_eq!(state.attributes["document_root"], "public_html/www.example.com");

    let create = &api.calls()[0];
    assert_eq!(create.dialect(), Dialect::Uapi);
    assert_eq!(param(create, "domain"), Some("www"));
    assert_eq!(param(create, "rootdomain"), Some("example.com"));
    assert_eq!(param(create, "dir"), Some("public_html/www.example.com"));

    let observed = assert_ok!(SubdomainResource.read(api.as_ref(), &state).await);
    assert!(observed.is_some());

    let old = state.clone();
    assert_ok!(SubdomainResource.delete(api.as_ref(), &mut state).await);
    assert!(!state.is_tracked());
    assert_eq!(param(&api.calls_to("SubDomain::delsubdomain")[0], "domain"), Some("www.example.com"));

    // Out-of-band view of the old identifier after deletion
    let observed = assert_ok!(SubdomainResource.read(api.as_ref(), &old).await);
    assert_eq!(observed, None);
}

#[tokio::test]
async fn subdomain_import_splits_identifier() {
    let api = MockApi::new();
    api.respond(LIST, listing(&[], &[], &["blog.example.com"]));

    let observed = SubdomainResource
        .read(api.as_ref(), &ResourceState::new("blog.example.com", attrs(json!({}))))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(observed["subdomain"], "blog");
    assert_eq!(observed["root_domain"], "example.com");
}

#[tokio::test]
async fn subdomain_failed_delete_keeps_identifier() {
    let api = MockApi::new();
    api.fail(
        "SubDomain::delsubdomain",
        Error::rejected("SubDomain::delsubdomain", "API2 call reported failure"),
    );
    let mut state = ResourceState::new("www.example.com", attrs(json!({})));

    let err = assert_err!(SubdomainResource.delete(api.as_ref(), &mut state).await);

    assert!(err.is_rejection());
    assert_eq!(state.id, "www.example.com");
}
