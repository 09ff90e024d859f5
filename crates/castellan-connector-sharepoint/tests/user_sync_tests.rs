//! Integration tests for user and security principal listings.

#![cfg(feature = "integration")]

mod common;

use common::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use castellan_connector::pagination::PageCursor;
use castellan_connector::traits::ResourceSyncer;
use castellan_connector::types::ResourceId;

async fn mock_site_users(mock: &MockSharePointServer, users: Vec<serde_json::Value>) {
    let web_url = format!("{}/sites/Crisis", mock.url());
    mock.mock_site_by_id("site-1", create_site("site-1", "Crisis", &web_url))
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/Crisis/_api/web/siteusers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_collection(users, None)))
        .mount(&mock.server)
        .await;
}

/// Only locally-addressable principals become user resources.
#[tokio::test]
async fn test_user_listing_keeps_addressable_principals() {
    let mock = MockSharePointServer::new().await;
    mock.mock_token_endpoint().await;
    mock_site_users(
        &mock,
        vec![
            create_entra_user(11, "jane@contoso.com"),
            create_entra_group(12, "11111111-2222-3333-4444-555555555555"),
            create_native_principal(13, "c:0(.s|true", "Everyone"),
            create_system_account(1),
        ],
    )
    .await;

    let syncer = mock.connector().user_syncer();
    let parent = ResourceId::external("site", "site-1");
    let (users, cursor) = syncer
        .list(Some(&parent), PageCursor::default())
        .await
        .unwrap();

    assert!(cursor.is_done());
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id.resource, "jane@contoso.com");
    assert_eq!(users[0].email.as_deref(), Some("jane@contoso.com"));
    assert_eq!(users[1].id.resource, "c:0(.s|true");
}

/// The same principal listed under two sites yields the same resource ID.
#[tokio::test]
async fn test_user_ids_are_stable_across_sites() {
    let mock = MockSharePointServer::new().await;
    mock.mock_token_endpoint().await;

    for (site_id, site_name) in [("site-1", "Crisis"), ("site-2", "Store")] {
        let web_url = format!("{}/sites/{site_name}", mock.url());
        mock.mock_site_by_id(site_id, create_site(site_id, site_name, &web_url))
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/sites/{site_name}/_api/web/siteusers")))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_collection(
                vec![create_entra_user(11, "jane@contoso.com")],
                None,
            )))
            .mount(&mock.server)
            .await;
    }

    let syncer = mock.connector().user_syncer();
    let (a, _) = syncer
        .list(Some(&ResourceId::external("site", "site-1")), PageCursor::default())
        .await
        .unwrap();
    let (b, _) = syncer
        .list(Some(&ResourceId::external("site", "site-2")), PageCursor::default())
        .await
        .unwrap();

    assert_eq!(a[0].id, b[0].id);
}

/// A missing `UserPrincipalName` is backfilled from Graph by object ID.
#[tokio::test]
async fn test_missing_upn_is_resolved_via_graph() {
    let mock = MockSharePointServer::new().await;
    mock.mock_token_endpoint().await;

    let mut user = create_entra_user(11, "jane@contoso.com");
    user["UserPrincipalName"] = serde_json::Value::Null;
    user["UserId"] = serde_json::json!({
        "NameId": "aaaabbbb-cccc-dddd-eeee-ffff00001111",
        "NameIdIssuer": "urn:federation:microsoftonline"
    });
    mock_site_users(&mock, vec![user]).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users/aaaabbbb-cccc-dddd-eeee-ffff00001111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userPrincipalName": "jane@contoso.com"
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let syncer = mock.connector().user_syncer();
    let (users, _) = syncer
        .list(Some(&ResourceId::external("site", "site-1")), PageCursor::default())
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id.resource, "jane@contoso.com");
}

/// Security principal listing surfaces native claims entries only.
#[tokio::test]
async fn test_security_principal_listing() {
    let mock = MockSharePointServer::new().await;
    mock.mock_token_endpoint().await;
    mock_site_users(
        &mock,
        vec![
            create_entra_user(11, "jane@contoso.com"),
            create_entra_group(12, "11111111-2222-3333-4444-555555555555"),
            create_native_principal(13, "c:0(.s|true", "Everyone"),
            create_native_principal(14, "c:0-.f|somegroup|true", "Some Group"),
        ],
    )
    .await;

    let syncer = mock.connector().security_principal_syncer();
    let parent = ResourceId::external("site", "site-1");
    let (principals, _) = syncer
        .list(Some(&parent), PageCursor::default())
        .await
        .unwrap();

    assert_eq!(principals.len(), 2);
    assert_eq!(principals[0].id.resource, "c:0(.s|true");
    assert_eq!(principals[1].id.resource, "c:0-.f|somegroup|true");
    assert_eq!(
        principals[1]
            .profile
            .get("reasonableId")
            .and_then(|v| v.as_str()),
        Some("somegroup|true")
    );
}

/// Security principals expose no entitlements or grants of their own.
#[tokio::test]
async fn test_security_principals_have_no_entitlements() {
    let mock = MockSharePointServer::new().await;
    mock.mock_token_endpoint().await;
    mock_site_users(&mock, vec![create_native_principal(13, "c:0(.s|true", "Everyone")]).await;

    let syncer = mock.connector().security_principal_syncer();
    let parent = ResourceId::external("site", "site-1");
    let (principals, _) = syncer
        .list(Some(&parent), PageCursor::default())
        .await
        .unwrap();

    assert!(syncer.entitlements(&principals[0]).await.unwrap().is_empty());
    assert!(syncer.grants(&principals[0]).await.unwrap().is_empty());
}
