//! Common test utilities for castellan-connector-sharepoint integration tests.

#![cfg(feature = "integration")]
#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use secrecy::SecretString;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use castellan_connector_sharepoint::{
    SharePointConfig, SharePointConnector, SharePointCredentials,
};

pub const TENANT_ID: &str = "test-tenant";
pub const PFX_PASSWORD: &str = "test-password";

/// Builds a throwaway PKCS#12 bundle for the certificate-assertion flow.
pub fn create_test_pfx() -> String {
    let mut rng = rand::rngs::OsRng;
    let key = RsaPrivateKey::new(&mut rng, 2048).expect("RSA keygen");
    let key_der = key.to_pkcs8_der().expect("PKCS#8 encoding");
    let cert_der = b"integration-test-certificate".to_vec();

    let bundle = p12::PFX::new(&cert_der, key_der.as_bytes(), None, PFX_PASSWORD, "test")
        .expect("PFX construction");
    STANDARD.encode(bundle.to_der())
}

/// Test data factory for Graph site records.
pub fn create_site(id: &str, name: &str, web_url: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "displayName": format!("Team {}", name),
        "isPersonalSite": false,
        "webUrl": web_url,
        "siteCollection": { "hostname": "contoso.sharepoint.com" }
    })
}

/// Test data factory for personal (OneDrive) site records.
pub fn create_personal_site(id: &str, web_url: &str) -> Value {
    json!({
        "id": id,
        "name": "personal",
        "displayName": "Personal Site",
        "isPersonalSite": true,
        "webUrl": web_url
    })
}

/// Test data factory for SharePoint site groups.
pub fn create_site_group(web_url: &str, id: i64, title: &str) -> Value {
    json!({
        "odata.id": format!("{web_url}/_api/Web/SiteGroups/GetById({id})"),
        "Id": id,
        "LoginName": title,
        "Title": title,
        "OwnerTitle": "System Account",
        "Description": format!("Group {title}"),
        "OnlyAllowMembersViewMembership": false,
        "PrincipalType": 8
    })
}

/// Test data factory for federated (Entra) user principals.
pub fn create_entra_user(id: i64, upn: &str) -> Value {
    json!({
        "Id": id,
        "Title": format!("User {upn}"),
        "Email": upn,
        "LoginName": format!("i:0#.f|membership|{upn}"),
        "UserPrincipalName": upn,
        "IsSiteAdmin": false,
        "IsHiddenInUI": false,
        "PrincipalType": 1
    })
}

/// Test data factory for Entra group principals.
pub fn create_entra_group(id: i64, object_id: &str) -> Value {
    json!({
        "Id": id,
        "Title": "Entra Group",
        "Email": "",
        "LoginName": format!("c:0o.c|federateddirectoryclaimprovider|{object_id}"),
        "IsSiteAdmin": false,
        "IsHiddenInUI": false,
        "PrincipalType": 4
    })
}

/// Test data factory for SharePoint-native security principals.
pub fn create_native_principal(id: i64, login_name: &str, title: &str) -> Value {
    json!({
        "Id": id,
        "Title": title,
        "Email": "",
        "LoginName": login_name,
        "IsSiteAdmin": false,
        "IsHiddenInUI": false,
        "PrincipalType": 4
    })
}

/// Test data factory for the built-in system account.
pub fn create_system_account(id: i64) -> Value {
    json!({
        "Id": id,
        "Title": "System Account",
        "Email": "",
        "LoginName": "SHAREPOINT\\system",
        "IsSiteAdmin": true,
        "IsHiddenInUI": false,
        "PrincipalType": 1
    })
}

/// Wraps items in a collection response, optionally with a next link.
pub fn create_collection(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut response = json!({ "value": items });
    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }
    response
}

/// Creates a mock OAuth token response.
pub fn create_token_response(access_token: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

/// Creates a contextinfo response whose digest stays valid for the test.
pub fn create_context_info(web_url: &str) -> Value {
    json!({
        "FormDigestTimeoutSeconds": 1800,
        "FormDigestValue": "0xDIGEST,14 Jun 2030 10:00:00 +0000",
        "WebFullUrl": web_url,
        "SiteFullUrl": web_url
    })
}

/// Mock server wrapper standing in for Graph, the login endpoint, and the
/// SharePoint REST API at once.
pub struct MockSharePointServer {
    pub server: MockServer,
}

impl MockSharePointServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Returns the mock server's base URL.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Builds a connector pointed entirely at the mock server.
    pub fn connector(&self) -> SharePointConnector {
        let config = SharePointConfig::builder()
            .tenant_id(TENANT_ID)
            .sharepoint_domain("contoso")
            .graph_endpoint(self.url())
            .login_endpoint(self.url())
            .build()
            .expect("test config");
        let credentials = SharePointCredentials {
            client_id: "test-client".to_string(),
            client_secret: SecretString::from("test-secret"),
            pfx_certificate: create_test_pfx(),
            pfx_password: SecretString::from(PFX_PASSWORD),
        };
        SharePointConnector::new(config, credentials)
    }

    /// Sets up the OAuth token endpoint for both credential flows.
    pub async fn mock_token_endpoint(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/{TENANT_ID}/oauth2/v2.0/token")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(create_token_response("mock-access-token", 3600)),
            )
            .mount(&self.server)
            .await;
    }

    /// Sets up a Graph site lookup by ID.
    pub async fn mock_site_by_id(&self, site_id: &str, site: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1.0/sites/{site_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(site))
            .mount(&self.server)
            .await;
    }

    /// Sets up the contextinfo endpoint for a site web.
    pub async fn mock_context_info(&self, site_path: &str, web_url: &str) {
        Mock::given(method("POST"))
            .and(path(format!("{site_path}/_api/contextinfo")))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_context_info(web_url)))
            .mount(&self.server)
            .await;
    }
}
