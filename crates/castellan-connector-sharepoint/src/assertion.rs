//! Certificate-signed JWT assertions for the SharePoint token exchange.
//!
//! SharePoint's token endpoint does not accept client secrets; the
//! client-credentials exchange must be authenticated with an RS256 JWT
//! signed by the app registration's certificate. The `x5t` header carries
//! the certificate's SHA-1 thumbprint — required by the protocol for key
//! identification, not a cryptographic strength choice.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{SharePointError, SharePointResult};

/// Claims inputs for one assertion.
///
/// The clock is injected so signing is a deterministic function of its
/// inputs.
#[derive(Debug, Clone)]
pub struct AssertionOptions {
    /// Application (client) ID; used for both `iss` and `sub`.
    pub client_id: String,
    /// Directory (tenant) ID; selects the `aud` endpoint.
    pub tenant_id: String,
    /// Current time.
    pub now: DateTime<Utc>,
    /// Assertion lifetime (`exp = now + validity`).
    pub validity: Duration,
    /// Clock-skew allowance (`nbf = now - not_before`).
    pub not_before: Duration,
}

/// Signs a JWT assertion with the RSA key from a PKCS#12 bundle.
///
/// `pfx` may be base64-encoded or the raw bundle bytes as loaded from a
/// file.
///
/// # Errors
///
/// [`SharePointError::CertificateDecode`] when the bundle is malformed or
/// the password is wrong; [`SharePointError::UnsupportedKey`] when the
/// bundled key is not RSA.
pub fn sign_assertion(
    pfx: &str,
    password: &str,
    opts: &AssertionOptions,
) -> SharePointResult<String> {
    let (key, cert_der) = decode_pfx(pfx, password)?;

    let thumbprint = Sha1::digest(&cert_der);
    let header = serde_json::json!({
        "alg": "RS256",
        "typ": "JWT",
        "x5t": URL_SAFE_NO_PAD.encode(thumbprint),
    });
    let payload = claims(opts);

    let unsigned = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?),
    );

    let hashed = Sha256::digest(unsigned.as_bytes());
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)
        .map_err(|e| SharePointError::UnsupportedKey(format!("failed to sign JWT: {e}")))?;

    Ok(format!("{unsigned}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Extracts the RSA private key and certificate DER from a PKCS#12 bundle.
pub(crate) fn decode_pfx(pfx: &str, password: &str) -> SharePointResult<(RsaPrivateKey, Vec<u8>)> {
    // Accept either a base64 string or raw bundle bytes loaded from a file.
    let data = match STANDARD.decode(pfx.trim()) {
        Ok(decoded) => decoded,
        Err(_) => pfx.as_bytes().to_vec(),
    };

    let bundle = p12::PFX::parse(&data)
        .map_err(|e| SharePointError::CertificateDecode(format!("not a PKCS#12 bundle: {e}")))?;

    let key_der = bundle
        .key_bags(password)
        .map_err(|e| {
            SharePointError::CertificateDecode(format!(
                "cannot decrypt key bags, wrong password? {e}"
            ))
        })?
        .into_iter()
        .next()
        .ok_or_else(|| {
            SharePointError::CertificateDecode("bundle contains no private key".to_string())
        })?;

    let cert_der = bundle
        .cert_x509_bags(password)
        .map_err(|e| {
            SharePointError::CertificateDecode(format!(
                "cannot decrypt certificate bags, wrong password? {e}"
            ))
        })?
        .into_iter()
        .next()
        .ok_or_else(|| {
            SharePointError::CertificateDecode("bundle contains no certificate".to_string())
        })?;

    let key = RsaPrivateKey::from_pkcs8_der(&key_der)
        .map_err(|e| SharePointError::UnsupportedKey(format!("key is not RSA: {e}")))?;

    Ok((key, cert_der))
}

/// Builds the assertion claims.
fn claims(opts: &AssertionOptions) -> serde_json::Value {
    let nbf = (opts.now - opts.not_before).timestamp();
    let exp = (opts.now + opts.validity).timestamp();

    serde_json::json!({
        "aud": format!("https://login.microsoftonline.com/{}/v2.0", opts.tenant_id),
        "iss": opts.client_id,
        "sub": opts.client_id,
        "jti": format!("{}-{}", opts.now.timestamp_micros(), opts.now.timestamp()),
        "nbf": nbf,
        "exp": exp,
    })
}
