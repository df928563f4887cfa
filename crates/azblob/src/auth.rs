//! Shared Key request signing

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The parts of a request covered by a Shared Key signature.
///
/// Only requests without a body and without standard conditional headers are
/// issued, so the eleven standard header slots of the string-to-sign are empty.
pub(crate) struct SignableRequest<'a> {
    pub method: &'a str,
    /// URL path as sent, already percent-encoded
    pub path: &'a str,
    /// Query parameters, unencoded
    pub query: &'a [(&'a str, String)],
    /// `x-ms-*` headers
    pub ms_headers: &'a [(&'a str, String)],
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn canonicalized_headers(headers: &[(&str, String)]) -> String {
    let mut headers: Vec<(String, &str)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
        .filter(|(name, _)| name.starts_with("x-ms-"))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect()
}

fn canonicalized_resource(account: &str, path: &str, query: &[(&str, String)]) -> String {
    let mut params: Vec<(String, &str)> = query
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));

    let mut resource = format!("/{}{}", account, path);
    for (name, value) in params {
        resource.push('\n');
        resource.push_str(&name);
        resource.push(':');
        resource.push_str(value);
    }
    resource
}

pub(crate) fn string_to_sign(account: &str, request: &SignableRequest<'_>) -> String {
    // Content-Encoding, Content-Language, Content-Length, Content-MD5,
    // Content-Type, Date, If-Modified-Since, If-Match, If-None-Match,
    // If-Unmodified-Since, Range
    let standard_headers = "\n".repeat(11);

    format!(
        "{}\n{}{}{}",
        request.method,
        standard_headers,
        canonicalized_headers(request.ms_headers),
        canonicalized_resource(account, request.path, request.query)
    )
}

/// Value of the `Authorization` header for `request`
pub(crate) fn authorization_header(
    account: &str,
    key: &[u8],
    request: &SignableRequest<'_>,
) -> String {
    let signature = BASE64.encode(hmac_sha256(key, string_to_sign(account, request).as_bytes()));
    format!("SharedKey {}:{}", account, signature)
}
