//! Storage account connection strings

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Url;
use std::fmt;

use crate::error::{StorageError, StorageResult};

/// Account name used by the local storage emulator
pub const DEV_STORAGE_ACCOUNT: &str = "devstoreaccount1";

/// Well-known emulator key, published with the emulator
const DEV_STORAGE_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

const DEV_STORAGE_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// How requests are authorized
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Decoded account key, used for Shared Key signatures
    SharedKey(Vec<u8>),
    /// SAS token without the leading `?`
    SharedAccessSignature(String),
    Anonymous,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::SharedKey(_) => f.write_str("SharedKey(<redacted>)"),
            Credential::SharedAccessSignature(_) => {
                f.write_str("SharedAccessSignature(<redacted>)")
            }
            Credential::Anonymous => f.write_str("Anonymous"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionString {
    pub account_name: String,
    pub blob_endpoint: Url,
    pub credential: Credential,
}

#[derive(Default)]
struct Fields {
    use_development_storage: bool,
    protocol: Option<String>,
    account_name: Option<String>,
    account_key: Option<String>,
    endpoint_suffix: Option<String>,
    blob_endpoint: Option<String>,
    sas: Option<String>,
}

fn invalid(reason: impl Into<String>) -> StorageError {
    StorageError::InvalidConnectionString(reason.into())
}

impl ConnectionString {
    /// Parse `Key=Value;Key=Value` pairs. Keys are case-insensitive and values
    /// are split on the first `=` so base64 padding survives.
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let mut fields = Fields::default();
        let mut seen_any = false;

        for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                invalid(format!(
                    "expected Key=Value, found '{}'",
                    redact_pair(pair)
                ))
            })?;
            let value = value.trim().to_string();
            seen_any = true;

            match key.trim().to_ascii_lowercase().as_str() {
                "usedevelopmentstorage" => {
                    fields.use_development_storage = value.eq_ignore_ascii_case("true")
                }
                "defaultendpointsprotocol" => fields.protocol = Some(value),
                "accountname" => fields.account_name = Some(value),
                "accountkey" => fields.account_key = Some(value),
                "endpointsuffix" => fields.endpoint_suffix = Some(value),
                "blobendpoint" => fields.blob_endpoint = Some(value),
                "sharedaccesssignature" => {
                    fields.sas = Some(value.trim_start_matches('?').to_string())
                }
                // Endpoints for other services are irrelevant to blob access
                other => log::debug!("Ignoring connection string key '{}'", other),
            }
        }

        if !seen_any {
            return Err(invalid("connection string is empty"));
        }

        if fields.use_development_storage {
            return Ok(Self::development_storage());
        }

        Self::from_fields(fields)
    }

    /// Connection to the local storage emulator
    pub fn development_storage() -> Self {
        ConnectionString {
            account_name: DEV_STORAGE_ACCOUNT.to_string(),
            blob_endpoint: Url::parse(DEV_STORAGE_BLOB_ENDPOINT)
                .expect("emulator endpoint is a valid URL"),
            credential: Credential::SharedKey(
                BASE64
                    .decode(DEV_STORAGE_KEY)
                    .expect("emulator key is valid base64"),
            ),
        }
    }

    fn from_fields(fields: Fields) -> StorageResult<Self> {
        let blob_endpoint = match (&fields.blob_endpoint, &fields.account_name) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(account)) => format!(
                "{}://{}.blob.{}",
                fields.protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL),
                account,
                fields
                    .endpoint_suffix
                    .as_deref()
                    .unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
            ),
            (None, None) => return Err(invalid("neither AccountName nor BlobEndpoint is set")),
        };

        let blob_endpoint = Url::parse(&blob_endpoint)
            .map_err(|e| invalid(format!("invalid blob endpoint '{}': {}", blob_endpoint, e)))?;
        if !matches!(blob_endpoint.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported endpoint scheme '{}'",
                blob_endpoint.scheme()
            )));
        }

        let account_name = match fields.account_name {
            Some(name) if !name.is_empty() => name,
            _ => account_from_host(&blob_endpoint)
                .ok_or_else(|| invalid("AccountName is missing"))?,
        };

        let credential = if let Some(key) = fields.account_key {
            let decoded = BASE64
                .decode(key.as_bytes())
                .map_err(|e| invalid(format!("AccountKey is not valid base64: {}", e)))?;
            Credential::SharedKey(decoded)
        } else if let Some(sas) = fields.sas.filter(|s| !s.is_empty()) {
            Credential::SharedAccessSignature(sas)
        } else if fields.blob_endpoint.is_some() {
            Credential::Anonymous
        } else {
            return Err(invalid("neither AccountKey nor SharedAccessSignature is set"));
        };

        Ok(ConnectionString {
            account_name,
            blob_endpoint,
            credential,
        })
    }
}

/// `myaccount.blob.core.windows.net` -> `myaccount`
fn account_from_host(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let (first, rest) = host.split_once('.')?;
    rest.starts_with("blob.").then(|| first.to_string())
}

/// Keep secrets out of error messages
fn redact_pair(pair: &str) -> String {
    if pair.len() > 16 {
        format!("{}...", &pair[..pair.char_indices().nth(8).map(|(i, _)| i).unwrap_or(0)])
    } else {
        pair.to_string()
    }
}
