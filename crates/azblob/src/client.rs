//! Service and container handles

use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder};

use crate::auth::{authorization_header, SignableRequest};
use crate::connection::{ConnectionString, Credential};
use crate::error::{StorageError, StorageResult};

/// REST API version sent with every request
pub const API_VERSION: &str = "2021-08-06";

/// Handle to a storage account's blob service
#[derive(Debug, Clone)]
pub struct BlobServiceClient {
    http: Client,
    account_name: String,
    credential: Credential,
    /// Endpoint URL without a trailing slash
    endpoint: String,
    /// Path component of the endpoint without a trailing slash (non-empty for emulators)
    endpoint_path: String,
}

impl BlobServiceClient {
    pub fn new(connection: ConnectionString) -> StorageResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| StorageError::request(connection.blob_endpoint.as_str(), e))?;
        Ok(Self::with_http_client(connection, http))
    }

    pub fn with_http_client(connection: ConnectionString, http: Client) -> Self {
        let mut endpoint = connection.blob_endpoint.clone();
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        let endpoint_path = endpoint.path().trim_end_matches('/').to_string();
        let endpoint = endpoint.as_str().trim_end_matches('/').to_string();

        BlobServiceClient {
            http,
            account_name: connection.account_name,
            credential: connection.credential,
            endpoint,
            endpoint_path,
        }
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn container(&self, name: &str) -> ContainerClient {
        ContainerClient {
            service: self.clone(),
            name: name.to_string(),
        }
    }

    /// Build an authorized request. `path` is relative to the endpoint and
    /// already percent-encoded; `query` values are unencoded.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> (String, RequestBuilder) {
        let mut url = format!("{}{}", self.endpoint, path);
        let mut separator = '?';
        for (name, value) in query {
            url.push(separator);
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
            separator = '&';
        }
        if let Credential::SharedAccessSignature(sas) = &self.credential {
            url.push(separator);
            url.push_str(sas);
        }

        let ms_headers = [
            (
                "x-ms-date",
                Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            ),
            ("x-ms-version", API_VERSION.to_string()),
        ];

        let mut builder = self.http.request(method.clone(), &url);
        for (name, value) in &ms_headers {
            builder = builder.header(*name, value);
        }

        if let Credential::SharedKey(key) = &self.credential {
            let resource_path = format!("{}{}", self.endpoint_path, path);
            let signable = SignableRequest {
                method: method.as_str(),
                path: &resource_path,
                query,
                ms_headers: &ms_headers,
            };
            builder = builder.header(
                "Authorization",
                authorization_header(&self.account_name, key, &signable),
            );
        }

        (url, builder)
    }
}

/// Handle to one container. Cheap to create; no request is made until used.
#[derive(Debug, Clone)]
pub struct ContainerClient {
    pub(crate) service: BlobServiceClient,
    pub(crate) name: String,
}

impl ContainerClient {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn container_path(&self) -> String {
        format!("/{}", urlencoding::encode(&self.name))
    }

    /// Encoded path of a blob: each `/`-separated segment encoded on its own
    pub(crate) fn blob_path(&self, blob_name: &str) -> String {
        let encoded = blob_name
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.container_path(), encoded)
    }
}
