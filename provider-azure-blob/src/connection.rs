//! Azure Storage connection strings
//!
//! Accepts the `Key=Value;...` form the Azure portal hands out. Recognized
//! keys are matched case-insensitively; unknown keys are ignored.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AzureBlobError, Result};

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Well-known Azurite account
const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// How requests are authorized
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Signed with the decoded account key
    SharedKey { account_name: String, key: Vec<u8> },
    /// Token appended to every query string, without a leading `?`
    Sas(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::SharedKey { account_name, .. } => f
                .debug_struct("SharedKey")
                .field("account_name", account_name)
                .field("key", &"<redacted>")
                .finish(),
            Credential::Sas(_) => f.debug_tuple("Sas").field(&"<redacted>").finish(),
        }
    }
}

/// Blob service endpoint plus credential
///
/// `origin` is `scheme://host[:port]`; `base_path` is the path prefix the
/// endpoint carries (non-empty only for path-style endpoints such as the
/// emulator's `/devstoreaccount1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobAccount {
    pub origin: String,
    pub base_path: String,
    pub credential: Credential,
}

impl BlobAccount {
    pub fn development_storage() -> Result<Self> {
        let key = decode_key(DEV_ACCOUNT_KEY)?;
        Self::with_endpoint(
            DEV_BLOB_ENDPOINT,
            Credential::SharedKey {
                account_name: DEV_ACCOUNT_NAME.to_string(),
                key,
            },
        )
    }

    pub fn with_endpoint(endpoint: &str, credential: Credential) -> Result<Self> {
        let (origin, base_path) = split_endpoint(endpoint)?;
        Ok(Self {
            origin,
            base_path,
            credential,
        })
    }
}

impl FromStr for BlobAccount {
    type Err = AzureBlobError;

    fn from_str(connection_string: &str) -> Result<Self> {
        let mut fields = HashMap::new();
        for segment in connection_string
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                AzureBlobError::InvalidConnectionString(
                    "every segment must have the form Key=Value".to_string(),
                )
            })?;
            fields.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        if fields
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Self::development_storage();
        }

        let account_name = fields.remove("accountname").filter(|n| !n.is_empty());

        let endpoint = match fields.remove("blobendpoint") {
            Some(endpoint) => endpoint,
            None => {
                let name = account_name.as_deref().ok_or_else(|| {
                    AzureBlobError::InvalidConnectionString(
                        "AccountName or BlobEndpoint is required".to_string(),
                    )
                })?;
                let protocol = fields
                    .remove("defaultendpointsprotocol")
                    .unwrap_or_else(|| "https".to_string());
                let suffix = fields
                    .remove("endpointsuffix")
                    .unwrap_or_else(|| DEFAULT_ENDPOINT_SUFFIX.to_string());
                format!("{protocol}://{name}.blob.{suffix}")
            }
        };

        let credential = if let Some(key) = fields.remove("accountkey") {
            let account_name = account_name.ok_or_else(|| {
                AzureBlobError::InvalidConnectionString(
                    "AccountKey requires AccountName".to_string(),
                )
            })?;
            Credential::SharedKey {
                account_name,
                key: decode_key(&key)?,
            }
        } else if let Some(token) = fields.remove("sharedaccesssignature") {
            Credential::Sas(token.trim_start_matches('?').to_string())
        } else {
            return Err(AzureBlobError::InvalidConnectionString(
                "AccountKey or SharedAccessSignature is required".to_string(),
            ));
        };

        Self::with_endpoint(&endpoint, credential)
    }
}

fn decode_key(key: &str) -> Result<Vec<u8>> {
    STANDARD.decode(key).map_err(|_| {
        AzureBlobError::InvalidConnectionString("AccountKey is not valid base64".to_string())
    })
}

fn split_endpoint(endpoint: &str) -> Result<(String, String)> {
    let endpoint = endpoint.trim_end_matches('/');
    let host_start = endpoint
        .find("://")
        .map(|i| i + 3)
        .filter(|&i| i < endpoint.len())
        .ok_or_else(|| {
            AzureBlobError::InvalidConnectionString(format!(
                "blob endpoint must be an absolute URL: {endpoint}"
            ))
        })?;

    Ok(match endpoint[host_start..].find('/') {
        Some(slash) => {
            let (origin, path) = endpoint.split_at(host_start + slash);
            (origin.to_string(), path.to_string())
        }
        None => (endpoint.to_string(), String::new()),
    })
}
