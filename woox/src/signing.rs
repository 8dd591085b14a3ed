//! Request signing for the WOO X v1 REST API.
//!
//! The server recomputes `hex(hmac_sha256(secret, "<sorted k=v&...>|<ts>"))`
//! over the request parameters and compares it byte-for-byte, so the
//! canonical parameter string is also what goes on the wire.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_SIGNATURE: &str = "x-api-signature";
pub const HEADER_TIMESTAMP: &str = "x-api-timestamp";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// API key pair for one account. Only ever held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_empty() || self.api_secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Serialize parameters as `k=v` pairs sorted by key and joined with `&`.
///
/// Values are used verbatim; this is the string covered by the signature.
pub fn canonical_params<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (i, (k, v)) in sorted_pairs(params).iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(k.as_ref());
        out.push('=');
        out.push_str(v.as_ref());
    }
    out
}

/// Same ordering as [`canonical_params`], form-urlencoded for the wire.
///
/// A server that form-decodes this string gets back exactly the pairs that
/// were signed.
pub fn query_string<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in sorted_pairs(params) {
        serializer.append_pair(k.as_ref(), v.as_ref());
    }
    serializer.finish()
}

fn sorted_pairs<I, K, V>(params: I) -> Vec<(K, V)>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = params.into_iter().collect();
    pairs.sort_by(|a, b| {
        a.0.as_ref()
            .cmp(b.0.as_ref())
            .then_with(|| a.1.as_ref().cmp(b.1.as_ref()))
    });
    pairs
}

/// Compute the lowercase hex HMAC-SHA256 signature for one request.
pub fn sign<I, K, V>(secret: &str, params: I, timestamp_ms: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let payload = format!("{}|{}", canonical_params(params), timestamp_ms);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Current unix time in milliseconds, formatted for `x-api-timestamp`.
pub fn timestamp_ms() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// Header set for one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub api_key: String,
    pub signature: String,
    pub timestamp: String,
}

impl SignedHeaders {
    /// `(name, value)` pairs ready to attach to a request.
    pub fn to_pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("content-type", FORM_CONTENT_TYPE),
            (HEADER_API_KEY, &self.api_key),
            (HEADER_SIGNATURE, &self.signature),
            (HEADER_TIMESTAMP, &self.timestamp),
        ]
    }
}

/// Sign `params` with a fresh timestamp.
pub fn auth_headers<K, V>(credentials: &Credentials, params: &[(K, V)]) -> SignedHeaders
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let timestamp = timestamp_ms();
    auth_headers_at(credentials, params, timestamp)
}

/// Sign `params` with an explicit timestamp.
pub fn auth_headers_at<K, V>(
    credentials: &Credentials,
    params: &[(K, V)],
    timestamp: String,
) -> SignedHeaders
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let signature = sign(
        &credentials.api_secret,
        params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())),
        &timestamp,
    );
    SignedHeaders {
        api_key: credentials.api_key.clone(),
        signature,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_params_sorted() {
        let params = [("start_t", "1"), ("page", "2"), ("end_t", "3")];
        assert_eq!(canonical_params(params), "end_t=3&page=2&start_t=1");
    }

    #[test]
    fn test_canonical_params_empty() {
        let params: [(&str, &str); 0] = [];
        assert_eq!(canonical_params(params), "");
    }

    #[test]
    fn test_query_string_matches_canonical_for_plain_values() {
        let params = [("start_t", "1"), ("pair", "SPOT_BTC_USDT"), ("end_t", "3")];
        assert_eq!(query_string(params), canonical_params(params));
    }

    #[test]
    fn test_query_string_encodes_reserved_characters() {
        let params = [("pair", "A+B&C=%D E"), ("page", "1")];
        assert_eq!(query_string(params), "page=1&pair=A%2BB%26C%3D%25D+E");

        let decoded: Vec<(String, String)> =
            url::form_urlencoded::parse(query_string(params).as_bytes())
                .into_owned()
                .collect();
        assert_eq!(
            decoded,
            vec![
                ("page".to_string(), "1".to_string()),
                ("pair".to_string(), "A+B&C=%D E".to_string()),
            ]
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::new("my-key", "my-secret");
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("my-key"));
        assert!(!dbg.contains("my-secret"));
    }

    #[test]
    fn test_credentials_is_empty() {
        assert!(Credentials::new("", "s").is_empty());
        assert!(Credentials::new("k", "").is_empty());
        assert!(!Credentials::new("k", "s").is_empty());
    }

    #[test]
    fn test_timestamp_ms_is_numeric() {
        let ts = timestamp_ms();
        assert!(ts.parse::<u64>().is_ok());
        assert_eq!(ts.len(), 13);
    }
}
