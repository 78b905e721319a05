//! # Request Metadata
//!
//! Converts user-supplied header strings (each in `"Header-Name: Header-Value"`
//! form) into an ordered multimap and from there into a
//! [`tonic::metadata::MetadataMap`].
//!
//! Header names are case-folded to lowercase; a string without a colon yields an
//! empty value. Binary headers (names ending in `-bin`) are expected to be
//! base64-encoded, but any of the common flavors is accepted; a value that fails
//! to decode in all of them is kept as-is rather than rejected, so a malformed
//! header never aborts an otherwise-valid call.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use indexmap::IndexMap;
use tonic::metadata::errors::{InvalidMetadataKey, InvalidMetadataValue};
use tonic::metadata::{Ascii, Binary, MetadataKey, MetadataMap, MetadataValue};

/// Reserved suffix marking a header as binary-valued.
pub const BINARY_SUFFIX: &str = "-bin";

/// A single parsed header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Ascii(String),
    Binary(Vec<u8>),
}

/// Errors raised while converting parsed headers into gRPC metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidKey {
        key: String,
        #[source]
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidValue {
        key: String,
        #[source]
        source: InvalidMetadataValue,
    },
}

/// Parses header strings into an ordered name → values multimap.
///
/// Empty strings are skipped. Names are trimmed and lowercased, values trimmed.
/// For `-bin` names the value is base64-decoded leniently via [`decode_lenient`].
pub fn metadata_from_headers<I, S>(headers: I) -> IndexMap<String, Vec<HeaderValue>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed: IndexMap<String, Vec<HeaderValue>> = IndexMap::new();

    for header in headers {
        let header = header.as_ref();
        if header.is_empty() {
            continue;
        }

        let (name, value) = header.split_once(':').unwrap_or((header, ""));
        let name = name.trim().to_lowercase();
        let value = value.trim();

        let value = if name.ends_with(BINARY_SUFFIX) {
            match decode_lenient(value) {
                Some(bytes) => HeaderValue::Binary(bytes),
                None => HeaderValue::Binary(value.as_bytes().to_vec()),
            }
        } else {
            HeaderValue::Ascii(value.to_string())
        };

        parsed.entry(name).or_default().push(value);
    }

    parsed
}

/// Tries the base64 flavors in a fixed order: standard, URL-safe, then both
/// unpadded variants. `None` if the value decodes in none of them.
pub fn decode_lenient(value: &str) -> Option<Vec<u8>> {
    for engine in [&STANDARD, &URL_SAFE, &STANDARD_NO_PAD, &URL_SAFE_NO_PAD] {
        if let Ok(bytes) = engine.decode(value) {
            return Some(bytes);
        }
    }
    None
}

/// Builds a [`MetadataMap`] from the parsed multimap, appending every value
/// under its (already lowercased) name.
pub fn to_metadata_map(
    headers: &IndexMap<String, Vec<HeaderValue>>,
) -> Result<MetadataMap, MetadataError> {
    let mut map = MetadataMap::new();

    for (name, values) in headers {
        for value in values {
            match value {
                HeaderValue::Ascii(text) => {
                    let key: MetadataKey<Ascii> =
                        name.parse().map_err(|source| MetadataError::InvalidKey {
                            key: name.clone(),
                            source,
                        })?;
                    let value: MetadataValue<Ascii> =
                        text.parse().map_err(|source| MetadataError::InvalidValue {
                            key: name.clone(),
                            source,
                        })?;
                    map.append(key, value);
                }
                HeaderValue::Binary(bytes) => {
                    let key: MetadataKey<Binary> =
                        name.parse().map_err(|source| MetadataError::InvalidKey {
                            key: name.clone(),
                            source,
                        })?;
                    map.append_bin(key, MetadataValue::from_bytes(bytes));
                }
            }
        }
    }

    Ok(map)
}

/// Splits a single `"Name: Value"` header string for plain HTTP use.
///
/// Same folding rules as [`metadata_from_headers`], without the binary handling.
pub fn split_header(header: &str) -> (String, String) {
    let (name, value) = header.split_once(':').unwrap_or((header, ""));
    (name.trim().to_lowercase(), value.trim().to_string())
}
