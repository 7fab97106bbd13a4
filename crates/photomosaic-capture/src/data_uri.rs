//! Data URI decoding for camera stills.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::CaptureError;

/// MIME type implied by a data URI with an empty media type.
const DEFAULT_DATA_URI_MIME: &str = "text/plain";

/// Decoded contents of a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Media type declared in the URI header.
    pub mime_type: String,
    /// Decoded payload bytes.
    pub bytes: Vec<u8>,
}

/// Decodes `data:<mime>[;base64],<payload>` into raw bytes.
///
/// Base64 payloads may contain ASCII whitespace. Payloads without the
/// `;base64` marker are taken as literal bytes.
///
/// # Errors
/// Returns [`CaptureError::InvalidDataUri`] when the scheme or the header
/// separator is missing, or when the base64 payload is invalid.
pub fn decode_data_uri(uri: &str) -> Result<DataUri, CaptureError> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| CaptureError::InvalidDataUri("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CaptureError::InvalidDataUri("missing ',' after header".to_string()))?;

    let mut segments = header.split(';');
    let mime_type = match segments.next().map(str::trim) {
        Some(mime) if !mime.is_empty() => mime.to_ascii_lowercase(),
        _ => DEFAULT_DATA_URI_MIME.to_string(),
    };
    let is_base64 = segments.any(|segment| segment.trim().eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(compact)
            .map_err(|error| CaptureError::InvalidDataUri(format!("invalid base64: {error}")))?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok(DataUri { mime_type, bytes })
}

/// Encodes bytes as a base64 data URI.
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    //! Unit tests for data URI parsing.

    use super::*;

    #[test]
    fn decodes_base64_jpeg_uri() {
        let decoded = decode_data_uri("data:image/jpeg;base64,/9j/AA==").unwrap();
        assert_eq!(decoded.mime_type, "image/jpeg");
        assert_eq!(decoded.bytes, vec![0xFF, 0xD8, 0xFF, 0x00]);
    }

    #[test]
    fn tolerates_whitespace_inside_base64_payload() {
        let decoded = decode_data_uri("data:image/png;base64,AQ\nID").unwrap();
        assert_eq!(decoded.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn keeps_literal_payloads_and_defaults_mime() {
        let decoded = decode_data_uri("data:,hello").unwrap();
        assert_eq!(decoded.mime_type, "text/plain");
        assert_eq!(decoded.bytes, b"hello".to_vec());
    }

    #[test]
    fn rejects_malformed_uris() {
        assert!(decode_data_uri("image/jpeg;base64,AAAA").is_err());
        assert!(decode_data_uri("data:image/jpeg;base64").is_err());
        assert!(decode_data_uri("data:image/jpeg;base64,@@@").is_err());
    }

    #[test]
    fn encode_then_decode_preserves_bytes() {
        let uri = encode_data_uri("image/jpeg", &[9, 8, 7]);
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(decode_data_uri(&uri).unwrap().bytes, vec![9, 8, 7]);
    }
}
