use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ProtocolError, ProtocolResult};

/// Encode an object payload for the `data` form field.
pub fn encode_data(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a `data` field back into raw bytes.
pub fn decode_data(text: &str) -> ProtocolResult<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

/// Parse a decimal integer response body, as returned by `param-read`.
pub fn parse_integer(body: &str) -> ProtocolResult<i64> {
    body.trim()
        .parse()
        .map_err(|_| ProtocolError::InvalidInteger(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vectors() {
        assert_eq!(encode_data(b""), "");
        assert_eq!(encode_data(b"f"), "Zg==");
        assert_eq!(encode_data(&[0, 0, 0, 7]), "AAAABw==");
        assert_eq!(decode_data("Zm9vYg==").unwrap(), b"foob");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode_data("not base64!"), Err(ProtocolError::InvalidEncoding(_))));
        assert!(matches!(decode_data("Zg"), Err(ProtocolError::InvalidEncoding(_))));
    }

    #[test]
    fn integer_bodies() {
        assert_eq!(parse_integer("0").unwrap(), 0);
        assert_eq!(parse_integer("4611686018427387904\n").unwrap(), 1i64 << 62);
        assert_eq!(parse_integer("-3").unwrap(), -3);
        assert!(matches!(parse_integer("four"), Err(ProtocolError::InvalidInteger(_))));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode_data(&encode_data(&bytes)).unwrap(), bytes);
        }
    }
}
