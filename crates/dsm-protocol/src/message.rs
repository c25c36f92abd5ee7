//! Form-field request bodies, one struct per endpoint.
//!
//! Field names are the wire names. Both the HTTP client (serialize) and the
//! axum handlers (deserialize via `Form`) use these types.

use serde::{Deserialize, Serialize};

use crate::codec::{decode_data, encode_data};
use crate::error::{ProtocolError, ProtocolResult};

/// `create-object`: allocate `size` zero bytes under `name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateObjectForm {
    pub name: String,
    pub size: usize,
}

/// Requests that identify a single object or parameter slot by name:
/// `delete-object`, `mutex-register`, `mutex-delete`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameForm {
    pub name: String,
}

impl NameForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// `read-object`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadObjectForm {
    pub name: String,
    pub offset: usize,
    pub length: usize,
}

/// `write-object`: `length` must equal the decoded size of `data`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteObjectForm {
    pub name: String,
    pub offset: usize,
    pub length: usize,
    pub data: String,
}

impl WriteObjectForm {
    pub fn new(name: impl Into<String>, offset: usize, payload: &[u8]) -> Self {
        Self {
            name: name.into(),
            offset,
            length: payload.len(),
            data: encode_data(payload),
        }
    }

    /// Decode `data` and check it against the declared `length`.
    pub fn payload(&self) -> ProtocolResult<Vec<u8>> {
        let bytes = decode_data(&self.data)?;
        if bytes.len() != self.length {
            return Err(ProtocolError::LengthMismatch {
                declared: self.length,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }
}

/// `param-read`. `id` is the caller's ordinal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamReadForm {
    pub id: u32,
    pub name: String,
}

/// `param-write`: unconditional overwrite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamWriteForm {
    pub id: u32,
    pub name: String,
    pub value: i64,
}

/// `param-cas`: overwrite with `value` only if the slot holds `expected`.
///
/// When `token` is set, the server applies the swap at most once per
/// `(id, token)`, so a resend after a lost answer is safe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamCasForm {
    pub id: u32,
    pub name: String,
    pub expected: i64,
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_form_carries_length_and_base64() {
        let form = WriteObjectForm::new("counter", 4, &[1, 2, 3]);
        assert_eq!(form.length, 3);
        assert_eq!(form.data, "AQID");
        assert_eq!(form.payload().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn write_form_length_mismatch() {
        let mut form = WriteObjectForm::new("counter", 0, b"abcd");
        form.length = 5;
        assert_eq!(
            form.payload().unwrap_err(),
            ProtocolError::LengthMismatch { declared: 5, actual: 4 }
        );
    }

    #[test]
    fn empty_write_is_valid() {
        let form = WriteObjectForm::new("x", 0, b"");
        assert_eq!(form.data, "");
        assert!(form.payload().unwrap().is_empty());
    }

    #[test]
    fn cas_field_names() {
        let form = ParamCasForm {
            id: 2,
            name: "m".into(),
            expected: 0,
            value: 4,
            token: None,
        };
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["expected"], 0);
        assert_eq!(json["value"], 4);
        assert_eq!(json["id"], 2);
        assert!(json.get("token").is_none());

        let form: ParamCasForm =
            serde_json::from_str(r#"{"id":2,"name":"m","expected":0,"value":4,"token":9}"#).unwrap();
        assert_eq!(form.token, Some(9));
    }
}
