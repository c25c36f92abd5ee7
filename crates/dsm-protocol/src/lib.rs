//! Wire protocol for the DSM cluster.
//!
//! Every request is an HTTP POST whose body carries flat, form-encoded
//! fields. Object payloads travel as standard padded base64 in a `data`
//! field; integer answers travel as plain decimal text.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;

pub use codec::{decode_data, encode_data, parse_integer};
pub use endpoint::{endpoints, HEALTH_OK};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    CreateObjectForm, NameForm, ParamCasForm, ParamReadForm, ParamWriteForm, ReadObjectForm,
    WriteObjectForm,
};
