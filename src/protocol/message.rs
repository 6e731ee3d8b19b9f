//! # Message Envelope
//!
//! A message is a `(controller, action, params)` triple carried as a
//! three-key object `{ "c": Int, "a": Int, "p": SFSObject }`.

use serde::Serialize;

use crate::core::{Field, SFSObject, TypeCode};
use crate::error::{ProtocolError, Result};
use crate::protocol::constants::{ControllerId, SysAction};

pub const KEY_CONTROLLER: &str = "c";
pub const KEY_ACTION: &str = "a";
pub const KEY_PARAMS: &str = "p";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Message {
    pub controller: i32,
    pub action: i32,
    pub params: SFSObject,
}

impl Message {
    pub fn new(controller: i32, action: i32, params: SFSObject) -> Self {
        Self {
            controller,
            action,
            params,
        }
    }

    /// System keep-alive request.
    pub fn ping() -> Self {
        Self::new(ControllerId::SYSTEM, SysAction::PING_PONG, SFSObject::new())
    }

    /// Routing key used by the dispatcher.
    pub fn route(&self) -> (i32, i32) {
        (self.controller, self.action)
    }

    /// Builds the `{c, a, p}` envelope, in that key order.
    pub fn to_sfs_object(&self) -> SFSObject {
        let mut obj = SFSObject::with_capacity(3);
        obj.put_int(KEY_CONTROLLER, self.controller)
            .put_int(KEY_ACTION, self.action)
            .put_sfs_object(KEY_PARAMS, self.params.clone());
        obj
    }

    /// Consuming variant of [`Message::to_sfs_object`].
    pub fn into_sfs_object(self) -> SFSObject {
        let mut obj = SFSObject::with_capacity(3);
        obj.put_int(KEY_CONTROLLER, self.controller)
            .put_int(KEY_ACTION, self.action)
            .put_sfs_object(KEY_PARAMS, self.params);
        obj
    }

    /// Extracts a message from a decoded envelope.
    ///
    /// Absent keys default to 0 and an empty object. `c` and `a` may be any
    /// integer kind up to 32 bits.
    pub fn from_sfs_object(mut obj: SFSObject) -> Result<Self> {
        let controller = id_field(obj.get_field(KEY_CONTROLLER))?;
        let action = id_field(obj.get_field(KEY_ACTION))?;
        let params = match obj.remove(KEY_PARAMS) {
            None => SFSObject::new(),
            Some(Field::Object(params)) => params,
            Some(other) => {
                return Err(ProtocolError::TypeMismatch {
                    expected: TypeCode::SfsObject,
                    found: other.type_code(),
                })
            }
        };
        Ok(Self::new(controller, action, params))
    }
}

fn id_field(field: Option<&Field>) -> Result<i32> {
    match field {
        None => Ok(0),
        Some(Field::Byte(v)) => Ok(i32::from(*v)),
        Some(Field::Short(v)) => Ok(i32::from(*v)),
        Some(Field::Int(v)) => Ok(*v),
        Some(other) => Err(ProtocolError::TypeMismatch {
            expected: TypeCode::Int,
            found: other.type_code(),
        }),
    }
}

impl From<Message> for SFSObject {
    fn from(msg: Message) -> Self {
        msg.into_sfs_object()
    }
}

impl TryFrom<SFSObject> for Message {
    type Error = ProtocolError;

    fn try_from(obj: SFSObject) -> Result<Self> {
        Message::from_sfs_object(obj)
    }
}
