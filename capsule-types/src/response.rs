//! Responses: what the server hands back for a [`crate::command::Command`].

use serde_json::{Map, Value};

use crate::capsule::Capsule;
use crate::command::EvaluateVariant;
use crate::error::{ClientError, DecodeError, ProtocolError};
use crate::handle::HandleId;

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Handle {
        id: HandleId,
    },
    Evaluation {
        data: Capsule,
        variant: EvaluateVariant,
    },
    Empty,
    ErrorAccess {
        class: String,
        text: String,
    },
    ErrorAttribute {
        class: String,
        text: String,
    },
    ErrorOperation {
        class: String,
        text: String,
    },
    ErrorExecution {
        class: String,
        text: String,
    },
    /// Generic `error` serial: reserved for failures that do not fit the
    /// named taxonomy. `capsule-server` never produces this variant today
    /// (every server-side cause maps onto one of the four typed members of
    /// [`ProtocolError`]); it exists so the closed taxonomy has a safe
    /// fallback slot instead of silently upgrading an unrecognized error
    /// class.
    ErrorGeneric {
        class: String,
        text: String,
    },
}

impl Response {
    pub fn serial(&self) -> &'static str {
        match self {
            Response::Handle { .. } => "handle",
            Response::Evaluation { .. } => "evaluation",
            Response::Empty => "empty",
            Response::ErrorAccess { .. } => "error-access",
            Response::ErrorAttribute { .. } => "error-attribute",
            Response::ErrorOperation { .. } => "error-operation",
            Response::ErrorExecution { .. } => "error-execution",
            Response::ErrorGeneric { .. } => "error",
        }
    }

    /// Build the error-family response for a server-side [`ProtocolError`].
    pub fn from_protocol_error(error: &ProtocolError) -> Self {
        let class = error.class_name().to_string();
        let text = error.text().to_string();
        match error {
            ProtocolError::Access(_) => Response::ErrorAccess { class, text },
            ProtocolError::Attribute(_) => Response::ErrorAttribute { class, text },
            ProtocolError::Operation(_) => Response::ErrorOperation { class, text },
            ProtocolError::Execution(_) => Response::ErrorExecution { class, text },
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("serial".to_string(), Value::String(self.serial().to_string()));
        match self {
            Response::Handle { id } => {
                map.insert("id".to_string(), Value::String(id.to_hex()));
            }
            Response::Evaluation { data, variant } => {
                map.insert("data".to_string(), data.to_value());
                map.insert("variant".to_string(), Value::String(variant.as_str().to_string()));
            }
            Response::Empty => {}
            Response::ErrorAccess { class, text }
            | Response::ErrorAttribute { class, text }
            | Response::ErrorOperation { class, text }
            | Response::ErrorExecution { class, text }
            | Response::ErrorGeneric { class, text } => {
                map.insert("class".to_string(), Value::String(class.clone()));
                map.insert("text".to_string(), Value::String(text.clone()));
            }
        }
        Value::Object(map)
    }

    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let object = value
            .as_object()
            .ok_or_else(|| DecodeError::Malformed("response envelope must be a JSON object".into()))?;
        let serial = match object.get("serial") {
            None => return Err(DecodeError::MissingSerial),
            Some(Value::String(serial)) => serial.as_str(),
            Some(_) => return Err(DecodeError::Malformed("`serial` must be a string".into())),
        };

        match serial {
            "handle" => Ok(Response::Handle { id: field_id(object)? }),
            "evaluation" => {
                let variant_text = field_str(object, "variant")?;
                let variant = EvaluateVariant::parse(variant_text)
                    .ok_or_else(|| DecodeError::Malformed(format!("unknown evaluate variant `{variant_text}`")))?;
                let data = object
                    .get("data")
                    .ok_or_else(|| DecodeError::Malformed("expected field `data`".into()))?;
                Ok(Response::Evaluation { data: Capsule::from_value(data)?, variant })
            }
            "empty" => Ok(Response::Empty),
            "error-access" => Ok(Response::ErrorAccess { class: field_string(object, "class")?, text: field_string(object, "text")? }),
            "error-attribute" => Ok(Response::ErrorAttribute { class: field_string(object, "class")?, text: field_string(object, "text")? }),
            "error-operation" => Ok(Response::ErrorOperation { class: field_string(object, "class")?, text: field_string(object, "text")? }),
            "error-execution" => Ok(Response::ErrorExecution { class: field_string(object, "class")?, text: field_string(object, "text")? }),
            "error" => Ok(Response::ErrorGeneric { class: field_string(object, "class")?, text: field_string(object, "text")? }),
            other => Err(DecodeError::UnknownSerial(other.to_string())),
        }
    }

    /// Reconstitute a typed [`ClientError`] keyed by this response's
    /// `serial` tag; `None` for non-error responses. The `class` string is
    /// carried through as an informational field only — it never drives
    /// dynamic lookup.
    pub fn as_client_error(&self) -> Option<ClientError> {
        match self {
            Response::ErrorAccess { class, text } => Some(ClientError::Access { class: class.clone(), text: text.clone() }),
            Response::ErrorAttribute { class, text } => Some(ClientError::Attribute { class: class.clone(), text: text.clone() }),
            Response::ErrorOperation { class, text } => Some(ClientError::Operation { class: class.clone(), text: text.clone() }),
            Response::ErrorExecution { class, text } => Some(ClientError::Execution { class: class.clone(), text: text.clone() }),
            Response::ErrorGeneric { class, text } => Some(ClientError::Generic { class: class.clone(), text: text.clone() }),
            Response::Handle { .. } | Response::Evaluation { .. } | Response::Empty => None,
        }
    }
}

fn field_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, DecodeError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::Malformed(format!("expected string field `{key}`")))
}

fn field_string(object: &Map<String, Value>, key: &str) -> Result<String, DecodeError> {
    field_str(object, key).map(str::to_string)
}

fn field_id(object: &Map<String, Value>) -> Result<HandleId, DecodeError> {
    HandleId::parse_hex(field_str(object, "id")?)
}
