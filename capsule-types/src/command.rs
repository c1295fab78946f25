//! Commands: operations a client may request of the server.
//!
//! A [`Command`] only knows how to encode/decode itself. Executing one
//! against a live object table is `capsule-server`'s job — keeping that
//! out of this crate keeps the wire data model shared, dependency-free
//! cruft, usable from both the client and the server side.

use serde_json::{Map, Value};

use crate::capsule::Capsule;
use crate::error::DecodeError;
use crate::handle::HandleId;

/// `operator` command variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorVariant {
    Equals,
    Addition,
}

impl OperatorVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorVariant::Equals => "equals",
            OperatorVariant::Addition => "addition",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "equals" => Some(OperatorVariant::Equals),
            "addition" => Some(OperatorVariant::Addition),
            _ => None,
        }
    }
}

/// `evaluate` command variant. Echoed back in the
/// [`crate::response::Response::Evaluation`] response as a hint to the
/// client about which capsule family to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluateVariant {
    Int,
    Str,
    Bool,
    Unicode,
    List,
}

impl EvaluateVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            EvaluateVariant::Int => "int",
            EvaluateVariant::Str => "str",
            EvaluateVariant::Bool => "bool",
            EvaluateVariant::Unicode => "unicode",
            EvaluateVariant::List => "list",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "int" => Some(EvaluateVariant::Int),
            "str" => Some(EvaluateVariant::Str),
            "bool" => Some(EvaluateVariant::Bool),
            "unicode" => Some(EvaluateVariant::Unicode),
            "list" => Some(EvaluateVariant::List),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fetch {
        name: String,
    },
    Store {
        data: Capsule,
    },
    AttributeGet {
        id: HandleId,
        name: Capsule,
    },
    AttributeSet {
        id: HandleId,
        name: Capsule,
        value: Capsule,
    },
    ItemGet {
        id: HandleId,
        name: Capsule,
    },
    ItemSet {
        id: HandleId,
        name: Capsule,
        value: Capsule,
    },
    /// `variant` is carried as the raw wire string rather than a parsed
    /// [`OperatorVariant`]: an unrecognized operator is a legitimate
    /// `operation-error` response, not an envelope decode failure, so
    /// parsing is deferred to whoever executes the command.
    Operator {
        id: HandleId,
        other: Capsule,
        variant: String,
    },
    /// `args` is always a [`Capsule::Tuple`], `kwargs` always a
    /// [`Capsule::Dictionary`], on both the encode and the decode side.
    Execute {
        id: HandleId,
        args: Capsule,
        kwargs: Capsule,
    },
    Evaluate {
        id: HandleId,
        variant: EvaluateVariant,
    },
    Release {
        id: HandleId,
    },
}

impl Command {
    pub fn serial(&self) -> &'static str {
        match self {
            Command::Fetch { .. } => "fetch",
            Command::Store { .. } => "store",
            Command::AttributeGet { .. } => "attribute-get",
            Command::AttributeSet { .. } => "attribute-set",
            Command::ItemGet { .. } => "item-get",
            Command::ItemSet { .. } => "item-set",
            Command::Operator { .. } => "operator",
            Command::Execute { .. } => "execute",
            Command::Evaluate { .. } => "evaluate",
            Command::Release { .. } => "release",
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("serial".to_string(), Value::String(self.serial().to_string()));
        match self {
            Command::Fetch { name } => {
                map.insert("name".to_string(), Value::String(name.clone()));
            }
            Command::Store { data } => {
                map.insert("data".to_string(), data.to_value());
            }
            Command::AttributeGet { id, name } | Command::ItemGet { id, name } => {
                map.insert("id".to_string(), Value::String(id.to_hex()));
                map.insert("name".to_string(), name.to_value());
            }
            Command::AttributeSet { id, name, value } | Command::ItemSet { id, name, value } => {
                map.insert("id".to_string(), Value::String(id.to_hex()));
                map.insert("name".to_string(), name.to_value());
                map.insert("value".to_string(), value.to_value());
            }
            Command::Operator { id, other, variant } => {
                map.insert("id".to_string(), Value::String(id.to_hex()));
                map.insert("other".to_string(), other.to_value());
                map.insert("variant".to_string(), Value::String(variant.clone()));
            }
            Command::Execute { id, args, kwargs } => {
                map.insert("id".to_string(), Value::String(id.to_hex()));
                map.insert("args".to_string(), args.to_value());
                map.insert("kwargs".to_string(), kwargs.to_value());
            }
            Command::Evaluate { id, variant } => {
                map.insert("id".to_string(), Value::String(id.to_hex()));
                map.insert("variant".to_string(), Value::String(variant.as_str().to_string()));
            }
            Command::Release { id } => {
                map.insert("id".to_string(), Value::String(id.to_hex()));
            }
        }
        Value::Object(map)
    }

    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let object = value
            .as_object()
            .ok_or_else(|| DecodeError::Malformed("command envelope must be a JSON object".into()))?;
        let serial = match object.get("serial") {
            None => return Err(DecodeError::MissingSerial),
            Some(Value::String(serial)) => serial.as_str(),
            Some(_) => return Err(DecodeError::Malformed("`serial` must be a string".into())),
        };

        match serial {
            "fetch" => Ok(Command::Fetch { name: field_str(object, "name")?.to_string() }),
            "store" => Ok(Command::Store { data: field_capsule(object, "data")? }),
            "attribute-get" => Ok(Command::AttributeGet { id: field_id(object)?, name: field_capsule(object, "name")? }),
            "item-get" => Ok(Command::ItemGet { id: field_id(object)?, name: field_capsule(object, "name")? }),
            "attribute-set" => Ok(Command::AttributeSet {
                id: field_id(object)?,
                name: field_capsule(object, "name")?,
                value: field_capsule(object, "value")?,
            }),
            "item-set" => Ok(Command::ItemSet {
                id: field_id(object)?,
                name: field_capsule(object, "name")?,
                value: field_capsule(object, "value")?,
            }),
            "operator" => Ok(Command::Operator {
                id: field_id(object)?,
                other: field_capsule(object, "other")?,
                variant: field_str(object, "variant")?.to_string(),
            }),
            "execute" => Ok(Command::Execute {
                id: field_id(object)?,
                args: field_capsule(object, "args")?,
                kwargs: field_capsule(object, "kwargs")?,
            }),
            "evaluate" => {
                let variant_text = field_str(object, "variant")?;
                let variant = EvaluateVariant::parse(variant_text)
                    .ok_or_else(|| DecodeError::Malformed(format!("unknown evaluate variant `{variant_text}`")))?;
                Ok(Command::Evaluate { id: field_id(object)?, variant })
            }
            "release" => Ok(Command::Release { id: field_id(object)? }),
            other => Err(DecodeError::UnknownSerial(other.to_string())),
        }
    }
}

fn field_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, DecodeError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::Malformed(format!("expected string field `{key}`")))
}

fn field_id(object: &Map<String, Value>) -> Result<HandleId, DecodeError> {
    HandleId::parse_hex(field_str(object, "id")?)
}

fn field_capsule(object: &Map<String, Value>, key: &str) -> Result<Capsule, DecodeError> {
    let value = object
        .get(key)
        .ok_or_else(|| DecodeError::Malformed(format!("expected field `{key}`")))?;
    Capsule::from_value(value)
}
