//! Capsules: typed value envelopes carrying either a primitive or a
//! server-owned object reference.

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::handle::HandleId;

/// A tagged wire value. One tag per primitive: `String` and `Unicode`
/// carry the same Rust representation but distinct wire tags, kept apart
/// because byte strings and text are distinct concepts on the wire even
/// though this codec represents both as a Rust `String`.
#[derive(Debug, Clone, PartialEq)]
pub enum Capsule {
    /// A reference to a server-owned object.
    Handle(HandleId),
    None,
    Integer(i64),
    String(String),
    Unicode(String),
    Boolean(bool),
    /// Ordered.
    List(Vec<Capsule>),
    /// Ordered.
    Tuple(Vec<Capsule>),
    /// Membership only; wire order is not a contract.
    Set(Vec<Capsule>),
    /// Membership only; wire order is not a contract. String keys only.
    Dictionary(Vec<(String, Capsule)>),
}

impl Capsule {
    pub fn serial(&self) -> &'static str {
        match self {
            Capsule::Handle(_) => "handle",
            Capsule::None => "none",
            Capsule::Integer(_) => "integer",
            Capsule::String(_) => "string",
            Capsule::Unicode(_) => "unicode",
            Capsule::Boolean(_) => "boolean",
            Capsule::List(_) => "list",
            Capsule::Tuple(_) => "tuple",
            Capsule::Set(_) => "set",
            Capsule::Dictionary(_) => "dictionary",
        }
    }

    pub fn integer(value: i64) -> Self {
        Capsule::Integer(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Capsule::String(value.into())
    }

    pub fn unicode(value: impl Into<String>) -> Self {
        Capsule::Unicode(value.into())
    }

    pub fn boolean(value: bool) -> Self {
        Capsule::Boolean(value)
    }

    pub fn list(items: impl IntoIterator<Item = Capsule>) -> Self {
        Capsule::List(items.into_iter().collect())
    }

    pub fn tuple(items: impl IntoIterator<Item = Capsule>) -> Self {
        Capsule::Tuple(items.into_iter().collect())
    }

    pub fn set(items: impl IntoIterator<Item = Capsule>) -> Self {
        Capsule::Set(items.into_iter().collect())
    }

    pub fn dictionary(entries: impl IntoIterator<Item = (String, Capsule)>) -> Self {
        Capsule::Dictionary(entries.into_iter().collect())
    }

    /// Encode into the string-keyed, JSON-compatible structured map that
    /// crosses the wire. The literal byte-level JSON text encoding of this
    /// value tree is an external concern (`serde_json`), not something
    /// this engine reimplements.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("serial".to_string(), Value::String(self.serial().to_string()));
        match self {
            Capsule::Handle(id) => {
                map.insert("id".to_string(), Value::String(id.to_hex()));
            }
            Capsule::None => {}
            Capsule::Integer(value) => {
                map.insert("data".to_string(), Value::from(*value));
            }
            Capsule::String(value) | Capsule::Unicode(value) => {
                map.insert("data".to_string(), Value::String(value.clone()));
            }
            Capsule::Boolean(value) => {
                map.insert("data".to_string(), Value::Bool(*value));
            }
            Capsule::List(items) | Capsule::Tuple(items) | Capsule::Set(items) => {
                let encoded: Vec<Value> = items.iter().map(Capsule::to_value).collect();
                map.insert("data".to_string(), Value::Array(encoded));
            }
            Capsule::Dictionary(entries) => {
                let mut encoded = Map::new();
                for (key, value) in entries {
                    encoded.insert(key.clone(), value.to_value());
                }
                map.insert("data".to_string(), Value::Object(encoded));
            }
        }
        Value::Object(map)
    }

    /// Decode a structured map back into a [`Capsule`], dispatching on the
    /// `serial` tag. This is the Capsule family's registry: a closed
    /// match, not an open lookup table.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let object = value
            .as_object()
            .ok_or_else(|| DecodeError::Malformed("capsule envelope must be a JSON object".into()))?;
        let serial = match object.get("serial") {
            None => return Err(DecodeError::MissingSerial),
            Some(Value::String(serial)) => serial.as_str(),
            Some(_) => return Err(DecodeError::Malformed("`serial` must be a string".into())),
        };

        match serial {
            "handle" => {
                let id = expect_str(object, "id")?;
                Ok(Capsule::Handle(HandleId::parse_hex(id)?))
            }
            "none" => Ok(Capsule::None),
            "integer" => Ok(Capsule::Integer(expect_i64(object, "data")?)),
            "string" => Ok(Capsule::String(expect_str(object, "data")?.to_string())),
            "unicode" => Ok(Capsule::Unicode(expect_str(object, "data")?.to_string())),
            "boolean" => Ok(Capsule::Boolean(expect_bool(object, "data")?)),
            "list" => Ok(Capsule::List(decode_items(object)?)),
            "tuple" => Ok(Capsule::Tuple(decode_items(object)?)),
            "set" => Ok(Capsule::Set(decode_items(object)?)),
            "dictionary" => Ok(Capsule::Dictionary(decode_entries(object)?)),
            other => Err(DecodeError::UnknownSerial(other.to_string())),
        }
    }
}

fn expect_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, DecodeError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::Malformed(format!("expected string field `{key}`")))
}

fn expect_i64(object: &Map<String, Value>, key: &str) -> Result<i64, DecodeError> {
    object
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| DecodeError::Malformed(format!("expected integer field `{key}`")))
}

fn expect_bool(object: &Map<String, Value>, key: &str) -> Result<bool, DecodeError> {
    object
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| DecodeError::Malformed(format!("expected boolean field `{key}`")))
}

fn decode_items(object: &Map<String, Value>) -> Result<Vec<Capsule>, DecodeError> {
    let array = object
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::Malformed("expected array field `data`".into()))?;
    array.iter().map(Capsule::from_value).collect()
}

fn decode_entries(object: &Map<String, Value>) -> Result<Vec<(String, Capsule)>, DecodeError> {
    let dict = object
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| DecodeError::Malformed("expected object field `data`".into()))?;
    dict.iter()
        .map(|(key, value)| Capsule::from_value(value).map(|capsule| (key.clone(), capsule)))
        .collect()
}

impl From<i64> for Capsule {
    fn from(value: i64) -> Self {
        Capsule::Integer(value)
    }
}

impl From<bool> for Capsule {
    fn from(value: bool) -> Self {
        Capsule::Boolean(value)
    }
}

impl From<&str> for Capsule {
    fn from(value: &str) -> Self {
        Capsule::String(value.to_string())
    }
}

impl From<String> for Capsule {
    fn from(value: String) -> Self {
        Capsule::String(value)
    }
}

impl From<()> for Capsule {
    fn from(_: ()) -> Self {
        Capsule::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_primitive() {
        let samples = vec![
            Capsule::Integer(42),
            Capsule::Integer(-1),
            Capsule::Boolean(true),
            Capsule::Boolean(false),
            Capsule::String(String::new()),
            Capsule::String("hi".into()),
            Capsule::Unicode("héllo".into()),
            Capsule::None,
            Capsule::List(vec![]),
            Capsule::List(vec![Capsule::Integer(1), Capsule::Integer(2)]),
            Capsule::Dictionary(vec![("qwe".into(), Capsule::Integer(30)), ("asd".into(), Capsule::Integer(40))]),
        ];
        for capsule in samples {
            let value = capsule.to_value();
            let decoded = Capsule::from_value(&value).expect("decodes");
            assert_eq!(decoded, capsule);
        }
    }

    #[test]
    fn missing_serial_is_rejected() {
        let value = serde_json::json!({"data": 1});
        assert_eq!(Capsule::from_value(&value), Err(DecodeError::MissingSerial));
    }

    #[test]
    fn unknown_serial_is_rejected() {
        let value = serde_json::json!({"serial": "nonsense"});
        assert_eq!(
            Capsule::from_value(&value),
            Err(DecodeError::UnknownSerial("nonsense".into()))
        );
    }

    #[test]
    fn boolean_does_not_round_trip_as_integer() {
        let value = Capsule::Boolean(true).to_value();
        assert_eq!(value.get("serial").unwrap(), "boolean");
        assert_ne!(Capsule::from_value(&value).unwrap(), Capsule::Integer(1));
    }

    #[test]
    fn nested_list_of_integers_round_trips() {
        let capsule = Capsule::list(vec![Capsule::integer(1), Capsule::list(vec![Capsule::integer(2), Capsule::integer(3)])]);
        let value = capsule.to_value();
        assert_eq!(Capsule::from_value(&value).unwrap(), capsule);
    }
}
