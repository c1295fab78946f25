//! Command execution: turning a decoded command into a response.
//!
//! [`execute`] is the one function that turns a [`Command`] into a
//! [`Response`] against a shared [`ObjectTable`]. Every failure path here
//! produces an error response; nothing escapes as a panic or an unwound
//! exception — no failure crashes the handler or the server.

use capsule_types::{Capsule, Command, ProtocolError, Response};

use crate::table::ObjectTable;
use crate::value::ServerValue;

pub fn execute(command: Command, table: &ObjectTable) -> Response {
    match try_execute(command, table) {
        Ok(response) => response,
        Err(error) => Response::from_protocol_error(&error),
    }
}

fn try_execute(command: Command, table: &ObjectTable) -> Result<Response, ProtocolError> {
    match command {
        Command::Fetch { name } => {
            let id = table.fetch(&name)?;
            Ok(Response::Handle { id })
        }
        Command::Store { data } => {
            let value = ServerValue::from_capsule(&data, table)?;
            Ok(Response::Handle { id: table.store(value) })
        }
        Command::AttributeGet { id, name } => {
            let target = table.access(id)?;
            let name = capsule_name(&name, table)?;
            let result = target.get_attr(&name)?;
            Ok(Response::Handle { id: table.store(result) })
        }
        Command::AttributeSet { id, name, value } => {
            let target = table.access(id)?;
            let name = capsule_name(&name, table)?;
            let value = ServerValue::from_capsule(&value, table)?;
            target.set_attr(&name, value)?;
            Ok(Response::Empty)
        }
        Command::ItemGet { id, name } => {
            let target = table.access(id)?;
            let key = ServerValue::from_capsule(&name, table)?;
            let result = target.get_item(&key)?;
            Ok(Response::Handle { id: table.store(result) })
        }
        Command::ItemSet { id, name, value } => {
            let target = table.access(id)?;
            let key = ServerValue::from_capsule(&name, table)?;
            let value = ServerValue::from_capsule(&value, table)?;
            target.set_item(key, value)?;
            Ok(Response::Empty)
        }
        Command::Operator { id, other, variant } => {
            let left = table.access(id)?;
            let right = ServerValue::from_capsule(&other, table)?;
            let variant = capsule_types::OperatorVariant::parse(&variant)
                .ok_or_else(|| ProtocolError::operation(format!("unknown operator variant `{variant}`")))?;
            let result = match variant {
                capsule_types::OperatorVariant::Equals => ServerValue::Boolean(left.equals(&right)?),
                capsule_types::OperatorVariant::Addition => left.add(&right)?,
            };
            Ok(Response::Handle { id: table.store(result) })
        }
        Command::Execute { id, args, kwargs } => {
            let callable = table.access(id)?;
            let args = match ServerValue::from_capsule(&args, table)? {
                ServerValue::Tuple(items) | ServerValue::List(items) => items,
                other => return Err(ProtocolError::execution(format!("`args` must be a tuple, got {other}"))),
            };
            let kwargs = match ServerValue::from_capsule(&kwargs, table)? {
                ServerValue::Dictionary(entries) => entries,
                other => return Err(ProtocolError::execution(format!("`kwargs` must be a dictionary, got {other}"))),
            };
            let result = callable.call(args, kwargs)?;
            Ok(Response::Handle { id: table.store(result) })
        }
        Command::Evaluate { id, variant } => {
            let value = table.access(id)?;
            let data = value.coerce(variant)?;
            Ok(Response::Evaluation { data, variant })
        }
        Command::Release { id } => {
            table.release(id)?;
            Ok(Response::Empty)
        }
    }
}

/// Attribute/item names travel as capsules too, so resolving one can
/// itself hit a stale handle and surface as an access error.
fn capsule_name(name: &Capsule, table: &ObjectTable) -> Result<String, ProtocolError> {
    match ServerValue::from_capsule(name, table)? {
        ServerValue::String(text) | ServerValue::Unicode(text) => Ok(text),
        other => Err(ProtocolError::attribute(format!("attribute name must be a string, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_types::EvaluateVariant;

    #[test]
    fn fetch_of_unknown_name_is_access_error() {
        let table = ObjectTable::new();
        let response = execute(Command::Fetch { name: "nope".into() }, &table);
        assert!(matches!(response, Response::ErrorAccess { .. }));
    }

    #[test]
    fn store_then_evaluate_round_trips_an_integer() {
        let table = ObjectTable::new();
        let Response::Handle { id } = execute(Command::Store { data: Capsule::integer(30) }, &table) else {
            panic!("expected handle response");
        };
        let response = execute(Command::Evaluate { id, variant: EvaluateVariant::Int }, &table);
        assert_eq!(response, Response::Evaluation { data: Capsule::integer(30), variant: EvaluateVariant::Int });
    }

    #[test]
    fn release_then_access_is_access_error() {
        let table = ObjectTable::new();
        let Response::Handle { id } = execute(Command::Store { data: Capsule::integer(1) }, &table) else {
            panic!("expected handle response");
        };
        assert_eq!(execute(Command::Release { id }, &table), Response::Empty);
        let response = execute(Command::Release { id }, &table);
        assert!(matches!(response, Response::ErrorAccess { .. }));
        let response = execute(Command::Evaluate { id, variant: EvaluateVariant::Int }, &table);
        assert!(matches!(response, Response::ErrorAccess { .. }));
    }

    #[test]
    fn known_operator_variant_succeeds() {
        let table = ObjectTable::new();
        let Response::Handle { id } = execute(Command::Store { data: Capsule::integer(1) }, &table) else {
            panic!("expected handle response");
        };
        let response = execute(
            Command::Operator { id, other: Capsule::integer(1), variant: "addition".to_string() },
            &table,
        );
        assert!(matches!(response, Response::Handle { .. }));
    }

    #[test]
    fn unknown_operator_variant_is_an_operation_error() {
        let table = ObjectTable::new();
        let Response::Handle { id } = execute(Command::Store { data: Capsule::integer(1) }, &table) else {
            panic!("expected handle response");
        };
        let response = execute(
            Command::Operator { id, other: Capsule::integer(1), variant: "subtraction".to_string() },
            &table,
        );
        assert!(matches!(response, Response::ErrorOperation { .. }));
    }
}
