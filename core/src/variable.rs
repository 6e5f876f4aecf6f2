//! Process variables.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::load::{self, Load};

/// A typed variable value as returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub value: Value,
    /// Engine type name, e.g. `String`, `Integer`, `Json`, `Object`.
    pub value_type: String,
    pub value_info: Option<Map<String, Value>>,
}

impl Load for Variable {
    fn load(data: &Value) -> Result<Self> {
        let data = load::object(data)?;
        Ok(Self {
            value: load::required(data, "value")?,
            value_type: load::required(data, "type")?,
            value_info: load::optional(data, "valueInfo")?,
        })
    }
}

/// Result of fetching a single variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Typed(Variable),
    /// Raw content of a `Bytes` or `File` variable.
    Binary(Vec<u8>),
}

/// A variable value to write.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInput {
    pub value: Value,
    pub value_type: Option<String>,
    pub value_info: Option<Map<String, Value>>,
}

impl VariableInput {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            value_type: None,
            value_info: None,
        }
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn with_value_info(mut self, value_info: Map<String, Value>) -> Self {
        self.value_info = Some(value_info);
        self
    }

    /// Type name sent to the engine. A `null` value without an explicit type
    /// is sent as `Null`; otherwise an unset type lets the engine infer it.
    pub fn wire_type(&self) -> Option<&str> {
        match (&self.value_type, &self.value) {
            (Some(t), _) => Some(t.as_str()),
            (None, Value::Null) => Some("Null"),
            (None, _) => None,
        }
    }

    /// Wire form `{"value", "type", "valueInfo"}`. `value` is copied verbatim;
    /// `type` and `valueInfo` appear only when set.
    pub fn to_json(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("value".to_string(), self.value.clone());
        if let Some(value_type) = self.wire_type() {
            fields.insert("type".to_string(), Value::from(value_type));
        }
        if let Some(value_info) = &self.value_info {
            fields.insert("valueInfo".to_string(), Value::Object(value_info.clone()));
        }
        Value::Object(fields)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;

    #[test]
    fn loads_variable_with_value_info() {
        let variable = Variable::load(&json!({
            "value": "{\"amount\": 30}",
            "type": "Object",
            "valueInfo": {"objectTypeName": "com.example.Order", "serializationDataFormat": "application/json"}
        }))
        .unwrap();
        assert_eq!(variable.value_type, "Object");
        assert_eq!(variable.value_info.unwrap()["objectTypeName"], "com.example.Order");
    }

    #[test]
    fn value_info_is_optional_but_value_is_not() {
        let variable = Variable::load(&json!({"value": null, "type": "Null"})).unwrap();
        assert_eq!(variable.value, Value::Null);
        assert_eq!(variable.value_info, None);

        assert!(matches!(Variable::load(&json!({"type": "String"})), Err(Error::MissingField("value"))));
    }

    #[test]
    fn input_wire_form() {
        assert_eq!(
            VariableInput::new(42).with_type("Integer").to_json(),
            json!({"value": 42, "type": "Integer"})
        );
        assert_eq!(VariableInput::new(Value::Null).to_json(), json!({"value": null, "type": "Null"}));
        assert_eq!(VariableInput::new("x").to_json(), json!({"value": "x"}));
    }

    #[test]
    fn wire_type_defaults_only_for_null() {
        assert_eq!(VariableInput::new(Value::Null).wire_type(), Some("Null"));
        assert_eq!(VariableInput::new(Value::Null).with_type("String").wire_type(), Some("String"));
        assert_eq!(VariableInput::new(1).wire_type(), None);
    }

    #[test]
    fn json_value_keeps_nulls_and_empty_objects() {
        let nested = json!({"a": null, "b": 1});
        assert_eq!(VariableInput::new(nested.clone()).with_type("Json").to_json()["value"], nested);
        assert_eq!(VariableInput::new(json!({})).to_json(), json!({"value": {}}));
    }
}
