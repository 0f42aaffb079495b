use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/messages`.
///
/// Fields are kept as raw JSON so whatever the client sent reaches the store
/// untouched. Keys the client left out are not forwarded at all.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CreateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl CreateRequest {
    pub fn new(
        chat_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        CreateRequest {
            chat_id: Some(Value::String(chat_id.into())),
            user_id: Some(Value::String(user_id.into())),
            content: Some(Value::String(content.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_keys_are_not_forwarded() {
        let request: CreateRequest =
            serde_json::from_value(json!({ "chat_id": "c1", "content": 42 })).unwrap();

        assert_eq!(request.user_id, None);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "chat_id": "c1", "content": 42 })
        );
    }

    #[test]
    fn explicit_null_reads_as_absent() {
        let request: CreateRequest =
            serde_json::from_value(json!({ "chat_id": null })).unwrap();

        assert_eq!(request, CreateRequest::default());
    }
}
