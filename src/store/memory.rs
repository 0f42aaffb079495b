use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use shared::{api::message::CreateRequest, models::chat_message::ChatMessage};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{to_records, MessageRow, MessageStore, StoreError};

/// Keeps messages in process memory. Used for local runs without a hosted
/// database.
#[derive(Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<ChatMessage>>,
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Value>, StoreError> {
        let mut messages: Vec<ChatMessage> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|message| message.chat_id == chat_id)
            .cloned()
            .collect();

        // stable, so equal timestamps keep insertion order
        messages.sort_by_key(|message| message.created_at);

        to_records(messages)
    }

    async fn insert_message(&self, message: CreateRequest) -> Result<Vec<Value>, StoreError> {
        let row = MessageRow::try_from(message)?;

        let message = ChatMessage {
            id: Some(Uuid::new_v4().to_string()),
            chat_id: row.chat_id,
            user_id: row.user_id,
            content: row.content,
            created_at: Utc::now(),
        };

        self.messages.write().await.push(message.clone());

        to_records(vec![message])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[actix_web::test]
    async fn unknown_chat_is_empty() {
        let store = MemoryStore::default();

        assert!(store.list_messages("nope").await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn lists_one_chat_oldest_first() {
        let store = MemoryStore::default();

        for (chat, content) in [("c1", "a"), ("c2", "x"), ("c1", "b"), ("c1", "c")] {
            store
                .insert_message(CreateRequest::new(chat, "u1", content))
                .await
                .unwrap();
        }

        // shuffle timestamps so ordering has to come from the sort
        {
            let mut messages = store.messages.write().await;
            let base = Utc::now();
            messages[0].created_at = base + Duration::seconds(30);
            messages[2].created_at = base + Duration::seconds(10);
            messages[3].created_at = base + Duration::seconds(20);
        }

        let contents: Vec<Value> = store
            .list_messages("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|message| message["content"].clone())
            .collect();

        assert_eq!(contents, ["b", "c", "a"]);
    }

    #[actix_web::test]
    async fn insert_assigns_id() {
        let store = MemoryStore::default();

        let inserted = store
            .insert_message(CreateRequest::new("c1", "u1", "hello"))
            .await
            .unwrap();

        assert_eq!(inserted.len(), 1);
        assert!(inserted[0]["id"].is_string());
        assert_eq!(inserted[0]["content"], "hello");
        assert_eq!(store.list_messages("c1").await.unwrap(), inserted);
    }

    #[actix_web::test]
    async fn insert_rejects_missing_content() {
        let store = MemoryStore::default();

        let mut request = CreateRequest::new("c1", "u1", "hello");
        request.content = None;

        assert!(matches!(
            store.insert_message(request).await,
            Err(StoreError::Constraint(_))
        ));
        assert!(store.list_messages("c1").await.unwrap().is_empty());
    }
}
