use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    options::ClientOptions,
    Client, Collection,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{api::message::CreateRequest, models::chat_message::ChatMessage};

use super::{to_records, MessageRow, MessageStore, StoreError, MESSAGES_TABLE};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MessageDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime,
}

impl From<MessageDocument> for ChatMessage {
    fn from(value: MessageDocument) -> Self {
        ChatMessage {
            id: value.id.map(|id| id.to_hex()),
            chat_id: value.chat_id,
            user_id: value.user_id,
            content: value.content,
            created_at: chrono::DateTime::from_timestamp_millis(value.created_at.timestamp_millis())
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct MongoStore {
    messages: Collection<MessageDocument>,
}

impl MongoStore {
    pub async fn init(uri: &str, database: &str) -> anyhow::Result<Self> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;

        Ok(MongoStore {
            messages: client.database(database).collection(MESSAGES_TABLE),
        })
    }
}

#[async_trait]
impl MessageStore for MongoStore {
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Value>, StoreError> {
        tracing::debug!(chat_id, "listing messages");

        let messages = self
            .messages
            .find(doc! {
                "chat_id": chat_id
            })
            .sort(doc! {
                "created_at": 1
            })
            .await?
            .try_collect::<Vec<_>>()
            .await?;

        to_records(messages.into_iter().map(ChatMessage::from).collect())
    }

    async fn insert_message(&self, message: CreateRequest) -> Result<Vec<Value>, StoreError> {
        let row = MessageRow::try_from(message)?;

        let mut message = MessageDocument {
            id: None,
            chat_id: row.chat_id,
            user_id: row.user_id,
            content: row.content,
            created_at: DateTime::from_millis(Utc::now().timestamp_millis()),
        };

        let inserted = self.messages.insert_one(&message).await?;

        message.id = inserted.inserted_id.as_object_id();

        tracing::debug!(id = ?message.id, "inserted message");

        to_records(vec![message.into()])
    }
}
