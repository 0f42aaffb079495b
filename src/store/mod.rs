use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::{api::message::CreateRequest, models::chat_message::ChatMessage};
use thiserror::Error;

use crate::config::StoreConfig;

pub mod memory;
pub mod mongo;
pub mod supabase;

pub const MESSAGES_TABLE: &str = "messages";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The remote store answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("{0}")]
    Constraint(String),

    #[error("{0}")]
    Encode(#[from] serde_json::Error),
}

/// The persistence service behind the message endpoints.
///
/// Records are the store's own JSON rows and are handed to the client as-is.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All message records of `chat_id`, oldest first.
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Value>, StoreError>;

    /// Inserts one message and returns the stored record(s).
    async fn insert_message(&self, message: CreateRequest) -> Result<Vec<Value>, StoreError>;
}

/// Records for backends that keep messages in the `ChatMessage` shape.
fn to_records(messages: Vec<ChatMessage>) -> Result<Vec<Value>, StoreError> {
    messages
        .into_iter()
        .map(|message| serde_json::to_value(message).map_err(StoreError::from))
        .collect()
}

pub async fn connect(config: &StoreConfig) -> anyhow::Result<Arc<dyn MessageStore>> {
    let store: Arc<dyn MessageStore> = match config {
        StoreConfig::Supabase { url, key } => Arc::new(supabase::SupabaseStore::new(url, key)?),
        StoreConfig::MongoDb { uri, database } => {
            Arc::new(mongo::MongoStore::init(uri, database).await?)
        }
        StoreConfig::Memory => Arc::new(memory::MemoryStore::default()),
    };

    Ok(store)
}

/// Text columns of a message row, coerced the way a `text NOT NULL` column
/// accepts JSON input.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub chat_id: String,
    pub user_id: String,
    pub content: String,
}

impl TryFrom<CreateRequest> for MessageRow {
    type Error = StoreError;

    fn try_from(request: CreateRequest) -> Result<Self, Self::Error> {
        Ok(MessageRow {
            chat_id: text_column("chat_id", request.chat_id)?,
            user_id: text_column("user_id", request.user_id)?,
            content: text_column("content", request.content)?,
        })
    }
}

fn text_column(column: &str, value: Option<Value>) -> Result<String, StoreError> {
    match value {
        None | Some(Value::Null) => Err(StoreError::Constraint(format!(
            "null value in column \"{column}\" of relation \"{MESSAGES_TABLE}\" violates not-null constraint"
        ))),
        Some(Value::String(text)) => Ok(text),
        Some(other) => Ok(other.to_string()),
    }
}
