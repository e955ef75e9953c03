use crate::{
    domain::UserMemeRepository,
    errors::RepoError,
    models::{NewUserMeme, UserMeme},
};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client as DynamoDbClient};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{self, info};
use uuid::Uuid;

/// Global secondary index over `user_id`, created at startup.
pub const OWNER_INDEX: &str = "user_id-index";

#[derive(Debug, Clone)]
pub struct DynamoDbUserMemeRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoDbUserMemeRepository {
    /// Creates a new repository instance configured for a specific table.
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoDbUserMemeRepository");
        Self { client, table_name }
    }
}

#[async_trait]
impl UserMemeRepository for DynamoDbUserMemeRepository {
    /// Stores a `UserMeme` using PutItem; id and timestamp are assigned here.
    async fn create(&self, meme: NewUserMeme) -> Result<UserMeme, RepoError> {
        let meme = UserMeme {
            id: Uuid::new_v4(),
            user_id: meme.user_id,
            image_url: meme.image_url,
            caption: meme.caption,
            created_at: Utc::now(),
        };

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(meme_to_item(&meme)))
            .send()
            .await
            .context(format!("DynamoDB (table: {}): Failed to put meme (id: {})", self.table_name, meme.id))
            .map_err(RepoError::BackendError)?;

        tracing::debug!(meme_id = %meme.id, user_id = %meme.user_id, "DynamoDB: Stored user meme");
        Ok(meme)
    }

    /// Queries the owner index, following LastEvaluatedKey until exhausted.
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<UserMeme>, RepoError> {
        tracing::debug!(%user_id, "DynamoDB: Querying '{}' for user memes", self.table_name);
        let mut memes: Vec<UserMeme> = Vec::new();
        let mut last_evaluated_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let resp = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(OWNER_INDEX)
                .key_condition_expression("user_id = :uid")
                .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
                .set_exclusive_start_key(last_evaluated_key.take())
                .send()
                .await
                .context(format!("DynamoDB: Failed to query table '{}' for user {}", self.table_name, user_id))
                .map_err(RepoError::BackendError)?;

            for item in resp.items.unwrap_or_default() {
                match item_to_meme(&item) {
                    Some(meme) => memes.push(meme),
                    None => {
                        let item_id = item.get("meme_id").and_then(|v| v.as_s().ok());
                        tracing::error!(item.id = ?item_id, table_name = %self.table_name, "DynamoDB: Failed to parse item into UserMeme");
                        return Err(RepoError::DataCorruption(format!(
                            "DynamoDB: Failed to parse item {:?} from table '{}'",
                            item_id, self.table_name
                        )));
                    }
                }
            }

            last_evaluated_key = resp.last_evaluated_key;
            if last_evaluated_key.is_none() {
                break;
            }
            tracing::debug!("DynamoDB Query (table: {}): Continuing with LastEvaluatedKey...", self.table_name);
        }

        info!(%user_id, count = memes.len(), "DynamoDB: Listed user memes");
        Ok(memes)
    }
}

fn meme_to_item(meme: &UserMeme) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("meme_id".to_string(), AttributeValue::S(meme.id.to_string())),
        ("user_id".to_string(), AttributeValue::S(meme.user_id.clone())),
        ("image_url".to_string(), AttributeValue::S(meme.image_url.clone())),
        ("caption".to_string(), AttributeValue::S(meme.caption.clone())),
        ("created_at".to_string(), AttributeValue::S(meme.created_at.to_rfc3339())),
    ])
}

fn item_to_meme(item: &HashMap<String, AttributeValue>) -> Option<UserMeme> {
    let id = item
        .get("meme_id")?
        .as_s()
        .ok()
        .and_then(|s| Uuid::parse_str(s).ok())?;
    let user_id = item.get("user_id")?.as_s().ok()?.to_string();
    let image_url = item.get("image_url")?.as_s().ok()?.to_string();
    let caption = item.get("caption")?.as_s().ok()?.to_string();
    let created_at = item
        .get("created_at")?
        .as_s()
        .ok()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?
        .with_timezone(&Utc);

    Some(UserMeme {
        id,
        user_id,
        image_url,
        caption,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> UserMeme {
        UserMeme {
            id: Uuid::new_v4(),
            user_id: "uid-123".into(),
            image_url: "https://i.ibb.co/xyz/cat.png".into(),
            caption: "No caption provided".into(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn item_conversion_preserves_fields() {
        let meme = sample();
        assert_eq!(item_to_meme(&meme_to_item(&meme)), Some(meme));
    }

    #[test]
    fn malformed_items_are_rejected() {
        let mut item = meme_to_item(&sample());
        item.insert("created_at".into(), AttributeValue::S("yesterday".into()));
        assert_eq!(item_to_meme(&item), None);

        let mut item = meme_to_item(&sample());
        item.remove("user_id");
        assert_eq!(item_to_meme(&item), None);
    }
}
