use crate::model::OrderRecord;
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use queue_framework::{PersistenceError, RecordStore};
use serde::ser::Error as _;
use serde_json::Value;
use std::collections::HashMap;

/// A DynamoDB table keyed by `order_id`.
///
/// `PutItem` replaces the whole item for an existing key, which gives the overwrite semantics
/// [`RecordStore`] requires.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// The item written for an order, marshalled from its `Serialize` form.
///
/// Strings become `S` attributes and numbers `N` attributes.
pub fn order_item(order: &OrderRecord) -> Result<HashMap<String, AttributeValue>, serde_json::Error> {
    let Value::Object(fields) = serde_json::to_value(order)? else {
        return Err(serde_json::Error::custom("order did not serialize to a map"));
    };
    fields
        .into_iter()
        .map(|(name, value)| attribute(value).map(|attr| (name, attr)))
        .collect()
}

fn attribute(value: Value) -> Result<AttributeValue, serde_json::Error> {
    match value {
        Value::String(s) => Ok(AttributeValue::S(s)),
        Value::Number(n) => Ok(AttributeValue::N(n.to_string())),
        Value::Bool(b) => Ok(AttributeValue::Bool(b)),
        Value::Null => Ok(AttributeValue::Null(true)),
        other => Err(serde_json::Error::custom(format!(
            "unsupported attribute value {other}"
        ))),
    }
}

#[async_trait]
impl RecordStore<OrderRecord> for DynamoStore {
    async fn upsert(&self, record: &OrderRecord) -> Result<(), PersistenceError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(order_item(record).map_err(PersistenceError::new)?))
            .send()
            .await
            .map_err(|e| PersistenceError::new(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_item_attributes() {
        let item = order_item(&OrderRecord::new("o1", "u1", 100)).unwrap();

        assert_eq!(item.len(), 4);
        assert_eq!(item["order_id"], AttributeValue::S("o1".to_string()));
        assert_eq!(item["user_id"], AttributeValue::S("u1".to_string()));
        assert_eq!(item["amount"], AttributeValue::N("100".to_string()));
        assert_eq!(item["status"], AttributeValue::S("PROCESSED".to_string()));
    }

    #[test]
    fn test_negative_amount_is_a_number_attribute() {
        let item = order_item(&OrderRecord::new("o2", "", -7)).unwrap();
        assert_eq!(item["amount"], AttributeValue::N("-7".to_string()));
        assert_eq!(item["user_id"], AttributeValue::S(String::new()));
    }
}
