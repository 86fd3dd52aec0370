use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedItems {
    pub items: Vec<Item>,
    pub dropped: usize,
}

/// Decodes each array entry on its own so one malformed post does not
/// discard the whole list. Returns `None` when the payload is not an array.
pub fn decode_items(payload: Value) -> Option<DecodedItems> {
    let Value::Array(entries) = payload else {
        return None;
    };

    let mut decoded = DecodedItems::default();
    for entry in entries {
        match serde_json::from_value::<Item>(entry) {
            Ok(item) => decoded.items.push(item),
            Err(_) => decoded.dropped += 1,
        }
    }

    Some(decoded)
}
