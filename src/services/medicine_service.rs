use crate::database::{MongoDB, MEDICINES_COLLECTION};
use crate::models::Medicine;
use futures::TryStreamExt;
use serde::Serialize;
use serde_json::json;

/// Payload shape the LLM tools return. The capitalized keys are part of the
/// contract with the agent prompt, which references "Data"/"Error"/"Message".
#[derive(Debug, Serialize)]
pub struct ToolPayload {
    #[serde(rename = "Data")]
    pub data: serde_json::Value,
    #[serde(rename = "Error")]
    pub error: bool,
    #[serde(rename = "Message")]
    pub message: String,
}

async fn fetch_all(db: &MongoDB) -> Result<Vec<Medicine>, mongodb::error::Error> {
    let collection = db.collection::<Medicine>(MEDICINES_COLLECTION);
    let cursor = collection.find(mongodb::bson::doc! {}).await?;
    cursor.try_collect().await
}

/// Case-insensitive exact match on the trimmed medicine name; first match wins.
pub fn find_by_name<'a>(medicines: &'a [Medicine], name: &str) -> Option<&'a Medicine> {
    let wanted = name.trim().to_lowercase();
    medicines
        .iter()
        .find(|m| m.medicine_name.trim().to_lowercase() == wanted)
}

// The legacy backend lowercases the name before building this message, so the
// payload echoes the normalized form rather than the caller's casing.
fn not_found_payload(name: &str) -> ToolPayload {
    ToolPayload {
        data: json!({}),
        error: true,
        message: format!(
            "Medicine '{}' not found in database.",
            name.trim().to_lowercase()
        ),
    }
}

/// Tool: fetch every medicine in the collection.
pub async fn read_medicines(db: &MongoDB) -> ToolPayload {
    log::info!("💊 Tool call: read_medicines");

    match fetch_all(db).await {
        Ok(medicines) => ToolPayload {
            data: serde_json::to_value(&medicines).unwrap_or_else(|_| json!([])),
            error: false,
            message: "All medicines fetched successfully.".to_string(),
        },
        Err(e) => {
            log::error!("❌ read_medicines failed: {}", e);
            ToolPayload {
                data: json!([]),
                error: true,
                message: "Error fetching medicines".to_string(),
            }
        }
    }
}

/// Tool: fetch one medicine by name (case-insensitive linear scan).
/// An unmatched name is a normal payload, not an error the agent can crash on.
pub async fn read_medicine_by_name(db: &MongoDB, name: &str) -> ToolPayload {
    log::info!("💊 Tool call: read_medicine_by_name - name: {}", name);

    match fetch_all(db).await {
        Ok(medicines) => match find_by_name(&medicines, name) {
            Some(medicine) => ToolPayload {
                data: serde_json::to_value(medicine).unwrap_or_else(|_| json!({})),
                error: false,
                message: "Medicine fetched successfully.".to_string(),
            },
            None => not_found_payload(name),
        },
        Err(e) => {
            log::error!("❌ read_medicine_by_name failed: {}", e);
            ToolPayload {
                data: json!({}),
                error: true,
                message: "Error fetching medicine".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medicine(name: &str) -> Medicine {
        Medicine {
            _id: None,
            medicine_name: name.to_string(),
            composition: Some("Paracetamol (650mg)".to_string()),
            uses: Some("Fever, pain relief".to_string()),
            side_effects: None,
            excellent_review_pct: Some(50),
            average_review_pct: Some(30),
            poor_review_pct: Some(20),
        }
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let medicines = vec![medicine("Dolo 650"), medicine("AB Phylline Capsule")];

        let found = find_by_name(&medicines, "dolo 650").unwrap();
        assert_eq!(found.medicine_name, "Dolo 650");

        let found = find_by_name(&medicines, "AB PHYLLINE CAPSULE").unwrap();
        assert_eq!(found.medicine_name, "AB Phylline Capsule");
    }

    #[test]
    fn test_find_by_name_trims_whitespace() {
        let medicines = vec![medicine("  Dolo 650 ")];
        assert!(find_by_name(&medicines, "dolo 650").is_some());
        assert!(find_by_name(&medicines, "   DOLO 650  ").is_some());
    }

    #[test]
    fn test_find_by_name_is_exact_match() {
        let medicines = vec![medicine("Dolo 650")];
        // Substrings and supersets do not match
        assert!(find_by_name(&medicines, "Dolo").is_none());
        assert!(find_by_name(&medicines, "Dolo 650 Tablet").is_none());
    }

    #[test]
    fn test_find_by_name_first_match_wins() {
        let mut first = medicine("Dolo 650");
        first.composition = Some("first".to_string());
        let mut second = medicine("DOLO 650");
        second.composition = Some("second".to_string());

        let medicines = vec![first, second];
        let found = find_by_name(&medicines, "dolo 650").unwrap();
        assert_eq!(found.composition.as_deref(), Some("first"));
    }

    #[test]
    fn test_not_found_message_uses_normalized_name() {
        let payload = not_found_payload("  DoLo 650 ");
        assert!(payload.error);
        assert_eq!(payload.message, "Medicine 'dolo 650' not found in database.");
        assert_eq!(payload.data, json!({}));
    }

    #[test]
    fn test_payload_uses_capitalized_keys() {
        let payload = ToolPayload {
            data: json!({}),
            error: true,
            message: "Medicine 'x' not found in database.".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["Error"], true);
        assert!(value["Message"].as_str().unwrap().contains("not found"));
        assert!(value.get("Data").is_some());
    }
}
