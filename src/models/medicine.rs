use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Medicine document as stored in the `medicines_info` collection.
///
/// The collection was seeded from a legacy dataset whose keys carry spaces
/// and `%` signs ("Medicine Name", "Excellent Review %", ...), so the struct
/// keeps those as the canonical serde names and accepts snake_case aliases.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Medicine {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(rename = "Medicine Name", alias = "medicine_name")]
    pub medicine_name: String,

    #[serde(rename = "Composition", alias = "composition", default)]
    pub composition: Option<String>,

    #[serde(rename = "Uses", alias = "uses", default)]
    pub uses: Option<String>,

    #[serde(rename = "Side_effects", alias = "side_effects", default)]
    pub side_effects: Option<String>,

    #[serde(rename = "Excellent Review %", alias = "excellent_review_pct", default)]
    pub excellent_review_pct: Option<i32>,

    #[serde(rename = "Average Review %", alias = "average_review_pct", default)]
    pub average_review_pct: Option<i32>,

    #[serde(rename = "Poor Review %", alias = "poor_review_pct", default)]
    pub poor_review_pct: Option<i32>,
}
