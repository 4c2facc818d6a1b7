use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, CountPointsBuilder, CreateCollectionBuilder, Distance, PointId, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{RecipeError, RecipeResult};
use crate::models::{RecipeSummary, SimilarityResult};
use crate::repository::{RecipePoint, RecipeVectorStore};

/// Qdrant-backed implementation of RecipeVectorStore
pub struct QdrantRecipeStore {
    client: Qdrant,
    collection: String,
}

impl QdrantRecipeStore {
    pub fn new(config: QdrantConfig) -> RecipeResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| RecipeError::VectorStore(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            collection: config.collection,
        })
    }
}

fn uuid_to_point_id(id: Uuid) -> PointId {
    PointId::from(id.to_string())
}

fn point_id_to_uuid(point_id: &PointId) -> RecipeResult<Uuid> {
    match &point_id.point_id_options {
        Some(qdrant::point_id::PointIdOptions::Uuid(uuid_str)) => Uuid::parse_str(uuid_str)
            .map_err(|e| RecipeError::VectorStore(format!("Invalid UUID: {}", e))),
        Some(qdrant::point_id::PointIdOptions::Num(num)) => Ok(Uuid::from_u128(*num as u128)),
        None => Err(RecipeError::VectorStore("Missing point ID".to_string())),
    }
}

fn summary_to_payload(summary: &RecipeSummary) -> RecipeResult<HashMap<String, QdrantValue>> {
    let serde_json::Value::Object(map) = serde_json::to_value(summary)? else {
        return Ok(HashMap::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, val)| json_to_qdrant_value(val).map(|v| (key, v)))
        .collect())
}

fn payload_to_summary(payload: HashMap<String, QdrantValue>) -> RecipeResult<RecipeSummary> {
    let map: serde_json::Map<String, serde_json::Value> = payload
        .into_iter()
        .filter_map(|(key, val)| qdrant_value_to_json(val).map(|v| (key, v)))
        .collect();

    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| RecipeError::VectorStore(format!("Malformed payload: {}", e)))
}

fn json_to_qdrant_value(val: serde_json::Value) -> Option<QdrantValue> {
    match val {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(QdrantValue::from(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(QdrantValue::from(i)),
            None => n.as_f64().map(QdrantValue::from),
        },
        serde_json::Value::String(s) => Some(QdrantValue::from(s)),
        other => Some(QdrantValue::from(other.to_string())),
    }
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<serde_json::Value> {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::NullValue(_)) => None,
        Some(Kind::BoolValue(b)) => Some(serde_json::Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(serde_json::Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f).map(serde_json::Value::Number),
        Some(Kind::StringValue(s)) => Some(serde_json::Value::String(s)),
        _ => None,
    }
}

#[async_trait]
impl RecipeVectorStore for QdrantRecipeStore {
    async fn ensure_collection(&self, dimension: u32) -> RecipeResult<bool> {
        if self.client.collection_exists(&self.collection).await? {
            debug!(collection = %self.collection, "Collection already exists");
            return Ok(false);
        }

        let builder = CreateCollectionBuilder::new(&self.collection)
            .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine));
        self.client.create_collection(builder).await?;

        info!(collection = %self.collection, dimension, "Created collection");
        Ok(true)
    }

    async fn upsert(&self, points: Vec<RecipePoint>) -> RecipeResult<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                Ok(PointStruct::new(
                    uuid_to_point_id(p.id),
                    p.vector.into_inner(),
                    summary_to_payload(&p.summary)?,
                ))
            })
            .collect::<RecipeResult<_>>()?;
        let count = points.len();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await?;

        Ok(count)
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        min_similarity: f32,
    ) -> RecipeResult<Vec<SimilarityResult>> {
        let builder = SearchPointsBuilder::new(&self.collection, vector, limit as u64)
            .score_threshold(min_similarity)
            .with_payload(true);

        let results = self.client.search_points(builder).await?;

        results
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .as_ref()
                    .map(point_id_to_uuid)
                    .transpose()?
                    .ok_or_else(|| RecipeError::VectorStore("Missing point ID".to_string()))?;

                Ok(SimilarityResult {
                    id,
                    score: point.score,
                    recipe: payload_to_summary(point.payload)?,
                })
            })
            .collect()
    }

    async fn count(&self) -> RecipeResult<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_roundtrip_drops_missing_optionals() {
        let summary = RecipeSummary {
            url: "https://example.com/recipe/1".into(),
            title: "김치찌개".into(),
            title_en: "Kimchi stew".into(),
            description_en: String::new(),
            cooking_time: Some("30 min".into()),
            servings: None,
        };

        let payload = summary_to_payload(&summary).unwrap();
        assert!(!payload.contains_key("servings"));
        assert_eq!(payload_to_summary(payload).unwrap(), summary);
    }

    #[test]
    fn test_point_id_conversion() {
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, b"https://example.com/recipe/1");
        assert_eq!(point_id_to_uuid(&uuid_to_point_id(id)).unwrap(), id);
        assert!(point_id_to_uuid(&PointId { point_id_options: None }).is_err());
    }
}
