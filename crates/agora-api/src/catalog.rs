use agora_persist::{Artifact, MemoryPersistenceClient, Topic};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Topics and artifacts for the in-memory backend
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Load a catalog file into the store, returning the number of topics
pub async fn load_catalog(path: impl AsRef<Path>, store: &MemoryPersistenceClient) -> Result<usize> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let catalog: CatalogFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse catalog {}", path.display()))?;

    let topics = catalog.topics.len();
    for topic in catalog.topics {
        store.insert_topic(topic).await;
    }
    for artifact in catalog.artifacts {
        store.insert_artifact(artifact).await;
    }
    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_persist::TopicCatalog;

    #[tokio::test]
    async fn test_bundled_catalog_loads() {
        let store = MemoryPersistenceClient::new();
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/catalog.json");

        let topics = load_catalog(path, &store).await.unwrap();
        assert_eq!(topics, 1);

        let topic = store.get_topic_by_slug("tempo-30").await.unwrap().unwrap();
        assert_eq!(store.list_artifacts(&topic.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let store = MemoryPersistenceClient::new();
        assert!(load_catalog("/nonexistent/catalog.json", &store).await.is_err());
    }
}
