use crate::utils::label_map::make_label_map;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const LABEL_MAP_CONTENT_TYPE: &str = "text/plain";

/// Object metadata as returned by the storage JSON API
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    pub name: String,
    pub bucket: String,
    /// Decimal string, as the API sends it
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl ObjectInfo {
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Trait for bucket-backed object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or replace an object
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> crate::Result<ObjectInfo>;

    /// Read an object's content
    async fn download(&self, bucket: &str, name: &str) -> crate::Result<Vec<u8>>;

    /// Delete an object
    async fn delete(&self, bucket: &str, name: &str) -> crate::Result<()>;

    /// List objects whose names start with `prefix`
    async fn list(&self, bucket: &str, prefix: &str) -> crate::Result<Vec<ObjectInfo>>;
}

/// Write the label map for `labels` to `bucket/name`.
pub async fn upload_label_map<S, L>(
    store: &S,
    bucket: &str,
    name: &str,
    labels: &[L],
) -> crate::Result<ObjectInfo>
where
    S: ObjectStore + ?Sized,
    L: AsRef<str> + Sync,
{
    let label_map = make_label_map(labels);
    store
        .upload(bucket, name, label_map.into_bytes(), LABEL_MAP_CONTENT_TYPE)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AppError};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryStore {
        objects: Mutex<HashMap<(String, String), (Vec<u8>, String)>>,
    }

    #[async_trait]
    impl ObjectStore for InMemoryStore {
        async fn upload(
            &self,
            bucket: &str,
            name: &str,
            data: Vec<u8>,
            content_type: &str,
        ) -> crate::Result<ObjectInfo> {
            let size = data.len().to_string();
            self.objects.lock().unwrap().insert(
                (bucket.to_string(), name.to_string()),
                (data, content_type.to_string()),
            );
            Ok(ObjectInfo {
                name: name.to_string(),
                bucket: bucket.to_string(),
                size: Some(size),
                content_type: Some(content_type.to_string()),
                updated: None,
            })
        }

        async fn download(&self, bucket: &str, name: &str) -> crate::Result<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(&(bucket.to_string(), name.to_string()))
                .map(|(data, _)| data.clone())
                .ok_or_else(|| {
                    AppError::Api(ApiError::Http {
                        status: 404,
                        endpoint: name.to_string(),
                        message: "No such object".to_string(),
                    })
                })
        }

        async fn delete(&self, bucket: &str, name: &str) -> crate::Result<()> {
            self.objects
                .lock()
                .unwrap()
                .remove(&(bucket.to_string(), name.to_string()));
            Ok(())
        }

        async fn list(&self, bucket: &str, prefix: &str) -> crate::Result<Vec<ObjectInfo>> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .keys()
                .filter(|(b, n)| b == bucket && n.starts_with(prefix))
                .map(|(b, n)| ObjectInfo {
                    name: n.clone(),
                    bucket: b.clone(),
                    size: None,
                    content_type: None,
                    updated: None,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_upload_label_map() {
        let store = InMemoryStore::default();

        let info = upload_label_map(&store, "bucket", "dataset/label_map.pbtxt", &["cat", "dog"])
            .await
            .expect("upload should succeed");

        assert_eq!(info.content_type.as_deref(), Some(LABEL_MAP_CONTENT_TYPE));
        let data = store
            .download("bucket", "dataset/label_map.pbtxt")
            .await
            .expect("object should exist");
        assert_eq!(
            String::from_utf8(data).unwrap(),
            "item {\n  id: 1\n  name:'cat'\n}\nitem {\n  id: 2\n  name:'dog'\n}\n"
        );
    }

    #[tokio::test]
    async fn test_upload_label_map_through_trait_object() {
        let store: Box<dyn ObjectStore> = Box::new(InMemoryStore::default());
        let labels: Vec<String> = Vec::new();

        let info = upload_label_map(store.as_ref(), "bucket", "empty.pbtxt", &labels)
            .await
            .expect("upload should succeed");

        assert_eq!(info.size_bytes(), Some(0));
        assert_eq!(store.list("bucket", "empty").await.unwrap().len(), 1);
        store.delete("bucket", "empty.pbtxt").await.unwrap();
        assert!(store.download("bucket", "empty.pbtxt").await.is_err());
    }

    #[test]
    fn test_object_info_from_api_json() {
        let json = r#"{
            "kind": "storage#object",
            "name": "videos/clip.mp4",
            "bucket": "fmltc-blobs",
            "size": "1048576",
            "contentType": "video/mp4",
            "updated": "2020-11-05T12:00:00.250Z"
        }"#;
        let info: ObjectInfo = serde_json::from_str(json).expect("should parse");
        assert_eq!(info.size_bytes(), Some(1_048_576));
        assert_eq!(info.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(
            info.updated.map(|t| t.timestamp_millis()),
            Some(1_604_577_600_250)
        );
    }
}
