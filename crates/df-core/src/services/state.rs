//! Backend map persistence.
//!
//! The map file is the single durable source of truth for which instances
//! exist. A missing file means a fresh first-run map; a malformed file is
//! logged and treated the same way rather than crashing the run.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{DeployError, Result};
use crate::models::{BackendMap, BoxSpec};
use crate::services::identity;

pub struct BackendMapStore {
    path: PathBuf,
}

impl BackendMapStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted map. `None` means nothing usable is on disk and
    /// the caller should rebuild from the topology.
    pub async fn load(&self) -> Result<Option<BackendMap>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DeployError::State(format!("failed to read backend map: {e}")))?;
        match serde_yaml::from_str(&text) {
            Ok(map) => Ok(Some(map)),
            Err(err) => {
                warn!(path = %self.path.display(), %err,
                    "backend map file is malformed, rebuilding from topology");
                Ok(None)
            }
        }
    }

    /// Load the persisted map, or build the first-run map with a freshly
    /// minted layout and no instances.
    pub async fn load_or_init(&self, lb_endpoint: &str, boxes: &[BoxSpec]) -> Result<BackendMap> {
        if let Some(map) = self.load().await? {
            return Ok(map);
        }
        Ok(BackendMap::new(
            lb_endpoint.to_string(),
            identity::build_layout(boxes),
        ))
    }

    pub async fn save(&self, map: &BackendMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DeployError::State(format!("failed to create state dir: {e}"))
                })?;
            }
        }
        let yaml = serde_yaml::to_string(map)?;
        tokio::fs::write(&self.path, yaml)
            .await
            .map_err(|e| DeployError::State(format!("failed to write backend map: {e}")))?;
        info!(path = %self.path.display(), "backend map saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instance, ServiceInstance, ServiceSpec};

    fn topology() -> Vec<BoxSpec> {
        vec![BoxSpec {
            name: "web".into(),
            services: vec![ServiceSpec {
                name: "http".into(),
                description: "d".into(),
                port: 80,
                protocol: "tcp".into(),
            }],
        }]
    }

    #[tokio::test]
    async fn round_trip_is_structurally_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackendMapStore::new(dir.path().join("backend_map.yml"));

        let mut map = BackendMap::new("lb:80".into(), identity::build_layout(&topology()));
        map.backends.push(Instance {
            id: "1".into(),
            services: vec![ServiceInstance {
                box_id: "web".into(),
                service_id: "http".into(),
                host: "node-a:8000".into(),
            }],
        });

        store.save(&map).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, map);
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackendMapStore::new(dir.path().join("backend_map.yml"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_file_degrades_to_fresh_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend_map.yml");
        tokio::fs::write(&path, "lb_endpoint: [unclosed").await.unwrap();

        let store = BackendMapStore::new(&path);
        assert!(store.load().await.unwrap().is_none());

        let map = store.load_or_init("lb:80", &topology()).await.unwrap();
        assert!(map.backends.is_empty());
        assert_eq!(map.layout[0].id, "web");
    }

    #[tokio::test]
    async fn load_or_init_prefers_persisted_map() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackendMapStore::new(dir.path().join("backend_map.yml"));

        let map = BackendMap::new("persisted:80".into(), identity::build_layout(&topology()));
        store.save(&map).await.unwrap();

        let loaded = store.load_or_init("other:80", &topology()).await.unwrap();
        assert_eq!(loaded.lb_endpoint, "persisted:80");
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackendMapStore::new(dir.path().join("nested/out/backend_map.yml"));
        let map = BackendMap::new("lb:80".into(), Vec::new());
        store.save(&map).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn persisted_file_uses_snake_case_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackendMapStore::new(dir.path().join("backend_map.yml"));

        let mut map = BackendMap::new("lb:80".into(), identity::build_layout(&topology()));
        map.backends.push(Instance {
            id: "1".into(),
            services: vec![ServiceInstance {
                box_id: "web".into(),
                service_id: "http".into(),
                host: "node-a:8000".into(),
            }],
        });
        store.save(&map).await.unwrap();

        let text = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(text.contains("lb_endpoint:"));
        assert!(text.contains("box_id:"));
        assert!(text.contains("service_id:"));
        assert!(text.contains("proxy:"));
    }
}
