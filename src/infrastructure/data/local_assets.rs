// SPDX-License-Identifier: MIT

use crate::common::parsing::lowercase_eq;
use crate::domain::error::AppError;
use crate::domain::model::Asset;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON-file persistence for user-added assets. These merge into the
/// indexer's listing on configure so a token the user imported stays
/// visible across restarts even if the subgraph never lists it.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    path: PathBuf,
}

impl LocalAssetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Missing or unreadable files read as an empty list; a half-written
    /// file must never take the whole configure flow down.
    pub fn load(&self) -> Vec<Asset> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Asset>>(&raw) {
            Ok(mut assets) => {
                for asset in &mut assets {
                    asset.local = true;
                }
                assets
            }
            Err(e) => {
                tracing::warn!(
                    target: "local_assets",
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unparseable local asset file"
                );
                Vec::new()
            }
        }
    }

    fn save(&self, assets: &[Asset]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && parent != Path::new("")
        {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let body = serde_json::to_string_pretty(assets)
            .map_err(|e| AppError::Config(format!("Failed to encode local assets: {}", e)))?;
        fs::write(&self.path, body).map_err(|e| {
            AppError::Config(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    /// Add an asset, replacing any previous entry with the same address.
    pub fn add(&self, mut asset: Asset) -> Result<Vec<Asset>, AppError> {
        asset.local = true;
        let mut assets = self.load();
        assets.retain(|existing| !lowercase_eq(&existing.address, &asset.address));
        assets.push(asset);
        self.save(&assets)?;
        Ok(assets)
    }

    pub fn remove(&self, address: &str) -> Result<Vec<Asset>, AppError> {
        let mut assets = self.load();
        assets.retain(|existing| !lowercase_eq(&existing.address, address));
        self.save(&assets)?;
        Ok(assets)
    }
}
