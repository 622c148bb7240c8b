//! Catalog documents on disk.
//!
//! Two JSON documents live in the catalog directory:
//!
//! - `weapons.json`: `{"pricing": {...}, "weapons": [...]}`
//! - `armor.json`: `{"armors": [...]}`
//!
//! [`load`] is strict. [`load_or_default`] is what the server uses: a missing
//! document is replaced by the built-in one (and written out so operators can
//! edit it), a malformed document is logged and the built-in one is used
//! without touching the file.

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{defaults, ArmorDefinition, Catalog, PricingTable, WeaponDefinition};
use crate::storage::write_atomic;

pub const WEAPONS_FILE: &str = "weapons.json";
pub const ARMOR_FILE: &str = "armor.json";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog document not found: {0}")]
    Missing(PathBuf),
    #[error("catalog document {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("catalog I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponsDocument {
    #[serde(default)]
    pub pricing: PricingTable,
    pub weapons: Vec<WeaponDefinition>,
}

impl Default for WeaponsDocument {
    fn default() -> Self {
        Self {
            pricing: PricingTable::default(),
            weapons: defaults::weapons(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmorDocument {
    pub armors: Vec<ArmorDefinition>,
}

impl Default for ArmorDocument {
    fn default() -> Self {
        Self {
            armors: defaults::armor(),
        }
    }
}

/// Where a loaded document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    File,
    /// Document was missing; the built-in one was used and written to disk.
    BuiltinWritten,
    /// Document was missing or malformed and the built-in one was used.
    BuiltinFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub weapons: DocumentSource,
    pub armor: DocumentSource,
}

impl LoadReport {
    pub fn fully_from_disk(&self) -> bool {
        self.weapons == DocumentSource::File && self.armor == DocumentSource::File
    }
}

/// Load both documents, failing on the first problem.
pub fn load(dir: &Path) -> Result<Catalog, CatalogError> {
    let weapons: WeaponsDocument = read_document(&dir.join(WEAPONS_FILE))?;
    validate_weapons(&dir.join(WEAPONS_FILE), &weapons)?;
    let armor: ArmorDocument = read_document(&dir.join(ARMOR_FILE))?;
    Ok(Catalog::new(
        weapons.pricing,
        weapons.weapons,
        armor.armors,
        defaults::attachments(),
    ))
}

/// Load both documents, substituting built-in data per document on failure.
pub fn load_or_default(dir: &Path) -> (Catalog, LoadReport) {
    let weapons_path = dir.join(WEAPONS_FILE);
    let (weapons, weapons_source) = resolve(
        &weapons_path,
        read_document::<WeaponsDocument>(&weapons_path)
            .and_then(|doc| validate_weapons(&weapons_path, &doc).map(|_| doc)),
    );
    let armor_path = dir.join(ARMOR_FILE);
    let (armor, armor_source) = resolve(&armor_path, read_document::<ArmorDocument>(&armor_path));

    let catalog = Catalog::new(
        weapons.pricing,
        weapons.weapons,
        armor.armors,
        defaults::attachments(),
    );
    let summary = catalog.summary();
    info!(
        "Catalog loaded: {} weapons, {} skins, {} armor pieces, {} attachments",
        summary.weapons, summary.skins, summary.armor, summary.attachments
    );
    (
        catalog,
        LoadReport {
            weapons: weapons_source,
            armor: armor_source,
        },
    )
}

/// Write the built-in documents into `dir`, replacing whatever is there.
pub fn write_defaults(dir: &Path) -> Result<(), CatalogError> {
    fs::create_dir_all(dir).map_err(|source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    write_document(&dir.join(WEAPONS_FILE), &WeaponsDocument::default())?;
    write_document(&dir.join(ARMOR_FILE), &ArmorDocument::default())
}

fn resolve<T: Default + Serialize>(
    path: &Path,
    loaded: Result<T, CatalogError>,
) -> (T, DocumentSource) {
    match loaded {
        Ok(doc) => (doc, DocumentSource::File),
        Err(CatalogError::Missing(_)) => {
            let doc = T::default();
            let written = path
                .parent()
                .map(|dir| fs::create_dir_all(dir).is_ok())
                .unwrap_or(true)
                && write_document(path, &doc).is_ok();
            if written {
                info!("Created default catalog document {}", path.display());
                (doc, DocumentSource::BuiltinWritten)
            } else {
                warn!(
                    "Could not write default catalog document {}; using built-in data",
                    path.display()
                );
                (doc, DocumentSource::BuiltinFallback)
            }
        }
        Err(e) => {
            warn!("{}; using built-in data", e);
            (T::default(), DocumentSource::BuiltinFallback)
        }
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CatalogError::Missing(path.to_path_buf()))
        }
        Err(source) => {
            return Err(CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content).map_err(|e| CatalogError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn validate_weapons(path: &Path, doc: &WeaponsDocument) -> Result<(), CatalogError> {
    if doc.weapons.is_empty() {
        return Err(CatalogError::Malformed {
            path: path.to_path_buf(),
            reason: "no weapons defined".to_string(),
        });
    }
    Ok(())
}

fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(doc).map_err(|e| CatalogError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    write_atomic(path, json.as_bytes()).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use tempfile::TempDir;

    #[test]
    fn test_missing_documents_are_written() {
        let dir = TempDir::new().unwrap();
        let (catalog, report) = load_or_default(dir.path());
        assert_eq!(report.weapons, DocumentSource::BuiltinWritten);
        assert_eq!(report.armor, DocumentSource::BuiltinWritten);
        assert!(dir.path().join(WEAPONS_FILE).exists());
        assert!(dir.path().join(ARMOR_FILE).exists());
        assert_eq!(catalog.weapons().len(), 10);

        let (_, second) = load_or_default(dir.path());
        assert!(second.fully_from_disk());
    }

    #[test]
    fn test_malformed_document_is_left_alone() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(WEAPONS_FILE), "{ not json").unwrap();
        let (catalog, report) = load_or_default(dir.path());
        assert_eq!(report.weapons, DocumentSource::BuiltinFallback);
        assert_eq!(catalog.weapons().len(), 10);
        let on_disk = fs::read_to_string(dir.path().join(WEAPONS_FILE)).unwrap();
        assert_eq!(on_disk, "{ not json");
    }

    #[test]
    fn test_strict_load_reports_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(load(dir.path()), Err(CatalogError::Missing(_))));
        fs::write(dir.path().join(WEAPONS_FILE), r#"{"weapons": []}"#).unwrap();
        assert!(matches!(
            load(dir.path()),
            Err(CatalogError::Malformed { .. })
        ));
    }

    #[test]
    fn test_custom_document_with_tier_pricing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(WEAPONS_FILE),
            r#"{
                "pricing": {"common": 10, "rare": 20, "epic": 30, "legendary": 40},
                "weapons": [{
                    "id": "crossbow",
                    "display_name": "Crossbow",
                    "external_item_key": "crossbow",
                    "rarity": "Legendary",
                    "skins": [{"id": "77", "display_name": "Oak", "rarity": "Rare"}]
                }]
            }"#,
        )
        .unwrap();
        fs::write(dir.path().join(ARMOR_FILE), r#"{"armors": []}"#).unwrap();
        let catalog = load(dir.path()).unwrap();
        let bow = catalog.weapon("crossbow").unwrap();
        assert_eq!(bow.default_skin_id, "0");
        assert_eq!(catalog.price_of(CatalogItem::Weapon(bow)), 40);
        let oak = catalog.skin("77").unwrap();
        assert_eq!(catalog.price_of(CatalogItem::Skin(oak)), 20);
        assert!(catalog.armor_pieces().is_empty());
    }
}
