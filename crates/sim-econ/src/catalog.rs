//! Static shop configuration.
//!
//! The catalog is never persisted; offers are addressed by their position.

use serde::{Deserialize, Serialize};
use sim_core::{AnimalKind, PlantKind};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Seeds for sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantOffer {
    pub kind: PlantKind,
    pub price: u64,
    /// Intended growth time. Carried for compatibility; no rule reads it,
    /// growth is driven by watering alone.
    #[serde(default)]
    pub growth_duration_ms: u64,
}

impl PlantOffer {
    pub fn label(&self) -> String {
        format!("{} Seeds", self.kind)
    }
}

/// Animals up for adoption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalOffer {
    pub kind: AnimalKind,
    pub price: u64,
}

/// Ordered plant and animal offers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub plants: Vec<PlantOffer>,
    pub animals: Vec<AnimalOffer>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog has no {0} offers")]
    Empty(&'static str),
    #[error("offer {0} has a zero price")]
    ZeroPrice(String),
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The stock shop.
    pub fn builtin() -> Self {
        let plant = |kind, price, growth_duration_ms| PlantOffer {
            kind,
            price,
            growth_duration_ms,
        };
        let animal = |kind, price| AnimalOffer { kind, price };
        Self {
            plants: vec![
                plant(PlantKind::Tomato, 10, 30_000),
                plant(PlantKind::Carrot, 15, 25_000),
                plant(PlantKind::Sunflower, 20, 40_000),
                plant(PlantKind::Strawberry, 25, 35_000),
                plant(PlantKind::Pumpkin, 30, 50_000),
                plant(PlantKind::Rose, 40, 45_000),
            ],
            animals: vec![
                animal(AnimalKind::Rabbit, 50),
                animal(AnimalKind::Cat, 60),
                animal(AnimalKind::Dog, 70),
                animal(AnimalKind::Chicken, 40),
                animal(AnimalKind::Pig, 80),
                animal(AnimalKind::Duck, 45),
            ],
        }
    }

    /// Parse and validate a YAML catalog.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.plants.is_empty() {
            return Err(CatalogError::Empty("plant"));
        }
        if self.animals.is_empty() {
            return Err(CatalogError::Empty("animal"));
        }
        if let Some(p) = self.plants.iter().find(|p| p.price == 0) {
            return Err(CatalogError::ZeroPrice(p.label()));
        }
        if let Some(a) = self.animals.iter().find(|a| a.price == 0) {
            return Err(CatalogError::ZeroPrice(a.kind.to_string()));
        }
        Ok(())
    }

    pub fn plant_offer(&self, index: usize) -> Option<&PlantOffer> {
        self.plants.get(index)
    }

    pub fn animal_offer(&self, index: usize) -> Option<&AnimalOffer> {
        self.animals.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn builtin_catalog_is_valid() {
        let c = Catalog::builtin();
        c.validate().unwrap();
        assert_eq!(c.plants.len(), 6);
        assert_eq!(c.animals.len(), 6);
        assert_eq!(c.plants[0].price, 10);
        assert_eq!(c.plants[0].label(), "Tomato Seeds");
        assert_eq!(c.animals[3].kind, AnimalKind::Chicken);
    }

    #[test]
    fn shipped_asset_matches_builtin() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/catalog.yaml");
        let c = Catalog::from_path(path).unwrap();
        assert_eq!(c, Catalog::builtin());
    }

    #[test]
    fn yaml_without_growth_hint_defaults_to_zero() {
        let yaml = "plants:\n  - kind: Rose\n    price: 5\nanimals:\n  - kind: Pig\n    price: 9\n";
        let c = Catalog::from_yaml_str(yaml).unwrap();
        assert_eq!(c.plants[0].growth_duration_ms, 0);
        assert_eq!(c.animal_offer(0).unwrap().price, 9);
        assert!(c.animal_offer(1).is_none());
    }

    #[test]
    fn invalid_catalogs_are_rejected() {
        let empty = "plants: []\nanimals:\n  - kind: Pig\n    price: 9\n";
        assert!(matches!(
            Catalog::from_yaml_str(empty),
            Err(CatalogError::Empty("plant"))
        ));
        let free = "plants:\n  - kind: Rose\n    price: 0\nanimals:\n  - kind: Pig\n    price: 9\n";
        assert!(matches!(
            Catalog::from_yaml_str(free),
            Err(CatalogError::ZeroPrice(_))
        ));
        assert!(matches!(
            Catalog::from_yaml_str("plants: [oops"),
            Err(CatalogError::Yaml(_))
        ));
    }
}
