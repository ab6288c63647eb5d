//! Testing utilities for the DM assistant.
//!
//! This module provides tools for deterministic tests:
//! - `sample_catalog` with a small, fixed set of entities
//! - `MockGenerator` for scripted AI responses without a service
//! - `seeded_session` for reproducible sessions

use crate::catalog::{EntityRecord, EntityType, MemoryCatalog, Rarity};
use crate::config::AssistantConfig;
use crate::prompts::{GenerationError, TextGenerator};
use crate::session::DmSession;
use futures::future::BoxFuture;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Mutex;

/// A small catalog covering every entity type.
///
/// Monsters span CR 1/8 to 5; one monster has non-numeric HP so the
/// fallback path gets exercised.
pub fn sample_catalog() -> MemoryCatalog {
    MemoryCatalog::new(vec![
        EntityRecord::new("Kobold", EntityType::Monster)
            .with_hp("5")
            .with_cr("1/8"),
        EntityRecord::new("Goblin", EntityType::Monster)
            .with_hp("7")
            .with_cr("1/4"),
        EntityRecord::new("Skeleton", EntityType::Monster)
            .with_hp("13")
            .with_cr("1/4"),
        EntityRecord::new("Swarm of Rats", EntityType::Monster)
            .with_hp("varies")
            .with_cr("1/4"),
        EntityRecord::new("Ogre", EntityType::Monster)
            .with_hp("59")
            .with_cr("2"),
        EntityRecord::new("Troll", EntityType::Monster)
            .with_hp("84")
            .with_cr("5"),
        EntityRecord::new("Potion of Healing", EntityType::MagicItem).with_rarity(Rarity::Common),
        EntityRecord::new("Boots of Elvenkind", EntityType::MagicItem)
            .with_rarity(Rarity::Uncommon),
        EntityRecord::new("Wand of Fireballs", EntityType::MagicItem).with_rarity(Rarity::Rare),
        EntityRecord::new("Manual of Golems", EntityType::MagicItem)
            .with_rarity(Rarity::VeryRare),
        EntityRecord::new("Chain Mail", EntityType::Armor),
        EntityRecord::new("Studded Leather", EntityType::Armor),
        EntityRecord::new("Longsword", EntityType::Weapon),
        EntityRecord::new("Handaxe", EntityType::Weapon),
        EntityRecord::new("Light Crossbow", EntityType::Weapon),
    ])
}

/// A text generator that returns scripted responses in order.
pub struct MockGenerator {
    responses: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl TextGenerator for MockGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>> {
        Box::pin(async move {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            self.responses
                .lock()
                .ok()
                .and_then(|mut r| r.pop())
                .ok_or_else(|| GenerationError::Service("no more scripted responses".into()))
        })
    }
}

/// A session over [`sample_catalog`] with a fixed seed and default config.
pub fn seeded_session(seed: u64) -> DmSession {
    DmSession::from_parts(
        AssistantConfig::default(),
        StdRng::seed_from_u64(seed),
        Box::new(sample_catalog()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EntityFilter};

    #[test]
    fn test_sample_catalog_covers_every_type() {
        let catalog = sample_catalog();
        for entity_type in EntityType::all() {
            let found = catalog.query(*entity_type, &EntityFilter::Any, 50).unwrap();
            assert!(!found.is_empty(), "no {entity_type} in sample catalog");
        }
    }

    #[tokio::test]
    async fn test_mock_generator_scripts() {
        let mock = MockGenerator::new(vec!["first".into(), "second".into()]);
        assert_eq!(mock.generate("a").await.unwrap(), "first");
        assert_eq!(mock.generate("b").await.unwrap(), "second");
        assert!(mock.generate("c").await.is_err());
        assert_eq!(mock.prompts(), vec!["a", "b", "c"]);
    }
}
