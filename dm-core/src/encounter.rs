//! Encounter placement: distributes catalog entities across a map's rooms.
//!
//! A placement run validates the request, resolves one candidate pool per
//! requested entity type, shuffles the queue of type tokens and then assigns
//! each token an entity, a room and an interior coordinate. Every run
//! produces a fresh batch; nothing carries over from earlier runs.

use crate::catalog::{Catalog, CatalogError, EntityFilter, EntityRecord, EntityType, Rarity};
use crate::error::ErrorKind;
use crate::map::Room;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Largest quantity accepted for a single entity type.
pub const MAX_QUANTITY_PER_TYPE: usize = 5;

/// Hard cap on the number of entities placed in one run.
pub const MAX_ENTITIES: usize = 20;

/// Maximum candidates fetched from the catalog per entity type.
pub const POOL_LIMIT: usize = 50;

/// Hit points given to a placed monster whose catalog HP is unusable.
pub const FALLBACK_HP: i32 = 10;

const MIN_PARTY_LEVEL: u32 = 1;
const MAX_PARTY_LEVEL: u32 = 20;

/// Errors from encounter placement.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("No rooms available for placement")]
    NoRoomsAvailable,

    #[error("Invalid party level {0}: must be between 1 and 20")]
    InvalidPartyLevel(u32),

    #[error("Invalid quantity {quantity} for {entity_type}: must be between 0 and 5")]
    InvalidQuantity {
        entity_type: EntityType,
        quantity: usize,
    },

    #[error("No entity types selected for placement")]
    NoSelection,

    #[error("No {0} found in the catalog for this party level")]
    CatalogEmpty(EntityType),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl PlacementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlacementError::InvalidPartyLevel(_)
            | PlacementError::InvalidQuantity { .. }
            | PlacementError::NoSelection => ErrorKind::InvalidInput,
            PlacementError::NoRoomsAvailable | PlacementError::CatalogEmpty(_) => {
                ErrorKind::ResourceUnavailable
            }
            PlacementError::Catalog(e) => e.kind(),
        }
    }
}

/// What to place: a quantity per entity type and the party level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub party_level: u32,
    pub quantities: BTreeMap<EntityType, usize>,
}

impl PlacementRequest {
    pub fn new(party_level: u32) -> Self {
        Self {
            party_level,
            quantities: BTreeMap::new(),
        }
    }

    /// Set the quantity for an entity type, replacing any earlier value.
    pub fn with(mut self, entity_type: EntityType, quantity: usize) -> Self {
        self.quantities.insert(entity_type, quantity);
        self
    }

    pub fn quantity(&self, entity_type: EntityType) -> usize {
        self.quantities.get(&entity_type).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.quantities.values().sum()
    }

    fn validate(&self) -> Result<(), PlacementError> {
        if !(MIN_PARTY_LEVEL..=MAX_PARTY_LEVEL).contains(&self.party_level) {
            return Err(PlacementError::InvalidPartyLevel(self.party_level));
        }
        for (&entity_type, &quantity) in &self.quantities {
            if quantity > MAX_QUANTITY_PER_TYPE {
                return Err(PlacementError::InvalidQuantity {
                    entity_type,
                    quantity,
                });
            }
        }
        if self.total() == 0 {
            return Err(PlacementError::NoSelection);
        }
        Ok(())
    }
}

/// One entity assigned to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub entity_type: EntityType,
    pub entity: EntityRecord,
    /// Index into the map's room list (0-based).
    pub room_index: usize,
    pub x: usize,
    pub y: usize,
}

impl Placement {
    /// Room number as shown to the user (1-based).
    pub fn room_number(&self) -> usize {
        self.room_index + 1
    }

    /// Map glyph: the first character of the entity name.
    pub fn glyph(&self) -> char {
        self.entity
            .name
            .chars()
            .next()
            .unwrap_or_else(|| self.entity_type.glyph())
    }
}

/// A monster that should join the initiative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCombatant {
    pub name: String,
    pub hp: i32,
}

/// Result of a placement run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub placements: Vec<Placement>,
    /// Human-readable log of the run.
    pub log: Vec<String>,
    /// Placed monsters, in placement order.
    pub new_combatants: Vec<NewCombatant>,
    /// Queue entries dropped because their room had no interior.
    pub skipped: usize,
}

impl PlacementOutcome {
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn log_text(&self) -> String {
        self.log.join("\n")
    }
}

/// Catalog filter used for an entity type at a given party level.
pub fn pool_filter(entity_type: EntityType, party_level: u32) -> EntityFilter {
    match entity_type {
        EntityType::Monster => EntityFilter::MaxChallengeRating((party_level / 2).max(1) as f32),
        EntityType::MagicItem => {
            let mut rarities = vec![Rarity::Common, Rarity::Uncommon, Rarity::Rare];
            if party_level >= 10 {
                rarities.push(Rarity::VeryRare);
            }
            EntityFilter::Rarities(rarities)
        }
        EntityType::Armor | EntityType::Weapon => EntityFilter::Any,
    }
}

/// Place entities using the thread-local RNG.
pub fn place<C: Catalog + ?Sized>(
    rooms: &[Room],
    request: &PlacementRequest,
    catalog: &C,
) -> Result<PlacementOutcome, PlacementError> {
    place_with_rng(rooms, request, catalog, &mut rand::thread_rng())
}

/// Place entities with a specific RNG (useful for testing).
pub fn place_with_rng<C: Catalog + ?Sized, R: Rng + ?Sized>(
    rooms: &[Room],
    request: &PlacementRequest,
    catalog: &C,
    rng: &mut R,
) -> Result<PlacementOutcome, PlacementError> {
    if rooms.is_empty() {
        return Err(PlacementError::NoRoomsAvailable);
    }
    request.validate()?;

    let mut outcome = PlacementOutcome::default();
    outcome.log.push(format!(
        "Placing entities for party level {} in {} rooms.",
        request.party_level,
        rooms.len()
    ));

    let total = request.total();
    let max_entities = total.min(rooms.len()).min(MAX_ENTITIES);
    if max_entities < total {
        log::warn!("Placement truncated from {total} to {max_entities} entities");
        outcome.log.push(format!(
            "Warning: Limited to {max_entities} entities due to {} rooms available.",
            rooms.len()
        ));
    }

    // Every pool is resolved before anything is placed.
    let mut pools: BTreeMap<EntityType, Vec<EntityRecord>> = BTreeMap::new();
    for (&entity_type, &quantity) in &request.quantities {
        if quantity == 0 {
            continue;
        }
        let filter = pool_filter(entity_type, request.party_level);
        let pool = catalog.query(entity_type, &filter, POOL_LIMIT)?;
        if pool.is_empty() {
            return Err(PlacementError::CatalogEmpty(entity_type));
        }
        outcome
            .log
            .push(format!("Found {} {} for placement.", pool.len(), entity_type));
        pools.insert(entity_type, pool);
    }

    let mut queue: Vec<EntityType> = request
        .quantities
        .iter()
        .flat_map(|(&entity_type, &quantity)| std::iter::repeat(entity_type).take(quantity))
        .collect();
    queue.shuffle(rng);

    let mut used = vec![false; rooms.len()];
    for &entity_type in queue.iter().take(max_entities) {
        let Some(pool) = pools.get(&entity_type) else {
            continue;
        };
        let Some(entity) = pool.choose(rng) else {
            continue;
        };

        let room_index = choose_room(&used, rng);
        used[room_index] = true;
        let room = &rooms[room_index];

        let Some((cols, rows)) = room.interior() else {
            log::warn!(
                "Room {} ({}x{}) has no interior, skipping {}",
                room_index + 1,
                room.width(),
                room.height(),
                entity.name
            );
            outcome.log.push(format!(
                "Skipping invalid room {} with size {}x{}",
                room_index + 1,
                room.width(),
                room.height()
            ));
            outcome.skipped += 1;
            continue;
        };
        let x = rng.gen_range(cols);
        let y = rng.gen_range(rows);

        let placement = Placement {
            entity_type,
            entity: entity.clone(),
            room_index,
            x,
            y,
        };
        outcome.log.push(format!(
            "{}. {}: {} at ({},{}) in Room {}",
            outcome.placements.len() + 1,
            entity_type,
            entity.name,
            x,
            y,
            placement.room_number()
        ));

        if entity_type == EntityType::Monster {
            let hp = entity
                .hit_points()
                .filter(|hp| *hp >= 0)
                .unwrap_or(FALLBACK_HP);
            outcome.new_combatants.push(NewCombatant {
                name: entity.name.clone(),
                hp,
            });
        }
        outcome.placements.push(placement);
    }

    outcome
        .log
        .push(format!("Placed {} entities", outcome.placements.len()));
    log::info!(
        "Placed {} entities ({} skipped) across {} rooms",
        outcome.placements.len(),
        outcome.skipped,
        rooms.len()
    );

    Ok(outcome)
}

/// Pick a room index, preferring rooms not used yet in this run.
fn choose_room<R: Rng + ?Sized>(used: &[bool], rng: &mut R) -> usize {
    let unused: Vec<usize> = (0..used.len()).filter(|&i| !used[i]).collect();
    if unused.is_empty() {
        rng.gen_range(0..used.len())
    } else {
        unused[rng.gen_range(0..unused.len())]
    }
}
