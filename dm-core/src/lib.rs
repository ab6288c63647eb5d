//! Dungeon-Master assistant engine.
//!
//! This crate provides:
//! - Procedural room-and-corridor maps with ASCII and PNG rendering
//! - Encounter placement driven by an entity catalog
//! - A combat tracker with initiative, rounds, hit points and timed ailments
//! - Combat persistence with auto-save and resume
//!
//! # Quick Start
//!
//! ```ignore
//! use dm_core::{AssistantConfig, DmSession, EntityType, PlacementRequest, Theme};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = DmSession::new(AssistantConfig::new()).await?;
//!
//!     let map = session.generate_map(30, 20, Theme::Dungeon)?;
//!     println!("{}", map.describe());
//!
//!     let request = PlacementRequest::new(5).with(EntityType::Monster, 3);
//!     session.place_entities(&request)?;
//!     println!("{}", session.render_map_ascii().unwrap_or_default());
//!
//!     session.combat_mut().sort_initiative();
//!     session.combat_mut().next_turn();
//!     session.save_combat("combat.json").await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod combat;
pub mod config;
pub mod encounter;
pub mod error;
pub mod map;
pub mod persist;
pub mod prompts;
pub mod session;
pub mod testing;

// Primary public API
pub use catalog::{Catalog, EntityFilter, EntityRecord, EntityType, MemoryCatalog, Rarity};
pub use combat::{Ailment, Combatant, CombatantId, CombatError, CombatEvent, CombatState};
pub use config::AssistantConfig;
pub use encounter::{Placement, PlacementError, PlacementOutcome, PlacementRequest};
pub use error::ErrorKind;
pub use map::{DungeonMap, Grid, MapError, Room, Theme};
pub use persist::{CombatRecord, PersistError};
pub use prompts::{Prompt, TextGenerator};
pub use session::{DmSession, SessionError};
pub use testing::{sample_catalog, seeded_session, MockGenerator};
