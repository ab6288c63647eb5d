//! DmSession - the primary public API for running a table.
//!
//! A session ties the map generator, the encounter placer, the combat
//! tracker and persistence together. It owns the single random stream used
//! by every random operation, so a seeded session is fully reproducible.

use crate::catalog::{Catalog, CatalogError, MemoryCatalog};
use crate::combat::{CombatError, CombatEvent, CombatState};
use crate::config::{AssistantConfig, ConfigError};
use crate::encounter::{place_with_rng, PlacementError, PlacementOutcome, PlacementRequest};
use crate::error::ErrorKind;
use crate::map::{generate_with_rng, render_ascii, DungeonMap, MapError, RenderError, Theme};
use crate::persist::{self, PersistError};
use crate::prompts::{GenerationError, Prompt, TextGenerator};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from DmSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No map has been generated yet")]
    NoMap,

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Combat error: {0}")]
    Combat(#[from] CombatError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("AI error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NoMap => ErrorKind::ResourceUnavailable,
            SessionError::Map(e) => e.kind(),
            SessionError::Placement(e) => e.kind(),
            SessionError::Catalog(e) => e.kind(),
            SessionError::Combat(e) => e.kind(),
            SessionError::Persist(e) => e.kind(),
            SessionError::Render(e) => e.kind(),
            SessionError::Generation(e) => e.kind(),
            SessionError::Config(e) => e.kind(),
        }
    }
}

/// A running DM session.
pub struct DmSession {
    config: AssistantConfig,
    rng: StdRng,
    catalog: Box<dyn Catalog + Send + Sync>,
    generator: Option<Box<dyn TextGenerator>>,
    map: Option<DungeonMap>,
    placements: PlacementOutcome,
    combat: CombatState,
    combat_path: Option<PathBuf>,
}

impl DmSession {
    /// Create a session. Loads the configured catalog file, if any.
    pub async fn new(config: AssistantConfig) -> Result<Self, SessionError> {
        Self::build(config, StdRng::from_entropy()).await
    }

    /// Create a session whose randomness is fully determined by `seed`.
    pub async fn with_seed(config: AssistantConfig, seed: u64) -> Result<Self, SessionError> {
        Self::build(config, StdRng::seed_from_u64(seed)).await
    }

    async fn build(config: AssistantConfig, rng: StdRng) -> Result<Self, SessionError> {
        let catalog = match &config.catalog_path {
            Some(path) => {
                let catalog = MemoryCatalog::load_json(path).await?;
                log::info!("Loaded {} catalog entries from {}", catalog.len(), path.display());
                catalog
            }
            None => MemoryCatalog::standard(),
        };
        Ok(Self::from_parts(config, rng, Box::new(catalog)))
    }

    pub(crate) fn from_parts(
        config: AssistantConfig,
        rng: StdRng,
        catalog: Box<dyn Catalog + Send + Sync>,
    ) -> Self {
        Self {
            config,
            rng,
            catalog,
            generator: None,
            map: None,
            placements: PlacementOutcome::default(),
            combat: CombatState::new(),
            combat_path: None,
        }
    }

    /// Replace the entity catalog.
    pub fn with_catalog(mut self, catalog: impl Catalog + Send + Sync + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    /// Attach a text generator for [`DmSession::ask`].
    pub fn with_generator(mut self, generator: impl TextGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn map(&self) -> Option<&DungeonMap> {
        self.map.as_ref()
    }

    /// The current placement batch (empty until a placement run succeeds).
    pub fn placements(&self) -> &PlacementOutcome {
        &self.placements
    }

    pub fn combat(&self) -> &CombatState {
        &self.combat
    }

    /// Direct access for combat actions that need no randomness.
    pub fn combat_mut(&mut self) -> &mut CombatState {
        &mut self.combat
    }

    /// Where manual saves and auto-saves currently go.
    pub fn combat_path(&self) -> Option<&Path> {
        self.combat_path.as_deref()
    }

    // Maps and encounters

    /// Generate a new map. Any previous placement batch is discarded.
    ///
    /// The combat log gets a "Generated ... map" note, the one entry in it
    /// that is not about combat.
    pub fn generate_map(
        &mut self,
        width: usize,
        height: usize,
        theme: Theme,
    ) -> Result<&DungeonMap, SessionError> {
        let map = generate_with_rng(width, height, theme, &mut self.rng)?;
        self.placements = PlacementOutcome::default();
        self.combat
            .note(format!("Generated {theme} map with {} rooms.", map.rooms.len()));
        Ok(&*self.map.insert(map))
    }

    /// Place entities on the current map, replacing the previous batch.
    ///
    /// Placed monsters join combat; a name already in use gets a "#n"
    /// suffix. Nothing changes if placement fails.
    pub fn place_entities(
        &mut self,
        request: &PlacementRequest,
    ) -> Result<&PlacementOutcome, SessionError> {
        let map = self.map.as_ref().ok_or(SessionError::NoMap)?;
        let outcome = place_with_rng(&map.rooms, request, &*self.catalog, &mut self.rng)?;

        let mut combat = self.combat.clone();
        for line in &outcome.log {
            combat.note(line);
        }
        for monster in &outcome.new_combatants {
            if monster.name.trim().is_empty() {
                continue;
            }
            let name = combat.unique_name(&monster.name);
            combat.add_combatant_with_rng(&name, monster.hp, None, &mut self.rng)?;
        }

        self.combat = combat;
        self.placements = outcome;
        Ok(&self.placements)
    }

    /// ASCII rendering of the current map and placements.
    pub fn render_map_ascii(&self) -> Option<String> {
        self.map
            .as_ref()
            .map(|map| render_ascii(map, &self.placements.placements))
    }

    /// Write the current map and placements as a PNG.
    pub fn export_map_png(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let map = self.map.as_ref().ok_or(SessionError::NoMap)?;
        crate::map::export_png(map, &self.placements.placements, self.config.tile_size, path)?;
        Ok(())
    }

    // Combat

    /// Add a combatant, rolling initiative from the session RNG if omitted.
    pub fn add_combatant(
        &mut self,
        name: &str,
        hp: i32,
        initiative: Option<i32>,
    ) -> Result<Vec<CombatEvent>, SessionError> {
        Ok(self
            .combat
            .add_combatant_with_rng(name, hp, initiative, &mut self.rng)?)
    }

    /// Save combat to `path` and make it the remembered save path.
    pub async fn save_combat(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        persist::save_combat(&self.combat, path).await?;
        log::info!("Saved combat state to {}", path.display());

        self.combat
            .note(format!("Combat state saved to '{}'", file_label(path)));
        self.set_combat_path(path).await;
        Ok(())
    }

    /// Save combat to the remembered path, or the default auto-save path
    /// when none has been chosen. Returns the path written.
    pub async fn auto_save(&mut self) -> Result<PathBuf, SessionError> {
        let (path, chosen) = match &self.combat_path {
            Some(path) => (path.clone(), true),
            None => (self.config.default_auto_save_path.clone(), false),
        };
        persist::save_combat(&self.combat, &path).await?;
        if !chosen {
            self.set_combat_path(&path).await;
        }
        log::debug!("Auto-saved combat state to {}", path.display());
        Ok(path)
    }

    /// Replace the combat state with the one saved at `path`.
    ///
    /// On failure the current state is kept as is.
    pub async fn load_combat(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let state = persist::load_combat(path).await?;
        self.combat = state;
        self.combat
            .note(format!("Combat state loaded from '{}'", file_label(path)));
        log::info!("Loaded combat state from {}", path.display());
        self.set_combat_path(path).await;
        Ok(())
    }

    /// Load the remembered save, if there is one.
    pub async fn resume_last(&mut self) -> Result<Option<PathBuf>, SessionError> {
        let Some(path) = persist::recall_last_path(&self.config.last_state_file).await else {
            return Ok(None);
        };
        self.load_combat(&path).await?;
        Ok(Some(path))
    }

    async fn set_combat_path(&mut self, path: &Path) {
        self.combat_path = Some(path.to_path_buf());
        if let Err(e) = persist::remember_last_path(&self.config.last_state_file, path).await {
            log::warn!(
                "Could not save last state path to '{}': {e}",
                self.config.last_state_file.display()
            );
        }
    }

    // AI

    /// Send a canned prompt to the attached text generator.
    pub async fn ask(&self, prompt: &Prompt) -> Result<String, SessionError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(GenerationError::NotConfigured)?;
        let text = prompt.render()?;
        Ok(generator.generate(&text).await?)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
