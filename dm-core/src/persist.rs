//! Combat state persistence.
//!
//! States are written as a pretty-printed JSON `CombatRecord`. Combatants are
//! referenced by name on disk; ids are reassigned on load. A small marker
//! file remembers the last save path so the next run can resume.

use crate::combat::{Ailment, Combatant, CombatLog, CombatState};
use crate::error::ErrorKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid combat record: {0}")]
    InvalidRecord(String),
}

impl PersistError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PersistenceFailure
    }
}

/// A combatant row as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantRecord {
    pub name: String,
    pub initiative: i32,
    #[serde(deserialize_with = "number_or_text")]
    pub hp: i32,
}

/// An ailment row as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AilmentRecord {
    pub target: String,
    pub ailment: String,
    pub duration: u32,
    #[serde(default)]
    pub source: String,
}

/// The persisted combat document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRecord {
    #[serde(default)]
    pub combatants: Vec<CombatantRecord>,

    #[serde(default)]
    pub ailments: Vec<AilmentRecord>,

    /// Active row, or -1 when no turn is active.
    #[serde(default = "no_turn")]
    pub current_turn_row: i64,

    #[serde(default = "first_round")]
    pub current_round: u32,

    /// The rendered combat log.
    #[serde(default)]
    pub combat_log: String,

    /// Name of the combatant that led the order at the last sort.
    #[serde(default)]
    pub first_combatant_name_for_round_check: String,
}

fn no_turn() -> i64 {
    -1
}

fn first_round() -> u32 {
    1
}

/// Hit points were historically saved as text; accept either form.
fn number_or_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => i32::try_from(n).map_err(serde::de::Error::custom),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("hit points are not a number: '{s}'"))),
    }
}

impl From<&CombatState> for CombatRecord {
    fn from(state: &CombatState) -> Self {
        let combatants = state
            .combatants()
            .iter()
            .map(|c| CombatantRecord {
                name: c.name.clone(),
                initiative: c.initiative,
                hp: c.hp,
            })
            .collect();

        let ailments = state
            .ailments()
            .iter()
            .filter_map(|a| {
                state.combatant_by_id(a.target).map(|target| AilmentRecord {
                    target: target.name.clone(),
                    ailment: a.name.clone(),
                    duration: a.duration,
                    source: a.source.clone(),
                })
            })
            .collect();

        Self {
            combatants,
            ailments,
            current_turn_row: state.current_turn().map(|i| i as i64).unwrap_or(-1),
            current_round: state.round(),
            combat_log: state.log().render(),
            first_combatant_name_for_round_check: state.round_leader().unwrap_or_default().to_string(),
        }
    }
}

impl TryFrom<CombatRecord> for CombatState {
    type Error = PersistError;

    fn try_from(record: CombatRecord) -> Result<Self, Self::Error> {
        if record.current_round < 1 {
            return Err(PersistError::InvalidRecord(format!(
                "round must be at least 1, found {}",
                record.current_round
            )));
        }

        let mut seen = HashSet::new();
        let mut combatants = Vec::with_capacity(record.combatants.len());
        for row in record.combatants {
            let name = row.name.trim().to_string();
            if name.is_empty() {
                return Err(PersistError::InvalidRecord("combatant without a name".into()));
            }
            if row.hp < 0 {
                return Err(PersistError::InvalidRecord(format!(
                    "{name} has negative hit points"
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(PersistError::InvalidRecord(format!(
                    "duplicate combatant name '{name}'"
                )));
            }
            combatants.push(Combatant::new(name, row.hp, row.initiative));
        }

        let current_turn = match record.current_turn_row {
            -1 => None,
            row if row >= 0 && (row as usize) < combatants.len() => Some(row as usize),
            row => {
                return Err(PersistError::InvalidRecord(format!(
                    "turn row {row} is out of range for {} combatants",
                    combatants.len()
                )))
            }
        };

        let ids: HashMap<&str, _> = combatants.iter().map(|c| (c.name.as_str(), c.id)).collect();
        let mut ailments = Vec::with_capacity(record.ailments.len());
        for row in record.ailments {
            if row.duration < 1 {
                return Err(PersistError::InvalidRecord(format!(
                    "ailment '{}' on {} has no turns left",
                    row.ailment, row.target
                )));
            }
            let target = *ids.get(row.target.trim()).ok_or_else(|| {
                PersistError::InvalidRecord(format!(
                    "ailment '{}' targets unknown combatant '{}'",
                    row.ailment, row.target
                ))
            })?;
            ailments.push(Ailment {
                target,
                name: row.ailment,
                duration: row.duration,
                source: row.source,
            });
        }

        let leader = record.first_combatant_name_for_round_check.trim();
        let round_leader = (!leader.is_empty()).then(|| leader.to_string());

        Ok(CombatState::from_parts(
            combatants,
            ailments,
            current_turn,
            record.current_round,
            round_leader,
            CombatLog::from_text(&record.combat_log),
        ))
    }
}

impl CombatRecord {
    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Write a combat state to `path`.
pub async fn save_combat(state: &CombatState, path: impl AsRef<Path>) -> Result<(), PersistError> {
    CombatRecord::from(state).save_json(path).await
}

/// Read and validate a combat state from `path`.
pub async fn load_combat(path: impl AsRef<Path>) -> Result<CombatState, PersistError> {
    let record = CombatRecord::load_json(path).await?;
    CombatState::try_from(record)
}

/// Record `path` in the marker file as the last used combat save.
pub async fn remember_last_path(
    marker: impl AsRef<Path>,
    path: impl AsRef<Path>,
) -> Result<(), PersistError> {
    fs::write(marker, path.as_ref().to_string_lossy().as_bytes()).await?;
    Ok(())
}

/// The remembered save path, if the marker exists and the file it names
/// still exists.
pub async fn recall_last_path(marker: impl AsRef<Path>) -> Option<PathBuf> {
    let content = fs::read_to_string(marker.as_ref()).await.ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    let path = PathBuf::from(trimmed);
    fs::metadata(&path).await.ok().map(|_| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> CombatState {
        let mut state = CombatState::new();
        state.add_combatant("Aria", 30, Some(15)).unwrap();
        state.add_combatant("Goblin", 7, Some(12)).unwrap();
        state.add_combatant("Borin", 40, Some(18)).unwrap();
        state.sort_initiative();
        state.add_ailment("Goblin", "Poisoned", 3, "Aria").unwrap();
        state.next_turn();
        state.next_turn();
        state
    }

    #[test]
    fn test_record_fields() {
        let record = CombatRecord::from(&sample_state());
        assert_eq!(record.combatants.len(), 3);
        assert_eq!(record.combatants[0].name, "Borin");
        assert_eq!(record.current_turn_row, 1);
        assert_eq!(record.current_round, 1);
        assert_eq!(record.first_combatant_name_for_round_check, "Borin");
        assert_eq!(record.ailments[0].target, "Goblin");
        assert!(record.combat_log.contains("Initiative order sorted."));
    }

    #[test]
    fn test_record_round_trip_is_stable() {
        let state = sample_state();
        let record = CombatRecord::from(&state);
        let restored = CombatState::try_from(record.clone()).unwrap();
        assert_eq!(CombatRecord::from(&restored), record);
        assert_eq!(restored.log(), state.log());
    }

    #[test]
    fn test_empty_state_record() {
        let record = CombatRecord::from(&CombatState::new());
        assert_eq!(record.current_turn_row, -1);
        assert_eq!(record.first_combatant_name_for_round_check, "");
        let restored = CombatState::try_from(record).unwrap();
        assert_eq!(restored.current_turn(), None);
        assert_eq!(restored.round_leader(), None);
    }

    #[test]
    fn test_rejects_inconsistent_records() {
        let good = CombatRecord::from(&sample_state());

        let mut bad_round = good.clone();
        bad_round.current_round = 0;
        assert!(CombatState::try_from(bad_round).is_err());

        let mut bad_row = good.clone();
        bad_row.current_turn_row = 3;
        assert!(CombatState::try_from(bad_row).is_err());

        let mut bad_target = good.clone();
        bad_target.ailments[0].target = "Nobody".into();
        assert!(CombatState::try_from(bad_target).is_err());

        let mut bad_duration = good.clone();
        bad_duration.ailments[0].duration = 0;
        assert!(CombatState::try_from(bad_duration).is_err());

        let mut dup = good;
        dup.combatants[1].name = "Borin".into();
        let err = CombatState::try_from(dup).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    }

    #[test]
    fn test_accepts_text_hit_points() {
        let json = r#"{
            "combatants": [{"name": "Ogre", "initiative": 8, "hp": "59"}],
            "ailments": [],
            "current_turn_row": -1,
            "current_round": 1,
            "combat_log": "",
            "first_combatant_name_for_round_check": ""
        }"#;
        let record: CombatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.combatants[0].hp, 59);

        let bad = json.replace("\"59\"", "\"lots\"");
        assert!(serde_json::from_str::<CombatRecord>(&bad).is_err());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combat.json");
        let state = sample_state();

        save_combat(&state, &path).await.unwrap();
        let loaded = load_combat(&path).await.unwrap();

        assert_eq!(CombatRecord::from(&loaded), CombatRecord::from(&state));
        assert_eq!(loaded.current_combatant().unwrap().name, "Aria");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_combat(dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }

    #[tokio::test]
    async fn test_last_path_marker() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("last.txt");
        let save = dir.path().join("combat.json");

        assert_eq!(recall_last_path(&marker).await, None);

        remember_last_path(&marker, &save).await.unwrap();
        // The named file does not exist yet.
        assert_eq!(recall_last_path(&marker).await, None);

        save_combat(&CombatState::new(), &save).await.unwrap();
        assert_eq!(recall_last_path(&marker).await, Some(save));
    }
}
