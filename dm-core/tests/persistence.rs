//! Save/load tests for combat state.
//!
//! Run with: `cargo test -p dm-core --test persistence`

use dm_core::persist::{load_combat, recall_last_path, remember_last_path, save_combat};
use dm_core::{AssistantConfig, CombatRecord, CombatState, DmSession, ErrorKind};
use tempfile::TempDir;

fn mid_fight() -> CombatState {
    let mut state = CombatState::new();
    state.add_combatant("Aria", 30, Some(15)).unwrap();
    state.add_combatant("Goblin", 7, Some(12)).unwrap();
    state.add_combatant("Borin", 40, Some(18)).unwrap();
    state.sort_initiative();
    state.add_ailment("Goblin", "Poisoned", 3, "Aria").unwrap();
    state.add_ailment("Borin", "Blessed", 10, "Aria").unwrap();
    for _ in 0..5 {
        state.next_turn();
    }
    state.apply_damage("Goblin", 3).unwrap();
    state
}

// =============================================================================
// Round trip
// =============================================================================

#[tokio::test]
async fn test_round_trip_preserves_everything() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fight.json");
    let state = mid_fight();

    save_combat(&state, &path).await.unwrap();
    let loaded = load_combat(&path).await.unwrap();

    let names = |s: &CombatState| -> Vec<(String, i32, i32)> {
        s.combatants()
            .iter()
            .map(|c| (c.name.clone(), c.hp, c.initiative))
            .collect()
    };
    assert_eq!(names(&loaded), names(&state));
    assert_eq!(loaded.current_turn(), state.current_turn());
    assert_eq!(loaded.round(), 2);
    assert_eq!(loaded.round_leader(), Some("Borin"));
    assert_eq!(loaded.log(), state.log());

    let ailments: Vec<(&str, u32)> = loaded
        .ailments_for("Borin")
        .iter()
        .map(|a| (a.name.as_str(), a.duration))
        .collect();
    assert_eq!(ailments, vec![("Blessed", 8)]);
}

#[tokio::test]
async fn test_multi_line_note_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.json");
    let mut state = mid_fight();
    state.note("The bridge collapses.\nEveryone falls.");

    save_combat(&state, &path).await.unwrap();
    let loaded = load_combat(&path).await.unwrap();
    assert_eq!(loaded.log().len(), state.log().len());
    assert_eq!(loaded.log(), state.log());
}

#[tokio::test]
async fn test_save_reload_save_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    save_combat(&mid_fight(), &first).await.unwrap();
    let loaded = load_combat(&first).await.unwrap();
    save_combat(&loaded, &second).await.unwrap();

    let a = tokio::fs::read_to_string(&first).await.unwrap();
    let b = tokio::fs::read_to_string(&second).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_document_field_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fight.json");
    save_combat(&mid_fight(), &path).await.unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
    assert_eq!(value["current_turn_row"], 1);
    assert_eq!(value["current_round"], 2);
    assert_eq!(value["first_combatant_name_for_round_check"], "Borin");
    assert_eq!(value["combatants"][0]["name"], "Borin");
    assert_eq!(value["ailments"][0]["ailment"], "Poisoned");
    assert_eq!(value["ailments"][1]["duration"], 8);
    assert!(value["combat_log"].as_str().unwrap().contains("Round 2 begins."));

    let record: CombatRecord = serde_json::from_value(value).unwrap();
    assert_eq!(record.combatants.len(), 3);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_corrupt_file_is_persistence_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    tokio::fs::write(&path, r#"{"combatants": [{"name": 5}]}"#)
        .await
        .unwrap();

    let mut session = DmSession::with_seed(
        AssistantConfig::new().with_last_state_file(dir.path().join("last.txt")),
        1,
    )
    .await
    .unwrap();
    session.add_combatant("Keeper", 12, Some(9)).unwrap();

    let err = session.load_combat(&path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    assert!(session.combat().combatant("Keeper").is_some());
    assert_eq!(session.combat_path(), None);
}

#[tokio::test]
async fn test_save_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no").join("such").join("dir.json");
    let err = save_combat(&mid_fight(), &path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
}

// =============================================================================
// Resume marker
// =============================================================================

#[tokio::test]
async fn test_marker_points_at_latest_save() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("last_combat_state_path.txt");
    let older = dir.path().join("older.json");
    let newer = dir.path().join("newer.json");

    save_combat(&CombatState::new(), &older).await.unwrap();
    save_combat(&CombatState::new(), &newer).await.unwrap();
    remember_last_path(&marker, &older).await.unwrap();
    remember_last_path(&marker, &newer).await.unwrap();

    assert_eq!(recall_last_path(&marker).await, Some(newer.clone()));

    tokio::fs::remove_file(&newer).await.unwrap();
    assert_eq!(recall_last_path(&marker).await, None);
}
