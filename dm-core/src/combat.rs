//! Combat tracker: initiative order, turns, rounds, hit points and ailments.
//!
//! `CombatState` is a plain value. Every mutating operation validates its
//! input first, so an `Err` leaves the state untouched. Successful mutations
//! append to the timestamped combat log and return the [`CombatEvent`]s a
//! presentation layer needs to refresh itself.
//!
//! Turn model:
//! - No turn is active after creation, after sorting, and when the list is empty.
//! - `next_turn` from no active turn starts the current round at row 0
//!   without counting a new round, so N turns from any point advance the
//!   round exactly once.
//! - Wrapping from the last row back to row 0 starts a new round.
//! - Arriving on a combatant ticks that combatant's ailments down by one;
//!   ailments that reach zero are removed in the same step.

use crate::error::ErrorKind;
use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors from combat operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CombatError {
    #[error("Combatant name cannot be empty")]
    EmptyName,

    #[error("A combatant named '{0}' is already in combat")]
    DuplicateName(String),

    #[error("Hit points cannot be negative: {0}")]
    NegativeHitPoints(i32),

    #[error("Amount must be at least 1, got {0}")]
    InvalidAmount(i32),

    #[error("Ailment duration must be at least 1 turn")]
    InvalidDuration,

    #[error("Ailment name cannot be empty")]
    EmptyAilmentName,

    #[error("Combatant not found: {0}")]
    UnknownCombatant(String),

    #[error("Ailment '{ailment}' not found on {target}")]
    UnknownAilment { target: String, ailment: String },
}

impl CombatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CombatError::DuplicateName(_) => ErrorKind::Conflict,
            CombatError::UnknownCombatant(_) | CombatError::UnknownAilment { .. } => {
                ErrorKind::NotFound
            }
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Stable identity of a combatant, independent of its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant in the initiative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub hp: i32,
    pub initiative: i32,
}

impl Combatant {
    pub fn new(name: impl Into<String>, hp: i32, initiative: i32) -> Self {
        Self {
            id: CombatantId::new(),
            name: name.into(),
            hp,
            initiative,
        }
    }

    pub fn is_down(&self) -> bool {
        self.hp <= 0
    }
}

/// A timed status effect on a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ailment {
    pub target: CombatantId,
    pub name: String,
    /// Turns remaining; always at least 1 while the ailment exists.
    pub duration: u32,
    pub source: String,
}

/// The user-facing combat log. Each line starts with an `[HH:MM:SS]` stamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatLog {
    lines: Vec<String>,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message stamped with the local time.
    ///
    /// Line breaks inside the message become spaces, so one call is always
    /// one line of the rendered log.
    pub fn push(&mut self, message: impl fmt::Display) {
        let stamp = Local::now().format("[%H:%M:%S]");
        let message = message.to_string().replace(['\r', '\n'], " ");
        self.lines.push(format!("{stamp} {message}"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    /// The full log as text, one entry per line.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    /// Rebuild a log from previously rendered text.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Change notifications returned by mutating operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEvent {
    CombatantAdded { id: CombatantId, name: String },
    CombatantRemoved { id: CombatantId, name: String },
    InitiativeSorted,
    RoundStarted(u32),
    TurnStarted { id: CombatantId, name: String },
    HitPointsChanged { id: CombatantId, hp: i32 },
    Fallen { id: CombatantId, name: String },
    AilmentAdded { target: CombatantId, name: String },
    AilmentTicked { target: CombatantId, name: String, remaining: u32 },
    AilmentEnded { target: CombatantId, name: String },
    AilmentRemoved { target: CombatantId, name: String },
}

/// Everything the combat tracker knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatState {
    combatants: Vec<Combatant>,
    ailments: Vec<Ailment>,
    current_turn: Option<usize>,
    round: u32,
    round_leader: Option<String>,
    log: CombatLog,
}

impl Default for CombatState {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatState {
    pub fn new() -> Self {
        Self {
            combatants: Vec::new(),
            ailments: Vec::new(),
            current_turn: None,
            round: 1,
            round_leader: None,
            log: CombatLog::new(),
        }
    }

    /// Assemble a state from already-validated parts.
    pub(crate) fn from_parts(
        combatants: Vec<Combatant>,
        ailments: Vec<Ailment>,
        current_turn: Option<usize>,
        round: u32,
        round_leader: Option<String>,
        log: CombatLog,
    ) -> Self {
        Self {
            combatants,
            ailments,
            current_turn,
            round,
            round_leader,
            log,
        }
    }

    // Queries

    /// Combatants in initiative order.
    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, name: &str) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.name == name)
    }

    pub fn combatant_by_id(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn current_combatant(&self) -> Option<&Combatant> {
        self.current_turn.and_then(|i| self.combatants.get(i))
    }

    pub fn ailments(&self) -> &[Ailment] {
        &self.ailments
    }

    /// Ailments on the named combatant, oldest first.
    pub fn ailments_for(&self, name: &str) -> Vec<&Ailment> {
        match self.combatant(name) {
            Some(c) => self.ailments.iter().filter(|a| a.target == c.id).collect(),
            None => Vec::new(),
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Row of the active combatant, or `None` when no turn is active.
    pub fn current_turn(&self) -> Option<usize> {
        self.current_turn
    }

    /// Name of the combatant that led the order at the last sort.
    pub fn round_leader(&self) -> Option<&str> {
        self.round_leader.as_deref()
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// `base` if no combatant uses it yet, otherwise "`base` #2", "`base` #3", ...
    pub fn unique_name(&self, base: &str) -> String {
        let base = base.trim();
        if self.combatant(base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} #{n}"))
            .find(|candidate| self.combatant(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Append a free-form line to the combat log.
    pub fn note(&mut self, message: impl fmt::Display) {
        self.log.push(message);
    }

    // Mutations

    /// Add a combatant, rolling initiative with the thread-local RNG if omitted.
    pub fn add_combatant(
        &mut self,
        name: &str,
        hp: i32,
        initiative: Option<i32>,
    ) -> Result<Vec<CombatEvent>, CombatError> {
        self.add_combatant_with_rng(name, hp, initiative, &mut rand::thread_rng())
    }

    /// Add a combatant at the end of the order. Missing initiative is drawn
    /// uniformly from 1..=20.
    pub fn add_combatant_with_rng<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        hp: i32,
        initiative: Option<i32>,
        rng: &mut R,
    ) -> Result<Vec<CombatEvent>, CombatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CombatError::EmptyName);
        }
        if hp < 0 {
            return Err(CombatError::NegativeHitPoints(hp));
        }
        if self.combatant(name).is_some() {
            return Err(CombatError::DuplicateName(name.to_string()));
        }

        let initiative = initiative.unwrap_or_else(|| rng.gen_range(1..=20));
        let combatant = Combatant::new(name, hp, initiative);
        let id = combatant.id;
        self.combatants.push(combatant);
        self.log.push(format!(
            "Added {name} (HP: {hp}, Initiative: {initiative}) to combat."
        ));
        log::debug!("Combatant {name} joined with initiative {initiative}");

        Ok(vec![CombatEvent::CombatantAdded {
            id,
            name: name.to_string(),
        }])
    }

    /// Remove a combatant and every ailment on it.
    ///
    /// Removing a row above the active one keeps the same combatant active.
    /// Removing the active combatant hands the turn back one row, so the next
    /// `next_turn` lands on the combatant that followed it.
    pub fn remove_combatant(&mut self, name: &str) -> Result<Vec<CombatEvent>, CombatError> {
        let index = self
            .combatants
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| CombatError::UnknownCombatant(name.to_string()))?;

        let removed = self.combatants.remove(index);
        let mut events = Vec::new();

        let (gone, kept): (Vec<Ailment>, Vec<Ailment>) = std::mem::take(&mut self.ailments)
            .into_iter()
            .partition(|a| a.target == removed.id);
        self.ailments = kept;
        for ailment in gone {
            self.log.push(format!(
                "Removed ailment '{}' from {} due to combatant removal.",
                ailment.name, removed.name
            ));
            events.push(CombatEvent::AilmentRemoved {
                target: removed.id,
                name: ailment.name,
            });
        }

        self.current_turn = match self.current_turn {
            Some(current) if index < current => Some(current - 1),
            Some(current) if index == current => current.checked_sub(1),
            other => other,
        };

        if self.combatants.is_empty() {
            self.current_turn = None;
            self.round = 1;
            self.round_leader = None;
        } else if self.round_leader.as_deref() == Some(removed.name.as_str()) {
            self.round_leader = self.combatants.first().map(|c| c.name.clone());
        }

        self.log.push(format!("Removed {} from combat.", removed.name));
        events.push(CombatEvent::CombatantRemoved {
            id: removed.id,
            name: removed.name,
        });
        Ok(events)
    }

    /// Stable sort by initiative, highest first. Clears the active turn.
    pub fn sort_initiative(&mut self) -> Vec<CombatEvent> {
        self.combatants
            .sort_by(|a, b| b.initiative.cmp(&a.initiative));
        self.current_turn = None;
        self.round_leader = self.combatants.first().map(|c| c.name.clone());
        self.log.push("Initiative order sorted.");
        vec![CombatEvent::InitiativeSorted]
    }

    /// Advance to the next combatant. Does nothing when nobody is in combat.
    pub fn next_turn(&mut self) -> Vec<CombatEvent> {
        let count = self.combatants.len();
        if count == 0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        let next = match self.current_turn {
            None => 0,
            Some(current) => (current + 1) % count,
        };
        if self.current_turn.is_some() && next == 0 {
            self.round += 1;
            self.log.push(format!("Round {} begins.", self.round));
            events.push(CombatEvent::RoundStarted(self.round));
        }
        self.current_turn = Some(next);

        let id = self.combatants[next].id;
        let name = self.combatants[next].name.clone();

        for ailment in self.ailments.iter_mut().filter(|a| a.target == id) {
            ailment.duration = ailment.duration.saturating_sub(1);
            if ailment.duration == 0 {
                self.log
                    .push(format!("'{}' on {name} has ended.", ailment.name));
                events.push(CombatEvent::AilmentEnded {
                    target: id,
                    name: ailment.name.clone(),
                });
            } else {
                self.log.push(format!(
                    "'{}' on {name} now has {} turns remaining.",
                    ailment.name, ailment.duration
                ));
                events.push(CombatEvent::AilmentTicked {
                    target: id,
                    name: ailment.name.clone(),
                    remaining: ailment.duration,
                });
            }
        }
        self.ailments.retain(|a| a.duration > 0);

        self.log.push(format!("{name}'s turn."));
        events.push(CombatEvent::TurnStarted { id, name });
        events
    }

    /// Subtract hit points, never going below zero.
    pub fn apply_damage(&mut self, name: &str, amount: i32) -> Result<Vec<CombatEvent>, CombatError> {
        if amount < 1 {
            return Err(CombatError::InvalidAmount(amount));
        }
        let combatant = self.combatant_mut(name)?;
        combatant.hp = combatant.hp.saturating_sub(amount).max(0);
        let (id, hp, name) = (combatant.id, combatant.hp, combatant.name.clone());

        self.log
            .push(format!("{name} took {amount} HP. Current HP: {hp}."));
        let mut events = vec![CombatEvent::HitPointsChanged { id, hp }];
        if hp <= 0 {
            self.log.push(format!("{name} is at 0 HP or less!"));
            log::info!("{name} has fallen");
            events.push(CombatEvent::Fallen { id, name });
        }
        Ok(events)
    }

    /// Add hit points. There is no maximum.
    pub fn heal(&mut self, name: &str, amount: i32) -> Result<Vec<CombatEvent>, CombatError> {
        if amount < 1 {
            return Err(CombatError::InvalidAmount(amount));
        }
        let combatant = self.combatant_mut(name)?;
        combatant.hp = combatant.hp.saturating_add(amount);
        let (id, hp, name) = (combatant.id, combatant.hp, combatant.name.clone());

        self.log
            .push(format!("{name} healed {amount} HP. Current HP: {hp}."));
        Ok(vec![CombatEvent::HitPointsChanged { id, hp }])
    }

    pub fn add_ailment(
        &mut self,
        target: &str,
        name: &str,
        duration: u32,
        source: &str,
    ) -> Result<Vec<CombatEvent>, CombatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CombatError::EmptyAilmentName);
        }
        if duration < 1 {
            return Err(CombatError::InvalidDuration);
        }
        let target_id = self
            .combatant(target)
            .map(|c| c.id)
            .ok_or_else(|| CombatError::UnknownCombatant(target.to_string()))?;

        let source = source.trim();
        self.ailments.push(Ailment {
            target: target_id,
            name: name.to_string(),
            duration,
            source: source.to_string(),
        });
        self.log.push(format!(
            "Added ailment '{name}' to {target} for {duration} turns (Source: {source})."
        ));
        Ok(vec![CombatEvent::AilmentAdded {
            target: target_id,
            name: name.to_string(),
        }])
    }

    /// Remove the oldest ailment called `name` on `target`.
    pub fn remove_ailment(&mut self, target: &str, name: &str) -> Result<Vec<CombatEvent>, CombatError> {
        let target_id = self
            .combatant(target)
            .map(|c| c.id)
            .ok_or_else(|| CombatError::UnknownCombatant(target.to_string()))?;
        let index = self
            .ailments
            .iter()
            .position(|a| a.target == target_id && a.name == name)
            .ok_or_else(|| CombatError::UnknownAilment {
                target: target.to_string(),
                ailment: name.to_string(),
            })?;

        let removed = self.ailments.remove(index);
        self.log.push(format!(
            "Manually removed ailment '{}' from {target}.",
            removed.name
        ));
        Ok(vec![CombatEvent::AilmentRemoved {
            target: target_id,
            name: removed.name,
        }])
    }

    fn combatant_mut(&mut self, name: &str) -> Result<&mut Combatant, CombatError> {
        self.combatants
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| CombatError::UnknownCombatant(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn party() -> CombatState {
        let mut state = CombatState::new();
        state.add_combatant("Aria", 30, Some(15)).unwrap();
        state.add_combatant("Goblin", 7, Some(12)).unwrap();
        state.add_combatant("Borin", 40, Some(18)).unwrap();
        state
    }

    fn names(state: &CombatState) -> Vec<&str> {
        state.combatants().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_new_state() {
        let state = CombatState::new();
        assert_eq!(state.round(), 1);
        assert_eq!(state.current_turn(), None);
        assert!(state.is_empty());
        assert!(state.log().is_empty());
    }

    #[test]
    fn test_add_rolls_initiative_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut state = CombatState::new();
        for i in 0..30 {
            state
                .add_combatant_with_rng(&format!("Rat {i}"), 1, None, &mut rng)
                .unwrap();
        }
        assert!(state
            .combatants()
            .iter()
            .all(|c| (1..=20).contains(&c.initiative)));
    }

    #[test]
    fn test_add_validation() {
        let mut state = party();
        let before = state.clone();

        assert_eq!(state.add_combatant("  ", 5, Some(1)), Err(CombatError::EmptyName));
        assert_eq!(
            state.add_combatant("Ogre", -1, Some(1)),
            Err(CombatError::NegativeHitPoints(-1))
        );
        let err = state.add_combatant("Goblin", 5, Some(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(state, before);
    }

    #[test]
    fn test_add_logs_with_timestamp() {
        let state = party();
        let first = &state.log().lines()[0];
        assert!(first.starts_with('['));
        assert_eq!(&first[9..11], "] ");
        assert!(first.ends_with("Added Aria (HP: 30, Initiative: 15) to combat."));
    }

    #[test]
    fn test_unique_name() {
        let mut state = party();
        assert_eq!(state.unique_name("Orc"), "Orc");
        assert_eq!(state.unique_name("Goblin"), "Goblin #2");
        state.add_combatant("Goblin #2", 7, Some(3)).unwrap();
        assert_eq!(state.unique_name("Goblin"), "Goblin #3");
    }

    #[test]
    fn test_sort_is_stable_descending() {
        let mut state = CombatState::new();
        state.add_combatant("A", 1, Some(10)).unwrap();
        state.add_combatant("B", 1, Some(20)).unwrap();
        state.add_combatant("C", 1, Some(10)).unwrap();
        state.next_turn();

        state.sort_initiative();
        assert_eq!(names(&state), vec!["B", "A", "C"]);
        assert_eq!(state.current_turn(), None);
        assert_eq!(state.round_leader(), Some("B"));
        assert!(state.log().last().unwrap().ends_with("Initiative order sorted."));
    }

    #[test]
    fn test_first_turn_does_not_advance_round() {
        let mut state = party();
        let events = state.next_turn();
        assert_eq!(state.current_turn(), Some(0));
        assert_eq!(state.round(), 1);
        assert!(!events.iter().any(|e| matches!(e, CombatEvent::RoundStarted(_))));
        assert!(state.log().last().unwrap().ends_with("Aria's turn."));
    }

    #[test]
    fn test_full_cycle_increments_round_once() {
        let mut state = party();
        state.next_turn();
        let start = state.current_turn();

        for _ in 0..state.len() {
            state.next_turn();
        }
        assert_eq!(state.current_turn(), start);
        assert_eq!(state.round(), 2);
        assert!(state.log().contains("Round 2 begins."));
    }

    #[test]
    fn test_next_turn_on_empty_is_noop() {
        let mut state = CombatState::new();
        assert!(state.next_turn().is_empty());
        assert_eq!(state.current_turn(), None);
        assert!(state.log().is_empty());
    }

    #[test]
    fn test_ailment_ticks_only_on_its_target() {
        let mut state = party();
        state.add_ailment("Goblin", "Poisoned", 2, "Aria").unwrap();

        state.next_turn(); // Aria
        assert_eq!(state.ailments_for("Goblin")[0].duration, 2);

        let events = state.next_turn(); // Goblin
        assert_eq!(state.ailments_for("Goblin")[0].duration, 1);
        assert!(events.iter().any(|e| matches!(
            e,
            CombatEvent::AilmentTicked { remaining: 1, .. }
        )));
        assert!(state
            .log()
            .contains("'Poisoned' on Goblin now has 1 turns remaining."));

        state.next_turn(); // Borin
        state.next_turn(); // Aria
        state.next_turn(); // Goblin
        assert!(state.ailments_for("Goblin").is_empty());
        assert!(state.log().contains("'Poisoned' on Goblin has ended."));
    }

    #[test]
    fn test_ailment_validation() {
        let mut state = party();
        assert_eq!(
            state.add_ailment("Goblin", "Stunned", 0, ""),
            Err(CombatError::InvalidDuration)
        );
        assert_eq!(
            state.add_ailment("Goblin", " ", 1, ""),
            Err(CombatError::EmptyAilmentName)
        );
        let err = state.add_ailment("Nobody", "Stunned", 1, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(state.ailments().is_empty());
    }

    #[test]
    fn test_remove_ailment_takes_first_match() {
        let mut state = party();
        state.add_ailment("Aria", "Blessed", 3, "Cleric").unwrap();
        state.add_ailment("Aria", "Blessed", 5, "Paladin").unwrap();

        state.remove_ailment("Aria", "Blessed").unwrap();
        let left = state.ailments_for("Aria");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].source, "Paladin");

        let err = state.remove_ailment("Aria", "Cursed").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_damage_clamps_and_reports_fall() {
        let mut state = party();
        let events = state.apply_damage("Goblin", 57).unwrap();
        assert_eq!(state.combatant("Goblin").unwrap().hp, 0);
        assert!(state.combatant("Goblin").unwrap().is_down());
        assert!(events.iter().any(|e| matches!(e, CombatEvent::Fallen { .. })));
        assert!(state.log().contains("Goblin is at 0 HP or less!"));

        // Combat carries on.
        state.next_turn();
        assert_eq!(state.current_turn(), Some(0));
    }

    #[test]
    fn test_heal_has_no_cap() {
        let mut state = party();
        state.heal("Aria", 100).unwrap();
        assert_eq!(state.combatant("Aria").unwrap().hp, 130);
        assert_eq!(state.heal("Aria", 0), Err(CombatError::InvalidAmount(0)));
        assert_eq!(
            state.apply_damage("Aria", -4),
            Err(CombatError::InvalidAmount(-4))
        );
        assert_eq!(state.heal("Zed", 3).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_remove_above_active_keeps_active() {
        let mut state = party();
        state.next_turn();
        state.next_turn(); // Goblin active at row 1
        state.remove_combatant("Aria").unwrap();
        assert_eq!(state.current_turn(), Some(0));
        assert_eq!(state.current_combatant().unwrap().name, "Goblin");
    }

    #[test]
    fn test_remove_active_hands_turn_to_follower() {
        let mut state = party();
        state.next_turn();
        state.next_turn(); // Goblin active
        state.remove_combatant("Goblin").unwrap();
        assert_eq!(state.current_turn(), Some(0));

        state.next_turn();
        assert_eq!(state.current_combatant().unwrap().name, "Borin");
        assert_eq!(state.round(), 1);
    }

    #[test]
    fn test_remove_first_active_returns_to_no_turn() {
        let mut state = party();
        state.next_turn(); // Aria active
        state.remove_combatant("Aria").unwrap();
        assert_eq!(state.current_turn(), None);
        state.next_turn();
        assert_eq!(state.current_combatant().unwrap().name, "Goblin");
    }

    #[test]
    fn test_remove_drops_ailments_and_resets_when_empty() {
        let mut state = party();
        state.sort_initiative();
        state.add_ailment("Goblin", "Prone", 3, "Borin").unwrap();
        for _ in 0..4 {
            state.next_turn();
        }
        assert_eq!(state.round(), 2);

        state.remove_combatant("Goblin").unwrap();
        assert!(state.ailments().is_empty());
        assert!(state
            .log()
            .contains("Removed ailment 'Prone' from Goblin due to combatant removal."));

        state.remove_combatant("Aria").unwrap();
        state.remove_combatant("Borin").unwrap();
        assert_eq!(state.round(), 1);
        assert_eq!(state.current_turn(), None);
        assert_eq!(state.round_leader(), None);

        assert_eq!(
            state.remove_combatant("Borin").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_log_round_trips_through_text() {
        let state = party();
        let text = state.log().render();
        assert_eq!(CombatLog::from_text(&text), *state.log());
    }

    #[test]
    fn test_multi_line_note_stays_one_entry() {
        let mut state = party();
        let before = state.log().len();
        state.note("line one\nline two\r\nline three");

        assert_eq!(state.log().len(), before + 1);
        assert!(state.log().last().unwrap().ends_with("line one line two  line three"));
        let text = state.log().render();
        assert_eq!(CombatLog::from_text(&text), *state.log());
    }
}
