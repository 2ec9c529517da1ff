// Per-entity alert bookkeeping.

use super::model::AlertRule;
use super::table::RuleTable;
use crate::core::audio::{AudioError, Notifier};
use crate::core::model::EntitySnapshot;

/// Modifier warnings attached to one entity.
#[derive(Debug, Clone)]
pub struct AlertState {
    warnings: Vec<AlertRule>,
    sound_armed: bool,
}

impl Default for AlertState {
    fn default() -> Self {
        Self {
            warnings: Vec::new(),
            sound_armed: true,
        }
    }
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> &[AlertRule] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn sound_armed(&self) -> bool {
        self.sound_armed
    }

    /// Refresh warnings from the entity's current modifiers.
    ///
    /// A non-empty match replaces the previous warnings; no match leaves
    /// them as they were. At most one sound is requested per call.
    pub fn update(
        &mut self,
        entity: &EntitySnapshot,
        modifiers: &RuleTable,
        notifier: &Notifier,
    ) -> Result<(), AudioError> {
        if !entity.is_valid {
            self.sound_armed = true;
        }
        if !entity.is_alive {
            return Ok(());
        }
        let Some(mods) = entity.modifiers.as_deref() else {
            return Ok(());
        };

        let matched: Vec<&AlertRule> = mods.iter().filter_map(|id| modifiers.get(id)).collect();
        if matched.is_empty() {
            return Ok(());
        }

        self.warnings.clear();
        let mut played = Ok(());
        for rule in matched {
            if self.warnings.iter().any(|w| w.text == rule.text) {
                continue;
            }
            self.warnings.push(rule.clone());
            if self.sound_armed {
                self.sound_armed = false;
                played = notifier.notify(&rule.sound).map(|_| ());
            }
        }
        played
    }
}

/// One-shot sound for path and beast rules.
#[derive(Debug, Clone)]
pub struct SoundLatch {
    sound: String,
    played: bool,
}

impl SoundLatch {
    pub fn new(sound: impl Into<String>) -> Self {
        Self {
            sound: sound.into(),
            played: false,
        }
    }

    pub fn played(&self) -> bool {
        self.played
    }

    pub fn reset_if_invalid(&mut self, entity: &EntitySnapshot) {
        if self.played && !entity.is_valid {
            self.played = false;
        }
    }

    pub fn play_once(&mut self, entity: &EntitySnapshot, notifier: &Notifier) -> Result<(), AudioError> {
        if self.played || !entity.is_valid {
            return Ok(());
        }
        self.played = true;
        notifier.notify(&self.sound).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::testing::notifier;

    fn mod_table() -> RuleTable {
        RuleTable::parse([
            "MonsterFrenzied;Frenzied!;FFFF0000;50;frenzy.wav",
            "MonsterCorruptedBlood;Corrupted Blood;FF0000FF;-1;blood.wav",
            "MonsterBloodAlias;Corrupted Blood;FF0000FF;-1;blood.wav",
            "MonsterVolatile;Volatile;FF00FF00;-1;",
        ])
        .unwrap()
    }

    fn monster(mods: &[&str]) -> EntitySnapshot {
        EntitySnapshot {
            id: 1,
            modifiers: Some(mods.iter().map(|m| m.to_string()).collect()),
            is_valid: true,
            is_alive: true,
            is_hostile: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_update_records_all_matching_modifiers() {
        let (notifier, player) = notifier();
        let mut state = AlertState::new();
        let entity = monster(&["MonsterFrenzied", "Unrelated", "MonsterCorruptedBlood"]);

        state.update(&entity, &mod_table(), &notifier).unwrap();

        let texts: Vec<_> = state.warnings().iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["Frenzied!", "Corrupted Blood"]);
        assert_eq!(player.count(), 1, "only the first warning sounds");
        assert!(!state.sound_armed());
    }

    #[test]
    fn test_warnings_are_deduplicated_by_text() {
        let (notifier, _) = notifier();
        let mut state = AlertState::new();
        let entity = monster(&["MonsterCorruptedBlood", "MonsterBloodAlias"]);

        state.update(&entity, &mod_table(), &notifier).unwrap();
        assert_eq!(state.warnings().len(), 1);
    }

    #[test]
    fn test_fresh_match_replaces_warnings() {
        let (notifier, _) = notifier();
        let table = mod_table();
        let mut state = AlertState::new();

        state.update(&monster(&["MonsterFrenzied"]), &table, &notifier).unwrap();
        state.update(&monster(&["MonsterVolatile"]), &table, &notifier).unwrap();

        let texts: Vec<_> = state.warnings().iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["Volatile"]);
    }

    #[test]
    fn test_no_match_keeps_existing_warnings() {
        let (notifier, _) = notifier();
        let table = mod_table();
        let mut state = AlertState::new();

        state.update(&monster(&["MonsterFrenzied"]), &table, &notifier).unwrap();
        state.update(&monster(&["Unrelated"]), &table, &notifier).unwrap();
        state.update(&monster(&[]), &table, &notifier).unwrap();

        assert_eq!(state.warnings().len(), 1);
    }

    #[test]
    fn test_dead_or_modless_entity_is_ignored() {
        let (notifier, player) = notifier();
        let table = mod_table();
        let mut state = AlertState::new();

        let mut dead = monster(&["MonsterFrenzied"]);
        dead.is_alive = false;
        state.update(&dead, &table, &notifier).unwrap();

        let mut plain = monster(&[]);
        plain.modifiers = None;
        state.update(&plain, &table, &notifier).unwrap();

        assert!(!state.has_warnings());
        assert_eq!(player.count(), 0);
    }

    #[test]
    fn test_rearms_after_invalid() {
        let (notifier, player) = notifier();
        let table = mod_table();
        let mut state = AlertState::new();
        let visible = monster(&["MonsterFrenzied"]);

        state.update(&visible, &table, &notifier).unwrap();
        state.update(&visible, &table, &notifier).unwrap();
        assert_eq!(player.count(), 1);

        let mut hidden = visible.clone();
        hidden.is_valid = false;
        hidden.modifiers = None;
        state.update(&hidden, &table, &notifier).unwrap();
        assert!(state.sound_armed());

        state.update(&visible, &table, &notifier).unwrap();
        assert_eq!(player.count(), 2);
    }

    #[test]
    fn test_silent_rule_still_disarms() {
        let (notifier, player) = notifier();
        let table = mod_table();
        let mut state = AlertState::new();

        state.update(&monster(&["MonsterVolatile"]), &table, &notifier).unwrap();
        assert!(!state.sound_armed());
        state.update(&monster(&["MonsterFrenzied"]), &table, &notifier).unwrap();
        assert_eq!(player.count(), 0);
    }

    #[test]
    fn test_sound_latch_plays_once_per_visibility() {
        let (notifier, player) = notifier();
        let mut latch = SoundLatch::new("exile.wav");
        let mut entity = monster(&[]);

        latch.play_once(&entity, &notifier).unwrap();
        latch.play_once(&entity, &notifier).unwrap();
        assert_eq!(player.count(), 1);

        entity.is_valid = false;
        latch.reset_if_invalid(&entity);
        assert!(!latch.played());
        latch.play_once(&entity, &notifier).unwrap();
        assert_eq!(player.count(), 1, "invalid entities never sound");

        entity.is_valid = true;
        latch.play_once(&entity, &notifier).unwrap();
        assert_eq!(player.count(), 2);
    }
}
