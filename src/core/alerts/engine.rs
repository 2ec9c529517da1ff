// Alert engine - matches entities against the rule tables and tracks
// per-entity alert state between ticks.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::builtin::classify_delve_chest;
use super::loader::{copy_default_configs, RulesHandle};
use super::model::{Annotation, MatchResult, MatchSource};
use super::state::{AlertState, SoundLatch};
use super::table::RuleTable;
use super::throttle::NotificationThrottle;
use crate::core::audio::{AudioError, Notifier, SoundPlayer};
use crate::core::config::Settings;
use crate::core::model::{EntityId, EntityKind, EntitySnapshot, Rgba};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("entity {0} has a non-finite distance")]
    InvalidDistance(EntityId),
}

/// A line of the alert overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertLine {
    pub entity: EntityId,
    pub distance: f32,
    pub source: MatchSource,
    pub text: String,
    pub color: Rgba,
}

/// Everything remembered about one entity.
#[derive(Debug, Default)]
struct Tracked {
    alert: Option<AlertState>,
    sound: Option<SoundLatch>,
}

/// Alert engine state
pub struct AlertEngine {
    settings: Settings,
    rules: RulesHandle,
    notifier: Notifier,
    tracked: HashMap<EntityId, Tracked>,
    /// Monsters reported since the last tick.
    added: Mutex<VecDeque<EntitySnapshot>>,
}

impl AlertEngine {
    /// Engine playing through `player`, gated by the process-wide throttle.
    pub fn new(settings: Settings, rules: RulesHandle, player: Arc<dyn SoundPlayer>) -> Self {
        let sound_dir = settings.alert_paths().sound_dir();
        let notifier = Notifier::new(sound_dir, NotificationThrottle::shared(), player);
        Self::with_notifier(settings, rules, notifier)
    }

    pub fn with_notifier(settings: Settings, rules: RulesHandle, mut notifier: Notifier) -> Self {
        notifier.set_enabled(settings.play_sounds_for_alerts);
        Self {
            settings,
            rules,
            notifier,
            tracked: HashMap::new(),
            added: Mutex::new(VecDeque::new()),
        }
    }

    /// Apply new toggles. Rule files are re-read when their folders moved.
    pub fn update_settings(&mut self, settings: Settings) {
        let paths = settings.alert_paths();
        let moved = paths != self.settings.alert_paths();

        self.notifier.set_enabled(settings.play_sounds_for_alerts);
        self.notifier.set_sound_dir(paths.sound_dir());
        self.settings = settings;
        if moved {
            self.reload();
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Re-read all rule files and publish them.
    pub fn reload(&self) {
        self.rules.reload(&self.settings.alert_paths());
    }

    pub fn copy_default_configs(&self) -> io::Result<Vec<PathBuf>> {
        copy_default_configs(&self.settings.alert_paths())
    }

    pub fn alert_state(&self, id: EntityId) -> Option<&AlertState> {
        self.tracked.get(&id).and_then(|t| t.alert.as_ref())
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Host hook for a newly spawned entity. Only monsters are queued.
    pub fn entity_added(&self, entity: EntitySnapshot) {
        if !self.settings.enable || entity.kind != EntityKind::Monster {
            return;
        }
        self.added
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(entity);
    }

    /// Host hook for a zone change: nothing from the old area survives.
    pub fn area_change(&mut self) {
        self.added
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.tracked.clear();
    }

    /// Drop state for entities the host no longer reports.
    pub fn retain_entities(&mut self, live: &HashSet<EntityId>) {
        self.tracked.retain(|id, _| live.contains(id));
    }

    pub fn forget(&mut self, id: EntityId) {
        self.tracked.remove(&id);
    }

    /// Per-tick modifier pass.
    ///
    /// Queued monsters carrying a known modifier start being tracked, then
    /// every tracked monster in `monsters` refreshes its warnings.
    pub fn tick(&mut self, monsters: &[EntitySnapshot]) {
        let tables = self.rules.snapshot();
        let queued: Vec<EntitySnapshot> = self
            .added
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for entity in queued {
            if !entity.is_valid || !entity.is_alive || !entity.is_hostile {
                continue;
            }
            if !self.settings.show_mod_alerts {
                continue;
            }
            if has_known_modifier(&entity, &tables.modifiers) {
                self.tracked
                    .entry(entity.id)
                    .or_default()
                    .alert
                    .get_or_insert_with(AlertState::new);
            }
        }

        for entity in monsters {
            let Some(state) = self.tracked.get_mut(&entity.id).and_then(|t| t.alert.as_mut()) else {
                continue;
            };
            if let Err(e) = state.update(entity, &tables.modifiers, &self.notifier) {
                log::debug!("Alert sound for entity {} failed: {}", entity.id, e);
            }
        }
    }

    /// Decide what, if anything, to show for one entity.
    ///
    /// Stages run in order and the first that matches wins: warnings already
    /// on the entity, modifier rules, path rules, beast rules, then the
    /// built-in container labels.
    pub fn evaluate(&mut self, entity: &EntitySnapshot) -> Result<MatchResult, EvalError> {
        if !entity.distance.is_finite() {
            return Err(EvalError::InvalidDistance(entity.id));
        }
        let tables = self.rules.snapshot();

        if let Some(latch) = self.tracked.get_mut(&entity.id).and_then(|t| t.sound.as_mut()) {
            latch.reset_if_invalid(entity);
        }

        if entity.kind == EntityKind::IngameIcon
            && (!entity.is_valid || entity.icon_hidden.unwrap_or(true))
        {
            return Ok(MatchResult::none());
        }

        if let Some(state) = self.alert_state(entity.id).filter(|s| s.has_warnings()) {
            return Ok(warnings_result(MatchSource::Active, state));
        }

        if self.settings.show_mod_alerts
            && entity.kind == EntityKind::Monster
            && entity.is_alive
            && has_known_modifier(entity, &tables.modifiers)
        {
            let state = self
                .tracked
                .entry(entity.id)
                .or_default()
                .alert
                .get_or_insert_with(AlertState::new);
            log_sound_error(entity.id, state.update(entity, &tables.modifiers, &self.notifier));
            if state.has_warnings() {
                return Ok(warnings_result(MatchSource::Modifier, state));
            }
        }

        if self.settings.show_path_alerts {
            if let Some(annotation) = self.fire_rule(entity, &tables.path, &entity.path) {
                return Ok(MatchResult::single(MatchSource::Path, annotation));
            }
        }

        if self.settings.show_beast_alerts {
            if let Some(annotation) = self.fire_rule(entity, &tables.beasts, &entity.render_name) {
                return Ok(MatchResult::single(MatchSource::Beast, annotation));
            }
        }

        if entity.kind == EntityKind::Chest {
            if let Some(annotation) = classify_delve_chest(entity.base_path(), entity.distance) {
                return Ok(MatchResult::single(MatchSource::Builtin, annotation));
            }
        }

        Ok(MatchResult::none())
    }

    /// Evaluate a whole frame of entities, nearest first.
    ///
    /// Entities that fail to evaluate are skipped. Modifier warnings with
    /// the same text are only listed once per frame.
    pub fn render_pass(&mut self, entities: &[EntitySnapshot]) -> Vec<AlertLine> {
        if !self.settings.enable {
            return Vec::new();
        }

        let mut candidates: Vec<&EntitySnapshot> = entities
            .iter()
            .filter(|e| e.kind.is_alertable())
            .filter(|e| !(e.kind == EntityKind::Chest && e.is_opened))
            .filter(|e| e.kind != EntityKind::Monster || (e.is_alive && e.is_valid))
            .collect();
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let mut notified: HashSet<String> = HashSet::new();
        let mut lines = Vec::new();

        for entity in candidates {
            let result = match self.evaluate(entity) {
                Ok(result) => result,
                Err(e) => {
                    log::debug!("Skipping entity {}: {}", entity.id, e);
                    continue;
                }
            };
            let Some(source) = result.source else {
                continue;
            };
            let dedupe = matches!(source, MatchSource::Active | MatchSource::Modifier);

            for annotation in result.annotations {
                if dedupe && !notified.insert(annotation.text.clone()) {
                    continue;
                }
                lines.push(AlertLine {
                    entity: entity.id,
                    distance: entity.distance,
                    source,
                    text: annotation.text,
                    color: annotation.color,
                });
            }
        }

        lines
    }

    /// First rule of `table` matching `candidate`, if its distance gate is open.
    ///
    /// Only the first matching rule is considered; a closed gate does not
    /// fall through to later rules.
    fn fire_rule(&mut self, entity: &EntitySnapshot, table: &RuleTable, candidate: &str) -> Option<Annotation> {
        let rule = table.lookup(candidate)?;
        if !rule.distance.allows(entity) {
            return None;
        }

        let latch = self
            .tracked
            .entry(entity.id)
            .or_default()
            .sound
            .get_or_insert_with(|| SoundLatch::new(rule.sound.clone()));
        log_sound_error(entity.id, latch.play_once(entity, &self.notifier));

        Some(Annotation::from(rule))
    }
}

fn has_known_modifier(entity: &EntitySnapshot, modifiers: &RuleTable) -> bool {
    entity
        .modifiers
        .as_deref()
        .is_some_and(|mods| mods.iter().any(|m| modifiers.get(m).is_some()))
}

fn warnings_result(source: MatchSource, state: &AlertState) -> MatchResult {
    MatchResult {
        source: Some(source),
        annotations: state.warnings().iter().map(Annotation::from).collect(),
    }
}

fn log_sound_error(id: EntityId, result: Result<(), AudioError>) {
    if let Err(e) = result {
        log::warn!("Alert sound for entity {} failed: {}", id, e);
    }
}
