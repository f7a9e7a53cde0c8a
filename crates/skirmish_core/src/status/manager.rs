//! Per-unit collection of status effects.

use serde::{Deserialize, Serialize};

use super::effect::{EffectHost, StatusEffect, StatusEvent, StatusKind};

/// What happened when an effect was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// New instance added.
    Added,
    /// Existing stackable instance gained a stack. Duration is unchanged.
    Stacked(u32),
    /// Existing non-stackable instance had its duration reset.
    Refreshed,
    /// Existing stackable instance was already at its cap; nothing changed.
    AtMaxStacks,
}

impl ApplyOutcome {
    fn event(self, kind: StatusKind) -> Option<StatusEvent> {
        match self {
            ApplyOutcome::Added => Some(StatusEvent::Applied(kind)),
            ApplyOutcome::Stacked(stacks) => Some(StatusEvent::Stacked { kind, stacks }),
            ApplyOutcome::Refreshed => Some(StatusEvent::Refreshed(kind)),
            ApplyOutcome::AtMaxStacks => None,
        }
    }
}

/// Active status effects on one unit, at most one instance per kind, kept in
/// application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect.
    ///
    /// - new kind: the instance is added and its `on_applied` hook fires
    /// - stackable kind already present: one stack is added, duration is
    ///   left as it was
    /// - non-stackable kind already present: duration resets to max
    pub fn apply(&mut self, effect: StatusEffect, host: &mut dyn EffectHost) -> ApplyOutcome {
        let kind = effect.kind();
        let outcome = match self.effects.iter_mut().find(|e| e.kind() == kind) {
            Some(existing) if existing.is_stackable() => {
                if existing.add_stack() {
                    ApplyOutcome::Stacked(existing.current_stacks())
                } else {
                    ApplyOutcome::AtMaxStacks
                }
            }
            Some(existing) => {
                existing.refresh();
                ApplyOutcome::Refreshed
            }
            None => {
                effect.on_applied(host);
                self.effects.push(effect);
                ApplyOutcome::Added
            }
        };

        #[cfg(feature = "debug-validation")]
        debug_assert!(self
            .effects
            .iter()
            .all(|e| e.current_stacks() <= e.max_stacks()));

        if let Some(event) = outcome.event(kind) {
            tracing::debug!(unit = host.label(), ?event, "Status effect applied");
        }
        outcome
    }

    /// Run turn-start hooks on every active effect.
    pub fn on_turn_start(&mut self, host: &mut dyn EffectHost) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        for effect in &self.effects {
            if let Some(event) = effect.on_turn_start(host) {
                events.push(event);
            }
        }
        log_events(host.label(), &events);
        events
    }

    /// Run turn-end hooks on every active effect, then remove the ones whose
    /// duration reached zero (firing their `on_removed` hook).
    pub fn on_turn_end(&mut self, host: &mut dyn EffectHost) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        for effect in &mut self.effects {
            if let Some(event) = effect.on_turn_end(host) {
                events.push(event);
            }
        }

        let (expired, active): (Vec<_>, Vec<_>) =
            self.effects.drain(..).partition(|e| !e.is_active());
        self.effects = active;
        for effect in expired {
            effect.on_removed(host);
            events.push(StatusEvent::Expired(effect.kind()));
        }

        log_events(host.label(), &events);
        events
    }

    /// Remove an effect regardless of its duration.
    pub fn remove(&mut self, kind: StatusKind, host: &mut dyn EffectHost) -> Option<StatusEffect> {
        let index = self.effects.iter().position(|e| e.kind() == kind)?;
        let effect = self.effects.remove(index);
        effect.on_removed(host);
        tracing::debug!(unit = host.label(), %kind, "Status effect removed");
        Some(effect)
    }

    /// Whether an effect of this kind is present.
    #[must_use]
    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind() == kind)
    }

    /// The effect of this kind, if present.
    #[must_use]
    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind() == kind)
    }

    /// Stacks of this kind (0 when absent).
    #[must_use]
    pub fn stacks(&self, kind: StatusKind) -> u32 {
        self.get(kind).map_or(0, StatusEffect::current_stacks)
    }

    /// Total dice removed from the owner's pools.
    #[must_use]
    pub fn dice_penalty(&self) -> u32 {
        self.effects.iter().map(StatusEffect::dice_penalty).sum()
    }

    /// Total dice added to the owner's defence pools.
    #[must_use]
    pub fn defense_bonus_dice(&self) -> u32 {
        self.effects.iter().map(StatusEffect::defense_dice).sum()
    }

    /// Whether no effect prevents the owner from acting.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.has(StatusKind::Stunned)
    }

    /// Iterate effects in application order.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effects are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

fn log_events(unit: &str, events: &[StatusEvent]) {
    for event in events {
        tracing::debug!(unit, ?event, "Status effect event");
    }
}
