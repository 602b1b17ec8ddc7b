//! Cards
//!
//! `CardData` is the immutable blueprint shared through `Arc`; a
//! `CardInstance` is one copy of it sitting in some pile, carrying the
//! per-copy upgrade level and remaining uses.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::context::ShotContext;
use super::effect::{EffectSpec, Phase};
use super::modifier::{HookEnv, Pass};
use crate::error::{ConfigError, EffectError};

/// Card rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// How a card is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    /// Played from the candidates for one shot
    #[serde(alias = "shot")]
    Swing,
    Passive,
    /// Limited uses, then exhausted
    Consumable,
    /// Always active, outside the hand
    Joker,
    /// Swaps the club for one shot
    Club,
}

fn unlimited() -> i32 {
    -1
}

fn one_tempo() -> u32 {
    1
}

/// Immutable card blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(rename = "type")]
    pub card_type: CardType,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// -1 = unlimited
    #[serde(default = "unlimited")]
    pub max_uses: i32,
    #[serde(default)]
    pub can_upgrade: bool,
    #[serde(default)]
    pub max_upgrade_level: u32,
    /// Cost against the per-shot tempo budget
    #[serde(default = "one_tempo")]
    pub tempo: u32,
    /// Drawing this card forces a full reshuffle once its effect is consumed
    #[serde(default)]
    pub reshuffle: bool,
}

impl CardData {
    pub fn is_limited(&self) -> bool {
        self.max_uses >= 0
    }

    /// Load-time consistency checks
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidCard {
            card: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.max_uses == 0 || self.max_uses < -1 {
            return Err(invalid("max_uses must be -1 (unlimited) or positive"));
        }
        if !self.can_upgrade && self.max_upgrade_level > 0 {
            return Err(invalid("max_upgrade_level set on a card that cannot upgrade"));
        }
        for spec in &self.effects {
            if !spec.is_valid() {
                return Err(ConfigError::EffectPhase {
                    card: self.id.clone(),
                    effect: spec.effect.name(),
                    phase: spec.phase,
                });
            }
        }
        Ok(())
    }
}

/// One copy of a card in a deck
#[derive(Debug, Clone, PartialEq)]
pub struct CardInstance {
    /// Unique per run
    pub instance_id: u32,
    pub data: Arc<CardData>,
    pub upgrade_level: u32,
    pub uses_remaining: i32,
    pub is_exhausted: bool,
    pub is_locked: bool,
}

impl CardInstance {
    pub fn new(instance_id: u32, data: Arc<CardData>) -> Self {
        let uses_remaining = data.max_uses;
        Self {
            instance_id,
            data,
            upgrade_level: 0,
            uses_remaining,
            is_exhausted: false,
            is_locked: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// Raise the upgrade level by one. Returns false (and changes nothing)
    /// at the cap or for a card that cannot upgrade.
    pub fn upgrade(&mut self) -> bool {
        if !self.data.can_upgrade || self.upgrade_level >= self.data.max_upgrade_level {
            return false;
        }
        self.upgrade_level += 1;
        true
    }

    /// Spend one use. Unlimited cards always succeed; an exhausted card
    /// refuses.
    pub fn use_once(&mut self) -> bool {
        if self.is_exhausted {
            return false;
        }
        if !self.data.is_limited() {
            return true;
        }
        self.uses_remaining -= 1;
        if self.uses_remaining <= 0 {
            self.uses_remaining = 0;
            self.is_exhausted = true;
            log::debug!("Card {} ({}) exhausted", self.data.id, self.instance_id);
        }
        true
    }

    /// Whether any effect of this card sets absolute values in `phase`
    pub fn has_overrides(&self, phase: Phase) -> bool {
        self.data
            .effects
            .iter()
            .any(|spec| spec.phase == phase && spec.effect.is_override())
    }

    /// Run this card's effects for one phase and pass. Effects whose trigger
    /// does not hold are skipped.
    pub fn apply_effects(
        &self,
        ctx: &mut ShotContext,
        phase: Phase,
        env: &mut HookEnv<'_>,
    ) -> Result<(), EffectError> {
        let want_override = env.pass == Pass::Override;
        for spec in &self.data.effects {
            if spec.phase != phase || spec.effect.is_override() != want_override {
                continue;
            }
            if !spec.trigger.can_trigger(ctx) {
                continue;
            }
            spec.effect.apply(ctx, self.upgrade_level, env)?;
        }
        Ok(())
    }
}

/// Card id -> blueprint
#[derive(Debug, Clone, Default)]
pub struct CardRegistry {
    cards: BTreeMap<String, Arc<CardData>>,
}

impl CardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled card set
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(include_str!("../../data/cards.json"))
    }

    /// Load a JSON array of cards. Unknown effect types fail here.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cards: Vec<CardData> = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            what: "card data",
            source,
        })?;
        let mut registry = Self::new();
        for card in cards {
            registry.register(card)?;
        }
        log::info!("Loaded {} cards", registry.len());
        Ok(registry)
    }

    pub fn register(&mut self, card: CardData) -> Result<(), ConfigError> {
        card.validate()?;
        if self.cards.contains_key(&card.id) {
            return Err(ConfigError::DuplicateCard(card.id));
        }
        self.cards.insert(card.id.clone(), Arc::new(card));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<CardData>> {
        self.cards.get(id)
    }

    pub fn require(&self, id: &str) -> Result<Arc<CardData>, ConfigError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownCard(id.to_string()))
    }

    /// A fresh instance of a registered card
    pub fn instantiate(&self, id: &str, instance_id: u32) -> Result<CardInstance, ConfigError> {
        Ok(CardInstance::new(instance_id, self.require(id)?))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effect::{EffectKind, Scaled};

    fn card(id: &str, max_uses: i32, max_upgrade_level: u32) -> CardData {
        CardData {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            rarity: Rarity::Common,
            card_type: CardType::Swing,
            effects: vec![EffectSpec::new(
                Phase::OnScoring,
                EffectKind::ChipsBonus {
                    chips: Scaled::new(10.0, 5.0),
                },
            )],
            tags: BTreeSet::new(),
            max_uses,
            can_upgrade: max_upgrade_level > 0,
            max_upgrade_level,
            tempo: 1,
            reshuffle: false,
        }
    }

    #[test]
    fn test_upgrade_stops_at_cap() {
        let mut inst = CardInstance::new(1, Arc::new(card("a", -1, 2)));
        assert!(inst.upgrade());
        assert!(inst.upgrade());
        assert!(!inst.upgrade());
        assert_eq!(inst.upgrade_level, 2);

        let mut fixed = CardInstance::new(2, Arc::new(card("b", -1, 0)));
        assert!(!fixed.upgrade());
        assert_eq!(fixed.upgrade_level, 0);
    }

    #[test]
    fn test_exhaustion_after_exact_uses() {
        let mut inst = CardInstance::new(1, Arc::new(card("a", 3, 0)));
        assert!(inst.use_once());
        assert!(inst.use_once());
        assert!(!inst.is_exhausted);
        assert!(inst.use_once());
        assert!(inst.is_exhausted);
        assert_eq!(inst.uses_remaining, 0);
        assert!(!inst.use_once());
    }

    #[test]
    fn test_unlimited_never_exhausts() {
        let mut inst = CardInstance::new(1, Arc::new(card("a", -1, 0)));
        for _ in 0..100 {
            assert!(inst.use_once());
        }
        assert!(!inst.is_exhausted);
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_phases() {
        let mut registry = CardRegistry::new();
        registry.register(card("a", -1, 0)).unwrap();
        assert!(matches!(
            registry.register(card("a", -1, 0)),
            Err(ConfigError::DuplicateCard(_))
        ));

        let mut bad = card("b", -1, 0);
        bad.effects = vec![EffectSpec::new(Phase::BeforeAim, EffectKind::PerfectAccuracy)];
        assert!(matches!(
            registry.register(bad),
            Err(ConfigError::EffectPhase { .. })
        ));

        assert!(matches!(
            registry.register(card("c", 0, 0)),
            Err(ConfigError::InvalidCard { .. })
        ));
    }

    #[test]
    fn test_unknown_effect_type_fails_at_load() {
        let err = CardRegistry::from_json(
            r#"[{ "id": "x", "name": "X", "type": "swing",
                  "effects": [{ "phase": "on_aoe", "effect": { "type": "warp_drive" } }] }]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_builtin_registry_loads() {
        let registry = CardRegistry::builtin().unwrap();
        assert!(registry.get("clean_strike").is_some());
        assert!(registry.get("perfect_accuracy").unwrap().reshuffle);
        assert!(matches!(
            registry.require("nope"),
            Err(ConfigError::UnknownCard(_))
        ));
    }
}
