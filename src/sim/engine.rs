//! Stateful enhancement engine: one attempt at a time against the rate table.
//!
//! An engine owns the full per-run state (current tier, pity energy, forge
//! path progress, resource counters) plus a seeded [`Rng`]. Every run gets a
//! fresh engine; nothing is shared between runs except the immutable
//! configuration and table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::rates::{PriceTable, RateTable, MAX_TIER, PATH_ORIGINS, TIER_COUNT};
use crate::sim::rng::Rng;

/// Pity energy is tracked per target tier, indexed 1..=MAX_TIER. Slot 0 is
/// never used but keeps indexing direct.
pub const PITY_SLOTS: usize = TIER_COUNT + 1;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("start tier {start} must lie below target tier {target}")]
    InvalidTierRange { start: u8, target: u8 },

    #[error("target tier {target} exceeds maximum tier 10")]
    TierAboveMax { target: u8 },

    #[error("forge path {path} progress {progress} requires starting at tier {origin}")]
    PathProgressOutsidePath { path: char, progress: u32, origin: u8 },

    #[error("forge path {path} starting progress {progress} already meets required {required}")]
    PathProgressComplete { path: char, progress: u32, required: u32 },

    #[error("attempt on a run that already reached tier {target}")]
    AlreadyComplete { target: u8 },
}

/// Immutable per-run configuration. Rates live in [`RateTable`]; this is the
/// player's side of the problem: where to start, where to stop, which items
/// to use along the way, and what each item costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceConfig {
    pub start_tier: u8,
    pub target_tier: u8,
    /// Tier at which each blessing slot becomes active; 0 disables the slot.
    ///
    /// Every active blessing applies and their multipliers stack
    /// multiplicatively (capped at 1.0 overall). One blessing item per active
    /// slot is consumed on each attempt.
    pub blessing_tiers: [u8; 3],
    /// Tier at or above which a ward is spent on a failed attempt; 0 = never.
    pub ward_tier: u8,
    /// Resolve 7 -> 8 through forge path A.
    pub use_path_a: bool,
    /// Resolve 8 -> 9 through forge path B.
    pub use_path_b: bool,
    /// Successful sub-attempts already banked when resuming path A mid-way.
    pub path_a_progress: u32,
    /// Successful sub-attempts already banked when resuming path B mid-way.
    pub path_b_progress: u32,
    pub prices: PriceTable,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            start_tier: 0,
            target_tier: MAX_TIER,
            blessing_tiers: [0; 3],
            ward_tier: 0,
            use_path_a: false,
            use_path_b: false,
            path_a_progress: 0,
            path_b_progress: 0,
            prices: PriceTable::default(),
        }
    }
}

impl EnhanceConfig {
    pub fn for_tiers(start_tier: u8, target_tier: u8) -> Self {
        Self {
            start_tier,
            target_tier,
            ..Self::default()
        }
    }

    /// Structural invariants that do not need the rate table.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.target_tier > MAX_TIER {
            return Err(EngineError::TierAboveMax {
                target: self.target_tier,
            });
        }
        if self.start_tier >= self.target_tier {
            return Err(EngineError::InvalidTierRange {
                start: self.start_tier,
                target: self.target_tier,
            });
        }
        for (index, progress) in [self.path_a_progress, self.path_b_progress]
            .into_iter()
            .enumerate()
        {
            if progress > 0 && self.start_tier != PATH_ORIGINS[index] {
                return Err(EngineError::PathProgressOutsidePath {
                    path: path_name(index),
                    progress,
                    origin: PATH_ORIGINS[index],
                });
            }
        }
        Ok(())
    }

    fn path_enabled(&self, index: usize) -> bool {
        match index {
            0 => self.use_path_a,
            _ => self.use_path_b,
        }
    }

    fn starting_progress(&self, index: usize) -> u32 {
        match index {
            0 => self.path_a_progress,
            _ => self.path_b_progress,
        }
    }
}

fn path_name(index: usize) -> char {
    if index == 0 {
        'A'
    } else {
        'B'
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptKind {
    Normal,
    PathA,
    PathB,
}

/// Everything observable about one resolved attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub kind: AttemptKind,
    pub success: bool,
    /// A pity guarantee forced this success regardless of the roll.
    pub pity_triggered: bool,
    pub tier_before: u8,
    pub tier_after: u8,
    /// Blessing slots consumed and applied on this attempt.
    pub blessings_applied: [bool; 3],
    pub ward_used: bool,
    /// The ward held the tier. Meaningful only when `ward_used`.
    pub ward_held: bool,
    /// Path progress after this attempt (forge attempts only).
    pub path_progress: u32,
    /// Path pity after this attempt (forge attempts only).
    pub path_pity: u32,
    /// This attempt completed the forge path and forced the tier transition.
    pub path_completed: bool,
}

/// Running totals of consumables spent by one engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumableCounts {
    pub stones: u64,
    pub blessings: [u64; 3],
    pub wards: u64,
    pub cores: u64,
}

impl ConsumableCounts {
    /// Currency value of these counts at the given prices.
    pub fn currency_cost(&self, prices: &PriceTable) -> u64 {
        let mut cost = self.stones * prices.stone;
        for (slot, count) in self.blessings.iter().enumerate() {
            cost += count * prices.blessings[slot];
        }
        cost += self.wards * prices.ward;
        cost += self.cores * prices.core;
        cost
    }
}

/// Consumables the next attempt may spend. The ward entry is the worst case:
/// it is reserved whenever the attempt can fail with wards active, so a
/// capped run never overshoots a cap mid-attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpendPreview {
    pub stones: u64,
    pub blessings: [u64; 3],
    pub wards: u64,
    pub cores: u64,
}

#[derive(Debug)]
pub struct EnhanceEngine<'a> {
    config: &'a EnhanceConfig,
    table: &'a RateTable,
    rng: Rng,
    tier: u8,
    pity: [u32; PITY_SLOTS],
    path_progress: [u32; 2],
    path_pity: [u32; 2],
    attempts: u64,
    consumed: ConsumableCounts,
    cost: u64,
}

impl<'a> EnhanceEngine<'a> {
    /// Build a fresh engine. `None` seed draws entropy; pass a seed for
    /// reproducible runs.
    pub fn new(
        config: &'a EnhanceConfig,
        table: &'a RateTable,
        seed: Option<u64>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        for index in 0..PATH_ORIGINS.len() {
            let progress = config.starting_progress(index);
            let required = table.paths[index].required;
            if progress > 0 && progress >= required {
                return Err(EngineError::PathProgressComplete {
                    path: path_name(index),
                    progress,
                    required,
                });
            }
        }
        let rng = match seed {
            Some(seed) => Rng::new(seed),
            None => Rng::from_entropy(),
        };
        Ok(Self {
            config,
            table,
            rng,
            tier: config.start_tier,
            pity: [0; PITY_SLOTS],
            path_progress: [config.path_a_progress, config.path_b_progress],
            path_pity: [0; 2],
            attempts: 0,
            consumed: ConsumableCounts::default(),
            cost: 0,
        })
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }

    pub fn is_complete(&self) -> bool {
        self.tier >= self.config.target_tier
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn consumed(&self) -> ConsumableCounts {
        self.consumed
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn pity(&self) -> [u32; PITY_SLOTS] {
        self.pity
    }

    /// Resolve exactly one attempt: forge path A if eligible, else path B,
    /// else a normal enhancement attempt. Erroring once the target is reached
    /// keeps a stuck caller loop from silently corrupting cost statistics.
    pub fn attempt(&mut self) -> Result<AttemptOutcome, EngineError> {
        if self.is_complete() {
            return Err(EngineError::AlreadyComplete {
                target: self.config.target_tier,
            });
        }
        match self.active_path() {
            Some(index) => Ok(self.forge_attempt(index)),
            None => Ok(self.normal_attempt()),
        }
    }

    /// Worst-case consumables of the next attempt, for cap checks.
    pub fn next_spend(&self) -> SpendPreview {
        match self.active_path() {
            Some(index) => SpendPreview {
                cores: u64::from(self.table.paths[index].cores_per_attempt),
                ..SpendPreview::default()
            },
            None => {
                let target = self.tier + 1;
                let blessings = self.active_blessings(target);
                let mut preview = SpendPreview {
                    stones: 1,
                    ..SpendPreview::default()
                };
                for (slot, active) in blessings.iter().enumerate() {
                    if *active {
                        preview.blessings[slot] = 1;
                    }
                }
                let can_fail = !self.pity_ready(target) && self.effective_rate(target) < 1.0;
                if can_fail && self.tier > 0 && self.ward_active() {
                    preview.wards = 1;
                }
                preview
            }
        }
    }

    /// Forge path that must resolve the next attempt, if any. A path is taken
    /// while the tier sits at its origin and either its flag is set or it has
    /// banked progress (a resumed path is never abandoned mid-way).
    fn active_path(&self) -> Option<usize> {
        (0..PATH_ORIGINS.len()).find(|&index| {
            self.tier == PATH_ORIGINS[index]
                && (self.config.path_enabled(index) || self.path_progress[index] > 0)
        })
    }

    fn active_blessings(&self, target_tier: u8) -> [bool; 3] {
        let mut active = [false; 3];
        for (slot, activation) in self.config.blessing_tiers.iter().enumerate() {
            active[slot] = *activation > 0 && target_tier >= *activation;
        }
        active
    }

    fn effective_rate(&self, target_tier: u8) -> f64 {
        let mut rate = self.table.base_rate(target_tier);
        for (slot, active) in self.active_blessings(target_tier).iter().enumerate() {
            if *active {
                rate *= self.table.blessing_multipliers[slot];
            }
        }
        rate.min(1.0)
    }

    fn pity_ready(&self, target_tier: u8) -> bool {
        let threshold = self.table.pity_threshold(target_tier);
        threshold > 0 && self.pity[target_tier as usize] >= threshold
    }

    fn ward_active(&self) -> bool {
        self.config.ward_tier > 0 && self.tier >= self.config.ward_tier
    }

    fn normal_attempt(&mut self) -> AttemptOutcome {
        let tier_before = self.tier;
        let target = self.tier + 1;
        let blessings = self.active_blessings(target);
        let rate = self.effective_rate(target);
        let pity_ready = self.pity_ready(target);

        self.attempts += 1;
        self.consumed.stones += 1;
        self.cost += self.config.prices.stone;
        for (slot, active) in blessings.iter().enumerate() {
            if *active {
                self.consumed.blessings[slot] += 1;
                self.cost += self.config.prices.blessings[slot];
            }
        }

        // The roll is drawn even when pity forces the outcome, so the random
        // sequence per attempt is fixed regardless of pity state.
        let roll = self.rng.next_f64();
        let success = pity_ready || roll < rate;
        let mut ward_used = false;
        let mut ward_held = false;

        if success {
            self.tier = target;
            self.pity[target as usize] = 0;
        } else {
            self.pity[target as usize] += 1;
            if self.tier > 0 {
                if self.ward_active() {
                    ward_used = true;
                    self.consumed.wards += 1;
                    self.cost += self.config.prices.ward;
                    ward_held = self.rng.next_f64() < self.table.ward_success;
                    if !ward_held {
                        self.tier -= 1;
                    }
                } else {
                    self.tier -= 1;
                }
            }
        }

        AttemptOutcome {
            kind: AttemptKind::Normal,
            success,
            pity_triggered: pity_ready,
            tier_before,
            tier_after: self.tier,
            blessings_applied: blessings,
            ward_used,
            ward_held,
            path_progress: 0,
            path_pity: 0,
            path_completed: false,
        }
    }

    fn forge_attempt(&mut self, index: usize) -> AttemptOutcome {
        let tier_before = self.tier;
        let path = self.table.paths[index];

        self.attempts += 1;
        self.consumed.cores += u64::from(path.cores_per_attempt);
        self.cost += u64::from(path.cores_per_attempt) * self.config.prices.core;

        let pity_ready = path.pity_threshold > 0 && self.path_pity[index] >= path.pity_threshold;
        let roll = self.rng.next_f64();
        let success = pity_ready || roll < path.success_rate;
        if success {
            self.path_progress[index] += 1;
            self.path_pity[index] = 0;
        } else {
            // A failed forge attempt burns cores but never touches the tier.
            self.path_pity[index] += 1;
        }

        let completed = self.path_progress[index] >= path.required;
        if completed {
            self.tier = PATH_ORIGINS[index] + 1;
            self.path_progress[index] = 0;
            self.path_pity[index] = 0;
        }

        AttemptOutcome {
            kind: if index == 0 {
                AttemptKind::PathA
            } else {
                AttemptKind::PathB
            },
            success,
            pity_triggered: pity_ready,
            tier_before,
            tier_after: self.tier,
            blessings_applied: [false; 3],
            ward_used: false,
            ward_held: false,
            path_progress: self.path_progress[index],
            path_pity: self.path_pity[index],
            path_completed: completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_start_at_or_above_target() {
        let table = RateTable::default();
        let config = EnhanceConfig::for_tiers(3, 3);
        assert_eq!(
            EnhanceEngine::new(&config, &table, Some(1)).err(),
            Some(EngineError::InvalidTierRange {
                start: 3,
                target: 3
            })
        );
    }

    #[test]
    fn rejects_target_above_max() {
        let table = RateTable::default();
        let config = EnhanceConfig::for_tiers(0, 11);
        assert_eq!(
            EnhanceEngine::new(&config, &table, Some(1)).err(),
            Some(EngineError::TierAboveMax { target: 11 })
        );
    }

    #[test]
    fn rejects_path_progress_away_from_origin() {
        let table = RateTable::default();
        let mut config = EnhanceConfig::for_tiers(0, 10);
        config.path_a_progress = 2;
        assert_eq!(
            EnhanceEngine::new(&config, &table, Some(1)).err(),
            Some(EngineError::PathProgressOutsidePath {
                path: 'A',
                progress: 2,
                origin: 7
            })
        );
    }

    #[test]
    fn rejects_path_progress_already_complete() {
        let table = RateTable::default();
        let mut config = EnhanceConfig::for_tiers(7, 8);
        config.use_path_a = true;
        config.path_a_progress = 5;
        assert_eq!(
            EnhanceEngine::new(&config, &table, Some(1)).err(),
            Some(EngineError::PathProgressComplete {
                path: 'A',
                progress: 5,
                required: 5
            })
        );
    }

    #[test]
    fn attempt_after_completion_is_an_error() {
        let table = RateTable::default();
        let config = EnhanceConfig::for_tiers(0, 1);
        let mut engine = EnhanceEngine::new(&config, &table, Some(7)).expect("engine");
        while !engine.is_complete() {
            engine.attempt().expect("attempt");
        }
        assert_eq!(
            engine.attempt().err(),
            Some(EngineError::AlreadyComplete { target: 1 })
        );
    }

    #[test]
    fn zero_blessing_threshold_never_activates() {
        let table = RateTable::default();
        let mut config = EnhanceConfig::for_tiers(0, 1);
        config.blessing_tiers = [0, 0, 0];
        let engine = EnhanceEngine::new(&config, &table, Some(7)).expect("engine");
        assert_eq!(engine.active_blessings(1), [false; 3]);
    }

    #[test]
    fn blessing_activates_from_its_tier_upward() {
        let table = RateTable::default();
        let mut config = EnhanceConfig::for_tiers(0, 10);
        config.blessing_tiers = [2, 5, 0];
        let engine = EnhanceEngine::new(&config, &table, Some(7)).expect("engine");
        assert_eq!(engine.active_blessings(1), [false, false, false]);
        assert_eq!(engine.active_blessings(2), [true, false, false]);
        assert_eq!(engine.active_blessings(5), [true, true, false]);
        assert_eq!(engine.active_blessings(10), [true, true, false]);
    }

    #[test]
    fn failure_at_tier_zero_does_not_downgrade() {
        let mut table = RateTable::default();
        table.base_rates[0] = 1e-12;
        let config = EnhanceConfig::for_tiers(0, 1);
        let mut engine = EnhanceEngine::new(&config, &table, Some(7)).expect("engine");
        for _ in 0..50 {
            if engine.is_complete() {
                break;
            }
            let outcome = engine.attempt().expect("attempt");
            if !outcome.success {
                assert_eq!(outcome.tier_after, 0);
            }
        }
    }

    #[test]
    fn ward_preview_reserved_only_when_failure_possible() {
        let mut table = RateTable::default();
        table.blessing_multipliers = [2.0, 1.0, 1.0];
        let mut config = EnhanceConfig::for_tiers(1, 3);
        config.ward_tier = 1;
        config.blessing_tiers = [1, 0, 0];
        // Transition onto tier 2 with the doubled rate: 0.60 * 2.0 caps at
        // 1.0, so no ward can be needed.
        let engine = EnhanceEngine::new(&config, &table, Some(7)).expect("engine");
        assert_eq!(engine.next_spend().wards, 0);

        let mut risky = EnhanceConfig::for_tiers(1, 3);
        risky.ward_tier = 1;
        let engine = EnhanceEngine::new(&risky, &table, Some(7)).expect("engine");
        assert_eq!(engine.next_spend().wards, 1);
    }

    #[test]
    fn currency_cost_matches_unit_prices() {
        let prices = PriceTable {
            stone: 10,
            blessings: [1, 2, 3],
            ward: 100,
            core: 7,
        };
        let counts = ConsumableCounts {
            stones: 5,
            blessings: [4, 0, 2],
            wards: 1,
            cores: 3,
        };
        assert_eq!(counts.currency_cost(&prices), 50 + 4 + 6 + 100 + 21);
    }
}
