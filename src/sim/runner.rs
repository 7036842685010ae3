//! Single-run drivers over the engine: a recording variant that keeps every
//! attempt for playback, and a capped variant that keeps scalars only and is
//! cheap enough to call thousands of times per analysis.
//!
//! Both variants share one loop, so identical (config, table, seed) inputs
//! produce identical scalar totals whichever variant ran.

use serde::{Deserialize, Serialize};

use crate::sim::engine::{
    AttemptOutcome, ConsumableCounts, EngineError, EnhanceConfig, EnhanceEngine, SpendPreview,
    PITY_SLOTS,
};
use crate::sim::rates::RateTable;

/// Optional per-consumable caps for a capped run. `None` = unlimited.
///
/// Caps are checked against the worst-case spend of the next attempt before
/// it starts; a run therefore stops rather than ever overshooting a cap
/// mid-attempt. Wards count toward that worst case whenever the coming
/// attempt could fail with wards active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub stones: Option<u64>,
    pub blessings: [Option<u64>; 3],
    pub wards: Option<u64>,
    pub cores: Option<u64>,
}

impl ResourceLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn is_unlimited(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the engine can afford the previewed spend under these caps.
    fn permits(&self, spent: &ConsumableCounts, next: &SpendPreview) -> bool {
        fn within(cap: Option<u64>, spent: u64, next: u64) -> bool {
            cap.map_or(true, |cap| spent + next <= cap)
        }
        within(self.stones, spent.stones, next.stones)
            && within(self.wards, spent.wards, next.wards)
            && within(self.cores, spent.cores, next.cores)
            && self
                .blessings
                .iter()
                .zip(spent.blessings.iter().zip(next.blessings.iter()))
                .all(|(cap, (spent, next))| within(*cap, *spent, *next))
    }
}

/// Scalar totals of one completed or terminated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub attempts: u64,
    pub consumed: ConsumableCounts,
    pub cost: u64,
    pub final_tier: u8,
    pub pity: [u32; PITY_SLOTS],
    /// False only for capped runs that exhausted a resource first.
    pub reached_target: bool,
}

/// A recorded run: totals plus the ordered attempt log for playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub totals: RunTotals,
    pub outcomes: Vec<AttemptOutcome>,
}

fn totals_of(engine: &EnhanceEngine<'_>) -> RunTotals {
    RunTotals {
        attempts: engine.attempts(),
        consumed: engine.consumed(),
        cost: engine.cost(),
        final_tier: engine.tier(),
        pity: engine.pity(),
        reached_target: engine.is_complete(),
    }
}

fn run_core(
    config: &EnhanceConfig,
    table: &RateTable,
    seed: Option<u64>,
    limits: &ResourceLimits,
    record: bool,
) -> Result<(RunTotals, Option<Vec<AttemptOutcome>>), EngineError> {
    let mut engine = EnhanceEngine::new(config, table, seed)?;
    let mut outcomes = record.then(Vec::new);

    while !engine.is_complete() {
        if !limits.permits(&engine.consumed(), &engine.next_spend()) {
            break;
        }
        let outcome = engine.attempt()?;
        if let Some(outcomes) = outcomes.as_mut() {
            outcomes.push(outcome);
        }
    }

    Ok((totals_of(&engine), outcomes))
}

/// Drive a run to the target tier, retaining every attempt outcome.
pub fn run_recorded(
    config: &EnhanceConfig,
    table: &RateTable,
    seed: Option<u64>,
) -> Result<RunRecord, EngineError> {
    let (totals, outcomes) = run_core(config, table, seed, &ResourceLimits::unlimited(), true)?;
    Ok(RunRecord {
        totals,
        outcomes: outcomes.unwrap_or_default(),
    })
}

/// Drive a run until the target tier is reached or a cap would be exceeded.
/// Keeps no history; only scalar counters move.
pub fn run_capped(
    config: &EnhanceConfig,
    table: &RateTable,
    seed: Option<u64>,
    limits: &ResourceLimits,
) -> Result<RunTotals, EngineError> {
    let (totals, _) = run_core(config, table, seed, limits, false)?;
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_capped_run_matches_recorded_totals() {
        let table = RateTable::default();
        let config = EnhanceConfig::for_tiers(0, 4);
        let recorded = run_recorded(&config, &table, Some(99)).expect("recorded");
        let capped =
            run_capped(&config, &table, Some(99), &ResourceLimits::unlimited()).expect("capped");
        assert_eq!(recorded.totals, capped);
        assert!(capped.reached_target);
    }

    #[test]
    fn stone_cap_stops_run_without_overshoot() {
        let table = RateTable::default();
        let config = EnhanceConfig::for_tiers(0, 10);
        let limits = ResourceLimits {
            stones: Some(25),
            ..ResourceLimits::unlimited()
        };
        let totals = run_capped(&config, &table, Some(3), &limits).expect("capped");
        assert!(totals.consumed.stones <= 25);
        assert!(!totals.reached_target);
    }

    #[test]
    fn zero_stone_cap_yields_empty_failed_run() {
        let table = RateTable::default();
        let config = EnhanceConfig::for_tiers(0, 2);
        let limits = ResourceLimits {
            stones: Some(0),
            ..ResourceLimits::unlimited()
        };
        let totals = run_capped(&config, &table, Some(3), &limits).expect("capped");
        assert_eq!(totals.attempts, 0);
        assert_eq!(totals.cost, 0);
        assert_eq!(totals.final_tier, 0);
        assert!(!totals.reached_target);
    }

    #[test]
    fn core_cap_stops_forge_path_run() {
        let table = RateTable::default();
        let mut config = EnhanceConfig::for_tiers(7, 8);
        config.use_path_a = true;
        let limits = ResourceLimits {
            cores: Some(6),
            ..ResourceLimits::unlimited()
        };
        // Two sub-attempts at three cores each, then the third would
        // overshoot. Five successes are needed, so the cap always bites.
        let totals = run_capped(&config, &table, Some(11), &limits).expect("capped");
        assert_eq!(totals.consumed.cores, 6);
        assert!(!totals.reached_target);
    }
}
