//! Static enhancement rate data: per-tier success rates, pity thresholds,
//! blessing multipliers, ward and forge-path parameters.
//!
//! Tables are plain immutable values injected into the engine, never global
//! state, so batches with different house rules can run side by side. The
//! stock table carries the live game values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Highest reachable tier.
pub const MAX_TIER: u8 = 10;

/// Number of tier transitions (tier t-1 -> t for t in 1..=MAX_TIER).
pub const TIER_COUNT: usize = MAX_TIER as usize;

/// Tier the first forge path starts from (resolves 7 -> 8).
pub const PATH_A_ORIGIN: u8 = 7;
/// Tier the second forge path starts from (resolves 8 -> 9).
pub const PATH_B_ORIGIN: u8 = 8;

/// Origin tier per forge path, indexed like [`RateTable::paths`].
pub const PATH_ORIGINS: [u8; 2] = [PATH_A_ORIGIN, PATH_B_ORIGIN];

pub const STOCK_BASE_RATES: [f64; TIER_COUNT] =
    [0.70, 0.60, 0.50, 0.40, 0.30, 0.20, 0.15, 0.10, 0.07, 0.05];

/// Failures needed before an attempt at that tier is guaranteed. 0 = no pity.
pub const STOCK_PITY_THRESHOLDS: [u32; TIER_COUNT] = [0, 0, 0, 0, 6, 8, 10, 12, 15, 20];

pub const STOCK_BLESSING_MULTIPLIERS: [f64; 3] = [1.10, 1.25, 1.50];

pub const STOCK_WARD_SUCCESS: f64 = 0.55;

/// Parameters of one forge path: a run of sub-attempts that resolves a single
/// tier transition without any downgrade risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathRates {
    /// Successful sub-attempts needed to complete the path.
    pub required: u32,
    /// Success probability of one sub-attempt.
    pub success_rate: f64,
    /// Failed sub-attempts before the next one is guaranteed. 0 = no pity.
    pub pity_threshold: u32,
    /// Cores consumed per sub-attempt, win or lose.
    pub cores_per_attempt: u32,
}

impl PathRates {
    /// Expected sub-attempts to earn one progress point, accounting for the
    /// pity guarantee truncating the geometric tail.
    pub fn expected_attempts_per_stage(&self) -> f64 {
        if self.pity_threshold == 0 {
            return 1.0 / self.success_rate;
        }
        let p = self.success_rate;
        let mut survival = 1.0;
        let mut expected = 0.0;
        // Trials 1..=pity_threshold succeed with probability p; the trial after
        // the last allowed failure is guaranteed.
        for k in 1..=self.pity_threshold {
            expected += k as f64 * survival * p;
            survival *= 1.0 - p;
        }
        expected += (self.pity_threshold + 1) as f64 * survival;
        expected
    }

    /// Expected sub-attempts to complete the whole path from zero progress.
    pub fn expected_total_attempts(&self) -> f64 {
        self.required as f64 * self.expected_attempts_per_stage()
    }
}

/// Currency cost per unit of each consumable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub stone: u64,
    pub blessings: [u64; 3],
    pub ward: u64,
    pub core: u64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            stone: 1_800,
            blessings: [350, 900, 2_200],
            ward: 5_000,
            core: 1_200,
        }
    }
}

/// Full probability table for one simulation. Index convention: entry `t - 1`
/// covers the transition onto tier `t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base_rates: [f64; TIER_COUNT],
    pub pity_thresholds: [u32; TIER_COUNT],
    pub blessing_multipliers: [f64; 3],
    /// Probability that a ward holds the tier on a failed attempt.
    pub ward_success: f64,
    /// Forge path parameters: `paths[0]` resolves 7 -> 8, `paths[1]` 8 -> 9.
    pub paths: [PathRates; 2],
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            base_rates: STOCK_BASE_RATES,
            pity_thresholds: STOCK_PITY_THRESHOLDS,
            blessing_multipliers: STOCK_BLESSING_MULTIPLIERS,
            ward_success: STOCK_WARD_SUCCESS,
            paths: [
                PathRates {
                    required: 5,
                    success_rate: 0.35,
                    pity_threshold: 4,
                    cores_per_attempt: 3,
                },
                PathRates {
                    required: 10,
                    success_rate: 0.30,
                    pity_threshold: 5,
                    cores_per_attempt: 4,
                },
            ],
        }
    }
}

impl RateTable {
    /// Base success rate for the transition onto `target_tier` (1..=MAX_TIER).
    pub fn base_rate(&self, target_tier: u8) -> f64 {
        self.base_rates[target_tier as usize - 1]
    }

    /// Pity threshold for the transition onto `target_tier`. 0 = no pity.
    pub fn pity_threshold(&self, target_tier: u8) -> u32 {
        self.pity_thresholds[target_tier as usize - 1]
    }

    /// Check the table for values the engine cannot run with. Returns every
    /// issue found, not just the first.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (index, rate) in self.base_rates.iter().enumerate() {
            if !(*rate > 0.0 && *rate <= 1.0) {
                issues.push(format!(
                    "base_rates[{index}] = {rate} outside (0, 1] for transition onto tier {}",
                    index + 1
                ));
            }
        }
        for (index, multiplier) in self.blessing_multipliers.iter().enumerate() {
            if !(*multiplier >= 1.0) {
                issues.push(format!(
                    "blessing_multipliers[{index}] = {multiplier} below 1.0"
                ));
            }
        }
        if !(self.ward_success >= 0.0 && self.ward_success <= 1.0) {
            issues.push(format!("ward_success = {} outside [0, 1]", self.ward_success));
        }
        for (index, path) in self.paths.iter().enumerate() {
            let origin = PATH_ORIGINS[index];
            if path.required == 0 {
                issues.push(format!(
                    "paths[{index}] (tier {origin} -> {}) requires zero sub-attempts",
                    origin + 1
                ));
            }
            if !(path.success_rate > 0.0 && path.success_rate <= 1.0) {
                issues.push(format!(
                    "paths[{index}].success_rate = {} outside (0, 1]",
                    path.success_rate
                ));
            }
            if path.cores_per_attempt == 0 {
                issues.push(format!("paths[{index}].cores_per_attempt is zero"));
            }
        }
        issues
    }
}

/// Load a house-rule table from a JSON file. Missing or malformed files are
/// reported to the caller; there is no silent fallback to the stock table.
pub fn load_rate_table(path: &Path) -> Result<RateTable, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("unable to read '{}': {err}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|err| format!("unable to parse json '{}': {err}", path.display()))
}
