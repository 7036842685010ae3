pub mod engine;
pub mod rates;
pub mod rng;
pub mod runner;

pub use engine::{
    AttemptKind, AttemptOutcome, ConsumableCounts, EngineError, EnhanceConfig, EnhanceEngine,
    SpendPreview, PITY_SLOTS,
};
pub use rates::{
    load_rate_table, PathRates, PriceTable, RateTable, MAX_TIER, PATH_A_ORIGIN, PATH_B_ORIGIN,
    PATH_ORIGINS, TIER_COUNT,
};
pub use rng::Rng;
pub use runner::{run_capped, run_recorded, ResourceLimits, RunRecord, RunTotals};
