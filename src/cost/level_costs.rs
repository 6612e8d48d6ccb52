//! Level cost tables for accurate coefficient cost estimation.
//!
//! Ported from libwebp src/enc/cost_enc.c
//!
//! Coefficient costs depend on the probability context.
//! [`LevelCosts::calculate`] precomputes cost tables indexed by
//! \[type\]\[band\]\[ctx\]\[level\], which the residual cost estimator then
//! walks band by band.

use super::{bit_cost, TokenProbTables};
use crate::residual_cost::{CoeffType, ResidualTables};
use crate::tables::{MAX_VARIABLE_LEVEL, NUM_BANDS, NUM_CTX, NUM_PROBAS, NUM_TYPES, VP8_LEVEL_CODES};

/// Cost for each level 0..=MAX_VARIABLE_LEVEL under one band and context
pub type LevelCostArray = [u16; MAX_VARIABLE_LEVEL + 1];

/// Level costs of one coefficient type, indexed by \[band\]\[context\]
pub type BandLevelCosts = [[LevelCostArray; NUM_CTX]; NUM_BANDS];

/// Level costs indexed by \[type\]\[band\]\[context\]
pub type LevelCostTables = [BandLevelCosts; NUM_TYPES];

/// Calculate the variable-length cost for encoding a level >= 1.
/// Uses the VP8_LEVEL_CODES table to determine which probability nodes to use.
/// Ported from libwebp's VariableLevelCost.
fn variable_level_cost(level: usize, probas: &[u8; NUM_PROBAS]) -> u16 {
    if level == 0 {
        return 0;
    }
    let [pattern, bits] = VP8_LEVEL_CODES[level.min(MAX_VARIABLE_LEVEL) - 1];

    let mut cost = 0u16;
    let mut p = pattern;
    let mut b = bits;
    // node 0 (end of block) and node 1 (zero) are accounted by the caller
    let mut i = 2;

    while p != 0 {
        if (p & 1) != 0 {
            cost += bit_cost((b & 1) != 0, probas[i]);
        }
        b >>= 1;
        p >>= 1;
        i += 1;
    }
    cost
}

/// Level cost tables holder.
/// Ported from libwebp's VP8EncProba (level_cost field).
#[derive(Clone)]
pub struct LevelCosts {
    /// Level costs indexed by \[type\]\[band\]\[ctx\]\[level\]
    pub level_cost: LevelCostTables,
    /// Whether the tables are dirty and need recalculation
    dirty: bool,
}

impl Default for LevelCosts {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelCosts {
    /// Create new level cost tables
    pub fn new() -> Self {
        Self {
            level_cost: [[[[0u16; MAX_VARIABLE_LEVEL + 1]; NUM_CTX]; NUM_BANDS]; NUM_TYPES],
            dirty: true,
        }
    }

    /// Create tables already calculated from `probs`.
    pub fn from_probs(probs: &TokenProbTables) -> Self {
        let mut costs = Self::new();
        costs.calculate(probs);
        costs
    }

    /// Mark tables as dirty (need recalculation)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if tables need recalculation
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Calculate level costs from probability tables.
    /// Ported from libwebp's VP8CalculateLevelCosts.
    ///
    /// Does nothing unless the tables are dirty.
    pub fn calculate(&mut self, probs: &TokenProbTables) {
        if !self.dirty {
            return;
        }

        for (type_costs, type_probs) in self.level_cost.iter_mut().zip(probs.iter()) {
            for (band_costs, band_probs) in type_costs.iter_mut().zip(type_probs.iter()) {
                for (ctx, (table, p)) in band_costs.iter_mut().zip(band_probs.iter()).enumerate() {
                    // "more coefficients" is implied by the previous token except at ctx 0
                    let cost0 = if ctx > 0 { bit_cost(true, p[0]) } else { 0 };
                    let cost_base = bit_cost(true, p[1]) + cost0;

                    table[0] = bit_cost(false, p[1]) + cost0;
                    for (v, cost) in table.iter_mut().enumerate().skip(1) {
                        *cost = cost_base + variable_level_cost(v, p);
                    }
                }
            }
        }

        log::trace!("recalculated residual level cost tables");
        self.dirty = false;
    }

    /// Level costs for one coefficient type.
    #[inline]
    pub fn band_costs(&self, ctype: CoeffType) -> &BandLevelCosts {
        &self.level_cost[ctype as usize]
    }

    /// Read-only table view used by the residual cost estimator for `ctype`,
    /// with the VP8 band mapping and fixed level costs.
    #[inline]
    pub fn residual_tables<'a>(
        &'a self,
        ctype: CoeffType,
        probs: &'a TokenProbTables,
    ) -> ResidualTables<'a> {
        debug_assert!(!self.dirty, "level costs used before calculate()");
        ResidualTables::new(&probs[ctype as usize], self.band_costs(ctype))
    }
}
