//! Bit cost primitives and probability-dependent cost tables.
//!
//! All costs are in 1/256 bit units, the fixed-point convention shared with
//! the entropy coder's probability model.
//!
//! ## Module organization
//!
//! - [`level_costs`]: Level cost tables derived from token probabilities

pub mod level_costs;

pub use level_costs::{BandLevelCosts, LevelCostArray, LevelCostTables, LevelCosts};

use crate::error::CostError;
use crate::tables::{NUM_BANDS, NUM_CTX, NUM_PROBAS, NUM_TYPES, VP8_ENTROPY_COST};

/// Token probabilities for one coefficient type: \[band\]\[context\]\[node\]
pub type BandProbas = [[[u8; NUM_PROBAS]; NUM_CTX]; NUM_BANDS];

/// Token probabilities for all coefficient types: \[type\]\[band\]\[context\]\[node\]
pub type TokenProbTables = [BandProbas; NUM_TYPES];

/// Number of entries in a flat [`TokenProbTables`].
pub const TOKEN_PROBS_LEN: usize = NUM_TYPES * NUM_BANDS * NUM_CTX * NUM_PROBAS;

/// Calculate bit cost for coding a boolean value with given probability.
///
/// `prob` is the probability of a zero bit, scaled to 0..=255.
/// Returns cost in 1/256 bit units.
#[inline]
pub fn bit_cost(bit: bool, prob: u8) -> u16 {
    if bit {
        VP8_ENTROPY_COST[255 - prob as usize]
    } else {
        VP8_ENTROPY_COST[prob as usize]
    }
}

/// Build token probability tables from a flat array in
/// \[type\]\[band\]\[context\]\[node\] order, as stored in the frame header.
pub fn token_probs_from_slice(flat: &[u8]) -> Result<TokenProbTables, CostError> {
    if flat.len() != TOKEN_PROBS_LEN {
        return Err(CostError::InvalidTableLength {
            what: "token probability",
            expected: TOKEN_PROBS_LEN,
            actual: flat.len(),
        });
    }
    let mut probs = [[[[0u8; NUM_PROBAS]; NUM_CTX]; NUM_BANDS]; NUM_TYPES];
    let mut nodes = flat.chunks_exact(NUM_PROBAS);
    for ctx_row in probs.iter_mut().flatten().flatten() {
        if let Some(chunk) = nodes.next() {
            ctx_row.copy_from_slice(chunk);
        }
    }
    Ok(probs)
}

/// Token probability tables with every node set to `prob`.
pub fn uniform_token_probs(prob: u8) -> TokenProbTables {
    [[[[prob; NUM_PROBAS]; NUM_CTX]; NUM_BANDS]; NUM_TYPES]
}
