//! Residual coefficient cost estimation using probability-dependent tables.
//!
//! Contains the last-nonzero scan, GetResidualCost, and the [`ResidualCoster`]
//! interface the dispatched backends implement.

use crate::cost::{bit_cost, BandLevelCosts, BandProbas, LevelCostArray};
use crate::tables::{
    BandTable, LevelFixedCosts, MAX_LEVEL, MAX_VARIABLE_LEVEL, VP8_ENC_BANDS,
    VP8_LEVEL_FIXED_COSTS,
};

/// Coefficient type, selecting one slice of the token probability tables.
/// Discriminants match the VP8 bitstream ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CoeffType {
    /// I16 AC coefficients (Y1 blocks with DC carried in Y2)
    I16Ac = 0,
    /// I16 DC coefficients (Y2/WHT)
    I16Dc = 1,
    /// Chroma (UV) coefficients
    Chroma = 2,
    /// I4 coefficients
    I4 = 3,
}

impl CoeffType {
    /// First scan position coded for this type.
    #[inline]
    pub const fn first(self) -> usize {
        match self {
            CoeffType::I16Ac => 1,
            _ => 0,
        }
    }
}

/// Residual coefficients for cost calculation.
/// Ported from libwebp's VP8Residual.
#[derive(Debug, Clone, Copy)]
pub struct Residual<'a> {
    /// First coefficient to consider
    pub first: usize,
    /// Last non-zero coefficient index (-1 if all zero)
    pub last: i32,
    /// Coefficient array in zigzag order
    pub coeffs: &'a [i32; 16],
}

impl<'a> Residual<'a> {
    /// Create a new residual from coefficients.
    /// Finds the last non-zero coefficient with a scalar scan.
    pub fn new(coeffs: &'a [i32; 16], first: usize) -> Self {
        Self::with_last(coeffs, first, find_last_scalar(coeffs))
    }

    /// Create a residual whose last non-zero index is already known.
    #[inline]
    pub fn with_last(coeffs: &'a [i32; 16], first: usize, last: i32) -> Self {
        debug_assert!(first < 16);
        debug_assert!(
            first == 0 || coeffs[0] == 0,
            "first position implies coefficient 0 is zero"
        );
        debug_assert!((-1..16).contains(&last));
        Self {
            first,
            last,
            coeffs,
        }
    }

    /// Whether any coefficient is non-zero.
    #[inline]
    pub fn has_nonzero(&self) -> bool {
        self.last >= 0
    }
}

/// Read-only tables consulted for one coefficient type.
///
/// Holds the band mapping, the token probabilities of the type, its level
/// costs and the fixed level costs. Nothing here is mutated during a call.
#[derive(Clone, Copy)]
pub struct ResidualTables<'a> {
    /// Position to band mapping, with sentinel at index 16
    pub bands: &'a BandTable,
    /// Token probabilities \[band\]\[ctx\]\[node\]
    pub probs: &'a BandProbas,
    /// Level costs \[band\]\[ctx\]\[level\]
    pub costs: &'a BandLevelCosts,
    /// Probability-independent level costs by absolute level
    pub fixed_costs: &'a LevelFixedCosts,
}

impl<'a> ResidualTables<'a> {
    /// Tables using the VP8 band mapping and fixed level costs.
    pub fn new(probs: &'a BandProbas, costs: &'a BandLevelCosts) -> Self {
        Self {
            bands: &VP8_ENC_BANDS,
            probs,
            costs,
            fixed_costs: &VP8_LEVEL_FIXED_COSTS,
        }
    }

    /// Replace the band mapping.
    pub fn with_bands(mut self, bands: &'a BandTable) -> Self {
        self.bands = bands;
        self
    }

    /// Replace the fixed level cost table.
    pub fn with_fixed_costs(mut self, fixed_costs: &'a LevelFixedCosts) -> Self {
        self.fixed_costs = fixed_costs;
        self
    }

    #[inline(always)]
    pub(crate) fn band(&self, n: usize) -> usize {
        self.bands[n] as usize
    }

    /// Probability that no further non-zero coefficient follows.
    #[inline(always)]
    pub(crate) fn eob_proba(&self, band: usize, ctx: usize) -> u8 {
        self.probs[band][ctx][0]
    }

    #[inline(always)]
    pub(crate) fn cost_row(&self, band: usize, ctx: usize) -> &'a LevelCostArray {
        &self.costs[band][ctx]
    }

    #[inline(always)]
    pub(crate) fn fixed_cost(&self, abs_level: usize) -> u32 {
        u32::from(self.fixed_costs[abs_level.min(MAX_LEVEL)])
    }
}

/// Last-nonzero scan and residual cost, implemented by every backend.
///
/// All implementors must return identical results for identical inputs.
pub trait ResidualCoster {
    /// Index of the last non-zero coefficient, or -1 if all are zero.
    fn find_last(&self, coeffs: &[i32; 16]) -> i32;

    /// Cost in 1/256 bit of coding `res` with initial context `ctx0` (0..=2).
    fn residual_cost(&self, ctx0: usize, res: &Residual, tables: &ResidualTables) -> u32;

    /// Build a residual, scanning for its last non-zero coefficient.
    /// Ported from libwebp's SetResidualCoeffs.
    #[inline]
    fn residual<'a>(&self, coeffs: &'a [i32; 16], first: usize) -> Residual<'a> {
        Residual::with_last(coeffs, first, self.find_last(coeffs))
    }
}

/// Portable backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScalarCoster;

impl ResidualCoster for ScalarCoster {
    #[inline]
    fn find_last(&self, coeffs: &[i32; 16]) -> i32 {
        find_last_scalar(coeffs)
    }

    #[inline]
    fn residual_cost(&self, ctx0: usize, res: &Residual, tables: &ResidualTables) -> u32 {
        get_residual_cost_scalar(ctx0, res, tables)
    }
}

/// Reverse linear scan for the last non-zero coefficient.
#[inline]
pub fn find_last_scalar(coeffs: &[i32; 16]) -> i32 {
    coeffs
        .iter()
        .rposition(|&c| c != 0)
        .map(|i| i as i32)
        .unwrap_or(-1)
}

/// Highest set bit of a per-position non-zero mask (bit `i` = position `i`),
/// or -1 for an empty mask.
#[inline]
pub fn last_from_mask(mask: u32) -> i32 {
    if mask == 0 {
        -1
    } else {
        (31 - mask.leading_zeros()) as i32
    }
}

/// Context bucket of a coefficient magnitude.
#[inline(always)]
pub(crate) fn level_ctx(abs_level: u32) -> usize {
    abs_level.min(2) as usize
}

/// Scalar implementation of residual cost calculation.
/// Ported from libwebp's GetResidualCost_C.
///
/// Context for position `n + 1` comes only from the magnitude at `n`; the
/// cost row therefore advances one band ahead of the position being costed.
#[inline]
pub fn get_residual_cost_scalar(ctx0: usize, res: &Residual, tables: &ResidualTables) -> u32 {
    debug_assert!(ctx0 <= 2);
    let mut n = res.first;
    let band = tables.band(n);
    let p0 = tables.eob_proba(band, ctx0);
    let mut t = tables.cost_row(band, ctx0);

    // bit_cost(1, p0) is already incorporated in t[] tables, but only if ctx != 0.
    let mut cost = if ctx0 == 0 {
        u32::from(bit_cost(true, p0))
    } else {
        0
    };

    if res.last < 0 {
        return u32::from(bit_cost(false, p0));
    }
    let last = res.last as usize;

    while n < last {
        let v = res.coeffs[n].unsigned_abs();
        cost += tables.fixed_cost(v as usize) + u32::from(t[(v as usize).min(MAX_VARIABLE_LEVEL)]);
        t = tables.cost_row(tables.band(n + 1), level_ctx(v));
        n += 1;
    }

    // Last coefficient is always non-zero
    let v = res.coeffs[n].unsigned_abs();
    debug_assert!(v != 0, "last coefficient must be non-zero");
    cost += tables.fixed_cost(v as usize) + u32::from(t[(v as usize).min(MAX_VARIABLE_LEVEL)]);
    if n < 15 {
        let last_p0 = tables.eob_proba(tables.band(n + 1), level_ctx(v));
        cost += u32::from(bit_cost(false, last_p0));
    }

    cost
}
