//! Macroblock-level coefficient costs.
//!
//! Ported from libwebp's VP8GetCostLuma4, VP8GetCostLuma16 and VP8GetCostUV.
//! These chain residual costs across the 4x4 blocks of a macroblock,
//! deriving each block's initial context from its top and left neighbours.

use crate::cost::{LevelCosts, TokenProbTables};
use crate::residual_cost::{CoeffType, ResidualCoster};

/// Index of the luma DC (Y2) flag in [`NonZeroContext`].
pub const NZ_DC: usize = 8;
/// Index of the first U flag in [`NonZeroContext`]; V follows at `NZ_U + 2`.
pub const NZ_U: usize = 4;

/// Whether the neighbouring blocks above and to the left had non-zero
/// coefficients.
///
/// Layout of both arrays: 0..4 luma columns/rows, 4..6 U, 6..8 V, 8 luma DC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonZeroContext {
    /// Flags of the blocks above
    pub top: [bool; 9],
    /// Flags of the blocks to the left
    pub left: [bool; 9],
}

impl NonZeroContext {
    /// Context with no non-zero neighbours.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn ctx(&self, top: usize, left: usize) -> usize {
        usize::from(self.top[top]) + usize::from(self.left[left])
    }
}

/// Per-type cost tables shared by the macroblock helpers.
#[derive(Clone, Copy)]
pub struct BlockCostTables<'a> {
    /// Level costs calculated from `probs`
    pub costs: &'a LevelCosts,
    /// Token probabilities
    pub probs: &'a TokenProbTables,
}

/// Calculate the cost of encoding one 4x4 luma block (I4 mode).
///
/// # Arguments
/// * `i4` - Block index within the macroblock, raster order (0..16)
/// * `levels` - Quantized coefficients in zigzag order
/// * `nz` - Non-zero flags of the neighbouring blocks
///
/// # Returns
/// Cost in 1/256 bits
pub fn cost_luma4<C: ResidualCoster + ?Sized>(
    coster: &C,
    i4: usize,
    levels: &[i32; 16],
    nz: &NonZeroContext,
    tables: BlockCostTables,
) -> u32 {
    debug_assert!(i4 < 16);
    let (x, y) = (i4 & 3, i4 >> 2);
    let ctx = nz.ctx(x, y);
    let rt = tables.costs.residual_tables(CoeffType::I4, tables.probs);
    let res = coster.residual(levels, CoeffType::I4.first());
    coster.residual_cost(ctx, &res, &rt)
}

/// Calculate the cost of encoding all luma blocks in I16 mode:
/// the DC (Y2) block followed by 16 AC blocks that skip their DC.
///
/// # Returns
/// Total cost in 1/256 bits
pub fn cost_luma16<C: ResidualCoster + ?Sized>(
    coster: &C,
    dc_levels: &[i32; 16],
    ac_levels: &[[i32; 16]; 16],
    nz: &NonZeroContext,
    tables: BlockCostTables,
) -> u32 {
    let dc_tables = tables.costs.residual_tables(CoeffType::I16Dc, tables.probs);
    let dc_res = coster.residual(dc_levels, CoeffType::I16Dc.first());
    let mut total = coster.residual_cost(nz.ctx(NZ_DC, NZ_DC), &dc_res, &dc_tables);

    let ac_tables = tables.costs.residual_tables(CoeffType::I16Ac, tables.probs);
    let mut top_nz = [nz.top[0], nz.top[1], nz.top[2], nz.top[3]];
    let mut left_nz = [nz.left[0], nz.left[1], nz.left[2], nz.left[3]];
    for y in 0..4 {
        for x in 0..4 {
            let ctx = usize::from(top_nz[x]) + usize::from(left_nz[y]);
            let res = coster.residual(&ac_levels[x + y * 4], CoeffType::I16Ac.first());
            total += coster.residual_cost(ctx, &res, &ac_tables);
            top_nz[x] = res.has_nonzero();
            left_nz[y] = res.has_nonzero();
        }
    }
    total
}

/// Calculate the cost of encoding the chroma blocks: four U blocks then four
/// V blocks, each plane in 2x2 raster order.
///
/// # Returns
/// Total cost in 1/256 bits
pub fn cost_uv<C: ResidualCoster + ?Sized>(
    coster: &C,
    uv_levels: &[[i32; 16]; 8],
    nz: &NonZeroContext,
    tables: BlockCostTables,
) -> u32 {
    let rt = tables.costs.residual_tables(CoeffType::Chroma, tables.probs);
    let mut total = 0;
    for ch in [0, 2] {
        let mut top_nz = [nz.top[NZ_U + ch], nz.top[NZ_U + ch + 1]];
        let mut left_nz = [nz.left[NZ_U + ch], nz.left[NZ_U + ch + 1]];
        for y in 0..2 {
            for x in 0..2 {
                let ctx = usize::from(top_nz[x]) + usize::from(left_nz[y]);
                let res = coster.residual(&uv_levels[ch * 2 + x + y * 2], CoeffType::Chroma.first());
                total += coster.residual_cost(ctx, &res, &rt);
                top_nz[x] = res.has_nonzero();
                left_nz[y] = res.has_nonzero();
            }
        }
    }
    total
}
