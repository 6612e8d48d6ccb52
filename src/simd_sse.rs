//! SSE2 residual cost kernels.
//!
//! Ported from libwebp's SetResidualCoeffs_SSE2 and GetResidualCost_SSE2.
//! Coefficients are i32 here (i16 in libwebp), so they are packed down with
//! signed saturation first. Saturation never turns a non-zero value into zero
//! and every clamp below is smaller than the saturation bound, so results
//! match the scalar path for any i32 input.

use archmage::{arcane, Has128BitSimd, SimdToken, X64V3Token};
use core::arch::x86_64::*;
use safe_unaligned_simd::x86_64 as simd_mem;

use crate::cost::bit_cost;
use crate::residual_cost::{last_from_mask, Residual, ResidualCoster, ResidualTables};
use crate::tables::MAX_VARIABLE_LEVEL;

/// SSE2 backend. Holding one proves the CPU supports it.
///
/// The kernels only issue SSE2 instructions, but they are entered through an
/// x86-64-v3 token (AVX2, FMA, BMI2), the same gate as the rest of the SIMD
/// code. On older x86_64 CPUs [`Sse2Coster::summon`] returns `None` and the
/// scalar backend is used.
#[derive(Clone, Copy)]
pub struct Sse2Coster {
    token: X64V3Token,
}

impl core::fmt::Debug for Sse2Coster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Sse2Coster")
    }
}

impl Sse2Coster {
    /// Detect x86-64-v3 support, returning `None` when unavailable.
    #[inline]
    pub fn summon() -> Option<Self> {
        X64V3Token::summon().map(Self::new)
    }

    /// Wrap an already summoned token.
    #[inline]
    pub fn new(token: X64V3Token) -> Self {
        Self { token }
    }
}

impl ResidualCoster for Sse2Coster {
    #[inline]
    fn find_last(&self, coeffs: &[i32; 16]) -> i32 {
        find_last_sse2(self.token, coeffs)
    }

    #[inline]
    fn residual_cost(&self, ctx0: usize, res: &Residual, tables: &ResidualTables) -> u32 {
        get_residual_cost_sse2(self.token, ctx0, res, tables)
    }
}

/// Load 16 i32 coefficients as two vectors of 8 saturated i16.
/// A macro so the intrinsics expand inside the caller's `#[arcane]` body.
macro_rules! load_packed_i16 {
    ($c:expr) => {{
        let c: &[i32; 16] = $c;
        let q0 = _mm_set_epi32(c[3], c[2], c[1], c[0]);
        let q1 = _mm_set_epi32(c[7], c[6], c[5], c[4]);
        let q2 = _mm_set_epi32(c[11], c[10], c[9], c[8]);
        let q3 = _mm_set_epi32(c[15], c[14], c[13], c[12]);
        (_mm_packs_epi32(q0, q1), _mm_packs_epi32(q2, q3))
    }};
}

/// Find last non-zero coefficient using SIMD.
/// Ported from libwebp's SetResidualCoeffs_SSE2.
///
/// Returns -1 if all coefficients are zero.
#[arcane]
fn find_last_sse2(_token: impl Has128BitSimd + Copy, coeffs: &[i32; 16]) -> i32 {
    let zero = _mm_setzero_si128();
    let (c0, c1) = load_packed_i16!(coeffs);

    // Pack i16 to i8, one lane per position
    let m0 = _mm_packs_epi16(c0, c1);
    let m1 = _mm_cmpeq_epi8(m0, zero);

    // movemask has a bit set for each zero lane; flip to get non-zero lanes
    let mask = 0x0000_ffff_u32 ^ (_mm_movemask_epi8(m1) as u32);
    last_from_mask(mask)
}

#[inline(always)]
fn abs_level_at(lo: &[u16; 8], hi: &[u16; 8], n: usize) -> usize {
    if n < 8 {
        lo[n] as usize
    } else {
        hi[n - 8] as usize
    }
}

/// SSE2 implementation of residual cost calculation.
/// Precomputes abs values, contexts, and clamped levels with SIMD.
#[arcane]
fn get_residual_cost_sse2(
    _token: impl Has128BitSimd + Copy,
    ctx0: usize,
    res: &Residual,
    tables: &ResidualTables,
) -> u32 {
    debug_assert!(ctx0 <= 2);
    let mut ctxs = [0u8; 16];
    let mut levels = [0u8; 16];
    let mut abs_lo = [0u16; 8];
    let mut abs_hi = [0u16; 8];

    let mut n = res.first;
    let band = tables.band(n);
    let p0 = tables.eob_proba(band, ctx0);
    let mut t = tables.cost_row(band, ctx0);

    // bit_cost(1, p0) is already incorporated in the cost tables, but only if ctx != 0.
    let mut cost = if ctx0 == 0 {
        u32::from(bit_cost(true, p0))
    } else {
        0
    };

    if res.last < 0 {
        return u32::from(bit_cost(false, p0));
    }

    {
        let zero = _mm_setzero_si128();
        let k_cst2 = _mm_set1_epi8(2);
        let k_cst67 = _mm_set1_epi8(MAX_VARIABLE_LEVEL as i8);
        let (c0, c1) = load_packed_i16!(res.coeffs);

        // abs(v) = max(v, -v), 16-bit
        let e0 = _mm_max_epi16(c0, _mm_sub_epi16(zero, c0));
        let e1 = _mm_max_epi16(c1, _mm_sub_epi16(zero, c1));

        let f = _mm_packs_epi16(e0, e1);
        // context = 0,1,2
        let g = _mm_min_epu8(f, k_cst2);
        // clamped level in [0..67]
        let h = _mm_min_epu8(f, k_cst67);

        simd_mem::_mm_storeu_si128(&mut ctxs, g);
        simd_mem::_mm_storeu_si128(&mut levels, h);
        simd_mem::_mm_storeu_si128(&mut abs_lo, e0);
        simd_mem::_mm_storeu_si128(&mut abs_hi, e1);
    }

    let last = res.last as usize;
    while n < last {
        let flevel = abs_level_at(&abs_lo, &abs_hi, n);
        cost += tables.fixed_cost(flevel) + u32::from(t[levels[n] as usize]);
        t = tables.cost_row(tables.band(n + 1), ctxs[n] as usize);
        n += 1;
    }

    // Last coefficient is always non-zero
    let flevel = abs_level_at(&abs_lo, &abs_hi, n);
    debug_assert!(flevel != 0, "last coefficient must be non-zero");
    cost += tables.fixed_cost(flevel) + u32::from(t[levels[n] as usize]);
    if n < 15 {
        let last_p0 = tables.eob_proba(tables.band(n + 1), ctxs[n] as usize);
        cost += u32::from(bit_cost(false, last_p0));
    }

    cost
}
