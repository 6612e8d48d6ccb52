//! Residual cost properties checked against hand-computed tables.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zenresidual::cost::BandLevelCosts;
use zenresidual::tables::{BandTable, LevelFixedCosts, MAX_LEVEL, MAX_VARIABLE_LEVEL, NUM_BANDS, NUM_CTX};
use zenresidual::{
    bit_cost, uniform_token_probs, CoeffType, CostBackend, LevelCosts, Residual, ResidualCoster,
    ResidualTables, ScalarCoster,
};

const FLAT_BANDS: BandTable = [0; 17];
const ZERO_FIXED: LevelFixedCosts = [0; MAX_LEVEL + 1];

fn constant_costs(c: u16) -> BandLevelCosts {
    [[[c; MAX_VARIABLE_LEVEL + 1]; NUM_CTX]; NUM_BANDS]
}

/// Every backend this machine can run.
fn backends() -> Vec<Box<dyn ResidualCoster>> {
    let mut out: Vec<Box<dyn ResidualCoster>> =
        vec![Box::new(ScalarCoster), Box::new(CostBackend::global())];
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if let Some(sse2) = zenresidual::Sse2Coster::summon() {
        out.push(Box::new(sse2));
    }
    out
}

#[test]
fn all_zero_block_costs_only_the_empty_signal() {
    let probs = uniform_token_probs(128);
    for c in [0u16, 17, 900] {
        let costs = constant_costs(c);
        let tables = ResidualTables::new(&probs[0], &costs)
            .with_bands(&FLAT_BANDS)
            .with_fixed_costs(&ZERO_FIXED);
        let zeros = [0i32; 16];
        for coster in backends() {
            let res = coster.residual(&zeros, 0);
            assert_eq!(res.last, -1);
            assert_eq!(coster.residual_cost(0, &res, &tables), 256);
        }
    }
}

#[test]
fn single_dc_coefficient_matches_hand_arithmetic() {
    const C: u16 = 333;
    let probs = uniform_token_probs(128);
    let costs = constant_costs(C);
    let fixed = zenresidual::tables::VP8_LEVEL_FIXED_COSTS;
    let tables = ResidualTables::new(&probs[0], &costs)
        .with_bands(&FLAT_BANDS)
        .with_fixed_costs(&fixed);

    let mut coeffs = [0i32; 16];
    coeffs[0] = 3;
    let expected = u32::from(bit_cost(true, 128))
        + u32::from(fixed[3])
        + u32::from(C)
        + u32::from(bit_cost(false, 128));

    for coster in backends() {
        let res = coster.residual(&coeffs, 0);
        assert_eq!(res.last, 0);
        assert_eq!(coster.residual_cost(0, &res, &tables), expected);
    }

    let zero_fixed = ResidualTables::new(&probs[0], &costs)
        .with_bands(&FLAT_BANDS)
        .with_fixed_costs(&ZERO_FIXED);
    let res = ScalarCoster.residual(&coeffs, 0);
    assert_eq!(
        ScalarCoster.residual_cost(0, &res, &zero_fixed),
        u32::from(bit_cost(true, 128)) + u32::from(C) + 256
    );
}

/// Cost rows whose entries spell out where they were read from:
/// `1000 * ctx + 100 * band + level`.
fn tagged_costs() -> BandLevelCosts {
    let mut costs = constant_costs(0);
    for (band, b) in costs.iter_mut().enumerate() {
        for (ctx, row) in b.iter_mut().enumerate() {
            for (level, c) in row.iter_mut().enumerate() {
                *c = (1000 * ctx + 100 * band + level) as u16;
            }
        }
    }
    costs
}

#[test]
fn next_row_follows_context_of_previous_coefficient() {
    let mut probs = uniform_token_probs(128);
    // Distinct end-of-block probabilities per context in band 2 and band 3
    probs[3][2][0][0] = 50;
    probs[3][2][1][0] = 150;
    probs[3][2][2][0] = 220;
    probs[3][3][1][0] = 90;
    let costs = tagged_costs();
    let fixed = zenresidual::tables::VP8_LEVEL_FIXED_COSTS;
    let tables = ResidualTables::new(&probs[3], &costs);

    // ctx0 = 1: level 2 from row (band 0, ctx 1), then level 1 from
    // row (band 1, ctx 2), then end of block in band 2 with context 1.
    let coeffs = [2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let expected = u32::from(fixed[2])
        + 1002
        + u32::from(fixed[1])
        + 2101
        + u32::from(bit_cost(false, 150));
    for coster in backends() {
        let res = coster.residual(&coeffs, 0);
        assert_eq!(res.last, 1);
        assert_eq!(coster.residual_cost(1, &res, &tables), expected);
    }

    // ctx0 = 2: level 3 from (band 0, ctx 2), zero from (band 1, ctx 2),
    // level 1 from (band 2, ctx 0), then end of block in band 3 with context 1.
    let coeffs = [-3, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let expected = u32::from(fixed[3])
        + 2003
        + 2100
        + u32::from(fixed[1])
        + 201
        + u32::from(bit_cost(false, 90));
    for coster in backends() {
        let res = coster.residual(&coeffs, 0);
        assert_eq!(res.last, 2);
        assert_eq!(coster.residual_cost(2, &res, &tables), expected);
    }
}

#[test]
fn single_nonzero_is_found_at_every_position() {
    for coster in backends() {
        for k in 0..16 {
            for v in [1, -1, 2047, -70_000] {
                let mut coeffs = [0i32; 16];
                coeffs[k] = v;
                assert_eq!(coster.find_last(&coeffs), k as i32);
            }
        }
    }
}

#[test]
fn scan_ignores_trailing_zeros_and_leading_positions() {
    let mut rng = StdRng::seed_from_u64(7);
    for coster in backends() {
        for _ in 0..200 {
            let last = rng.gen_range(1..16);
            let mut coeffs = [0i32; 16];
            for c in coeffs.iter_mut().take(last).skip(1) {
                *c = rng.gen_range(-3..=3);
            }
            coeffs[last] = rng.gen_range(1..=50);
            // coefficient 0 is zero whenever first > 0
            let res = coster.residual(&coeffs, 1);
            assert_eq!(res.last, last as i32);
            assert_eq!(res.first, 1);
        }
    }
}

#[test]
fn scan_backends_agree_on_reference_patterns() {
    let mut patterns = vec![[0i32; 16], [5i32; 16]];
    let mut at0 = [0i32; 16];
    at0[0] = -2;
    patterns.push(at0);
    let mut at15 = [0i32; 16];
    at15[15] = 1;
    patterns.push(at15);
    patterns.push(core::array::from_fn(|i| if i % 2 == 0 { 0 } else { i as i32 }));
    patterns.push(core::array::from_fn(|i| if i % 2 == 1 { 0 } else { -(i as i32) - 1 }));

    for coeffs in &patterns {
        let expected = ScalarCoster.find_last(coeffs);
        for coster in backends() {
            assert_eq!(coster.find_last(coeffs), expected, "{:?}", coeffs);
        }
    }
}

#[test]
fn backends_agree_on_random_blocks() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut probs = uniform_token_probs(128);
    for ctype in probs.iter_mut() {
        for p in ctype.iter_mut().flatten().flatten() {
            *p = rng.gen_range(1..=255);
        }
    }
    let costs = LevelCosts::from_probs(&probs);

    for ctype in [CoeffType::I16Ac, CoeffType::I16Dc, CoeffType::Chroma, CoeffType::I4] {
        let tables = costs.residual_tables(ctype, &probs);
        for _ in 0..2000 {
            let density = rng.gen_range(0.0..1.0);
            let mut coeffs = [0i32; 16];
            for c in coeffs.iter_mut().skip(ctype.first()) {
                if rng.gen_bool(density) {
                    *c = match rng.gen_range(0..10) {
                        0 => rng.gen_range(-(MAX_LEVEL as i32)..=MAX_LEVEL as i32),
                        1..=3 => rng.gen_range(-80..=80),
                        _ => rng.gen_range(-2..=2),
                    };
                }
            }
            let reference = ScalarCoster.residual(&coeffs, ctype.first());
            for ctx0 in 0..3 {
                let expected = ScalarCoster.residual_cost(ctx0, &reference, &tables);
                for coster in backends() {
                    let res = coster.residual(&coeffs, ctype.first());
                    assert_eq!(res.last, reference.last);
                    assert_eq!(coster.residual_cost(ctx0, &res, &tables), expected);
                }
            }
        }
    }
}

#[test]
fn zero_context_adds_exactly_the_nonzero_signal() {
    let mut probs = uniform_token_probs(128);
    // Same probabilities across contexts, varying across bands
    for (band, b) in probs[3].iter_mut().enumerate() {
        for ctx in b.iter_mut() {
            ctx[0] = 30 + band as u8 * 20;
        }
    }
    let mut costs = constant_costs(0);
    for (band, b) in costs.iter_mut().enumerate() {
        for ctx in b.iter_mut() {
            for (level, c) in ctx.iter_mut().enumerate() {
                *c = 40 + band as u16 + 7 * level as u16;
            }
        }
    }
    let tables = ResidualTables::new(&probs[3], &costs);

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let first = rng.gen_range(0..2);
        let mut coeffs = [0i32; 16];
        for c in coeffs.iter_mut().skip(first) {
            if rng.gen_bool(0.4) {
                *c = rng.gen_range(-20..=20);
            }
        }
        if coeffs.iter().all(|&c| c == 0) {
            coeffs[15] = 1;
        }
        let band = zenresidual::tables::VP8_ENC_BANDS[first] as usize;
        let signal = u32::from(bit_cost(true, probs[3][band][0][0]));
        for coster in backends() {
            let res = coster.residual(&coeffs, first);
            let zero = coster.residual_cost(0, &res, &tables);
            for ctx0 in 1..3 {
                assert_eq!(zero - coster.residual_cost(ctx0, &res, &tables), signal);
            }
        }
    }
}

#[test]
fn cost_never_decreases_with_magnitude() {
    let probs = uniform_token_probs(128);
    let mut costs = constant_costs(0);
    for b in costs.iter_mut() {
        for ctx in b.iter_mut() {
            for (level, c) in ctx.iter_mut().enumerate() {
                *c = 100 + 10 * level as u16;
            }
        }
    }
    let fixed: LevelFixedCosts = core::array::from_fn(|l| 3 * l as u16);
    let tables = ResidualTables::new(&probs[3], &costs).with_fixed_costs(&fixed);

    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let mut coeffs = [0i32; 16];
        for c in coeffs.iter_mut() {
            if rng.gen_bool(0.5) {
                *c = rng.gen_range(-5..=5);
            }
        }
        coeffs[15] = 1;
        let k = rng.gen_range(0..16);
        let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
        for coster in backends() {
            let mut prev = 0;
            for magnitude in 0..=100 {
                coeffs[k] = sign * magnitude;
                if k == 15 && magnitude == 0 {
                    continue;
                }
                let res = coster.residual(&coeffs, 0);
                let cost = coster.residual_cost(1, &res, &tables);
                assert!(cost >= prev, "k={} magnitude={}", k, magnitude);
                prev = cost;
            }
        }
    }
}

#[test]
fn repeated_calls_are_deterministic() {
    let probs = uniform_token_probs(90);
    let costs = LevelCosts::from_probs(&probs);
    let tables = costs.residual_tables(CoeffType::Chroma, &probs);
    let coeffs = [4, -1, 0, 0, 2, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
    for coster in backends() {
        let res = coster.residual(&coeffs, 0);
        let first = coster.residual_cost(1, &res, &tables);
        for _ in 0..10 {
            assert_eq!(coster.residual_cost(1, &res, &tables), first);
        }
    }
}

#[test]
fn residual_new_matches_backend_scan() {
    let coeffs = [0, 0, 3, 0, 0, 0, 0, -9, 0, 0, 0, 0, 0, 0, 0, 0];
    let res = Residual::new(&coeffs, 1);
    assert_eq!(res.last, 7);
    assert_eq!(zenresidual::find_last(&coeffs), 7);
}
