//! Constant tables for VP8 coefficient cost estimation.
//!
//! The entropy cost table is libwebp's `VP8EntropyCost` (src/enc/cost_enc.c).
//! The fixed level costs are built from it at compile time: the sign bit
//! plus the extra bits of each DCT category, coded with the fixed category
//! probabilities.

/// Number of coefficient types (0=i16-AC, 1=i16-DC, 2=chroma, 3=i4)
pub const NUM_TYPES: usize = 4;
/// Number of bands for coefficient encoding
pub const NUM_BANDS: usize = 8;
/// Number of contexts (0=zero, 1=one, 2=more)
pub const NUM_CTX: usize = 3;
/// Number of probabilities per context node
pub const NUM_PROBAS: usize = 11;

/// Highest level with a probability-dependent cost entry.
/// Levels above this share the last entry and differ only in fixed cost.
pub const MAX_VARIABLE_LEVEL: usize = 67;

/// Highest absolute coefficient level representable by the token grammar
pub const MAX_LEVEL: usize = 2047;

/// Band table: position (plus one-past-the-end sentinel) to band index.
pub type BandTable = [u8; 16 + 1];

/// VP8 band mapping. The trailing entry is a sentinel for `n + 1 == 16`.
pub const VP8_ENC_BANDS: BandTable = [0, 1, 2, 3, 6, 4, 5, 6, 6, 6, 6, 6, 6, 6, 6, 7, 0];

/// Fixed level cost table type, indexed by absolute level.
pub type LevelFixedCosts = [u16; MAX_LEVEL + 1];

/// Cost in 1/256 bit of coding a 0 bit whose probability is `index / 256`.
/// The cost of a 1 bit is found at `255 - index`.
#[rustfmt::skip]
pub const VP8_ENTROPY_COST: [u16; 256] = [
    1792, 1792, 1792, 1536, 1536, 1408, 1366, 1280, 1280, 1216,
    1178, 1152, 1110, 1076, 1061, 1024, 1024,  992,  968,  951,
     939,  911,  896,  878,  871,  854,  838,  820,  811,  794,
     786,  768,  768,  752,  740,  732,  720,  709,  704,  690,
     683,  672,  666,  655,  647,  640,  631,  622,  615,  607,
     598,  592,  586,  576,  572,  564,  559,  555,  547,  541,
     534,  528,  522,  512,  512,  504,  500,  494,  488,  483,
     477,  473,  467,  461,  458,  452,  448,  443,  438,  434,
     427,  424,  419,  415,  410,  406,  403,  399,  394,  390,
     384,  384,  377,  374,  370,  366,  362,  359,  355,  351,
     347,  342,  342,  336,  333,  330,  326,  323,  320,  316,
     312,  308,  305,  302,  299,  296,  293,  288,  287,  283,
     280,  277,  274,  272,  268,  266,  262,  256,  256,  256,
     251,  248,  245,  242,  240,  237,  234,  232,  228,  226,
     223,  221,  218,  216,  214,  211,  208,  205,  203,  201,
     198,  196,  192,  191,  188,  187,  183,  181,  179,  176,
     175,  171,  171,  168,  165,  163,  160,  159,  156,  154,
     152,  150,  148,  146,  144,  142,  139,  138,  135,  133,
     131,  128,  128,  125,  123,  121,  119,  117,  115,  113,
     111,  110,  107,  105,  103,  102,  100,   98,   96,   94,
      92,   91,   89,   86,   86,   83,   82,   80,   77,   76,
      74,   73,   71,   69,   67,   66,   64,   63,   61,   59,
      57,   55,   54,   52,   51,   49,   47,   46,   44,   43,
      41,   40,   38,   36,   35,   33,   32,   30,   29,   27,
      25,   24,   22,   21,   19,   18,   16,   15,   13,   12,
      10,    9,    7,    6,    4,    3,
];

const fn level_codes_table() -> [[u16; 2]; MAX_VARIABLE_LEVEL] {
    let mut table = [[0u16; 2]; MAX_VARIABLE_LEVEL];
    let mut level = 1;
    while level <= MAX_VARIABLE_LEVEL {
        table[level - 1] = match level {
            1 => [0x001, 0x000],
            2 => [0x007, 0x001],
            3 => [0x00f, 0x005],
            4 => [0x00f, 0x00d],
            5..=6 => [0x033, 0x003],
            7..=10 => [0x033, 0x023],
            11..=18 => [0x0d3, 0x013],
            19..=34 => [0x0d3, 0x093],
            35..=66 => [0x153, 0x053],
            _ => [0x153, 0x153],
        };
        level += 1;
    }
    table
}

/// Token-tree path for levels 1..=MAX_VARIABLE_LEVEL.
///
/// Entry `[level - 1]` is `[pattern, bits]`: bit `i` of `pattern` says whether
/// probability node `i + 2` is visited, bit `i` of `bits` is the branch taken.
pub const VP8_LEVEL_CODES: [[u16; 2]; MAX_VARIABLE_LEVEL] = level_codes_table();

/// First level of each DCT extra-bits category (Cat1..Cat6).
const DCT_CAT_BASE: [usize; 6] = [5, 7, 11, 19, 35, 67];
/// Number of extra bits of each category.
const DCT_CAT_BITS: [usize; 6] = [1, 2, 3, 4, 5, 11];
/// Fixed probabilities of the extra bits, most significant bit first.
const DCT_CAT_PROBAS: [[u8; 11]; 6] = [
    [159, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [165, 145, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [173, 148, 140, 0, 0, 0, 0, 0, 0, 0, 0],
    [176, 155, 140, 135, 0, 0, 0, 0, 0, 0, 0],
    [180, 157, 141, 134, 130, 0, 0, 0, 0, 0, 0],
    [254, 254, 243, 230, 196, 177, 153, 140, 133, 130, 129],
];

const fn level_fixed_costs_table() -> LevelFixedCosts {
    let mut table = [0u16; MAX_LEVEL + 1];
    let mut level = 1;
    while level <= MAX_LEVEL {
        // sign bit
        let mut cost = 256u32;
        if level >= DCT_CAT_BASE[0] {
            let mut cat = DCT_CAT_BASE.len() - 1;
            while level < DCT_CAT_BASE[cat] {
                cat -= 1;
            }
            let extra = level - DCT_CAT_BASE[cat];
            let nbits = DCT_CAT_BITS[cat];
            let mut i = 0;
            while i < nbits {
                let prob = DCT_CAT_PROBAS[cat][i] as usize;
                let bit = (extra >> (nbits - 1 - i)) & 1;
                cost += if bit != 0 {
                    VP8_ENTROPY_COST[255 - prob] as u32
                } else {
                    VP8_ENTROPY_COST[prob] as u32
                };
                i += 1;
            }
        }
        table[level] = cost as u16;
        level += 1;
    }
    table
}

/// Probability-independent part of a level's cost: the sign bit plus the
/// extra bits of its DCT category. Indexed by absolute level.
pub const VP8_LEVEL_FIXED_COSTS: LevelFixedCosts = level_fixed_costs_table();
