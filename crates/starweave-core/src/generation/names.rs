//! Star and planet name generation

use rand::Rng;

/// Two or three syllables, capitalized, e.g. "Velkaris".
pub fn generate_star_name(rng: &mut impl Rng) -> String {
    let count = rng.gen_range(2..=3);
    let mut name = String::new();
    for i in 0..count {
        let pool = if i == 0 { PREFIXES } else { SYLLABLES };
        name.push_str(pool[rng.gen_range(0..pool.len())]);
    }
    if rng.gen_bool(0.15) {
        name.push(' ');
        name.push_str(SUFFIXES[rng.gen_range(0..SUFFIXES.len())]);
    }
    name
}

/// Planets take their star's name and a roman numeral by orbit.
pub fn planet_name(star: &str, index: usize) -> String {
    let numeral = NUMERALS.get(index).copied().unwrap_or("X");
    format!("{} {}", star, numeral)
}

static PREFIXES: &[&str] = &[
    "Al", "Bel", "Cor", "Dra", "El", "Fen", "Gal", "Hel", "Ix", "Jor", "Kal", "Lyr", "Mor",
    "Nex", "Or", "Pra", "Quel", "Ras", "Sol", "Tar", "Ul", "Vel", "Xan", "Zer",
];

static SYLLABLES: &[&str] = &[
    "a", "ar", "ax", "en", "eth", "ia", "is", "on", "or", "os", "ra", "ri", "th", "um", "us",
    "ka", "li", "na", "ve", "zo",
];

static SUFFIXES: &[&str] = &["Prime", "Major", "Minor", "Reach", "Gate"];

static NUMERALS: &[&str] = &["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX"];
