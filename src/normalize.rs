use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-z0-9]+").unwrap());

/// Convert a country label to a snake_case ASCII identifier.
///
/// `Algérie` → `algerie`, `Côte d'Ivoire` → `cote_d_ivoire`,
/// `République démocratique du Congo` → `republique_democratique_du_congo`.
///
/// Total function: any input yields a (possibly empty) identifier. Callers
/// must reject the empty string — it is not a valid catalog key.
pub fn normalize(label: &str) -> String {
    // Typographic apostrophes become plain ones before decomposition.
    let plain = label.replace(['\u{2019}', '\u{2018}'], "'");
    // NFKD splits base letters from combining accents; dropping everything
    // non-ASCII then strips the accents while keeping the base letter.
    let ascii: String = plain.nfkd().filter(char::is_ascii).collect();
    let lower = ascii.to_lowercase();
    NON_ALNUM
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}
