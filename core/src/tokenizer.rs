use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Word characters and hyphens, bounded by word boundaries on both ends.
    static ref RE: Regex = Regex::new(r"(?u)\b[\w\-]+\b").expect("valid regex");
    static ref WS: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Canonical form of ingredient text: NFKC, lowercase, single spaces, trimmed.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    WS.replace_all(lowered.trim(), " ").into_owned()
}

/// Split text into lowercase tokens. Internal hyphens stay part of a token,
/// every other non-word character separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Chicken, low-fat milk & rice!");
        assert_eq!(t, vec!["chicken", "low-fat", "milk", "rice"]);
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  Olive\tOil \n\n Garlic "), "olive oil garlic");
    }
}
