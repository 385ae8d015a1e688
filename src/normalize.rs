//! Team name normalization.
//!
//! This module canonicalizes free-text team names into comparison keys so
//! the same club can be recognized across ranking lists and providers that
//! each spell it differently.

/// Normalize a team name to a comparison key.
///
/// Rules applied, in order:
/// 1. Lowercase
/// 2. Fold diacritics to ASCII
/// 3. Drop parenthetical qualifiers, e.g. "(France)"
/// 4. Replace remaining punctuation with spaces
/// 5. Drop organizational tokens ("Basketball", "Club", "BC", "KK", ...)
/// 6. Collapse whitespace
///
/// The function is pure, deterministic, and idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
///
/// # Examples
///
/// ```
/// use prospect_schedule::normalize::normalize;
/// assert_eq!(normalize("BEŞİKTAŞ"), "besiktas");
/// assert_eq!(normalize("Partizan Basketball Club (Serbia)"), "partizan");
/// ```
pub fn normalize(raw: &str) -> String {
    let stripped = strip_parentheticals(raw);

    // Lowercase, fold diacritics, and replace punctuation in one pass.
    let mut folded = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        for lower in c.to_lowercase() {
            fold_char(lower, &mut folded);
        }
    }

    // Tokenize and drop organizational noise, unless that would empty the
    // name entirely (a club literally named "BC" keeps its token).
    let tokens: Vec<&str> = folded.split_whitespace().collect();
    let kept: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| !is_org_token(t))
        .collect();

    if kept.is_empty() {
        tokens.join(" ")
    } else {
        kept.join(" ")
    }
}

/// Symmetric, dateless key for a pair of team names. Used by the score
/// enricher to match scoreboard entries to already-known games.
pub fn pair_key(team_a: &str, team_b: &str) -> String {
    let norm_a = normalize(team_a);
    let norm_b = normalize(team_b);
    if norm_a <= norm_b {
        format!("{}|{}", norm_a, norm_b)
    } else {
        format!("{}|{}", norm_b, norm_a)
    }
}

/// Remove "(...)" segments, tolerating unbalanced input.
fn strip_parentheticals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0u32;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Organizational tokens that carry no identity: legal forms, sport
/// qualifiers, and the club-prefix abbreviations common in European
/// basketball.
fn is_org_token(token: &str) -> bool {
    matches!(
        token,
        "basketball" | "basket" | "basquet" | "club" | "bc" | "kk" | "bk" | "bbc" | "cb"
            | "sc" | "ac" | "mens" | "team"
    )
}

/// Fold one (already lowercased) character to its ASCII skeleton, pushing
/// the result onto `out`. Combining marks are dropped; punctuation becomes
/// a space so token boundaries survive.
fn fold_char(c: char, out: &mut String) {
    // Combining diacritical marks (left over from decomposed input such as
    // the lowercase of İ).
    if ('\u{0300}'..='\u{036F}').contains(&c) {
        return;
    }

    let folded: &str = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'ç' | 'ć' | 'č' | 'ĉ' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' | 'ģ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ł' => "l",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'ŕ' | 'ř' => "r",
        'ş' | 'ś' | 'š' | 'ș' => "s",
        'ţ' | 'ť' | 'ț' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        'þ' => "th",
        _ => {
            // Alphabets the fold table doesn't cover pass through lowercased
            // so non-Latin names keep a usable key.
            if c.is_alphanumeric() {
                out.push(c);
            } else {
                out.push(' ');
            }
            return;
        }
    };
    out.push_str(folded);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Duke"), "duke");
        assert_eq!(normalize("  Real   Madrid  "), "real madrid");
        assert_eq!(normalize("Saint-Quentin"), "saint quentin");
    }

    #[test]
    fn test_normalize_diacritics() {
        assert_eq!(normalize("Beşiktaş"), "besiktas");
        assert_eq!(normalize("BEŞİKTAŞ"), "besiktas");
        assert_eq!(normalize("Besiktas"), normalize("BEŞİKTAŞ"));
        assert_eq!(normalize("Žalgiris"), "zalgiris");
        assert_eq!(normalize("Fenerbahçe"), "fenerbahce");
        assert_eq!(normalize("Málaga"), "malaga");
    }

    #[test]
    fn test_normalize_parentheticals() {
        assert_eq!(normalize("ASVEL (France)"), "asvel");
        assert_eq!(normalize("Joventut (Badalona) (Spain)"), "joventut badalona");
    }

    #[test]
    fn test_normalize_org_suffixes() {
        assert_eq!(normalize("Partizan Basketball Club"), "partizan");
        assert_eq!(normalize("KK Crvena Zvezda"), "crvena zvezda");
        assert_eq!(normalize("BC Zalgiris"), "zalgiris");
        assert_eq!(normalize("Bayern Munich Basketball"), "bayern munich");
    }

    #[test]
    fn test_normalize_keeps_org_only_names() {
        // A name made entirely of org tokens must not normalize to empty.
        assert_eq!(normalize("BC"), "bc");
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in [
            "BEŞİKTAŞ",
            "Partizan Basketball Club (Serbia)",
            "KK Crvena Zvezda",
            "L.A. Clippers",
            "Saint-Étienne Basket",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_pair_key_symmetric() {
        assert_eq!(
            pair_key("Partizan", "Crvena Zvezda"),
            pair_key("Crvena Zvezda", "Partizan")
        );
        assert_eq!(
            pair_key("KK Partizan", "BC Zalgiris"),
            pair_key("Žalgiris", "Partizan Basketball Club")
        );
    }
}
