/// Normalizes a region display name: title-cases each whitespace-separated
/// token and collapses whitespace runs to single spaces
/// (`"west  godavari"` → `"West Godavari"`).
///
/// Idempotent: already-normalized names pass through unchanged.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in input.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars.flat_map(char::to_lowercase));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::title_case;
    use pretty_assertions::assert_eq;

    #[test]
    fn title_cases_each_token() {
        assert_eq!(title_case("west godavari"), "West Godavari");
        assert_eq!(title_case("EAST GODAVARI"), "East Godavari");
        assert_eq!(title_case("ysr kadapa"), "Ysr Kadapa");
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(title_case("  uttar \t pradesh  "), "Uttar Pradesh");
        assert_eq!(title_case(""), "");
        assert_eq!(title_case("   "), "");
    }

    #[test]
    fn is_idempotent() {
        for s in ["west godavari", "  MIXED case  NAME ", "x", "", "Álava norte"] {
            let once = title_case(s);
            assert_eq!(title_case(&once), once);
        }
    }
}
