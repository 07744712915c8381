//! Identifier normalization
//!
//! Turns human supplied names (`CreateUsers`, `userID`, `add-column email`)
//! into the lowercase, underscore delimited form used for migration names,
//! file names and generated SQL identifiers.

/// Convert an arbitrary identifier to `snake_case`.
///
/// Existing separators (anything that is not a letter or digit) split words,
/// letter and digit runs are split from each other, and a capital following a
/// lowercase letter starts a new word. Inside a run of capitals the last
/// capital starts the next word when a lowercase letter follows it, so
/// `JSONData` becomes `json_data` and `AAAbbb` becomes `aa_abbb`.
pub fn to_snake_case(raw: &str) -> String {
    let words: Vec<String> = split_words(raw);
    words.join("_").to_lowercase()
}

fn split_words(raw: &str) -> Vec<String> {
    let mut words = Vec::new();

    for segment in raw.split(|c: char| !c.is_alphanumeric()) {
        if segment.is_empty() {
            continue;
        }

        let chars: Vec<char> = segment.chars().collect();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && starts_word(chars[i - 1], c, chars.get(i + 1).copied()) {
                words.push(std::mem::take(&mut current));
            }
            current.push(c);
        }

        if !current.is_empty() {
            words.push(current);
        }
    }

    words
}

/// Whether `cur` begins a new word given its neighbours within one segment.
fn starts_word(prev: char, cur: char, next: Option<char>) -> bool {
    if prev.is_numeric() != cur.is_numeric() {
        return true;
    }
    if cur.is_numeric() || !cur.is_uppercase() {
        return false;
    }
    if !prev.is_uppercase() {
        return true;
    }
    // Last capital of an acronym run attaches to the following lowercase run
    matches!(next, Some(n) if n.is_alphabetic() && !n.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case_table() {
        let cases = [
            ("userID", "user_id"),
            ("JSONData", "json_data"),
            ("numbers2and55with000", "numbers_2_and_55_with_000"),
            ("AAAbbb", "aa_abbb"),
            ("CreateUsersTable", "create_users_table"),
            ("create table users", "create_table_users"),
            ("already_snake_case", "already_snake_case"),
            ("kebab-case-name", "kebab_case_name"),
            ("  padded  ", "padded"),
            ("ID", "id"),
            ("", ""),
        ];

        for (input, expected) in cases {
            assert_eq!(to_snake_case(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_separators_collapse() {
        assert_eq!(to_snake_case("add__email--to users"), "add_email_to_users");
        assert_eq!(to_snake_case("___"), "");
    }

    #[test]
    fn test_is_idempotent() {
        for input in ["userID", "JSONData", "numbers2and55with000", "AAAbbb"] {
            let once = to_snake_case(input);
            assert_eq!(to_snake_case(&once), once);
        }
    }

    #[test]
    fn test_non_ascii_letters() {
        assert_eq!(to_snake_case("ÜberTabelle"), "über_tabelle");
        assert_eq!(to_snake_case("表名2"), "表名_2");
    }
}
