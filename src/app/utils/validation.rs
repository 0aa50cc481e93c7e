use regex::Regex;
use std::sync::LazyLock;

/// Letters, digits and `_ . -`, starting with a letter, 3 to 150 characters.
pub static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.-]{2,149}$").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_valid_regex() {
        let valid_usernames = ["alice", "User-Name", "bob_myers", "j.doe", "abc"];

        for username in valid_usernames.iter() {
            assert!(
                USERNAME_REGEX.is_match(username),
                "Expected valid: {}",
                username
            );
        }
    }

    #[test]
    fn test_username_invalid_regex() {
        let invalid_usernames = ["ab", "1alice", "_alice", "alice smith", "al!ce", ""];

        for username in invalid_usernames.iter() {
            assert!(
                !USERNAME_REGEX.is_match(username),
                "Expected invalid: {}",
                username
            );
        }
    }
}
