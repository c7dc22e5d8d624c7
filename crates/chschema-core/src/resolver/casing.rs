//! Identifier case conversion

use heck::{ToLowerCamelCase, ToUpperCamelCase};

/// `user_events` → `UserEvents`
///
/// A leading digit gets a `_` prefix so the result stays a valid identifier.
pub fn to_pascal_case(ident: &str) -> String {
    let pascal = ident.to_upper_camel_case();
    if pascal.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{pascal}")
    } else {
        pascal
    }
}

/// `user_id` → `userId`
pub fn to_camel_case(ident: &str) -> String {
    ident.to_lower_camel_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("events"), "Events");
        assert_eq!(to_pascal_case("user_events"), "UserEvents");
        assert_eq!(to_pascal_case("daily-stats.v2"), "DailyStatsV2");
        assert_eq!(to_pascal_case("mvDaily"), "MvDaily");
        assert_eq!(to_pascal_case("2024_events"), "_2024Events");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("user_id"), "userId");
        assert_eq!(to_camel_case("UserId"), "userId");
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("event_ts_utc"), "eventTsUtc");
    }
}
