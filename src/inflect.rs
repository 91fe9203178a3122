//! Naming helpers for namespaces and response roots.

use convert_case::{Boundary, Case, Casing};

/// Words that are the same in singular and plural
const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "feedback",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

/// Irregular plural -> singular pairs
const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("men", "man"),
    ("mice", "mouse"),
    ("people", "person"),
    ("teeth", "tooth"),
    ("women", "woman"),
];

/// Convert an identifier to lowercase snake_case (`BlogPost` -> `blog_post`)
///
/// Words only start at an uppercase letter, so digits stay attached to the
/// word before them (`S3Bucket` -> `s3_bucket`, `Item2` -> `item2`).
pub fn snake_case(name: &str) -> String {
    name.remove_boundaries(&[
        Boundary::LowerDigit,
        Boundary::UpperDigit,
        Boundary::DigitLower,
    ])
    .to_case(Case::Snake)
}

/// Last component of a Rust type path (`app::models::User` -> `User`)
pub fn type_basename(path: &str) -> &str {
    let without_generics = path.split('<').next().unwrap_or(path);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Best-effort English singular of a plural key (`users` -> `user`)
///
/// Dotted keys are singularized on their last segment only.
pub fn singular(word: &str) -> String {
    if let Some((prefix, last)) = word.rsplit_once('.') {
        return format!("{}.{}", prefix, singular(last));
    }

    let lower = word.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    if let Some((_, single)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return match_case(word, single);
    }

    if lower.ends_with("ies") && lower.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }

    let stem_len = if lower.ends_with("sses")
        || lower.ends_with("xes")
        || lower.ends_with("ches")
        || lower.ends_with("shes")
        || lower.ends_with("zzes")
    {
        word.len() - 2
    } else if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        word.len()
    } else if lower.ends_with('s') && lower.len() > 1 {
        word.len() - 1
    } else {
        word.len()
    };

    word[..stem_len].to_string()
}

/// Apply the capitalisation of `original` to a lowercase replacement
fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().all(|c| !c.is_lowercase()) {
        return replacement.to_uppercase();
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = replacement.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    replacement.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("BlogPost"), "blog_post");
        assert_eq!(snake_case("blogPosts"), "blog_posts");
        assert_eq!(snake_case("users"), "users");
    }

    #[test]
    fn test_snake_case_keeps_digits_with_their_word() {
        assert_eq!(snake_case("S3Bucket"), "s3_bucket");
        assert_eq!(snake_case("Oauth2Client"), "oauth2_client");
        assert_eq!(snake_case("Item2"), "item2");
        assert_eq!(snake_case("v2Users"), "v2_users");
    }

    #[test]
    fn test_type_basename() {
        assert_eq!(type_basename("app::models::BlogPost"), "BlogPost");
        assert_eq!(type_basename("User"), "User");
        assert_eq!(type_basename("app::Wrapper<app::Inner>"), "Wrapper");
    }

    #[test]
    fn test_singular_regular_words() {
        assert_eq!(singular("users"), "user");
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("addresses"), "address");
        assert_eq!(singular("boxes"), "box");
        assert_eq!(singular("matches"), "match");
        assert_eq!(singular("status"), "status");
        assert_eq!(singular("user"), "user");
    }

    #[test]
    fn test_singular_irregular_and_uncountable() {
        assert_eq!(singular("people"), "person");
        assert_eq!(singular("People"), "Person");
        assert_eq!(singular("data"), "data");
        assert_eq!(singular("news"), "news");
    }

    #[test]
    fn test_singular_dotted_key() {
        assert_eq!(singular("data.users"), "data.user");
        assert_eq!(singular("payload.people"), "payload.person");
    }
}
