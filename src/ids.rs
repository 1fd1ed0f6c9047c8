use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Canonicalizes a user-supplied id, accepting any textual UUID form.
pub fn parse_id(raw: &str) -> Option<String> {
    Uuid::parse_str(raw.trim())
        .ok()
        .map(|id| id.hyphenated().to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{new_id, parse_id};

    #[test]
    fn generated_ids_are_unique_uuids() {
        let ids = (0..64).map(|_| new_id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 64);
        for id in &ids {
            assert_eq!(parse_id(id).as_deref(), Some(id.as_str()));
        }
    }

    #[test]
    fn parse_id_canonicalizes_simple_and_uppercase_forms() {
        assert_eq!(
            parse_id("33A5345CDAAD40C39A1F9EB7FC5B9325").as_deref(),
            Some("33a5345c-daad-40c3-9a1f-9eb7fc5b9325")
        );
        assert_eq!(parse_id("not-a-uuid"), None);
    }
}
