pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_text(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => fallback.to_string(),
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

pub fn looks_like_email(raw: &str) -> bool {
    match raw.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{looks_like_email, non_empty, normalize_email, normalize_text};

    #[test]
    fn blank_text_falls_back() {
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(" Lab 3 "), Some("Lab 3".to_string()));
        assert_eq!(normalize_text(Some("  "), "User"), "User");
        assert_eq!(normalize_text(None, "User"), "User");
        assert_eq!(normalize_text(Some(" Admin "), "User"), "Admin");
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
        assert!(looks_like_email("alice@example.com"));
        assert!(!looks_like_email("alice.example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@b@c"));
    }
}
