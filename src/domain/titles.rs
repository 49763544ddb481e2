use sha2::{Digest, Sha256};

/// Lowercased, whitespace-collapsed form used for every title comparison.
pub fn normalize_title(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Stored next to each question so history lookups compare hashes, not raw text.
pub fn title_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(normalize_title(text).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_case_and_whitespace() {
        assert_eq!(
            normalize_title("  How   heavy was\tyour WORKLOAD today? "),
            "how heavy was your workload today?"
        );
        assert_eq!(normalize_title("Як ти  сьогодні?"), "як ти сьогодні?");
    }

    #[test]
    fn test_hash_matches_for_equivalent_titles() {
        assert_eq!(title_hash("Meetings ate my day"), title_hash("meetings  ate my DAY"));
        assert_ne!(title_hash("Meetings ate my day"), title_hash("Meetings ate my week"));
        assert_eq!(title_hash("x").len(), 64);
    }
}
