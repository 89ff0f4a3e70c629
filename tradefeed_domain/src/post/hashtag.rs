use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("compile hashtag regex"));

/// Hashtags in order of appearance, `#` stripped and case preserved.
/// Repeated tags are returned as many times as they occur.
pub fn extract_hashtags(body: &str) -> Vec<String> {
    HASHTAG_REGEX
        .captures_iter(body)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Keep the first occurrence of every tag.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().unique().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tags_in_order() {
        assert_eq!(
            vec!["BTC", "ETH"],
            extract_hashtags("Watching #BTC and #ETH today")
        );
    }

    #[test]
    fn only_word_characters_belong_to_a_tag() {
        assert_eq!(
            vec!["gold_2024", "XAU"],
            extract_hashtags("#gold_2024! (#XAU) # nothing #-dash")
        );
        assert!(extract_hashtags("no tags here").is_empty());
    }

    #[test]
    fn repeated_tags_are_kept_unless_deduplicated() {
        let tags = extract_hashtags("#BTC up, #ETH flat, #BTC again, #btc lowercase");
        assert_eq!(vec!["BTC", "ETH", "BTC", "btc"], tags);
        assert_eq!(vec!["BTC", "ETH", "btc"], dedup_tags(tags));
    }
}
