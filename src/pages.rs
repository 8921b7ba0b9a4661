//! Embedded front-end assets.

pub const INDEX_HTML: &str = include_str!("../static/index.html");
pub const SCRIPT_JS: &str = include_str!("../static/script.js");

const HAS_API_KEY_PLACEHOLDER: &str = "{{HAS_API_KEY}}";

/// The client uses the flag to decide whether to ask for a key before sending images.
pub fn render_index(has_api_key: bool) -> String {
    INDEX_HTML.replace(HAS_API_KEY_PLACEHOLDER, if has_api_key { "true" } else { "false" })
}

#[cfg(test)]
mod pages_tests {
    use super::render_index;

    #[test]
    fn test_render_index_sets_flag() {
        assert!(render_index(true).contains("data-has-api-key=\"true\""));
        assert!(render_index(false).contains("data-has-api-key=\"false\""));
        assert!(!render_index(false).contains("{{HAS_API_KEY}}"));
    }
}
