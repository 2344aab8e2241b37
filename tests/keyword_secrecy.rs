use std::fs;
use std::path::Path;

use meadow_core::keywords::{self, SECRET_KEYWORDS};

const KEYWORD_VIEWS: &[&str] = &["search.rs", "keyword_sections.rs"];

#[test]
fn page_copy_does_not_mention_secret_keywords() {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut checked = 0;
    for entry in fs::read_dir(&src).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if !name.ends_with(".rs") || KEYWORD_VIEWS.contains(&name.as_str()) {
            continue;
        }
        let source = fs::read_to_string(&path).unwrap();
        let leaks = keywords::find_leaks(&source);
        assert!(leaks.is_empty(), "{name} mentions {leaks:?}");
        checked += 1;
    }
    assert!(checked > 0, "no page sources under {}", src.display());
}

#[test]
fn every_keyword_resolves_case_insensitively() {
    assert!(!SECRET_KEYWORDS.is_empty());
    for keyword in SECRET_KEYWORDS {
        let shouted = format!("  {}  ", keyword.key.to_uppercase());
        assert_eq!(keywords::lookup(&shouted), Some(keyword));
        assert!(!keyword.content_html.trim().is_empty());
    }
}
