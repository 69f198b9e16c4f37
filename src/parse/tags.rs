use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

/// `#tag` at the start of the text or after whitespace. Tag names stop at
/// whitespace or another `#`.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#([^\s#]+)").expect("tag pattern is valid"));

/// Extract the tags in `text` (without `#`), in first-occurrence order.
pub fn scan_tags(text: &str) -> IndexSet<String> {
    TAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Text with ` #tag` appended, unless the tag is already present.
pub fn append_tag(text: &str, tag: &str) -> String {
    let tag = tag.trim_start_matches('#');
    if tag.is_empty() || scan_tags(text).contains(tag) {
        return text.to_string();
    }
    if text.is_empty() || text.ends_with(char::is_whitespace) {
        format!("{}#{}", text, tag)
    } else {
        format!("{} #{}", text, tag)
    }
}

/// Text with every `#tag` token removed (along with the space before it).
pub fn strip_tag(text: &str, tag: &str) -> String {
    let tag = tag.trim_start_matches('#');
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in TAG_RE.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if name.as_str() != tag {
            continue;
        }
        out.push_str(&text[last..whole.start()]);
        last = whole.end();
        // A tag at the very start has no leading space to eat; drop the one after it
        if whole.start() == 0 && text[last..].starts_with(' ') {
            last += 1;
        }
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<String> {
        scan_tags(text).into_iter().collect()
    }

    #[test]
    fn scan_finds_tags_anywhere() {
        assert_eq!(tags("#todo write report #work"), vec!["todo", "work"]);
        assert_eq!(tags("call\t#phone"), vec!["phone"]);
    }

    #[test]
    fn scan_requires_word_boundary() {
        assert!(tags("C# and a#b").is_empty());
        assert!(tags("lonely # sign").is_empty());
    }

    #[test]
    fn scan_dedups_and_splits_on_hash() {
        assert_eq!(tags("#a #b #a"), vec!["a", "b"]);
        assert_eq!(tags("#a#b"), vec!["a"]);
    }

    #[test]
    fn append_tag_adds_once() {
        assert_eq!(append_tag("buy milk", "todo"), "buy milk #todo");
        assert_eq!(append_tag("buy milk #todo", "todo"), "buy milk #todo");
        assert_eq!(append_tag("", "#todo"), "#todo");
    }

    #[test]
    fn strip_tag_removes_token_and_space() {
        assert_eq!(strip_tag("buy milk #todo", "todo"), "buy milk");
        assert_eq!(strip_tag("#todo buy milk", "todo"), "buy milk");
        assert_eq!(strip_tag("a #todo b #todo", "todo"), "a b");
        assert_eq!(strip_tag("a #todos", "todo"), "a #todos");
    }
}
