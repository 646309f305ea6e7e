//! Typed parsing of structured model output.
//!
//! Models asked for "a list of module titles" return anything from clean JSON
//! to a chatty paragraph with a bulleted list in the middle. This stage turns
//! that free text into a typed result, decoupled from generation so it can be
//! tested on its own and so planning nodes get a real parse failure instead
//! of silently mangled data.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Failure to recover a title list from model output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing list-shaped in the text.
    #[error("no list found in model output")]
    NoList,
    /// A list was found but held no usable titles.
    #[error("list contained no usable titles")]
    Empty,
}

fn bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("static regex"))
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["']([^"']+)["']"#).expect("static regex"))
}

fn line_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*]|\d+[.)])\s+(.+)$").expect("static regex"))
}

/// Parse a list of module titles from model output.
///
/// Tries, in order: a bracketed JSON list, quoted items inside a bracketed
/// span, then bulleted/numbered line items.
///
/// # Errors
///
/// [`ParseError::NoList`] when nothing list-shaped is present;
/// [`ParseError::Empty`] when a list is found but yields no titles.
pub fn parse_title_list(text: &str) -> Result<Vec<String>, ParseError> {
    if let Some(found) = bracket_re().find(text) {
        let raw = found.as_str();

        if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
            return ensure_titles(items);
        }

        let quoted: Vec<String> = quoted_re()
            .captures_iter(raw)
            .map(|cap| cap[1].trim().to_string())
            .collect();
        if !quoted.is_empty() {
            return ensure_titles(quoted);
        }

        return Err(ParseError::Empty);
    }

    let lines: Vec<String> = text
        .lines()
        .filter_map(|line| line_item_re().captures(line))
        .map(|cap| cap[1].trim().to_string())
        .collect();
    if !lines.is_empty() {
        return ensure_titles(lines);
    }

    Err(ParseError::NoList)
}

fn ensure_titles(items: Vec<String>) -> Result<Vec<String>, ParseError> {
    let titles: Vec<String> = items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if titles.is_empty() {
        Err(ParseError::Empty)
    } else {
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_clean_json_list() {
        let titles = parse_title_list(r#"["Intro", "Ownership", "Traits"]"#).unwrap();
        assert_eq!(titles, vec!["Intro", "Ownership", "Traits"]);
    }

    #[test]
    fn test_list_embedded_in_prose() {
        let text = "Here are the modules you asked for:\n[\"Getting Started\", \"Advanced Topics\"]\nLet me know!";
        let titles = parse_title_list(text).unwrap();
        assert_eq!(titles, vec!["Getting Started", "Advanced Topics"]);
    }

    #[test]
    fn test_single_quoted_list() {
        let titles = parse_title_list("['Intro', 'Module 2', 'Wrap-up']").unwrap();
        assert_eq!(titles, vec!["Intro", "Module 2", "Wrap-up"]);
    }

    #[test]
    fn test_multiline_bracketed_list() {
        let text = "[\n  \"One\",\n  \"Two\"\n]";
        assert_eq!(parse_title_list(text).unwrap(), vec!["One", "Two"]);
    }

    #[rstest]
    #[case("- Intro\n- Ownership\n- Traits")]
    #[case("* Intro\n* Ownership\n* Traits")]
    #[case("1. Intro\n2. Ownership\n3) Traits")]
    fn test_line_items(#[case] text: &str) {
        assert_eq!(
            parse_title_list(text).unwrap(),
            vec!["Intro", "Ownership", "Traits"]
        );
    }

    #[test]
    fn test_no_list() {
        let err = parse_title_list("I cannot produce a list right now.").unwrap_err();
        assert_eq!(err, ParseError::NoList);
    }

    #[test]
    fn test_empty_brackets() {
        let err = parse_title_list("[]").unwrap_err();
        assert_eq!(err, ParseError::Empty);
    }

    #[test]
    fn test_whitespace_only_items_dropped() {
        let err = parse_title_list(r#"["  ", ""]"#).unwrap_err();
        assert_eq!(err, ParseError::Empty);
    }
}
