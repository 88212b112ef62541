//! Selector parsing (§4.5, §6): every user-supplied string resolves
//! deterministically to one `Selector` variant and one query string.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    /// First-match-wins parse of the shortcut table in §4.5.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("t:").or_else(|| raw.strip_prefix("tag:")) {
            return Selector::Css(rest.to_string());
        }
        if let Some(rest) = raw.strip_prefix("text:").or_else(|| raw.strip_prefix("tx:")) {
            return Selector::XPath(format!("//*[contains(text(),{})]", xpath_literal(rest)));
        }
        if let Some(rest) = raw.strip_prefix("text=") {
            return Selector::XPath(format!("//*[text()={}]", xpath_literal(rest)));
        }
        if let Some(rest) = raw.strip_prefix("x:").or_else(|| raw.strip_prefix("xpath:")) {
            return Selector::XPath(rest.to_string());
        }
        if let Some(rest) = raw.strip_prefix('@') {
            return match rest.split_once('=') {
                Some((attr, value)) => Selector::Css(format!("[{attr}=\"{}\"]", css_escape(value))),
                None => Selector::Css(format!("[{rest}]")),
            };
        }
        if raw.starts_with('/') || raw.starts_with('(') {
            return Selector::XPath(raw.to_string());
        }
        Selector::Css(raw.to_string())
    }

    pub fn query(&self) -> &str {
        match self {
            Selector::Css(q) | Selector::XPath(q) => q,
        }
    }
}

/// Escapes a value for embedding inside a double-quoted CSS attribute
/// selector; the parser generates the string at construction time rather
/// than via runtime concatenation to close off injection points.
fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// XPath has no escape character for quotes; when a literal contains both
/// quote kinds, build a `concat()` call instead.
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{value}\"")
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        let parts: Vec<String> = value
            .split('"')
            .map(|part| format!("\"{part}\""))
            .collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// User-visible wait states for selector waits (§6), distinct from the
/// navigation wait-state vocabulary used by `Page::goto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Attached,
    Detached,
    Visible,
    Hidden,
}

impl WaitState {
    pub fn as_str(self) -> &'static str {
        match self {
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
        }
    }
}

impl std::fmt::Display for WaitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_match_the_table() {
        assert_eq!(Selector::parse("#q"), Selector::Css("#q".into()));
        assert_eq!(Selector::parse(".go"), Selector::Css(".go".into()));
        assert_eq!(Selector::parse("t:input"), Selector::Css("input".into()));
        assert_eq!(
            Selector::parse("@name=email"),
            Selector::Css("[name=\"email\"]".into())
        );
        assert_eq!(Selector::parse("@placeholder"), Selector::Css("[placeholder]".into()));
        assert!(matches!(Selector::parse("x:/html"), Selector::XPath(_)));
        assert!(matches!(Selector::parse("/html/body"), Selector::XPath(_)));
        assert_eq!(Selector::parse("div.card"), Selector::Css("div.card".into()));
    }

    #[test]
    fn same_string_parses_to_the_same_pair_every_time() {
        for raw in ["#q", "@name=email", "text:Go", "/html", "plain"] {
            assert_eq!(Selector::parse(raw), Selector::parse(raw));
        }
    }
}
