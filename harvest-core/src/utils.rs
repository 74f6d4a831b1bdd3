//! Shared string helpers.

use std::fmt::Write;

/// The unqualified name of `T`, without module path or generic arguments.
///
/// `harvester_attributes::config::CollectTypesWithAttributesConfig` becomes
/// `CollectTypesWithAttributesConfig`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Strip `suffix` from the end of `name`, leaving it untouched when absent.
pub fn strip_type_suffix<'a>(name: &'a str, suffix: &str) -> &'a str {
    name.strip_suffix(suffix)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
}

/// Escape a value for use inside a double-quoted Rust string literal.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_literal`]. Returns `None` on a malformed escape.
pub fn unescape_literal(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let mut hex = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        h => hex.push(h),
                    }
                }
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FooConfig;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<FooConfig>(), "FooConfig");
        assert_eq!(short_type_name::<Vec<FooConfig>>(), "Vec");
    }

    #[test]
    fn test_strip_type_suffix() {
        assert_eq!(strip_type_suffix("FooConfig", "Config"), "Foo");
        assert_eq!(strip_type_suffix("Foo", "Config"), "Foo");
        assert_eq!(strip_type_suffix("Config", "Config"), "Config");
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_literal("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_literal("\u{7}"), "\\u{7}");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        for value in ["plain", "q\"uote", "back\\slash", "tab\tnew\nline", "\u{1b}[0m"] {
            assert_eq!(unescape_literal(&escape_literal(value)).as_deref(), Some(value));
        }
    }

    #[test]
    fn test_unescape_rejects_malformed() {
        assert_eq!(unescape_literal("dangling\\"), None);
        assert_eq!(unescape_literal("\\q"), None);
        assert_eq!(unescape_literal("\\u{zz}"), None);
    }
}
