//! Placeholder substitution for email templates.
//!
//! Two token forms are recognised: `{{name}}`, written by the template editor,
//! and `{name}`, used by older relay templates. Both resolve against the same
//! variable map. A name is one or more ASCII alphanumerics, `_`, `.` or `-`.
//!
//! Unknown tokens are left exactly as written and no escaping is applied, so
//! values are inserted into HTML bodies verbatim.
//!
//! ```
//! use std::collections::HashMap;
//! use binder_core::template::render;
//!
//! let vars = HashMap::from([("customerName".to_owned(), "Ash".to_owned())]);
//! assert_eq!(
//!     render("Hi {{customerName}}, order {orderId} is on its way", &vars),
//!     "Hi Ash, order {orderId} is on its way"
//! );
//! ```

use std::collections::HashMap;

/// A piece of a scanned template.
enum Segment<'a> {
    Text(&'a str),
    Token { name: &'a str, raw: &'a str },
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
}

/// Try to read a token at the start of `tail` (which begins with `{`).
///
/// Returns the placeholder name and the token's byte length.
fn token_at(tail: &str) -> Option<(&str, usize)> {
    if let Some(inner) = tail.strip_prefix("{{")
        && let Some((name, _)) = inner.split_once("}}")
        && is_name(name)
    {
        return Some((name, name.len() + 4));
    }

    let inner = tail.strip_prefix('{')?;
    let (name, _) = inner.split_once('}')?;
    is_name(name).then_some((name, name.len() + 2))
}

fn scan<'a>(template: &'a str, mut visit: impl FnMut(Segment<'a>)) {
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let (text, tail) = rest.split_at(start);
        if !text.is_empty() {
            visit(Segment::Text(text));
        }
        if let Some((name, len)) = token_at(tail) {
            let (raw, after) = tail.split_at(len);
            visit(Segment::Token { name, raw });
            rest = after;
        } else {
            let (brace, after) = tail.split_at(1);
            visit(Segment::Text(brace));
            rest = after;
        }
    }
    if !rest.is_empty() {
        visit(Segment::Text(rest));
    }
}

/// Substitute `{{name}}` and `{name}` tokens with values from `variables`.
#[must_use]
pub fn render<S: std::hash::BuildHasher>(
    template: &str,
    variables: &HashMap<String, String, S>,
) -> String {
    let mut out = String::with_capacity(template.len());
    scan(template, |segment| match segment {
        Segment::Text(text) => out.push_str(text),
        Segment::Token { name, raw } => {
            out.push_str(variables.get(name).map_or(raw, String::as_str));
        }
    });
    out
}

/// Distinct placeholder names in order of first appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    scan(template, |segment| {
        if let Segment::Token { name, .. } = segment
            && !names.iter().any(|n| n == name)
        {
            names.push(name.to_owned());
        }
    });
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_both_brace_forms() {
        let v = vars(&[("name", "Misty"), ("total", "$12.00")]);
        assert_eq!(render("{{name}} paid {total}", &v), "Misty paid $12.00");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let v = vars(&[("x", "1")]);
        assert_eq!(render("{{x}}-{x}-{{x}}", &v), "1-1-1");
    }

    #[test]
    fn test_unresolved_left_verbatim() {
        let v = vars(&[("known", "yes")]);
        assert_eq!(
            render("{{unknown}} {unknown} {{known}}", &v),
            "{{unknown}} {unknown} yes"
        );
    }

    #[test]
    fn test_empty_variables_is_identity() {
        let samples = [
            "",
            "plain text",
            "{{a}} and {b}",
            "css { color: red; }",
            "{{ spaced }} {}",
            "{{{triple}}}",
            "unterminated {{name",
            "ünïcödé {{ñ}} {x}",
        ];
        for s in samples {
            assert_eq!(render(s, &HashMap::new()), s);
        }
    }

    #[test]
    fn test_non_name_braces_untouched() {
        let v = vars(&[("a", "A")]);
        assert_eq!(
            render("body { margin: 0 } {{a}}", &v),
            "body { margin: 0 } A"
        );
    }

    #[test]
    fn test_unbalanced_double_brace_falls_back_to_single() {
        let v = vars(&[("a", "A")]);
        assert_eq!(render("{{a}", &v), "{A");
    }

    #[test]
    fn test_no_escaping() {
        let v = vars(&[("name", "<b>Ash</b>")]);
        assert_eq!(render("<p>{{name}}</p>", &v), "<p><b>Ash</b></p>");
    }

    #[test]
    fn test_dotted_and_dashed_names() {
        let v = vars(&[("order.id", "ORD-1"), ("ship-to", "Pallet Town")]);
        assert_eq!(render("{{order.id}} -> {ship-to}", &v), "ORD-1 -> Pallet Town");
    }

    #[test]
    fn test_placeholders_distinct_in_order() {
        assert_eq!(
            placeholders("{{b}} {a} {{b}} {{c}} {not a name}"),
            vec!["b".to_owned(), "a".to_owned(), "c".to_owned()]
        );
    }
}
