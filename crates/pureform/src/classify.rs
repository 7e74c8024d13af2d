//! Classification and extraction.
//!
//! Detection runs an ordered list of rules over the callable's source text
//! and stops at the first match. Only ordinary functions are decomposed; the
//! other kinds are reported as [`Error::Unsupported`].
//!
//! Two extraction modes exist for ordinary functions:
//!
//! - [`ExtractionMode::Pattern`] (default): newlines are removed, parameters
//!   come from the first parenthesized group and the body from the first `{`
//!   to the last `}`. A `)` inside a parameter default, or a `{` before the
//!   body, corrupts the result; this is not detected.
//! - [`ExtractionMode::Syntax`]: the source is parsed with the script host's
//!   grammar. Newlines in the body survive and parse failures are reported
//!   as [`Error::Malformed`].

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::kind::SyntaxKind;
use pureform_script::{Callable, function_shape};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Anything with a recoverable source text.
pub trait SourceText {
    fn source_text(&self) -> &str;
}

impl SourceText for str {
    fn source_text(&self) -> &str {
        self
    }
}

impl SourceText for String {
    fn source_text(&self) -> &str {
        self
    }
}

impl SourceText for Callable {
    fn source_text(&self) -> &str {
        self.source()
    }
}

/// How ordinary functions are decomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    #[default]
    Pattern,
    Syntax,
}

/// A detection rule: the kind it assigns and the pattern that triggers it.
struct KindRule {
    kind: SyntaxKind,
    pattern: Regex,
}

static RULES: LazyLock<Vec<KindRule>> = LazyLock::new(|| {
    let rule = |kind, pattern: &str| KindRule {
        kind,
        pattern: Regex::new(pattern).expect("detection pattern is valid"),
    };
    // Same order as `SyntaxKind::ALL`.
    vec![
        rule(SyntaxKind::AsyncFunction, r"^\s*async\b"),
        rule(SyntaxKind::GeneratorFunction, r"^\s*function\s*\*"),
        rule(SyntaxKind::OrdinaryFunction, r"^\s*function\b"),
        rule(SyntaxKind::ContextBoundLambda, r"=>"),
    ]
});

static PARAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("parameter pattern is valid"));

static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(.*)\}").expect("body pattern is valid"));

/// Decides a callable's [`SyntaxKind`] and decomposes ordinary functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    mode: ExtractionMode,
}

impl Classifier {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// First matching detection rule, if any.
    pub fn detect(&self, source: &str) -> Option<SyntaxKind> {
        RULES
            .iter()
            .find(|rule| rule.pattern.is_match(source))
            .map(|rule| rule.kind)
    }

    /// Classify a callable (or raw source) and decompose it.
    pub fn classify<S: SourceText + ?Sized>(&self, callable: &S) -> Result<Descriptor> {
        let source = callable.source_text();
        let Some(kind) = self.detect(source) else {
            tracing::debug!("no detection rule matched");
            return Err(Error::Unrecognized);
        };

        match kind {
            SyntaxKind::OrdinaryFunction => {
                let descriptor = match self.mode {
                    ExtractionMode::Pattern => extract_by_pattern(source),
                    ExtractionMode::Syntax => extract_by_syntax(source)?,
                };
                tracing::debug!(
                    parameters = descriptor.parameters.len(),
                    mode = ?self.mode,
                    "extracted ordinary function"
                );
                Ok(descriptor)
            }
            SyntaxKind::GeneratorFunction => {
                tracing::debug!("generator functions are not parallelizable; refusing to extract");
                Err(Error::Unsupported(kind))
            }
            kind => {
                tracing::debug!(%kind, "recognized but not extractable");
                Err(Error::Unsupported(kind))
            }
        }
    }
}

fn extract_by_pattern(source: &str) -> Descriptor {
    let flat: String = source.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();

    let group = |re: &Regex| {
        re.captures(&flat)
            .and_then(|caps| caps.get(1))
            .map_or("", |m| m.as_str())
            .to_string()
    };
    let raw_params = group(&PARAMS);
    let body = group(&BODY);

    let parameters = raw_params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect::<Vec<_>>();

    Descriptor::ordinary(parameters, body)
}

fn extract_by_syntax(source: &str) -> Result<Descriptor> {
    let shape = function_shape(source).map_err(|err| Error::Malformed(err.to_string()))?;
    if shape.is_async || shape.is_generator || shape.is_arrow {
        return Err(Error::Malformed(
            "parsed function does not match its detected kind".into(),
        ));
    }
    Ok(Descriptor::ordinary(shape.params, shape.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(source: &str) -> Result<Descriptor> {
        Classifier::default().classify(source)
    }

    #[test]
    fn test_ordinary_function() {
        let d = classify("function add(a, b) { return a + b; }").unwrap();
        assert_eq!(d, Descriptor::ordinary(["a", "b"], " return a + b; "));
        insta::assert_json_snapshot!(d, @r#"
        {
          "kind": "ordinary_function",
          "parameters": [
            "a",
            "b"
          ],
          "body": " return a + b; "
        }
        "#);
    }

    #[test]
    fn test_no_parameters() {
        let d = classify("function () { return 1; }").unwrap();
        assert!(d.parameters.is_empty());
        assert_eq!(d.body, " return 1; ");
    }

    #[test]
    fn test_newlines_removed() {
        let d = classify("function f(\r\n  a,\n  b\n) {\n  const s = a + b;\n  return s;\n}").unwrap();
        assert_eq!(d.parameters, vec!["a", "b"]);
        assert_eq!(d.body, "  const s = a + b;  return s;");
    }

    #[test]
    fn test_body_spans_to_last_brace() {
        let d = classify("function f(o) { if (o) { return {x: 1}; } return {}; }").unwrap();
        assert_eq!(d.body, " if (o) { return {x: 1}; } return {}; ");
    }

    #[test]
    fn test_trailing_comma_dropped() {
        let d = classify("function f(a, b,) { }").unwrap();
        assert_eq!(d.parameters, vec!["a", "b"]);
    }

    #[test]
    fn test_unsupported_kinds() {
        let cases = [
            ("async function f() { return 1; }", SyntaxKind::AsyncFunction),
            ("async (x) => x", SyntaxKind::AsyncFunction),
            ("function* g() { yield 1; }", SyntaxKind::GeneratorFunction),
            ("function  *g() { yield 1; }", SyntaxKind::GeneratorFunction),
            ("(a, b) => a + b", SyntaxKind::ContextBoundLambda),
            ("x => { return x; }", SyntaxKind::ContextBoundLambda),
        ];
        for (source, kind) in cases {
            assert_eq!(classify(source), Err(Error::Unsupported(kind)), "{}", source);
        }
    }

    #[test]
    fn test_async_wins_over_ordinary() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.detect("async function f() {}"),
            Some(SyntaxKind::AsyncFunction)
        );
        assert_eq!(
            classifier.detect("async function* f() {}"),
            Some(SyntaxKind::AsyncFunction)
        );
    }

    #[test]
    fn test_ordinary_with_inner_arrow_is_ordinary() {
        let d = classify("function f(xs) { return xs.map(x => x * 2); }").unwrap();
        assert_eq!(d.parameters, vec!["xs"]);
    }

    #[test]
    fn test_word_boundaries() {
        let classifier = Classifier::default();
        assert_eq!(classifier.detect("functional()"), None);
        assert_eq!(classifier.detect("asyncTask()"), None);
        assert_eq!(classifier.detect("  \n function f() {}"), Some(SyntaxKind::OrdinaryFunction));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(classify("class A {}"), Err(Error::Unrecognized));
        assert_eq!(classify(""), Err(Error::Unrecognized));
    }

    #[test]
    fn test_pattern_mode_limitation_with_default_parens() {
        // `)` inside a default value ends the parameter list early.
        let d = classify("function f(a = g(1), b) { return a; }").unwrap();
        assert_eq!(d.parameters, vec!["a = g(1"]);
    }

    #[test]
    fn test_syntax_mode_keeps_newlines() {
        let classifier = Classifier::new(ExtractionMode::Syntax);
        let d = classifier
            .classify("function add(a, b) {\n  return a + b;\n}")
            .unwrap();
        assert_eq!(d.parameters, vec!["a", "b"]);
        assert_eq!(d.body, "\n  return a + b;\n");
    }

    #[test]
    fn test_syntax_mode_reports_malformed() {
        let classifier = Classifier::new(ExtractionMode::Syntax);
        assert!(matches!(
            classifier.classify("function f(a { return a; }"),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            classifier.classify("function f() {} function g() {}"),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_syntax_mode_keeps_priority() {
        let classifier = Classifier::new(ExtractionMode::Syntax);
        assert_eq!(
            classifier.classify("async function f() {}"),
            Err(Error::Unsupported(SyntaxKind::AsyncFunction))
        );
    }

    #[test]
    fn test_classify_callable() {
        let realm = pureform_script::Realm::default();
        let f = Callable::from_source(&realm, "function sq(x) { return x * x; }").unwrap();
        let d = Classifier::default().classify(&f).unwrap();
        assert_eq!(d, Descriptor::ordinary(["x"], " return x * x; "));
    }
}
