use crate::error::{PatternScanError, Result};
use crate::language::Language;
use crate::types::{CandidateKind, PatternCandidate};
use tree_sitter::{Node, Parser};

const COMPARISON_OPERATORS: &[&str] = &["<", ">", "<=", ">=", "==", "!=", "===", "!=="];
const LOGICAL_OPERATORS: &[&str] = &["&&", "||", "and", "or"];

/// Callee suffixes that compile a regular expression
const REGEX_CONSTRUCTORS: &[&str] = &[
    "Regex::new",
    "RegexBuilder::new",
    "RegexSet::new",
    "re.compile",
    "regex.compile",
    "RegExp",
    "regexp.MustCompile",
    "regexp.Compile",
];

/// Method names that do prefix/suffix/substring matching
const TEXT_MATCH_METHODS: &[&str] = &[
    "starts_with",
    "ends_with",
    "contains",
    "eq_ignore_ascii_case",
    "strip_prefix",
    "strip_suffix",
    "startswith",
    "endswith",
    "startsWith",
    "endsWith",
    "includes",
];

/// `strings` package functions that do prefix/suffix/substring matching
const GO_STRING_MATCH_FUNCS: &[&str] = &["HasPrefix", "HasSuffix", "Contains", "EqualFold"];

/// Syntax-tree pass of the pattern scanner.
///
/// Parsing is strict: a tree containing error nodes is rejected so the
/// caller can fall back to the line pass.
pub struct AstScanner {
    parser: Parser,
    language: Language,
}

impl AstScanner {
    /// Create new AST scanner for a language
    pub fn new(language: Language) -> Result<Self> {
        if !language.supports_ast() {
            return Err(PatternScanError::unsupported_language(language.as_str()));
        }

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| PatternScanError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser, language })
    }

    /// Parse `content` and collect every candidate shape in the tree
    pub fn scan(&mut self, content: &str, file_path: &str) -> Result<Vec<PatternCandidate>> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| PatternScanError::parse("Failed to parse source code"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(PatternScanError::parse(format!(
                "{file_path} is not valid {}",
                self.language.as_str()
            )));
        }

        let lines: Vec<&str> = content.lines().collect();
        let mut candidates = Vec::new();

        walk_tree(root, |node| {
            if let Some(candidate) = self.inspect(content, &lines, file_path, node) {
                candidates.push(candidate);
            }
        });

        Ok(candidates)
    }

    fn inspect(
        &self,
        content: &str,
        lines: &[&str],
        file_path: &str,
        node: Node,
    ) -> Option<PatternCandidate> {
        let (kind, rationale) = match node.kind() {
            "binary_expression" | "comparison_operator" => {
                let literal = self.numeric_comparison(content, node)?;
                (
                    CandidateKind::MagicNumber,
                    format!("Comparison with hardcoded threshold: {literal}"),
                )
            }
            "call_expression" | "call" | "new_expression" => self.classify_call(content, node)?,
            "if_expression" | "if_statement" | "elif_clause" => {
                let condition = node.child_by_field_name("condition")?;
                let combinators = count_logical_operators(condition);
                if combinators < 2 {
                    return None;
                }
                (
                    CandidateKind::ComplexConditional,
                    format!(
                        "Complex conditional with {combinators} boolean operators (may encode business rules)"
                    ),
                )
            }
            _ => return None,
        };

        let row = node.start_position().row;
        Some(PatternCandidate {
            file_path: file_path.to_string(),
            line: row + 1,
            line_content: lines.get(row).copied().unwrap_or_default().to_string(),
            kind,
            rationale,
        })
    }

    /// Returns the literal text when `node` compares against a number
    fn numeric_comparison<'a>(&self, content: &'a str, node: Node) -> Option<&'a str> {
        let operator = operator_token(node)?;
        if !COMPARISON_OPERATORS.contains(&operator) {
            return None;
        }

        let mut cursor = node.walk();
        let literal = node
            .named_children(&mut cursor)
            .find(|child| self.is_numeric_literal(*child))?;
        Some(node_text(content, literal))
    }

    fn is_numeric_literal(&self, node: Node) -> bool {
        match self.language {
            Language::Rust => matches!(node.kind(), "integer_literal" | "float_literal"),
            Language::Python => matches!(node.kind(), "integer" | "float"),
            Language::JavaScript | Language::TypeScript | Language::Tsx => node.kind() == "number",
            Language::Go => matches!(node.kind(), "int_literal" | "float_literal"),
            _ => false,
        }
    }

    fn classify_call(&self, content: &str, node: Node) -> Option<(CandidateKind, String)> {
        let callee = node
            .child_by_field_name("function")
            .or_else(|| node.child_by_field_name("constructor"))?;
        let callee_text = node_text(content, callee);

        if REGEX_CONSTRUCTORS.iter().any(|ctor| {
            callee_text == *ctor
                || callee_text.ends_with(&format!("::{ctor}"))
                || callee_text.ends_with(&format!(".{ctor}"))
        }) {
            return Some((
                CandidateKind::RegexParsing,
                format!("Regex pattern compiled via {callee_text} (may encode semantic parsing logic)"),
            ));
        }

        if !matches!(
            callee.kind(),
            "field_expression" | "attribute" | "member_expression" | "selector_expression"
        ) {
            return None;
        }

        let mut cursor = callee.walk();
        let method = callee.named_children(&mut cursor).last()?;
        let method_name = node_text(content, method);
        let text_match = match self.language {
            // only the standard library helpers, not methods of the same name
            Language::Go => {
                callee
                    .child_by_field_name("operand")
                    .is_some_and(|operand| node_text(content, operand) == "strings")
                    && GO_STRING_MATCH_FUNCS.contains(&method_name)
            }
            _ => TEXT_MATCH_METHODS.contains(&method_name),
        };
        if text_match {
            return Some((
                CandidateKind::StringMatching,
                format!("String matching using {method_name} (may encode classification)"),
            ));
        }

        None
    }
}

/// Count `&&`/`||`/`and`/`or` nodes anywhere under `expr`
pub(crate) fn count_logical_operators(expr: Node) -> usize {
    let mut count = 0;
    walk_tree(expr, |node| {
        if matches!(node.kind(), "binary_expression" | "boolean_operator")
            && operator_token(node).is_some_and(|op| LOGICAL_OPERATORS.contains(&op))
        {
            count += 1;
        }
    });
    count
}

/// The first anonymous child that is an operator token
fn operator_token(node: Node) -> Option<&'static str> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .filter(|child| !child.is_named())
        .map(|child| child.kind())
        .find(|kind| COMPARISON_OPERATORS.contains(kind) || LOGICAL_OPERATORS.contains(kind));
    found
}

fn node_text<'a>(content: &'a str, node: Node) -> &'a str {
    &content[node.start_byte()..node.end_byte()]
}

/// Pre-order walk over `root` and all of its descendants
fn walk_tree<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());

        if cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.node() == root {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}
