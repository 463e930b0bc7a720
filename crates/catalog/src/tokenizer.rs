use serde::{Deserialize, Serialize};

/// Token classification: maximal runs of `_`/`:` are separators, maximal
/// runs of anything else are parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Separator,
    Part,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Characters that delimit the parts of a metric name.
pub fn is_separator(c: char) -> bool {
    matches!(c, '_' | ':')
}

/// Split a metric name into alternating separator and part tokens.
///
/// Concatenating the token texts in order reconstructs the input exactly.
/// An empty input yields no tokens; a name with no separators yields a
/// single part token.
pub fn tokenize(name: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<TokenKind> = None;

    for (i, c) in name.char_indices() {
        let kind = if is_separator(c) {
            TokenKind::Separator
        } else {
            TokenKind::Part
        };
        match current {
            Some(k) if k == kind => {}
            Some(k) => {
                tokens.push(Token {
                    kind: k,
                    text: name[start..i].to_string(),
                });
                start = i;
                current = Some(kind);
            }
            None => current = Some(kind),
        }
    }
    if let Some(k) = current {
        tokens.push(Token {
            kind: k,
            text: name[start..].to_string(),
        });
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn empty_name_yields_no_tokens() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn name_without_separator_is_one_part() {
        let tokens = tokenize("up");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Part);
        assert_eq!(tokens[0].text, "up");
    }

    #[test]
    fn separator_runs_are_single_tokens() {
        let tokens = tokenize("node__cpu:seconds");
        assert_eq!(texts(&tokens), vec!["node", "__", "cpu", ":", "seconds"]);
        assert_eq!(tokens[1].kind, TokenKind::Separator);
        assert_eq!(tokens[3].kind, TokenKind::Separator);
    }

    #[test]
    fn leading_and_trailing_separators() {
        let tokens = tokenize("_up_");
        assert_eq!(texts(&tokens), vec!["_", "up", "_"]);
        assert_eq!(tokens[0].kind, TokenKind::Separator);
        assert_eq!(tokens[2].kind, TokenKind::Separator);
    }

    #[test]
    fn concatenation_reconstructs_input() {
        for name in ["grafana_http_requests_total", "job:rate5m", "_:_", "héllo_wörld", "a"] {
            let rebuilt: String = tokenize(name).iter().map(|t| t.text.as_str()).collect();
            assert_eq!(rebuilt, name);
        }
    }
}
