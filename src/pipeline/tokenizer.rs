//! Question number tokenization.

use regex::Regex;

/// A question number and the raw body that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'t> {
    /// Digits of the number marker
    pub number: &'t str,
    /// Trimmed text up to the next marker or the end of the block
    pub body: &'t str,
}

impl Token<'_> {
    /// A marker with nothing after it (the question continues past the block).
    pub fn is_incomplete(&self) -> bool {
        self.body.is_empty()
    }
}

/// Result of tokenizing one block body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens<'t> {
    /// Trimmed text before the first marker
    pub leading: &'t str,
    /// Number/body pairs in encounter order
    pub tokens: Vec<Token<'t>>,
}

/// Splits text on question number markers (`<digits>.` followed by whitespace).
#[derive(Debug, Clone)]
pub struct Tokenizer {
    marker: Regex,
}

impl Tokenizer {
    /// Create a tokenizer.
    pub fn new() -> Self {
        Self {
            marker: Regex::new(r"(\d+)\.\s").expect("valid question marker pattern"),
        }
    }

    /// Split `text` into number/body pairs.
    pub fn tokenize<'t>(&self, text: &'t str) -> Tokens<'t> {
        let markers: Vec<(usize, usize, &'t str)> = self
            .marker
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some((whole.start(), whole.end(), caps.get(1)?.as_str()))
            })
            .collect();

        let Some(&(first_start, _, _)) = markers.first() else {
            return Tokens {
                leading: text.trim(),
                tokens: Vec::new(),
            };
        };

        let tokens = markers
            .iter()
            .enumerate()
            .map(|(i, &(_, end, number))| {
                let next = markers.get(i + 1).map_or(text.len(), |m| m.0);
                Token {
                    number,
                    body: text[end..next].trim(),
                }
            })
            .collect();

        Tokens {
            leading: text[..first_start].trim(),
            tokens,
        }
    }

    /// Body of a form-row block whose number is already known.
    ///
    /// Strips a leading `<number>.` marker; text without one is returned trimmed.
    pub fn row_body<'t>(&self, content: &'t str, number: &str) -> &'t str {
        let content = content.trim();
        content
            .strip_prefix(number)
            .and_then(|rest| rest.strip_prefix('.'))
            .map_or(content, str::trim)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_single() {
        let tokenizer = Tokenizer::new();
        let result = tokenizer.tokenize("1. 這是題目內容(2)\n");

        assert_eq!(result.leading, "");
        assert_eq!(
            result.tokens,
            vec![Token {
                number: "1",
                body: "這是題目內容(2)"
            }]
        );
    }

    #[test]
    fn test_tokenize_multiple() {
        let tokenizer = Tokenizer::new();
        let result = tokenizer.tokenize("1. 第一題(1)\n2. 第二題(3)\n12. 第十二題(4)");

        let numbers: Vec<&str> = result.tokens.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec!["1", "2", "12"]);
        assert_eq!(result.tokens[1].body, "第二題(3)");
    }

    #[test]
    fn test_leading_fragment() {
        let tokenizer = Tokenizer::new();
        let result = tokenizer.tokenize("上一頁的延續\n3. 題目(1)");
        assert_eq!(result.leading, "上一頁的延續");
        assert_eq!(result.tokens.len(), 1);
    }

    #[test]
    fn test_trailing_marker_is_incomplete() {
        let tokenizer = Tokenizer::new();
        let result = tokenizer.tokenize("4. 題目(2)\n5. ");
        assert_eq!(result.tokens.len(), 2);
        assert!(!result.tokens[0].is_incomplete());
        assert!(result.tokens[1].is_incomplete());
    }

    #[test]
    fn test_decimal_is_not_a_marker() {
        let tokenizer = Tokenizer::new();
        let result = tokenizer.tokenize("1. 圓周率約為 3.14 (2)");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].body, "圓周率約為 3.14 (2)");
    }

    #[test]
    fn test_no_markers() {
        let tokenizer = Tokenizer::new();
        let result = tokenizer.tokenize("  純文字  ");
        assert_eq!(result.leading, "純文字");
        assert!(result.tokens.is_empty());
    }

    #[test]
    fn test_row_body() {
        let tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.row_body("5. 題目 1. 內容", "5"), "題目 1. 內容");
        assert_eq!(tokenizer.row_body("5. ", "5"), "");
        assert_eq!(tokenizer.row_body("題目", "5"), "題目");
    }
}
