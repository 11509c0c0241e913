//! Calculator provider for arithmetic expressions

use super::process::copy_to_clipboard;
use super::traits::Provider;
use crate::error::ProviderError;
use crate::results::SearchResult;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const ACTION_COPY: &str = "copy";
const CALCULATOR_ICON: &str = "🧮";

/// Nesting bound for parentheses, signs and exponents
const MAX_DEPTH: usize = 256;

static EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s+\-*/().]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '/' => Token::Slash,
            '(' => Token::Open,
            ')' => Token::Close,
            '*' => {
                if matches!(chars.peek(), Some((_, '*'))) {
                    chars.next();
                    Token::Power
                } else {
                    Token::Star
                }
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_ascii_digit() || d == '.') {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                Token::Number(expr[start..end].parse().ok()?)
            }
            _ => return None,
        };
        tokens.push(token);
    }

    Some(tokens)
}

/// Recursive-descent evaluator over a token stream
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Option<f64> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = if op == Token::Star { value * rhs } else { value / rhs };
        }
        Some(value)
    }

    // All nesting recurses through here
    fn unary(&mut self) -> Option<f64> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    // unary := ('+' | '-') unary | power
    fn signed(&mut self) -> Option<f64> {
        match self.peek()? {
            Token::Plus => {
                self.pos += 1;
                self.unary()
            }
            Token::Minus => {
                self.pos += 1;
                self.unary().map(|v| -v)
            }
            _ => self.power(),
        }
    }

    // power := primary ('**' unary)?, right associative
    fn power(&mut self) -> Option<f64> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Power) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Some(base.powf(exponent));
        }
        Some(base)
    }

    fn primary(&mut self) -> Option<f64> {
        match self.next()? {
            Token::Number(n) => Some(n),
            Token::Open => {
                let value = self.expression()?;
                (self.next()? == Token::Close).then_some(value)
            }
            _ => None,
        }
    }
}

/// Evaluate an arithmetic expression, `None` when malformed
pub fn evaluate(expr: &str) -> Option<f64> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return None;
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    (parser.pos == parser.tokens.len()).then_some(value)
}

/// Provider turning arithmetic queries into a copyable answer
pub struct CalculatorProvider;

impl CalculatorProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CalculatorProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for CalculatorProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        if !EXPRESSION.is_match(query) {
            return Ok(Vec::new());
        }

        let Some(value) = evaluate(query).filter(|v| v.is_finite()) else {
            return Ok(Vec::new());
        };

        let answer = value.to_string();
        Ok(vec![SearchResult::new(&answer, ACTION_COPY, &answer)
            .with_description(format!("Calculate: {}", query))
            .with_icon(CALCULATOR_ICON)])
    }

    fn execute(&self, item: &SearchResult) -> Result<(), ProviderError> {
        match item.action.as_str() {
            ACTION_COPY => {
                debug!("Copying result: {}", item.value);
                copy_to_clipboard(&item.value)
            }
            other => Err(ProviderError::UnsupportedAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(evaluate("2+2"), Some(4.0));
        assert_eq!(evaluate("10 - 3"), Some(7.0));
        assert_eq!(evaluate("5*4"), Some(20.0));
        assert_eq!(evaluate("15/3"), Some(5.0));
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(evaluate("2+3*4"), Some(14.0));
        assert_eq!(evaluate("(2+3)*4"), Some(20.0));
        assert_eq!(evaluate("2**3**2"), Some(512.0));
        assert_eq!(evaluate("-2+5"), Some(3.0));
        assert_eq!(evaluate("3*-2"), Some(-6.0));
        assert_eq!(evaluate(".5+1."), Some(1.5));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(evaluate(""), None);
        assert_eq!(evaluate("2+"), None);
        assert_eq!(evaluate("(2+3"), None);
        assert_eq!(evaluate("2 3"), None);
        assert_eq!(evaluate("1.2.3"), None);
        assert_eq!(evaluate("2***3"), None);
    }

    #[tokio::test]
    async fn test_search_produces_copy_result() {
        let results = CalculatorProvider::new().search("2+2").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "4");
        assert_eq!(results[0].value, "4");
        assert_eq!(results[0].action, "copy");
        assert_eq!(results[0].icon, "🧮");
        assert_eq!(results[0].description.as_deref(), Some("Calculate: 2+2"));
    }

    #[tokio::test]
    async fn test_search_ignores_non_arithmetic_and_non_finite() {
        let calc = CalculatorProvider::new();
        assert!(calc.search("firefox").await.unwrap().is_empty());
        assert!(calc.search("1/0").await.unwrap().is_empty());
        assert!(calc.search("0/0").await.unwrap().is_empty());
        assert!(calc.search("2+").await.unwrap().is_empty());
    }

    #[test]
    fn test_nesting_is_bounded() {
        assert_eq!(evaluate(&format!("{}1{}", "(".repeat(200), ")".repeat(200))), Some(1.0));
        assert_eq!(evaluate(&format!("{}1{}", "(".repeat(300), ")".repeat(300))), None);
        assert_eq!(evaluate(&format!("{}1", "-".repeat(300))), None);
    }

    #[tokio::test]
    async fn test_deeply_nested_query_yields_nothing() {
        let calc = CalculatorProvider::new();
        let nested = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        assert!(calc.search(&nested).await.unwrap().is_empty());

        let signs = format!("{}1", "-".repeat(50_000));
        assert!(calc.search(&signs).await.unwrap().is_empty());

        let powers = format!("2{}", "**2".repeat(20_000));
        assert!(calc.search(&powers).await.unwrap().is_empty());
    }

    #[test]
    fn test_fractional_result() {
        let results = tokio_test::block_on(CalculatorProvider::new().search("1/4")).unwrap();
        assert_eq!(results[0].title, "0.25");
    }

    #[test]
    fn test_rejects_unknown_action() {
        let item = SearchResult::new("4", "exec", "4");
        assert!(matches!(
            CalculatorProvider::new().execute(&item),
            Err(ProviderError::UnsupportedAction(_))
        ));
    }
}
