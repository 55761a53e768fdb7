//! Formula preprocessing.
//!
//! Before a formula can be evaluated by Rhai it is rewritten into a Rhai
//! expression. This module handles:
//!
//! - **Cell references**: `A1` → `CELL(0, 0)` (col, row)
//! - **Ranges**: `SUM(A1:B5)` → `SUM([RANGE(0, 0, 1, 4)])`
//! - **Conditionals**: `IF(c) x ELSEIF(d) y ELSE z` and `IF(c, x, y)` → Rhai `if` expressions
//! - **Operators**: `=` → `==`, `<>` → `!=`, `^` → `**`, `AND`/`OR`/`NOT` → `&&`/`||`/`!`
//! - **Numbers**: every literal becomes a float so `7/2` is `3.5`
//!
//! Names are case-insensitive; everything emitted is upper case so only the
//! registered spreadsheet built-ins are callable.

use super::aggregate::Aggregate;
use super::cell_ref::CellRef;
use crate::error::{EngineError, Result};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(String),
    Str(String),
    Ident(String),
    Cell(CellRef),
    Range(CellRef, CellRef),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

fn formula_error(message: impl Into<String>) -> EngineError {
    EngineError::Formula(message.into())
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    while j < chars.len() && chars[j].is_ascii_digit() {
                        j += 1;
                    }
                    i = j;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value: f64 = text
                .parse()
                .map_err(|_| formula_error(format!("bad number {}", text)))?;
            tokens.push(Token::Number(float_literal(value)));
            continue;
        }

        if c == '"' {
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(formula_error("unterminated string")),
                    Some('"') if chars.get(i + 1) == Some(&'"') => {
                        text.push('"');
                        i += 2;
                    }
                    Some('"') => {
                        i += 1;
                        break;
                    }
                    Some(ch) => {
                        text.push(*ch);
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Str(text));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect::<String>().to_ascii_uppercase();
            match CellRef::from_str(&word) {
                Some(cell) if chars.get(i) == Some(&':') => {
                    let end_start = i + 1;
                    let mut j = end_start;
                    while j < chars.len() && chars[j].is_ascii_alphanumeric() {
                        j += 1;
                    }
                    let end_word: String =
                        chars[end_start..j].iter().collect::<String>().to_ascii_uppercase();
                    let end = CellRef::from_str(&end_word)
                        .ok_or_else(|| formula_error(format!("bad range end {}", end_word)))?;
                    tokens.push(Token::Range(cell, end));
                    i = j;
                }
                Some(cell) => tokens.push(Token::Cell(cell)),
                None => tokens.push(Token::Ident(word)),
            }
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (op, width) = match (c, next) {
            ('<', Some('=')) => ("<=", 2),
            ('>', Some('=')) => (">=", 2),
            ('<', Some('>')) => ("!=", 2),
            ('!', Some('=')) => ("!=", 2),
            ('=', Some('=')) => ("==", 2),
            ('&', Some('&')) => ("&&", 2),
            ('|', Some('|')) => ("||", 2),
            ('=', _) => ("==", 1),
            ('<', _) => ("<", 1),
            ('>', _) => (">", 1),
            ('!', _) => ("!", 1),
            ('+', _) => ("+", 1),
            ('-', _) => ("-", 1),
            ('*', _) => ("*", 1),
            ('/', _) => ("/", 1),
            ('%', _) => ("%", 1),
            ('^', _) => ("**", 1),
            ('(', _) => {
                tokens.push(Token::LParen);
                i += 1;
                continue;
            }
            (')', _) => {
                tokens.push(Token::RParen);
                i += 1;
                continue;
            }
            (',', _) => {
                tokens.push(Token::Comma);
                i += 1;
                continue;
            }
            _ => return Err(formula_error(format!("unexpected character '{}'", c))),
        };
        tokens.push(Token::Op(op));
        i += width;
    }

    Ok(tokens)
}

/// Render a float so Rhai always parses it as a FLOAT literal.
fn float_literal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

fn string_literal(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Where an expression stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stop {
    End,
    Comma,
    RParen,
    ElseIf,
    Else,
}

/// Deepest parenthesis/call/IF nesting a formula may use.
const MAX_NESTING: usize = 64;

struct Translator {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Translator {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is_lparen(&self) -> bool {
        matches!(self.tokens.get(self.pos + 1), Some(Token::LParen))
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(formula_error(format!("expected {:?}", token)))
        }
    }

    /// Translate tokens up to (not including) the next stop at this nesting level.
    fn expr(&mut self) -> Result<(String, Stop)> {
        if self.depth >= MAX_NESTING {
            return Err(formula_error("nesting too deep"));
        }
        self.depth += 1;
        let result = self.sequence();
        self.depth -= 1;
        result
    }

    fn sequence(&mut self) -> Result<(String, Stop)> {
        let mut out = String::new();
        loop {
            let Some(token) = self.peek().cloned() else {
                return Ok((out, Stop::End));
            };
            let piece = match token {
                Token::Comma => return Ok((out, Stop::Comma)),
                Token::RParen => return Ok((out, Stop::RParen)),
                Token::Ident(ref word) if word == "ELSEIF" => return Ok((out, Stop::ElseIf)),
                Token::Ident(ref word) if word == "ELSE" => return Ok((out, Stop::Else)),
                Token::Ident(ref word) if word == "IF" && self.peek_is_lparen() => {
                    self.pos += 1;
                    self.conditional()?
                }
                Token::Ident(ref word) if self.peek_is_lparen() => {
                    self.pos += 1;
                    self.call(word)?
                }
                Token::Ident(word) => {
                    self.pos += 1;
                    match word.as_str() {
                        "AND" => "&&".to_string(),
                        "OR" => "||".to_string(),
                        "NOT" => "!".to_string(),
                        "TRUE" => "true".to_string(),
                        "FALSE" => "false".to_string(),
                        _ => return Err(formula_error(format!("unknown name {}", word))),
                    }
                }
                Token::LParen => {
                    self.pos += 1;
                    let inner = self.required_expr(Stop::RParen)?;
                    self.expect(Token::RParen)?;
                    format!("({})", inner)
                }
                Token::Cell(cell) => {
                    self.pos += 1;
                    format!("CELL({}, {})", cell.col, cell.row)
                }
                Token::Range(start, end) => {
                    self.pos += 1;
                    format!("RANGE({}, {}, {}, {})", start.col, start.row, end.col, end.row)
                }
                Token::Number(text) => {
                    self.pos += 1;
                    text
                }
                Token::Str(text) => {
                    self.pos += 1;
                    string_literal(&text)
                }
                Token::Op(op) => {
                    self.pos += 1;
                    op.to_string()
                }
            };
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&piece);
        }
    }

    /// An expression that must be non-empty and end at `stop`.
    fn required_expr(&mut self, stop: Stop) -> Result<String> {
        let (text, found) = self.expr()?;
        if text.is_empty() {
            return Err(formula_error("empty expression"));
        }
        if found != stop {
            return Err(formula_error(format!("expected {:?}, found {:?}", stop, found)));
        }
        Ok(text)
    }

    /// `NAME(` has been consumed up to the name; translate the call.
    fn call(&mut self, name: &str) -> Result<String> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
        } else {
            loop {
                let (arg, stop) = self.expr()?;
                if arg.is_empty() {
                    return Err(formula_error(format!("empty argument to {}", name)));
                }
                args.push(arg);
                match stop {
                    Stop::Comma => self.pos += 1,
                    Stop::RParen => {
                        self.pos += 1;
                        break;
                    }
                    other => {
                        return Err(formula_error(format!("unexpected {:?} in {}()", other, name)));
                    }
                }
            }
        }

        if Aggregate::from_name(name).is_some_and(|agg| agg.is_variadic()) {
            Ok(format!("{}([{}])", name, args.join(", ")))
        } else {
            Ok(format!("{}({})", name, args.join(", ")))
        }
    }

    /// `IF` has been consumed; translate either the block or the function form.
    fn conditional(&mut self) -> Result<String> {
        self.expect(Token::LParen)?;
        let (cond, stop) = self.expr()?;
        if cond.is_empty() {
            return Err(formula_error("IF without a condition"));
        }
        match stop {
            Stop::Comma => {
                self.pos += 1;
                let (then, stop) = self.expr()?;
                if then.is_empty() {
                    return Err(formula_error("IF without a value"));
                }
                let otherwise = match stop {
                    Stop::Comma => {
                        self.pos += 1;
                        self.required_expr(Stop::RParen)?
                    }
                    Stop::RParen => "()".to_string(),
                    other => return Err(formula_error(format!("unexpected {:?} in IF()", other))),
                };
                self.expect(Token::RParen)?;
                Ok(format!(
                    "(if TRUTHY({}) {{ {} }} else {{ {} }})",
                    cond, then, otherwise
                ))
            }
            Stop::RParen => {
                self.pos += 1;
                self.block(cond)
            }
            other => Err(formula_error(format!("unexpected {:?} in IF()", other))),
        }
    }

    /// Block conditional after `IF(cond)`: body, then any ELSEIF/ELSE arms.
    fn block(&mut self, cond: String) -> Result<String> {
        let (body, mut stop) = self.expr()?;
        if body.is_empty() {
            return Err(formula_error("IF without a body"));
        }
        let mut out = format!("(if TRUTHY({}) {{ {} }}", cond, body);

        while stop == Stop::ElseIf {
            self.pos += 1;
            self.expect(Token::LParen)?;
            let cond = self.required_expr(Stop::RParen)?;
            self.pos += 1;
            let (body, next) = self.expr()?;
            if body.is_empty() {
                return Err(formula_error("ELSEIF without a body"));
            }
            out.push_str(&format!(" else if TRUTHY({}) {{ {} }}", cond, body));
            stop = next;
        }

        if stop == Stop::Else {
            self.pos += 1;
            let (body, _) = self.expr()?;
            if body.is_empty() {
                return Err(formula_error("ELSE without a body"));
            }
            out.push_str(&format!(" else {{ {} }}", body));
        }

        out.push(')');
        Ok(out)
    }
}

/// Rewrite a formula (without the leading `=`) into a Rhai expression.
pub fn preprocess_formula(source: &str) -> Result<String> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(formula_error("empty formula"));
    }
    let mut translator = Translator {
        tokens,
        pos: 0,
        depth: 0,
    };
    let (script, stop) = translator.expr()?;
    if stop != Stop::End {
        return Err(formula_error(format!("unexpected {:?}", stop)));
    }
    if script.is_empty() {
        return Err(formula_error("empty formula"));
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_refs_become_cell_calls() {
        assert_eq!(preprocess_formula("A1").unwrap(), "CELL(0, 0)");
        assert_eq!(preprocess_formula("b2 + C3").unwrap(), "CELL(1, 1) + CELL(2, 2)");
    }

    #[test]
    fn test_numbers_become_floats() {
        assert_eq!(preprocess_formula("2+2").unwrap(), "2.0 + 2.0");
        assert_eq!(preprocess_formula("1.5e2").unwrap(), "150.0");
    }

    #[test]
    fn test_operators_are_mapped() {
        assert_eq!(preprocess_formula("A1=1").unwrap(), "CELL(0, 0) == 1.0");
        assert_eq!(preprocess_formula("A1<>1").unwrap(), "CELL(0, 0) != 1.0");
        assert_eq!(preprocess_formula("2^3").unwrap(), "2.0 ** 3.0");
        assert_eq!(
            preprocess_formula("A1>1 AND NOT B1").unwrap(),
            "CELL(0, 0) > 1.0 && ! CELL(1, 0)"
        );
    }

    #[test]
    fn test_block_conditional() {
        assert_eq!(
            preprocess_formula("IF(A1>10) PRINT(\"High\") ELSEIF(A1>5) PRINT(\"Mid\") ELSE PRINT(\"Low\")")
                .unwrap(),
            "(if TRUTHY(CELL(0, 0) > 10.0) { PRINT(\"High\") } \
             else if TRUTHY(CELL(0, 0) > 5.0) { PRINT(\"Mid\") } \
             else { PRINT(\"Low\") })"
        );
    }

    #[test]
    fn test_function_conditional() {
        assert_eq!(
            preprocess_formula("IF(A1>10, \"High\", \"Low\")").unwrap(),
            "(if TRUTHY(CELL(0, 0) > 10.0) { \"High\" } else { \"Low\" })"
        );
    }

    #[test]
    fn test_aggregate_arguments_are_collected() {
        assert_eq!(preprocess_formula("SUM(A1:A3)").unwrap(), "SUM([RANGE(0, 0, 0, 2)])");
        assert_eq!(
            preprocess_formula("avg(A1, 2)").unwrap(),
            "AVG([CELL(0, 0), 2.0])"
        );
        assert_eq!(preprocess_formula("ROUND(A1)").unwrap(), "ROUND(CELL(0, 0))");
    }

    #[test]
    fn test_strings_are_escaped() {
        assert_eq!(preprocess_formula("\"say \"\"hi\"\"\"").unwrap(), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_nesting_is_bounded() {
        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(preprocess_formula(&shallow).is_ok());

        let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        match preprocess_formula(&deep) {
            Err(EngineError::Formula(message)) => assert_eq!(message, "nesting too deep"),
            other => panic!("expected nesting error, got {:?}", other),
        }
        let calls = format!("{}1{}", "ABS(".repeat(10_000), ")".repeat(10_000));
        assert!(preprocess_formula(&calls).is_err());
    }

    #[test]
    fn test_malformed_input() {
        for source in ["(", "", "1 +)", "IF(", "IF() 1", "A1:", "\"open", "x + 1", "1 # 2", "ELSE 1"] {
            assert!(preprocess_formula(source).is_err(), "{:?} should fail", source);
        }
    }
}
