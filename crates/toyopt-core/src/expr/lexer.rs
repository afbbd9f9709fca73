use super::ExprError;

/// Tokens of the arithmetic sub-language used on assignment right-hand
/// sides and inside bracketed index expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(i64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize an arithmetic expression.
///
/// Any character outside digits, identifiers, `+ - * / ( )` and whitespace
/// is rejected.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut end = pos;
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                // `3x` is neither a number nor an identifier
                if let Some(&(i, next)) = chars.peek() {
                    if is_ident_start(next) {
                        return Err(ExprError::UnexpectedChar(next, i));
                    }
                }
                let value = source[pos..end]
                    .parse::<i64>()
                    .map_err(|_| ExprError::IntegerOverflow(source[pos..end].to_string()))?;
                tokens.push(Token::Number(value));
            }
            c if is_ident_start(c) => {
                let mut end = pos;
                while let Some(&(i, d)) = chars.peek() {
                    if !is_ident_continue(d) {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Ident(source[pos..end].to_string()));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            other => return Err(ExprError::UnexpectedChar(other, pos)),
        }
    }

    Ok(tokens)
}

/// Every identifier-shaped word in arbitrary line text, in order of
/// appearance. Unlike [`tokenize`] this never fails; it is used to find the
/// names a whole statement line mentions.
pub fn scan_identifiers(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_digit() {
            while i < bytes.len() && is_ident_continue(bytes[i] as char) {
                i += 1;
            }
        } else if is_ident_start(c) {
            let start = i;
            while i < bytes.len() && is_ident_continue(bytes[i] as char) {
                i += 1;
            }
            words.push(&text[start..i]);
        } else {
            i += 1;
        }
    }

    words
}
