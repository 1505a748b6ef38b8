//! Mailbox and address-list parsing (RFC 5322 §3.4).
//!
//! Display names may carry RFC 2047 encoded words; they are decoded with the
//! same charset registry as message bodies.

use crate::encoding::{decode_rfc2047, encode_rfc2047};
use crate::error::{Error, Result};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A mailbox: an optional display name plus an address.
///
/// Equality and hashing consider the address only; the display name is
/// presentational.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Address {
    /// Decoded display name, empty when absent.
    pub display_name: String,
    /// The `local@domain` mailbox specification.
    pub address: String,
}

impl Address {
    /// Creates an address.
    #[must_use]
    pub fn new(display_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            address: address.into(),
        }
    }

    /// Parses a single mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the text is not exactly one mailbox.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser::new(text)?;
        let address = parser.mailbox()?;
        if !parser.at_end() {
            return Err(invalid(text, "expected a single address"));
        }
        Ok(address)
    }

    /// Parses a comma-separated address list.
    ///
    /// Group syntax (`team: a@example.com, b@example.com;`) is flattened into
    /// its members.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if any element does not parse or
    /// the list is empty.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        let mut parser = Parser::new(text)?;
        let list = parser.address_list()?;
        if list.is_empty() {
            return Err(invalid(text, "no address"));
        }
        Ok(list)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let address = &self.address;
        if self.display_name.is_empty() {
            return write!(f, "<{address}>");
        }
        if self.display_name.is_ascii() {
            let escaped = self.display_name.replace('\\', "\\\\").replace('"', "\\\"");
            write!(f, "\"{escaped}\" <{address}>")
        } else {
            let encoded = encode_rfc2047(&self.display_name, "utf-8");
            write!(f, "{encoded} <{address}>")
        }
    }
}

fn invalid(text: &str, reason: &str) -> Error {
    Error::InvalidAddress(format!("{reason}: {text:?}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Atom(String),
    Quoted(String),
    DomainLiteral(String),
    Special(char),
}

const SPECIALS: &str = "()<>[]:;@\\,\"";

/// Splits a header value into tokens, dropping whitespace and comments.
fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                let mut depth = 1;
                while depth > 0 {
                    match chars.next() {
                        Some('(') => depth += 1,
                        Some(')') => depth -= 1,
                        Some('\\') => {
                            chars.next();
                        }
                        Some(_) => {}
                        None => return Err(invalid(text, "unterminated comment")),
                    }
                }
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => {
                            value.extend(chars.next());
                        }
                        Some(ch) => value.push(ch),
                        None => return Err(invalid(text, "unterminated quoted string")),
                    }
                }
                tokens.push(Token::Quoted(value));
            }
            '[' => {
                chars.next();
                let mut value = String::from("[");
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(ch) => value.push(ch),
                        None => return Err(invalid(text, "unterminated domain literal")),
                    }
                }
                value.push(']');
                tokens.push(Token::DomainLiteral(value));
            }
            c if SPECIALS.contains(c) => {
                chars.next();
                tokens.push(Token::Special(c));
            }
            _ => {
                let mut atom = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || SPECIALS.contains(ch) {
                        break;
                    }
                    atom.push(ch);
                    chars.next();
                }
                tokens.push(Token::Atom(atom));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self> {
        Ok(Self {
            text,
            tokens: tokenize(text)?,
            pos: 0,
        })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, special: char) -> bool {
        if self.peek() == Some(&Token::Special(special)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, reason: &str) -> Error {
        invalid(self.text, reason)
    }

    fn address_list(&mut self) -> Result<Vec<Address>> {
        let mut list = Vec::new();
        while !self.at_end() {
            // Empty list elements are allowed by the obsolete syntax.
            if self.eat(',') {
                continue;
            }
            list.extend(self.address()?);
            if !self.at_end() && !self.eat(',') {
                return Err(self.error("expected ',' between addresses"));
            }
        }
        Ok(list)
    }

    /// Parses a mailbox, or a group returning all of its members.
    fn address(&mut self) -> Result<Vec<Address>> {
        let start = self.pos;
        let phrase = self.phrase();
        if !phrase.is_empty() && self.eat(':') {
            let mut members = Vec::new();
            while !self.eat(';') {
                if self.at_end() {
                    return Err(self.error("unterminated group"));
                }
                if self.eat(',') {
                    continue;
                }
                members.push(self.mailbox()?);
            }
            return Ok(members);
        }
        self.pos = start;
        Ok(vec![self.mailbox()?])
    }

    fn mailbox(&mut self) -> Result<Address> {
        let start = self.pos;
        let phrase = self.phrase();

        if self.eat('<') {
            let address = self.addr_spec()?;
            if !self.eat('>') {
                return Err(self.error("unterminated angle address"));
            }
            let display_name = self.display_name(&phrase)?;
            return Ok(Address::new(display_name, address));
        }

        self.pos = start;
        let address = self.addr_spec()?;
        Ok(Address::new(String::new(), address))
    }

    /// Collects consecutive words (atoms and quoted strings).
    fn phrase(&mut self) -> Vec<Token> {
        let mut words = Vec::new();
        while let Some(token @ (Token::Atom(_) | Token::Quoted(_))) = self.peek() {
            words.push(token.clone());
            self.pos += 1;
        }
        words
    }

    fn display_name(&self, words: &[Token]) -> Result<String> {
        let joined = words
            .iter()
            .filter_map(|word| match word {
                Token::Atom(s) | Token::Quoted(s) => Some(s.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");
        decode_rfc2047(&joined)
            .map_err(|e| self.error(&format!("undecodable display name ({e})")))
    }

    fn addr_spec(&mut self) -> Result<String> {
        let local = match self.advance() {
            Some(Token::Atom(local)) => local,
            Some(Token::Quoted(local)) => format!("\"{local}\""),
            _ => return Err(self.error("missing local part")),
        };
        if !self.eat('@') {
            return Err(self.error("missing @ in addr-spec"));
        }
        let domain = match self.advance() {
            Some(Token::Atom(domain) | Token::DomainLiteral(domain)) => domain,
            _ => return Err(self.error("missing domain")),
        };
        if local.starts_with('.') || local.ends_with('.') || domain.ends_with('.') {
            return Err(self.error("misplaced dot in addr-spec"));
        }
        Ok(format!("{local}@{domain}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_bare_address() {
        let addr = Address::parse("from@example.com").unwrap();
        assert_eq!(addr.address, "from@example.com");
        assert_eq!(addr.display_name, "");
    }

    #[test]
    fn test_parse_name_addr() {
        let addr = Address::parse("Gopher <from@example.com>").unwrap();
        assert_eq!(addr.display_name, "Gopher");
        assert_eq!(addr.address, "from@example.com");

        let addr = Address::parse("Another Gopher <to@example.com>").unwrap();
        assert_eq!(addr.display_name, "Another Gopher");
    }

    #[test]
    fn test_parse_quoted_name_with_comma() {
        let addr = Address::parse(r#""Doe, \"JD\" John" <jd@example.com>"#).unwrap();
        assert_eq!(addr.display_name, "Doe, \"JD\" John");
        assert_eq!(addr.address, "jd@example.com");
    }

    #[test]
    fn test_parse_encoded_display_name() {
        let addr = Address::parse("=?UTF-8?B?44K044O844OV44Kh44O8?= <gopher@example.jp>").unwrap();
        assert_eq!(addr.display_name, "ゴーファー");

        let addr = Address::parse("\"=?ISO-2022-JP?B?GyRCJUYlOSVIGyhC?=\" <test@example.jp>").unwrap();
        assert_eq!(addr.display_name, "テスト");
    }

    #[test]
    fn test_parse_comments_ignored() {
        let addr = Address::parse("(sender) user@example.com (Work)").unwrap();
        assert_eq!(addr.address, "user@example.com");
    }

    #[test]
    fn test_parse_angle_only() {
        let addr = Address::parse("<user@[192.0.2.1]>").unwrap();
        assert_eq!(addr.address, "user@[192.0.2.1]");
        assert_eq!(addr.display_name, "");
    }

    #[test]
    fn test_parse_invalid() {
        for input in [
            "",
            "no-at-sign",
            "Name <no-at-sign>",
            "<user@example.com",
            "user@",
            "a@example.com, b@example.com",
            "\"unterminated <a@example.com>",
            "=?x-nonexistent?B?SGVsbG8=?= <a@example.com>",
        ] {
            assert!(
                matches!(Address::parse(input), Err(Error::InvalidAddress(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_list() {
        let list =
            Address::parse_list("Alice <alice@example.com>, bob@example.com,, \"C\" <c@example.com>")
                .unwrap();
        let addresses: Vec<_> = list.iter().map(|a| a.address.as_str()).collect();
        assert_eq!(addresses, ["alice@example.com", "bob@example.com", "c@example.com"]);
        assert_eq!(list[0].display_name, "Alice");
    }

    #[test]
    fn test_parse_list_group() {
        let list = Address::parse_list("team: a@example.com, B <b@example.com>;, c@example.com")
            .unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[1].display_name, "B");

        let empty_group = Address::parse_list("undisclosed-recipients:;, d@example.com").unwrap();
        assert_eq!(empty_group, vec![Address::new("", "d@example.com")]);
    }

    #[test]
    fn test_parse_list_invalid() {
        assert!(Address::parse_list("").is_err());
        assert!(Address::parse_list("a@example.com b@example.com").is_err());
        assert!(Address::parse_list("team: a@example.com").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Address::new("", "a@example.com").to_string(), "<a@example.com>");
        assert_eq!(
            Address::new("Gopher", "a@example.com").to_string(),
            "\"Gopher\" <a@example.com>"
        );
        let encoded = Address::new("ゴーファー", "a@example.com").to_string();
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert_eq!(Address::parse(&encoded).unwrap().display_name, "ゴーファー");
    }

    proptest! {
        #[test]
        fn prop_equality_ignores_display_name(a in "[A-Za-z ]{0,12}", b in "[A-Za-z ]{0,12}") {
            let left = Address::new(a, "gopher@example.com");
            let right = Address::new(b, "gopher@example.com");
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_display_round_trips(name in "[A-Za-z][A-Za-z .]{0,15}", local in "[a-z]{1,8}") {
            let addr = Address::new(name.trim(), format!("{local}@example.com"));
            let parsed = Address::parse(&addr.to_string()).unwrap();
            prop_assert_eq!(&parsed.address, &addr.address);
            prop_assert_eq!(parsed.display_name, addr.display_name);
        }
    }
}
