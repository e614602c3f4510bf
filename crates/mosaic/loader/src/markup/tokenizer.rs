//! Markup tokenizer - Converts application markup into tokens
//!
//! Implements the subset of the HTML tokenizer needed to pull resources out of
//! an application's page: tags with attributes, text, comments, and raw-text
//! elements whose content is never interpreted. Character references are kept
//! verbatim so serialized output round-trips the source text.

/// An attribute as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name
    pub name: String,
    /// `None` for bare attributes such as `<script global>`
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.map(str::to_string),
        }
    }
}

/// A markup token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text(String),
    Comment(String),
    Doctype(String),
}

/// Elements whose content is raw text up to the matching end tag
pub fn is_raw_text(name: &str) -> bool {
    matches!(name, "script" | "style" | "textarea" | "title")
}

/// Elements that never have children
pub fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Streaming tokenizer over a markup string
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    raw_text_end: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_text_end: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, pred: F) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    /// Consume raw text up to (not including) `</name`
    fn raw_text(&mut self, name: &str) -> Option<Token> {
        let needle = format!("</{name}");
        let haystack = self.rest().to_ascii_lowercase();
        let end = haystack.find(&needle).unwrap_or(haystack.len());
        let text = &self.input[self.pos..self.pos + end];
        self.pos += end;
        (!text.is_empty()).then(|| Token::Text(text.to_string()))
    }

    fn comment(&mut self) -> Token {
        self.pos += "<!--".len();
        match self.rest().find("-->") {
            Some(end) => {
                let body = &self.input[self.pos..self.pos + end];
                self.pos += end + "-->".len();
                Token::Comment(body.to_string())
            }
            None => {
                let body = self.rest();
                self.pos = self.input.len();
                Token::Comment(body.to_string())
            }
        }
    }

    fn declaration(&mut self) -> Token {
        self.pos += "<!".len();
        let end = self.rest().find('>').unwrap_or(self.rest().len());
        let body = &self.input[self.pos..self.pos + end];
        self.pos = (self.pos + end + 1).min(self.input.len());
        Token::Doctype(body.trim().to_string())
    }

    fn end_tag(&mut self) -> Token {
        self.pos += "</".len();
        let name = self
            .take_while(|c| !c.is_ascii_whitespace() && c != '>')
            .to_ascii_lowercase();
        let end = self.rest().find('>').map(|i| i + 1).unwrap_or(self.rest().len());
        self.pos += end;
        Token::EndTag { name }
    }

    fn start_tag(&mut self) -> Token {
        self.pos += "<".len();
        let name = self
            .take_while(|c| !c.is_ascii_whitespace() && c != '>' && c != '/')
            .to_ascii_lowercase();
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    break;
                }
                Some('/') => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    let attr_name = self.take_while(|c| {
                        !c.is_ascii_whitespace() && c != '=' && c != '>' && c != '/'
                    });
                    if attr_name.is_empty() {
                        // Stray character such as a lone quote
                        self.bump();
                        continue;
                    }
                    self.skip_whitespace();
                    let value = if self.peek() == Some('=') {
                        self.bump();
                        self.skip_whitespace();
                        Some(self.attribute_value())
                    } else {
                        None
                    };
                    if !attributes
                        .iter()
                        .any(|a: &Attribute| a.name.eq_ignore_ascii_case(attr_name))
                    {
                        attributes.push(Attribute::new(attr_name, value));
                    }
                }
            }
        }

        if is_raw_text(&name) && !self_closing {
            self.raw_text_end = Some(name.clone());
        }

        Token::StartTag {
            name,
            attributes,
            self_closing,
        }
    }

    fn attribute_value(&mut self) -> &'a str {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let value = self.take_while(|c| c != quote);
                self.bump();
                value
            }
            _ => self.take_while(|c| !c.is_ascii_whitespace() && c != '>'),
        }
    }

    fn text(&mut self) -> Token {
        // A '<' that does not open markup is literal text
        let start = self.pos;
        self.bump();
        let end = self.rest().find('<').unwrap_or(self.rest().len());
        self.pos += end;
        Token::Text(self.input[start..self.pos].to_string())
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(name) = self.raw_text_end.take() {
                if let Some(token) = self.raw_text(&name) {
                    return Some(token);
                }
            }

            let rest = self.rest();
            if rest.is_empty() {
                return None;
            }

            let mut chars = rest.chars();
            let first = chars.next();
            let second = chars.next();

            let token = match (first, second) {
                (Some('<'), _) if rest.starts_with("<!--") => self.comment(),
                (Some('<'), Some('!')) => self.declaration(),
                (Some('<'), Some('/'))
                    if rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) =>
                {
                    self.end_tag()
                }
                (Some('<'), Some(c)) if c.is_ascii_alphabetic() => self.start_tag(),
                _ => self.text(),
            };

            if let Token::Text(ref t) = token {
                if t.is_empty() {
                    continue;
                }
            }
            return Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Tokenizer::new(input).collect()
    }

    #[test]
    fn test_tag_with_attributes() {
        let toks = tokens(r#"<link rel="stylesheet" href='/a.css' global>"#);
        assert_eq!(
            toks,
            vec![Token::StartTag {
                name: "link".into(),
                attributes: vec![
                    Attribute::new("rel", Some("stylesheet")),
                    Attribute::new("href", Some("/a.css")),
                    Attribute::new("global", None),
                ],
                self_closing: false,
            }]
        );
    }

    #[test]
    fn test_script_content_is_raw() {
        let toks = tokens("<script>if (a < b) { x('</div>') }</script>");
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[1], Token::Text("if (a < b) { x('</div>') }".into()));
        assert_eq!(toks[2], Token::EndTag { name: "script".into() });
    }

    #[test]
    fn test_uppercase_names_are_lowercased() {
        let toks = tokens("<DIV ID=app></DIV>");
        assert!(matches!(&toks[0], Token::StartTag { name, attributes, .. }
            if name == "div" && attributes[0] == Attribute::new("id", Some("app"))));
        assert_eq!(toks[1], Token::EndTag { name: "div".into() });
    }

    #[test]
    fn test_comment_doctype_and_literal_lt() {
        let toks = tokens("<!DOCTYPE html><!-- note -->1 < 2");
        assert_eq!(toks[0], Token::Doctype("DOCTYPE html".into()));
        assert_eq!(toks[1], Token::Comment(" note ".into()));
        let text: String = toks[2..]
            .iter()
            .map(|t| match t {
                Token::Text(t) => t.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(text, "1 < 2");
    }

    #[test]
    fn test_self_closing_and_unterminated_script() {
        let toks = tokens("<br/><script src=x.js />tail");
        assert!(matches!(&toks[0], Token::StartTag { self_closing: true, .. }));
        assert!(matches!(
            &toks[1],
            Token::StartTag { name, self_closing: true, .. } if name == "script"
        ));
        assert_eq!(toks[2], Token::Text("tail".into()));
    }
}
