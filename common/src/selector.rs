use std::fmt;

use thiserror::Error;

// compound selectors
//
// the page only ever asks for things like `form[data-validate]`, `details.faq-item` or
// `a[href^="#"]`, so we parse exactly that subset: comma separated lists of compound
// selectors without combinators.  scoping ("the summary inside this details") goes through
// Document::query_within instead of descendant combinators.
//
// the parsed form serves two masters: the browser gets it rendered back to css for
// querySelectorAll, and the in-memory document matches it structurally
#[derive(Debug, Error, PartialEq)]
pub enum SelectorError {
    #[error("empty selector in {0:?}")]
    Empty(String),
    #[error("unexpected {found:?} at offset {offset} in {input:?}")]
    Unexpected {
        input: String,
        offset: usize,
        found: char,
    },
    #[error("unterminated attribute test in {0:?}")]
    Unterminated(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrTest {
    Present,
    Equals(String),
    Prefix(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrMatch {
    pub name: String,
    pub test: AttrTest,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrMatch>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

// what the structural matcher needs to know about an element
pub trait ElementView {
    fn tag(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    fn has_class(&self, class: &str) -> bool;
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();

        let mut offset = 0;
        for part in input.split(',') {
            let start = offset + (part.len() - part.trim_start().len());
            offset += part.len() + 1;

            let part = part.trim();
            if part.is_empty() {
                return Err(SelectorError::Empty(input.to_owned()));
            }

            alternatives.push(Parser::new(input, part, start).compound()?);
        }

        Ok(Selector { alternatives })
    }

    pub fn matches<E: ElementView + ?Sized>(&self, element: &E) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }
}

impl Compound {
    pub fn matches<E: ElementView + ?Sized>(&self, element: &E) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(element.tag()) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if element.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }

        self.attrs.iter().all(|attr| {
            match (element.attribute(&attr.name), &attr.test) {
                (None, _) => false,
                (Some(_), AttrTest::Present) => true,
                (Some(v), AttrTest::Equals(want)) => v == want,
                (Some(v), AttrTest::Prefix(want)) => v.starts_with(want.as_str()),
            }
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, compound) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{compound}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attr in &self.attrs {
            match &attr.test {
                AttrTest::Present => write!(f, "[{}]", attr.name)?,
                AttrTest::Equals(v) => write!(f, "[{}=\"{}\"]", attr.name, escape(v))?,
                AttrTest::Prefix(v) => write!(f, "[{}^=\"{}\"]", attr.name, escape(v))?,
            }
        }
        Ok(())
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

struct Parser<'a> {
    input: &'a str,
    part: &'a str,
    base: usize,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, part: &'a str, base: usize) -> Self {
        Parser {
            input,
            part,
            base,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.part[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            input: self.input.to_owned(),
            offset: self.base + self.pos,
            found,
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident) {
            self.bump();
        }

        if start == self.pos {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => SelectorError::Empty(self.input.to_owned()),
            });
        }

        Ok(self.part[start..self.pos].to_owned())
    }

    fn compound(mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();

        if self.peek().is_some_and(is_ident) || self.peek() == Some('*') {
            if self.peek() == Some('*') {
                self.bump();
            } else {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
        }

        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    self.bump();
                    compound.id = Some(self.ident()?);
                }
                '.' => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                '[' => {
                    self.bump();
                    compound.attrs.push(self.attr()?);
                }
                other => return Err(self.unexpected(other)),
            }
        }

        Ok(compound)
    }

    fn attr(&mut self) -> Result<AttrMatch, SelectorError> {
        let name = self.ident()?.to_ascii_lowercase();

        let test = match self.bump() {
            Some(']') => return Ok(AttrMatch { name, test: AttrTest::Present }),
            Some('=') => AttrTest::Equals(self.value()?),
            Some('^') => match self.bump() {
                Some('=') => AttrTest::Prefix(self.value()?),
                Some(c) => return Err(self.unexpected(c)),
                None => return Err(SelectorError::Unterminated(self.input.to_owned())),
            },
            Some(c) => return Err(self.unexpected(c)),
            None => return Err(SelectorError::Unterminated(self.input.to_owned())),
        };

        match self.bump() {
            Some(']') => Ok(AttrMatch { name, test }),
            Some(c) => Err(self.unexpected(c)),
            None => Err(SelectorError::Unterminated(self.input.to_owned())),
        }
    }

    fn value(&mut self) -> Result<String, SelectorError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                q
            }
            _ => return self.ident(),
        };

        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => value.push(c),
                    None => return Err(SelectorError::Unterminated(self.input.to_owned())),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(SelectorError::Unterminated(self.input.to_owned())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct El {
        tag: &'static str,
        attrs: Vec<(&'static str, &'static str)>,
    }

    impl ElementView for El {
        fn tag(&self) -> &str {
            self.tag
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            self.attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        }

        fn has_class(&self, class: &str) -> bool {
            self.attribute("class")
                .is_some_and(|c| c.split_whitespace().any(|c| c == class))
        }
    }

    #[test]
    fn parses_the_page_selectors() {
        for css in [
            "form[data-validate]",
            "input, textarea",
            "input[required], textarea[required]",
            "a[href^=\"#\"]",
            ".animate-on-scroll",
            "details.faq-item",
            "img[data-src]",
            "i, svg, img",
            "#section-2",
        ] {
            let selector = Selector::parse(css).unwrap();
            assert_eq!(selector.to_string(), css, "render of {css}");
        }
    }

    #[test]
    fn matches_compounds_and_lists() {
        let details = El {
            tag: "details",
            attrs: vec![("class", "faq-item open")],
        };
        assert!(Selector::parse("details.faq-item").unwrap().matches(&details));
        assert!(!Selector::parse("details.other").unwrap().matches(&details));
        assert!(Selector::parse("summary, .open").unwrap().matches(&details));

        let link = El {
            tag: "A",
            attrs: vec![("href", "#contact")],
        };
        assert!(Selector::parse("a[href^='#']").unwrap().matches(&link));
        assert!(!Selector::parse("a[href=\"#\"]").unwrap().matches(&link));
        assert!(Selector::parse("[href=\"#contact\"]").unwrap().matches(&link));
    }

    #[test]
    fn id_selector_checks_the_id_attribute() {
        let el = El {
            tag: "section",
            attrs: vec![("id", "faq")],
        };
        assert!(Selector::parse("#faq").unwrap().matches(&el));
        assert!(!Selector::parse("#contact").unwrap().matches(&el));
    }

    #[test]
    fn rejects_what_it_does_not_understand() {
        assert_eq!(
            Selector::parse("details summary"),
            Err(SelectorError::Unexpected {
                input: "details summary".into(),
                offset: 7,
                found: ' ',
            })
        );
        assert!(matches!(Selector::parse("a, "), Err(SelectorError::Empty(_))));
        assert!(matches!(Selector::parse("#"), Err(SelectorError::Empty(_))));
        assert!(matches!(
            Selector::parse("a[href^=\"#"),
            Err(SelectorError::Unterminated(_))
        ));
        assert!(matches!(
            Selector::parse("a > b"),
            Err(SelectorError::Unexpected { found: ' ', .. })
        ));
    }

    #[test]
    fn offsets_point_into_the_full_input() {
        let err = Selector::parse("input, text!area").unwrap_err();
        assert_eq!(
            err,
            SelectorError::Unexpected {
                input: "input, text!area".into(),
                offset: 11,
                found: '!',
            }
        );
    }
}
