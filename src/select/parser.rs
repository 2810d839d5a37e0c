// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Recursive-descent parser of Amber mask queries.
//!
//! ```text
//! expr          := term ( '|' term )*
//! term          := factor ( '&' factor )*
//! factor        := '!' factor2 | factor2
//! factor2       := '(' expr ')' | select_rule | keyword
//! select_rule   := ':' items | '$' numbers | '@' ( '%' items | '/' names | items )
//! item          := lexeme ( '-' integer ( '#' integer )? )?
//! keyword       := 'System' | 'Protein'
//! ```

use crate::auxiliary::PROTEIN_RESIDUES;
use crate::errors::SelectError;

use super::{name::Name, numbers::NumberRange, AmberMask, SelectItem};

/// Characters that can be part of a name or number.
#[inline(always)]
fn is_lexeme_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'*' || c == b'?' || c == b'='
}

pub(super) struct Parser<'a> {
    query: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(super) fn new(query: &'a str) -> Self {
        Parser {
            query,
            bytes: query.as_bytes(),
            pos: 0,
        }
    }

    /// Parse the whole query. The entire input must be consumed.
    pub(super) fn parse(mut self) -> Result<AmberMask, SelectError> {
        if self.query.trim().is_empty() {
            return Err(SelectError::EmptyQuery);
        }

        let mask = self.expr()?;

        if self.peek().is_some() {
            return Err(self.error("'&', '|', ')' or end of query"));
        }

        Ok(mask)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Get the next non-whitespace character without consuming it.
    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, expected: &str) -> SelectError {
        self.error_at(self.pos, expected)
    }

    fn error_at(&self, offset: usize, expected: &str) -> SelectError {
        SelectError::Syntax {
            query: self.query.to_owned(),
            offset,
            expected: expected.to_owned(),
        }
    }

    fn expr(&mut self) -> Result<AmberMask, SelectError> {
        let mut left = self.term()?;

        while self.peek() == Some(b'|') {
            self.pos += 1;
            let right = self.term()?;
            left = AmberMask::Or(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<AmberMask, SelectError> {
        let mut left = self.factor()?;

        while self.peek() == Some(b'&') {
            self.pos += 1;
            let right = self.factor()?;
            left = AmberMask::And(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn factor(&mut self) -> Result<AmberMask, SelectError> {
        if self.peek() == Some(b'!') {
            self.pos += 1;
            return Ok(AmberMask::Not(Box::new(self.factor2()?)));
        }

        self.factor2()
    }

    fn factor2(&mut self) -> Result<AmberMask, SelectError> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let inner = self.expr()?;
                if self.peek() != Some(b')') {
                    return Err(self.error("')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(b':') => {
                self.pos += 1;
                Ok(AmberMask::ResidueNameNumber(self.items()?))
            }
            Some(b'$') => {
                self.pos += 1;
                Ok(AmberMask::MoleculeNumber(self.number_items()?))
            }
            Some(b'@') => {
                self.pos += 1;
                match self.peek() {
                    Some(b'%') => {
                        self.pos += 1;
                        Ok(AmberMask::AtomType(self.items()?))
                    }
                    Some(b'/') => {
                        self.pos += 1;
                        Ok(AmberMask::ElementSymbol(self.names()?))
                    }
                    _ => Ok(AmberMask::AtomNameNumber(self.items()?)),
                }
            }
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            _ => Err(self.error("'(', ':', '@', '$', '!' or a keyword")),
        }
    }

    fn keyword(&mut self) -> Result<AmberMask, SelectError> {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_alphabetic() {
            self.pos += 1;
        }

        match &self.query[start..self.pos] {
            "System" => Ok(AmberMask::ElementSymbol(vec![self.name_at("*", start)?])),
            "Protein" => Ok(AmberMask::ResidueNameNumber(
                PROTEIN_RESIDUES
                    .iter()
                    .map(|residue| Ok(SelectItem::Name(self.name_at(residue, start)?)))
                    .collect::<Result<Vec<_>, SelectError>>()?,
            )),
            _ => Err(self.error_at(start, "'System' or 'Protein'")),
        }
    }

    /// Read a contiguous run of name/number characters. Returns the lexeme and its offset.
    fn lexeme(&mut self, expected: &str) -> Result<(&'a str, usize), SelectError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.bytes.len() && is_lexeme_char(self.bytes[self.pos]) {
            self.pos += 1;
        }

        if start == self.pos {
            return Err(self.error(expected));
        }

        let query = self.query;
        Ok((&query[start..self.pos], start))
    }

    /// Read a non-negative integer.
    fn integer(&mut self) -> Result<usize, SelectError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }

        self.query[start..self.pos]
            .parse::<usize>()
            .map_err(|_| self.error_at(start, "an integer"))
    }

    fn name_at(&self, string: &str, offset: usize) -> Result<Name, SelectError> {
        Name::new(string).map_err(|_| self.error_at(offset, "a valid name pattern"))
    }

    /// Parse the optional `-end#stride` part of a numeric item.
    fn range(&mut self, first: usize) -> Result<NumberRange, SelectError> {
        if self.peek() != Some(b'-') {
            return Ok(NumberRange::single(first));
        }
        self.pos += 1;
        let second = self.integer()?;

        let mut stride = 1;
        if self.peek() == Some(b'#') {
            self.pos += 1;
            self.skip_whitespace();
            let offset = self.pos;
            stride = self.integer()?;

            if stride == 0 {
                return Err(SelectError::ZeroStride {
                    query: self.query.to_owned(),
                    offset,
                });
            }
        }

        // stride is non-zero at this point
        NumberRange::new(first, second, stride).ok_or_else(|| self.error("a non-zero stride"))
    }

    fn item(&mut self) -> Result<SelectItem, SelectError> {
        let (lexeme, offset) = self.lexeme("a name or a number")?;

        if lexeme.bytes().all(|c| c.is_ascii_digit()) {
            let first = lexeme
                .parse::<usize>()
                .map_err(|_| self.error_at(offset, "an integer"))?;
            return Ok(SelectItem::Number(self.range(first)?));
        }

        if self.peek() == Some(b'-') {
            return Err(self.error_at(offset, "an integer as the start of a range"));
        }

        Ok(SelectItem::Name(self.name_at(lexeme, offset)?))
    }

    fn items(&mut self) -> Result<Vec<SelectItem>, SelectError> {
        let mut items = vec![self.item()?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            items.push(self.item()?);
        }

        Ok(items)
    }

    fn number_items(&mut self) -> Result<Vec<NumberRange>, SelectError> {
        let mut ranges = Vec::new();
        loop {
            let (lexeme, offset) = self.lexeme("a molecule number")?;
            let first = lexeme
                .parse::<usize>()
                .map_err(|_| self.error_at(offset, "a molecule number"))?;
            ranges.push(self.range(first)?);

            if self.peek() != Some(b',') {
                break;
            }
            self.pos += 1;
        }

        Ok(ranges)
    }

    fn names(&mut self) -> Result<Vec<Name>, SelectError> {
        let mut names = Vec::new();
        loop {
            let (lexeme, offset) = self.lexeme("an element symbol")?;
            names.push(self.name_at(lexeme, offset)?);

            if self.peek() != Some(b',') {
                break;
            }
            self.pos += 1;
        }

        Ok(names)
    }
}
