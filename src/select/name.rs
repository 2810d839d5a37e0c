// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of the Name enum: literal or wildcard pattern used in selections.

use regex::Regex;
use std::fmt;

/// Name of a residue, atom, atom type or element used in a selection.
#[derive(Debug, Clone)]
pub enum Name {
    /// Exact match.
    Literal(String),
    /// Shell-style wildcard pattern compiled into a regular expression.
    /// `*` (or its alias `=`) matches any sequence of characters, `?` matches a single character.
    Glob { pattern: String, regex: Regex },
}

impl Name {
    /// Create new `Name`. Strings containing `*`, `?` or `=` are compiled as wildcard patterns.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::select::Name;
    /// let name = Name::new("A?P").unwrap();
    ///
    /// assert!(name.is_match("ASP"));
    /// assert!(!name.is_match("ASN"));
    /// ```
    pub fn new(string: &str) -> Result<Self, regex::Error> {
        if !string.contains(['*', '?', '=']) {
            return Ok(Name::Literal(string.to_owned()));
        }

        let mut expression = String::with_capacity(string.len() + 8);
        expression.push('^');
        for c in string.chars() {
            match c {
                '*' | '=' => expression.push_str(".*"),
                '?' => expression.push('.'),
                other => expression.push_str(&regex::escape(&other.to_string())),
            }
        }
        expression.push('$');

        Ok(Name::Glob {
            pattern: string.to_owned(),
            regex: Regex::new(&expression)?,
        })
    }

    /// Check whether the name matches the given string.
    #[inline]
    pub fn is_match(&self, string: &str) -> bool {
        match self {
            Name::Literal(s) => s == string,
            Name::Glob { regex, .. } => regex.is_match(string),
        }
    }

    /// Check whether the name is a wildcard pattern.
    #[inline(always)]
    pub fn is_glob(&self) -> bool {
        matches!(self, Name::Glob { .. })
    }

    /// Get the string the name was created from.
    pub fn as_str(&self) -> &str {
        match self {
            Name::Literal(s) => s,
            Name::Glob { pattern, .. } => pattern,
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq for Name {
    /// Two names are equal if they were created from the same string.
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.is_match(other)
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
