//! Noun-phrase inflection.
//!
//! A noun phrase is written once and yields its singular, plural, and
//! indefinite article:
//!
//! | literal              | article | singular         | plural            |
//! |----------------------|---------|------------------|-------------------|
//! | `box[es] of dirt`    | a       | box of dirt      | boxes of dirt     |
//! | `sarcophag[us\|i]`   | a       | sarcophagus      | sarcophagi        |
//! | `[an] hour[s]`       | an      | hour             | hours             |
//! | `[] water`           | (none)  | water            | water             |
//! | `Bob`                | (none)  | Bob              | Bob               |
//! | `lantern`            | a       | lantern          | lanterns          |
//!
//! A `[suffix]` group contributes only to the plural; `[sing|plur]`
//! substitutes one alternative for each form. A leading group followed by a
//! space overrides the article. A phrase without brackets that starts with an
//! uppercase letter is a proper noun; any other bracket-free phrase gets a
//! regular English plural of its last word.

use thiserror::Error;

/// Malformed bracket notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NounError {
    /// `[` without a matching `]`.
    #[error("unclosed '[' in noun phrase {0:?}")]
    Unclosed(String),
    /// `]` without a matching `[`.
    #[error("unmatched ']' in noun phrase {0:?}")]
    Unmatched(String),
    /// A group with more than one `|`.
    #[error("too many alternatives in noun phrase {0:?}")]
    TooManyAlternatives(String),
    /// Nothing left once brackets are resolved.
    #[error("empty noun phrase")]
    Empty,
}

/// A parsed noun phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NounPhrase {
    article: Option<String>,
    singular: String,
    plural: String,
    proper: bool,
}

impl NounPhrase {
    /// Parses bracket notation.
    ///
    /// # Errors
    /// Returns an error for unbalanced brackets or a group with several `|`.
    pub fn parse(text: &str) -> Result<Self, NounError> {
        let text = text.trim();
        let (article_override, body) = split_article(text)?;

        let mut singular = String::new();
        let mut plural = String::new();
        let mut inflected = false;
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            match c {
                '[' => {
                    let mut group = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some('[') | None => return Err(NounError::Unclosed(text.into())),
                            Some(c) => group.push(c),
                        }
                    }
                    inflected = true;
                    let mut alternatives = group.split('|');
                    match (alternatives.next(), alternatives.next(), alternatives.next()) {
                        (Some(suffix), None, _) => plural.push_str(suffix),
                        (Some(one), Some(many), None) => {
                            singular.push_str(one);
                            plural.push_str(many);
                        }
                        _ => return Err(NounError::TooManyAlternatives(text.into())),
                    }
                }
                ']' => return Err(NounError::Unmatched(text.into())),
                c => {
                    singular.push(c);
                    plural.push(c);
                }
            }
        }

        if singular.trim().is_empty() {
            return Err(NounError::Empty);
        }

        let proper = !inflected
            && article_override.is_none()
            && singular.chars().next().is_some_and(char::is_uppercase);
        if !inflected && !proper {
            plural = pluralize_last_word(&singular);
        }
        if proper {
            plural.clone_from(&singular);
        }

        let article = match article_override {
            Some(a) if a.is_empty() => None,
            Some(a) => Some(a.to_string()),
            None if proper => None,
            None => Some(default_article(&singular).to_string()),
        };

        Ok(Self {
            article,
            singular,
            plural,
            proper,
        })
    }

    /// Parses bracket notation, treating malformed input as a plain phrase.
    ///
    /// Names come from world data; a stray bracket should still print.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|_| {
            let singular = text.trim().to_string();
            Self {
                article: Some(default_article(&singular).to_string()),
                plural: pluralize_last_word(&singular),
                singular,
                proper: false,
            }
        })
    }

    /// The singular form.
    #[must_use]
    pub fn singular(&self) -> &str {
        &self.singular
    }

    /// The plural form.
    #[must_use]
    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// The indefinite article, if the phrase takes one.
    #[must_use]
    pub fn article(&self) -> Option<&str> {
        self.article.as_deref()
    }

    /// True for proper nouns (capitalized, bracket-free).
    #[must_use]
    pub fn is_proper(&self) -> bool {
        self.proper
    }

    /// The singular with its article: "a box of dirt", "Bob".
    #[must_use]
    pub fn indefinite(&self) -> String {
        match &self.article {
            Some(article) => format!("{article} {}", self.singular),
            None => self.singular.clone(),
        }
    }

    /// A counted phrase: "no boxes of dirt", "a box of dirt", "3 boxes of dirt".
    #[must_use]
    pub fn quantity(&self, count: i64) -> String {
        match count {
            0 => format!("no {}", self.plural),
            1 => self.indefinite(),
            n => format!("{n} {}", self.plural),
        }
    }
}

/// Splits a leading `[article] ` group from the body.
fn split_article(text: &str) -> Result<(Option<&str>, &str), NounError> {
    if let Some(rest) = text.strip_prefix('[') {
        let close = rest.find(']').ok_or_else(|| NounError::Unclosed(text.into()))?;
        let group = &rest[..close];
        let after = &rest[close + 1..];
        if !group.contains('|') && !group.contains('[') && after.starts_with(' ') {
            return Ok((Some(group), after.trim_start()));
        }
    }
    Ok((None, text))
}

fn default_article(singular: &str) -> &'static str {
    match singular.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Regular English plural of the last word.
fn pluralize_last_word(phrase: &str) -> String {
    let split = phrase.rfind(' ').map_or(0, |i| i + 1);
    let (head, word) = phrase.split_at(split);
    let lower = word.to_lowercase();

    let plural = if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{word}es")
    } else if lower.ends_with('y')
        && !lower
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
        && lower.len() > 1
    {
        format!("{}ies", &word[..word.len() - 1])
    } else {
        format!("{word}s")
    };
    format!("{head}{plural}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forms(text: &str) -> (Option<String>, String, String) {
        let n = NounPhrase::parse(text).unwrap();
        (
            n.article().map(str::to_string),
            n.singular().to_string(),
            n.plural().to_string(),
        )
    }

    #[test]
    fn suffix_applies_to_plural_only() {
        assert_eq!(
            forms("box[es] of dirt"),
            (Some("a".into()), "box of dirt".into(), "boxes of dirt".into())
        );
    }

    #[test]
    fn alternatives_substitute() {
        assert_eq!(
            forms("sarcophag[us|i]"),
            (Some("a".into()), "sarcophagus".into(), "sarcophagi".into())
        );
        assert_eq!(forms("[ox|oxen]").2, "oxen");
    }

    #[test]
    fn proper_noun_has_no_article_or_plural() {
        let bob = NounPhrase::parse("Bob").unwrap();
        assert_eq!(bob.article(), None);
        assert_eq!(bob.singular(), "Bob");
        assert_eq!(bob.plural(), "Bob");
        assert!(bob.is_proper());
        assert_eq!(bob.indefinite(), "Bob");
    }

    #[test]
    fn article_override() {
        assert_eq!(
            forms("[an] hour[s]"),
            (Some("an".into()), "hour".into(), "hours".into())
        );
        assert_eq!(forms("[] water"), (None, "water".into(), "waters".into()));
        assert_eq!(forms("[some] Elven bread").1, "Elven bread");
    }

    #[test]
    fn default_article_follows_first_letter() {
        assert_eq!(forms("apple").0.as_deref(), Some("an"));
        assert_eq!(forms("lantern").0.as_deref(), Some("a"));
        assert_eq!(forms("Iron Key[s]").0.as_deref(), Some("an"));
    }

    #[test]
    fn regular_plurals() {
        assert_eq!(forms("lantern").2, "lanterns");
        assert_eq!(forms("brass torch").2, "brass torches");
        assert_eq!(forms("pony").2, "ponies");
        assert_eq!(forms("key").2, "keys");
        assert_eq!(forms("fox").2, "foxes");
    }

    #[test]
    fn indefinite_and_quantity() {
        let n = NounPhrase::parse("box[es] of dirt").unwrap();
        assert_eq!(n.indefinite(), "a box of dirt");
        assert_eq!(n.quantity(0), "no boxes of dirt");
        assert_eq!(n.quantity(1), "a box of dirt");
        assert_eq!(n.quantity(3), "3 boxes of dirt");
    }

    #[test]
    fn malformed_brackets() {
        assert!(matches!(NounPhrase::parse("box[es"), Err(NounError::Unclosed(_))));
        assert!(matches!(NounPhrase::parse("box]"), Err(NounError::Unmatched(_))));
        assert!(matches!(
            NounPhrase::parse("a[b|c|d]"),
            Err(NounError::TooManyAlternatives(_))
        ));
        assert_eq!(NounPhrase::parse_lenient("box[es").singular(), "box[es");
    }
}
