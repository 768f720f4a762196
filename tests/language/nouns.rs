//! Integration tests for noun phrases
//!
//! Bracket notation as world authors write it.

use lanthorn_language::{NounError, NounPhrase};

#[test]
fn irregular_and_suffix_plurals() {
    let knife = NounPhrase::parse("kni[fe|ves]").unwrap();
    assert_eq!(knife.singular(), "knife");
    assert_eq!(knife.plural(), "knives");
    assert_eq!(knife.quantity(2), "2 knives");

    let coins = NounPhrase::parse("gold coin[s]").unwrap();
    assert_eq!(coins.indefinite(), "a gold coin");
    assert_eq!(coins.quantity(0), "no gold coins");
}

#[test]
fn article_overrides() {
    let hour = NounPhrase::parse("[an] hour[s]").unwrap();
    assert_eq!(hour.article(), Some("an"));
    assert_eq!(hour.indefinite(), "an hour");

    let water = NounPhrase::parse("[] water").unwrap();
    assert_eq!(water.article(), None);
    assert_eq!(water.indefinite(), "water");
}

#[test]
fn proper_names_stay_put() {
    let gandalf = NounPhrase::parse("Gandalf").unwrap();
    assert!(gandalf.is_proper());
    assert_eq!(gandalf.quantity(1), "Gandalf");
}

#[test]
fn malformed_phrases_are_rejected() {
    assert!(matches!(NounPhrase::parse("lamp[s"), Err(NounError::Unclosed(_))));
    assert!(matches!(NounPhrase::parse("[a|b|c]"), Err(NounError::TooManyAlternatives(_))));
    assert_eq!(NounPhrase::parse_lenient("lamp[s").singular(), "lamp[s");
}
