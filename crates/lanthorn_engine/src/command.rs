//! Player command input.
//!
//! A command line is tokenized, its first word looked up as a verb, and the
//! remaining words resolved as a noun phrase against what the actor can
//! reach. The verb's event is then dispatched on the resolved target.

use std::collections::HashMap;

use lanthorn_foundation::{EntityId, Result};
use lanthorn_storage::Value;
use tracing::{debug, instrument, warn};

use crate::defaults::capitalize;
use crate::update::Update;
use crate::world::World;

// =============================================================================
// Tokenizing
// =============================================================================

/// A token of player input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputToken {
    /// A lowercased word with punctuation removed.
    Word(String),
    /// A double-quoted run, kept as typed.
    Quoted(String),
}

impl InputToken {
    /// The token's text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Word(s) | Self::Quoted(s) => s,
        }
    }
}

/// Splits player input into tokens.
///
/// Words are lowercased and stripped of punctuation; text inside double
/// quotes is kept as one token, case and punctuation intact.
#[must_use]
pub fn tokenize(input: &str) -> Vec<InputToken> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut chars = input.chars();

    let flush = |word: &mut String, tokens: &mut Vec<InputToken>| {
        if !word.is_empty() {
            tokens.push(InputToken::Word(word.to_lowercase()));
            word.clear();
        }
    };

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                flush(&mut word, &mut tokens);
                let quoted: String = chars.by_ref().take_while(|&c| c != '"').collect();
                tokens.push(InputToken::Quoted(quoted));
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            '.' | ',' | '!' | '?' | ';' | ':' | '\'' => {}
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// Expands a direction word or abbreviation to its full name.
#[must_use]
pub fn normalize_direction(word: &str) -> Option<&'static str> {
    match word.to_ascii_lowercase().as_str() {
        "north" | "n" => Some("north"),
        "south" | "s" => Some("south"),
        "east" | "e" => Some("east"),
        "west" | "w" => Some("west"),
        "northeast" | "ne" => Some("northeast"),
        "northwest" | "nw" => Some("northwest"),
        "southeast" | "se" => Some("southeast"),
        "southwest" | "sw" => Some("southwest"),
        "up" | "u" => Some("up"),
        "down" | "d" => Some("down"),
        _ => None,
    }
}

/// The direction names bound as global constants.
pub const DIRECTIONS: [&str; 10] = [
    "north",
    "south",
    "east",
    "west",
    "northeast",
    "northwest",
    "southeast",
    "southwest",
    "up",
    "down",
];

fn ordinal(word: &str) -> Option<usize> {
    const ORDINALS: [&str; 10] = [
        "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
    ];
    ORDINALS.iter().position(|&o| o == word).map(|i| i + 1)
}

// =============================================================================
// Verb table
// =============================================================================

/// Whether a verb takes a noun phrase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NounMode {
    /// `take lamp`; a bare `take` asks "Take what?".
    Required,
    /// `look` or `look lamp`; without a noun the actor is the target.
    Optional,
    /// `inventory`; any words are passed through as text.
    None,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CommandSpec {
    pub(crate) event: String,
    pub(crate) noun: NounMode,
}

/// Verb to event mapping.
#[derive(Clone, Debug, Default)]
pub(crate) struct CommandTable {
    verbs: HashMap<String, CommandSpec>,
}

impl CommandTable {
    /// The standard verbs.
    pub(crate) fn with_builtins() -> Self {
        let mut table = Self::default();
        let builtins: [(&[&str], &str, NounMode); 5] = [
            (&["look", "l", "examine", "x"], "look", NounMode::Optional),
            (&["go", "walk"], "go", NounMode::None),
            (&["take", "get"], "take", NounMode::Required),
            (&["drop"], "drop", NounMode::Required),
            (&["inventory", "inv", "i"], "inventory", NounMode::None),
        ];
        for (verbs, event, noun) in builtins {
            for verb in verbs {
                table.register(verb, event, noun);
            }
        }
        table
    }

    pub(crate) fn register(&mut self, verb: &str, event: &str, noun: NounMode) {
        self.verbs.insert(
            verb.to_lowercase(),
            CommandSpec {
                event: event.to_string(),
                noun,
            },
        );
    }

    pub(crate) fn get(&self, verb: &str) -> Option<&CommandSpec> {
        self.verbs.get(verb)
    }

    pub(crate) fn len(&self) -> usize {
        self.verbs.len()
    }

    pub(crate) fn verbs(&self) -> Vec<String> {
        let mut verbs: Vec<String> = self.verbs.keys().cloned().collect();
        verbs.sort();
        verbs
    }
}

// =============================================================================
// Noun resolution
// =============================================================================

/// Result of matching a noun phrase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NounResolution {
    Unique(EntityId),
    Ambiguous(Vec<EntityId>),
    NotFound,
}

const ARTICLES: [&str; 3] = ["the", "a", "an"];

impl World {
    /// Adds the verbs of a `command` declaration.
    ///
    /// The command's identifier is always a verb; a `verbs` list adds more.
    /// `noun = false` makes it take no noun, `noun = true` requires one.
    pub(crate) fn register_command(&mut self, id: EntityId) {
        let event = self.registry.name_of(id);
        let noun = match self.registry.lookup_member(id, "noun") {
            Some(Value::Bool(false)) => NounMode::None,
            Some(Value::Bool(true)) => NounMode::Required,
            _ => NounMode::Optional,
        };
        let mut verbs = vec![event.clone()];
        if let Some(Value::List(list)) = self.registry.lookup_member(id, "verbs") {
            verbs.extend(list.iter().filter_map(Value::as_text).map(str::to_string));
        }
        for verb in &verbs {
            self.commands.register(verb, &event, noun);
        }
        debug!(command = %event, verbs = verbs.len(), "command registered");
    }

    /// Entities a noun phrase may refer to, in match priority order.
    fn noun_candidates(&self, actor: EntityId) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self
            .registry
            .get(actor)
            .map(|e| e.contents().to_vec())
            .unwrap_or_default();
        if let Some(here) = self.enclosing_location(actor) {
            if let Some(place) = self.registry.get(here) {
                out.extend(place.contents().iter().copied().filter(|&id| id != actor));
            }
            out.push(here);
        }
        out
    }

    fn noun_names(&self, id: EntityId) -> (String, Vec<String>) {
        let singular = match self.registry.get_member(id, "singular") {
            Ok(Value::Text(s)) => s.to_lowercase(),
            _ => self.registry.name_of(id).to_lowercase(),
        };
        let aliases = match self.registry.lookup_member(id, "aliases") {
            Some(Value::List(list)) => list
                .iter()
                .filter_map(Value::as_text)
                .map(str::to_lowercase)
                .collect(),
            _ => Vec::new(),
        };
        (singular, aliases)
    }

    /// Resolves the words after a verb to one entity.
    ///
    /// Candidates are tried by exact singular name, then by `aliases`, then
    /// by word prefixes; the first phase with any match decides. A leading
    /// ordinal ("second lamp") picks among several matches.
    pub(crate) fn resolve_noun(&self, actor: EntityId, words: &[String]) -> NounResolution {
        let mut words: Vec<&str> = words.iter().map(String::as_str).collect();
        if words.first().is_some_and(|w| ARTICLES.contains(w)) {
            words.remove(0);
        }
        let pick = words.first().and_then(|w| ordinal(w));
        if pick.is_some() {
            words.remove(0);
        }
        match words.as_slice() {
            [] => return NounResolution::NotFound,
            ["me" | "myself" | "self"] => return NounResolution::Unique(actor),
            ["here" | "room"] => {
                return self
                    .enclosing_location(actor)
                    .map_or(NounResolution::NotFound, NounResolution::Unique);
            }
            _ => {}
        }
        let phrase = words.join(" ");

        let mut candidates = self.noun_candidates(actor);
        let mut seen = Vec::new();
        candidates.retain(|id| {
            let fresh = !seen.contains(id);
            seen.push(*id);
            fresh
        });
        let named: Vec<(EntityId, String, Vec<String>)> = candidates
            .into_iter()
            .map(|id| {
                let (singular, aliases) = self.noun_names(id);
                (id, singular, aliases)
            })
            .collect();

        let exact: Vec<EntityId> = named
            .iter()
            .filter(|(_, singular, _)| *singular == phrase)
            .map(|(id, ..)| *id)
            .collect();
        let matches = if exact.is_empty() {
            let aliased: Vec<EntityId> = named
                .iter()
                .filter(|(_, _, aliases)| aliases.iter().any(|a| *a == phrase))
                .map(|(id, ..)| *id)
                .collect();
            if aliased.is_empty() {
                named
                    .iter()
                    .filter(|(_, singular, aliases)| {
                        std::iter::once(singular)
                            .chain(aliases.iter())
                            .any(|name| prefix_match(name, &words))
                    })
                    .map(|(id, ..)| *id)
                    .collect()
            } else {
                aliased
            }
        } else {
            exact
        };

        match (matches.as_slice(), pick) {
            ([], _) => NounResolution::NotFound,
            (_, Some(n)) => matches
                .get(n - 1)
                .copied()
                .map_or(NounResolution::NotFound, NounResolution::Unique),
            ([one], None) => NounResolution::Unique(*one),
            (_, None) => NounResolution::Ambiguous(matches),
        }
    }

    /// Parses and runs one line of player input for `actor`.
    ///
    /// Unknown verbs and unresolvable nouns are answered with a message to
    /// the actor; a script fault becomes an [`Update::Fault`]. Either way the
    /// updates produced so far are returned.
    ///
    /// # Errors
    /// Returns `EntityNotFound` only if `actor` does not resolve.
    #[instrument(skip_all, fields(actor = %actor, input = text))]
    pub fn submit_command(&mut self, actor: EntityId, text: &str) -> Result<Vec<Update>> {
        self.registry.validate(actor)?;
        self.begin_run();

        let words: Vec<String> = tokenize(text).iter().map(|t| t.text().to_string()).collect();
        if let Some((verb, rest)) = words.split_first() {
            if let Err(error) = self.run_command(actor, verb, rest) {
                let message = self.fault_message(&error);
                warn!(actor = %self.registry.name_of(actor), input = text, error = %message, "command faulted");
                self.emit(Update::Fault {
                    task: None,
                    actor: Some(actor),
                    message,
                });
            }
        }
        Ok(self.take_updates())
    }

    fn run_command(&mut self, actor: EntityId, verb: &str, rest: &[String]) -> Result<()> {
        if rest.is_empty() {
            if let Some(direction) = normalize_direction(verb) {
                let direction = Value::Symbol(self.registry.intern(direction));
                self.dispatch_event("go", actor, Some(actor), vec![Value::Entity(actor), direction])?;
                return Ok(());
            }
        }

        let Some(spec) = self.commands.get(verb).cloned() else {
            self.tell(actor, format!("I don't understand \"{verb}\"."));
            return Ok(());
        };
        let rest_text = if rest.is_empty() {
            Value::Nil
        } else {
            Value::text(rest.join(" "))
        };

        let (target, argument) = match spec.noun {
            NounMode::None => {
                let argument = match rest {
                    [word] if normalize_direction(word).is_some() => {
                        let direction = normalize_direction(word).unwrap_or(word);
                        Value::Symbol(self.registry.intern(direction))
                    }
                    _ => rest_text,
                };
                (actor, argument)
            }
            NounMode::Required if rest.is_empty() => {
                self.tell(actor, format!("{} what?", capitalize(verb)));
                return Ok(());
            }
            NounMode::Optional if rest.is_empty() => (actor, rest_text),
            NounMode::Required | NounMode::Optional => {
                let phrase = rest.join(" ");
                match self.resolve_noun(actor, rest) {
                    NounResolution::Unique(target) => (target, rest_text),
                    NounResolution::NotFound => {
                        self.tell(actor, format!("You don't see any {phrase} here."));
                        return Ok(());
                    }
                    NounResolution::Ambiguous(_) => {
                        self.tell(actor, format!("Which {phrase} do you mean?"));
                        return Ok(());
                    }
                }
            }
        };

        self.dispatch_event(&spec.event, target, Some(actor), vec![Value::Entity(actor), argument])?;
        Ok(())
    }

    fn tell(&mut self, to: EntityId, text: String) {
        self.emit(Update::Message { to, text });
    }
}

/// True if every word of `words` starts some word of `name`.
fn prefix_match(name: &str, words: &[&str]) -> bool {
    words
        .iter()
        .all(|w| name.split_whitespace().any(|part| part.starts_with(w)))
}
