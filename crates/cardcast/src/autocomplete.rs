//! Prefix autocomplete over a fixed suggestion corpus.
//!
//! Filtering is a pure, order-preserving, case-insensitive prefix match: no
//! ranking, no fuzzy matching, no deduplication. The filtered list is
//! recomputed from scratch on every input change, which also resets the
//! highlight.
//!
//! Keyboard navigation is deliberately asymmetric: Down stops at the last
//! suggestion, Up wraps from the first suggestion to the last, and Up with
//! nothing highlighted does nothing.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

/// Opening emphasis marker around the matched prefix.
pub const EMPHASIS_OPEN: &str = "<strong>";
/// Closing emphasis marker around the matched prefix.
pub const EMPHASIS_CLOSE: &str = "</strong>";

/// Prompt ideas offered when no corpus file is given.
const BUILTIN_CORPUS: &[&str] = &[
    "Pikachu",
    "Bulbasaur",
    "Squirtle",
    "Charmander",
    "Morpeko",
    "Bidoof",
    "Dedenne",
    "Articuno",
    "Zapdos",
    "Moltres",
    "Charizard",
    "Pichu",
    "Pidgey",
    "Jigglypuff",
    "Snorlax",
    "Mewtwo",
    "A cute cat made of clouds",
    "A fire-breathing dragon",
    "A robot made of lego",
    "A rock star gecko",
    "An angry ghost wizard",
    "An ice cream sandwich monster",
    "Baby Yoda",
    "Bugs Bunny",
    "Cookie Monster",
    "Darth Vader",
    "Donald Duck",
    "Elmo",
    "Garfield",
    "Homer Simpson",
    "Kermit the Frog",
    "Mickey Mouse",
    "Shrek",
    "SpongeBob",
    "Super Mario",
    "Yoshi",
];

// ── Corpus ─────────────────────────────────────────────────────────

/// Immutable, ordered suggestion list loaded once at startup.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct Corpus(Arc<[String]>);

impl Corpus {
    pub fn new<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Corpus(entries.into_iter().map(Into::into).collect())
    }

    /// The built-in list of prompt ideas.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_CORPUS.iter().copied())
    }

    /// Parse one entry per line. Surrounding whitespace is trimmed and blank
    /// lines are skipped; order and duplicates are kept.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    /// Load a corpus file (see [`parse`](Self::parse)).
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read corpus file '{}': {e}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Suggestion ─────────────────────────────────────────────────────

/// A corpus entry that matched the current input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// Original-case corpus entry.
    pub text: String,
    /// Byte length of the emphasized prefix of `text`.
    pub matched: usize,
}

impl Suggestion {
    /// The emphasized prefix.
    pub fn matched_part(&self) -> &str {
        self.text.get(..self.matched).unwrap_or_default()
    }

    /// Everything after the emphasized prefix.
    pub fn rest(&self) -> &str {
        self.text.get(self.matched..).unwrap_or(&self.text)
    }

    /// Render with the matched prefix wrapped in emphasis markers,
    /// e.g. `<strong>Pik</strong>achu`.
    pub fn markup(&self) -> String {
        format!(
            "{EMPHASIS_OPEN}{}{EMPHASIS_CLOSE}{}",
            self.matched_part(),
            self.rest()
        )
    }
}

/// Remove emphasis markers from rendered suggestion text.
pub fn strip_markup(raw: &str) -> String {
    raw.replace(EMPHASIS_OPEN, "").replace(EMPHASIS_CLOSE, "")
}

/// Match `input` against every corpus entry, in corpus order.
///
/// An entry matches when its lowercase form starts with the lowercase input.
/// The first `input.chars().count()` characters of the original entry are
/// marked as the matched prefix. Empty input matches nothing.
pub fn filter(corpus: &Corpus, input: &str) -> Vec<Suggestion> {
    if input.is_empty() {
        return Vec::new();
    }
    let needle = input.to_lowercase();
    let width = input.chars().count();
    corpus
        .entries()
        .iter()
        .filter(|entry| entry.to_lowercase().starts_with(&needle))
        .map(|entry| Suggestion {
            text: entry.clone(),
            matched: entry
                .char_indices()
                .nth(width)
                .map_or(entry.len(), |(i, _)| i),
        })
        .collect()
}

// ── Navigation ─────────────────────────────────────────────────────

/// Arrow key direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Filtered suggestions plus a highlight cursor.
#[derive(Clone, Debug)]
pub struct Autocomplete {
    corpus: Corpus,
    suggestions: Vec<Suggestion>,
    highlight: Option<usize>,
}

impl Autocomplete {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            corpus,
            suggestions: Vec::new(),
            highlight: None,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Current filtered suggestions, in corpus order.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Highlighted index, always a valid index into
    /// [`suggestions`](Self::suggestions) when set.
    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    pub fn highlighted(&self) -> Option<&Suggestion> {
        self.highlight.and_then(|i| self.suggestions.get(i))
    }

    /// Recompute suggestions for `value` and clear the highlight.
    pub fn on_input_changed(&mut self, value: &str) {
        self.suggestions = filter(&self.corpus, value);
        self.highlight = None;
    }

    /// Move the highlight by one.
    pub fn on_arrow_key(&mut self, direction: Direction) {
        let len = self.suggestions.len();
        if len == 0 {
            self.highlight = None;
            return;
        }
        self.highlight = match (direction, self.highlight) {
            (Direction::Down, None) => Some(0),
            (Direction::Down, Some(i)) if i + 1 < len => Some(i + 1),
            (Direction::Down, Some(i)) => Some(i.min(len - 1)),
            (Direction::Up, None) => None,
            (Direction::Up, Some(0)) => Some(len - 1),
            (Direction::Up, Some(i)) => Some(i.min(len) - 1),
        };
    }

    /// The highlighted suggestion's plain text, clearing the list, or `None`
    /// when nothing is highlighted (the list is then left as is).
    pub fn take_highlighted(&mut self) -> Option<String> {
        let text = self.highlighted()?.text.clone();
        self.clear();
        Some(text)
    }

    /// Drop all suggestions and the highlight.
    pub fn clear(&mut self) {
        self.suggestions.clear();
        self.highlight = None;
    }
}
