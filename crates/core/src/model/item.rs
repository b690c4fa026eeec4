use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::ItemId;

/// Marker for the gap in a fill-in-the-blank template.
pub const BLANK_MARKER: &str = "____";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("item field must not be empty: {0}")]
    EmptyField(&'static str),

    #[error("multiple choice needs at least 2 options, got {got}")]
    TooFewOptions { got: usize },

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("correct option is not one of the options: {0}")]
    CorrectOptionMissing(String),

    #[error("tier assigned to an unknown option: {0}")]
    TierForUnknownOption(String),

    #[error("the correct option must carry the single highest tier")]
    CorrectNotHighestTier,

    #[error("template must contain exactly one {BLANK_MARKER:?}, found {found}")]
    BadBlankCount { found: usize },

    #[error("duplicate answer bank entry: {0}")]
    DuplicateBankEntry(String),

    #[error("correct answer is not in the answer bank: {0}")]
    AnswerNotInBank(String),

    #[error("reorder target needs at least 2 tokens, got {got}")]
    SequenceTooShort { got: usize },
}

//
// ─── MULTIPLE CHOICE ───────────────────────────────────────────────────────────
//

/// A prompt with a fixed set of options, one of which is correct.
///
/// The graded form attaches a points tier to every option; lessons on keigo
/// use it to give partial credit for answers that are polite but not polite
/// enough. The correct option always carries the single highest tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleChoice {
    id: ItemId,
    prompt: String,
    options: Vec<String>,
    correct: String,
    explanation: String,
    tiers: BTreeMap<String, u32>,
}

impl MultipleChoice {
    /// Create a binary-scored multiple choice item.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` when the prompt is empty, fewer than two options
    /// are given, options repeat, or `correct` is not one of the options.
    pub fn new(
        id: ItemId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Result<Self, ItemError> {
        let prompt = prompt.into();
        let correct = correct.into();

        if prompt.trim().is_empty() {
            return Err(ItemError::EmptyField("prompt"));
        }
        if options.len() < 2 {
            return Err(ItemError::TooFewOptions { got: options.len() });
        }
        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.as_str()) {
                return Err(ItemError::DuplicateOption(option.clone()));
            }
        }
        if !options.contains(&correct) {
            return Err(ItemError::CorrectOptionMissing(correct));
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct,
            explanation: explanation.into(),
            tiers: BTreeMap::new(),
        })
    }

    /// Create a tiered (courtesy-scored) multiple choice item.
    ///
    /// Options are given with their tier points; the option with the highest
    /// tier is the correct one.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` for an empty prompt, fewer than two entries,
    /// repeated options, or a tie for the highest tier.
    pub fn graded(
        id: ItemId,
        prompt: impl Into<String>,
        tiers: Vec<(String, u32)>,
        explanation: impl Into<String>,
    ) -> Result<Self, ItemError> {
        let prompt = prompt.into();

        if prompt.trim().is_empty() {
            return Err(ItemError::EmptyField("prompt"));
        }
        if tiers.len() < 2 {
            return Err(ItemError::TooFewOptions { got: tiers.len() });
        }

        let mut options = Vec::with_capacity(tiers.len());
        let mut tier_map = BTreeMap::new();
        for (option, points) in tiers {
            if tier_map.insert(option.clone(), points).is_some() {
                return Err(ItemError::DuplicateOption(option));
            }
            options.push(option);
        }

        let top = tier_map.values().copied().max().unwrap_or(0);
        let mut at_top = tier_map.iter().filter(|(_, points)| **points == top);
        let correct = match (at_top.next(), at_top.next()) {
            (Some((option, _)), None) => option.clone(),
            _ => return Err(ItemError::CorrectNotHighestTier),
        };

        Ok(Self {
            id,
            prompt,
            options,
            correct,
            explanation: explanation.into(),
            tiers: tier_map,
        })
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options in presentation order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct(&self) -> &str {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Tier points per option; empty for binary-scored items.
    #[must_use]
    pub fn tiers(&self) -> &BTreeMap<String, u32> {
        &self.tiers
    }

    #[must_use]
    pub fn is_graded(&self) -> bool {
        !self.tiers.is_empty()
    }

    /// Reorder the presented options in place.
    ///
    /// The closure must only permute the slice; correctness stays value-based,
    /// so any permutation preserves the item's invariants.
    pub fn permute_options(&mut self, permute: impl FnOnce(&mut [String])) {
        permute(&mut self.options);
    }
}

//
// ─── FILL IN THE BLANK ─────────────────────────────────────────────────────────
//

/// A sentence template with one gap and a bank of candidate answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillInBlank {
    id: ItemId,
    template: String,
    answer_bank: Vec<String>,
    correct: String,
    explanation: String,
}

impl FillInBlank {
    /// # Errors
    ///
    /// Returns `ItemError` when the template does not contain exactly one
    /// blank marker, the bank is empty or repeats entries, or the correct
    /// answer is missing from the bank.
    pub fn new(
        id: ItemId,
        template: impl Into<String>,
        answer_bank: Vec<String>,
        correct: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Result<Self, ItemError> {
        let template = template.into();
        let correct = correct.into();

        let found = template.matches(BLANK_MARKER).count();
        if found != 1 {
            return Err(ItemError::BadBlankCount { found });
        }
        if answer_bank.is_empty() {
            return Err(ItemError::EmptyField("answer_bank"));
        }
        let mut seen = HashSet::new();
        for entry in &answer_bank {
            if !seen.insert(entry.as_str()) {
                return Err(ItemError::DuplicateBankEntry(entry.clone()));
            }
        }
        if !answer_bank.contains(&correct) {
            return Err(ItemError::AnswerNotInBank(correct));
        }

        Ok(Self {
            id,
            template,
            answer_bank,
            correct,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn answer_bank(&self) -> &[String] {
        &self.answer_bank
    }

    #[must_use]
    pub fn correct(&self) -> &str {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Render the template with the given answer in place of the blank.
    #[must_use]
    pub fn fill(&self, answer: &str) -> String {
        self.template.replacen(BLANK_MARKER, answer, 1)
    }
}

//
// ─── REORDER PUZZLE ────────────────────────────────────────────────────────────
//

/// Sentence tokens to be put back in order.
///
/// The scrambled presentation is produced at sampling time; the item itself
/// only stores the target order and its translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPuzzle {
    id: ItemId,
    target: Vec<String>,
    translation: String,
}

impl ReorderPuzzle {
    /// # Errors
    ///
    /// Returns `ItemError::SequenceTooShort` for fewer than two tokens and
    /// `ItemError::EmptyField` for a blank token.
    pub fn new(
        id: ItemId,
        target: Vec<String>,
        translation: impl Into<String>,
    ) -> Result<Self, ItemError> {
        if target.len() < 2 {
            return Err(ItemError::SequenceTooShort { got: target.len() });
        }
        if target.iter().any(|token| token.trim().is_empty()) {
            return Err(ItemError::EmptyField("target token"));
        }

        Ok(Self {
            id,
            target,
            translation: translation.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn target(&self) -> &[String] {
        &self.target
    }

    #[must_use]
    pub fn translation(&self) -> &str {
        &self.translation
    }
}

//
// ─── FLASHCARD ─────────────────────────────────────────────────────────────────
//

/// A front/back pair, optionally with audio keys for either side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    id: ItemId,
    front: String,
    back: String,
    audio_front: Option<String>,
    audio_back: Option<String>,
}

impl Flashcard {
    /// # Errors
    ///
    /// Returns `ItemError::EmptyField` when either side is blank.
    pub fn new(
        id: ItemId,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<Self, ItemError> {
        let front = front.into();
        let back = back.into();

        if front.trim().is_empty() {
            return Err(ItemError::EmptyField("front"));
        }
        if back.trim().is_empty() {
            return Err(ItemError::EmptyField("back"));
        }

        Ok(Self {
            id,
            front,
            back,
            audio_front: None,
            audio_back: None,
        })
    }

    #[must_use]
    pub fn with_audio(
        mut self,
        front_key: impl Into<String>,
        back_key: impl Into<String>,
    ) -> Self {
        self.audio_front = Some(front_key.into());
        self.audio_back = Some(back_key.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }

    #[must_use]
    pub fn audio_front(&self) -> Option<&str> {
        self.audio_front.as_deref()
    }

    #[must_use]
    pub fn audio_back(&self) -> Option<&str> {
        self.audio_back.as_deref()
    }
}

//
// ─── DRILL ITEM ────────────────────────────────────────────────────────────────
//

/// One drillable question unit, in any of the supported forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillItem {
    MultipleChoice(MultipleChoice),
    FillInBlank(FillInBlank),
    ReorderPuzzle(ReorderPuzzle),
    Flashcard(Flashcard),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    MultipleChoice,
    FillInBlank,
    ReorderPuzzle,
    Flashcard,
}

impl DrillItem {
    #[must_use]
    pub fn id(&self) -> &ItemId {
        match self {
            DrillItem::MultipleChoice(item) => item.id(),
            DrillItem::FillInBlank(item) => item.id(),
            DrillItem::ReorderPuzzle(item) => item.id(),
            DrillItem::Flashcard(item) => item.id(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            DrillItem::MultipleChoice(_) => ItemKind::MultipleChoice,
            DrillItem::FillInBlank(_) => ItemKind::FillInBlank,
            DrillItem::ReorderPuzzle(_) => ItemKind::ReorderPuzzle,
            DrillItem::Flashcard(_) => ItemKind::Flashcard,
        }
    }

    /// Text revealed after answering, when the item has one.
    ///
    /// Reorder puzzles reveal their translation; flashcards reveal nothing
    /// beyond their back side.
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        let text = match self {
            DrillItem::MultipleChoice(item) => item.explanation(),
            DrillItem::FillInBlank(item) => item.explanation(),
            DrillItem::ReorderPuzzle(item) => item.translation(),
            DrillItem::Flashcard(_) => return None,
        };
        if text.is_empty() { None } else { Some(text) }
    }
}

impl From<MultipleChoice> for DrillItem {
    fn from(item: MultipleChoice) -> Self {
        DrillItem::MultipleChoice(item)
    }
}

impl From<FillInBlank> for DrillItem {
    fn from(item: FillInBlank) -> Self {
        DrillItem::FillInBlank(item)
    }
}

impl From<ReorderPuzzle> for DrillItem {
    fn from(item: ReorderPuzzle) -> Self {
        DrillItem::ReorderPuzzle(item)
    }
}

impl From<Flashcard> for DrillItem {
    fn from(item: Flashcard) -> Self {
        DrillItem::Flashcard(item)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::MultipleChoice => "multiple choice",
            ItemKind::FillInBlank => "fill in the blank",
            ItemKind::ReorderPuzzle => "reorder puzzle",
            ItemKind::Flashcard => "flashcard",
        };
        write!(f, "{name}")
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    #[test]
    fn multiple_choice_requires_correct_among_options() {
        let err = MultipleChoice::new(
            id("q1"),
            "「おはよう」は？",
            vec!["Buenos días".into(), "Buenas noches".into()],
            "Adiós",
            "",
        )
        .unwrap_err();

        assert!(matches!(err, ItemError::CorrectOptionMissing(_)));
    }

    #[test]
    fn multiple_choice_rejects_single_option() {
        let err = MultipleChoice::new(
            id("q1"),
            "prompt",
            vec!["only".into()],
            "only",
            "",
        )
        .unwrap_err();

        assert!(matches!(err, ItemError::TooFewOptions { got: 1 }));
    }

    #[test]
    fn multiple_choice_rejects_duplicate_options() {
        let err = MultipleChoice::new(
            id("q1"),
            "prompt",
            vec!["a".into(), "a".into(), "b".into()],
            "b",
            "",
        )
        .unwrap_err();

        assert!(matches!(err, ItemError::DuplicateOption(_)));
    }

    #[test]
    fn graded_choice_picks_highest_tier_as_correct() {
        let item = MultipleChoice::graded(
            id("keigo1"),
            "Pide agua a un cliente",
            vec![
                ("水！".into(), 0),
                ("水をください".into(), 1),
                ("お水をいただけますか".into(), 3),
            ],
            "いただけますか es la forma humilde.",
        )
        .unwrap();

        assert!(item.is_graded());
        assert_eq!(item.correct(), "お水をいただけますか");
        assert_eq!(item.tiers().get("水をください"), Some(&1));
    }

    #[test]
    fn graded_choice_rejects_tied_top_tier() {
        let err = MultipleChoice::graded(
            id("keigo2"),
            "prompt",
            vec![("a".into(), 2), ("b".into(), 2)],
            "",
        )
        .unwrap_err();

        assert!(matches!(err, ItemError::CorrectNotHighestTier));
    }

    #[test]
    fn permuting_options_keeps_correct_value() {
        let mut item = MultipleChoice::new(
            id("q1"),
            "prompt",
            vec!["a".into(), "b".into(), "c".into()],
            "b",
            "",
        )
        .unwrap();

        item.permute_options(|options| options.reverse());

        assert_eq!(item.options(), ["c", "b", "a"]);
        assert!(item.options().contains(&item.correct().to_owned()));
    }

    #[test]
    fn fill_in_blank_needs_exactly_one_marker() {
        let none = FillInBlank::new(
            id("f1"),
            "私は学生です",
            vec!["は".into()],
            "は",
            "",
        )
        .unwrap_err();
        assert!(matches!(none, ItemError::BadBlankCount { found: 0 }));

        let two = FillInBlank::new(
            id("f1"),
            "私____学生____",
            vec!["は".into()],
            "は",
            "",
        )
        .unwrap_err();
        assert!(matches!(two, ItemError::BadBlankCount { found: 2 }));
    }

    #[test]
    fn fill_in_blank_fill_replaces_marker() {
        let item = FillInBlank::new(
            id("f1"),
            "私____学生です",
            vec!["は".into(), "を".into()],
            "は",
            "Topic marker.",
        )
        .unwrap();

        assert_eq!(item.fill("は"), "私は学生です");
    }

    #[test]
    fn reorder_puzzle_rejects_short_sequences() {
        let err = ReorderPuzzle::new(id("r1"), vec!["薬を".into()], "").unwrap_err();
        assert!(matches!(err, ItemError::SequenceTooShort { got: 1 }));
    }

    #[test]
    fn flashcard_rejects_blank_sides() {
        let err = Flashcard::new(id("c1"), "  ", "back").unwrap_err();
        assert!(matches!(err, ItemError::EmptyField("front")));
    }

    #[test]
    fn drill_item_explanation_per_kind() {
        let mc: DrillItem = MultipleChoice::new(
            id("q1"),
            "prompt",
            vec!["a".into(), "b".into()],
            "a",
            "Because a.",
        )
        .unwrap()
        .into();
        assert_eq!(mc.explanation(), Some("Because a."));

        let puzzle: DrillItem = ReorderPuzzle::new(
            id("r1"),
            vec!["薬を".into(), "飲まずに".into(), "寝た。".into()],
            "Me dormí sin tomar la medicina.",
        )
        .unwrap()
        .into();
        assert_eq!(puzzle.explanation(), Some("Me dormí sin tomar la medicina."));

        let card: DrillItem = Flashcard::new(id("c1"), "犬", "perro").unwrap().into();
        assert_eq!(card.explanation(), None);
    }
}
