use crate::model::{Answer, DrillItem, MultipleChoice};

/// Points awarded for a correct answer under the default policy.
pub const DEFAULT_POINTS_PER_CORRECT: u32 = 100;

//
// ─── VERDICT ───────────────────────────────────────────────────────────────────
//

/// Outcome of scoring one submission.
///
/// `correct` is true only at full credit; tiered items can award points with
/// `correct == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub points: u32,
}

impl Verdict {
    #[must_use]
    pub fn incorrect() -> Self {
        Self {
            correct: false,
            points: 0,
        }
    }
}

//
// ─── SCORING POLICY ────────────────────────────────────────────────────────────
//

/// Pure scoring function over drill items.
///
/// Deterministic and side-effect free: the same item and answer always yield
/// the same verdict. Tier points for graded multiple choice come from the
/// item itself; everything else scores `points_per_correct` or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    points_per_correct: u32,
}

impl ScoringPolicy {
    /// Policy with the standard 100 points per correct answer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            points_per_correct: DEFAULT_POINTS_PER_CORRECT,
        }
    }

    #[must_use]
    pub fn with_points_per_correct(points_per_correct: u32) -> Self {
        Self { points_per_correct }
    }

    #[must_use]
    pub fn points_per_correct(&self) -> u32 {
        self.points_per_correct
    }

    /// Score a submission against an item.
    ///
    /// A submission whose variant does not match the item's kind, or whose
    /// value matches nothing the item knows, scores as incorrect with zero
    /// points rather than failing.
    #[must_use]
    pub fn score(&self, item: &DrillItem, answer: &Answer) -> Verdict {
        match (item, answer) {
            (DrillItem::MultipleChoice(item), Answer::Choice(chosen)) => {
                self.score_choice(item, chosen)
            }
            (DrillItem::FillInBlank(item), Answer::Blank(entry)) => {
                self.binary(entry == item.correct())
            }
            (DrillItem::ReorderPuzzle(item), Answer::Sequence(tokens)) => {
                self.binary(tokens.as_slice() == item.target())
            }
            (DrillItem::Flashcard(_), Answer::Recall(remembered)) => self.binary(*remembered),
            _ => Verdict::incorrect(),
        }
    }

    fn score_choice(&self, item: &MultipleChoice, chosen: &str) -> Verdict {
        let correct = chosen == item.correct();
        if item.is_graded() {
            Verdict {
                correct,
                points: item.tiers().get(chosen).copied().unwrap_or(0),
            }
        } else {
            self.binary(correct)
        }
    }

    fn binary(&self, correct: bool) -> Verdict {
        Verdict {
            correct,
            points: if correct { self.points_per_correct } else { 0 },
        }
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
