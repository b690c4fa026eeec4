use rand::Rng;
use rand::seq::SliceRandom;

use renshu_core::model::{DrillItem, ItemPool, ReorderPuzzle};

const MAX_SCRAMBLE_ATTEMPTS: usize = 16;

/// Sample `n` items from a pool without replacement.
///
/// The pool is shuffled uniformly (Fisher-Yates) before taking the first `n`
/// items, so no position in the authored order is favored. Asking for more
/// items than the pool holds silently caps at a shuffled copy of the full
/// pool; `n == 0` yields an empty selection.
///
/// Multiple choice items get their option order reshuffled per sampling so
/// the correct option never sits at a fixed position. Correctness stays
/// value-based, so the shuffle cannot invalidate an item.
pub fn sample_items<R: Rng + ?Sized>(rng: &mut R, pool: &ItemPool, n: usize) -> Vec<DrillItem> {
    let mut items: Vec<DrillItem> = pool.items().to_vec();
    items.shuffle(rng);
    items.truncate(n);

    for item in &mut items {
        if let DrillItem::MultipleChoice(choice) = item {
            choice.permute_options(|options| options.shuffle(rng));
        }
    }

    items
}

/// Sample with the thread-local generator.
#[must_use]
pub fn sample(pool: &ItemPool, n: usize) -> Vec<DrillItem> {
    sample_items(&mut rand::rng(), pool, n)
}

/// Scrambled presentation order for a reorder puzzle.
///
/// Returns a permutation of the target sequence that differs from it whenever
/// a differing permutation exists. A shuffle that lands on the target order
/// is retried a bounded number of times, then nudged by rotation; only a
/// sequence whose tokens are all identical comes back in target order.
pub fn scramble<R: Rng + ?Sized>(rng: &mut R, puzzle: &ReorderPuzzle) -> Vec<String> {
    let target = puzzle.target();
    let mut tokens = target.to_vec();

    if tokens.iter().all(|token| token == &tokens[0]) {
        return tokens;
    }

    for _ in 0..MAX_SCRAMBLE_ATTEMPTS {
        tokens.shuffle(rng);
        if tokens != target {
            return tokens;
        }
    }

    // A left rotation differs from the original unless every token is equal,
    // and that case was handled above.
    tokens.rotate_left(1);
    tokens
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
