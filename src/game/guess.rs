//! Scores free-text guesses against track titles.
//!
//! The metric answers "is the guess a plausible fragment of this title": the
//! guess may start anywhere in the title and whatever follows the matched
//! part is free, while every guess character that cannot be matched costs 1.

use crate::types::Track;

/// Anything that can be guessed by its title.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Titled for str {
    fn title(&self) -> &str {
        self
    }
}

impl Titled for String {
    fn title(&self) -> &str {
        self
    }
}

impl Titled for Track {
    fn title(&self) -> &str {
        &self.name
    }
}

impl<T: Titled + ?Sized> Titled for &T {
    fn title(&self) -> &str {
        (**self).title()
    }
}

/// Lower-cases and strips all whitespace.
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Distance between `guess` and `title` after normalizing both.
pub fn guess_distance(guess: &str, title: &str) -> usize {
    let guess: Vec<char> = normalize(guess).chars().collect();
    let title: Vec<char> = normalize(title).chars().collect();
    anchored_distance(&guess, &title)
}

/// Returns every candidate tied for the lowest distance to `guess`, in input
/// order. Empty only when `candidates` is.
pub fn compute_guess<'a, C: Titled>(guess: &str, candidates: &'a [C]) -> Vec<&'a C> {
    let normalized: Vec<char> = normalize(guess).chars().collect();
    let mut best: Vec<&C> = Vec::new();
    let mut lowest = usize::MAX;

    for candidate in candidates {
        let title: Vec<char> = normalize(candidate.title()).chars().collect();
        let distance = anchored_distance(&normalized, &title);
        if distance < lowest {
            lowest = distance;
            best.clear();
            best.push(candidate);
        } else if distance == lowest {
            best.push(candidate);
        }
    }

    best
}

/// Bottom-up table over `(guess position, title position)`; cell `(i, j)`
/// is the cost of consuming `guess[i..]` against `title[j..]`.
fn anchored_distance(guess: &[char], title: &[char]) -> usize {
    let n = guess.len();
    let m = title.len();
    let width = m + 1;
    let mut table = vec![0usize; (n + 1) * width];
    let at = |i: usize, j: usize| i * width + j;

    // row n stays 0: the rest of the title is free once the guess is used up
    for i in 0..n {
        table[at(i, m)] = n - i;
    }

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            let mut cost = if guess[i] == title[j] {
                table[at(i + 1, j + 1)]
            } else {
                1 + table[at(i, j + 1)]
                    .min(table[at(i + 1, j)])
                    .min(table[at(i + 1, j + 1)])
            };
            // the guess may begin at any offset of the title
            if i == 0 {
                cost = cost.min(table[at(0, j + 1)]);
            }
            table[at(i, j)] = cost;
        }
    }

    table[at(0, 0)]
}
