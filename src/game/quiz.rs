use rand::{Rng, seq::SliceRandom};

use crate::types::Track;

use super::guess::compute_guess;

/// How long each clip plays.
pub const PLAYBACK_LENGTH_MS: u64 = 2000;
/// Extra time granted to the player before pausing, covering playback start.
pub const PLAYBACK_BUFFER_MS: u64 = 250;
pub const DEFAULT_QUESTION_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub track_idx: usize,
    pub start_position_ms: u64,
}

#[derive(Debug, Clone)]
pub enum GuessOutcome<'a> {
    Correct(&'a Track),
    Incorrect { guessed: &'a Track, actual: &'a Track },
    /// Number of titles tied for the best match.
    NotSpecificEnough(usize),
}

/// Picks up to `count` distinct tracks in random order, each with a random
/// clip start that leaves room for a full clip.
pub fn generate_questions<R: Rng>(
    tracks: &[Track],
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut indices: Vec<usize> = (0..tracks.len()).collect();
    indices.shuffle(rng);
    indices.truncate(count);

    indices
        .into_iter()
        .map(|track_idx| {
            let span = tracks[track_idx]
                .duration_ms
                .saturating_sub(PLAYBACK_LENGTH_MS);
            let start_position_ms = if span == 0 {
                0
            } else {
                rng.random_range(0..span)
            };
            Question {
                track_idx,
                start_position_ms,
            }
        })
        .collect()
}

/// A round of questions over one playlist.
pub struct Quiz {
    tracks: Vec<Track>,
    questions: Vec<Question>,
    current: usize,
    answers: Vec<Option<bool>>,
}

impl Quiz {
    pub fn new<R: Rng>(tracks: Vec<Track>, count: usize, rng: &mut R) -> Self {
        let questions = generate_questions(&tracks, count, rng);
        Self::with_questions(tracks, questions)
    }

    /// Questions pointing past the end of `tracks` are dropped.
    pub fn with_questions(tracks: Vec<Track>, mut questions: Vec<Question>) -> Self {
        questions.retain(|q| q.track_idx < tracks.len());
        let answers = vec![None; questions.len()];
        Self {
            tracks,
            questions,
            current: 0,
            answers,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<(&Question, &Track)> {
        let question = self.questions.get(self.current)?;
        Some((question, self.tracks.get(question.track_idx)?))
    }

    /// Matches `text` against every track of the playlist. Only a single best
    /// match counts as an answer; it is recorded for the current question.
    pub fn guess(&mut self, text: &str) -> Option<GuessOutcome<'_>> {
        let actual_idx = self.questions.get(self.current)?.track_idx;
        let actual = self.tracks.get(actual_idx)?;
        let matches = compute_guess(text, &self.tracks);
        if matches.len() != 1 {
            return Some(GuessOutcome::NotSpecificEnough(matches.len()));
        }

        let guessed = matches[0];
        let correct = guessed.id == actual.id;
        self.answers[self.current] = Some(correct);

        Some(if correct {
            GuessOutcome::Correct(guessed)
        } else {
            GuessOutcome::Incorrect { guessed, actual }
        })
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.questions.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn score(&self) -> usize {
        self.answers.iter().filter(|a| **a == Some(true)).count()
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }
}
