//! Game logic: title matching and question rounds. Nothing in here performs
//! I/O; playback and input handling live in the CLI layer.

pub mod guess;
pub mod quiz;

pub use guess::{Titled, compute_guess, guess_distance, normalize};
pub use quiz::{GuessOutcome, Question, Quiz, generate_questions};
