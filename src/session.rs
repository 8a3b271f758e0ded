use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::passage::TextPassage;
use crate::results::TestResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Active,
    Completed,
}

/// Per-position classification of the passage against typed input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharOutcome {
    Correct,
    /// Holds the character that was typed instead
    Incorrect(char),
    /// Next character to type
    Current,
    Pending,
}

/// What a single input event did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Not active; input is dropped
    Ignored,
    /// Shorter than what was already typed; input is dropped
    Rejected,
    Updated,
    /// Input reached the passage length
    Finished,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Active {
        started_at: DateTime<Utc>,
        time_remaining: u32,
    },
    Completed {
        started_at: DateTime<Utc>,
        time_remaining: u32,
        result: TestResult,
    },
}

/// State of one test attempt. Moves idle -> active -> completed exactly
/// once; practising again needs a new `Session`.
#[derive(Debug, Clone)]
pub struct Session {
    passage: TextPassage,
    target: Vec<char>,
    typed: Vec<char>,
    correct: usize,
    errors: usize,
    phase: Phase,
}

impl Session {
    pub fn new(passage: TextPassage) -> Self {
        let target = passage.text.chars().collect();
        Self {
            passage,
            target,
            typed: Vec::new(),
            correct: 0,
            errors: 0,
            phase: Phase::Idle,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.phase {
            Phase::Idle => SessionStatus::Idle,
            Phase::Active { .. } => SessionStatus::Active,
            Phase::Completed { .. } => SessionStatus::Completed,
        }
    }

    pub fn passage(&self) -> &TextPassage {
        &self.passage
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn typed_len(&self) -> usize {
        self.typed.len()
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// `None` before the session starts
    pub fn time_remaining(&self) -> Option<u32> {
        match self.phase {
            Phase::Idle => None,
            Phase::Active { time_remaining, .. } | Phase::Completed { time_remaining, .. } => {
                Some(time_remaining)
            }
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self.phase {
            Phase::Idle => None,
            Phase::Active { started_at, .. } | Phase::Completed { started_at, .. } => {
                Some(started_at)
            }
        }
    }

    pub fn result(&self) -> Option<&TestResult> {
        match &self.phase {
            Phase::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn classify(&self) -> Vec<CharOutcome> {
        classify(&self.typed, &self.target)
    }

    pub(crate) fn begin(&mut self, duration: u32) -> Result<()> {
        let Phase::Idle = self.phase else {
            return Err(self.invalid("start"));
        };
        self.typed.clear();
        self.correct = 0;
        self.errors = 0;
        self.phase = Phase::Active {
            started_at: Utc::now(),
            time_remaining: duration,
        };
        Ok(())
    }

    /// Count down one second. Returns true once time has run out; the
    /// remaining time never drops below zero.
    pub(crate) fn tick(&mut self) -> Result<bool> {
        match &mut self.phase {
            Phase::Active { time_remaining, .. } => {
                *time_remaining = time_remaining.saturating_sub(1);
                Ok(*time_remaining == 0)
            }
            _ => Err(self.invalid("tick")),
        }
    }

    /// Replace the typed text and recompute counts from scratch
    pub(crate) fn accept_input(&mut self, text: &str) -> InputOutcome {
        if self.status() != SessionStatus::Active {
            return InputOutcome::Ignored;
        }
        let typed: Vec<char> = text.chars().collect();
        if typed.len() < self.typed.len() {
            return InputOutcome::Rejected;
        }

        let (correct, errors) = tally(&typed, &self.target);
        self.typed = typed;
        self.correct = correct;
        self.errors = errors;

        if self.typed.len() >= self.target.len() {
            InputOutcome::Finished
        } else {
            InputOutcome::Updated
        }
    }

    pub(crate) fn finish(&mut self, result: TestResult) -> Result<()> {
        match self.phase {
            Phase::Active {
                started_at,
                time_remaining,
            } => {
                self.phase = Phase::Completed {
                    started_at,
                    time_remaining,
                    result,
                };
                Ok(())
            }
            _ => Err(self.invalid("complete")),
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            action,
            status: self.status(),
        }
    }
}

/// Position-by-position comparison. Typed characters beyond the end of
/// the target are errors.
pub fn tally(typed: &[char], target: &[char]) -> (usize, usize) {
    let correct = typed
        .iter()
        .enumerate()
        .filter(|(idx, c)| target.get(*idx) == Some(*c))
        .count();
    (correct, typed.len() - correct)
}

pub fn classify(typed: &[char], target: &[char]) -> Vec<CharOutcome> {
    target
        .iter()
        .enumerate()
        .map(|(idx, expected)| match typed.get(idx) {
            Some(c) if c == expected => CharOutcome::Correct,
            Some(c) => CharOutcome::Incorrect(*c),
            None if idx == typed.len() => CharOutcome::Current,
            None => CharOutcome::Pending,
        })
        .collect()
}
