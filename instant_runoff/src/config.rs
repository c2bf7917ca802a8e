// ********* Public data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// The outcome of one election.
///
/// A tabulation always completes with a `Winner`: the two sentinel variants
/// describe legitimate election outcomes, not software faults.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Winner {
    /// A real candidate reached a majority or survived every elimination.
    Candidate(String),
    /// The surviving candidate did not gather more than half of all ballots
    /// cast, and exhausted ballots count against them.
    NoConfidence,
    /// The bottom tier could not be separated by any preference rank.
    UnbreakableTie,
}

impl Winner {
    pub fn as_candidate(&self) -> Option<&str> {
        match self {
            Winner::Candidate(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Candidate(name) => write!(f, "{}", name),
            Winner::NoConfidence => write!(f, "No Confidence"),
            Winner::UnbreakableTie => write!(f, "Unbreakable Tie"),
        }
    }
}

/// The audit artifact for one round: the round tally merged with the
/// candidate(s) removed at the end of the round, keyed by candidate name.
///
/// A `BTreeMap` keeps the records independent of any hash iteration order.
pub type RoundRecord = BTreeMap<String, u64>;

// ********* Options **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ElectionOptions {
    /// Whether a candidate left standing at the end always wins.
    /// With the default of `false`, exhausted ballots are counted as votes of
    /// no confidence: the survivor still needs more than half of all ballots
    /// cast.
    pub remove_exhausted_ballots: bool,
}

impl ElectionOptions {
    pub const DEFAULT_OPTIONS: ElectionOptions = ElectionOptions {
        remove_exhausted_ballots: false,
    };
}

impl Default for ElectionOptions {
    fn default() -> ElectionOptions {
        ElectionOptions::DEFAULT_OPTIONS
    }
}

// ********* Errors **********

/// Errors raised while constructing a [crate::BallotStore].
///
/// These are fatal to the construction: a store is validated eagerly and an
/// invalid ballot set never reaches the tabulation engine.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ValidationError {
    /// The same candidate appears more than once within a single ballot.
    DuplicateCandidate { name: String },
    /// A ranking entry is the empty string.
    EmptyCandidateName,
}

impl Error for ValidationError {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::DuplicateCandidate { name } => {
                write!(f, "duplicate candidate {:?} within a single ballot", name)
            }
            ValidationError::EmptyCandidateName => {
                write!(f, "empty candidate name in a ballot")
            }
        }
    }
}
