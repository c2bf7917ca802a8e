use std::collections::BTreeSet;

use crate::config::ValidationError;

/// An immutable, validated collection of ranked ballots for one election.
///
/// Each ballot lists candidate names from most- to least-preferred. A ballot
/// may rank only part of the field or nothing at all; both are legitimate.
/// The candidate universe is the union of all names appearing on any ballot
/// and is fixed at construction.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotStore {
    votes: Vec<Vec<String>>,
    candidates: BTreeSet<String>,
}

impl BallotStore {
    /// Validates the ballots eagerly and builds the store.
    ///
    /// Fails on a candidate repeated within a single ballot, or on an
    /// empty-string candidate name.
    pub fn new(votes: Vec<Vec<String>>) -> Result<BallotStore, ValidationError> {
        for ballot in votes.iter() {
            let mut seen: BTreeSet<&str> = BTreeSet::new();
            for candidate in ballot.iter() {
                if candidate.is_empty() {
                    return Err(ValidationError::EmptyCandidateName);
                }
                if !seen.insert(candidate.as_str()) {
                    return Err(ValidationError::DuplicateCandidate {
                        name: candidate.clone(),
                    });
                }
            }
        }
        let candidates: BTreeSet<String> = votes.iter().flatten().cloned().collect();
        Ok(BallotStore { votes, candidates })
    }

    /// The candidate universe, computed once at construction.
    pub fn candidates(&self) -> &BTreeSet<String> {
        &self.candidates
    }

    pub fn ballots(&self) -> &[Vec<String>] {
        &self.votes
    }

    /// Total number of ballots cast, empty ballots included.
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Number of ballots whose `rank`-th preference (1-indexed) is
    /// `candidate`. Ballots shorter than `rank` do not count. This looks at
    /// the original preference order, before any elimination.
    pub fn appearances_at_rank(&self, candidate: &str, rank: usize) -> u64 {
        if rank == 0 {
            return 0;
        }
        self.votes
            .iter()
            .filter(|ballot| ballot.get(rank - 1).map(String::as_str) == Some(candidate))
            .count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationError;

    #[test]
    fn valid_ballots_are_kept_in_order() {
        let ballots = vec![
            vec!["Norm".to_string(), "Normie".to_string(), "Norman".to_string()],
            vec!["Norm".to_string(), "Normie".to_string()],
            vec!["Norman".to_string(), "Norm".to_string(), "Normie".to_string()],
        ];
        let store = BallotStore::new(ballots.clone()).unwrap();
        assert_eq!(store.ballots(), ballots.as_slice());
        assert_eq!(store.len(), 3);
        let names: Vec<&str> = store.candidates().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["Norm", "Norman", "Normie"]);
    }

    #[test]
    fn duplicate_within_one_ballot_fails() {
        let ballots = vec![
            vec!["Norm".to_string(), "Normie".to_string()],
            vec!["Normie".to_string(), "Normie".to_string()],
        ];
        assert_eq!(
            BallotStore::new(ballots),
            Err(ValidationError::DuplicateCandidate {
                name: "Normie".to_string()
            })
        );
    }

    #[test]
    fn empty_candidate_name_fails() {
        let ballots = vec![vec!["Norm".to_string(), "".to_string()]];
        assert_eq!(
            BallotStore::new(ballots),
            Err(ValidationError::EmptyCandidateName)
        );
    }

    #[test]
    fn empty_ballots_are_allowed() {
        let store = BallotStore::new(vec![vec![], vec![]]).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.candidates().is_empty());
    }

    #[test]
    fn appearances_at_rank_counts_original_preferences() {
        let store = BallotStore::new(vec![
            vec!["Norm".to_string(), "Normie".to_string(), "Norman".to_string()],
            vec!["Norm".to_string(), "Normie".to_string()],
            vec!["Norman".to_string(), "Norm".to_string(), "Normie".to_string()],
        ])
        .unwrap();
        assert_eq!(store.appearances_at_rank("Normie", 3), 1);
        assert_eq!(store.appearances_at_rank("Norm", 1), 2);
        assert_eq!(store.appearances_at_rank("Norman", 2), 0);
        assert_eq!(store.appearances_at_rank("Normie", 5), 0);
        assert_eq!(store.appearances_at_rank("Norm", 0), 0);
    }
}
