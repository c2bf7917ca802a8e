/*!
Instant-runoff voting (IRV) tabulation engine.

The engine consumes an immutable [BallotStore] and produces the election
[Winner] together with a per-round audit trail. Each round the top remaining
choice of every ballot is tallied from scratch, the lowest-polling candidate
is removed, and ties for last place are broken by comparing first-choice
appearances, then second-choice appearances, and so on. A candidate whose
tally exceeds half of all ballots cast wins immediately.

```
use instant_runoff::{BallotStore, Election, ElectionOptions, Winner};

let store = BallotStore::new(vec![
    vec!["Alice".to_string(), "Bob".to_string()],
    vec!["Alice".to_string()],
    vec!["Bob".to_string()],
])?;
let (winner, steps) = Election::new(&store, ElectionOptions::DEFAULT_OPTIONS).run();
assert_eq!(winner, Winner::Candidate("Alice".to_string()));
assert_eq!(steps.len(), 1);
# Ok::<(), instant_runoff::ValidationError>(())
```
*/

mod ballots;
mod config;
mod observer;
mod report;

pub use crate::ballots::BallotStore;
pub use crate::config::*;
pub use crate::observer::*;
pub use crate::report::results_string;

use std::collections::{BTreeMap, BTreeSet};

/// The working tally: one non-negative count per still-active candidate.
type Tally = BTreeMap<String, u64>;

/// One instant-runoff election over a borrowed [BallotStore].
///
/// The store is never mutated; only the internal working tally changes from
/// round to round, so a single store may back any number of elections.
pub struct Election<'a> {
    ballots: &'a BallotStore,
    options: ElectionOptions,
    log_sink: LogObserver,
    observer: Option<&'a mut dyn ElectionObserver>,
}

impl<'a> Election<'a> {
    /// An election reporting its diagnostics through the `log` crate.
    pub fn new(ballots: &'a BallotStore, options: ElectionOptions) -> Election<'a> {
        Election {
            ballots,
            options,
            log_sink: LogObserver,
            observer: None,
        }
    }

    /// An election reporting its diagnostics to an explicit observer.
    pub fn with_observer(
        ballots: &'a BallotStore,
        options: ElectionOptions,
        observer: &'a mut dyn ElectionObserver,
    ) -> Election<'a> {
        Election {
            ballots,
            options,
            log_sink: LogObserver,
            observer: Some(observer),
        }
    }

    /// Runs the election to completion.
    ///
    /// Returns the winner together with one [RoundRecord] per round: the
    /// round's tally merged with the candidate(s) removed at its end. The
    /// sentinel outcomes ([Winner::NoConfidence], [Winner::UnbreakableTie])
    /// are ordinary results and still carry the audit trail.
    pub fn run(&mut self) -> (Winner, Vec<RoundRecord>) {
        let total_ballots = self.ballots.len() as u64;
        let mut steps: Vec<RoundRecord> = Vec::new();
        let mut tallies: Tally = self
            .ballots
            .candidates()
            .iter()
            .map(|name| (name.clone(), 0))
            .collect();

        if tallies.is_empty() {
            self.emit(ElectionEvent::EmptyElection);
            return (Winner::NoConfidence, steps);
        }

        let mut round: u32 = 1;
        while tallies.len() > 1 {
            let (new_tallies, removed) = self.one_round(&tallies, round);
            let mut record: RoundRecord = removed.clone();
            record.extend(new_tallies.iter().map(|(n, c)| (n.clone(), *c)));
            steps.push(record);
            tallies = new_tallies;

            if removed.is_empty() {
                // Nothing was removed: either the front runner already holds
                // a majority, or the bottom-tier tie could not be broken.
                if let Some((leader, votes)) = front_runner(&tallies) {
                    if 2 * votes > total_ballots {
                        return (Winner::Candidate(leader.clone()), steps);
                    }
                }
                return (Winner::UnbreakableTie, steps);
            }
            round += 1;
        }

        // Natural elimination down to one candidate. Recompute the final
        // tally for the audit trail.
        let survivors: BTreeSet<String> = tallies.keys().cloned().collect();
        let final_tally = self.count_round(&survivors, round);
        steps.push(final_tally.clone());

        let (name, votes) = match final_tally.into_iter().next() {
            Some(pair) => pair,
            None => return (Winner::NoConfidence, steps),
        };
        if !self.options.remove_exhausted_ballots && 2 * votes <= total_ballots {
            self.emit(ElectionEvent::NoConfidence {
                leader: name,
                votes,
                total_ballots,
            });
            return (Winner::NoConfidence, steps);
        }
        (Winner::Candidate(name), steps)
    }

    /// Tallies the top remaining choice of every ballot over the active set.
    ///
    /// Recomputed from scratch every round: the result is insensitive to the
    /// order of the ballots and to which candidate left in the previous
    /// round. A ballot with no active candidate left is exhausted and counts
    /// for no one.
    fn count_round(&mut self, active: &BTreeSet<String>, round: u32) -> Tally {
        let mut tally: Tally = active.iter().map(|name| (name.clone(), 0)).collect();
        for ballot in self.ballots.ballots() {
            if let Some(choice) = ballot.iter().find(|choice| tally.contains_key(*choice)) {
                if let Some(count) = tally.get_mut(choice) {
                    *count += 1;
                }
            }
        }
        self.emit(ElectionEvent::RoundTally {
            round,
            tally: tally.iter().map(|(n, c)| (n.clone(), *c)).collect(),
        });
        tally
    }

    /// Tallies one round and removes the losing candidate(s) from the
    /// working tally. The removal set is empty when a candidate already
    /// holds a majority, or when the bottom-tier tie is unbreakable.
    fn one_round(&mut self, tallies: &Tally, round: u32) -> (Tally, RoundRecord) {
        let active: BTreeSet<String> = tallies.keys().cloned().collect();
        let mut new_tallies = self.count_round(&active, round);

        let min_count = new_tallies.values().copied().min().unwrap_or(0);
        let max_count = new_tallies.values().copied().max().unwrap_or(0);
        // Bottom tier in name order, straight from the ordered map.
        let bottom_tier: Vec<String> = new_tallies
            .iter()
            .filter(|(_, count)| **count == min_count)
            .map(|(name, _)| name.clone())
            .collect();

        let mut removed = RoundRecord::new();
        // Don't bother removing anyone if a candidate already has a majority.
        if 2 * max_count <= self.ballots.len() as u64 {
            let losers = if bottom_tier.len() == 1 {
                bottom_tier
            } else {
                self.break_ties(bottom_tier, &new_tallies, round)
            };
            for name in losers {
                if let Some(count) = new_tallies.remove(&name) {
                    removed.insert(name, count);
                }
            }
        }
        (new_tallies, removed)
    }

    /// Breaks a tie for last place, returning the candidate(s) to remove.
    ///
    /// The whole tied group goes at once when its combined total cannot
    /// out-poll the next candidate up. Otherwise the group is narrowed by
    /// comparing appearances at rank 1, then rank 2, and so on over the
    /// original ballots. An empty return means the tie is unbreakable.
    fn break_ties(&mut self, tied: Vec<String>, tallies: &Tally, round: u32) -> Vec<String> {
        self.emit(ElectionEvent::TieBreak {
            round,
            tied: tied.clone(),
        });

        let tied_val = tied
            .first()
            .and_then(|name| tallies.get(name))
            .copied()
            .unwrap_or(0);
        // The next-smallest count among non-tied candidates; `None` when the
        // tied group is everyone.
        let min_non_tied: Option<u64> = tallies
            .values()
            .copied()
            .filter(|count| *count > tied_val)
            .min();

        let mut tied = tied;
        if self.can_remove_all(&tied, min_non_tied, tied_val) {
            return tied;
        }

        for rank in 1..=self.ballots.candidates().len() {
            let mut min_names: Vec<String> = Vec::new();
            let mut min_val: Option<u64> = None;
            for name in tied.iter() {
                let place_votes = self.ballots.appearances_at_rank(name, rank);
                match min_val {
                    Some(v) if place_votes > v => {}
                    Some(v) if place_votes == v => min_names.push(name.clone()),
                    _ => {
                        min_names = vec![name.clone()];
                        min_val = Some(place_votes);
                    }
                }
            }
            tied = min_names;
            if self.can_remove_all(&tied, min_non_tied, tied_val) {
                return tied;
            }
        }

        self.emit(ElectionEvent::UnbreakableTie { tied });
        Vec::new()
    }

    /// Whether the whole tied group can be removed in one go: a singleton
    /// always can, and a larger group can when its combined total is below
    /// the minimum non-tied tally.
    fn can_remove_all(&mut self, tied: &[String], min_non_tied: Option<u64>, tied_val: u64) -> bool {
        let combined = tied.len() as u64 * tied_val;
        match min_non_tied {
            Some(next_lowest) if combined < next_lowest => {
                self.emit(ElectionEvent::BatchElimination {
                    removed: tied.to_vec(),
                    combined,
                    next_lowest,
                });
                true
            }
            _ => tied.len() == 1,
        }
    }

    fn emit(&mut self, event: ElectionEvent) {
        match self.observer.as_mut() {
            Some(observer) => observer.on_event(&event),
            None => self.log_sink.on_event(&event),
        }
    }
}

/// The candidate with the highest tally; equal counts resolve to the
/// lexicographically smallest name, never to map iteration luck.
fn front_runner(tally: &Tally) -> Option<(&String, u64)> {
    let mut best: Option<(&String, u64)> = None;
    for (name, count) in tally.iter() {
        match best {
            Some((_, best_count)) if best_count >= *count => {}
            _ => best = Some((name, *count)),
        }
    }
    best
}
