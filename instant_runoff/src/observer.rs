use log::{info, warn};

/// Diagnostic events emitted by the engine while tabulating one election.
///
/// The engine reports through an observer instead of a process-wide logger so
/// that concurrent elections stay independent and tests can capture the
/// narration instead of parsing console output.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ElectionEvent {
    /// The freshly recomputed tally for a round, in candidate-name order.
    RoundTally {
        round: u32,
        tally: Vec<(String, u64)>,
    },
    /// Several candidates tied for last place; tie-breaking starts.
    TieBreak { round: u32, tied: Vec<String> },
    /// The whole tied group is removed at once: its combined total cannot
    /// out-poll the next candidate up.
    BatchElimination {
        removed: Vec<String>,
        combined: u64,
        next_lowest: u64,
    },
    /// No preference rank separates the tied candidates. A new election is
    /// needed; the run still completes with the sentinel result.
    UnbreakableTie { tied: Vec<String> },
    /// The ballots rank no candidate at all.
    EmptyElection,
    /// The last candidate standing did not reach a majority of all ballots
    /// cast.
    NoConfidence {
        leader: String,
        votes: u64,
        total_ballots: u64,
    },
}

pub trait ElectionObserver {
    fn on_event(&mut self, event: &ElectionEvent);
}

/// The default sink: forwards events to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ElectionObserver for LogObserver {
    fn on_event(&mut self, event: &ElectionEvent) {
        match event {
            ElectionEvent::RoundTally { round, tally } => {
                info!("Round {}: new tallies are {:?}", round, tally);
            }
            ElectionEvent::TieBreak { round, tied } => {
                info!("Round {}: breaking ties between {:?}", round, tied);
            }
            ElectionEvent::BatchElimination {
                removed,
                combined,
                next_lowest,
            } => {
                info!(
                    "Removed all of {:?}, as their sum tally ({}) is less than the min non-tied ({})",
                    removed, combined, next_lowest
                );
            }
            ElectionEvent::UnbreakableTie { tied } => {
                warn!("Unbreakable tie between {:?}, new election needed", tied);
            }
            ElectionEvent::EmptyElection => {
                warn!("Completely empty list of ballots, meaning everyone ranked no candidates. Are you sure this is what happened?");
            }
            ElectionEvent::NoConfidence {
                leader,
                votes,
                total_ballots,
            } => {
                info!(
                    "No confidence vote! Winner: {} received {} votes out of {} ballots",
                    leader, votes, total_ballots
                );
            }
        }
    }
}

/// Buffers every event; meant for tests and host applications that want the
/// diagnostics as data.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<ElectionEvent>,
}

impl ElectionObserver for RecordingObserver {
    fn on_event(&mut self, event: &ElectionEvent) {
        self.events.push(event.clone());
    }
}
