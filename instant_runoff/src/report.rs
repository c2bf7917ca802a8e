use std::cmp::Reverse;

use crate::config::{RoundRecord, Winner};

/// Renders the human-readable summary of one election.
///
/// The caller owns any file or console the summary is written to; this
/// function is pure.
pub fn results_string(winner: &Winner, steps: &[RoundRecord], total_ballots: usize) -> String {
    let winner_line = format!("= WINNER: {} =", winner);
    let ruler = "=".repeat(winner_line.len());
    let mut lines: Vec<String> = vec![
        ruler.clone(),
        winner_line,
        ruler,
        format!("There were {} total ballots cast", total_ballots),
    ];

    if let Winner::Candidate(name) = winner {
        if let Some(last_round) = steps.last() {
            let votes = last_round.get(name).copied().unwrap_or(0);
            let percent = 100.0 * votes as f64 / total_ballots as f64;
            lines.push(format!(
                "In the final round, {} received {} votes, or {:.2}%",
                name, votes, percent
            ));
        }
    }

    lines.push(String::new());
    lines.push("==========".to_string());
    lines.push("= ROUNDS =".to_string());
    lines.push("==========".to_string());
    for (idx, step) in steps.iter().enumerate() {
        // Highest tally first; candidates with equal tallies in name order.
        let mut entries: Vec<(&String, u64)> = step.iter().map(|(n, c)| (n, *c)).collect();
        entries.sort_by_key(|(name, count)| (Reverse(*count), name.to_string()));
        let rendered: Vec<String> = entries
            .iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect();
        lines.push(format!("Round {}: {{{}}}", idx + 1, rendered.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(entries: &[(&str, u64)]) -> RoundRecord {
        entries
            .iter()
            .map(|(n, c)| (n.to_string(), *c))
            .collect::<BTreeMap<String, u64>>()
    }

    #[test]
    fn report_for_a_real_winner() {
        let steps = vec![record(&[("Alice", 2), ("Bob", 1)])];
        let out = results_string(&Winner::Candidate("Alice".to_string()), &steps, 3);
        let expected = "\
=================
= WINNER: Alice =
=================
There were 3 total ballots cast
In the final round, Alice received 2 votes, or 66.67%

==========
= ROUNDS =
==========
Round 1: {Alice: 2, Bob: 1}";
        assert_eq!(out, expected);
    }

    #[test]
    fn report_for_a_sentinel_skips_the_vote_share() {
        let steps = vec![record(&[("Alice", 1), ("Bob", 1)])];
        let out = results_string(&Winner::UnbreakableTie, &steps, 2);
        assert!(out.contains("= WINNER: Unbreakable Tie ="));
        assert!(!out.contains("final round"));
        assert!(out.contains("Round 1: {Alice: 1, Bob: 1}"));
    }

    #[test]
    fn rounds_are_listed_by_descending_count_then_name() {
        let steps = vec![record(&[("Carol", 2), ("Alice", 1), ("Bob", 2)])];
        let out = results_string(&Winner::NoConfidence, &steps, 5);
        assert!(out.contains("Round 1: {Bob: 2, Carol: 2, Alice: 1}"));
    }
}
