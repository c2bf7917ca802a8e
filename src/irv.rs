use log::info;

use snafu::{prelude::*, Snafu};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use instant_runoff::{
    results_string, BallotStore, Election, ElectionOptions, RoundRecord, ValidationError, Winner,
};
use serde::Serialize;

use crate::args::Args;
use crate::irv::survey::QuestionBallots;

pub mod survey;

#[derive(Debug, Snafu)]
pub enum TabError {
    #[snafu(display("Error opening survey export {path}"))]
    OpeningExport { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the survey export"))]
    ExportRow { source: csv::Error, lineno: usize },
    #[snafu(display("The survey export has no header row"))]
    MissingHeader {},
    #[snafu(display("The survey export has no {name} column"))]
    MissingSubmissionColumn { name: String },
    #[snafu(display("Column {column:?} is not a ranked-choice column"))]
    UnrecognizedColumn { column: String },
    #[snafu(display("Question {question:?} lists rank {rank} more than once"))]
    DuplicateRank { question: String, rank: usize },
    #[snafu(display(
        "Question {question:?} does not contain rank choices from 1 to {expected}"
    ))]
    NonContiguousRanks { question: String, expected: usize },
    #[snafu(display("Invalid ballots for question {question:?}"))]
    InvalidBallots {
        source: ValidationError,
        question: String,
    },
    #[snafu(display("Error writing results to {path}"))]
    WritingResults {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary for question {question:?}"))]
    SerializingSummary {
        source: serde_json::Error,
        question: String,
    },
}

pub type TabResult<T> = Result<T, TabError>;

/// Drives every election found in the survey export: one tabulation per
/// question, a report on stdout and on disk for each.
pub fn run_tabulation(args: &Args) -> TabResult<()> {
    let export = survey::read_survey_export(&args.export)?;
    info!(
        "Read {} question(s) from {}",
        export.questions.len(),
        args.export
    );

    fs::create_dir_all(&args.output_dir).context(WritingResultsSnafu {
        path: args.output_dir.clone(),
    })?;
    if args.save_ballots {
        survey::save_ballots(&export, &args.output_dir)?;
    }

    let options = ElectionOptions {
        remove_exhausted_ballots: args.remove_exhausted_ballots,
    };
    for question in export.questions.iter() {
        run_question(question, options, args)?;
    }
    Ok(())
}

fn run_question(question: &QuestionBallots, options: ElectionOptions, args: &Args) -> TabResult<()> {
    info!(
        "Tabulating question {:?}: {} ballots, {} spoiled",
        question.name,
        question.ballots.len(),
        question.spoiled.len()
    );
    let store = BallotStore::new(question.ballots.clone()).context(InvalidBallotsSnafu {
        question: question.name.clone(),
    })?;
    let (winner, steps) = Election::new(&store, options).run();

    let report = results_string(&winner, &steps, store.len());
    println!("{}", question_banner(&question.name));
    println!("{}", report);

    let report_path = output_path(&args.output_dir, &question.name, "txt");
    fs::write(&report_path, &report).context(WritingResultsSnafu {
        path: report_path.display().to_string(),
    })?;

    if args.json {
        let summary = QuestionSummary::new(&question.name, store.len(), &winner, &steps);
        let pretty = serde_json::to_string_pretty(&summary).context(SerializingSummarySnafu {
            question: question.name.clone(),
        })?;
        let summary_path = output_path(&args.output_dir, &question.name, "json");
        fs::write(&summary_path, pretty).context(WritingResultsSnafu {
            path: summary_path.display().to_string(),
        })?;
    }
    Ok(())
}

/// The stdout banner announcing a question's results.
fn question_banner(question: &str) -> String {
    let framed = format!("# {} #", question);
    let ruler = "#".repeat(framed.len());
    format!("\n{}\n{}\n{}", ruler, framed, ruler)
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
struct RoundSummary {
    round: u32,
    tally: BTreeMap<String, u64>,
    eliminated: Vec<String>,
}

/// The machine-readable rendition of one question's outcome.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
struct QuestionSummary {
    question: String,
    #[serde(rename = "totalBallots")]
    total_ballots: usize,
    winner: String,
    rounds: Vec<RoundSummary>,
}

impl QuestionSummary {
    fn new(
        question: &str,
        total_ballots: usize,
        winner: &Winner,
        steps: &[RoundRecord],
    ) -> QuestionSummary {
        let rounds = steps
            .iter()
            .enumerate()
            .map(|(idx, step)| {
                // A candidate present in this record but absent from the next
                // was removed at the end of this round.
                let eliminated: Vec<String> = match steps.get(idx + 1) {
                    Some(next) => step
                        .keys()
                        .filter(|name| !next.contains_key(*name))
                        .cloned()
                        .collect(),
                    None => Vec::new(),
                };
                RoundSummary {
                    round: (idx + 1) as u32,
                    tally: step.clone(),
                    eliminated,
                }
            })
            .collect();
        QuestionSummary {
            question: question.to_string(),
            total_ballots,
            winner: winner.to_string(),
            rounds,
        }
    }
}

/// Question names become file names; anything the filesystem may dislike is
/// flattened to an underscore.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub(crate) fn output_path(dir: &str, question: &str, extension: &str) -> PathBuf {
    Path::new(dir).join(format!("{}.{}", sanitize_file_name(question), extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_frames_the_question_name() {
        assert_eq!(
            question_banner("Treasurer"),
            "\n#############\n# Treasurer #\n#############"
        );
    }

    #[test]
    fn summary_reports_eliminations_between_rounds() {
        let steps: Vec<RoundRecord> = vec![
            [("A".to_string(), 2), ("B".to_string(), 2), ("C".to_string(), 1)]
                .into_iter()
                .collect(),
            [("A".to_string(), 3), ("B".to_string(), 2)].into_iter().collect(),
        ];
        let summary =
            QuestionSummary::new("Treasurer", 5, &Winner::Candidate("A".to_string()), &steps);
        assert_eq!(summary.rounds.len(), 2);
        assert_eq!(summary.rounds[0].eliminated, vec!["C".to_string()]);
        assert!(summary.rounds[1].eliminated.is_empty());
        assert_eq!(summary.winner, "A");
    }

    #[test]
    fn summary_serializes_with_the_export_field_names() {
        let steps: Vec<RoundRecord> = vec![[("A".to_string(), 1)].into_iter().collect()];
        let summary = QuestionSummary::new("Q", 1, &Winner::NoConfidence, &steps);
        let js = serde_json::to_value(&summary).unwrap();
        assert_eq!(js["totalBallots"], 1);
        assert_eq!(js["winner"], "No Confidence");
        assert_eq!(js["rounds"][0]["round"], 1);
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(
            sanitize_file_name("Who runs the club? (round 2)"),
            "Who runs the club_ _round 2_"
        );
    }
}
