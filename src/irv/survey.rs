// Reads the ranked-choice survey tool's CSV export.
//
// The export carries a title row, then a header row naming one `Submission ID`
// column and one `<question>: <rank>` column per question and rank, then one
// row per submission.

use std::collections::BTreeMap;
use std::fs;
use std::io;

use log::debug;
use snafu::prelude::*;

use crate::irv::*;

pub const SUBMISSION_ID_COLUMN: &str = "Submission ID";
pub const QUESTION_RANK_SEPARATOR: &str = ": ";

/// The ballots extracted for one question of the export.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionBallots {
    pub name: String,
    /// Normalized ballots in submission order, most-preferred choice first.
    /// Short and empty ballots are legal.
    pub ballots: Vec<Vec<String>>,
    /// Submission ids whose ranking had a gap (a rank left blank before a
    /// filled one); these ballots are excluded from the election.
    pub spoiled: Vec<String>,
}

/// The whole export, questions in header order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyExport {
    pub questions: Vec<QuestionBallots>,
}

pub fn read_survey_export(path: &str) -> TabResult<SurveyExport> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(OpeningExportSnafu {
            path: path.to_string(),
        })?;
    parse_export(rdr)
}

/// Parses an already-opened export. Split out from [read_survey_export] so
/// tests can feed in-memory data.
pub fn parse_export<R: io::Read>(rdr: csv::Reader<R>) -> TabResult<SurveyExport> {
    let mut records = rdr.into_records();

    // The tool writes a title row above the real header.
    let _title = records
        .next()
        .transpose()
        .context(ExportRowSnafu { lineno: 1usize })?;
    let header = match records.next() {
        Some(record) => record.context(ExportRowSnafu { lineno: 2usize })?,
        None => return MissingHeaderSnafu {}.fail(),
    };

    let (submission_idx, columns) = parse_header(&header)?;
    debug!(
        "parse_export: submission column {}, questions {:?}",
        submission_idx,
        columns.iter().map(|q| &q.name).collect::<Vec<_>>()
    );

    let mut questions: Vec<QuestionBallots> = columns
        .iter()
        .map(|q| QuestionBallots {
            name: q.name.clone(),
            ballots: Vec::new(),
            spoiled: Vec::new(),
        })
        .collect();

    for (idx, record) in records.enumerate() {
        // Line 1 is the title, line 2 the header.
        let lineno = idx + 3;
        let record = record.context(ExportRowSnafu { lineno })?;
        let submission_id = match record.get(submission_idx) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("row-{:08}", lineno),
        };

        for (question, out) in columns.iter().zip(questions.iter_mut()) {
            let cells: Vec<&str> = question
                .rank_cols
                .iter()
                .map(|col| record.get(*col).unwrap_or(""))
                .collect();
            if is_spoiled(&cells) {
                debug!(
                    "parse_export: submission {} spoiled question {:?}: {:?}",
                    submission_id, question.name, cells
                );
                out.spoiled.push(submission_id.clone());
            } else {
                out.ballots.push(
                    cells
                        .iter()
                        .filter(|cell| !cell.is_empty())
                        .map(|cell| cell.to_string())
                        .collect(),
                );
            }
        }
    }
    Ok(SurveyExport { questions })
}

struct QuestionColumns {
    name: String,
    /// `rank_cols[r - 1]` is the column index holding rank `r`.
    rank_cols: Vec<usize>,
}

fn parse_header(header: &csv::StringRecord) -> TabResult<(usize, Vec<QuestionColumns>)> {
    let mut submission_idx: Option<usize> = None;
    let mut order: Vec<String> = Vec::new();
    let mut ranks: BTreeMap<String, BTreeMap<usize, usize>> = BTreeMap::new();

    for (idx, cell) in header.iter().enumerate() {
        if cell == SUBMISSION_ID_COLUMN {
            submission_idx = Some(idx);
            continue;
        }
        if cell.trim().is_empty() {
            // Exports pad the header with empty trailing columns.
            continue;
        }
        // Split from the right: question text may itself contain the
        // separator.
        let (question, rank_str) = cell
            .rsplit_once(QUESTION_RANK_SEPARATOR)
            .context(UnrecognizedColumnSnafu {
                column: cell.to_string(),
            })?;
        let rank: usize = rank_str
            .trim()
            .parse()
            .ok()
            .context(UnrecognizedColumnSnafu {
                column: cell.to_string(),
            })?;
        if !ranks.contains_key(question) {
            order.push(question.to_string());
        }
        let entry = ranks.entry(question.to_string()).or_default();
        if entry.insert(rank, idx).is_some() {
            return DuplicateRankSnafu {
                question: question.to_string(),
                rank,
            }
            .fail();
        }
    }

    let submission_idx = submission_idx.context(MissingSubmissionColumnSnafu {
        name: SUBMISSION_ID_COLUMN,
    })?;

    let mut questions: Vec<QuestionColumns> = Vec::new();
    for name in order {
        let rank_map = &ranks[&name];
        let expected = rank_map.len();
        let contiguous = rank_map.keys().enumerate().all(|(i, rank)| *rank == i + 1);
        if !contiguous {
            return NonContiguousRanksSnafu {
                question: name,
                expected,
            }
            .fail();
        }
        questions.push(QuestionColumns {
            name,
            rank_cols: rank_map.values().copied().collect(),
        });
    }
    Ok((submission_idx, questions))
}

/// A rank left blank before a filled one spoils the ballot.
fn is_spoiled(cells: &[&str]) -> bool {
    cells
        .windows(2)
        .any(|pair| pair[0].is_empty() && !pair[1].is_empty())
}

/// Writes the normalized ballots, and the spoiled submission ids, of every
/// question under `output_dir`.
pub fn save_ballots(export: &SurveyExport, output_dir: &str) -> TabResult<()> {
    for question in export.questions.iter() {
        let ballots_path = output_path(output_dir, &question.name, "csv");
        let mut ballots: String = question
            .ballots
            .iter()
            .map(|ballot| ballot.join(","))
            .collect::<Vec<String>>()
            .join("\n");
        ballots.push('\n');
        fs::write(&ballots_path, ballots).context(WritingResultsSnafu {
            path: ballots_path.display().to_string(),
        })?;

        let spoiled_path = output_path(output_dir, &format!("{}_spoiled", question.name), "txt");
        let mut spoiled = question.spoiled.join("\n");
        spoiled.push('\n');
        fs::write(&spoiled_path, spoiled).context(WritingResultsSnafu {
            path: spoiled_path.display().to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_bytes())
    }

    fn ballot(choices: &[&str]) -> Vec<String> {
        choices.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_two_questions_and_flags_spoiled_ballots() {
        let data = "\
Ranked Choice Voting Export,,,,,
Submission ID,Best Pizza: 1,Best Pizza: 2,Treasurer: 1,Treasurer: 2,Treasurer: 3
101,Sausage,Cheese,Ada,Grace,
102,Cheese,,Grace,,Ada
103,,Cheese,Ada,,
104,Cheese,Sausage,,,
";
        let export = parse_export(reader(data)).unwrap();
        assert_eq!(export.questions.len(), 2);

        let pizza = &export.questions[0];
        assert_eq!(pizza.name, "Best Pizza");
        assert_eq!(
            pizza.ballots,
            vec![
                ballot(&["Sausage", "Cheese"]),
                ballot(&["Cheese"]),
                ballot(&["Cheese", "Sausage"]),
            ]
        );
        assert_eq!(pizza.spoiled, vec!["103".to_string()]);

        let treasurer = &export.questions[1];
        assert_eq!(treasurer.name, "Treasurer");
        assert_eq!(
            treasurer.ballots,
            vec![ballot(&["Ada", "Grace"]), ballot(&["Ada"]), ballot(&[])]
        );
        assert_eq!(treasurer.spoiled, vec!["102".to_string()]);
    }

    #[test]
    fn question_names_may_contain_the_separator() {
        let data = "\
title,,
Submission ID,Club: President: 1,Club: President: 2
7,Ada,Grace
";
        let export = parse_export(reader(data)).unwrap();
        assert_eq!(export.questions[0].name, "Club: President");
        assert_eq!(export.questions[0].ballots, vec![ballot(&["Ada", "Grace"])]);
    }

    #[test]
    fn short_rows_read_as_blank_cells() {
        let data = "\
title
Submission ID,Q: 1,Q: 2
1,Ada
2
";
        let export = parse_export(reader(data)).unwrap();
        assert_eq!(
            export.questions[0].ballots,
            vec![ballot(&["Ada"]), ballot(&[])]
        );
        assert!(export.questions[0].spoiled.is_empty());
    }

    #[test]
    fn duplicated_rank_column_is_rejected() {
        let data = "\
title,,
Submission ID,Q: 1,Q: 1
1,Ada,Grace
";
        let err = parse_export(reader(data)).unwrap_err();
        assert!(matches!(
            err,
            TabError::DuplicateRank { question, rank: 1 } if question == "Q"
        ));
    }

    #[test]
    fn rank_gap_in_the_header_is_rejected() {
        let data = "\
title,,
Submission ID,Q: 1,Q: 3
1,Ada,Grace
";
        let err = parse_export(reader(data)).unwrap_err();
        assert!(matches!(
            err,
            TabError::NonContiguousRanks { question, expected: 2 } if question == "Q"
        ));
    }

    #[test]
    fn missing_submission_column_is_rejected() {
        let data = "\
title,
Q: 1,Q: 2
Ada,Grace
";
        let err = parse_export(reader(data)).unwrap_err();
        assert!(matches!(err, TabError::MissingSubmissionColumn { .. }));
    }

    #[test]
    fn unrecognized_column_is_rejected() {
        let data = "\
title,
Submission ID,Favorite Color
1,Blue
";
        let err = parse_export(reader(data)).unwrap_err();
        assert!(matches!(
            err,
            TabError::UnrecognizedColumn { column } if column == "Favorite Color"
        ));
    }

    #[test]
    fn empty_export_is_rejected() {
        let err = parse_export(reader("")).unwrap_err();
        assert!(matches!(err, TabError::MissingHeader {}));
    }
}
