//! Evaluation and terminal output.
//!
//! - score a model against labelled queries (`evaluate`)
//! - render training, match and evaluation summaries (`format`)

pub mod format;

pub use format::*;

use nalgebra::DVector;

use crate::data::LabelledQuery;
use crate::domain::{ClassLabel, Match, Model};
use crate::error::FaceError;
use crate::recognize::classify_batch;

/// One labelled query and what the model made of it.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub name: String,
    pub expected: ClassLabel,
    pub found: Match,
}

impl QueryOutcome {
    pub fn is_correct(&self) -> bool {
        self.found.label == self.expected
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub outcomes: Vec<QueryOutcome>,
    pub correct: usize,
    pub wrong: usize,
}

impl EvaluationReport {
    /// Fraction of queries recognised correctly; 0 for an empty run.
    pub fn accuracy(&self) -> f64 {
        let total = self.correct + self.wrong;
        if total == 0 {
            0.0
        } else {
            self.correct as f64 / total as f64
        }
    }
}

/// Classify every query and tally the results.
pub fn evaluate(model: &Model, queries: &[LabelledQuery]) -> Result<EvaluationReport, FaceError> {
    let vectors: Vec<DVector<f64>> = queries.iter().map(|q| q.vector.clone()).collect();
    let matches = classify_batch(model, &vectors)?;

    let outcomes: Vec<QueryOutcome> = queries
        .iter()
        .zip(matches)
        .map(|(q, found)| QueryOutcome {
            name: q.name.clone(),
            expected: q.expected,
            found,
        })
        .collect();
    let correct = outcomes.iter().filter(|o| o.is_correct()).count();
    let wrong = outcomes.len() - correct;

    Ok(EvaluationReport {
        outcomes,
        correct,
        wrong,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn toy_model() -> Model {
        Model::new(
            DVector::from_row_slice(&[0.0, 0.0]),
            DMatrix::from_row_slice(1, 2, &[1.0, 0.0]),
            DMatrix::from_row_slice(1, 4, &[-2.0, -1.0, 1.0, 2.0]),
            2,
        )
        .unwrap()
    }

    fn query(x: f64, expected: usize) -> LabelledQuery {
        LabelledQuery {
            name: format!("q{x}"),
            vector: DVector::from_row_slice(&[x, 0.0]),
            expected: ClassLabel(expected),
        }
    }

    #[test]
    fn tallies_right_and_wrong() {
        let queries = vec![query(-1.8, 0), query(1.9, 1), query(1.2, 0)];
        let report = evaluate(&toy_model(), &queries).unwrap();
        assert_eq!(report.correct, 2);
        assert_eq!(report.wrong, 1);
        assert!(!report.outcomes[2].is_correct());
        assert!((report.accuracy() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_run_has_zero_accuracy() {
        let report = evaluate(&toy_model(), &[]).unwrap();
        assert_eq!(report.accuracy(), 0.0);
    }
}
