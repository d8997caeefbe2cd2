//! Formatted terminal output.
//!
//! All text rendering lives here so the numeric and IO code never prints.

use crate::domain::{Match, Model};
use crate::fit::Training;
use crate::report::EvaluationReport;

/// Shape and provenance of a model.
pub fn format_model_summary(model: &Model) -> String {
    let mut out = String::new();

    out.push_str("=== fisherface - PCA + Fisher LDA face model ===\n");
    match model.image_dims() {
        Some((w, h)) => out.push_str(&format!("Pixels: {} ({w}x{h})\n", model.pixels())),
        None => out.push_str(&format!("Pixels: {}\n", model.pixels())),
    }
    out.push_str(&format!(
        "Training: P={} | C={} | K={}\n",
        model.training_size(),
        model.class_count(),
        model.class_population()
    ));
    out.push_str(&format!("Discriminant dims: {}\n", model.discriminant_dims()));

    if let Some(meta) = model.metadata() {
        out.push_str(&format!(
            "Trained: {} by {} {}\n",
            meta.trained_at.format("%Y-%m-%d %H:%M:%S UTC"),
            meta.tool,
            meta.version
        ));
        out.push_str(&format!("Fisher eigenvalues: {}\n", fmt_vec(&meta.fisher_eigenvalues)));
    }
    out
}

/// Model summary plus the intermediate PCA stage of a fresh training run.
pub fn format_training_summary(training: &Training) -> String {
    let mut out = format_model_summary(&training.model);
    out.push_str(&format!("PCA dims: {}\n", training.pca.dims()));

    let eig = training.pca.eigenvalues.as_slice();
    if let (Some(first), Some(last)) = (eig.first(), eig.last()) {
        out.push_str(&format!("PCA eigenvalues: [{first:.6e} .. {last:.6e}]\n"));
    }
    out
}

/// One recognised query.
pub fn format_match(name: &str, model: &Model, found: &Match) -> String {
    format!(
        "{:<32} -> class {:<16} (training #{}, d²={:.6})",
        truncate(name, 32),
        model.label_name(found.label),
        found.index,
        found.distance
    )
}

/// Per-query table followed by the tally.
pub fn format_evaluation(model: &Model, report: &EvaluationReport) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<32} {:<16} {:<16} {:>8} {:>14} {:<3}\n",
            "query", "expected", "found", "index", "distance", "ok"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:-<32} {:-<16} {:-<16} {:-<8} {:-<14} {:-<3}\n", "", "", "", "", "", "").trim_end(),
    );
    out.push('\n');

    for o in &report.outcomes {
        out.push_str(
            format!(
                "{:<32} {:<16} {:<16} {:>8} {:>14.6} {:<3}\n",
                truncate(&o.name, 32),
                truncate(&model.label_name(o.expected), 16),
                truncate(&model.label_name(o.found.label), 16),
                o.found.index,
                o.found.distance,
                if o.is_correct() { "yes" } else { "no" }
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str(&format!(
        "\nCorrect: {} | Wrong: {} | Accuracy: {:.2}%\n",
        report.correct,
        report.wrong,
        report.accuracy() * 100.0
    ));
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClassLabel;
    use crate::report::QueryOutcome;
    use nalgebra::{DMatrix, DVector};

    fn model() -> Model {
        Model::new(DVector::zeros(4), DMatrix::zeros(1, 4), DMatrix::zeros(1, 4), 2)
            .unwrap()
            .with_image_dims(2, 2)
            .unwrap()
            .with_labels(vec!["alice".into(), "bob".into()])
            .unwrap()
    }

    #[test]
    fn summary_lists_shapes() {
        let s = format_model_summary(&model());
        assert!(s.contains("Pixels: 4 (2x2)"));
        assert!(s.contains("P=4 | C=2 | K=2"));
        assert!(s.contains("Discriminant dims: 1"));
    }

    #[test]
    fn match_line_uses_label_names() {
        let found = Match {
            index: 3,
            label: ClassLabel(1),
            distance: 0.25,
        };
        let line = format_match("query.pgm", &model(), &found);
        assert!(line.contains("class bob"));
        assert!(line.contains("training #3"));
    }

    #[test]
    fn evaluation_ends_with_accuracy() {
        let outcome = |expected, label| QueryOutcome {
            name: "q".into(),
            expected: ClassLabel(expected),
            found: Match {
                index: 0,
                label: ClassLabel(label),
                distance: 0.0,
            },
        };
        let report = EvaluationReport {
            outcomes: vec![outcome(0, 0), outcome(1, 0)],
            correct: 1,
            wrong: 1,
        };
        let s = format_evaluation(&model(), &report);
        assert!(s.contains("Accuracy: 50.00%"));
        assert_eq!(s.lines().filter(|l| l.ends_with(" no")).count(), 1);
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
