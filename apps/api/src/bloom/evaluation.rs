//! Classification metrics for a labeled question set.

use std::fmt::Write;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("{truth} labels but {predicted} predictions")]
    LengthMismatch { truth: usize, predicted: usize },

    #[error("Label '{0}' is not one of the known classes")]
    UnknownLabel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Confusion matrix over a fixed class list. Rows are true labels,
/// columns are predictions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub classes: Vec<String>,
    pub confusion: Vec<Vec<usize>>,
}

impl Evaluation {
    pub fn new<S: AsRef<str>>(
        classes: &[S],
        truth: &[S],
        predicted: &[S],
    ) -> Result<Self, EvaluationError> {
        if truth.len() != predicted.len() {
            return Err(EvaluationError::LengthMismatch {
                truth: truth.len(),
                predicted: predicted.len(),
            });
        }

        let classes: Vec<String> = classes.iter().map(|c| c.as_ref().to_string()).collect();
        let position = |label: &str| {
            classes
                .iter()
                .position(|c| c == label)
                .ok_or_else(|| EvaluationError::UnknownLabel(label.to_string()))
        };

        let mut confusion = vec![vec![0usize; classes.len()]; classes.len()];
        for (t, p) in truth.iter().zip(predicted) {
            let row = position(t.as_ref())?;
            let col = position(p.as_ref())?;
            confusion[row][col] += 1;
        }

        Ok(Self { classes, confusion })
    }

    pub fn total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.classes.len()).map(|i| self.confusion[i][i]).sum();
        ratio(correct, self.total())
    }

    /// Undefined precision or recall counts as 0.
    pub fn class_metrics(&self, class: usize) -> ClassMetrics {
        let tp = self.confusion[class][class];
        let support: usize = self.confusion[class].iter().sum();
        let predicted: usize = self.confusion.iter().map(|row| row[class]).sum();

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        ClassMetrics {
            precision,
            recall,
            f1,
            support,
        }
    }

    pub fn per_class(&self) -> Vec<ClassMetrics> {
        (0..self.classes.len()).map(|i| self.class_metrics(i)).collect()
    }

    pub fn macro_avg(&self) -> ClassMetrics {
        let metrics = self.per_class();
        let n = metrics.len().max(1) as f64;
        ClassMetrics {
            precision: metrics.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: metrics.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: metrics.iter().map(|m| m.f1).sum::<f64>() / n,
            support: self.total(),
        }
    }

    pub fn weighted_avg(&self) -> ClassMetrics {
        let metrics = self.per_class();
        let total = self.total();
        if total == 0 {
            return ClassMetrics {
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
                support: 0,
            };
        }
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            metrics.iter().map(|m| f(m) * m.support as f64).sum::<f64>() / total as f64
        };
        ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        }
    }

    /// Plain-text report in the familiar precision/recall/f1/support layout.
    pub fn report(&self) -> String {
        let width = self
            .classes
            .iter()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for (name, metrics) in self.classes.iter().zip(self.per_class()) {
            write_metrics_row(&mut out, width, name, &metrics);
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy(),
            self.total()
        );
        write_metrics_row(&mut out, width, "macro avg", &self.macro_avg());
        write_metrics_row(&mut out, width, "weighted avg", &self.weighted_avg());
        out
    }

    pub fn confusion_report(&self) -> String {
        let width = self.classes.iter().map(String::len).max().unwrap_or(0).max(5);
        let mut out = String::new();
        let _ = write!(out, "{:>width$}", "");
        for class in &self.classes {
            let _ = write!(out, " {class:>width$}");
        }
        let _ = writeln!(out);
        for (class, row) in self.classes.iter().zip(&self.confusion) {
            let _ = write!(out, "{class:>width$}");
            for count in row {
                let _ = write!(out, " {count:>width$}");
            }
            let _ = writeln!(out);
        }
        out
    }
}

/// Area under the ROC curve: the chance a random positive outscores a random
/// negative, ties counting half. `None` when either side is empty.
pub fn roc_auc(is_positive: &[bool], scores: &[f64]) -> Option<f64> {
    let positives = is_positive.iter().filter(|p| **p).count();
    let negatives = is_positive.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));

    // 1-based ranks, averaged across ties
    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        positive_rank_sum += rank * order[start..end].iter().filter(|i| is_positive[**i]).count() as f64;
        start = end;
    }

    let p = positives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}

/// One-vs-rest AUC per class. `scores[i][c]` is sample `i`'s score for class `c`.
pub fn one_vs_rest_auc<S: AsRef<str>>(
    classes: &[S],
    truth: &[S],
    scores: &[Vec<f64>],
) -> Result<Vec<Option<f64>>, EvaluationError> {
    if truth.len() != scores.len() {
        return Err(EvaluationError::LengthMismatch {
            truth: truth.len(),
            predicted: scores.len(),
        });
    }
    if let Some(t) = truth.iter().find(|t| !classes.iter().any(|c| c.as_ref() == t.as_ref())) {
        return Err(EvaluationError::UnknownLabel(t.as_ref().to_string()));
    }

    Ok(classes
        .iter()
        .enumerate()
        .map(|(c, class)| {
            let is_positive: Vec<bool> = truth.iter().map(|t| t.as_ref() == class.as_ref()).collect();
            let column: Vec<f64> = scores.iter().map(|row| row.get(c).copied().unwrap_or(0.0)).collect();
            roc_auc(&is_positive, &column)
        })
        .collect())
}

fn write_metrics_row(out: &mut String, width: usize, name: &str, m: &ClassMetrics) {
    let _ = writeln!(
        out,
        "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1, m.support
    );
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation() -> Evaluation {
        let classes = ["L1", "L2", "L3"];
        let truth = ["L1", "L1", "L2", "L2", "L3", "L3"];
        let predicted = ["L1", "L2", "L2", "L2", "L3", "L1"];
        Evaluation::new(&classes, &truth, &predicted).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_confusion_and_accuracy() {
        let eval = evaluation();
        assert_eq!(eval.confusion, vec![vec![1, 1, 0], vec![0, 2, 0], vec![1, 0, 1]]);
        assert!(close(eval.accuracy(), 4.0 / 6.0));
    }

    #[test]
    fn test_per_class_metrics() {
        let eval = evaluation();
        let l2 = eval.class_metrics(1);
        assert!(close(l2.precision, 2.0 / 3.0));
        assert!(close(l2.recall, 1.0));
        assert!(close(l2.f1, 0.8));
        assert_eq!(l2.support, 2);

        let l3 = eval.class_metrics(2);
        assert!(close(l3.precision, 1.0));
        assert!(close(l3.recall, 0.5));
    }

    #[test]
    fn test_averages() {
        let eval = evaluation();
        let macro_avg = eval.macro_avg();
        // recalls 0.5, 1.0, 0.5
        assert!(close(macro_avg.recall, 2.0 / 3.0));
        // equal supports make weighted and macro agree
        assert!(close(eval.weighted_avg().recall, macro_avg.recall));
        assert_eq!(macro_avg.support, 6);
    }

    #[test]
    fn test_class_never_predicted_scores_zero() {
        let eval = Evaluation::new(&["L1", "L2"], &["L1", "L2"], &["L1", "L1"]).unwrap();
        let l2 = eval.class_metrics(1);
        assert_eq!(l2.precision, 0.0);
        assert_eq!(l2.f1, 0.0);
    }

    #[test]
    fn test_unknown_label_and_length_mismatch() {
        assert!(matches!(
            Evaluation::new(&["L1"], &["L1"], &["L9"]),
            Err(EvaluationError::UnknownLabel(l)) if l == "L9"
        ));
        assert!(matches!(
            Evaluation::new(&["L1"], &["L1", "L1"], &["L1"]),
            Err(EvaluationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_roc_auc_counts_ordered_pairs() {
        let auc = roc_auc(&[true, true, false, false], &[0.9, 0.4, 0.6, 0.1]).unwrap();
        assert!(close(auc, 0.75));
        assert!(close(roc_auc(&[true, false], &[0.3, 0.3]).unwrap(), 0.5));
        assert_eq!(roc_auc(&[false, false], &[0.3, 0.7]), None);
    }

    #[test]
    fn test_one_vs_rest_auc_per_class() {
        let truth = ["L1", "L2", "L2"];
        let scores = vec![vec![0.8, 0.2], vec![0.3, 0.7], vec![0.6, 0.4]];
        let aucs = one_vs_rest_auc(&["L1", "L2", "L3"], &truth, &scores).unwrap();

        assert!(close(aucs[0].unwrap(), 1.0));
        assert!(close(aucs[1].unwrap(), 1.0));
        // no L3 samples
        assert_eq!(aucs[2], None);

        assert!(matches!(
            one_vs_rest_auc(&["L1"], &["L1"], &[]),
            Err(EvaluationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_report_lists_classes_and_averages() {
        let report = evaluation().report();
        assert!(report.contains("precision"));
        assert!(report.contains("          L2      0.67      1.00      0.80         2"));
        assert!(report.contains("accuracy"));
        assert!(report.contains("weighted avg"));
    }
}
