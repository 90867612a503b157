use shared::{FormLabel, FrameRecord};

pub fn accuracy(good_frames: usize, total_frames: usize) -> f64 {
    if total_frames == 0 {
        return 0.0;
    }
    good_frames as f64 / total_frames as f64 * 100.0
}

fn mean_confidence(report: &[FrameRecord], label: FormLabel) -> Option<f64> {
    let confidences: Vec<f64> = report
        .iter()
        .filter(|record| record.prediction == label)
        .map(|record| f64::from(record.confidence))
        .collect();

    if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
    }
}

/// Human-readable verdict for a finished report.
pub fn generate_summary(report: &[FrameRecord], accuracy: f64) -> String {
    let mut summary = if accuracy >= 90.0 {
        format!(
            "Excellent form! Your technique is very consistent with {:.1}% good form.",
            accuracy
        )
    } else if accuracy >= 75.0 {
        format!(
            "Good form overall with {:.1}% accuracy. Some areas for improvement.",
            accuracy
        )
    } else if accuracy >= 50.0 {
        format!(
            "Decent form at {:.1}% accuracy, but several areas need attention.",
            accuracy
        )
    } else {
        format!(
            "Form needs significant improvement. Only {:.1}% of frames showed good form.",
            accuracy
        )
    };

    if let Some(avg) = mean_confidence(report, FormLabel::Good) {
        summary.push_str(&format!(
            " Good form frames averaged {:.1}% confidence.",
            avg
        ));
    }
    if let Some(avg) = mean_confidence(report, FormLabel::Bad) {
        summary.push_str(&format!(
            " Areas needing work averaged {:.1}% confidence.",
            avg
        ));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame: usize, prediction: FormLabel, confidence: f32) -> FrameRecord {
        FrameRecord {
            frame,
            prediction,
            confidence,
        }
    }

    #[test]
    fn accuracy_is_good_over_total() {
        assert_eq!(accuracy(7, 10), 70.0);
        assert_eq!(accuracy(0, 0), 0.0);
        assert_eq!(accuracy(3, 3), 100.0);
    }

    #[test]
    fn bands_are_inclusive_at_their_thresholds() {
        assert!(generate_summary(&[], 90.0).starts_with("Excellent form!"));
        assert!(generate_summary(&[], 89.9).starts_with("Good form overall"));
        assert!(generate_summary(&[], 75.0).starts_with("Good form overall"));
        assert!(generate_summary(&[], 74.9).starts_with("Decent form"));
        assert!(generate_summary(&[], 50.0).starts_with("Decent form"));
        assert!(generate_summary(&[], 49.9).starts_with("Form needs significant improvement"));
        assert!(generate_summary(&[], 0.0).starts_with("Form needs significant improvement"));
    }

    #[test]
    fn appends_per_label_confidences() {
        let report = vec![
            record(0, FormLabel::Good, 80.0),
            record(1, FormLabel::Good, 91.0),
            record(2, FormLabel::Bad, 55.0),
            record(3, FormLabel::Error, 0.0),
        ];
        assert_eq!(
            generate_summary(&report, 50.0),
            "Decent form at 50.0% accuracy, but several areas need attention. \
             Good form frames averaged 85.5% confidence. \
             Areas needing work averaged 55.0% confidence."
        );
    }

    #[test]
    fn omits_confidence_for_absent_labels() {
        let report = vec![record(0, FormLabel::Good, 97.04)];
        assert_eq!(
            generate_summary(&report, 100.0),
            "Excellent form! Your technique is very consistent with 100.0% good form. \
             Good form frames averaged 97.0% confidence."
        );

        let report = vec![record(0, FormLabel::NoPrediction, 0.0)];
        assert_eq!(
            generate_summary(&report, 0.0),
            "Form needs significant improvement. Only 0.0% of frames showed good form."
        );
    }

    #[test]
    fn summary_is_deterministic() {
        let report = vec![
            record(0, FormLabel::Bad, 66.6),
            record(1, FormLabel::Good, 73.3),
        ];
        for accuracy in [0.0, 33.3, 50.0, 75.0, 90.0, 100.0] {
            assert_eq!(
                generate_summary(&report, accuracy),
                generate_summary(&report, accuracy)
            );
        }
    }
}
