//! The mock waste classifier. There is no model behind it: detections are
//! drawn at random from the catalog and given made-up confidences, so the
//! frontend can be exercised end to end.

use crate::catalog::{Bucket, Catalog, WasteEntry};
use crate::ingest::DecodedImage;
use rand::seq::index;
use rand::Rng;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::debug;

/// How detections are sampled and when they are reported
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingPolicy {
    /// How many materials to report, capped by the catalog size
    pub detections: RangeInclusive<usize>,

    /// Range each confidence is drawn from
    pub confidence: RangeInclusive<f64>,

    /// Decimal places confidences are rounded to
    pub precision: u32,

    /// Suppress the whole result when the best confidence is below this.
    /// `None` always reports.
    pub threshold: Option<f64>,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        SamplingPolicy {
            detections: 2..=4,
            confidence: 0.40..=0.99,
            precision: 2,
            threshold: Some(0.70),
        }
    }
}

/// One sampled catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct Detection<'c> {
    pub entry: &'c WasteEntry,
    pub confidence: f64,
}

/// Per-bucket counts of a set of detections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub recyclable_items: usize,
    pub hazardous_items: usize,
    pub general_waste_items: usize,
}

impl Summary {
    pub fn record(&mut self, bucket: Bucket) {
        match bucket {
            Bucket::Recyclable => self.recyclable_items += 1,
            Bucket::Hazardous => self.hazardous_items += 1,
            Bucket::General => self.general_waste_items += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.recyclable_items + self.hazardous_items + self.general_waste_items
    }
}

impl<'a, 'c: 'a> FromIterator<&'a Detection<'c>> for Summary {
    fn from_iter<I: IntoIterator<Item = &'a Detection<'c>>>(iter: I) -> Self {
        let mut summary = Summary::default();
        for detection in iter {
            summary.record(detection.entry.category.bucket());
        }
        summary
    }
}

/// What the classifier decided for one image
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<'c> {
    Detected {
        detections: Vec<Detection<'c>>,
        summary: Summary,
    },

    /// Candidates were drawn but none was confident enough to report
    Suppressed { best_confidence: f64 },
}

#[derive(Debug)]
pub struct MockClassifier {
    catalog: Arc<Catalog>,
    policy: SamplingPolicy,
}

impl MockClassifier {
    pub fn new(catalog: Arc<Catalog>, policy: SamplingPolicy) -> Self {
        MockClassifier { catalog, policy }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// "Classify" an image. The image only has to exist; its pixels are
    /// ignored.
    pub fn classify<R: Rng>(
        &self,
        _image: &DecodedImage,
        rng: &mut R,
    ) -> Classification<'_> {
        let entries = self.catalog.entries();
        let n = self.detection_count(rng);

        let detections: Vec<Detection<'_>> = index::sample(rng, entries.len(), n)
            .into_iter()
            .map(|i| Detection {
                entry: &entries[i],
                confidence: self.confidence(rng),
            })
            .collect();

        if let Some(threshold) = self.policy.threshold {
            let best = best_confidence(&detections);
            if best < threshold {
                debug!(best, threshold, "best detection is below the threshold");
                return Classification::Suppressed {
                    best_confidence: best,
                };
            }
        }

        let summary = detections.iter().collect();
        Classification::Detected {
            detections,
            summary,
        }
    }

    fn detection_count<R: Rng>(&self, rng: &mut R) -> usize {
        let max = (*self.policy.detections.end()).min(self.catalog.len());
        let min = (*self.policy.detections.start()).clamp(1, max.max(1));
        if min >= max {
            return max;
        }
        rng.gen_range(min..=max)
    }

    fn confidence<R: Rng>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = (*self.policy.confidence.start(), *self.policy.confidence.end());
        let raw = if lo < hi { rng.gen_range(lo..=hi) } else { lo };
        round_to(raw, self.policy.precision).clamp(lo, hi)
    }
}

/// The highest confidence; the first one wins a tie
fn best_confidence(detections: &[Detection<'_>]) -> f64 {
    detections
        .iter()
        .map(|d| d.confidence)
        .fold(f64::NEG_INFINITY, |best, c| if c > best { c } else { best })
}

fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::util::test;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn classifier(policy: SamplingPolicy) -> MockClassifier {
        MockClassifier::new(Arc::new(Catalog::builtin()), policy)
    }

    fn always_report() -> SamplingPolicy {
        SamplingPolicy {
            threshold: None,
            ..SamplingPolicy::default()
        }
    }

    #[test]
    fn test_detections_come_from_catalog() {
        let classifier = classifier(always_report());
        let image = test::decoded_image();

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let Classification::Detected { detections, .. } = classifier.classify(&image, &mut rng)
            else {
                panic!("always-report classifier suppressed a result");
            };

            assert!((2..=4).contains(&detections.len()));

            let ids: HashSet<&str> = detections.iter().map(|d| d.entry.id.as_str()).collect();
            assert_eq!(ids.len(), detections.len(), "duplicate detection");
            for id in ids {
                assert!(classifier.catalog().get(id).is_some());
            }
        }
    }

    #[test]
    fn test_summary_partitions_detections() {
        let classifier = classifier(always_report());
        let image = test::decoded_image();

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            if let Classification::Detected {
                detections,
                summary,
            } = classifier.classify(&image, &mut rng)
            {
                assert_eq!(summary.total(), detections.len());

                let count = |categories: &[Category]| {
                    detections
                        .iter()
                        .filter(|d| categories.contains(&d.entry.category))
                        .count()
                };
                assert_eq!(summary.recyclable_items, count(&[Category::Recyclable]));
                assert_eq!(summary.hazardous_items, count(&[Category::HazardousEWaste]));
                assert_eq!(
                    summary.general_waste_items,
                    count(&[Category::GeneralWaste, Category::OrganicCompostable])
                );
            }
        }
    }

    #[test]
    fn test_confidence_range_and_precision() {
        let classifier = classifier(SamplingPolicy {
            confidence: 0.75..=0.99,
            ..always_report()
        });
        let image = test::decoded_image();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let Classification::Detected { detections, .. } = classifier.classify(&image, &mut rng)
            else {
                unreachable!()
            };
            for d in detections {
                assert!((0.75..=0.99).contains(&d.confidence), "{}", d.confidence);
                let cents = d.confidence * 100.0;
                assert!((cents - cents.round()).abs() < 1e-9, "{}", d.confidence);
            }
        }
    }

    #[test]
    fn test_low_confidence_is_suppressed() {
        let classifier = classifier(SamplingPolicy {
            confidence: 0.10..=0.60,
            threshold: Some(0.70),
            ..SamplingPolicy::default()
        });
        let image = test::decoded_image();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            match classifier.classify(&image, &mut rng) {
                Classification::Suppressed { best_confidence } => {
                    assert!(best_confidence < 0.70)
                }
                other => panic!("expected suppression, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_confident_result_passes_gate() {
        let classifier = classifier(SamplingPolicy {
            confidence: 0.80..=0.99,
            threshold: Some(0.70),
            ..SamplingPolicy::default()
        });
        let mut rng = StdRng::seed_from_u64(1);
        let res = classifier.classify(&test::decoded_image(), &mut rng);
        assert!(matches!(res, Classification::Detected { .. }));
    }

    #[test]
    fn test_detection_count_capped_by_catalog() {
        let catalog = Catalog::new(Catalog::builtin().entries()[..2].to_vec()).unwrap();
        let classifier = MockClassifier::new(
            Arc::new(catalog),
            SamplingPolicy {
                detections: 3..=10,
                ..always_report()
            },
        );
        let mut rng = StdRng::seed_from_u64(3);
        let Classification::Detected { detections, .. } =
            classifier.classify(&test::decoded_image(), &mut rng)
        else {
            unreachable!()
        };
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn test_best_confidence_tie() {
        let catalog = Catalog::builtin();
        let detections = vec![
            Detection {
                entry: &catalog.entries()[0],
                confidence: 0.5,
            },
            Detection {
                entry: &catalog.entries()[1],
                confidence: 0.9,
            },
            Detection {
                entry: &catalog.entries()[2],
                confidence: 0.9,
            },
        ];
        assert_eq!(best_confidence(&detections), 0.9);
        assert_eq!(round_to(0.456, 2), 0.46);
    }
}
