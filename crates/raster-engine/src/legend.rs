//! Legend resolution: mapping observed pixel colors to legend values.

use serde::{Deserialize, Serialize};

use overlay_common::Rgba;

/// A legend color and the value it stands for.
///
/// An entry without a value marks its color as "no data": pixels matching
/// it stay unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub color: Rgba,
    #[serde(default)]
    pub value: Option<f64>,
}

impl LegendEntry {
    pub fn new(color: Rgba, value: Option<f64>) -> Self {
        Self { color, value }
    }
}

/// Picks the legend entry for an observed color.
///
/// An entry is a candidate when every channel differs from the observed
/// color by less than the tolerance. The first candidate becomes the best
/// match; a later candidate replaces it only if it is closer on all four
/// channels at once. Closer on some channels is not enough.
#[derive(Debug, Clone, Copy)]
pub struct ColorMatcher<'a> {
    legend: &'a [LegendEntry],
    tolerance: u16,
}

impl<'a> ColorMatcher<'a> {
    pub fn new(legend: &'a [LegendEntry], tolerance: u16) -> Self {
        Self { legend, tolerance }
    }

    /// Index of the matching legend entry, if any.
    pub fn best_match(&self, observed: Rgba) -> Option<usize> {
        let mut best: Option<(usize, [u8; 4])> = None;

        for (i, entry) in self.legend.iter().enumerate() {
            let diffs = observed.channel_diffs(&entry.color);
            if !diffs.iter().all(|&d| (d as u16) < self.tolerance) {
                continue;
            }

            match best {
                None => best = Some((i, diffs)),
                Some((_, best_diffs)) => {
                    let dominates = diffs.iter().zip(best_diffs.iter()).all(|(d, b)| d < b);
                    if dominates {
                        best = Some((i, diffs));
                    }
                }
            }
        }

        best.map(|(i, _)| i)
    }

    /// Value bound to the matching entry. `None` when nothing matches or the
    /// match is a no-data entry.
    pub fn resolve(&self, observed: Rgba) -> Option<f64> {
        self.best_match(observed)
            .and_then(|i| self.legend[i].value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(r: u8, g: u8, b: u8, a: u8, value: Option<f64>) -> LegendEntry {
        LegendEntry::new(Rgba::new(r, g, b, a), value)
    }

    #[test]
    fn test_exact_color_selected() {
        let legend = vec![
            entry(200, 0, 0, 255, Some(1.0)),
            entry(0, 200, 0, 255, Some(2.0)),
        ];
        let matcher = ColorMatcher::new(&legend, 1);

        assert_eq!(matcher.best_match(Rgba::new(0, 200, 0, 255)), Some(1));
        assert_eq!(matcher.resolve(Rgba::new(0, 200, 0, 255)), Some(2.0));
    }

    #[test]
    fn test_tolerance_is_strict() {
        let legend = vec![entry(100, 100, 100, 255, Some(1.0))];

        assert_eq!(ColorMatcher::new(&legend, 10).best_match(Rgba::new(110, 100, 100, 255)), None);
        assert_eq!(ColorMatcher::new(&legend, 11).best_match(Rgba::new(110, 100, 100, 255)), Some(0));
        assert_eq!(ColorMatcher::new(&legend, 0).best_match(Rgba::new(100, 100, 100, 255)), None);
    }

    #[test]
    fn test_strict_dominance_replaces_best() {
        // Second entry is closer on every channel.
        let legend = vec![
            entry(110, 110, 110, 245, Some(1.0)),
            entry(102, 102, 102, 253, Some(2.0)),
        ];
        let matcher = ColorMatcher::new(&legend, 20);

        assert_eq!(matcher.best_match(Rgba::new(100, 100, 100, 255)), Some(1));
    }

    #[test]
    fn test_partial_improvement_keeps_first_candidate() {
        // Second entry is closer on r, g, b but ties on alpha, so the first
        // candidate stays, even though the second is nearer overall.
        let legend = vec![
            entry(110, 110, 110, 255, Some(1.0)),
            entry(100, 100, 100, 255, Some(2.0)),
        ];
        let matcher = ColorMatcher::new(&legend, 20);

        assert_eq!(matcher.best_match(Rgba::new(100, 100, 100, 255)), Some(0));
    }

    #[test]
    fn test_exact_match_is_never_displaced() {
        let legend = vec![
            entry(50, 50, 50, 250, Some(1.0)),
            entry(55, 55, 55, 255, Some(2.0)),
            entry(52, 52, 52, 252, Some(3.0)),
        ];
        let matcher = ColorMatcher::new(&legend, 10);

        assert_eq!(matcher.best_match(Rgba::new(55, 55, 55, 255)), Some(1));
    }

    #[test]
    fn test_no_data_entry_resolves_to_none() {
        let legend = vec![entry(255, 255, 255, 255, None)];
        let matcher = ColorMatcher::new(&legend, 5);

        assert_eq!(matcher.best_match(Rgba::new(255, 255, 255, 255)), Some(0));
        assert_eq!(matcher.resolve(Rgba::new(255, 255, 255, 255)), None);
    }

    #[test]
    fn test_legend_entry_json() {
        let legend: Vec<LegendEntry> =
            serde_json::from_str(r#"[{"color":[1,2,3,255],"value":0.5},{"color":[9,9,9,255],"value":null}]"#)
                .unwrap();
        assert_eq!(legend[0].value, Some(0.5));
        assert_eq!(legend[1].value, None);
    }
}
