//! Metric → card decoration table.

use std::collections::HashMap;

use sheetdrop_proto::config::CardEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoration {
    pub icon: String,
    pub emphasize: bool,
}

/// Built-in decorations for the metrics the processing service reports.
const BUILTIN: &[(&str, &str, bool)] = &[
    ("Total", "Σ", false),
    ("Total Rows", "Σ", false),
    ("Valid Emails", "@", false),
    ("Similar Emails", "≈", false),
    ("Extracted Names", "✎", false),
    ("Duplicates Removed", "✂", false),
    ("Final", "✓", true),
];

/// Immutable lookup from metric label to decoration.  Unknown metrics get a
/// neutral decoration (no icon, no emphasis).
#[derive(Debug, Clone)]
pub struct CardPresentation {
    by_metric: HashMap<String, Decoration>,
    neutral: Decoration,
}

impl CardPresentation {
    pub fn builtin() -> Self {
        let by_metric = BUILTIN
            .iter()
            .map(|&(metric, icon, emphasize)| {
                (
                    metric.to_string(),
                    Decoration {
                        icon: icon.to_string(),
                        emphasize,
                    },
                )
            })
            .collect();
        Self {
            by_metric,
            neutral: Decoration::default(),
        }
    }

    /// Built-in table with `entries` layered on top (later entries win).
    pub fn with_overrides(entries: &[CardEntry]) -> Self {
        let mut table = Self::builtin();
        for entry in entries {
            table.by_metric.insert(
                entry.metric.clone(),
                Decoration {
                    icon: entry.icon.clone(),
                    emphasize: entry.emphasize,
                },
            );
        }
        table
    }

    pub fn decoration(&self, metric: &str) -> &Decoration {
        self.by_metric.get(metric).unwrap_or(&self.neutral)
    }
}

impl Default for CardPresentation {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_metric_is_neutral() {
        let table = CardPresentation::builtin();
        let d = table.decoration("Something Else");
        assert!(d.icon.is_empty());
        assert!(!d.emphasize);
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let table = CardPresentation::with_overrides(&[
            CardEntry {
                metric: "Final".to_string(),
                icon: "★".to_string(),
                emphasize: false,
            },
            CardEntry {
                metric: "Bounced".to_string(),
                icon: "↩".to_string(),
                emphasize: true,
            },
        ]);
        assert_eq!(table.decoration("Final").icon, "★");
        assert!(!table.decoration("Final").emphasize);
        assert!(table.decoration("Bounced").emphasize);
        assert_eq!(table.decoration("Total").icon, "Σ");
    }
}
