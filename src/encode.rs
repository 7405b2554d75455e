// encode.rs
//
// Attribute selection and the numeric side of the colorbar.

use plotters::prelude::RGBColor;
use tracing::debug;

use crate::colormap::ColorMap;
use crate::error::{MapError, MapResult, Side};
use crate::geometry::GeoTable;
use crate::prompt::Prompt;
use crate::resolve::Resolution;
use crate::tabular::Cell;

pub const TICK_COUNT: usize = 6;

/// Evenly stepped ticks below the maximum, before `max` itself is appended.
const STEPPED_TICKS: usize = TICK_COUNT - 1;

/// Colorbar label rendered without a leading space.
const PERCENT_LABEL: &str = "%";

/// Picks the column to shade the map by.
pub fn select_color_column(
    configured: Option<&str>,
    columns: &[String],
    prompt: &mut dyn Prompt,
) -> MapResult<String> {
    let exists = |name: &String| columns.contains(name);
    let correct = |prompt: &mut dyn Prompt| -> MapResult<String> {
        prompt.warn("You're trying to color on a column that doesn't exist in your merged dataframe.");
        prompt.list("The columns in your merged dataframe are", columns);
        prompt.ask("Enter exact name of column to color code: ")
    };

    Resolution::classify(configured.map(str::to_string), exists).resolve(
        prompt,
        |prompt, _| correct(prompt),
        |prompt| -> MapResult<String> {
            let answer = prompt.ask("Enter exact name of column to color code: ")?;
            if exists(&answer) {
                Ok(answer)
            } else {
                correct(prompt)
            }
        },
    )
}

/// Uses the configured colorbar label or asks for one.
pub fn resolve_colorbar_label(configured: Option<&str>, prompt: &mut dyn Prompt) -> MapResult<String> {
    Resolution::classify(configured.map(str::to_string), |_| true).resolve(
        prompt,
        |_, label| Ok(label),
        |prompt| {
            prompt.warn("You haven't specified a data label for the map's colorbar.");
            prompt.ask("Enter a data label: ")
        },
    )
}

/// Numeric view of one column. Missing cells stay `None`.
pub fn numeric_values(table: &GeoTable, column: &str) -> MapResult<Vec<Option<f64>>> {
    let cells = table
        .attributes
        .column(column)
        .ok_or_else(|| MapError::UnknownColumn {
            column: column.to_string(),
            side: Side::Merged,
        })?;
    cells
        .map(|cell| match cell {
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Missing => Ok(None),
            Cell::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(MapError::NonNumeric {
                    column: column.to_string(),
                    value: s.clone(),
                }),
            },
        })
        .collect()
}

/// Six colorbar ticks: five stepping by `max / 5` from `min`, then `max`.
///
/// The step ignores `min`, so spacing is uneven whenever `min` is not zero.
/// Stepped ticks are clamped into `[min, max]`.
pub fn colorbar_ticks(min: f64, max: f64) -> Vec<f64> {
    let step = max / STEPPED_TICKS as f64;
    let mut ticks: Vec<f64> = (0..STEPPED_TICKS)
        .map(|i| (min + step * i as f64).clamp(min, max))
        .collect();
    ticks.push(max);
    ticks
}

/// Formats with thousands separators and two decimals, e.g. `1,234.50`.
pub fn format_grouped(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(fraction);
    grouped
}

/// Suffix appended to the last tick label.
pub fn unit_suffix(label: &str) -> String {
    if label == PERCENT_LABEL {
        label.to_string()
    } else {
        format!(" {label}")
    }
}

/// Labels for `ticks`. Every tick at the maximum carries the unit; any other
/// zero tick is a bare `0`.
pub fn tick_labels(ticks: &[f64], label: &str) -> Vec<String> {
    let max = ticks.last().copied().unwrap_or_default();
    ticks
        .iter()
        .map(|&tick| {
            if tick == max {
                format!("{}{}", format_grouped(tick), unit_suffix(label))
            } else if tick == 0.0 {
                "0".to_string()
            } else {
                format_grouped(tick)
            }
        })
        .collect()
}

/// Everything needed to shade regions and draw the colorbar.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorEncoding {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub colormap: ColorMap,
    pub ticks: Vec<f64>,
    pub labels: Vec<String>,
}

impl ColorEncoding {
    pub fn new(column: &str, values: &[Option<f64>], colormap: ColorMap, label: &str) -> MapResult<Self> {
        let (min, max) = values
            .iter()
            .flatten()
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .ok_or_else(|| MapError::NoNumericValues(column.to_string()))?;

        let ticks = colorbar_ticks(min, max);
        let labels = tick_labels(&ticks, label);
        debug!(column, min, max, ?ticks, "Built colorbar");
        Ok(Self {
            column: column.to_string(),
            min,
            max,
            colormap,
            ticks,
            labels,
        })
    }

    pub fn from_table(table: &GeoTable, column: &str, colormap: ColorMap, label: &str) -> MapResult<Self> {
        Self::new(column, &numeric_values(table, column)?, colormap, label)
    }

    /// Position of `value` along the colorbar, 0 at `min` and 1 at `max`.
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 { (value - self.min) / range } else { 0.0 }
    }

    pub fn color_for(&self, value: f64) -> RGBColor {
        self.colormap.sample(self.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use crate::tabular::DataTable;
    use approx::assert_relative_eq;

    fn columns() -> Vec<String> {
        vec!["FIPS".into(), "Value".into()]
    }

    #[test]
    fn configured_existing_column_is_used() {
        let mut prompt = ScriptedPrompt::default();
        let column = select_color_column(Some("Value"), &columns(), &mut prompt).unwrap();
        assert_eq!(column, "Value");
        assert!(prompt.questions.is_empty());
    }

    #[test]
    fn configured_missing_column_is_corrected_once() {
        let mut prompt = ScriptedPrompt::new(["Value"]);
        let column = select_color_column(Some("value"), &columns(), &mut prompt).unwrap();
        assert_eq!(column, "Value");
        assert_eq!(prompt.questions.len(), 1);
        assert!(prompt.warnings.iter().any(|w| w.contains(r#"["FIPS", "Value"]"#)));
    }

    #[test]
    fn unconfigured_column_is_asked_for() {
        let mut prompt = ScriptedPrompt::new(["Value"]);
        assert_eq!(select_color_column(None, &columns(), &mut prompt).unwrap(), "Value");
        assert!(prompt.warnings.is_empty());
    }

    #[test]
    fn wrong_answer_gets_one_more_round() {
        let mut prompt = ScriptedPrompt::new(["Valeu", "still wrong", "Value"]);
        let column = select_color_column(None, &columns(), &mut prompt).unwrap();
        assert_eq!(column, "still wrong");
        assert_eq!(prompt.remaining(), 1);
    }

    #[test]
    fn colorbar_label_is_prompted_when_missing() {
        let mut prompt = ScriptedPrompt::new(["%"]);
        assert_eq!(resolve_colorbar_label(None, &mut prompt).unwrap(), "%");
        assert_eq!(prompt.warnings.len(), 1);

        let mut prompt = ScriptedPrompt::default();
        assert_eq!(resolve_colorbar_label(Some("people"), &mut prompt).unwrap(), "people");
    }

    #[test]
    fn ticks_from_zero_are_even() {
        let ticks = colorbar_ticks(0.0, 12.5);
        assert_eq!(ticks.len(), TICK_COUNT);
        for (tick, expected) in ticks.iter().zip([0.0, 2.5, 5.0, 7.5, 10.0, 12.5]) {
            assert_relative_eq!(*tick, expected);
        }
    }

    #[test]
    fn ticks_step_by_max_not_range() {
        let ticks = colorbar_ticks(5.0, 10.0);
        assert_eq!(ticks, vec![5.0, 7.0, 9.0, 10.0, 10.0, 10.0]);
    }

    #[test]
    fn ticks_stay_inside_the_domain() {
        for (min, max) in [(-50.0, 20.0), (-30.0, -2.0), (3.0, 3.0), (0.0, 0.0), (0.1, 1e9)] {
            let ticks = colorbar_ticks(min, max);
            assert_eq!(ticks.len(), TICK_COUNT);
            assert_eq!(*ticks.last().unwrap(), max);
            assert!(ticks.iter().all(|t| (min..=max).contains(t)), "{ticks:?}");
            if min >= 0.0 {
                assert!(ticks.windows(2).all(|w| w[0] <= w[1]), "{ticks:?}");
            }
        }
    }

    #[test]
    fn grouped_format_matches_thousands_style() {
        assert_eq!(format_grouped(0.0), "0.00");
        assert_eq!(format_grouped(12.5), "12.50");
        assert_eq!(format_grouped(999.999), "1,000.00");
        assert_eq!(format_grouped(1234567.891), "1,234,567.89");
        assert_eq!(format_grouped(-4321.0), "-4,321.00");
        assert_eq!(format_grouped(100000.0), "100,000.00");
    }

    #[test]
    fn labels_mark_zero_and_unit() {
        let labels = tick_labels(&colorbar_ticks(0.0, 12.5), "%");
        assert_eq!(labels, vec!["0", "2.50", "5.00", "7.50", "10.00", "12.50%"]);

        let labels = tick_labels(&colorbar_ticks(0.0, 5000.0), "people");
        assert_eq!(labels[0], "0");
        assert_eq!(labels[5], "5,000.00 people");
    }

    #[test]
    fn ticks_clamped_to_max_share_the_unit_label() {
        let ticks = colorbar_ticks(40.0, 60.0);
        assert_eq!(ticks, vec![40.0, 52.0, 60.0, 60.0, 60.0, 60.0]);
        let labels = tick_labels(&ticks, "%");
        assert_eq!(labels, vec!["40.00", "52.00", "60.00%", "60.00%", "60.00%", "60.00%"]);
    }

    #[test]
    fn all_zero_ticks_still_carry_the_unit() {
        let labels = tick_labels(&colorbar_ticks(0.0, 0.0), "rate");
        assert!(labels.iter().all(|l| l == "0.00 rate"), "{labels:?}");
    }

    #[test]
    fn nonzero_minimum_is_not_a_bare_zero() {
        let labels = tick_labels(&colorbar_ticks(1.0, 10.0), "x");
        assert_eq!(labels[0], "1.00");
    }

    #[test]
    fn encoding_skips_missing_values() {
        let encoding =
            ColorEncoding::new("Value", &[Some(4.0), None, Some(-1.0), Some(9.0)], ColorMap::Blues, "u")
                .unwrap();
        assert_eq!((encoding.min, encoding.max), (-1.0, 9.0));
        assert_eq!(encoding.ticks.len(), TICK_COUNT);
        assert_relative_eq!(encoding.normalize(4.0), 0.5);
        assert_eq!(encoding.color_for(9.0), ColorMap::Blues.sample(1.0));
    }

    #[test]
    fn encoding_needs_a_value() {
        let err = ColorEncoding::new("Value", &[None, None], ColorMap::Reds, "u").unwrap_err();
        assert!(matches!(err, MapError::NoNumericValues(_)));
    }

    #[test]
    fn flat_domain_normalizes_to_zero() {
        let encoding = ColorEncoding::new("Value", &[Some(12.5)], ColorMap::Reds, "u").unwrap();
        assert_eq!(encoding.normalize(12.5), 0.0);
        assert_eq!(encoding.ticks, vec![12.5; TICK_COUNT]);
    }

    #[test]
    fn numeric_values_parse_text_and_reject_words() {
        let mut table = GeoTable {
            attributes: DataTable::new(vec!["v".into()]),
            shapes: vec![Default::default(); 3],
        };
        table.attributes.rows = vec![
            vec![Cell::Text(" 3.5".into())],
            vec![Cell::Missing],
            vec![Cell::Number(1.0)],
        ];
        assert_eq!(numeric_values(&table, "v").unwrap(), vec![Some(3.5), None, Some(1.0)]);

        table.attributes.rows[1] = vec![Cell::Text("n/a".into())];
        assert!(matches!(
            numeric_values(&table, "v"),
            Err(MapError::NonNumeric { .. })
        ));
        assert!(matches!(
            numeric_values(&table, "w"),
            Err(MapError::UnknownColumn { side: Side::Merged, .. })
        ));
    }
}
