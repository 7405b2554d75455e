// join.rs

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{MapError, MapResult, Side};
use crate::geometry::GeoTable;
use crate::prompt::Prompt;
use crate::resolve::Resolution;
use crate::tabular::{Cell, DataTable};

/// Suffixes for non-key columns present on both sides of a join.
pub const GEOMETRY_SUFFIX: &str = "_x";
pub const DATA_SUFFIX: &str = "_y";

/// Columns that link boundary records to data records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinSpec {
    Shared(String),
    Pair { geometry: String, data: String },
}

impl JoinSpec {
    pub fn pair(geometry: impl Into<String>, data: impl Into<String>) -> Self {
        JoinSpec::Pair {
            geometry: geometry.into(),
            data: data.into(),
        }
    }

    /// Key column names as `(geometry side, data side)`.
    pub fn keys(&self) -> (&str, &str) {
        match self {
            JoinSpec::Shared(column) => (column, column),
            JoinSpec::Pair { geometry, data } => (geometry, data),
        }
    }

    pub fn is_valid_for(&self, geometry_columns: &[String], data_columns: &[String]) -> bool {
        let (geometry, data) = self.keys();
        geometry_columns.iter().any(|c| c == geometry) && data_columns.iter().any(|c| c == data)
    }
}

/// Join-related settings, any of which may be missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinConfig<'a> {
    pub merge_on: Option<&'a str>,
    pub merge_on_geometries: Option<&'a str>,
    pub merge_on_data: Option<&'a str>,
}

impl JoinConfig<'_> {
    /// A shared column wins over a pair; a pair needs both halves.
    pub fn configured_spec(&self) -> Option<JoinSpec> {
        match (self.merge_on, self.merge_on_geometries, self.merge_on_data) {
            (Some(on), _, _) => Some(JoinSpec::Shared(on.to_string())),
            (None, Some(geometry), Some(data)) => Some(JoinSpec::pair(geometry, data)),
            _ => None,
        }
    }
}

/// Column names present on both sides, in geometry order.
pub fn common_columns(geometry_columns: &[String], data_columns: &[String]) -> Vec<String> {
    geometry_columns
        .iter()
        .filter(|c| data_columns.contains(c))
        .cloned()
        .collect()
}

fn ask_pair(
    prompt: &mut dyn Prompt,
    geometry_columns: &[String],
    data_columns: &[String],
) -> MapResult<JoinSpec> {
    prompt.list("The columns in your geometries file are", geometry_columns);
    let geometry = prompt.ask("Enter exact name of geometries file column name to merge on: ")?;
    prompt.list("The columns in your data file are", data_columns);
    let data = prompt.ask("Enter exact name of data file column name to merge on: ")?;
    Ok(JoinSpec::Pair { geometry, data })
}

/// Works out which columns to join on, asking the operator when the
/// configuration is missing or names columns that do not exist.
pub fn resolve_join_spec(
    config: JoinConfig<'_>,
    geometry_columns: &[String],
    data_columns: &[String],
    prompt: &mut dyn Prompt,
) -> MapResult<JoinSpec> {
    let common = common_columns(geometry_columns, data_columns);

    Resolution::classify(config.configured_spec(), |spec| {
        spec.is_valid_for(geometry_columns, data_columns)
    })
    .resolve(
        prompt,
        |prompt, invalid| -> MapResult<JoinSpec> {
            match invalid {
                JoinSpec::Shared(_) => {
                    if common.is_empty() {
                        return Err(MapError::NoCommonColumns);
                    }
                    prompt.warn("You're trying to merge on a column name that doesn't exist either in the geometries file or the data file.");
                    prompt.list(
                        "Your geometries and data files have these columns in common you can merge on",
                        &common,
                    );
                    let answer = prompt
                        .ask("Enter exact name of the common column name you want to merge on: ")?;
                    Ok(JoinSpec::Shared(answer))
                }
                JoinSpec::Pair { .. } => {
                    prompt.warn("You're trying to merge on a column name that doesn't exist either in the geometries file or the data file.");
                    ask_pair(prompt, geometry_columns, data_columns)
                }
            }
        },
        |prompt| {
            prompt.warn("You haven't set column names to merge on for both the geometries and the data files.");
            ask_pair(prompt, geometry_columns, data_columns)
        },
    )
}

/// Hashable form of a key cell. Missing cells never produce a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyValue {
    Text(String),
    Number(u64),
}

impl KeyValue {
    fn of(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Text(s) => Some(KeyValue::Text(s.clone())),
            // -0.0 and 0.0 compare equal, so they must hash the same
            Cell::Number(n) if *n == 0.0 => Some(KeyValue::Number(0f64.to_bits())),
            Cell::Number(n) => Some(KeyValue::Number(n.to_bits())),
            Cell::Missing => None,
        }
    }
}

fn column_or_err(table: &DataTable, column: &str, side: Side) -> MapResult<usize> {
    table.column_index(column).ok_or_else(|| MapError::UnknownColumn {
        column: column.to_string(),
        side,
    })
}

/// Inner equi-join of boundaries and data on `spec`.
///
/// The key column appears once when both key names are equal. Any other name
/// found on both sides gets a side suffix so no attribute is lost.
pub fn merge(geometries: &GeoTable, data: &DataTable, spec: &JoinSpec) -> MapResult<GeoTable> {
    let (geometry_key, data_key) = spec.keys();
    let geometry_index = column_or_err(&geometries.attributes, geometry_key, Side::Geometries)?;
    let data_index = column_or_err(data, data_key, Side::Data)?;
    let same_key = geometry_key == data_key;

    let is_shared_key = |name: &str| same_key && name == geometry_key;
    let mut columns = Vec::with_capacity(geometries.columns().len() + data.columns.len());
    for name in geometries.columns() {
        if !is_shared_key(name) && data.has_column(name) {
            columns.push(format!("{name}{GEOMETRY_SUFFIX}"));
        } else {
            columns.push(name.clone());
        }
    }
    let mut data_kept = Vec::with_capacity(data.columns.len());
    for (i, name) in data.columns.iter().enumerate() {
        if same_key && i == data_index {
            continue;
        }
        if geometries.attributes.has_column(name) {
            columns.push(format!("{name}{DATA_SUFFIX}"));
        } else {
            columns.push(name.clone());
        }
        data_kept.push(i);
    }

    let mut by_key: HashMap<KeyValue, Vec<usize>> = HashMap::new();
    for (i, row) in data.rows.iter().enumerate() {
        if let Some(key) = KeyValue::of(&row[data_index]) {
            by_key.entry(key).or_default().push(i);
        }
    }

    let mut merged = GeoTable {
        attributes: DataTable::new(columns),
        shapes: Vec::new(),
    };
    for (row, shape) in geometries.attributes.rows.iter().zip(&geometries.shapes) {
        let Some(matches) = KeyValue::of(&row[geometry_index]).and_then(|k| by_key.get(&k)) else {
            continue;
        };
        for &m in matches {
            let mut cells = row.clone();
            cells.extend(data_kept.iter().map(|&i| data.rows[m][i].clone()));
            merged.attributes.rows.push(cells);
            merged.shapes.push(shape.clone());
        }
    }

    info!(
        geometry_rows = geometries.len(),
        data_rows = data.len(),
        merged_rows = merged.len(),
        "Merged geometries with data"
    );
    debug!(columns = ?merged.columns(), "Merged columns");
    Ok(merged)
}
