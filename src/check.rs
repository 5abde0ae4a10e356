use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::{
    col::{ColName, Column, CreationCounter},
    error::ConversionError,
    settings::Table,
};

/// A cell that failed to convert to its column's type.
#[derive(Debug, Clone, PartialEq)]
pub struct CellFailure {
    pub row: usize,
    pub column: ColName,
    pub error: ConversionError,
}

/// Outcome of checking the sample rows of one table.
#[derive(Debug, Default)]
pub struct TableReport {
    pub rows: usize,
    pub cells: usize,
    /// Cells that converted, but whose re-encoded text differs from the input.
    pub normalized: usize,
    pub failures: Vec<CellFailure>,
}

impl TableReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds one column per schema entry, in declaration order.
///
/// `index` counts every column; `view_index` counts only the columns not
/// listed in `table.hidden`.
pub fn build_columns(table: &Table, counter: &CreationCounter) -> Vec<Column> {
    let mut view_index = 0;
    table
        .schema
        .iter()
        .enumerate()
        .map(|(index, (name, col_type))| {
            let mut col = Column::with_counter(*col_type, counter).with_label(name.as_str());
            col.index = index;
            if !table.hidden.contains(name) {
                col.view_index = view_index;
                view_index += 1;
            }
            col
        })
        .collect()
}

/// Converts every visible cell of the table's sample rows and reports failures.
pub fn check_table(
    table_name: &str,
    table: &Table,
    counter: &CreationCounter,
) -> Result<TableReport> {
    info!("Checking table '{}'", table_name);

    for name in &table.hidden {
        if !table.schema.iter().any(|(col_name, _)| col_name == name) {
            bail!(
                "Hidden column '{}' is not in the schema of table '{}'",
                name,
                table_name
            );
        }
    }

    let columns = build_columns(table, counter);
    for col in &columns {
        debug!(
            "Column {} index={} view_index={} order={}",
            col,
            col.index,
            col.view_index,
            col.creation_order()
        );
    }

    let mut report = TableReport::default();
    for (row_idx, row) in table.rows.iter().enumerate() {
        if row.len() != columns.len() {
            bail!(
                "Row {} of table '{}' has {} cells, schema has {} columns",
                row_idx,
                table_name,
                row.len(),
                columns.len()
            );
        }

        for (col, raw) in columns.iter().zip(row) {
            if table.hidden.iter().any(|h| col.label() == Some(h.as_str())) {
                continue;
            }
            report.cells += 1;

            match col.from_str(Some(raw.as_str())) {
                Ok(value) => {
                    let encoded = col.to_str(value.as_ref());
                    if &encoded != raw {
                        debug!("Row {} {}: {:?} -> {:?}", row_idx, col, raw, encoded);
                        report.normalized += 1;
                    }
                }
                Err(error) => {
                    warn!("Row {} {}: {}", row_idx, col, error);
                    report.failures.push(CellFailure {
                        row: row_idx,
                        column: col.verbose_name().to_string(),
                        error,
                    });
                }
            }
        }
        report.rows += 1;
    }

    info!(
        "Checked table '{}': {} rows, {} cells, {} normalized, {} failed",
        table_name,
        report.rows,
        report.cells,
        report.normalized,
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::col::ColType;

    fn table(schema: &[(&str, ColType)], hidden: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            schema: schema.iter().map(|(n, t)| (n.to_string(), *t)).collect(),
            hidden: hidden.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn indices_skip_hidden_columns_in_view() {
        let t = table(
            &[("a", ColType::Text), ("b", ColType::Int), ("c", ColType::Float)],
            &["b"],
            &[],
        );
        let counter = CreationCounter::new();
        let cols = build_columns(&t, &counter);

        let positions: Vec<_> = cols.iter().map(|c| (c.index, c.view_index)).collect();
        assert_eq!(positions, vec![(0, 0), (1, 0), (2, 1)]);

        let orders: Vec<_> = cols.iter().map(Column::creation_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(cols[1].label(), Some("b"));
    }

    #[test]
    fn reports_failures_and_normalization() {
        let t = table(
            &[("name", ColType::Text), ("age", ColType::Int), ("born", ColType::Date)],
            &[],
            &[
                &["Ann", "41", "1982-03-01"],
                &["Bob", "forty", "March 1, 1982"],
                &["", "", ""],
            ],
        );
        let report = check_table("people", &t, &CreationCounter::new()).unwrap();

        assert_eq!(report.rows, 3);
        assert_eq!(report.cells, 9);
        assert_eq!(report.normalized, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 1);
        assert_eq!(report.failures[0].column, "age");
        assert_eq!(report.failures[0].error.target, ColType::Int);
        assert!(!report.is_clean());
    }

    #[test]
    fn hidden_cells_are_not_converted() {
        let t = table(
            &[("id", ColType::Int), ("note", ColType::Int)],
            &["note"],
            &[&["1", "not a number"]],
        );
        let report = check_table("t", &t, &CreationCounter::new()).unwrap();
        assert_eq!(report.cells, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn rejects_ragged_rows() {
        let t = table(&[("id", ColType::Int)], &[], &[&["1", "2"]]);
        let err = check_table("t", &t, &CreationCounter::new()).unwrap_err();
        assert!(err.to_string().contains("has 2 cells"));
    }

    #[test]
    fn rejects_unknown_hidden_column() {
        let t = table(&[("id", ColType::Int)], &["ghost"], &[]);
        let err = check_table("t", &t, &CreationCounter::new()).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
