use super::model::{CellValue, Field, Sample, SampleSet};

/// A displayed column: source field plus header text.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub field: Field,
    pub title: String,
}

impl TableColumn {
    pub fn new(field: Field) -> Self {
        TableColumn {
            field,
            title: field.header().to_string(),
        }
    }

    pub fn titled(field: Field, title: &str) -> Self {
        TableColumn {
            field,
            title: title.to_string(),
        }
    }

    pub fn cell(&self, sample: &Sample) -> CellValue {
        self.field.value(sample)
    }
}

/// Columns for `fields`, keeping only those the table actually has.
pub fn present_columns(dataset: &SampleSet, fields: &[Field]) -> Vec<TableColumn> {
    fields
        .iter()
        .copied()
        .filter(|f| dataset.has(*f))
        .map(TableColumn::new)
        .collect()
}

/// Apply a header rename map; fields without an entry keep their header.
pub fn rename(columns: Vec<TableColumn>, renames: &[(Field, &str)]) -> Vec<TableColumn> {
    columns
        .into_iter()
        .map(|c| match renames.iter().find(|(f, _)| *f == c.field) {
            Some((_, title)) => TableColumn::titled(c.field, title),
            None => c,
        })
        .collect()
}
