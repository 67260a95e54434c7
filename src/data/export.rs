use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::SampleSet;
use super::table::TableColumn;

/// Write the visible rows of a table view as CSV, headers first.
pub fn write_csv<W: Write>(
    out: W,
    dataset: &SampleSet,
    indices: &[usize],
    columns: &[TableColumn],
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(columns.iter().map(|c| c.title.as_str()))
        .context("writing CSV header")?;

    for &i in indices {
        let Some(sample) = dataset.samples.get(i) else { continue };
        writer
            .write_record(columns.iter().map(|c| c.cell(sample).to_string()))
            .with_context(|| format!("writing CSV row for sample {i}"))?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

pub fn export_csv(
    path: &Path,
    dataset: &SampleSet,
    indices: &[usize],
    columns: &[TableColumn],
) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(file, dataset, indices, columns)?;
    log::info!("Exported {} rows to {}", indices.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::{Field, Sample};

    #[test]
    fn export_writes_titles_and_visible_rows() {
        let samples = vec![
            Sample {
                geology_code: "LONDON CLAY FORMATION".into(),
                moisture_content: Some(31.5),
                date: NaiveDate::from_ymd_opt(2020, 5, 1),
                ..Default::default()
            },
            Sample {
                geology_code: "GLACIAL DEPOSITS".into(),
                moisture_content: None,
                date: NaiveDate::from_ymd_opt(2021, 1, 9),
                ..Default::default()
            },
            Sample::default(),
        ];
        let ds = SampleSet::new(
            samples,
            BTreeSet::from([Field::GeologyCode, Field::MoistureContent, Field::Date]),
        );
        let columns = vec![
            TableColumn::new(Field::Date),
            TableColumn::titled(Field::GeologyCode, "Geology"),
            TableColumn::titled(Field::MoistureContent, "MC (%)"),
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        export_csv(&path, &ds, &[0, 1], &columns).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Date,Geology,MC (%)",
                "01/05/2020,LONDON CLAY FORMATION,31.5",
                "09/01/2021,GLACIAL DEPOSITS,",
            ]
        );
    }
}
