//! ---
//! gait_section: "05-replay"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Comma separated leg data loader."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use gait_common::ColumnLayout;
use gait_kinematics::{Segment, TimestepRecord, Vec3};

use crate::error::SourceError;
use crate::recording::Recording;

pub fn load(path: &Path, columns: &ColumnLayout) -> Result<Recording, SourceError> {
    let file = fs::File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    from_reader(file, columns, &path.display().to_string()).map_err(|err| match err {
        SourceError::Csv { source, .. } => SourceError::Csv {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parse rows after the header. Extra columns are ignored.
pub fn from_reader<R: Read>(
    reader: R,
    columns: &ColumnLayout,
    name: &str,
) -> Result<Recording, SourceError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    let mut timestamps = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|source| SourceError::Csv {
            path: name.into(),
            source,
        })?;
        // Header is row 1.
        let row_number = index as u64 + 2;
        records.push(parse_row(&row, columns, row_number)?);
        if let Some(time) = columns.time {
            timestamps.push(parse_cell::<f64>(&row, time, row_number)?);
        }
    }
    let recording = Recording::new(name, records);
    if columns.time.is_some() {
        recording.with_timestamps(timestamps)
    } else {
        Ok(recording)
    }
}

fn segment_column(columns: &ColumnLayout, segment: Segment) -> usize {
    match segment {
        Segment::LeftThigh => columns.left_thigh,
        Segment::LeftShank => columns.left_shank,
        Segment::RightThigh => columns.right_thigh,
        Segment::RightShank => columns.right_shank,
    }
}

fn parse_row(
    row: &StringRecord,
    columns: &ColumnLayout,
    row_number: u64,
) -> Result<TimestepRecord, SourceError> {
    if row.len() < columns.min_width() {
        return Err(SourceError::Row {
            row: row_number,
            reason: format!(
                "expected at least {} columns, found {}",
                columns.min_width(),
                row.len()
            ),
        });
    }
    let mut vectors = [Vec3::ZERO; 4];
    for segment in Segment::ALL {
        let start = segment_column(columns, segment);
        vectors[segment.index()] = Vec3::new(
            parse_cell(row, start, row_number)?,
            parse_cell(row, start + 1, row_number)?,
            parse_cell(row, start + 2, row_number)?,
        );
    }
    Ok(TimestepRecord::from_fn(|segment| vectors[segment.index()]))
}

fn parse_cell<T>(row: &StringRecord, column: usize, row_number: u64) -> Result<T, SourceError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let cell = row.get(column).unwrap_or_default();
    cell.parse::<T>().map_err(|err| SourceError::Row {
        row: row_number,
        reason: format!("column {column} value `{cell}`: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_of_24(fill: impl Fn(usize) -> f32) -> String {
        (0..24)
            .map(|i| fill(i).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn header() -> String {
        (0..24).map(|i| format!("c{i}")).collect::<Vec<_>>().join(",")
    }

    #[test]
    fn default_layout_maps_named_triples() {
        let mut values = [0.0f32; 24];
        values[0..3].copy_from_slice(&[1.0, 2.0, 3.0]);
        values[6..9].copy_from_slice(&[4.0, 5.0, 6.0]);
        values[12..15].copy_from_slice(&[7.0, 8.0, 9.0]);
        values[18..21].copy_from_slice(&[10.0, 11.0, 12.0]);
        let csv = format!("{}\n{}\n", header(), row_of_24(|i| values[i]));

        let recording = from_reader(csv.as_bytes(), &ColumnLayout::default(), "inline")
            .expect("valid csv");
        assert_eq!(recording.len(), 1);
        let record = recording.records()[0];
        assert_eq!(record.get(Segment::RightShank), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(record.get(Segment::RightThigh), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(record.get(Segment::LeftShank), Vec3::new(7.0, 8.0, 9.0));
        assert_eq!(record.get(Segment::LeftThigh), Vec3::new(10.0, 11.0, 12.0));
        assert!(!recording.has_timestamps());
    }

    #[test]
    fn header_row_is_skipped() {
        let csv = format!("{}\n{}\n{}\n", header(), row_of_24(|_| 0.5), row_of_24(|_| 1.5));
        let recording = from_reader(csv.as_bytes(), &ColumnLayout::default(), "inline")
            .expect("valid csv");
        assert_eq!(recording.len(), 2);
        assert_eq!(recording.records()[1].get(Segment::LeftThigh).x, 1.5);
    }

    #[test]
    fn time_column_yields_timestamps() {
        let columns = ColumnLayout {
            time: Some(23),
            ..ColumnLayout::default()
        };
        let csv = format!(
            "{}\n{}\n{}\n",
            header(),
            row_of_24(|i| if i == 23 { 0.0 } else { 1.0 }),
            row_of_24(|i| if i == 23 { 0.002 } else { 1.0 })
        );
        let recording = from_reader(csv.as_bytes(), &columns, "inline").expect("valid csv");
        assert_eq!(recording.timestamp(0), Some(0.0));
        assert!((recording.timestamp(1).expect("second") - 0.002).abs() < 1e-6);
    }

    #[test]
    fn time_column_keeps_full_precision() {
        let columns = ColumnLayout {
            time: Some(24),
            ..ColumnLayout::default()
        };
        let mut late = row_of_24(|_| 1.0);
        late.push_str(",86400.0001");
        let mut later = row_of_24(|_| 1.0);
        later.push_str(",86400.0002");
        let csv = format!("{},t\n{}\n{}\n", header(), late, later);
        let recording = from_reader(csv.as_bytes(), &columns, "inline").expect("valid csv");
        assert_eq!(recording.timestamp(0), Some(86400.0001));
        assert_eq!(recording.timestamp(1), Some(86400.0002));
        let delta = recording.timestamp(1).expect("t1") - recording.timestamp(0).expect("t0");
        assert!((delta - 0.0001).abs() < 1e-9);
    }

    #[test]
    fn short_rows_are_reported_with_row_number() {
        let csv = format!("{}\n1,2,3\n", header());
        let err = from_reader(csv.as_bytes(), &ColumnLayout::default(), "inline")
            .expect_err("row too short");
        match err {
            SourceError::Row { row, reason } => {
                assert_eq!(row, 2);
                assert!(reason.contains("21"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_cells_are_rejected() {
        let mut row = row_of_24(|_| 0.0);
        row.replace_range(0..1, "abc");
        let csv = format!("{}\n{}\n", header(), row);
        assert!(matches!(
            from_reader(csv.as_bytes(), &ColumnLayout::default(), "inline"),
            Err(SourceError::Row { .. })
        ));
    }
}
