//! CSV rendition of a fare workbook.
//!
//! The target directory plays the workbook, each `<sheet name>.csv` file one
//! sheet. The outward leg starts at column 0 and the inward leg one blank
//! column after it. Writing into an existing sheet replaces only the cells the
//! legs cover; everything else in the file is kept.

use std::fs;
use std::path::{Path, PathBuf};

use railfare_core::{leg_columns, Connection, FareRow};
use tracing::{debug, info};

use crate::error::ExportError;
use crate::FareExporter;

type Grid = Vec<Vec<String>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }
}

impl FareExporter for CsvExporter {
    fn export(&self, connection: &Connection, target: &Path) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(target).map_err(|source| ExportError::CreateDir {
            path: target.to_path_buf(),
            source,
        })?;

        let path = sheet_path(target, connection);
        let mut grid = if path.exists() {
            debug!(path = %path.display(), "Overlaying existing sheet");
            read_grid(&path)?
        } else {
            Grid::new()
        };

        let outward = leg_block(&connection.outward);
        let inward_col = outward.first().map_or(0, Vec::len) + 1;
        overlay(&mut grid, &outward, 0);
        if let Some(inward) = &connection.inward {
            overlay(&mut grid, &leg_block(inward), inward_col);
        }

        write_grid(&path, grid)?;
        info!(
            path = %path.display(),
            outward_days = connection.outward.len(),
            inward_days = connection.inward.as_ref().map_or(0, Vec::len),
            "Wrote fare sheet"
        );
        Ok(path)
    }
}

/// File holding `connection`'s sheet inside `dir`.
pub fn sheet_path(dir: &Path, connection: &Connection) -> PathBuf {
    let name: String = connection
        .sheet_name()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    dir.join(format!("{name}.csv"))
}

/// Header row plus one row per day.
fn leg_block(rows: &[FareRow]) -> Grid {
    let header = leg_columns().into_iter().map(str::to_string).collect();
    let body = rows.iter().map(|row| {
        let mut cells = vec![row.date.format("%Y-%m-%d").to_string(), row.best.to_string()];
        cells.extend(row.intervals.iter().map(f64::to_string));
        cells
    });
    std::iter::once(header).chain(body).collect()
}

fn overlay(grid: &mut Grid, block: &Grid, start_col: usize) {
    if grid.len() < block.len() {
        grid.resize_with(block.len(), Vec::new);
    }
    for (row, cells) in grid.iter_mut().zip(block) {
        let end = start_col + cells.len();
        if row.len() < end {
            row.resize(end, String::new());
        }
        row[start_col..end].clone_from_slice(cells);
    }
}

fn read_grid(path: &Path) -> Result<Grid, ExportError> {
    let read_err = |source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;
    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(read_err)
        })
        .collect()
}

/// Write `grid` padded to a rectangle, replacing `path` atomically.
///
/// On failure `path` is untouched and no temp file is left behind.
fn write_grid(path: &Path, mut grid: Grid) -> Result<(), ExportError> {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut grid {
        row.resize(width, String::new());
    }

    let tmp_path = path.with_extension("csv.tmp");
    let written = write_rows(&tmp_path, path, &grid).and_then(|()| {
        fs::rename(&tmp_path, path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    });
    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            debug!(error = %e, path = %tmp_path.display(), "Temp sheet not removed");
        }
    }
    written
}

fn write_rows(tmp_path: &Path, path: &Path, grid: &Grid) -> Result<(), ExportError> {
    let write_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(tmp_path).map_err(write_err)?;
    for row in grid {
        writer.write_record(row).map_err(write_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: tmp_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use railfare_core::DayFare;

    use super::*;

    fn leg(start_day: u32, days: u32, base: f64) -> Vec<DayFare> {
        (0..days)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2024, 10, start_day + i).unwrap();
                let p = base + i as f64;
                DayFare::new(date, [p + 5.0, p + 3.0, p, p + 1.5, p + 9.0, p + 2.0])
            })
            .collect()
    }

    fn read(path: &Path) -> Grid {
        read_grid(path).unwrap()
    }

    #[test]
    fn one_way_occupies_outward_columns_only() {
        let dir = tempfile::tempdir().unwrap();
        let connection = Connection::assemble("Berlin", "Hamburg", &leg(14, 3, 20.0), None);

        let path = CsvExporter::new().export(&connection, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("Berlin -> Hamburg.csv"));

        let grid = read(&path);
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().all(|row| row.len() == 8));
        assert_eq!(grid[0], leg_columns());
        assert_eq!(grid[1][0], "2024-10-14");
        assert_eq!(grid[1][1], "20");
        assert_eq!(grid[3][1], "22");
    }

    #[test]
    fn inward_starts_after_a_blank_column() {
        let dir = tempfile::tempdir().unwrap();
        let connection = Connection::assemble(
            "Berlin",
            "Hamburg",
            &leg(14, 2, 20.0),
            Some(&leg(14, 2, 30.0)),
        );

        let path = CsvExporter::new().export(&connection, dir.path()).unwrap();
        let grid = read(&path);
        assert_eq!(grid[0].len(), 17);
        assert_eq!(grid[0][8], "");
        assert_eq!(grid[0][9], "date");
        assert_eq!(grid[1][10], "30");
        assert_eq!(grid[1][8], "");
    }

    #[test]
    fn overlay_keeps_cells_outside_written_legs() {
        let dir = tempfile::tempdir().unwrap();
        let round = Connection::assemble(
            "Berlin",
            "Hamburg",
            &leg(1, 4, 20.0),
            Some(&leg(1, 4, 30.0)),
        );
        let exporter = CsvExporter::new();
        exporter.export(&round, dir.path()).unwrap();

        // A shorter one-way rerun replaces the first outward rows only.
        let rerun = Connection::assemble("Berlin", "Hamburg", &leg(20, 2, 50.0), None);
        let path = exporter.export(&rerun, dir.path()).unwrap();

        let grid = read(&path);
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[1][0], "2024-10-20");
        assert_eq!(grid[1][1], "50");
        // Outward rows beyond the rerun survive.
        assert_eq!(grid[4][0], "2024-10-04");
        // The inward block survives untouched.
        assert_eq!(grid[1][9], "2024-10-01");
        assert_eq!(grid[4][10], "33");
    }

    #[test]
    fn sheets_are_per_direction() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new();
        let there = Connection::assemble("A", "B", &leg(1, 1, 10.0), None);
        let back = Connection::assemble("B", "A", &leg(1, 1, 10.0), None);
        exporter.export(&there, dir.path()).unwrap();
        exporter.export(&back, dir.path()).unwrap();
        assert!(dir.path().join("A -> B.csv").exists());
        assert!(dir.path().join("B -> A.csv").exists());
    }

    #[test]
    fn slashes_in_station_names_are_replaced() {
        let connection = Connection::assemble("Frankfurt/Main", "Köln", &[], None);
        assert_eq!(
            sheet_path(Path::new("out"), &connection),
            Path::new("out").join("Frankfurt_Main -> Köln.csv")
        );
    }

    #[test]
    fn failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Berlin -> Köln.csv");
        // A non-empty directory in the sheet's place cannot be renamed over.
        fs::create_dir_all(path.join("blocker")).unwrap();

        let err = write_grid(&path, vec![vec!["date".into()]]).unwrap_err();

        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!path.with_extension("csv.tmp").exists());
        assert!(path.join("blocker").is_dir());
    }
}
