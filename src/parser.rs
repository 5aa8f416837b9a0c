// 🏗️ Table Loader - Delimited text → Interval Store
//
// One loader for every exhibit table: the column mapping says which headers
// mean what, malformed rows are skipped and reported, and only an unreadable
// source or missing required columns fail the load.

use crate::error::{LoadError, MalformedReason, MalformedRecordError};
use crate::schema::{ColumnIndex, ColumnMapping};
use crate::store::{IntervalStore, MembershipKind, MembershipRecord};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

// ============================================================================
// LOAD REPORT
// ============================================================================

/// What happened during a load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Rows turned into records
    pub loaded: usize,

    /// Rows skipped as malformed
    pub skipped: usize,

    /// One entry per skipped row, in source order
    pub errors: Vec<MalformedRecordError>,
}

impl LoadReport {
    fn record_skip(&mut self, error: MalformedRecordError) {
        warn!(line = error.line, reason = %error.reason, "skipping malformed membership row");
        self.skipped += 1;
        self.errors.push(error);
    }

    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }

    pub fn summary(&self) -> String {
        format!("{} rows loaded, {} skipped", self.loaded, self.skipped)
    }
}

/// A loaded table plus its report
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub store: IntervalStore,
    pub report: LoadReport,
}

// ============================================================================
// TABLE LOADER
// ============================================================================

#[derive(Debug, Clone)]
pub struct TableLoader {
    mapping: ColumnMapping,

    /// Kind used when the table has no kind column or the cell is empty
    default_kind: MembershipKind,

    delimiter: u8,
}

impl TableLoader {
    pub fn new(mapping: ColumnMapping) -> Self {
        TableLoader {
            mapping,
            default_kind: MembershipKind::Full,
            delimiter: b',',
        }
    }

    /// Builder: kind for rows that don't say (e.g. an associates-only table)
    pub fn with_kind(mut self, kind: MembershipKind) -> Self {
        self.default_kind = kind;
        self
    }

    /// Builder: field delimiter (default ',')
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Load a table from a file
    pub fn load_path(&self, path: &Path) -> Result<LoadedTable, LoadError> {
        let reader = self
            .reader_builder()
            .from_path(path)
            .map_err(|source| LoadError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), "loading membership table");
        self.load_csv(reader)
    }

    /// Load a table from any reader (file, network body, in-memory bytes)
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<LoadedTable, LoadError> {
        self.load_csv(self.reader_builder().from_reader(reader))
    }

    /// Load already-split rows (header row + data rows)
    pub fn load_rows<H, HS, R, Row, S>(&self, headers: H, rows: R) -> Result<LoadedTable, LoadError>
    where
        H: IntoIterator<Item = HS>,
        HS: AsRef<str>,
        R: IntoIterator<Item = Row>,
        Row: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .collect();
        let index = self.resolve_headers(&headers)?;

        let mut records = Vec::new();
        let mut report = LoadReport::default();

        for (i, row) in rows.into_iter().enumerate() {
            let owned: Vec<String> = row.into_iter().map(|c| c.as_ref().to_string()).collect();
            let cells: Vec<&str> = owned.iter().map(|c| c.trim()).collect();
            self.accept_row(&index, &cells, i + 2, &mut records, &mut report);
        }

        Ok(self.finish(records, report))
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(self.delimiter);
        builder
    }

    fn load_csv<R: Read>(&self, mut reader: csv::Reader<R>) -> Result<LoadedTable, LoadError> {
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let index = self.resolve_headers(&headers)?;

        let mut records = Vec::new();
        let mut report = LoadReport::default();

        for (i, result) in reader.records().enumerate() {
            match result {
                Ok(row) => {
                    let line = row
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(i + 2);
                    let cells: Vec<&str> = row.iter().collect();
                    self.accept_row(&index, &cells, line, &mut records, &mut report);
                }
                Err(err) if err.is_io_error() => return Err(LoadError::Read(err)),
                Err(err) => {
                    let line = err
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(i + 2);
                    report.record_skip(MalformedRecordError {
                        line,
                        reason: MalformedReason::Unreadable(err.to_string()),
                    });
                }
            }
        }

        Ok(self.finish(records, report))
    }

    fn resolve_headers(&self, headers: &[String]) -> Result<ColumnIndex, LoadError> {
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(LoadError::MissingHeaders {
                expected: self.mapping.example_headers(),
            });
        }
        self.mapping.resolve(headers.iter().map(String::as_str))
    }

    fn accept_row(
        &self,
        index: &ColumnIndex,
        cells: &[&str],
        line: usize,
        records: &mut Vec<MembershipRecord>,
        report: &mut LoadReport,
    ) {
        // Blank lines in hand-edited tables are not rows
        if cells.iter().all(|c| c.is_empty()) {
            return;
        }

        match self.parse_row(index, cells, line) {
            Ok(record) => {
                report.loaded += 1;
                records.push(record);
            }
            Err(err) => report.record_skip(err),
        }
    }

    fn finish(&self, records: Vec<MembershipRecord>, report: LoadReport) -> LoadedTable {
        info!(
            loaded = report.loaded,
            skipped = report.skipped,
            "membership table loaded"
        );
        LoadedTable {
            store: IntervalStore::from_records(records),
            report,
        }
    }

    /// Turn one row into a record
    fn parse_row(
        &self,
        index: &ColumnIndex,
        cells: &[&str],
        line: usize,
    ) -> Result<MembershipRecord, MalformedRecordError> {
        let malformed = |reason| MalformedRecordError { line, reason };
        let cell = |idx: usize| cells.get(idx).copied().unwrap_or("");
        let optional = |idx: Option<usize>| {
            idx.map(cell)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let entity_name = cell(index.name);
        if entity_name.is_empty() {
            return Err(malformed(MalformedReason::MissingName));
        }

        let start_raw = cell(index.start_year);
        if start_raw.is_empty() {
            return Err(malformed(MalformedReason::MissingStartYear));
        }
        let start_year = extract_year(start_raw)
            .ok_or_else(|| malformed(MalformedReason::UnparseableStartYear(start_raw.to_string())))?;

        let end_year = match optional(index.end_year) {
            None => None,
            Some(raw) => {
                let end = extract_year(&raw)
                    .ok_or_else(|| malformed(MalformedReason::UnparseableEndYear(raw.clone())))?;
                if end <= start_year {
                    return Err(malformed(MalformedReason::EmptyInterval {
                        start_year,
                        end_year: end,
                    }));
                }
                Some(end)
            }
        };

        let kind = match optional(index.kind) {
            None => self.default_kind,
            Some(raw) => MembershipKind::parse(&raw)
                .ok_or_else(|| malformed(MalformedReason::UnknownKind(raw.clone())))?,
        };

        Ok(MembershipRecord {
            entity_name: entity_name.to_string(),
            start_year,
            end_year,
            joined_date: optional(index.joined_date),
            note: optional(index.note),
            kind,
            line,
        })
    }
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new(ColumnMapping::default())
    }
}

/// Load a comma-separated table with the default column mapping
pub fn load_csv(path: &Path) -> Result<LoadedTable, LoadError> {
    TableLoader::default().load_path(path)
}

/// First run of four ASCII digits in a cell ("1947", "since 1947", "1947-03-28")
pub fn extract_year(raw: &str) -> Option<i32> {
    raw.as_bytes()
        .windows(4)
        .find(|window| window.iter().all(u8::is_ascii_digit))
        .and_then(|window| std::str::from_utf8(window).ok())
        .and_then(|digits| digits.parse().ok())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use std::io::Write;

    const ECE_CSV: &str = "\
Country,Year,Date,Note
France,1947,28 March 1947,Founding member
Czechoslovakia,1947,,
,1955,,Row without a name
Switzerland,1972,24 March 1972,
";

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("1947"), Some(1947));
        assert_eq!(extract_year("since 1947"), Some(1947));
        assert_eq!(extract_year("1947-03-28"), Some(1947));
        assert_eq!(extract_year("ca. 19470"), Some(1947));
        assert_eq!(extract_year("47"), None);
        assert_eq!(extract_year("unknown"), None);
        assert_eq!(extract_year(""), None);
    }

    #[test]
    fn test_load_reader_skips_empty_name() {
        let table = TableLoader::default().load_reader(ECE_CSV.as_bytes()).unwrap();

        assert_eq!(table.report.loaded, 3);
        assert_eq!(table.report.skipped, 1);
        assert_eq!(table.report.errors[0].reason, MalformedReason::MissingName);
        assert_eq!(table.report.errors[0].line, 4);
        assert_eq!(table.store.len(), 3);
        assert!(table
            .store
            .records()
            .iter()
            .all(|r| !r.entity_name.is_empty()));
    }

    #[test]
    fn test_load_reader_optional_fields() {
        let table = TableLoader::default().load_reader(ECE_CSV.as_bytes()).unwrap();
        let france = &table.store.records()[0];

        assert_eq!(france.entity_name, "France");
        assert_eq!(france.start_year, 1947);
        assert_eq!(france.end_year, None);
        assert_eq!(france.joined_date.as_deref(), Some("28 March 1947"));
        assert_eq!(france.note.as_deref(), Some("Founding member"));
        assert_eq!(france.line, 2);

        let czechoslovakia = &table.store.records()[1];
        assert_eq!(czechoslovakia.joined_date, None);
        assert_eq!(czechoslovakia.note, None);
    }

    #[test]
    fn test_header_variants_load_identical_records() {
        let variants = [
            "Country,Year,Date,Note",
            "country,year,date,note",
            "Land,Start Year,Joined On,Remarks",
            "State,start_year,joined_date,Notes",
            "name,SINCE,DATE,comment",
            "Land,Jahr,Datum,Note",
        ];

        let body = "France,1947,28 March 1947,Founding member\nSwitzerland,1972,,\n";
        let loader = TableLoader::default();

        let tables: Vec<_> = variants
            .iter()
            .map(|header| {
                let csv = format!("{header}\n{body}");
                loader.load_reader(csv.as_bytes()).unwrap()
            })
            .collect();

        for table in &tables[1..] {
            assert_eq!(table.store, tables[0].store);
            assert_eq!(table.report, tables[0].report);
        }
    }

    #[test]
    fn test_german_headers() {
        let table = TableLoader::default()
            .load_reader("Land,Jahr,Datum\nFrance,1947,28.03.1947\n".as_bytes())
            .unwrap();

        let record = &table.store.records()[0];
        assert_eq!(record.start_year, 1947);
        assert_eq!(record.joined_date.as_deref(), Some("28.03.1947"));
        assert_eq!(
            record.joined_on(),
            chrono::NaiveDate::from_ymd_opt(1947, 3, 28)
        );
    }

    #[test]
    fn test_load_rows_matches_csv() {
        let loader = TableLoader::default();
        let from_rows = loader
            .load_rows(
                ["Country", "Year", "Date", "Note"],
                vec![
                    vec!["France", "1947", "28 March 1947", "Founding member"],
                    vec!["Czechoslovakia", "1947", "", ""],
                    vec!["", "1955", "", "Row without a name"],
                    vec!["Switzerland", "1972", "24 March 1972", ""],
                ],
            )
            .unwrap();
        let from_csv = loader.load_reader(ECE_CSV.as_bytes()).unwrap();

        assert_eq!(from_rows.store, from_csv.store);
        assert_eq!(from_rows.report, from_csv.report);
    }

    #[test]
    fn test_load_end_years_and_kinds() {
        let csv = "\
name,start_year,end_year,kind
Hong Kong,1947,,associate
Soviet Union,1947,1991,
Nowhere,1950,1950,
Somewhere,1950,later,
Elsewhere,1950,,observer
";
        let table = TableLoader::default().load_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.report.loaded, 2);
        assert_eq!(table.report.skipped, 3);
        assert_eq!(
            table.report.errors[0].reason,
            MalformedReason::EmptyInterval {
                start_year: 1950,
                end_year: 1950
            }
        );
        assert_eq!(
            table.report.errors[1].reason,
            MalformedReason::UnparseableEndYear("later".to_string())
        );
        assert_eq!(
            table.report.errors[2].reason,
            MalformedReason::UnknownKind("observer".to_string())
        );

        let records = table.store.records();
        assert_eq!(records[0].kind, MembershipKind::Associate);
        assert_eq!(records[1].end_year, Some(1991));
        assert_eq!(records[1].kind, MembershipKind::Full);
    }

    #[test]
    fn test_default_kind_for_associate_table() {
        let csv = "name,start_year\nHong Kong,1947\nMacao,1991\n";
        let table = TableLoader::default()
            .with_kind(MembershipKind::Associate)
            .load_reader(csv.as_bytes())
            .unwrap();

        assert!(table
            .store
            .records()
            .iter()
            .all(|r| r.kind == MembershipKind::Associate));
    }

    #[test]
    fn test_short_rows_and_blank_lines() {
        let csv = "Country,Year,Date,Note\nFrance,1947\n,,,\nSwitzerland\n";
        let table = TableLoader::default().load_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.report.loaded, 1);
        assert_eq!(table.report.skipped, 1);
        assert_eq!(
            table.report.errors[0].reason,
            MalformedReason::MissingStartYear
        );
    }

    #[test]
    fn test_unparseable_start_year() {
        let csv = "Country,Year\nFrance,unknown\n";
        let table = TableLoader::default().load_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.report.skipped, 1);
        assert_eq!(
            table.report.errors[0].reason,
            MalformedReason::UnparseableStartYear("unknown".to_string())
        );
    }

    #[test]
    fn test_missing_required_column_fails_load() {
        let csv = "Nation,Year\nFrance,1947\n";
        let err = TableLoader::default().load_reader(csv.as_bytes()).unwrap_err();

        match err {
            LoadError::MissingColumns { missing } => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].field, Field::Name);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_source_fails_load() {
        let err = TableLoader::default().load_reader("".as_bytes()).unwrap_err();
        match err {
            LoadError::MissingHeaders { expected } => {
                assert!(expected.starts_with("country,year"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_semicolon_delimiter() {
        let csv = "Land;Jahr\nFrance;1947\n";
        let mapping = ColumnMapping::default().with_alias(Field::StartYear, "Jahr");
        let table = TableLoader::new(mapping)
            .with_delimiter(b';')
            .load_reader(csv.as_bytes())
            .unwrap();

        assert_eq!(table.store.records()[0].entity_name, "France");
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ECE_CSV.as_bytes()).unwrap();

        let table = load_csv(file.path()).unwrap();
        assert_eq!(table.report.summary(), "3 rows loaded, 1 skipped");
        assert!(!table.report.is_clean());
    }

    #[test]
    fn test_load_path_missing_file() {
        let err = load_csv(Path::new("/nonexistent/ece.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/ece.csv"));
    }
}
