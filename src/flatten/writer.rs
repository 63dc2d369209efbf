use crate::error::{Error, Result};
use crate::flatten::types::{render_value, Table};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write a table as CSV to any sink: header row first, no index column.
///
/// A table with no rows and no columns writes nothing. Rows without columns
/// are written as a single empty field per line (header included) so the
/// row count survives a read back.
pub fn write_table<W: Write>(table: &Table, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if table.num_columns() == 0 {
        if !table.is_empty() {
            csv_writer.write_record([""])?;
            for _ in table.rows() {
                csv_writer.write_record([""])?;
            }
            csv_writer.flush()?;
        }
        return Ok(());
    }

    csv_writer.write_record(table.columns())?;
    for row in table.rows() {
        csv_writer.write_record(row.iter().map(render_value))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a table to `path`, replacing any existing file.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;

    write_table(table, file).map_err(|e| map_csv_error(e, path))?;

    info!(
        path = %path.display(),
        rows = table.num_rows(),
        columns = table.num_columns(),
        "wrote csv"
    );
    Ok(())
}

/// Read a CSV file back into a table. Every cell comes back as a string;
/// empty fields become nulls.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut columns: Vec<String> = reader
        .headers()
        .map_err(|e| map_csv_error(e, path))?
        .iter()
        .map(str::to_string)
        .collect();
    // A lone empty header is how rows without columns are written
    if columns.len() == 1 && columns[0].is_empty() {
        columns.clear();
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| map_csv_error(e, path))?;
        if columns.is_empty() {
            rows.push(Vec::new());
            continue;
        }
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::String(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(Table::from_parts(columns, rows))
}

fn map_csv_error(err: csv::Error, path: &Path) -> Error {
    if err.is_io_error() {
        Error::io(path, err.into())
    } else {
        Error::Csv(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use serde_json::json;

    #[test]
    fn test_write_table_header_and_rows() {
        let table = Table::from_parts(
            vec!["id".into(), "name".into(), "active".into()],
            vec![
                vec![json!(1), json!("Lot, North"), json!(true)],
                vec![json!(2.5), Value::Null, json!(false)],
            ],
        );

        let mut buffer = Vec::new();
        write_table(&table, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert_eq!(output, "id,name,active\n1,\"Lot, North\",true\n2.5,,false\n");
    }

    #[test]
    fn test_write_empty_table() {
        let mut buffer = Vec::new();
        write_table(&Table::new(), &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_rows_without_columns_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty-records.csv");

        let table = flatten(json!([{}, {}]));
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 0);

        write_csv(&table, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\"\"\n\"\"\n\"\"\n");

        let read_back = read_csv(&path).unwrap();
        assert_eq!(read_back.num_rows(), 2);
        assert_eq!(read_back.num_columns(), 0);
    }

    #[test]
    fn test_write_csv_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lot-location.csv");
        std::fs::write(&path, "stale contents that are longer than the table\n").unwrap();

        let table = flatten(json!([{"id": 1}]));
        write_csv(&table, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\n1\n");
    }

    #[test]
    fn test_write_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let table = flatten(json!([
            {"id": 1, "tags": ["a", "b"], "lot": {"row": "A"}},
            {"id": 2, "tags": [], "lot": {"row": "B"}}
        ]));
        write_csv(&table, &path).unwrap();
        let read_back = read_csv(&path).unwrap();

        assert_eq!(read_back.columns(), table.columns());
        assert_eq!(read_back.num_rows(), table.num_rows());
        assert_eq!(read_back.get(0, "id"), Some(&json!("1")));
        assert_eq!(read_back.get(2, "tags"), Some(&Value::Null));
    }

    #[test]
    fn test_write_csv_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let err = write_csv(&flatten(json!({"id": 1})), &path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.exit_code(), 6);
    }
}
