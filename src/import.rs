// CSV import of incomes
//
// Expected header: Value_In_Cent,Name,Surname,Sex,Source
// Rows become views; the service decides which ones are valid.

use crate::entities::Sex;
use crate::error::{Error, Result};
use crate::views::{IncomeSourceView, IncomeView, PersonView};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct IncomeRow {
    #[serde(rename = "Value_In_Cent")]
    value_in_cent: i64,

    #[serde(rename = "Name", default)]
    name: Option<String>,

    #[serde(rename = "Surname", default)]
    surname: Option<String>,

    #[serde(rename = "Sex", default)]
    sex: Option<String>,

    #[serde(rename = "Source", default)]
    source: Option<String>,
}

impl IncomeRow {
    fn into_view(self, line: usize) -> Result<IncomeView> {
        let sex = match self.sex.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<Sex>().map_err(|e| {
                Error::validation("Sex", &e.to_string(), &format!("CSV line {}", line))
            })?),
        };

        Ok(IncomeView::new(
            self.value_in_cent,
            PersonView {
                id: None,
                name: self.name,
                surname: self.surname,
                sex,
            },
            IncomeSourceView {
                id: None,
                name: self.source,
                description: None,
            },
        ))
    }
}

/// One data row of an import file: its line number and the parsed view,
/// or the reason the row could not be read
#[derive(Debug)]
pub struct CsvRow {
    pub line: usize,
    pub parsed: Result<IncomeView>,
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<CsvRow>> {
    let file = std::fs::File::open(csv_path)?;
    read_csv(file)
}

/// Parse every row independently. Only I/O failures abort the read; a
/// malformed row is returned as an error for that line.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<CsvRow>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in rdr.deserialize::<IncomeRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let parsed = match result {
            Ok(row) => row.into_view(line),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(e.into()),
        };
        rows.push(CsvRow { line, parsed });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Value_In_Cent,Name,Surname,Sex,Source\n";

    fn views(rows: Vec<CsvRow>) -> Vec<IncomeView> {
        rows.into_iter().map(|row| row.parsed.unwrap()).collect()
    }

    #[test]
    fn test_read_rows() {
        let data = format!("{}500000,Anna,Kowalska,FEMALE,Salary\n-1200,Jan,,,Refund\n", HEADER);

        let rows = read_csv(data.as_bytes()).unwrap();
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);

        let views = views(rows);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].income_value_in_cent, 500000);
        assert_eq!(views[0].person.sex, Some(Sex::Female));
        assert_eq!(views[0].income_source.name.as_deref(), Some("Salary"));
        assert_eq!(views[1].income_value_in_cent, -1200);
        assert_eq!(views[1].person.surname, None);
        assert_eq!(views[1].person.sex, None);
    }

    #[test]
    fn test_missing_name_is_kept_for_validation() {
        let data = format!("{}100,,Nowak,,Salary\n", HEADER);
        let views = views(read_csv(data.as_bytes()).unwrap());
        assert_eq!(views[0].person.name, None);
    }

    #[test]
    fn test_bad_rows_do_not_hide_good_ones() {
        let data = format!(
            "{}100,Anna,,,Salary\n200,Jan,,X,Salary\nlots,Ola,,,Gift\n300,Ewa,,,Gift\n",
            HEADER
        );

        let rows = read_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 4);
        assert!(rows[0].parsed.is_ok());
        assert!(rows[3].parsed.is_ok());

        let bad_sex = rows[1].parsed.as_ref().unwrap_err();
        assert!(bad_sex.is_validation());
        assert!(bad_sex.to_string().contains("CSV line 3"), "{}", bad_sex);

        assert_eq!(rows[2].line, 4);
        assert!(matches!(rows[2].parsed, Err(Error::Csv(_))));
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Value_In_Cent,Name,Surname,Sex,Source").unwrap();
        writeln!(file, "42,Ewa,,,Gift").unwrap();

        let views = views(load_csv(file.path()).unwrap());
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].person.name.as_deref(), Some("Ewa"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_csv(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
