//! Bulk row selection over CSV, TSV and JSON-lines input.

use clap::ValueEnum;
use std::io::{Read, Write};

use crate::error::Result;
use crate::filter::SubnetFilter;
use crate::source::{read_json_lines, DelimitedReader};

/// Input (and output) row format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Comma separated, header record first
    #[default]
    Csv,
    /// Tab separated, header record first
    Tsv,
    /// One JSON object per line
    Jsonl,
}

impl Format {
    /// Get the field delimiter, or `None` for JSON lines.
    pub fn delimiter(self) -> Option<u8> {
        match self {
            Format::Csv => Some(b','),
            Format::Tsv => Some(b'\t'),
            Format::Jsonl => None,
        }
    }
}

/// Options for [`select_rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOptions {
    /// Column holding the IP addresses
    pub column: String,
    /// Row format of input and output
    pub format: Format,
    /// Select the rows that do not match instead
    pub invert: bool,
    /// Write only the number of selected rows
    pub count: bool,
}

impl SelectOptions {
    /// Select matching rows of `column` in CSV format.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            format: Format::Csv,
            invert: false,
            count: false,
        }
    }
}

/// Row counts of one selection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectSummary {
    /// Rows read
    pub total: usize,
    /// Rows selected
    pub selected: usize,
}

impl SelectSummary {
    fn record(&mut self, selected: bool) -> bool {
        self.total += 1;
        if selected {
            self.selected += 1;
        }
        selected
    }
}

/// Copy the rows of `input` that the filter selects to `out`.
///
/// Delimited output starts with the input's header record and quotes fields
/// as needed. JSON-lines rows are written exactly as they were read. With
/// `count` set, only the number of selected rows is written.
pub fn select_rows<R: Read, W: Write>(
    filter: &SubnetFilter,
    options: &SelectOptions,
    input: R,
    mut out: W,
) -> Result<SelectSummary> {
    let mut summary = SelectSummary::default();
    let column = options.column.as_str();

    match options.format.delimiter() {
        Some(delimiter) => {
            let records = DelimitedReader::new(input, delimiter)?;
            if !records.headers().iter().any(|h| h == column) {
                log::warn!("Column {:?} not found in header {:?}", column, records.headers());
            }

            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .flexible(true)
                .from_writer(&mut out);
            if !options.count {
                writer.write_record(records.headers())?;
            }
            for record in records {
                let record = record?;
                if summary.record(filter.test(&record, column) != options.invert) && !options.count {
                    writer.write_record(record.values())?;
                }
            }
            writer.flush()?;
        }
        None => {
            for row in read_json_lines(input) {
                let row = row?;
                if summary.record(filter.test(&row, column) != options.invert) && !options.count {
                    writeln!(out, "{}", row.line())?;
                }
            }
        }
    }

    if options.count {
        writeln!(out, "{}", summary.selected)?;
    }
    out.flush()?;

    log::info!("Selected {} of {} rows", summary.selected, summary.total);
    Ok(summary)
}

/// Write `<address>\t<true|false>` for every address.
pub fn check_addresses<S, W>(filter: &SubnetFilter, addresses: &[S], mut out: W) -> Result<()>
where
    S: AsRef<str>,
    W: Write,
{
    for address in addresses {
        let address = address.as_ref();
        writeln!(out, "{}\t{}", address, filter.matches(address))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(subnets: &[&str], options: &SelectOptions, input: &str) -> (SelectSummary, String) {
        let filter = SubnetFilter::build(subnets).unwrap();
        let mut out = Vec::new();
        let summary = select_rows(&filter, options, input.as_bytes(), &mut out).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    const HOSTS_CSV: &str = "name,ip\nrouter,192.168.1.1\nprinter,192.168.2.7\n\"Doe, John\",10.0.0.1\n";

    #[test]
    fn test_select_csv_writes_header() {
        let options = SelectOptions::new("ip");
        let (summary, out) = run(&["192.168.1.0/24"], &options, HOSTS_CSV);

        assert_eq!(summary, SelectSummary { total: 3, selected: 1 });
        assert_eq!(out, "name,ip\nrouter,192.168.1.1\n");
    }

    #[test]
    fn test_select_csv_keeps_quoted_fields() {
        let options = SelectOptions::new("ip");
        let (summary, out) = run(&["10.0.0.0/8"], &options, HOSTS_CSV);

        assert_eq!(summary.selected, 1);
        assert_eq!(out, "name,ip\n\"Doe, John\",10.0.0.1\n");
    }

    #[test]
    fn test_select_invert() {
        let options = SelectOptions {
            invert: true,
            ..SelectOptions::new("ip")
        };
        let (summary, out) = run(&["192.168.1.0/24"], &options, HOSTS_CSV);

        assert_eq!(summary.selected, 2);
        assert_eq!(out, "name,ip\nprinter,192.168.2.7\n\"Doe, John\",10.0.0.1\n");
    }

    #[test]
    fn test_select_count() {
        let options = SelectOptions {
            count: true,
            ..SelectOptions::new("ip")
        };
        let (_, out) = run(&["192.168.0.0/16"], &options, HOSTS_CSV);

        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_select_tsv() {
        let options = SelectOptions {
            format: Format::Tsv,
            ..SelectOptions::new("src")
        };
        let input = "src\tnote\nfd00::1\tula, internal\n2001:db8::1\tdocs\n";
        let (_, out) = run(&["fc00::/7"], &options, input);

        assert_eq!(out, "src\tnote\nfd00::1\tula, internal\n");
    }

    #[test]
    fn test_select_jsonl_passes_lines_through() {
        let options = SelectOptions {
            format: Format::Jsonl,
            ..SelectOptions::new("ip")
        };
        let input = "{\"zeta\":\"x\",\"ip\":\"10.0.0.1\",\"n\":1.50}\n{\"ip\":\"8.8.8.8\"}\n";
        let (summary, out) = run(&["10.0.0.0/8"], &options, input);

        assert_eq!(summary, SelectSummary { total: 2, selected: 1 });
        assert_eq!(out, "{\"zeta\":\"x\",\"ip\":\"10.0.0.1\",\"n\":1.50}\n");
    }

    #[test]
    fn test_select_missing_column_selects_nothing() {
        let options = SelectOptions::new("address");
        let (summary, out) = run(&["0.0.0.0/0"], &options, HOSTS_CSV);

        assert_eq!(summary.selected, 0);
        assert_eq!(out, "name,ip\n");
    }

    #[test]
    fn test_check_addresses() {
        let filter = SubnetFilter::build(["2001:db8::/32"]).unwrap();
        let mut out = Vec::new();

        check_addresses(&filter, &["2001:db8::1", "192.168.1.1", "bogus"], &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2001:db8::1\ttrue\n192.168.1.1\tfalse\nbogus\tfalse\n"
        );
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(Format::Csv.delimiter(), Some(b','));
        assert_eq!(Format::Tsv.delimiter(), Some(b'\t'));
        assert_eq!(Format::Jsonl.delimiter(), None);
    }
}
