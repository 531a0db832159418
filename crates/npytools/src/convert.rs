use std::error::Error;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use npystream::{DType, Layout, NpyError, NpyWriter, StreamConfig, Value};

pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// one column of the output, `a:i4` or `i4`
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub label: Option<String>,
    pub dtype: DType,
}

/// has_headers: first row holds column names and is not data
/// labels_from_header: name unlabeled fields after the header row
/// delimiter: field separator
#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub has_headers: bool,
    pub labels_from_header: bool,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            has_headers: false,
            labels_from_header: false,
            delimiter: b',',
        }
    }
}

/// parses `a:i4,b:f4` or `i4,f4`
pub fn parse_fields(spec: &str) -> std::result::Result<Vec<FieldSpec>, NpyError> {
    spec.split(',').map(parse_field).collect()
}

fn parse_field(part: &str) -> std::result::Result<FieldSpec, NpyError> {
    let part = part.trim();
    let field = match part.rfind(':') {
        Some(idx) => FieldSpec {
            label: Some(part[..idx].trim().to_owned()),
            dtype: part[idx + 1..].parse()?,
        },
        None => FieldSpec {
            label: None,
            dtype: part.parse()?,
        },
    };
    Ok(field)
}

/// Explicit labels win, then the CSV header row, then `f0, f1, ...`.
pub fn build_layout(fields: &[FieldSpec], header: Option<&StringRecord>) -> npystream::Result<Layout> {
    let dtypes: Vec<DType> = fields.iter().map(|f| f.dtype).collect();
    let labels: Vec<&str> = fields.iter().filter_map(|f| f.label.as_deref()).collect();

    if !labels.is_empty() {
        return Layout::structured(&labels, &dtypes);
    }
    match header {
        Some(row) => {
            let names: Vec<&str> = row.iter().map(|s| s.trim()).collect();
            Layout::structured(&names, &dtypes)
        }
        None => Layout::implicit(&dtypes),
    }
}

/// Streams every CSV row into `output`, returns the number of records.
pub fn csv_to_npy<R: Read>(
    rdr: R,
    output: &Path,
    fields: &[FieldSpec],
    opts: &CsvOptions,
    config: &StreamConfig,
) -> Result<u64> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(opts.has_headers)
        .delimiter(opts.delimiter)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let header = if opts.has_headers && opts.labels_from_header {
        Some(rdr.headers()?.clone())
    } else {
        None
    };
    let layout = build_layout(fields, header.as_ref())?;
    info!("writing {} as {}", output.display(), layout);

    let mut writer = NpyWriter::create(output, layout, config)?;
    let mut values = Vec::with_capacity(fields.len());
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != fields.len() {
            return Err(format!(
                "row {}: expected {} columns, found {}",
                row + 1,
                fields.len(),
                record.len()
            )
            .into());
        }

        values.clear();
        for (cell, field) in record.iter().zip(fields) {
            values.push(Value::parse(field.dtype, cell)?);
        }
        writer.append_values(&values)?;

        if (row + 1) % 100_000 == 0 {
            debug!("{} rows", row + 1);
        }
    }

    let count = writer.values_written();
    writer.close()?;
    Ok(count)
}
