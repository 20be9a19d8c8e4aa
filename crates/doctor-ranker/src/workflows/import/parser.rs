use super::ImportError;

/// One data row as read from the payload. `row` counts data rows from 1,
/// excluding the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row: usize,
    pub cells: Vec<String>,
    /// Reader error for rows that could not be decoded.
    pub error: Option<String>,
}

/// Header plus data rows of a delimited payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Reads delimited text with a header row. Quoted fields may contain the
/// delimiter and line breaks. Only an empty payload or a blank header fails
/// the whole parse; unreadable rows are carried forward for validation.
pub fn parse(raw: &str) -> Result<ParsedTable, ImportError> {
    let text = raw.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(ImportError::EmptyInput);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect::<Vec<_>>(),
        None => return Err(ImportError::EmptyInput),
    };
    if headers.iter().all(|header| header.is_empty()) {
        return Err(ImportError::MissingHeader);
    }

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        // Separator rows are skipped but still hold their place in the numbering.
        let row = index + 1;
        match record {
            Ok(record) => {
                if record.iter().all(str::is_empty) {
                    continue;
                }
                rows.push(RawRow {
                    row,
                    cells: record.iter().map(str::to_string).collect(),
                    error: None,
                });
            }
            Err(error) => rows.push(RawRow {
                row,
                cells: Vec::new(),
                error: Some(error.to_string()),
            }),
        }
    }

    Ok(ParsedTable { headers, rows })
}

/// Picks comma, tab or semicolon by frequency on the header line.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    [b',', b'\t', b';']
        .into_iter()
        .max_by_key(|delimiter| {
            let count = header.bytes().filter(|byte| byte == delimiter).count();
            // Prefer the comma when counts tie.
            (count, *delimiter == b',')
        })
        .unwrap_or(b',')
}
