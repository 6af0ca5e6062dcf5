use crate::errors::{ServiceError, ServiceResult};
use crate::types::{value_text, Record};
use csv::{QuoteStyle, WriterBuilder};

/// Convert flat records to comma-separated text.
///
/// The header is the first record's keys, in insertion order. Every data
/// field is quoted with inner quotes doubled; nulls and missing keys are
/// empty. Rows are separated by `\n` with no trailing newline.
pub fn export_table(rows: &[Record]) -> ServiceResult<String> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut buffer = Vec::new();
    {
        let mut header_writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_writer(&mut buffer);
        header_writer.write_record(&headers).map_err(csv_error)?;
        header_writer.flush().map_err(|e| ServiceError::Export(e.to_string()))?;
    }
    {
        let mut row_writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(&mut buffer);
        for row in rows {
            let values: Vec<String> = headers
                .iter()
                .map(|header| row.get(*header).map(value_text).unwrap_or_default())
                .collect();
            row_writer.write_record(&values).map_err(csv_error)?;
        }
        row_writer.flush().map_err(|e| ServiceError::Export(e.to_string()))?;
    }

    let mut text = String::from_utf8(buffer).map_err(|e| ServiceError::Export(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

fn csv_error(err: csv::Error) -> ServiceError {
    ServiceError::Export(format!("CSV write failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn parse(text: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn test_empty_input_is_empty_text() {
        assert_eq!(export_table(&[]).unwrap(), "");
    }

    #[test]
    fn test_quoting_and_escaping() {
        let rows = vec![record(json!({"name": "Puits \"Nord\"", "count": 12, "note": null}))];
        let text = export_table(&rows).unwrap();
        assert_eq!(text, "name,count,note\n\"Puits \"\"Nord\"\"\",\"12\",\"\"");
    }

    #[test]
    fn test_header_from_first_record_only() {
        let rows = vec![
            record(json!({"code": "B-1", "age": 30})),
            record(json!({"code": "B-2", "extra": "ignored"})),
        ];
        let (headers, parsed) = parse(&export_table(&rows).unwrap());
        assert_eq!(headers, vec!["code", "age"]);
        assert_eq!(parsed[1], vec!["B-2", ""]);
    }

    #[test]
    fn test_reparse_recovers_values() {
        let rows = vec![
            record(json!({"name": "Forum, Kaolack", "results": "line one\nline two", "status": "done"})),
            record(json!({"name": "\"Quoted\"", "results": "", "status": "planned"})),
        ];
        let (headers, parsed) = parse(&export_table(&rows).unwrap());
        assert_eq!(headers, vec!["name", "results", "status"]);
        for (original, reparsed) in rows.iter().zip(parsed) {
            let expected: Vec<String> = original.values().map(value_text).collect();
            assert_eq!(reparsed, expected);
        }
    }
}
