use serde::Deserialize;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::engine::ValidationError;
use crate::engine::validate::parse_amount;
use crate::model::{MAX_CUSTOMERS, Request};

/// Errors that can occur when reading request rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open requests: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized request type '{request_type}'")]
    UnrecognizedType { line: usize, request_type: String },

    #[error("line {line}: {source}")]
    Invalid {
        line: usize,
        source: ValidationError,
    },
}

/// `type,v1,v2,v3,v4,v5`; the meaning of each value depends on the type.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InputRow {
    r#type: String,
    v1: Option<String>,
    v2: Option<String>,
    v3: Option<String>,
    v4: Option<String>,
    v5: Option<String>,
}

/// Read calculator requests from a csv file
pub fn read_requests(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Request, CsvError>>, CsvError> {
    let reader = reader_builder().from_path(path).map_err(CsvError::Open)?;
    Ok(requests(reader))
}

/// Read calculator requests from any csv source
pub fn read_requests_from<R: io::Read>(
    source: R,
) -> impl Iterator<Item = Result<Request, CsvError>> {
    requests(reader_builder().from_reader(source))
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All).flexible(true);
    builder
}

fn requests<R: io::Read>(
    reader: csv::Reader<R>,
) -> impl Iterator<Item = Result<Request, CsvError>> {
    reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            into_request(row, line)
        })
}

fn into_request(row: InputRow, line: usize) -> Result<Request, CsvError> {
    let invalid = |source: ValidationError| CsvError::Invalid { line, source };
    let amount = |field: &'static str, value: &Option<String>| {
        parse_amount(field, value.as_deref().unwrap_or_default()).map_err(invalid)
    };

    match row.r#type.as_str() {
        "xrp" => Ok(Request::Xrp {
            balance: amount("balance", &row.v1)?,
            xrp_sent: amount("xrp sent", &row.v2)?,
            usdt_after_sale: amount("usdt after sale", &row.v3)?,
        }),
        "deposit" => Ok(Request::Deposit {
            amount: amount("deposit amount", &row.v1)?,
        }),
        "withdrawal" => Ok(Request::Withdrawal {
            request: amount("withdrawal request", &row.v1)?,
            won: amount("won amount", &row.v2)?,
        }),
        "distribution" => {
            // unreadable customer slots are left empty, like blank ones
            let slots: [Option<String>; MAX_CUSTOMERS] = [row.v1, row.v2, row.v3, row.v4, row.v5];
            let customers = slots.map(|slot| {
                slot.as_deref()
                    .and_then(|text| parse_amount("customer amount", text).ok())
            });
            Ok(Request::Distribution { customers })
        }
        other => Err(CsvError::UnrecognizedType {
            line,
            request_type: other.to_string(),
        }),
    }
}
