use crate::domain::model::{
    InputRecord, Outcome, OutputRecord, ENRICHMENT_COLUMNS, INPUT_COLUMNS,
};
use crate::utils::error::{EnrichError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Merges rows with their outcomes. `outcomes[i]` belongs to `records[i]`;
/// every record yields exactly one output row, in input order.
pub fn assemble(records: &[InputRecord], outcomes: Vec<Outcome>) -> Vec<OutputRecord> {
    if outcomes.len() != records.len() {
        tracing::warn!(
            "Outcome count {} does not match row count {}, missing rows stay blank",
            outcomes.len(),
            records.len()
        );
    }

    let mut outcomes = outcomes.into_iter();
    records
        .iter()
        .enumerate()
        .map(|(index, record)| match outcomes.next() {
            Some(Outcome::Success(result)) => OutputRecord::new(record, result),
            Some(Outcome::Failure(error)) => {
                tracing::warn!(
                    row = index + 1,
                    company = %record.company_name,
                    "Enrichment failed, writing blank contact fields: {}",
                    error
                );
                OutputRecord::blank(record)
            }
            None => OutputRecord::blank(record),
        })
        .collect()
}

/// Serializes rows as CSV. The header is written even when there are no rows.
pub fn write_csv(rows: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(INPUT_COLUMNS.iter().chain(ENRICHMENT_COLUMNS.iter()))?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EnrichError::ProcessingError {
            message: format!("failed to flush CSV output: {}", e),
        })
}

/// Parses the input table, requiring all six input columns.
pub fn read_csv(data: &[u8]) -> Result<Vec<InputRecord>> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = INPUT_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(EnrichError::InputError {
            message: format!("missing required column(s): {}", missing.join(", ")),
        });
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: InputRecord = row?;
        records.push(record);
    }
    Ok(records)
}
