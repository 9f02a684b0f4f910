use crate::domain::model::{Cell, HeaderRow, OutputRow, Submission};
use chrono::{DateTime, Utc};

/// Header name whose column always receives the server time.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Lines a submission up against the header row.
///
/// Each header position is resolved on its own, so duplicated header names
/// all receive the same value. Submitted keys with no matching header are
/// dropped, and headers with no submitted key produce [`Cell::Empty`].
pub fn build_output_row(
    header: &HeaderRow,
    submission: &Submission,
    now: DateTime<Utc>,
) -> OutputRow {
    let cells = header
        .names()
        .iter()
        .map(|name| {
            if name == TIMESTAMP_FIELD {
                Cell::Timestamp(now)
            } else {
                submission
                    .get(name)
                    .map(|value| Cell::Text(value.to_string()))
                    .unwrap_or(Cell::Empty)
            }
        })
        .collect();

    OutputRow::new(cells)
}
