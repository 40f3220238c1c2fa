//! CSV export of visit records

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    error::{AppError, AppResult},
    models::visitor::Visit,
};

pub const CSV_HEADER: [&str; 8] = [
    "Name",
    "Email",
    "Phone",
    "Purpose",
    "Check-In Time",
    "Check-Out Time",
    "Host Name",
    "Company",
];

pub const CSV_FILENAME: &str = "visitors_report.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp(value: Option<DateTime<Utc>>, offset: &FixedOffset) -> String {
    value
        .map(|t| t.with_timezone(offset).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Render visits as CSV, one row per visit in the given order
pub fn write_csv(visits: &[Visit], offset: FixedOffset) -> AppResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for visit in visits {
        let check_in = timestamp(Some(visit.check_in_time), &offset);
        let check_out = timestamp(visit.check_out_time, &offset);
        writer
            .write_record([
                visit.name.as_str(),
                visit.email.as_deref().unwrap_or(""),
                visit.phone.as_str(),
                visit.purpose.as_str(),
                check_in.as_str(),
                check_out.as_str(),
                visit.host_name.as_deref().unwrap_or(""),
                visit.company.as_deref().unwrap_or(""),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV report: {}", e)))
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Internal(format!("Failed to write CSV report: {}", e))
}
