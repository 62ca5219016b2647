use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

use super::ToolOutcome;

/// The model must never guess the date; these two tools are its only source
/// of "now" when filling in `addEatenFood` dates.
pub fn current_iso_time() -> ToolOutcome {
    match OffsetDateTime::now_utc().format(&Rfc3339) {
        Ok(time) => ToolOutcome::ok("Current time fetched.", json!({ "time": time })),
        Err(e) => ToolOutcome::fail(format!("Failed to format current time: {e}")),
    }
}

pub fn current_local_time() -> ToolOutcome {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    match now.format(&format) {
        Ok(time) => ToolOutcome::ok("Current local time fetched.", json!({ "time": time })),
        Err(e) => ToolOutcome::fail(format!("Failed to format current time: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_time_is_rfc3339() {
        let outcome = current_iso_time();
        assert!(outcome.success);
        let time = outcome.data.unwrap()["time"].as_str().unwrap().to_string();
        assert!(OffsetDateTime::parse(&time, &Rfc3339).is_ok());
    }

    #[test]
    fn local_time_has_date_and_clock() {
        let outcome = current_local_time();
        assert!(outcome.success);
        let time = outcome.data.unwrap()["time"].as_str().unwrap().to_string();
        assert_eq!(time.len(), "2025-06-01 10:00:00".len());
    }
}
