//! CSV exports for the dashboard downloads.

use crate::error::DataError;
use crate::impact::CorrectiveAction;
use crate::table::Table;
use csv::WriterBuilder;

/// Actions as CSV with a header row. An empty slice produces an empty document.
pub fn actions_to_csv(actions: &[CorrectiveAction]) -> Result<String, DataError> {
    if actions.is_empty() {
        return Ok(String::new());
    }
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for action in actions {
        wtr.serialize(action)?;
    }
    wtr.flush()?;
    let bytes = wtr.into_inner().map_err(|e| DataError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The (filtered) trip table as CSV, header included.
pub fn trips_to_csv(trips: &Table) -> Result<String, DataError> {
    trips.to_csv_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(priority: u8, details: Option<&str>) -> CorrectiveAction {
        CorrectiveAction {
            title: format!("Action {}", priority),
            priority,
            est_delay_reduction_min: 1.5,
            est_cost_change: "small".into(),
            details: details.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_actions_export_is_empty() {
        assert_eq!(actions_to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn test_actions_export_header_and_rows() {
        let csv = actions_to_csv(&[action(1, Some("go, now")), action(2, None)]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("title,priority,est_delay_reduction_min,est_cost_change,details")
        );
        assert_eq!(lines.next(), Some("Action 1,1,1.5,small,\"go, now\""));
        assert_eq!(lines.next(), Some("Action 2,2,1.5,small,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_trips_export() {
        let table = Table::from_reader("Order_ID,Distance_KM\nA,10\nB,20\n".as_bytes()).unwrap();
        let csv = trips_to_csv(&table).unwrap();
        assert_eq!(Table::from_reader(csv.as_bytes()).unwrap(), table);
    }
}
