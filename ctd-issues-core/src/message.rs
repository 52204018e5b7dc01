//! Normalisation of raw processing errors into issue messages.

/// Message used when the processing tool cannot place a station.
pub const UNKNOWN_STATION_POSITION: &str = "Unknown reference station position";

const MISSING_POSITION_PREFIX: &str = "No lat/long information available for station ";

/// Reduce a raw `process_error` value to the message used for grouping.
///
/// Errors serialised as JSON objects contribute their `message` field. Missing
/// station positions collapse into [`UNKNOWN_STATION_POSITION`] so that every
/// station shares one issue. Any other message is quoted. A `message` that is
/// not a string is quoted as its JSON text.
pub fn process_error_message(raw: &str) -> String {
    match json_message(raw) {
        Some(serde_json::Value::String(message))
            if message.starts_with(MISSING_POSITION_PREFIX) =>
        {
            UNKNOWN_STATION_POSITION.to_string()
        }
        Some(serde_json::Value::String(message)) => quote(&message),
        Some(other) => quote(&other.to_string()),
        None => quote(raw),
    }
}

fn json_message(raw: &str) -> Option<serde_json::Value> {
    let mut value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value.as_object_mut()?.remove("message")
}

fn quote(text: &str) -> String {
    format!("\"{text}\"")
}
