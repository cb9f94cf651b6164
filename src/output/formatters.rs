use log::warn;

use crate::devices::Reading;

pub trait DataFormatter: Send + Sync {
    fn format_reading(&self, reading: &Reading) -> String;
    fn format_header(&self) -> String;
    fn format_name(&self) -> &str;
}

/// Picks a formatter by its configuration name.
pub fn formatter_for(format: &str) -> Option<Box<dyn DataFormatter>> {
    match format {
        "console" => Some(Box::new(ConsoleFormatter)),
        "json" => Some(Box::new(JsonFormatter)),
        "csv" => Some(Box::new(CsvFormatter)),
        _ => None,
    }
}

pub struct ConsoleFormatter;

impl DataFormatter for ConsoleFormatter {
    fn format_reading(&self, reading: &Reading) -> String {
        format!("{}\n{}", reading, "=".repeat(27))
    }

    fn format_header(&self) -> String {
        String::new()
    }

    fn format_name(&self) -> &str {
        "console"
    }
}

pub struct JsonFormatter;

impl DataFormatter for JsonFormatter {
    fn format_reading(&self, reading: &Reading) -> String {
        serde_json::to_string(reading).unwrap_or_else(|e| {
            warn!("⚠️  Cannot serialize reading {:?}: {}", reading, e);
            String::new()
        })
    }

    fn format_header(&self) -> String {
        String::new() // JSON lines need no header
    }

    fn format_name(&self) -> &str {
        "json"
    }
}

pub struct CsvFormatter;

impl DataFormatter for CsvFormatter {
    fn format_reading(&self, reading: &Reading) -> String {
        format!("{:.6},{}", reading.timestamp, reading.length)
    }

    fn format_header(&self) -> String {
        "timestamp,length".to_string()
    }

    fn format_name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_format() {
        let out = ConsoleFormatter.format_reading(&Reading::new(1.5, 2.25));
        assert!(out.starts_with("timestamp: 1.500000\nlength: 2.25\n"));
        assert!(out.ends_with("==="));
    }

    #[test]
    fn test_json_format() {
        let out = JsonFormatter.format_reading(&Reading::new(1.5, 2.25));
        let back: Reading = serde_json::from_str(&out).unwrap();
        assert_eq!(back, Reading::new(1.5, 2.25));
    }

    #[test]
    fn test_json_format_non_finite_length() {
        let out = JsonFormatter.format_reading(&Reading::new(1.0, f64::NAN));
        assert_eq!(out, "{\"timestamp\":1.0,\"length\":null}");
    }

    #[test]
    fn test_csv_format() {
        assert_eq!(CsvFormatter.format_header(), "timestamp,length");
        assert_eq!(CsvFormatter.format_reading(&Reading::new(3.0, 0.5)), "3.000000,0.5");
    }

    #[test]
    fn test_formatter_lookup() {
        assert_eq!(formatter_for("csv").unwrap().format_name(), "csv");
        assert!(formatter_for("xml").is_none());
    }
}
