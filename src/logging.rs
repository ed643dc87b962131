use chrono::Utc;
use serde_json::json;

/// Logger struct for handling structured logging
pub struct Logger {
    request_id: String,
}

impl Logger {
    /// Create a new Logger instance
    ///
    /// # Arguments
    ///
    /// * `request_id` - A unique identifier for the current request
    pub fn new(request_id: String) -> Self {
        Self { request_id }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Log an info message
    ///
    /// # Arguments
    ///
    /// * `message` - The log message
    /// * `data` - Optional additional data to include in the log
    pub fn info(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("INFO", message, data);
    }

    /// Log a warning message
    ///
    /// # Arguments
    ///
    /// * `message` - The log message
    /// * `data` - Optional additional data to include in the log
    pub fn warn(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("WARN", message, data);
    }

    /// Log an error message
    ///
    /// # Arguments
    ///
    /// * `message` - The log message
    /// * `data` - Optional additional data to include in the log
    pub fn error(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("ERROR", message, data);
    }

    fn log(&self, level: &str, message: &str, data: Option<serde_json::Value>) {
        let line = self.render(level, message, data);
        emit(level, line);
    }

    fn render(&self, level: &str, message: &str, data: Option<serde_json::Value>) -> String {
        json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "request_id": self.request_id,
            "message": message,
            "data": data
        })
        .to_string()
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        fn emit(level: &str, line: String) {
            match level {
                "WARN" => web_sys::console::warn_1(&line.into()),
                "ERROR" => web_sys::console::error_1(&line.into()),
                _ => web_sys::console::log_1(&line.into()),
            }
        }
    } else {
        // JS console bindings panic off wasm; native builds (tests) log to stderr
        fn emit(_level: &str, line: String) {
            eprintln!("{}", line);
        }
    }
}

/// Macro to create a JSON object for additional log data
///
/// Usage: log_data!("key1" => "value1", "key2" => 42)
#[macro_export]
macro_rules! log_data {
    ($($key:expr => $value:expr),* $(,)?) => {
        Some(serde_json::json!({ $($key: $value),* }))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_produces_structured_line() {
        let logger = Logger::new("req-1".to_string());
        let line = logger.render("WARN", "parts dropped", log_data!("dropped" => 2));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["level"], "WARN");
        assert_eq!(value["request_id"], "req-1");
        assert_eq!(value["message"], "parts dropped");
        assert_eq!(value["data"]["dropped"], 2);
        assert!(value["timestamp"].as_str().is_some());
    }

    #[test]
    fn render_without_data_emits_null() {
        let logger = Logger::new("req-2".to_string());
        let line = logger.render("INFO", "hello", None);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(value["data"].is_null());
    }
}
