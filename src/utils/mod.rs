//! Utility functions and helpers for elaster
//!
//! - Time and duration formatting
//! - Connection string sanitizing for display

/// Time utilities
pub mod time {
    use std::time::Duration;

    /// Format elapsed time as `h:m:s:ms`
    ///
    /// # Arguments
    /// * `duration` - Duration to format
    ///
    /// # Returns
    /// * `String` - Formatted duration (e.g., "0:1:5:250")
    pub fn format_elapsed(duration: Duration) -> String {
        let secs = duration.as_secs();
        format!(
            "{}:{}:{}:{}",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60,
            duration.subsec_millis()
        )
    }

    /// Documents per second over the elapsed time
    pub fn rate(count: u64, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 { count as f64 / secs } else { 0.0 }
    }
}

/// Connection string helpers
pub mod uri {
    /// Hide credentials in a connection string for display
    ///
    /// # Arguments
    /// * `uri` - The URI to sanitize
    ///
    /// # Returns
    /// * `String` - Sanitized URI with credentials replaced by ***
    pub fn sanitize(uri: &str) -> String {
        let Some(host_start) = uri.rfind('@') else {
            return uri.to_string();
        };

        match uri.find("://") {
            Some(proto_end) if host_start > proto_end => {
                format!("{}***{}", &uri[..proto_end + 3], &uri[host_start..])
            }
            // No scheme separator before the credentials
            _ => format!("***{}", &uri[host_start..]),
        }
    }
}
