// Sat Oct 17 2026 - Alex

pub mod logging;
pub mod process;

pub use process::ProcessUtils;

/// `2d 03:04:05`, `03:04:05` or `04:05` for a number of seconds. Negative values clamp to zero.
pub fn format_countdown(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, secs)
    } else if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(-3.0), "00:00");
        assert_eq!(format_countdown(65.9), "01:05");
        assert_eq!(format_countdown(3_725.0), "01:02:05");
        assert_eq!(format_countdown(2.0 * 86_400.0 + 61.0), "2d 00:01:01");
    }
}
