//! Human-readable reference codes for prisoners, visits, duties, and records.
//!
//! Codes are generated client-side and are only probabilistically unique on
//! their own. Every code column carries a unique constraint and inserts
//! regenerate on collision (see `cellblock_db::unique`), which is what makes
//! the final value unique.

use rand::Rng;
use uuid::Uuid;

use crate::types::Date;

/// Maximum number of codes tried before an insert gives up on a collision.
pub const MAX_REFERENCE_ATTEMPTS: u32 = 5;

/// Eight uppercase hex characters taken from a random UUID.
fn hex8() -> String {
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(8);
    simple.to_ascii_uppercase()
}

fn compact_date(date: Date) -> String {
    date.format("%Y%m%d").to_string()
}

/// `PR` followed by six random digits, e.g. `PR482913`.
pub fn prisoner_number() -> String {
    let n: u32 = rand::rng().random_range(100_000..=999_999);
    format!("PR{n}")
}

/// `VISIT-YYYYMMDD-XXXXXXXX`.
pub fn visit_code(date: Date) -> String {
    format!("VISIT-{}-{}", compact_date(date), hex8())
}

/// `TASK-YYYYMMDD-XXXXXXXX`.
pub fn task_code(date: Date) -> String {
    format!("TASK-{}-{}", compact_date(date), hex8())
}

/// `ALERT-YYYYMMDD-XXXXXXXX`.
pub fn alert_code(date: Date) -> String {
    format!("ALERT-{}-{}", compact_date(date), hex8())
}

/// `DUTY` + `yyyyMMdd` + four random digits, e.g. `DUTY202603140457`.
pub fn duty_code(date: Date) -> String {
    let n: u32 = rand::rng().random_range(0..10_000);
    format!("DUTY{}{n:04}", compact_date(date))
}

/// `LOG-XXXXXXXX-NNNN`.
pub fn log_code() -> String {
    let n: u32 = rand::rng().random_range(0..10_000);
    format!("LOG-{}-{n:04}", hex8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> Date {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn is_upper_hex(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    #[test]
    fn prisoner_number_is_pr_plus_six_digits() {
        let code = prisoner_number();
        assert_eq!(code.len(), 8);
        assert!(code.starts_with("PR"));
        assert!(code[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn visit_code_embeds_date_and_hex_suffix() {
        let code = visit_code(date());
        assert!(code.starts_with("VISIT-20260314-"));
        let suffix = &code["VISIT-20260314-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(is_upper_hex(suffix));
    }

    #[test]
    fn duty_code_has_padded_counter() {
        let code = duty_code(date());
        assert_eq!(code.len(), "DUTY".len() + 8 + 4);
        assert!(code.starts_with("DUTY20260314"));
        assert!(code[12..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn log_code_shape() {
        let code = log_code();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "LOG");
        assert!(is_upper_hex(parts[1]) && parts[1].len() == 8);
        assert!(parts[2].len() == 4 && parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn task_and_alert_codes_are_prefixed() {
        assert!(task_code(date()).starts_with("TASK-20260314-"));
        assert!(alert_code(date()).starts_with("ALERT-20260314-"));
    }

    #[test]
    fn consecutive_codes_differ() {
        assert_ne!(visit_code(date()), visit_code(date()));
    }
}
