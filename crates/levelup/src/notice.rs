//! Transient notifications for the presentation layer.

use std::fmt;

/// Whether a notice reports a success or a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message shown to the user after a command settles.
///
/// Notices are not stored anywhere; the caller displays and drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Turns a command result into a notice: `success` on `Ok`, the
    /// error's message on `Err`.
    pub fn from_result<T, E: fmt::Display>(result: &Result<T, E>, success: &str) -> Self {
        match result {
            Ok(_) => Self::success(success),
            Err(e) => Self::error(e.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Success => write!(f, "[ok] {}", self.message),
            NoticeLevel::Error => write!(f, "[error] {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result_ok_uses_success_message() {
        let result: Result<u32, String> = Ok(90);

        let notice = Notice::from_result(&result, "XP added");

        assert_eq!(notice, Notice::success("XP added"));
        assert!(!notice.is_error());
    }

    #[test]
    fn test_from_result_err_uses_error_message() {
        let result: Result<u32, String> = Err("Not enough XP".into());

        let notice = Notice::from_result(&result, "Reward redeemed");

        assert!(notice.is_error());
        assert_eq!(notice.message, "Not enough XP");
    }

    #[test]
    fn test_display_prefixes_level() {
        assert_eq!(Notice::error("boom").to_string(), "[error] boom");
    }
}
