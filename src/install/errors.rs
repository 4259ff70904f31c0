//! Error types for the pre-flight checks.
//!
//! Only pre-flight failures are fatal to a run. Failures of individual
//! package manager calls are values ([`CommandResult`](super::CommandResult)),
//! not errors. Each variant carries an actionable fix suggestion.

use thiserror::Error;

/// A check that failed before any stage touched the system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PreflightError {
    /// The connectivity probe could not reach its address.
    #[error("No network connection (could not reach {address})")]
    Offline {
        /// Address the probe tried to connect to.
        address: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The elevation secret was missing or rejected.
    #[error("Elevation denied: {message}")]
    ElevationDenied {
        /// What went wrong.
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The process is not elevated and must be restarted through the
    /// native elevation prompt.
    #[error("Administrator rights are required")]
    RelaunchRequired {
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },
}

impl PreflightError {
    /// Get an actionable suggestion for fixing this error.
    ///
    /// ```rust
    /// use setgo::PreflightError;
    ///
    /// let error = PreflightError::Offline {
    ///     address: "8.8.8.8:53".to_string(),
    ///     fix: "Check your internet connection and try again".to_string(),
    /// };
    /// assert!(error.fix_suggestion().contains("internet"));
    /// ```
    pub fn fix_suggestion(&self) -> &str {
        match self {
            Self::Offline { fix, .. } => fix,
            Self::ElevationDenied { fix, .. } => fix,
            Self::RelaunchRequired { fix } => fix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_display() {
        let error = PreflightError::Offline {
            address: "8.8.8.8:53".to_string(),
            fix: "Check your internet connection".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No network connection (could not reach 8.8.8.8:53)"
        );
    }

    #[test]
    fn test_elevation_denied_display() {
        let error = PreflightError::ElevationDenied {
            message: "incorrect password".to_string(),
            fix: "Re-enter your password".to_string(),
        };
        assert!(error.to_string().contains("incorrect password"));
        assert_eq!(error.fix_suggestion(), "Re-enter your password");
    }

    #[test]
    fn test_all_variants_have_fix() {
        let errors = vec![
            PreflightError::Offline {
                address: "1.1.1.1:443".to_string(),
                fix: "Check network".to_string(),
            },
            PreflightError::ElevationDenied {
                message: "no password".to_string(),
                fix: "Provide a password".to_string(),
            },
            PreflightError::RelaunchRequired {
                fix: "Accept the administrator prompt".to_string(),
            },
        ];

        for error in errors {
            assert!(
                !error.fix_suggestion().is_empty(),
                "fix_suggestion() should return non-empty string for {:?}",
                error
            );
        }
    }
}
