//! Customer feedback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::email::Email;
use super::id::FeedbackId;

/// Reasons a [`NewFeedback`] is rejected before it is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("rating must be between 1 and 5 (got {0})")]
    RatingOutOfRange(u8),
    #[error("feedback message cannot be empty")]
    EmptyMessage,
}

/// Feedback submitted from the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    pub rating: u8,
    pub message: String,
}

impl NewFeedback {
    /// # Errors
    ///
    /// Returns a [`FeedbackError`] if the rating is outside `1..=5` or the
    /// message is blank.
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if !(1..=5).contains(&self.rating) {
            return Err(FeedbackError::RatingOutOfRange(self.rating));
        }
        if self.message.trim().is_empty() {
            return Err(FeedbackError::EmptyMessage);
        }
        Ok(())
    }
}

/// Stored feedback, as listed for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: FeedbackId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub rating: u8,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let mut fb = NewFeedback {
            name: None,
            email: None,
            rating: 5,
            message: "Great sisig".into(),
        };
        assert_eq!(fb.validate(), Ok(()));
        fb.rating = 0;
        assert_eq!(fb.validate(), Err(FeedbackError::RatingOutOfRange(0)));
        fb.rating = 4;
        fb.message = " ".into();
        assert_eq!(fb.validate(), Err(FeedbackError::EmptyMessage));
    }
}
