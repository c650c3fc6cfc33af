//! Customer feedback submission.

use eathub_core::{Feedback, NewFeedback};
use tracing::{info, instrument};

use super::ServiceContext;
use crate::Result;
use crate::retry::retry_request;

/// Raw feedback calls.
pub mod base {
    use eathub_core::{Feedback, NewFeedback};

    use crate::http::{ApiClient, ApiError};

    /// `POST /feedback`
    pub async fn submit(api: &ApiClient, feedback: &NewFeedback) -> Result<Feedback, ApiError> {
        api.post("feedback", feedback).await
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackService {
    ctx: ServiceContext,
}

impl FeedbackService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for a rating outside 1-5 or
    /// an empty message, or the API error. Never retried.
    #[instrument(skip(self, feedback), fields(rating = feedback.rating))]
    pub async fn submit_feedback(&self, feedback: &NewFeedback) -> Result<Feedback> {
        feedback.validate()?;
        let policy = self.ctx.no_retry();
        let stored = retry_request(&policy, || base::submit(&self.ctx.api, feedback)).await?;
        info!(id = %stored.id, "Feedback submitted");
        Ok(stored)
    }
}
