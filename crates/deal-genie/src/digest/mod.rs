//! Weekly genie-picks digest.
//!
//! The batch driver walks every opted-in subscriber, reuses the shared
//! [`RecommendationService`](crate::personalization::RecommendationService)
//! to pick their top deals, and hands the rendered email to an outbound
//! mailer. Failures are isolated per subscriber and recorded in the run
//! summary; only failing to list subscribers aborts a run.

pub mod domain;
pub mod job;
pub mod render;
pub mod repository;
pub mod router;

pub use domain::{DigestEmail, DigestRunSummary, DigestSendRecord, DigestSendStatus, Subscriber};
pub use job::{DigestError, GenieDigestJob};
pub use render::render_email;
pub use repository::{DigestMailer, MailerError, SubscriberDirectory};
pub use router::digest_router;
