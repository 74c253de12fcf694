pub mod analytics;
pub mod error;

pub use analytics::{AnalyticsEvent, AnalyticsService, TracingAnalytics};
pub use error::{AppError, FetchError};
