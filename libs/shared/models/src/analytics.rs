use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEvent {
    ScreenView,
    Search,
    ApplyFilters,
    LoadMore,
    Error,
}

impl AnalyticsEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEvent::ScreenView => "screen_view",
            AnalyticsEvent::Search => "search",
            AnalyticsEvent::ApplyFilters => "apply_filters",
            AnalyticsEvent::LoadMore => "load_more",
            AnalyticsEvent::Error => "error",
        }
    }
}

/// Sink for product analytics. Passed explicitly to whoever emits events so
/// tests can swap in a recording implementation.
pub trait AnalyticsService: Send + Sync {
    fn log_event(&self, event: AnalyticsEvent, parameters: Map<String, Value>);

    fn log_screen_view(&self, screen_name: &str, mut parameters: Map<String, Value>) {
        parameters.insert("screen_name".to_string(), Value::from(screen_name));
        self.log_event(AnalyticsEvent::ScreenView, parameters);
    }

    fn log_error(&self, error: &dyn std::error::Error, mut parameters: Map<String, Value>) {
        parameters.insert("error_description".to_string(), Value::from(error.to_string()));
        self.log_event(AnalyticsEvent::Error, parameters);
    }
}

/// Writes analytics events to the tracing pipeline.
#[derive(Debug, Default, Clone)]
pub struct TracingAnalytics;

impl AnalyticsService for TracingAnalytics {
    fn log_event(&self, event: AnalyticsEvent, parameters: Map<String, Value>) {
        let parameters = Value::Object(parameters);
        info!(
            event = event.as_str(),
            parameters = %parameters,
            "Analytics event"
        );
    }
}
