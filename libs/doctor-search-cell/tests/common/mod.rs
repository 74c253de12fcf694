#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::{Map, Value};

use doctor_search_cell::{
    Address, DoctorCatalog, DoctorRecord, MockDoctorCatalog, SearchSession, SearchSessionHandle,
    SessionConfig, Specialty,
};
use shared_models::{AnalyticsEvent, AnalyticsService};

pub fn doctor(id: &str, rating: f64, days_out: &[i64], now: DateTime<Utc>) -> DoctorRecord {
    DoctorRecord {
        id: id.to_string(),
        name: format!("Dr. {}", id),
        specialty: Specialty::primary_care(),
        profile_image_url: None,
        rating,
        review_count: 12,
        address: Address {
            street: "1 Test Way".to_string(),
            city: "San Juan".to_string(),
            state: "PR".to_string(),
            zip_code: "00901".to_string(),
        },
        available_times: days_out.iter().map(|d| now + ChronoDuration::days(*d)).collect(),
        gender: None,
    }
}

pub fn numbered_doctors(n: usize, now: DateTime<Utc>) -> Vec<DoctorRecord> {
    (0..n).map(|i| doctor(&format!("doc-{:02}", i), 4.0, &[1], now)).collect()
}

pub fn ids(records: &[DoctorRecord]) -> Vec<String> {
    records.iter().map(|d| d.id.clone()).collect()
}

#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<(AnalyticsEvent, Map<String, Value>)>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    pub fn parameters(&self, event: AnalyticsEvent) -> Option<Map<String, Value>> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| *e == event)
            .map(|(_, p)| p.clone())
    }
}

impl AnalyticsService for RecordingAnalytics {
    fn log_event(&self, event: AnalyticsEvent, parameters: Map<String, Value>) {
        self.events.lock().unwrap().push((event, parameters));
    }
}

pub fn instant(catalog: MockDoctorCatalog) -> MockDoctorCatalog {
    catalog.with_latency(Duration::ZERO)
}

pub fn spawn_session(catalog: Arc<dyn DoctorCatalog>) -> (SearchSessionHandle, Arc<RecordingAnalytics>) {
    spawn_session_with(catalog, SessionConfig::default())
}

pub fn spawn_session_with(
    catalog: Arc<dyn DoctorCatalog>,
    config: SessionConfig,
) -> (SearchSessionHandle, Arc<RecordingAnalytics>) {
    let analytics = Arc::new(RecordingAnalytics::default());
    let handle = SearchSession::spawn(catalog, analytics.clone(), config);
    (handle, analytics)
}
