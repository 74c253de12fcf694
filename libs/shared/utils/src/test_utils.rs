use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub api_base_url: String,
    pub results_ceiling: usize,
    pub total_pages: u32,
    pub fetch_timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            results_ceiling: 20,
            total_pages: 3,
            fetch_timeout_secs: 5,
        }
    }
}

impl TestConfig {
    pub fn remote(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            use_mock_catalog: true,
            mock_latency_ms: 0,
            fetch_timeout_secs: self.fetch_timeout_secs,
            results_ceiling: self.results_ceiling,
            total_pages: self.total_pages,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// JSON bodies shaped like the MedMatch doctors API.
pub struct MockCatalogResponses;

impl MockCatalogResponses {
    pub fn doctor(id: &str, name: &str, rating: f64, days_out: &[i64], now: DateTime<Utc>) -> Value {
        let available_times: Vec<String> = days_out
            .iter()
            .map(|d| (now + Duration::days(*d)).to_rfc3339())
            .collect();

        json!({
            "id": id,
            "name": name,
            "specialty": {
                "id": "primary-care",
                "name": "Primary Care",
                "icon_name": "heart.fill"
            },
            "profile_image_url": null,
            "rating": rating,
            "review_count": 42,
            "address": {
                "street": "123 Medical Plaza",
                "city": "San Francisco",
                "state": "CA",
                "zip_code": "94102"
            },
            "available_times": available_times
        })
    }

    pub fn doctor_page(doctors: Vec<Value>, total_pages: u32) -> Value {
        json!({
            "doctors": doctors,
            "total_pages": total_pages
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}
