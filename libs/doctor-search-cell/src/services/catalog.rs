use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, instrument};

use shared_config::AppConfig;
use shared_models::FetchError;
use shared_network::{ApiClient, Endpoint};

use crate::models::{Address, DoctorPage, DoctorRecord, SearchQuery, Specialty};

/// Source of candidate doctors for a query. Implementations return the
/// unfiltered candidate set; filtering and ordering happen client-side.
#[async_trait]
pub trait DoctorCatalog: Send + Sync {
    async fn fetch_doctors(&self, query: &SearchQuery, page: u32) -> Result<DoctorPage, FetchError>;

    async fn get_doctor(&self, doctor_id: &str) -> Result<DoctorRecord, FetchError>;
}

/// In-memory catalog with simulated network latency.
pub struct MockDoctorCatalog {
    doctors: Vec<DoctorRecord>,
    latency: Duration,
    total_pages: u32,
    page_size: Option<usize>,
    query_latency: HashMap<String, Duration>,
    page_latency: HashMap<u32, Duration>,
    scripted_failures: Mutex<VecDeque<FetchError>>,
}

impl MockDoctorCatalog {
    pub fn new(doctors: Vec<DoctorRecord>) -> Self {
        Self {
            doctors,
            latency: Duration::from_secs(1),
            total_pages: 3,
            page_size: None,
            query_latency: HashMap::new(),
            page_latency: HashMap::new(),
            scripted_failures: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::demo(Utc::now())
            .with_latency(config.mock_latency())
            .with_total_pages(config.total_pages)
    }

    /// The demonstration catalog: two doctors with slots a few days out.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let days = |n: i64| now + ChronoDuration::days(n);

        Self::new(vec![
            DoctorRecord {
                id: "doctor1".to_string(),
                name: "Dr. Miguel De Jesús".to_string(),
                specialty: Specialty::primary_care(),
                profile_image_url: None,
                rating: 4.8,
                review_count: 153,
                address: Address {
                    street: "123 Medical Plaza".to_string(),
                    city: "San Francisco".to_string(),
                    state: "CA".to_string(),
                    zip_code: "94102".to_string(),
                },
                available_times: vec![days(1), days(2)],
                gender: None,
            },
            DoctorRecord {
                id: "doctor2".to_string(),
                name: "Dr. José López".to_string(),
                specialty: Specialty::dentist(),
                profile_image_url: None,
                rating: 4.9,
                review_count: 208,
                address: Address {
                    street: "456 Dental Suite".to_string(),
                    city: "San Francisco".to_string(),
                    state: "CA".to_string(),
                    zip_code: "94103".to_string(),
                },
                available_times: vec![days(3), days(4)],
                gender: None,
            },
        ])
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.total_pages = total_pages.max(1);
        self
    }

    /// Slice the catalog into pages instead of returning all of it per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    pub fn with_query_latency(mut self, text: &str, latency: Duration) -> Self {
        self.query_latency.insert(text.to_string(), latency);
        self
    }

    pub fn with_page_latency(mut self, page: u32, latency: Duration) -> Self {
        self.page_latency.insert(page, latency);
        self
    }

    /// Make the next fetch fail with `error`.
    pub fn fail_next(&self, error: FetchError) {
        if let Ok(mut failures) = self.scripted_failures.lock() {
            failures.push_back(error);
        }
    }

    pub fn doctors(&self) -> &[DoctorRecord] {
        &self.doctors
    }

    fn latency_for(&self, query: &SearchQuery, page: u32) -> Duration {
        self.query_latency
            .get(&query.text)
            .or_else(|| self.page_latency.get(&page))
            .copied()
            .unwrap_or(self.latency)
    }

    fn next_failure(&self) -> Option<FetchError> {
        self.scripted_failures.lock().ok().and_then(|mut f| f.pop_front())
    }

    fn page(&self, page: u32) -> DoctorPage {
        match self.page_size {
            Some(size) => {
                let total_pages = self.doctors.len().div_ceil(size).max(1) as u32;
                let start = (page.saturating_sub(1) as usize).saturating_mul(size);
                let doctors = self.doctors
                    .iter()
                    .skip(start)
                    .take(size)
                    .cloned()
                    .collect();
                DoctorPage { doctors, total_pages }
            }
            None => DoctorPage {
                doctors: self.doctors.clone(),
                total_pages: self.total_pages,
            },
        }
    }
}

#[async_trait]
impl DoctorCatalog for MockDoctorCatalog {
    #[instrument(skip(self), fields(text = %query.text))]
    async fn fetch_doctors(&self, query: &SearchQuery, page: u32) -> Result<DoctorPage, FetchError> {
        let latency = self.latency_for(query, page);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self.next_failure() {
            debug!("Scripted catalog failure: {}", error);
            return Err(error);
        }

        let page = self.page(page);
        debug!("Mock catalog returning {} doctors", page.doctors.len());
        Ok(page)
    }

    async fn get_doctor(&self, doctor_id: &str) -> Result<DoctorRecord, FetchError> {
        // Unknown ids fall back to the first record, as the demo detail screen does.
        self.doctors
            .iter()
            .find(|d| d.id == doctor_id)
            .or_else(|| self.doctors.first())
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}

/// Catalog backed by the MedMatch REST API.
pub struct RemoteDoctorCatalog {
    client: ApiClient,
}

impl RemoteDoctorCatalog {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ApiClient::new(config),
        }
    }

    pub fn with_client(client: ApiClient) -> Self {
        Self { client }
    }

    fn search_endpoint(query: &SearchQuery, page: u32) -> Endpoint {
        let mut endpoint = Endpoint::new("/doctors")
            .with_query("q", &query.text)
            .with_query("location", &query.location)
            .with_query("page", page);

        if let Some(ref specialty) = query.specialty {
            endpoint = endpoint.with_query("specialty", &specialty.id);
        }
        if let Some(ref insurance) = query.insurance {
            endpoint = endpoint.with_query("insurance", &insurance.name);
            if let Some(ref plan_type) = insurance.plan_type {
                endpoint = endpoint.with_query("plan_type", plan_type);
            }
        }

        endpoint
    }
}

#[async_trait]
impl DoctorCatalog for RemoteDoctorCatalog {
    #[instrument(skip(self), fields(text = %query.text))]
    async fn fetch_doctors(&self, query: &SearchQuery, page: u32) -> Result<DoctorPage, FetchError> {
        let endpoint = Self::search_endpoint(query, page);
        let page: DoctorPage = self.client.fetch(&endpoint).await?;
        debug!("Remote catalog returned {} doctors ({} pages)", page.doctors.len(), page.total_pages);
        Ok(page)
    }

    async fn get_doctor(&self, doctor_id: &str) -> Result<DoctorRecord, FetchError> {
        let endpoint = Endpoint::new(format!("/doctors/{}", doctor_id));
        self.client.fetch(&endpoint).await
    }
}
