use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NEAR_ME: &str = "Near me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: String,
    pub name: String,
    pub icon_name: String,
}

impl Specialty {
    fn new(id: &str, name: &str, icon_name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon_name: icon_name.to_string(),
        }
    }

    pub fn primary_care() -> Self {
        Self::new("primary-care", "Primary Care", "heart.fill")
    }

    pub fn dermatologist() -> Self {
        Self::new("dermatologist", "Dermatology", "allergens")
    }

    pub fn dentist() -> Self {
        Self::new("dentist", "Dentist", "staroflife.fill")
    }

    pub fn ent() -> Self {
        Self::new("ent", "Ear, Nose & Throat", "ear.fill")
    }

    pub fn eye_doctor() -> Self {
        Self::new("eye-doctor", "Ophthalmology", "eye.fill")
    }

    pub fn psychiatrist() -> Self {
        Self::new("psychiatrist", "Psychiatry", "brain.head.profile")
    }

    pub fn ob_gyn() -> Self {
        Self::new("ob-gyn", "OB-GYN", "figure.stand.dress")
    }

    pub fn all() -> Vec<Specialty> {
        vec![
            Self::primary_care(),
            Self::dermatologist(),
            Self::dentist(),
            Self::ent(),
            Self::eye_doctor(),
            Self::psychiatrist(),
            Self::ob_gyn(),
        ]
    }

    pub fn find(id: &str) -> Option<Specialty> {
        Self::all().into_iter().find(|s| s.id == id)
    }
}

// Identity is the id; display name and icon are presentation details.
impl PartialEq for Specialty {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Specialty {}

impl Hash for Specialty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl Address {
    pub fn formatted(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: String,
    pub name: String,
    pub specialty: Specialty,
    pub profile_image_url: Option<String>,
    pub rating: f64,
    pub review_count: u32,
    pub address: Address,
    pub available_times: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub gender: Option<Gender>,
}

impl DoctorRecord {
    /// Earliest bookable slot. Slots are ascending by convention only, so
    /// this takes the minimum rather than the first element.
    pub fn earliest_available(&self) -> Option<DateTime<Utc>> {
        self.available_times.iter().min().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    pub id: Uuid,
    pub name: String,
    pub plan_type: Option<String>,
}

impl Insurance {
    pub fn new(name: impl Into<String>, plan_type: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            plan_type: plan_type.map(str::to_string),
        }
    }

    pub fn popular() -> Vec<Insurance> {
        vec![
            Insurance::new("Triple-S", Some("PPO")),
            Insurance::new("MCS", Some("EPO")),
            Insurance::new("First MEDICAL", Some("HMO")),
            Insurance::new("Humana", Some("PPO")),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub location: String,
    pub specialty: Option<Specialty>,
    pub insurance: Option<Insurance>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            location: NEAR_ME.to_string(),
            specialty: None,
            insurance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    Recommended,
    Availability,
    Rating,
    Distance,
}

impl SortOption {
    pub fn label(&self) -> &'static str {
        match self {
            SortOption::Recommended => "Recommended",
            SortOption::Availability => "Soonest Available",
            SortOption::Rating => "Highest Rated",
            SortOption::Distance => "Closest",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityWindow {
    #[default]
    Anytime,
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderPreference {
    #[default]
    Any,
    Male,
    Female,
}

impl GenderPreference {
    pub fn accepts(&self, gender: Option<Gender>) -> bool {
        match self {
            GenderPreference::Any => true,
            GenderPreference::Male => gender == Some(Gender::Male),
            GenderPreference::Female => gender == Some(Gender::Female),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub sort_option: SortOption,
    pub availability: AvailabilityWindow,
    pub gender: GenderPreference,
    /// Accepted but not applied: records carry no spoken-language data.
    pub languages: Vec<String>,
    pub minimum_rating: f64,
    /// Miles. Accepted but not applied: records carry no coordinates.
    pub maximum_distance: f64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            sort_option: SortOption::Recommended,
            availability: AvailabilityWindow::Anytime,
            gender: GenderPreference::Any,
            languages: Vec::new(),
            minimum_rating: 0.0,
            maximum_distance: 50.0,
        }
    }
}

impl FilterCriteria {
    pub fn sorted_by(sort_option: SortOption) -> Self {
        Self {
            sort_option,
            ..Self::default()
        }
    }

    pub fn with_minimum_rating(minimum_rating: f64) -> Self {
        Self {
            minimum_rating,
            ..Self::default()
        }
    }
}

/// One page of candidates as returned by a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorPage {
    pub doctors: Vec<DoctorRecord>,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    pub doctors: Vec<DoctorRecord>,
    pub current_page: u32,
    pub total_pages: u32,
    pub can_load_more: bool,
}

impl Default for SearchResultSet {
    fn default() -> Self {
        Self {
            doctors: Vec::new(),
            current_page: 1,
            total_pages: 1,
            can_load_more: false,
        }
    }
}
