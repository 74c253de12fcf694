use serde::{Deserialize, Serialize};

use crate::models::{Insurance, SearchQuery, Specialty, NEAR_ME};

/// What the patient said they need, picked before the result list opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareType {
    AnnualPhysical,
    SpecificIssue,
}

impl CareType {
    pub fn label(&self) -> &'static str {
        match self {
            CareType::AnnualPhysical => "Annual physical / checkup",
            CareType::SpecificIssue => "Issue, condition or problem",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SearchQueryBuilder {
    text: String,
    location: Option<String>,
    specialty: Option<Specialty>,
    insurance: Option<Insurance>,
    care_type: Option<CareType>,
}

impl SearchQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn specialty(mut self, specialty: Option<Specialty>) -> Self {
        self.specialty = specialty;
        self
    }

    pub fn insurance(mut self, insurance: Option<Insurance>) -> Self {
        self.insurance = insurance;
        self
    }

    /// Replaces the free text with a phrase derived from the care type and
    /// the selected specialty.
    pub fn care_type(mut self, care_type: CareType) -> Self {
        self.care_type = Some(care_type);
        self
    }

    pub fn build(self) -> SearchQuery {
        let text = match self.care_type {
            Some(care_type) => care_type_text(care_type, self.specialty.as_ref()),
            None => self.text.trim().to_string(),
        };

        let location = self.location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| NEAR_ME.to_string());

        SearchQuery {
            text,
            location,
            specialty: self.specialty,
            insurance: self.insurance,
        }
    }
}

fn care_type_text(care_type: CareType, specialty: Option<&Specialty>) -> String {
    match (care_type, specialty) {
        (CareType::AnnualPhysical, Some(s)) => format!("{} • Annual Physical", s.name),
        (CareType::AnnualPhysical, None) => "Primary Care Doctor • Annual Physical".to_string(),
        (CareType::SpecificIssue, Some(s)) => format!("{} • Consultation", s.name),
        (CareType::SpecificIssue, None) => "Doctor • Consultation".to_string(),
    }
}
