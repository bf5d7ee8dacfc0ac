//! Resume data model: the render record and the wizard form it is built from

use serde::{Deserialize, Deserializer, Serialize};

/// Canonical input to every renderer
///
/// Sections print in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// A titled list of lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub items: Vec<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }
}

/// One education/employment row of the wizard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "trimmed")]
    pub year: String,
    #[serde(deserialize_with = "trimmed")]
    pub month: String,
    #[serde(deserialize_with = "trimmed")]
    pub desc: String,
    /// "入学", "卒業", "入社", ...
    #[serde(deserialize_with = "trimmed")]
    pub status: String,
}

impl HistoryEntry {
    /// True if every field is blank
    pub fn is_empty(&self) -> bool {
        [&self.year, &self.month, &self.desc, &self.status]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// One license/certification row of the wizard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationEntry {
    #[serde(deserialize_with = "trimmed")]
    pub year: String,
    #[serde(deserialize_with = "trimmed")]
    pub month: String,
    #[serde(deserialize_with = "trimmed")]
    pub desc: String,
}

impl QualificationEntry {
    pub fn is_empty(&self) -> bool {
        [&self.year, &self.month, &self.desc]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    #[serde(rename = "選択しない")]
    Unspecified,
    #[serde(rename = "男")]
    Male,
    #[serde(rename = "女")]
    Female,
}

impl Gender {
    pub const ALLOWED: [&'static str; 3] = ["選択しない", "男", "女"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Unspecified => "選択しない",
            Gender::Male => "男",
            Gender::Female => "女",
        }
    }
}

/// Everything the wizard collects
///
/// Missing fields default to empty; text is trimmed on the way in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeFormData {
    #[serde(deserialize_with = "photo")]
    pub photo: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    pub name_furigana: String,
    /// `YYYY-MM-DD`
    #[serde(deserialize_with = "trimmed")]
    pub birth_date: String,
    pub gender: Gender,

    #[serde(deserialize_with = "trimmed")]
    pub address_furigana: String,
    #[serde(deserialize_with = "trimmed")]
    pub address_postal_code: String,
    #[serde(deserialize_with = "trimmed")]
    pub address_main: String,
    #[serde(deserialize_with = "trimmed")]
    pub phone: String,
    #[serde(deserialize_with = "trimmed")]
    pub email: String,

    pub same_as_current_address: bool,
    #[serde(deserialize_with = "trimmed")]
    pub contact_address_furigana: String,
    #[serde(deserialize_with = "trimmed")]
    pub contact_address_postal_code: String,
    #[serde(deserialize_with = "trimmed")]
    pub contact_address_main: String,
    #[serde(deserialize_with = "trimmed")]
    pub contact_phone: String,
    #[serde(deserialize_with = "trimmed")]
    pub contact_email: String,

    pub history: Vec<HistoryEntry>,
    pub qualifications: Vec<QualificationEntry>,

    #[serde(deserialize_with = "trimmed")]
    pub q1_resume: String,
    #[serde(deserialize_with = "trimmed")]
    pub q2_resume: String,
    #[serde(deserialize_with = "trimmed")]
    pub q3_resume: String,
    #[serde(deserialize_with = "trimmed")]
    pub q4_resume: String,
    #[serde(deserialize_with = "trimmed")]
    pub q5_resume: String,
    #[serde(deserialize_with = "trimmed")]
    pub generated_resume_pr: String,

    #[serde(deserialize_with = "trimmed")]
    pub special_requests: String,

    #[serde(deserialize_with = "trimmed")]
    pub q1_cv: String,
    #[serde(deserialize_with = "trimmed")]
    pub q2_cv: String,
    #[serde(deserialize_with = "trimmed")]
    pub q3_cv: String,
    #[serde(deserialize_with = "trimmed")]
    pub q4_cv: String,
    #[serde(deserialize_with = "trimmed")]
    pub q5_cv: String,

    #[serde(deserialize_with = "trimmed")]
    pub generated_cv_summary: String,
    #[serde(deserialize_with = "trimmed")]
    pub generated_cv_details: String,
    #[serde(deserialize_with = "trimmed")]
    pub generated_cv_skills: String,
    #[serde(deserialize_with = "trimmed")]
    pub generated_cv_pr: String,
    #[serde(deserialize_with = "trimmed")]
    pub generated_cv_speciality: String,
}

impl ResumeFormData {
    /// Contact address, or the current address when the form says they match
    pub fn contact_address(&self) -> (&str, &str, &str) {
        if self.same_as_current_address {
            (
                &self.address_furigana,
                &self.address_postal_code,
                &self.address_main,
            )
        } else {
            (
                &self.contact_address_furigana,
                &self.contact_address_postal_code,
                &self.contact_address_main,
            )
        }
    }
}

/// Null-tolerant, trimmed string field
fn trimmed<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()).unwrap_or_default())
}

/// Blank photo strings collapse to `None`
fn photo<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = trimmed(deserializer)?;
    Ok((!value.is_empty()).then_some(value))
}

/// Which document the request asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Resume,
    Cv,
}

impl DocumentType {
    /// Lenient parse: anything other than "cv" (any case) is a resume
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "cv" => DocumentType::Cv,
            _ => DocumentType::Resume,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::Cv => "cv",
        }
    }
}

/// Rendering strategy selected by the request's `template` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Paginating engine over a [`PdfDocument`](pdf_core::PdfDocument)
    Basic,
    /// Byte-level minimal emitter
    Simple,
    /// HTML template merged and printed by an external converter
    Html,
}

impl TemplateKind {
    /// Lowercase, trim and map the common synonyms of "basic"
    pub fn normalize_key(raw: Option<&str>) -> String {
        let key = raw.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        match key.as_str() {
            "" | "true" | "false" | "default" | "std" | "standard" => "basic".to_string(),
            _ => key,
        }
    }

    /// Look up a normalized key
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "basic" => Some(TemplateKind::Basic),
            "simple" => Some(TemplateKind::Simple),
            "docx" | "html" => Some(TemplateKind::Html),
            _ => None,
        }
    }

    /// [`from_key`](Self::from_key), failing with `UnsupportedTemplate`
    pub fn parse(key: &str) -> crate::Result<Self> {
        Self::from_key(key).ok_or_else(|| crate::TemplateError::UnsupportedTemplate(key.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Basic => "basic",
            TemplateKind::Simple => "simple",
            TemplateKind::Html => "html",
        }
    }
}
