//! Mapping from the wizard form to the section-based render record

use crate::schema::{
    DocumentType, HistoryEntry, QualificationEntry, ResumeFormData, ResumeRecord, Section,
};

pub const CONTACT_TITLE: &str = "連絡先";
pub const HISTORY_TITLE: &str = "学歴・職歴";
pub const QUALIFICATIONS_TITLE: &str = "資格";
pub const RESUME_NOTES_TITLE: &str = "自己PR";
pub const CV_NOTES_TITLE: &str = "職務要約";

/// Build the render record for `doc_type`
///
/// Sections come in a fixed order (contact, history, qualifications, free
/// text); lines that format to nothing are skipped and sections without
/// lines are left out.
pub fn normalize(form: &ResumeFormData, doc_type: DocumentType) -> ResumeRecord {
    let mut sections = Vec::new();

    let contact = non_empty([
        labelled("メール", &form.email),
        labelled("電話", &form.phone),
        labelled("住所", &form.address_main),
    ]);
    push_section(&mut sections, CONTACT_TITLE, contact);

    let history = form.history.iter().map(format_history).collect();
    push_section(&mut sections, HISTORY_TITLE, history);

    let qualifications = form
        .qualifications
        .iter()
        .map(format_qualification)
        .collect();
    push_section(&mut sections, QUALIFICATIONS_TITLE, qualifications);

    let (title, notes) = match doc_type {
        DocumentType::Resume => (
            RESUME_NOTES_TITLE,
            non_empty([
                form.generated_resume_pr.clone(),
                form.q1_resume.clone(),
                form.q2_resume.clone(),
                form.q3_resume.clone(),
                form.q4_resume.clone(),
                form.q5_resume.clone(),
            ]),
        ),
        DocumentType::Cv => (
            CV_NOTES_TITLE,
            non_empty([
                form.generated_cv_summary.clone(),
                form.generated_cv_details.clone(),
                form.generated_cv_skills.clone(),
                form.generated_cv_pr.clone(),
                form.generated_cv_speciality.clone(),
            ]),
        ),
    };
    push_section(&mut sections, title, notes);

    ResumeRecord {
        name: form.name.clone(),
        headline: headline(form, doc_type),
        sections,
    }
}

/// Generated text wins over the raw answer it was generated from
fn headline(form: &ResumeFormData, doc_type: DocumentType) -> Option<String> {
    let candidates = match doc_type {
        DocumentType::Resume => vec![form.generated_resume_pr.as_str(), form.q1_resume.as_str()],
        DocumentType::Cv => vec![form.generated_cv_summary.as_str()],
    };
    candidates
        .into_iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// `"{year}年{month}月 {desc}（{status}）"`, dropping empty parts
pub fn format_history(entry: &HistoryEntry) -> String {
    let detail = match (entry.desc.trim(), entry.status.trim()) {
        (desc, "") => desc.to_string(),
        (desc, status) => format!("{desc}（{status}）"),
    };
    join_when(&entry.year, &entry.month, &detail)
}

/// `"{year}年{month}月 {desc}"`, dropping empty parts
pub fn format_qualification(entry: &QualificationEntry) -> String {
    join_when(&entry.year, &entry.month, entry.desc.trim())
}

fn join_when(year: &str, month: &str, detail: &str) -> String {
    let when = match (year.trim(), month.trim()) {
        ("", "") => String::new(),
        (year, "") => format!("{year}年"),
        ("", month) => format!("{month}月"),
        (year, month) => format!("{year}年{month}月"),
    };
    match (when.is_empty(), detail.is_empty()) {
        (true, _) => detail.to_string(),
        (false, true) => when,
        (false, false) => format!("{when} {detail}"),
    }
}

/// Remove history rows whose every field is blank
pub fn sanitize_history(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    entries.into_iter().filter(|e| !e.is_empty()).collect()
}

pub fn sanitize_qualifications(entries: Vec<QualificationEntry>) -> Vec<QualificationEntry> {
    entries.into_iter().filter(|e| !e.is_empty()).collect()
}

fn labelled(label: &str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        String::new()
    } else {
        format!("{label}: {value}")
    }
}

fn non_empty<const N: usize>(values: [String; N]) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn push_section(sections: &mut Vec<Section>, title: &str, items: Vec<String>) {
    let items: Vec<String> = items.into_iter().filter(|i| !i.trim().is_empty()).collect();
    if !items.is_empty() {
        sections.push(Section::new(title, items));
    }
}
