//! HTML template merge for the external print path
//!
//! Templates are HTML files (converted once from the original DOCX
//! layouts) with `{{ key }}` tokens. Values are looked up in a flat map and
//! HTML-escaped; tokens with no value are removed.

use crate::normalize::{format_history, format_qualification};
use crate::placeholder::{leaf_to_string, replace_tokens};
use crate::schema::{DocumentType, ResumeFormData};
use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Escape the five HTML-significant characters
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Substitute `{{ key }}` tokens with escaped values from `context`
pub fn merge(template_html: &str, context: &Map<String, Value>) -> String {
    replace_tokens(template_html, |key| {
        context
            .get(key)
            .map(|value| escape_html(&leaf_to_string(value)))
            .unwrap_or_default()
    })
}

/// Location of the template for `doc_type` under `template_dir`
pub fn template_path(template_dir: &Path, doc_type: DocumentType) -> PathBuf {
    let name = doc_type.as_str();
    template_dir.join(name).join(format!("{name}.html"))
}

/// `2025年11月3日`
pub fn format_date(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// Full years between `birth_date` (`YYYY-MM-DD`) and `today`
pub fn age_on(birth_date: &str, today: NaiveDate) -> Option<u32> {
    let birth = NaiveDate::parse_from_str(birth_date.trim(), "%Y-%m-%d").ok()?;
    today.years_since(birth)
}

/// Placeholder map for the resume template
pub fn resume_context(form: &ResumeFormData, today: NaiveDate) -> Map<String, Value> {
    let birth = NaiveDate::parse_from_str(form.birth_date.trim(), "%Y-%m-%d").ok();
    let (contact_furigana, contact_postal_code, contact_main) = form.contact_address();

    let history: Vec<String> = form.history.iter().map(format_history).collect();
    let qualifications: Vec<String> = form
        .qualifications
        .iter()
        .map(format_qualification)
        .collect();

    let mut context = Map::new();
    let mut put = |key: &str, value: String| {
        context.insert(key.to_string(), Value::String(value));
    };

    put("date_created", format_date(today));
    put("name_furigana", form.name_furigana.clone());
    put("name", form.name.clone());
    put("photo", form.photo.clone().unwrap_or_default());
    put(
        "birth_year",
        birth.map(|d| d.year().to_string()).unwrap_or_default(),
    );
    put(
        "birth_month",
        birth.map(|d| d.month().to_string()).unwrap_or_default(),
    );
    put(
        "birth_day",
        birth.map(|d| d.day().to_string()).unwrap_or_default(),
    );
    put(
        "age",
        age_on(&form.birth_date, today)
            .map(|age| age.to_string())
            .unwrap_or_default(),
    );
    put("gender", form.gender.as_str().to_string());
    put("address_furigana", form.address_furigana.clone());
    put("address_postal_code", form.address_postal_code.clone());
    put("address_main", form.address_main.clone());
    put("phone", form.phone.clone());
    put("email", form.email.clone());
    put("contact_address_furigana", contact_furigana.to_string());
    put("contact_address_postal_code", contact_postal_code.to_string());
    put("contact_address_main", contact_main.to_string());
    put("contact_phone", form.contact_phone.clone());
    put("contact_email", form.contact_email.clone());
    put("history", history.join("\n"));
    put("qualifications", qualifications.join("\n"));
    put(
        "generated_pr",
        first_non_empty(&[&form.generated_resume_pr, &form.q1_resume]),
    );
    put("special_requests", form.special_requests.clone());
    context
}

/// Placeholder map for the CV (職務経歴書) template
pub fn cv_context(form: &ResumeFormData, today: NaiveDate) -> Map<String, Value> {
    let mut context = Map::new();
    let mut put = |key: &str, value: String| {
        context.insert(key.to_string(), Value::String(value));
    };

    put("date_created", format_date(today));
    put("name", form.name.clone());
    put("work_summary", form.generated_cv_summary.clone());
    put("work_details", form.generated_cv_details.clone());
    put("skills", form.generated_cv_skills.clone());
    put(
        "self_pr_cv",
        first_non_empty(&[&form.generated_cv_pr, &form.generated_resume_pr]),
    );
    put("speciality", form.generated_cv_speciality.clone());
    context
}

/// Context for `doc_type`
pub fn context_for(
    form: &ResumeFormData,
    doc_type: DocumentType,
    today: NaiveDate,
) -> Map<String, Value> {
    match doc_type {
        DocumentType::Resume => resume_context(form, today),
        DocumentType::Cv => cv_context(form, today),
    }
}

fn first_non_empty(candidates: &[&String]) -> String {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Wrap a merged body in a printable A4 document
pub fn wrap_document(body: &str) -> String {
    format!(
        r#"<!doctype html><html lang="ja"><head><meta charset="utf-8">
<style>
@page{{size:A4;margin:15mm;}}
body{{font-family:"Noto Sans JP","Noto Sans CJK JP","IPAexGothic",sans-serif;font-size:12pt;line-height:1.6;}}
h1,h2,h3{{margin:0.3em 0;}} p{{margin:0.25em 0;white-space:pre-wrap;}}
</style></head><body>{body}</body></html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::HistoryEntry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_merge_escapes_and_strips() {
        let context = json!({ "name": "<b>Taro</b>", "age": 30 });
        let Value::Object(context) = context else {
            unreachable!()
        };
        let html = merge(
            "<p>{{ name }} ({{age}}) {{ unknown }}</p>",
            &context,
        );
        assert_eq!(html, "<p>&lt;b&gt;Taro&lt;/b&gt; (30) </p>");
    }

    #[test]
    fn test_template_path() {
        let path = template_path(Path::new("public/docs"), DocumentType::Cv);
        assert_eq!(path, PathBuf::from("public/docs/cv/cv.html"));
    }

    #[test]
    fn test_age_on() {
        assert_eq!(age_on("1995-04-12", today()), Some(30));
        assert_eq!(age_on("1995-12-12", today()), Some(29));
        assert_eq!(age_on("not a date", today()), None);
    }

    #[test]
    fn test_resume_context_fields() {
        let form = ResumeFormData {
            name: "山田太郎".to_string(),
            birth_date: "1995-04-12".to_string(),
            address_main: "東京都千代田区".to_string(),
            same_as_current_address: true,
            history: vec![HistoryEntry {
                year: "2020".to_string(),
                month: "4".to_string(),
                desc: "入社".to_string(),
                status: String::new(),
            }],
            q1_resume: "粘り強い".to_string(),
            ..Default::default()
        };

        let context = resume_context(&form, today());
        assert_eq!(context["date_created"], json!("2025年11月3日"));
        assert_eq!(context["birth_year"], json!("1995"));
        assert_eq!(context["birth_month"], json!("4"));
        assert_eq!(context["age"], json!("30"));
        assert_eq!(context["contact_address_main"], json!("東京都千代田区"));
        assert_eq!(context["history"], json!("2020年4月 入社"));
        assert_eq!(context["generated_pr"], json!("粘り強い"));
    }

    #[test]
    fn test_cv_context_fields() {
        let form = ResumeFormData {
            generated_cv_summary: "要約".to_string(),
            generated_resume_pr: "PR".to_string(),
            ..Default::default()
        };
        let context = cv_context(&form, today());
        assert_eq!(context["work_summary"], json!("要約"));
        assert_eq!(context["self_pr_cv"], json!("PR"));
        assert_eq!(context["skills"], json!(""));
    }

    #[test]
    fn test_wrap_document() {
        let html = wrap_document("<p>x</p>");
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<body><p>x</p></body>"));
        assert!(html.contains("size:A4"));
    }
}
