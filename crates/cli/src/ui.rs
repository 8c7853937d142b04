//! # Terminal Rendering
//!
//! Formats workflow and dashboard state as text. Every function returns a `String`
//! so callers decide where it goes.

use colored::{ColoredString, Colorize};
use lumascan::constants::SKILL_PREVIEW_LIMIT;
use lumascan::types::{MatchResult, ResumeRecord, ScoreBucket};
use lumascan::workflow::{MatchState, UploadState, ViewState};
use std::fmt::Write;

fn heading(text: &str) -> ColoredString {
    text.bold()
}

fn bullet_list(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "  • {item}");
    }
}

pub fn skills(skills: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", heading("Extracted skills"), skills.len());
    if skills.is_empty() {
        let _ = writeln!(out, "  (none found)");
    }
    bullet_list(&mut out, skills);
    out
}

/// The result of an upload: the skills, then (unless `quiet`) the extracted text.
pub fn upload(view: &ViewState, quiet: bool) -> String {
    let mut out = skills(&view.skills);
    if !quiet {
        let _ = writeln!(out, "\n{}", heading("Resume text"));
        let _ = writeln!(out, "{}", view.resume_text);
    }
    out
}

fn colored_score(score: f64, bucket: ScoreBucket) -> ColoredString {
    let text = format!("{score:.0}%");
    match bucket {
        ScoreBucket::High => text.green().bold(),
        ScoreBucket::Medium => text.yellow().bold(),
        ScoreBucket::Low => text.red().bold(),
    }
}

pub fn match_report(result: &MatchResult) -> String {
    let bucket = result.bucket();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({})",
        heading("Match score:"),
        colored_score(result.match_score, bucket),
        bucket.label()
    );

    let sections: [(&str, &[String]); 3] = [
        ("Matched skills", &result.matched_skills),
        ("Missing core skills", &result.missing_core_skills),
        ("Missing secondary skills", &result.missing_secondary_skills),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}", heading(title));
        bullet_list(&mut out, items);
    }

    if !result.industry_analysis.is_empty() {
        let _ = writeln!(out, "\n{}", heading("Industry analysis"));
        let _ = writeln!(out, "  {}", result.industry_analysis);
    }
    if !result.experience_level.is_empty() {
        let _ = writeln!(
            out,
            "\n{} {}",
            heading("Experience level:"),
            result.experience_level
        );
    }

    let breakdown = &result.score_breakdown;
    let _ = writeln!(out, "\n{}", heading("Score breakdown"));
    let _ = writeln!(out, "  Exact matches: {}", breakdown.exact_matches);
    let _ = writeln!(
        out,
        "  Cosine similarity: overall {:.2}, skills {:.2}, contribution {:.1}",
        breakdown.cosine_similarity.overall,
        breakdown.cosine_similarity.skills,
        breakdown.cosine_similarity.contribution
    );

    if !result.warnings.is_empty() {
        let _ = writeln!(out, "\n{}", "Warnings".yellow().bold());
        bullet_list(&mut out, &result.warnings);
    }
    out
}

/// One line of skills: at most the preview limit, then `+N more`.
fn skill_preview(record: &ResumeRecord) -> String {
    let (shown, hidden) = record.skill_preview(SKILL_PREVIEW_LIMIT);
    let mut line = shown.join(", ");
    if hidden > 0 {
        let _ = write!(line, " +{hidden} more");
    }
    line
}

pub fn record_list(records: &[ResumeRecord]) -> String {
    if records.is_empty() {
        return "No saved resumes yet.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{}  {}  {}",
            record.id.dimmed(),
            record.display_title().bold(),
            record.created_at.format("%Y-%m-%d %H:%M")
        );
        let preview = skill_preview(record);
        if !preview.is_empty() {
            let _ = writeln!(out, "    {preview}");
        }
    }
    out
}

pub fn record_detail(record: &ResumeRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record.display_title().bold());
    let _ = writeln!(
        out,
        "Saved {} ({})",
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.id
    );
    let _ = writeln!(out);
    out.push_str(&skills(&record.skills));
    let _ = writeln!(out, "\n{}", heading("Resume text"));
    let _ = writeln!(out, "{}", record.resume_text);
    out
}

/// The one-line summary the shell shows for `status`.
pub fn status(view: &ViewState, signed_in_as: Option<&str>) -> String {
    let account = match signed_in_as {
        Some(email) => format!("signed in as {email}"),
        None => "not signed in (results are not saved)".to_string(),
    };
    let upload = match &view.upload {
        UploadState::Idle => "no resume".to_string(),
        UploadState::Uploading => "uploading".to_string(),
        UploadState::Uploaded => format!("resume loaded ({} skills)", view.skills.len()),
        UploadState::Failed(message) => format!("upload failed: {message}"),
    };
    let matching = match &view.matching {
        MatchState::Idle => None,
        MatchState::Matching => Some("matching".to_string()),
        MatchState::Matched => view
            .match_result
            .as_ref()
            .map(|r| format!("last score {:.0}%", r.match_score)),
        MatchState::Failed(message) => Some(format!("match failed: {message}")),
    };

    let mut line = format!("{account}; {upload}");
    if let Some(matching) = matching {
        let _ = write!(line, "; {matching}");
    }
    line
}

pub fn save_warning(message: &str) -> String {
    format!("{} {message}", "Could not save resume:".yellow())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(skills: usize) -> ResumeRecord {
        ResumeRecord {
            id: "r1".into(),
            user_id: "u1".into(),
            created_at: Utc::now(),
            resume_text: "text".into(),
            skills: (1..=skills).map(|i| format!("s{i}")).collect(),
            job_title: None,
        }
    }

    #[test]
    fn test_skill_preview_truncates_with_count() {
        colored::control::set_override(false);
        assert_eq!(skill_preview(&record(3)), "s1, s2, s3");
        let preview = skill_preview(&record(13));
        assert!(preview.ends_with("s10 +3 more"));
    }

    #[test]
    fn test_record_list_uses_untitled_label() {
        colored::control::set_override(false);
        let out = record_list(&[record(1)]);
        assert!(out.contains("Untitled Resume"));
        assert_eq!(record_list(&[]), "No saved resumes yet.\n");
    }

    #[test]
    fn test_match_report_labels_bucket() {
        colored::control::set_override(false);
        let result = MatchResult {
            match_score: 60.0,
            missing_core_skills: vec!["kubernetes".into()],
            ..Default::default()
        };
        let out = match_report(&result);
        assert!(out.starts_with("Match score: 60% (medium)"));
        assert!(out.contains("Missing core skills"));
        assert!(!out.contains("Matched skills"));
    }
}
