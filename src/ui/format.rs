use crossterm::style::Stylize;
use unicode_width::UnicodeWidthStr;

use crate::controller::editor::{DiffLine, DiffLineKind};
use crate::controller::views::{self, RunSummary};
use crate::types::{
    CandidateEvaluation, DocType, DocumentMeta, JdAnalysis, OutreachEmail, PipelineRunResponse,
    PipelineStatus, Severity,
};
use crate::ui::symbols::Symbols;

const ID_PREFIX_CHARS: usize = 8;
const STRENGTHS_SHOWN: usize = 5;
const BAR_WIDTH: usize = 20;

// ── Messages ──────────────────────────────────────────────────────────────────

pub(crate) fn info_line(text: &str) -> String {
    format!("  {} {}", Symbols::current().record.dark_grey(), text)
}

pub(crate) fn ok_line(text: &str) -> String {
    format!("  {} {}", Symbols::current().record.green(), text)
}

pub(crate) fn error_line(text: &str) -> String {
    format!("  {} {}", Symbols::current().warning.red(), text.red())
}

pub(crate) fn help_lines<'a>(rows: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<String> {
    let rows: Vec<_> = rows.collect();
    let width = rows.iter().map(|(u, _)| u.width()).max().unwrap_or(0);
    let mut out = vec![format!("  {}", "Commands".bold())];
    for (usage, desc) in rows {
        let pad = " ".repeat(width - usage.width());
        out.push(format!("    {}{pad}  {}", usage.cyan(), desc.dark_grey()));
    }
    out
}

// ── Status ────────────────────────────────────────────────────────────────────

pub(crate) fn status_banner(snapshot: &PipelineRunResponse) -> Vec<String> {
    let s = Symbols::current();
    let label = format!(" {} ", snapshot.status.label());
    let badge = match snapshot.status {
        PipelineStatus::Completed => label.black().on_green(),
        PipelineStatus::Failed => label.white().on_red(),
        PipelineStatus::AwaitingApproval => label.black().on_yellow(),
        PipelineStatus::Pending => label.black().on_grey(),
        _ => label.white().on_blue(),
    };
    let mut out = vec![format!(
        "{} {}  {}",
        s.record.cyan(),
        badge,
        format!("run {}", short_id(&snapshot.run_id)).dark_grey()
    )];
    if let Some(err) = snapshot.error.as_deref().filter(|e| !e.trim().is_empty()) {
        out.push(format!("  {} {}", s.corner.dark_grey(), err.red()));
    }
    out
}

pub(crate) fn summary_badges(summary: &RunSummary) -> String {
    let s = Symbols::current();
    format!(
        "  {} evaluated {} {} shortlisted {} {} avg match {} {} emails",
        summary.evaluated.to_string().bold(),
        s.dot.dark_grey(),
        summary.shortlisted.to_string().bold(),
        s.dot.dark_grey(),
        format!("{}%", summary.average_match).bold(),
        s.dot.dark_grey(),
        summary.emails.to_string().bold(),
    )
}

/// Banner, badges and the next thing the reviewer can do.
pub(crate) fn run_overview(snapshot: &PipelineRunResponse, polling: bool) -> Vec<String> {
    let mut out = status_banner(snapshot);
    if !snapshot.evaluations.is_empty() || !snapshot.emails.is_empty() {
        out.push(summary_badges(&RunSummary::of(snapshot)));
    }
    let hint = match snapshot.status {
        PipelineStatus::AwaitingApproval => {
            Some("select candidates with `select <id>`, then `approve`")
        }
        PipelineStatus::Completed if !snapshot.emails.is_empty() => {
            Some("`email` lists the drafts; `edit <id>` to change one")
        }
        status if status.is_active() && !polling => {
            Some("updates stopped; `refresh` to check again")
        }
        _ => None,
    };
    if let Some(hint) = hint {
        out.push(format!("  {}", hint.dark_grey()));
    }
    out
}

// ── Analysis ──────────────────────────────────────────────────────────────────

pub(crate) fn analysis_lines(analysis: &JdAnalysis) -> Vec<String> {
    let mut out = Vec::new();
    let title = if analysis.role_title.trim().is_empty() {
        "Job analysis".to_string()
    } else {
        analysis.role_title.clone()
    };
    out.push(format!("  {}", title.bold()));
    if !analysis.experience_level.trim().is_empty() {
        out.push(format!("    {}", analysis.experience_level.as_str().dark_grey()));
    }
    if !analysis.summary.trim().is_empty() {
        out.push(format!("    {}", analysis.summary.trim()));
    }
    let sections: [(&str, &[String]); 5] = [
        ("Technical", &analysis.technical_requirements),
        ("Soft skills", &analysis.soft_skills),
        ("Culture", &analysis.cultural_fit_indicators),
        ("Education", &analysis.education_requirements),
        ("Nice to have", &analysis.nice_to_haves),
    ];
    for (label, items) in sections {
        if items.is_empty() {
            continue;
        }
        out.push(format!("    {} {}", format!("{label}:").cyan(), items.join(", ")));
    }
    out
}

// ── Candidates ────────────────────────────────────────────────────────────────

pub(crate) fn short_id(id: &str) -> String {
    if id.chars().count() <= ID_PREFIX_CHARS {
        return id.to_string();
    }
    let mut out: String = id.chars().take(ID_PREFIX_CHARS).collect();
    out.push_str(Symbols::current().ellipsis);
    out
}

fn match_bar(pct: f64) -> String {
    let s = Symbols::current();
    let pct = pct.clamp(0.0, 100.0);
    let filled = ((pct / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!(
        "{}{}",
        s.bar_full.repeat(filled),
        s.bar_empty.repeat(BAR_WIDTH - filled)
    );
    let label = format!("{:>3.0}%", pct);
    if pct >= 80.0 {
        format!("{} {}", bar.green(), label.green().bold())
    } else if pct >= 60.0 {
        format!("{} {}", bar.yellow(), label.yellow().bold())
    } else {
        format!("{} {}", bar.red(), label.red().bold())
    }
}

fn severity_tag(severity: Severity) -> String {
    let tag = severity.as_str().to_uppercase();
    match severity {
        Severity::High => tag.red().to_string(),
        Severity::Medium => tag.yellow().to_string(),
        Severity::Low => tag.dark_grey().to_string(),
    }
}

/// One-line header used by the list view.
pub(crate) fn candidate_row(ev: &CandidateEvaluation, selected: Option<bool>) -> String {
    let s = Symbols::current();
    let check = match selected {
        Some(true) => format!("{} ", s.selected.green()),
        Some(false) => format!("{} ", s.unselected.dark_grey()),
        None => String::new(),
    };
    let star = if ev.shortlisted {
        format!(" {}", s.star.yellow())
    } else {
        String::new()
    };
    format!(
        "  {check}{} {}{star}  {}",
        match_bar(ev.match_percentage),
        ev.candidate_name.as_str().bold(),
        short_id(&ev.resume_id).dark_grey()
    )
}

pub(crate) fn candidate_list(
    snapshot: &PipelineRunResponse,
    is_selected: impl Fn(&str) -> bool,
) -> Vec<String> {
    if snapshot.evaluations.is_empty() {
        return vec![info_line("no candidates evaluated yet")];
    }
    let selectable = snapshot.status.accepts_approval();
    views::ranked(&snapshot.evaluations)
        .into_iter()
        .map(|ev| candidate_row(ev, selectable.then(|| is_selected(&ev.resume_id))))
        .collect()
}

/// The full card for one candidate.
pub(crate) fn candidate_card(ev: &CandidateEvaluation) -> Vec<String> {
    let s = Symbols::current();
    let mut out = vec![candidate_row(ev, None)];
    out.push(format!("    {}", ev.resume_id.as_str().dark_grey()));
    if !ev.reasoning.trim().is_empty() {
        out.push(format!("    {}", ev.reasoning.trim()));
    }

    if !ev.strengths.is_empty() {
        let shown: Vec<&str> = ev
            .strengths
            .iter()
            .take(STRENGTHS_SHOWN)
            .map(String::as_str)
            .collect();
        let mut line = format!("    {} {}", "Strengths:".green(), shown.join(", "));
        if ev.strengths.len() > STRENGTHS_SHOWN {
            line.push_str(&format!(
                " {}",
                format!("+{} more", ev.strengths.len() - STRENGTHS_SHOWN).dark_grey()
            ));
        }
        out.push(line);
    }

    if !ev.gap_analysis.is_empty() {
        out.push(format!("    {}", "Gaps:".yellow()));
        for gap in &ev.gap_analysis {
            let trainable = if gap.trainable {
                " (trainable)".dark_grey().to_string()
            } else {
                String::new()
            };
            out.push(format!(
                "      {} {} {}{trainable}",
                s.bullet,
                severity_tag(gap.severity),
                gap.skill
            ));
        }
    }

    if !ev.notable_projects.is_empty() {
        out.push(format!("    {}", "Projects:".cyan()));
        for project in &ev.notable_projects {
            out.push(format!("      {} {}", s.bullet, shorten_text(project, 120)));
        }
    }
    out
}

// ── Emails ────────────────────────────────────────────────────────────────────

pub(crate) fn email_list(emails: &[OutreachEmail]) -> Vec<String> {
    if emails.is_empty() {
        return vec![info_line("no emails drafted yet")];
    }
    let s = Symbols::current();
    emails
        .iter()
        .map(|e| {
            format!(
                "  {} {}  {} {}",
                s.arrow_right.cyan(),
                e.candidate_name.as_str().bold(),
                shorten_text(&e.subject, 60),
                short_id(&e.resume_id).dark_grey()
            )
        })
        .collect()
}

pub(crate) fn email_lines(email: &OutreachEmail) -> Vec<String> {
    let s = Symbols::current();
    let mut out = vec![
        format!(
            "  {} {}  {}",
            "To:".dark_grey(),
            email.candidate_name.as_str().bold(),
            short_id(&email.resume_id).dark_grey()
        ),
        format!("  {} {}", "Subject:".dark_grey(), email.subject),
        format!("  {}", s.corner.dark_grey()),
    ];
    out.extend(email.body.lines().map(|l| format!("    {l}")));
    out
}

/// Draft changes against the backend copy, with removed and added lines filled.
pub(crate) fn diff_lines(diff: &[DiffLine]) -> Vec<String> {
    diff.iter()
        .map(|line| match line.kind {
            DiffLineKind::Same => format!("    {}", line.text.as_str().dark_grey()),
            DiffLineKind::Removed => bg_fill_after_prefix("  - ", &line.text, true),
            DiffLineKind::Added => bg_fill_after_prefix("  + ", &line.text, false),
        })
        .collect()
}

fn bg_fill_after_prefix(prefix: &str, content: &str, is_delete: bool) -> String {
    let term_width = crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80);
    let used = prefix.width() + content.width();
    let padding = " ".repeat(term_width.saturating_sub(used));
    let padded = format!("{content}{padding}");
    let colored = if is_delete {
        padded.white().on_dark_red().to_string()
    } else {
        padded.white().on_dark_green().to_string()
    };
    format!("{prefix}{colored}")
}

// ── Documents ─────────────────────────────────────────────────────────────────

pub(crate) fn document_lines(docs: &[DocumentMeta]) -> Vec<String> {
    if docs.is_empty() {
        return vec![info_line("no documents uploaded")];
    }
    let s = Symbols::current();
    docs.iter()
        .map(|d| {
            let kind = match d.doc_type {
                DocType::Jd => " JD ".black().on_cyan(),
                DocType::Resume => " CV ".black().on_grey(),
            };
            format!(
                "  {kind} {}  {} {} {}",
                d.filename.as_str().bold(),
                short_id(&d.id).dark_grey(),
                s.dot.dark_grey(),
                d.uploaded_at.format("%Y-%m-%d %H:%M").to_string().dark_grey()
            )
        })
        .collect()
}

pub(crate) fn shorten_text(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars.saturating_sub(1)).collect();
    out.push_str(Symbols::current().ellipsis);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{email, evaluation, snapshot};
    use crate::types::GapItem;
    use crate::ui::screen::strip_ansi;

    fn plain(lines: &[String]) -> Vec<String> {
        lines.iter().map(|l| strip_ansi(l)).collect()
    }

    #[test]
    fn short_ids_keep_eight_chars() {
        assert_eq!(short_id("r7"), "r7");
        assert_eq!(short_id("3f2a9c1d77"), format!("3f2a9c1d{}", Symbols::current().ellipsis));
    }

    #[test]
    fn shorten_text_respects_limit() {
        assert_eq!(shorten_text("  short  ", 10), "short");
        assert_eq!(shorten_text("abcdefghij", 5).chars().count(), 5);
    }

    #[test]
    fn banner_shows_label_and_error() {
        let mut snap = snapshot("run-1", PipelineStatus::Failed);
        snap.error = Some("evaluator crashed".into());
        let lines = plain(&status_banner(&snap));
        assert!(lines[0].contains("Pipeline failed"));
        assert!(lines[1].contains("evaluator crashed"));
    }

    #[test]
    fn overview_hints_at_approval() {
        let snap = snapshot("run-1", PipelineStatus::AwaitingApproval);
        let lines = plain(&run_overview(&snap, false));
        assert!(lines.iter().any(|l| l.contains("approve")));
    }

    #[test]
    fn overview_flags_stalled_polling() {
        let snap = snapshot("run-1", PipelineStatus::Evaluating);
        assert!(plain(&run_overview(&snap, false)).iter().any(|l| l.contains("refresh")));
        assert!(!plain(&run_overview(&snap, true)).iter().any(|l| l.contains("refresh")));
    }

    #[test]
    fn card_caps_strengths_and_tags_gaps() {
        let mut ev = evaluation("r1", 84.0, true);
        ev.strengths = (1..=7).map(|i| format!("s{i}")).collect();
        ev.gap_analysis = vec![GapItem {
            skill: "Kubernetes".into(),
            trainable: true,
            severity: Severity::High,
        }];
        let lines = plain(&candidate_card(&ev));
        let strengths = lines.iter().find(|l| l.contains("Strengths:")).expect("strengths");
        assert!(strengths.contains("s5"));
        assert!(!strengths.contains("s6"));
        assert!(strengths.contains("+2 more"));
        assert!(lines.iter().any(|l| l.contains("HIGH Kubernetes (trainable)")));
        assert!(lines[0].contains("84%"));
    }

    #[test]
    fn checkboxes_only_while_awaiting_approval() {
        let mut snap = snapshot("run-1", PipelineStatus::AwaitingApproval);
        snap.evaluations = vec![evaluation("r1", 90.0, true), evaluation("r2", 70.0, true)];
        let sel = Symbols::current().selected;
        let lines = plain(&candidate_list(&snap, |id| id == "r2"));
        assert!(lines[1].contains(sel));
        assert!(!lines[0].contains(sel));

        snap.status = PipelineStatus::Completed;
        let lines = plain(&candidate_list(&snap, |_| true));
        assert!(lines.iter().all(|l| !l.contains(sel)));
    }

    #[test]
    fn email_preview_includes_body_lines() {
        let lines = plain(&email_lines(&email("r7", "Hello", "Hi there\nBest")));
        assert!(lines.iter().any(|l| l.contains("Subject: Hello")));
        assert!(lines.iter().any(|l| l.trim() == "Best"));
    }

    #[test]
    fn diff_marks_changed_lines() {
        let diff = vec![
            DiffLine {
                kind: DiffLineKind::Removed,
                text: "Subject: Hello".into(),
            },
            DiffLine {
                kind: DiffLineKind::Added,
                text: "Subject: Hi".into(),
            },
        ];
        let lines = plain(&diff_lines(&diff));
        assert!(lines[0].starts_with("  - Subject: Hello"));
        assert!(lines[1].starts_with("  + Subject: Hi"));
    }
}
