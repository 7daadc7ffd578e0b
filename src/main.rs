mod api;
mod commands;
mod config;
mod controller;
mod journal;
mod types;
mod ui;
mod uploads;

use std::{
    io::IsTerminal,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use api::{HttpPipelineClient, PipelineApi};
use commands::Command;
use config::ClientConfig;
use controller::{
    EmailDraft, RunController, RunState,
    views::{self, Resolution},
};
use types::PipelineStatus;
use ui::format::{
    analysis_lines, candidate_card, candidate_list, diff_lines, document_lines, email_lines,
    email_list, error_line, help_lines, info_line, ok_line, run_overview,
};
use ui::screen::Screen;

const ENV_LOG: &str = "RECRUITDECK_LOG";
const BODY_TERMINATOR: &str = ".";

// ── App ───────────────────────────────────────────────────────────────────────

/// What the next typed line means.
enum InputMode {
    Command,
    EditSubject(EmailDraft),
    EditBody { draft: EmailDraft, lines: Vec<String> },
    ConfirmEdit(EmailDraft),
}

pub(crate) struct App {
    controller: RunController,
    screen: Screen,
    mode: InputMode,
    /// Run and status last rendered from a store update.
    last_seen: Option<(String, PipelineStatus)>,
    quit: bool,
}

impl App {
    fn new(controller: RunController, screen: Screen) -> Self {
        Self {
            controller,
            screen,
            mode: InputMode::Command,
            last_seen: None,
            quit: false,
        }
    }

    fn say(&mut self, lines: Vec<String>) {
        self.screen.emit(&lines);
    }

    fn fail(&mut self, err: impl std::fmt::Display) {
        self.say(vec![error_line(&err.to_string())]);
    }

    fn set_mode(&mut self, mode: InputMode) {
        let label = match &mode {
            InputMode::Command => None,
            InputMode::EditSubject(_) => Some("subject"),
            InputMode::EditBody { .. } => Some("body"),
            InputMode::ConfirmEdit(_) => Some("save? [y/N]"),
        };
        self.screen.set_prompt_label(label);
        self.mode = mode;
    }

    fn resolve(&self, prefix: &str) -> Result<String, String> {
        self.controller.store().with_snapshot(|snap| {
            let Some(snap) = snap else {
                return Err("no run yet; `launch` first".to_string());
            };
            match views::resolve_resume_id(snap, prefix) {
                Resolution::Unique(id) => Ok(id),
                Resolution::Missing => Err(format!("no candidate matches `{prefix}`")),
                Resolution::Ambiguous(ids) => {
                    Err(format!("`{prefix}` is ambiguous: {}", ids.join(", ")))
                }
            }
        })
    }

    /// Renders a store update once per run/status transition.
    fn on_store_change(&mut self, state: &RunState) {
        let Some(snap) = &state.snapshot else {
            self.last_seen = None;
            return;
        };
        let key = (snap.run_id.clone(), snap.status);
        if self.last_seen.as_ref() == Some(&key) {
            return;
        }
        self.last_seen = Some(key);

        let mut lines = run_overview(snap, self.controller.is_polling());
        match snap.status {
            PipelineStatus::AwaitingApproval => {
                if let Some(analysis) = &snap.jd_analysis {
                    lines.extend(analysis_lines(analysis));
                }
                let selection = self.controller.selection();
                lines.extend(candidate_list(snap, |id| selection.contains(id)));
            }
            PipelineStatus::Completed => lines.extend(email_list(&snap.emails)),
            _ => {}
        }
        self.say(lines);
    }

    async fn handle_line(&mut self, line: String) {
        let mode = std::mem::replace(&mut self.mode, InputMode::Command);
        match mode {
            InputMode::Command => {
                self.set_mode(InputMode::Command);
                match commands::parse(&line) {
                    Ok(Some(cmd)) => self.run_command(cmd).await,
                    Ok(None) => self.say(Vec::new()),
                    Err(e) => self.fail(e),
                }
            }
            InputMode::EditSubject(mut draft) => {
                let subject = line.trim();
                if !subject.is_empty() {
                    draft.set_subject(subject);
                }
                self.say(vec![info_line(&format!(
                    "body: type the new text, end with a line containing only `{BODY_TERMINATOR}` (just `{BODY_TERMINATOR}` keeps it)"
                ))]);
                self.set_mode(InputMode::EditBody {
                    draft,
                    lines: Vec::new(),
                });
            }
            InputMode::EditBody { mut draft, mut lines } => {
                if line.trim_end() != BODY_TERMINATOR {
                    lines.push(line.trim_end_matches(['\r', '\n']).to_string());
                    self.set_mode(InputMode::EditBody { draft, lines });
                    self.say(Vec::new());
                    return;
                }
                if !lines.is_empty() {
                    draft.set_body(lines.join("\n"));
                }
                if !draft.is_dirty() {
                    self.set_mode(InputMode::Command);
                    self.say(vec![info_line("no changes; draft discarded")]);
                    return;
                }
                let diff = diff_lines(&draft.diff());
                self.set_mode(InputMode::ConfirmEdit(draft));
                self.say(diff);
            }
            InputMode::ConfirmEdit(draft) => {
                self.set_mode(InputMode::Command);
                if !matches!(line.trim().to_lowercase().as_str(), "y" | "yes") {
                    self.say(vec![info_line("edit discarded")]);
                    return;
                }
                match self.controller.save_draft(&draft).await {
                    Ok(snap) => {
                        let mut out = vec![ok_line(&format!(
                            "email for {} saved",
                            draft.candidate_name()
                        ))];
                        let lookup = views::email_lookup(&snap.emails);
                        if let Some(email) = lookup.get(draft.resume_id()) {
                            out.extend(email_lines(email));
                        }
                        self.say(out);
                    }
                    Err(e) => self.fail(e),
                }
            }
        }
    }

    async fn run_command(&mut self, cmd: Command) {
        match cmd {
            Command::UploadJd(path) => {
                let result = async {
                    let file =
                        uploads::read_upload(Path::new(&path), uploads::JD_EXTENSIONS).await?;
                    let doc = self.controller.upload_job_description(file).await?;
                    anyhow::Ok(doc)
                }
                .await;
                match result {
                    Ok(doc) => {
                        self.last_seen = None;
                        self.say(vec![
                            ok_line(&format!("job description `{}` uploaded", doc.filename)),
                            info_line("previous run and resumes cleared; add resumes next"),
                        ]);
                    }
                    Err(e) => self.fail(format!("{e:#}")),
                }
            }
            Command::UploadResumes(patterns) => {
                let result = async {
                    let paths: Vec<PathBuf> = uploads::expand_patterns(&patterns)?;
                    let files = uploads::read_uploads(&paths, uploads::RESUME_EXTENSIONS).await?;
                    let docs = self.controller.upload_resumes(files).await?;
                    anyhow::Ok(docs)
                }
                .await;
                match result {
                    Ok(docs) => {
                        let total = self.controller.session().resumes().len();
                        self.say(vec![ok_line(&format!(
                            "{} resume(s) uploaded, {total} in this session",
                            docs.len()
                        ))]);
                    }
                    Err(e) => self.fail(format!("{e:#}")),
                }
            }
            Command::Documents => match self.controller.list_documents().await {
                Ok(docs) => self.say(document_lines(&docs)),
                Err(e) => self.fail(e),
            },
            Command::SetTopN(n) => match self.controller.set_top_n(n) {
                Ok(()) => {
                    let resumes = self.controller.session().resumes().len();
                    let mut msg = format!("shortlist size set to {n}");
                    if resumes > 0 && n > resumes {
                        msg.push_str(&format!(
                            " (only {resumes} resumes; launch will use {resumes})"
                        ));
                    }
                    self.say(vec![ok_line(&msg)]);
                }
                Err(e) => self.fail(e),
            },
            Command::Launch => match self.controller.launch().await {
                Ok(snap) => self.say(vec![ok_line(&format!("run {} started", snap.run_id))]),
                Err(e) => self.fail(e),
            },
            Command::Status => self.show_status(),
            Command::Show(None) => {
                let lines = self.controller.store().with_snapshot(|snap| match snap {
                    Some(snap) => {
                        let mut lines = Vec::new();
                        if let Some(analysis) = &snap.jd_analysis {
                            lines.extend(analysis_lines(analysis));
                        }
                        let selection = self.controller.selection();
                        lines.extend(candidate_list(snap, |id| selection.contains(id)));
                        lines
                    }
                    None => vec![info_line("no run yet")],
                });
                self.say(lines);
            }
            Command::Show(Some(prefix)) => match self.resolve(&prefix) {
                Ok(id) => {
                    let lines = self.controller.store().with_snapshot(|snap| {
                        snap.and_then(|s| s.evaluations.iter().find(|e| e.resume_id == id))
                            .map(candidate_card)
                            .unwrap_or_else(|| vec![info_line("no evaluation for that candidate")])
                    });
                    self.say(lines);
                }
                Err(e) => self.fail(e),
            },
            Command::Select(ids) if ids.is_empty() => {
                let selection = self.controller.selection();
                let msg = if selection.is_empty() {
                    "nothing selected".to_string()
                } else {
                    format!("selected: {}", selection.ids().join(", "))
                };
                self.say(vec![info_line(&msg)]);
            }
            Command::Select(prefixes) => {
                let mut out = Vec::new();
                for prefix in prefixes {
                    match self.resolve(&prefix) {
                        Ok(id) => {
                            let on = self.controller.toggle(&id);
                            let verb = if on { "selected" } else { "unselected" };
                            out.push(ok_line(&format!("{verb} {id}")));
                        }
                        Err(e) => out.push(error_line(&e)),
                    }
                }
                if self.controller.store().status() != Some(PipelineStatus::AwaitingApproval) {
                    out.push(info_line("selection is only used while the run awaits approval"));
                }
                self.say(out);
            }
            Command::ClearSelection => {
                self.controller.clear_selection();
                self.say(vec![info_line("selection cleared")]);
            }
            Command::Approve => {
                let count = self.controller.selection().len();
                match self.controller.approve_selection().await {
                    Ok(_) => self.say(vec![ok_line(&format!(
                        "{count} candidate(s) approved; drafting outreach"
                    ))]),
                    Err(e) => self.fail(e),
                }
            }
            Command::Email(None) => {
                let lines = self.controller.store().with_snapshot(|snap| match snap {
                    Some(snap) => email_list(&snap.emails),
                    None => vec![info_line("no run yet")],
                });
                self.say(lines);
            }
            Command::Email(Some(prefix)) => match self.email_for(&prefix) {
                Ok(draft) => {
                    let lines = self.controller.store().with_snapshot(|snap| {
                        snap.and_then(|s| {
                            views::email_lookup(&s.emails)
                                .get(draft.resume_id())
                                .map(|e| email_lines(e))
                        })
                        .unwrap_or_default()
                    });
                    self.say(lines);
                }
                Err(e) => self.fail(e),
            },
            Command::Edit(prefix) => match self.email_for(&prefix) {
                Ok(draft) => {
                    let mut lines = vec![info_line(&format!(
                        "editing email for {}; press enter to keep the subject",
                        draft.candidate_name()
                    ))];
                    lines.push(info_line(&format!("current subject: {}", draft.subject())));
                    self.set_mode(InputMode::EditSubject(draft));
                    self.say(lines);
                }
                Err(e) => self.fail(e),
            },
            Command::Copy(prefix) => match self.email_for(&prefix) {
                Ok(draft) => match copy_to_clipboard(&draft) {
                    Ok(()) => self.say(vec![ok_line(&format!(
                        "email for {} copied to clipboard",
                        draft.candidate_name()
                    ))]),
                    Err(e) => self.fail(format!("{e:#}")),
                },
                Err(e) => self.fail(e),
            },
            Command::Refresh => match self.controller.refresh().await {
                Ok(snap) => {
                    self.last_seen = Some((snap.run_id.clone(), snap.status));
                    self.say(run_overview(&snap, self.controller.is_polling()));
                }
                Err(e) => self.fail(e),
            },
            Command::Reset => match self.controller.reset_session().await {
                Ok(()) => {
                    self.last_seen = None;
                    self.say(vec![ok_line("session reset; all documents and runs cleared")]);
                }
                Err(e) => self.fail(e),
            },
            Command::Help => self.say(help_lines(commands::help_rows())),
            Command::Quit => self.quit = true,
        }
    }

    fn email_for(&self, prefix: &str) -> Result<EmailDraft, String> {
        let id = self.resolve(prefix)?;
        self.controller
            .open_draft(&id)
            .ok_or_else(|| format!("no email drafted for {id}"))
    }

    fn show_status(&mut self) {
        let session = self.controller.session();
        let jd = session
            .jd()
            .map(|d| d.filename.clone())
            .unwrap_or_else(|| "none".to_string());
        let mut lines = vec![info_line(&format!(
            "job description: {jd} · resumes: {} · shortlist: {}",
            session.resumes().len(),
            session.top_n()
        ))];
        let polling = self.controller.is_polling();
        match self.controller.store().snapshot() {
            Some(snap) => lines.extend(run_overview(&snap, polling)),
            None => lines.push(info_line("no run yet")),
        }
        self.say(lines);
    }
}

fn copy_to_clipboard(draft: &EmailDraft) -> anyhow::Result<()> {
    let text = format!("Subject: {}\n\n{}", draft.subject(), draft.body());
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard.set_text(text).context("failed to copy")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let config = ClientConfig::load()?;
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineClient::from_config(&config)?);
    let controller = RunController::new(api, &config);
    let screen = Screen::new(&config)?;
    let mut app = App::new(controller, screen);

    let run_result = run_loop(&mut app).await;
    app.controller.shutdown();
    run_result
}

async fn run_loop(app: &mut App) -> anyhow::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = app.controller.store().subscribe();

    while !app.quit {
        tokio::select! {
            line = input.next_line() => {
                match line? {
                    Some(line) => app.handle_line(line).await,
                    None => break,
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                app.on_store_change(&state);
            }
        }
    }
    Ok(())
}
