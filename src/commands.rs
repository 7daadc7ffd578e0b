use thiserror::Error;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Jd,
    Resumes,
    Docs,
    Top,
    Launch,
    Status,
    Show,
    Select,
    Approve,
    Email,
    Edit,
    Copy,
    Refresh,
    Reset,
    Help,
    Quit,
}

/// A fully parsed line from the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    UploadJd(String),
    UploadResumes(Vec<String>),
    Documents,
    SetTopN(usize),
    Launch,
    Status,
    Show(Option<String>),
    /// Toggles each id; with no ids it lists the current selection.
    Select(Vec<String>),
    ClearSelection,
    Approve,
    Email(Option<String>),
    Edit(String),
    Copy(String),
    Refresh,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}`; type `help` for the list")]
    Unknown(String),
    #[error("`{0}` matches several commands: {}", .1.join(", "))]
    Ambiguous(String, Vec<&'static str>),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("`{0}` is not a whole number")]
    NotANumber(String),
}

// ── Built-in command table (single source) ────────────────────────────────────

/// (variant, name, usage, description)
const BUILTIN_COMMANDS: &[(CommandKind, &str, &str, &str)] = &[
    (CommandKind::Jd, "jd", "jd <file>", "upload a job description (starts a new session)"),
    (
        CommandKind::Resumes,
        "resumes",
        "resumes <file|glob>...",
        "upload one or more resumes",
    ),
    (CommandKind::Docs, "docs", "docs", "list documents known to the backend"),
    (CommandKind::Top, "top", "top <n>", "set how many candidates to shortlist"),
    (CommandKind::Launch, "launch", "launch", "start the pipeline for the uploaded documents"),
    (CommandKind::Status, "status", "status", "show the current run summary"),
    (
        CommandKind::Show,
        "show",
        "show [id]",
        "show candidate cards, or one candidate in full",
    ),
    (
        CommandKind::Select,
        "select",
        "select [id...|clear]",
        "toggle candidates for approval",
    ),
    (CommandKind::Approve, "approve", "approve", "approve the selected candidates"),
    (CommandKind::Email, "email", "email [id]", "list drafted emails, or show one"),
    (CommandKind::Edit, "edit", "edit <id>", "edit a drafted email"),
    (CommandKind::Copy, "copy", "copy <id>", "copy a drafted email to the clipboard"),
    (CommandKind::Refresh, "refresh", "refresh", "fetch the run now and resume polling"),
    (CommandKind::Reset, "reset", "reset", "clear all documents and runs on the backend"),
    (CommandKind::Help, "help", "help", "show this list"),
    (CommandKind::Quit, "quit", "quit", "leave recruitdeck"),
];

/// (usage, description) rows for the help screen.
pub fn help_rows() -> impl Iterator<Item = (&'static str, &'static str)> {
    BUILTIN_COMMANDS.iter().map(|&(_, _, usage, desc)| (usage, desc))
}

fn usage_of(kind: CommandKind) -> &'static str {
    BUILTIN_COMMANDS
        .iter()
        .find(|(k, ..)| *k == kind)
        .map(|&(_, _, usage, _)| usage)
        .unwrap_or("help")
}

/// Exact names win; otherwise a unique prefix selects the command.
fn lookup(word: &str) -> Result<CommandKind, ParseError> {
    let word = word.to_lowercase();
    if let Some(&(kind, ..)) = BUILTIN_COMMANDS.iter().find(|(_, name, ..)| *name == word) {
        return Ok(kind);
    }
    if word == "exit" || word == "q" {
        return Ok(CommandKind::Quit);
    }
    let hits: Vec<_> = BUILTIN_COMMANDS
        .iter()
        .filter(|(_, name, ..)| name.starts_with(&word))
        .collect();
    match hits.as_slice() {
        [] => Err(ParseError::Unknown(word)),
        [(kind, ..)] => Ok(*kind),
        many => Err(ParseError::Ambiguous(
            word,
            many.iter().map(|&&(_, name, ..)| name).collect(),
        )),
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// `Ok(None)` for a blank line. A leading `/` is accepted and ignored.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let kind = lookup(head)?;
    let args: Vec<String> = words.map(str::to_string).collect();

    let single = |args: &[String]| match args {
        [one] => Ok(one.clone()),
        _ => Err(ParseError::Usage(usage_of(kind))),
    };
    let none = |args: &[String]| {
        if args.is_empty() {
            Ok(())
        } else {
            Err(ParseError::Usage(usage_of(kind)))
        }
    };
    let optional = |args: &[String]| match args {
        [] => Ok(None),
        [one] => Ok(Some(one.clone())),
        _ => Err(ParseError::Usage(usage_of(kind))),
    };

    let command = match kind {
        CommandKind::Jd => {
            // File names may contain spaces.
            let path = line[head.len()..].trim();
            if path.is_empty() {
                return Err(ParseError::Usage(usage_of(kind)));
            }
            Command::UploadJd(path.to_string())
        }
        CommandKind::Resumes => {
            if args.is_empty() {
                return Err(ParseError::Usage(usage_of(kind)));
            }
            Command::UploadResumes(args)
        }
        CommandKind::Docs => none(&args).map(|_| Command::Documents)?,
        CommandKind::Top => {
            let raw = single(&args)?;
            let n = raw.parse::<usize>().map_err(|_| ParseError::NotANumber(raw))?;
            Command::SetTopN(n)
        }
        CommandKind::Launch => none(&args).map(|_| Command::Launch)?,
        CommandKind::Status => none(&args).map(|_| Command::Status)?,
        CommandKind::Show => Command::Show(optional(&args)?),
        CommandKind::Select => match args.as_slice() {
            [only] if only == "clear" || only == "none" => Command::ClearSelection,
            _ => Command::Select(args),
        },
        CommandKind::Approve => none(&args).map(|_| Command::Approve)?,
        CommandKind::Email => Command::Email(optional(&args)?),
        CommandKind::Edit => Command::Edit(single(&args)?),
        CommandKind::Copy => Command::Copy(single(&args)?),
        CommandKind::Refresh => none(&args).map(|_| Command::Refresh)?,
        CommandKind::Reset => none(&args).map(|_| Command::Reset)?,
        CommandKind::Help => Command::Help,
        CommandKind::Quit => Command::Quit,
    };
    Ok(Some(command))
}
