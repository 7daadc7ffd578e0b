use std::io::{self, Write};

use crossterm::{
    cursor, execute,
    style::{Color, Print, Stylize},
    terminal::{Clear, ClearType},
};
use unicode_width::UnicodeWidthChar;

use crate::config::ClientConfig;
use crate::ui::symbols::Symbols;

pub(crate) const TITLE_BANNER: [&str; 5] = [
    "                       _ _      _           _    ",
    "  _ __ ___  ___ _ __ _(_) |_ __| | ___  ___| | __",
    " | '__/ _ \\/ __| '__| | | __/ _` |/ _ \\/ __| |/ /",
    " | | |  __/ (__| |  | | | || (_| |  __/ (__|   < ",
    " |_|  \\___|\\___|_|  |_|_|\\__\\__,_|\\___|\\___|_|\\_\\",
];

/// Line-oriented output. Everything printed goes above the prompt, which is
/// redrawn afterwards so asynchronous updates never land mid-prompt.
pub(crate) struct Screen {
    stdout: io::Stdout,
    prompt_label: Option<String>,
}

impl Screen {
    pub(crate) fn new(config: &ClientConfig) -> io::Result<Self> {
        let mut s = Self {
            stdout: io::stdout(),
            prompt_label: None,
        };
        execute!(s.stdout, cursor::MoveToColumn(0), Print("\n"))?;
        for line in TITLE_BANNER {
            execute!(
                s.stdout,
                Print(format!(
                    "{}\n",
                    line.with(Color::Rgb {
                        r: 95,
                        g: 175,
                        b: 255
                    })
                    .bold()
                ))
            )?;
        }

        let cols = crossterm::terminal::size()
            .map(|(c, _)| c.max(1) as usize)
            .unwrap_or(80);
        let subtitle_budget = cols.saturating_sub(rendered_text_width("  "));
        for (i, line) in startup_subtitle_lines(config).iter().enumerate() {
            let line = fit_single_line_tail(line, subtitle_budget);
            let styled = match i {
                0 => line.bold().to_string(),
                _ => line.grey().to_string(),
            };
            execute!(s.stdout, Print(format!("  {styled}\n")))?;
        }
        execute!(
            s.stdout,
            Print(format!(
                "  {}\n",
                "type `help` for commands".dark_grey()
            ))
        )?;
        s.prompt()?;
        Ok(s)
    }

    /// Switches the prompt to a sub-mode label (e.g. while editing an email).
    pub(crate) fn set_prompt_label(&mut self, label: Option<&str>) {
        self.prompt_label = label.map(str::to_string);
    }

    pub(crate) fn prompt(&mut self) -> io::Result<()> {
        let sym = Symbols::current();
        let text = match &self.prompt_label {
            Some(label) => format!("{} {} ", label.as_str().dark_yellow(), sym.prompt.cyan()),
            None => format!("{} ", sym.prompt.cyan().bold()),
        };
        execute!(self.stdout, Print(text))?;
        self.stdout.flush()
    }

    /// Prints `lines` on fresh rows, then redraws the prompt.
    pub(crate) fn emit(&mut self, lines: &[String]) {
        let _ = execute!(
            self.stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        );
        for line in lines {
            let _ = execute!(self.stdout, Print(format!("{line}\n")));
        }
        let _ = self.prompt();
    }
}

fn startup_subtitle_lines(config: &ClientConfig) -> Vec<String> {
    let version = env!("CARGO_PKG_VERSION");
    let host = extract_host_from_url(&config.base_url).unwrap_or_else(|| config.base_url.clone());
    let dot = Symbols::current().dot;
    let mut lines = vec![
        format!("recruitdeck v{version}"),
        format!(
            "{host} {dot} polling every {:.1}s {dot} shortlist {}",
            config.poll_interval.as_secs_f64(),
            config.default_top_n
        ),
    ];
    if let Some(path) = &config.journal_path {
        lines.push(format!("journal {}", path.display()));
    }
    lines
}

fn extract_host_from_url(url: &str) -> Option<String> {
    let no_scheme = url.split("://").nth(1).unwrap_or(url);
    let host = no_scheme.split('/').next().unwrap_or(no_scheme).trim();
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

pub(crate) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' && matches!(chars.peek(), Some('[')) {
            let _ = chars.next();
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
            continue;
        }
        out.push(ch);
    }
    out
}

pub(crate) fn rendered_text_width(s: &str) -> usize {
    const TAB_STOP: usize = 8;
    let mut col = 0usize;
    for ch in s.chars() {
        match ch {
            '\t' => col += TAB_STOP - (col % TAB_STOP),
            '\r' | '\n' => {}
            c if c.is_control() => {}
            c => col += UnicodeWidthChar::width(c).unwrap_or(0),
        }
    }
    col
}

/// Keeps the tail of `s` (paths are most telling at the end) within `max_width` columns.
pub(crate) fn fit_single_line_tail(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let plain = strip_ansi(s).replace('\t', " ");
    if rendered_text_width(plain.as_str()) <= max_width {
        return plain;
    }

    let ellipsis = Symbols::current().ellipsis;
    let ellipsis_width = rendered_text_width(ellipsis);
    if max_width <= ellipsis_width {
        return ellipsis.to_string();
    }
    let budget = max_width - ellipsis_width;

    let mut kept_rev: Vec<char> = Vec::new();
    let mut used = 0usize;
    for ch in plain.chars().rev() {
        if ch.is_control() {
            continue;
        }
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if w == 0 {
            continue;
        }
        if used + w > budget {
            break;
        }
        kept_rev.push(ch);
        used += w;
    }

    kept_rev.reverse();
    let mut out = String::new();
    out.push_str(ellipsis);
    out.extend(kept_rev);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_ansi_removes_styles() {
        let styled = format!("{} done", "ok".green().bold());
        assert_eq!(strip_ansi(&styled), "ok done");
    }

    #[test]
    fn host_is_taken_from_base_url() {
        assert_eq!(
            extract_host_from_url("http://localhost:8000/api").as_deref(),
            Some("localhost:8000")
        );
        assert_eq!(extract_host_from_url("").as_deref(), None);
    }

    #[test]
    fn wide_chars_count_double() {
        assert_eq!(rendered_text_width("ab"), 2);
        assert_eq!(rendered_text_width("简历"), 4);
        assert_eq!(rendered_text_width("\tx"), 9);
    }

    #[test]
    fn long_lines_keep_their_tail() {
        let out = fit_single_line_tail("journal /var/log/recruitdeck/runs.jsonl", 12);
        assert!(out.ends_with("runs.jsonl"));
        assert_eq!(rendered_text_width(&out), 12);
        assert_eq!(fit_single_line_tail("short", 12), "short");
    }

    #[test]
    fn subtitle_mentions_host_and_interval() {
        let lines = startup_subtitle_lines(&ClientConfig::default());
        assert!(lines[1].contains("localhost:8000"));
        assert!(lines[1].contains("3.0s"));
        assert_eq!(lines.len(), 2);
    }
}
