pub(crate) struct Symbols {
    pub prompt: &'static str,
    pub selected: &'static str,
    pub unselected: &'static str,
    pub star: &'static str,
    pub arrow_right: &'static str,
    pub ellipsis: &'static str,
    pub dot: &'static str,
    pub record: &'static str,
    pub corner: &'static str,
    pub bullet: &'static str,
    pub warning: &'static str,
    pub bar_full: &'static str,
    pub bar_empty: &'static str,
}

impl Symbols {
    pub fn current() -> &'static Self {
        #[cfg(windows)]
        {
            let is_modern = std::env::var("WT_SESSION").is_ok()
                || std::env::var("TERM_PROGRAM").is_ok()
                || std::env::var("ALACRITTY_WINDOW_ID").is_ok();
            if !is_modern {
                return &ASCII_SYMBOLS;
            }
        }
        &UNICODE_SYMBOLS
    }
}

const UNICODE_SYMBOLS: Symbols = Symbols {
    prompt: "❯",
    selected: "☑",
    unselected: "☐",
    star: "★",
    arrow_right: "⏵",
    ellipsis: "…",
    dot: "·",
    record: "⏺",
    corner: "⎿",
    bullet: "•",
    warning: "⚠",
    bar_full: "█",
    bar_empty: "░",
};

#[cfg_attr(not(windows), allow(dead_code))]
const ASCII_SYMBOLS: Symbols = Symbols {
    prompt: ">",
    selected: "[x]",
    unselected: "[ ]",
    star: "*",
    arrow_right: ">",
    ellipsis: "...",
    dot: "-",
    record: "*",
    corner: "\\",
    bullet: "*",
    warning: "!",
    bar_full: "#",
    bar_empty: ".",
};
