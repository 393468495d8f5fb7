use syntagma::{SearchReport, Token};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(input: &str, tokens: &[Token], report: &SearchReport, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Searching: \"{}\"", input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Tokens ━━━", ansi::GRAY));
    print_tokens(tokens, &palette);

    println!("\n{}", palette.paint("━━━ Matches ━━━", ansi::GRAY));
    if report.matches.is_empty() {
        println!("{}", palette.dim("  No matches"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • Words have no readings for the grammar's terminals");
        println!("  • Agreement constraints pruned every fork");
        println!("\n{}", palette.dim("  Tip: Set SYNTAGMA_DEBUG=1 to see shift/reduce decisions"));
    } else {
        print_matches(report, &palette);
    }

    if !report.incomplete.is_empty() {
        println!("\n{}", palette.paint("━━━ Incomplete ━━━", ansi::GRAY));
        for inc in &report.incomplete {
            println!(
                "  {}",
                palette.paint(format!("offset {} aborted after {} steps", inc.start, inc.steps), ansi::YELLOW),
            );
        }
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    let steps: usize = report.metrics.offsets.iter().map(|o| o.steps).sum();
    println!(
        "  Total: {}  │  Offsets: {}  │  Steps: {}  │  Deduped: {}",
        palette.paint(format!("{:?}", report.metrics.total), ansi::GREEN),
        palette.paint(report.metrics.offsets.len().to_string(), ansi::CYAN),
        palette.paint(steps.to_string(), ansi::CYAN),
        palette.dim(report.metrics.deduped.to_string()),
    );
    println!();
}

fn print_tokens(tokens: &[Token], palette: &ansi::Palette) {
    for (idx, token) in tokens.iter().enumerate() {
        let readings = if token.readings.is_empty() {
            palette.dim("(no readings)")
        } else {
            token
                .readings
                .iter()
                .map(|r| palette.paint(format!("{}({})", r.symbol, r.features), ansi::BLUE))
                .collect::<Vec<_>>()
                .join(" ")
        };
        println!("  {} {} {}", palette.paint(format!("[{idx}]"), ansi::GRAY), palette.bold(&token.surface), readings);
    }
}

fn print_matches(report: &SearchReport, palette: &ansi::Palette) {
    for (idx, m) in report.matches.iter().enumerate() {
        let surface = m.words.iter().map(|w| w.surface.as_str()).collect::<Vec<_>>().join(" ");
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{idx}]"), ansi::GRAY),
            palette.bold(palette.paint(surface, ansi::GREEN)),
            palette.dim("│"),
            palette.paint(format!("tokens {}..{}", m.start, m.end), ansi::YELLOW),
        );
        for word in &m.words {
            println!(
                "      {} {}  {} {}  {} {}",
                palette.dim("as:"),
                palette.paint(&word.symbol, ansi::BLUE),
                palette.dim("│ lemma:"),
                palette.paint(&word.lemma, ansi::CYAN),
                palette.dim("│ features:"),
                palette.paint(word.features.to_string(), ansi::CYAN),
            );
        }
    }
}
