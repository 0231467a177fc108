use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "objtree", version, about = "List the NT object manager namespace as a tree")]
pub struct Args {
    /// Object directory to list (default: the namespace root)
    #[arg(default_value = "\\")]
    pub path: String,

    /// Recurse into sub-directories
    #[arg(short = 'R', long = "recurse")]
    pub recurse: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Enforce invariants after parsing.
    pub fn validated(mut self) -> Self {
        // An empty path means the namespace root; a trailing separator on
        // anything else would make the kernel reject the open.
        if self.path.is_empty() {
            self.path = "\\".to_string();
        } else if self.path.len() > 1 && self.path.ends_with('\\') {
            self.path.pop();
        }
        // Respect NO_COLOR env var
        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
        self
    }
}
