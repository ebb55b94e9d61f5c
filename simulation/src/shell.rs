//! Player shell
//!
//! Maps one line of player input to an engine operation and renders the
//! result the way a terminal client shows it.

use std::io::{self, BufRead, Write};

use infiltr8_core::{
    Command, Engine, EngineResult, NodeStore, SessionStore, UserId, available_commands,
};
use infiltr8_logging::PlayerContextGuard;
use tracing::debug;

/// A player's view of an engine
pub struct Shell<'a, N: NodeStore, S: SessionStore> {
    engine: &'a Engine<N, S>,
    user: UserId,
}

impl<'a, N: NodeStore, S: SessionStore> Shell<'a, N, S> {
    pub fn new(engine: &'a Engine<N, S>, user: UserId) -> Self {
        Self { engine, user }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Parse and run one input line, returning what the player sees
    ///
    /// The player's session is created by the first command that parses.
    pub fn execute(&self, line: &str) -> String {
        let _guard = PlayerContextGuard::new(&self.user);
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => return e.to_string(),
        };
        let result = self
            .engine
            .create_or_get_session(&self.user)
            .and_then(|_| dispatch(self.engine, &self.user, command));
        match result {
            Ok(output) => output,
            Err(e) => {
                debug!(user = %self.user, code = e.code(), "Command failed");
                format!("Error: {}", e)
            }
        }
    }

    /// Read commands until `quit`, `exit` or end of input
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        writeln!(output, "Connected as {}. Type 'help' for commands.", self.user)?;
        write!(output, "> ")?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            match line {
                "" => {}
                "quit" | "exit" => break,
                _ => writeln!(output, "{}", self.execute(line))?,
            }
            write!(output, "> ")?;
            output.flush()?;
        }
        writeln!(output)?;
        Ok(())
    }
}

/// Run a parsed command on behalf of `user`
pub fn dispatch<N: NodeStore, S: SessionStore>(
    engine: &Engine<N, S>,
    user: &UserId,
    command: Command,
) -> EngineResult<String> {
    let output = match command {
        Command::Help => help_text(),
        Command::Scan => {
            let visible = engine.scan(user)?;
            if visible.is_empty() {
                "No nodes visible.".to_string()
            } else {
                visible
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Connect(target) => engine.connect(user, &target)?.to_string(),
        Command::Ls => {
            let files = engine.list_files(user)?;
            if files.is_empty() {
                "No files.".to_string()
            } else {
                files.join("\n")
            }
        }
        Command::Download(filename) => engine.download(user, &filename)?.to_string(),
        Command::Cat(filename) => engine.read_file(user, &filename)?.to_string(),
        Command::Status => engine.status_of(user)?.to_string(),
        Command::Whoami => engine.whoami_of(user)?.to_string(),
        Command::Pivot(target) => engine.pivot(user, &target)?.to_string(),
        Command::Whois(target) => engine.whois_of(&target)?.to_string(),
        Command::Cloak => engine.cloak(user)?.to_string(),
        Command::Uncloak => engine.uncloak(user)?.to_string(),
        Command::Spoof(target) => engine.spoof(user, &target)?.to_string(),
        Command::Unspoof => engine.unspoof(user)?.to_string(),
    };
    Ok(output)
}

fn help_text() -> String {
    let mut text = String::from("Available commands:");
    for command in available_commands() {
        text.push_str(&format!("\n  {:<22} {}", command.usage, command.description));
    }
    text
}
