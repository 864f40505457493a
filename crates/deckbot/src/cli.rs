#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Parses args by hand. Environment variables with the `DECKBOT_` prefix
//! override defaults; explicit flags override both.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
deckbot: drive a robot from a handheld controller

USAGE:
    deckbot [OPTIONS]

OPTIONS:
    --fps=N              Frame rate of the main loop (default: 30)
    --start=SCREEN       First screen: 'menu' (default), 'sample' or 'events'
    --log-file=PATH      Append logs to PATH (logging is off without it)
    --log-json           Write log lines as JSON
    --help, -h           Show this help message
    --version, -V        Show version

CONTROLS:
    Arrow keys          D-pad
    Enter / Space       Button A
    Esc                 Button B
    w a s d             Left stick
    i j k l             Right stick
    Ctrl+C              Quit

ENVIRONMENT VARIABLES:
    DECKBOT_FPS          Override --fps
    DECKBOT_START        Override --start
    DECKBOT_LOG_FILE     Override --log-file
    DECKBOT_LOG_JSON     Set to 1 to enable --log-json
    DECKBOT_LOG          Log filter directives (default: info)";

/// Which screen the host starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartScreen {
    Menu,
    Sample,
    Events,
}

impl StartScreen {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "menu" => Some(Self::Menu),
            "sample" => Some(Self::Sample),
            "events" => Some(Self::Events),
            _ => None,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Ticks per second.
    pub fps: u32,
    pub start: StartScreen,
    pub log_file: Option<PathBuf>,
    pub log_json: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            fps: 30,
            start: StartScreen::Menu,
            log_file: None,
            log_json: false,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

fn parse_fps(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(n) if (1..=240).contains(&n) => Ok(n),
        _ => Err(format!("Invalid --fps value: {value} (expected 1-240)")),
    }
}

fn parse_start(value: &str) -> Result<StartScreen, String> {
    StartScreen::parse(value).ok_or_else(|| format!("Invalid --start value: {value}"))
}

impl Opts {
    /// Parse the process arguments and environment, exiting on `--help`,
    /// `--version` or bad input.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("deckbot {VERSION}");
                process::exit(0);
            }
            Err(message) => {
                eprintln!("{message}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with `var` as the environment.
    pub fn parse_from<I, V>(args: I, var: V) -> Result<Command, String>
    where
        I: IntoIterator<Item = String>,
        V: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        if let Some(val) = var("DECKBOT_FPS") {
            opts.fps = parse_fps(&val)?;
        }
        if let Some(val) = var("DECKBOT_START") {
            opts.start = parse_start(&val)?;
        }
        if let Some(val) = var("DECKBOT_LOG_FILE")
            && !val.is_empty()
        {
            opts.log_file = Some(PathBuf::from(val));
        }
        if let Some(val) = var("DECKBOT_LOG_JSON") {
            opts.log_json = matches!(val.as_str(), "1" | "true" | "yes");
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                "--log-json" => opts.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--fps=") {
                        opts.fps = parse_fps(val)?;
                    } else if let Some(val) = other.strip_prefix("--start=") {
                        opts.start = parse_start(val)?;
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = Some(PathBuf::from(val));
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        Ok(Command::Run(opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> Result<Command, String> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Opts::parse_from(args.iter().map(|s| s.to_string()), |k| env.get(k).cloned())
    }

    fn run(args: &[&str], env: &[(&str, &str)]) -> Opts {
        match parse(args, env) {
            Ok(Command::Run(opts)) => opts,
            other => panic!("expected options, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let opts = run(&[], &[]);
        assert_eq!(opts, Opts::default());
        assert_eq!(opts.fps, 30);
        assert_eq!(opts.start, StartScreen::Menu);
        assert!(opts.log_file.is_none());
    }

    #[test]
    fn flags() {
        let opts = run(&["--fps=60", "--start=events", "--log-file=/tmp/d.log", "--log-json"], &[]);
        assert_eq!(opts.fps, 60);
        assert_eq!(opts.start, StartScreen::Events);
        assert_eq!(opts.log_file, Some(PathBuf::from("/tmp/d.log")));
        assert!(opts.log_json);
    }

    #[test]
    fn env_overrides_defaults_and_flags_override_env() {
        let env = [("DECKBOT_FPS", "15"), ("DECKBOT_START", "sample")];
        let opts = run(&[], &env);
        assert_eq!((opts.fps, opts.start), (15, StartScreen::Sample));

        let opts = run(&["--fps=50"], &env);
        assert_eq!((opts.fps, opts.start), (50, StartScreen::Sample));
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse(&["--fps=60", "-h"], &[]), Ok(Command::Help));
        assert_eq!(parse(&["--version"], &[]), Ok(Command::Version));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["--fps=0"], &[]).is_err());
        assert!(parse(&["--fps=fast"], &[]).is_err());
        assert!(parse(&["--start=nowhere"], &[]).is_err());
        assert!(parse(&["--bogus"], &[]).unwrap_err().contains("--bogus"));
        assert!(parse(&[], &[("DECKBOT_FPS", "999")]).is_err());
    }

    #[test]
    fn help_text_lists_options() {
        for flag in ["--fps", "--start", "--log-file", "--log-json", "DECKBOT_LOG"] {
            assert!(HELP_TEXT.contains(flag), "{flag} missing from help");
        }
        assert!(!VERSION.is_empty());
    }
}
