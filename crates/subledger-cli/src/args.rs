use color_eyre::eyre::{Result, bail, eyre};
use std::path::PathBuf;
use std::str::FromStr;

pub const USAGE: &str = "\
Usage: subledger [--mode app|scheduler|setup|test] [--config PATH]

Modes:
  app        interactive register (default)
  scheduler  send expiry reminders every day at the configured time
  setup      configure email, WhatsApp, business details and reminders
  test       show channel status and send today's reminders once

The config path defaults to $SUBLEDGER_CONFIG or the platform config dir.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    App,
    Scheduler,
    Setup,
    Test,
}

impl FromStr for Mode {
    type Err = color_eyre::eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "app" => Ok(Mode::App),
            "scheduler" => Ok(Mode::Scheduler),
            "setup" => Ok(Mode::Setup),
            "test" => Ok(Mode::Test),
            other => Err(eyre!("unknown mode `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub mode: Mode,
    pub config: Option<PathBuf>,
    pub help: bool,
}

impl Args {
    pub fn from_env() -> Result<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    pub fn parse_from<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
                _ => (arg.clone(), None),
            };

            match flag.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--mode" => {
                    let value = inline
                        .or_else(|| args.next())
                        .ok_or_else(|| eyre!("--mode needs a value"))?;
                    parsed.mode = value.parse()?;
                }
                "--config" => {
                    let value = inline
                        .or_else(|| args.next())
                        .ok_or_else(|| eyre!("--config needs a path"))?;
                    parsed.config = Some(PathBuf::from(value));
                }
                other => bail!("unexpected argument `{}`\n\n{}", other, USAGE),
            }
        }

        Ok(parsed)
    }
}
