use crate::domain::DEFAULT_WINDOW_HOURS;
use std::str::FromStr;
use thiserror::Error;

pub const COMMAND_PREFIX: char = '!';

pub const DEFAULT_ROLLING_WINDOW: usize = 5;
pub const DEFAULT_SAVGOL_WINDOW: usize = 7;
pub const DEFAULT_SAVGOL_POLY_ORDER: usize = 3;

/// A parsed chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitatCommand {
    Temp,
    Plot { hours: i64 },
    PlotRolling { hours: i64, window: usize },
    PlotSavgol { hours: i64, window: usize, poly_order: usize },
    Stats { hours: i64 },
    SulcataStatus,
    SetAlerts,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("not a command")]
    NotACommand,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("invalid argument '{argument}' for {command}, usage: {usage}")]
    BadArgument {
        command: &'static str,
        argument: String,
        usage: &'static str,
    },

    #[error("too many arguments for {command}, usage: {usage}")]
    TooManyArguments {
        command: &'static str,
        usage: &'static str,
    },
}

struct Args<'a> {
    command: &'static str,
    usage: &'static str,
    rest: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn next<T: FromStr>(&mut self, default: T) -> Result<T, CommandParseError> {
        match self.rest.next() {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| CommandParseError::BadArgument {
                command: self.command,
                argument: raw.to_string(),
                usage: self.usage,
            }),
        }
    }

    fn finish(mut self) -> Result<(), CommandParseError> {
        match self.rest.next() {
            None => Ok(()),
            Some(_) => Err(CommandParseError::TooManyArguments {
                command: self.command,
                usage: self.usage,
            }),
        }
    }
}

impl FromStr for HabitatCommand {
    type Err = CommandParseError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let body = content
            .trim()
            .strip_prefix(COMMAND_PREFIX)
            .ok_or(CommandParseError::NotACommand)?;
        let mut words = body.split_whitespace();
        let name = words.next().ok_or(CommandParseError::NotACommand)?;

        let (command, usage) = match name {
            "temp" => ("!temp", "!temp"),
            "plot" => ("!plot", "!plot [hours]"),
            "plot_rolling" => ("!plot_rolling", "!plot_rolling [hours] [window]"),
            "plot_savgol" => ("!plot_savgol", "!plot_savgol [hours] [window] [poly]"),
            "stats" => ("!stats", "!stats [hours]"),
            "sulcata_status" => ("!sulcata_status", "!sulcata_status"),
            "set_alerts" => ("!set_alerts", "!set_alerts"),
            "help_weather" => ("!help_weather", "!help_weather"),
            other => return Err(CommandParseError::Unknown(other.to_string())),
        };
        let mut args = Args {
            command,
            usage,
            rest: words,
        };

        let parsed = match name {
            "temp" => HabitatCommand::Temp,
            "plot" => HabitatCommand::Plot {
                hours: args.next(DEFAULT_WINDOW_HOURS)?,
            },
            "plot_rolling" => HabitatCommand::PlotRolling {
                hours: args.next(DEFAULT_WINDOW_HOURS)?,
                window: args.next(DEFAULT_ROLLING_WINDOW)?,
            },
            "plot_savgol" => HabitatCommand::PlotSavgol {
                hours: args.next(DEFAULT_WINDOW_HOURS)?,
                window: args.next(DEFAULT_SAVGOL_WINDOW)?,
                poly_order: args.next(DEFAULT_SAVGOL_POLY_ORDER)?,
            },
            "stats" => HabitatCommand::Stats {
                hours: args.next(DEFAULT_WINDOW_HOURS)?,
            },
            "sulcata_status" => HabitatCommand::SulcataStatus,
            "set_alerts" => HabitatCommand::SetAlerts,
            _ => HabitatCommand::Help,
        };
        args.finish()?;
        Ok(parsed)
    }
}
