//! Game identifier parsing (`gid_2017_05_29_anamlb_tormlb_1`)

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use super::ResolveError;

/// Prefix shared by every game directory name.
pub const GAME_ID_PREFIX: &str = "gid_";

/// Sport suffix closing every team token (`tor` + `mlb`).
pub const TEAM_SUFFIX: &str = "mlb";

/// Parsed game identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId {
    date: NaiveDate,
    away: String,
    home: String,
    number: u32,
}

impl GameId {
    /// Parse a `gid_YYYY_MM_DD_<away>_<home>_<n>` token.
    ///
    /// A trailing `/` (as found in directory listings) is ignored.
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let token = input.trim().trim_end_matches('/');
        let invalid = |reason: &str| ResolveError::InvalidGameId(format!("{:?}: {}", token, reason));

        let body = token
            .strip_prefix(GAME_ID_PREFIX)
            .ok_or_else(|| invalid("missing gid_ prefix"))?;

        let parts: Vec<&str> = body.split('_').collect();
        if parts.len() != 6 {
            return Err(invalid("expected year, month, day, away, home and game number"));
        }

        let year = parts[0].parse::<i32>().map_err(|_| invalid("bad year"))?;
        let month = parts[1].parse::<u32>().map_err(|_| invalid("bad month"))?;
        let day = parts[2].parse::<u32>().map_err(|_| invalid("bad day"))?;
        if parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
            return Err(invalid("date fields must be zero padded"));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid("no such date"))?;

        let away = parts[3];
        let home = parts[4];
        if !is_team_token(away) || !is_team_token(home) {
            return Err(invalid("team tokens must be a lowercase code followed by mlb"));
        }

        let number = parts[5].parse::<u32>().map_err(|_| invalid("bad game number"))?;

        Ok(Self {
            date,
            away: away.to_string(),
            home: home.to_string(),
            number,
        })
    }

    /// Calendar date the game was scheduled for
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Away team token including its sport suffix (`anamlb`)
    pub fn away(&self) -> &str {
        &self.away
    }

    /// Home team token including its sport suffix (`tormlb`)
    pub fn home(&self) -> &str {
        &self.home
    }

    /// Game number within the day (2 for the second game of a double header)
    pub fn number(&self) -> u32 {
        self.number
    }
}

fn is_team_token(token: &str) -> bool {
    match token.strip_suffix(TEAM_SUFFIX) {
        Some(code) => !code.is_empty() && code.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
        None => false,
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:04}_{:02}_{:02}_{}_{}_{}",
            GAME_ID_PREFIX,
            self.date.year(),
            self.date.month(),
            self.date.day(),
            self.away,
            self.home,
            self.number
        )
    }
}

impl FromStr for GameId {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
