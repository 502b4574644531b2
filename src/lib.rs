//! # Gameday Ingest Library
//!
//! Mirrors and ingests baseball "gameday" data published as nested HTML/XML
//! directory trees, turning it into typed records and persisting them with an
//! effective-date reconciliation rule that tolerates out-of-order and duplicate
//! delivery.
//!
//! ## Features
//!
//! - **Date Ranges**: keyword (`yesterday`, `thisweek`, ...) and explicit `YYYYMMDD` ranges
//! - **Resource Resolution**: pure mapping from dates and game ids to remote and local locations
//! - **Polite Mirroring**: a bounded, rate-limited transfer queue for raw file downloads
//! - **Stage Pipeline**: typed channel stages with graceful stop and hard abort
//! - **Streaming Extraction**: records are emitted as each XML element closes
//! - **Reconciliation**: per-kind earliest-wins or latest-wins merge into a store
//!
//! ## Quick Start
//!
//! ```no_run
//! use gameday_ingest::daterange::DateRange;
//! use gameday_ingest::resolver::ResourceResolver;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = ResourceResolver::new("http://gd2.mlb.com/components/game/mlb", "./mirror")?;
//! for date in DateRange::parse("20170529", Some("20170601"))?.iter() {
//!     let day = resolver.locate_date(*date)?;
//!     println!("{} -> {}", day.remote, day.local.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`daterange`] - Date range parsing
//! - [`resolver`] - Remote/local location mapping and game identifiers
//! - [`transfer`] - HTTP helpers and the rate-limited transfer queue
//! - [`extract`] - Streaming listing, scoreboard and game document extractors
//! - [`pipeline`] - Stage lifecycle framework and pipeline drivers
//! - [`stages`] - Concrete pipeline stages
//! - [`output`] - Flat-file record writers
//! - [`store`] - Reconciling record stores (in-memory and Postgres)
//!
//! ## Record Kinds
//!
//! Reference kinds ([`RecordKind::Venue`], [`RecordKind::League`],
//! [`RecordKind::Division`], [`RecordKind::Team`]) keep the earliest effective
//! date ever seen for a key. Fact kinds ([`RecordKind::Standing`],
//! [`RecordKind::Game`], [`RecordKind::GameStatus`], [`RecordKind::InningScore`])
//! keep the latest.

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Configuration constants and run configuration
pub mod config;

/// Date range parsing
pub mod daterange;

/// Streaming extractors
pub mod extract;

/// Flat-file record output
pub mod output;

/// Stage framework and pipeline drivers
pub mod pipeline;

/// Remote/local resource resolution
pub mod resolver;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Concrete pipeline stages
pub mod stages;

/// Reconciling record stores
pub mod store;

/// HTTP transfer helpers and the transfer queue
pub mod transfer;

/// Discriminator for every record variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    /// Ballpark
    Venue,
    /// American or National League
    League,
    /// East, Central or West
    Division,
    /// Club identity
    Team,
    /// Win/loss standing of a team on a day
    Standing,
    /// Scheduled game
    Game,
    /// Live or final status of a game
    GameStatus,
    /// Runs scored in one inning
    InningScore,
}

impl RecordKind {
    /// Every kind, in the order records of one game are emitted.
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Venue,
        RecordKind::League,
        RecordKind::Division,
        RecordKind::Team,
        RecordKind::Standing,
        RecordKind::Game,
        RecordKind::GameStatus,
        RecordKind::InningScore,
    ];

    /// Canonical name used in file names and the JSON `kind` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Venue => "Venue",
            RecordKind::League => "League",
            RecordKind::Division => "Division",
            RecordKind::Team => "Team",
            RecordKind::Standing => "Standing",
            RecordKind::Game => "Game",
            RecordKind::GameStatus => "GameStatus",
            RecordKind::InningScore => "InningScore",
        }
    }

    /// Merge direction applied when a key is written twice.
    pub fn policy(&self) -> ReconcilePolicy {
        match self {
            RecordKind::Venue | RecordKind::League | RecordKind::Division | RecordKind::Team => {
                ReconcilePolicy::KeepEarliest
            }
            RecordKind::Standing
            | RecordKind::Game
            | RecordKind::GameStatus
            | RecordKind::InningScore => ReconcilePolicy::KeepLatest,
        }
    }

    /// Flat-file name for this kind (`<Kind>.dat`).
    pub fn file_name(&self) -> String {
        format!("{}.dat", self.as_str())
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid record kind: {}", s))
    }
}

/// Which effective date survives a key conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Slowly-changing reference data: the first-seen date is authoritative.
    KeepEarliest,
    /// Time-varying facts: the most recent snapshot wins.
    KeepLatest,
}

impl ReconcilePolicy {
    /// Whether `incoming` should replace `stored`. Ties keep the stored row.
    pub fn should_replace(&self, stored: DateTime<Utc>, incoming: DateTime<Utc>) -> bool {
        match self {
            ReconcilePolicy::KeepEarliest => incoming < stored,
            ReconcilePolicy::KeepLatest => incoming > stored,
        }
    }
}

/// Natural key of a persisted record, unique within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NaturalKey {
    /// Numeric id (venue, league, team, game)
    Id(i64),
    /// Division code
    Code(String),
    /// Team standing on one (Eastern) calendar day
    TeamDay(i64, NaiveDate),
    /// One inning of one game
    GameInning(i64, u32),
}

/// A single column value, shared by the flat-file and SQL sinks.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Integer column
    Int(i64),
    /// Text column
    Text(String),
    /// Boolean column
    Bool(bool),
    /// Calendar date column
    Date(NaiveDate),
    /// Timestamp column
    Time(DateTime<Utc>),
}

/// `date(1)`-style layout used at the head of every flat-file line.
pub const UNIX_DATE_FORMAT: &str = "%a %b %e %H:%M:%S UTC %Y";

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            FieldValue::Time(v) => write!(f, "{}", v.format(UNIX_DATE_FORMAT)),
        }
    }
}

/// Ballpark identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VenueRecord {
    /// Instant the source asserted this record
    pub effective_date: DateTime<Utc>,
    /// Venue id
    pub id: i64,
    /// Venue name
    pub name: String,
    /// City and state
    pub location: String,
    /// Broadcast channel location code
    pub channel: String,
}

/// League identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeagueRecord {
    /// Instant the source asserted this record
    pub effective_date: DateTime<Utc>,
    /// League id (103 American, 104 National)
    pub id: i64,
    /// League name
    pub name: String,
    /// Sport code, e.g. `mlb`
    pub sport_code: String,
}

/// Division identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DivisionRecord {
    /// Instant the source asserted this record
    pub effective_date: DateTime<Utc>,
    /// Division name (East, Central, West)
    pub name: String,
    /// Division code (E, C, W)
    pub code: String,
}

/// Club identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamRecord {
    /// Instant the source asserted this record
    pub effective_date: DateTime<Utc>,
    /// Team id
    pub id: i64,
    /// Team name
    pub name: String,
    /// Short team code
    pub code: String,
    /// Home city
    pub city: String,
    /// League id
    pub league_id: i64,
    /// Division code
    pub division: String,
}

/// Standing of one team as of a game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandingRecord {
    /// Instant the source asserted this record
    pub effective_date: DateTime<Utc>,
    /// Team id
    pub team_id: i64,
    /// Wins
    pub wins: u32,
    /// Losses
    pub losses: u32,
    /// Games behind the division leader
    pub games_back: String,
    /// Games behind the wildcard
    pub wildcard_games_back: String,
}

impl StandingRecord {
    /// Calendar day (US Eastern) this standing applies to.
    pub fn standing_date(&self) -> NaiveDate {
        self.effective_date.with_timezone(&New_York).date_naive()
    }

    /// Games played so far
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Scheduled game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRecord {
    /// Instant the source asserted this record
    pub effective_date: DateTime<Utc>,
    /// Game primary key
    pub id: i64,
    /// Resume date for suspended games
    pub resume_date: String,
    /// Original date for rescheduled games
    pub original_date: String,
    /// Game type code (R regular, S spring, ...)
    pub game_type: String,
    /// Tiebreaker switch
    pub tiebreaker: String,
    /// Gameday coverage switch
    pub gameday: String,
    /// Double header switch
    pub double_header: String,
    /// Game number within a double header
    pub game_number: u32,
    /// Time-to-be-determined flag
    pub tbd_flag: String,
    /// Interleague indicator
    pub interleague: String,
    /// Scheduled innings
    pub scheduled_innings: u32,
    /// Free-form description
    pub description: String,
    /// Venue id
    pub venue_id: i64,
    /// Away team id
    pub away_team_id: i64,
    /// Home team id
    pub home_team_id: i64,
}

/// Live or final status of a game with its line score totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStatusRecord {
    /// Instant the source asserted this record
    pub effective_date: DateTime<Utc>,
    /// Game primary key
    pub id: i64,
    /// Status text (Final, In Progress, ...)
    pub status: String,
    /// Status indicator code
    pub ind: String,
    /// Delay or postponement reason
    pub reason: String,
    /// Current inning
    pub current_inning: u32,
    /// Whether the top half is being played
    pub top_of_inning: bool,
    /// Balls in the current count
    pub balls: u32,
    /// Strikes in the current count
    pub strikes: u32,
    /// Outs in the current half inning
    pub outs: u32,
    /// Inning state text
    pub inning_state: String,
    /// Status note
    pub note: String,
    /// Perfect game in progress or completed
    pub perfect_game: bool,
    /// No hitter in progress or completed
    pub no_hitter: bool,
    /// Away runs
    pub away_team_runs: u32,
    /// Home runs
    pub home_team_runs: u32,
    /// Away hits
    pub away_team_hits: u32,
    /// Home hits
    pub home_team_hits: u32,
    /// Away errors
    pub away_team_errors: u32,
    /// Home errors
    pub home_team_errors: u32,
    /// Away home runs
    pub away_team_hr: u32,
    /// Home home runs
    pub home_team_hr: u32,
    /// Away stolen bases
    pub away_team_sb: u32,
    /// Home stolen bases
    pub home_team_sb: u32,
    /// Away strikeouts
    pub away_team_so: u32,
    /// Home strikeouts
    pub home_team_so: u32,
}

/// Runs scored by each side in one inning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InningScoreRecord {
    /// Instant the source asserted this record
    pub effective_date: DateTime<Utc>,
    /// Game primary key
    pub game_id: i64,
    /// Inning number, starting at 1
    pub inning: u32,
    /// Away runs in this inning
    pub away_team_runs: u32,
    /// Home runs in this inning
    pub home_team_runs: u32,
}

/// One extracted record, tagged by kind on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum PipelineRecord {
    /// Venue record
    Venue(VenueRecord),
    /// League record
    League(LeagueRecord),
    /// Division record
    Division(DivisionRecord),
    /// Team record
    Team(TeamRecord),
    /// Standing record
    Standing(StandingRecord),
    /// Game record
    Game(GameRecord),
    /// Game status record
    GameStatus(GameStatusRecord),
    /// Inning score record
    InningScore(InningScoreRecord),
}

impl PipelineRecord {
    /// Discriminator of this record
    pub fn kind(&self) -> RecordKind {
        match self {
            PipelineRecord::Venue(_) => RecordKind::Venue,
            PipelineRecord::League(_) => RecordKind::League,
            PipelineRecord::Division(_) => RecordKind::Division,
            PipelineRecord::Team(_) => RecordKind::Team,
            PipelineRecord::Standing(_) => RecordKind::Standing,
            PipelineRecord::Game(_) => RecordKind::Game,
            PipelineRecord::GameStatus(_) => RecordKind::GameStatus,
            PipelineRecord::InningScore(_) => RecordKind::InningScore,
        }
    }

    /// Instant at which the source asserted this record
    pub fn effective_date(&self) -> DateTime<Utc> {
        match self {
            PipelineRecord::Venue(r) => r.effective_date,
            PipelineRecord::League(r) => r.effective_date,
            PipelineRecord::Division(r) => r.effective_date,
            PipelineRecord::Team(r) => r.effective_date,
            PipelineRecord::Standing(r) => r.effective_date,
            PipelineRecord::Game(r) => r.effective_date,
            PipelineRecord::GameStatus(r) => r.effective_date,
            PipelineRecord::InningScore(r) => r.effective_date,
        }
    }

    /// Key under which this record is reconciled
    pub fn natural_key(&self) -> NaturalKey {
        match self {
            PipelineRecord::Venue(r) => NaturalKey::Id(r.id),
            PipelineRecord::League(r) => NaturalKey::Id(r.id),
            PipelineRecord::Division(r) => NaturalKey::Code(r.code.clone()),
            PipelineRecord::Team(r) => NaturalKey::Id(r.id),
            PipelineRecord::Standing(r) => NaturalKey::TeamDay(r.team_id, r.standing_date()),
            PipelineRecord::Game(r) => NaturalKey::Id(r.id),
            PipelineRecord::GameStatus(r) => NaturalKey::Id(r.id),
            PipelineRecord::InningScore(r) => NaturalKey::GameInning(r.game_id, r.inning),
        }
    }

    /// Column values in fixed order, effective date first.
    ///
    /// The same order is used for pipe-delimited file lines and positional
    /// SQL binds.
    pub fn fields(&self) -> Vec<FieldValue> {
        use FieldValue::{Bool, Date, Int, Text, Time};

        match self {
            PipelineRecord::Venue(r) => vec![
                Time(r.effective_date),
                Int(r.id),
                Text(r.name.clone()),
                Text(r.location.clone()),
                Text(r.channel.clone()),
            ],
            PipelineRecord::League(r) => vec![
                Time(r.effective_date),
                Int(r.id),
                Text(r.name.clone()),
                Text(r.sport_code.clone()),
            ],
            PipelineRecord::Division(r) => vec![
                Time(r.effective_date),
                Text(r.name.clone()),
                Text(r.code.clone()),
            ],
            PipelineRecord::Team(r) => vec![
                Time(r.effective_date),
                Int(r.id),
                Text(r.name.clone()),
                Text(r.code.clone()),
                Text(r.city.clone()),
                Int(r.league_id),
                Text(r.division.clone()),
            ],
            PipelineRecord::Standing(r) => vec![
                Time(r.effective_date),
                Int(r.team_id),
                Date(r.standing_date()),
                Int(r.wins.into()),
                Int(r.losses.into()),
                Int(r.games_played().into()),
                Text(r.games_back.clone()),
                Text(r.wildcard_games_back.clone()),
            ],
            PipelineRecord::Game(r) => vec![
                Time(r.effective_date),
                Int(r.id),
                Text(r.resume_date.clone()),
                Text(r.original_date.clone()),
                Text(r.game_type.clone()),
                Text(r.tiebreaker.clone()),
                Text(r.gameday.clone()),
                Text(r.double_header.clone()),
                Int(r.game_number.into()),
                Text(r.tbd_flag.clone()),
                Text(r.interleague.clone()),
                Int(r.scheduled_innings.into()),
                Text(r.description.clone()),
                Int(r.venue_id),
                Int(r.away_team_id),
                Int(r.home_team_id),
            ],
            PipelineRecord::GameStatus(r) => vec![
                Time(r.effective_date),
                Int(r.id),
                Text(r.status.clone()),
                Text(r.ind.clone()),
                Text(r.reason.clone()),
                Int(r.current_inning.into()),
                Bool(r.top_of_inning),
                Int(r.balls.into()),
                Int(r.strikes.into()),
                Int(r.outs.into()),
                Text(r.inning_state.clone()),
                Text(r.note.clone()),
                Bool(r.perfect_game),
                Bool(r.no_hitter),
                Int(r.away_team_runs.into()),
                Int(r.home_team_runs.into()),
                Int(r.away_team_hits.into()),
                Int(r.home_team_hits.into()),
                Int(r.away_team_errors.into()),
                Int(r.home_team_errors.into()),
                Int(r.away_team_hr.into()),
                Int(r.home_team_hr.into()),
                Int(r.away_team_sb.into()),
                Int(r.home_team_sb.into()),
                Int(r.away_team_so.into()),
                Int(r.home_team_so.into()),
            ],
            PipelineRecord::InningScore(r) => vec![
                Time(r.effective_date),
                Int(r.game_id),
                Int(r.inning.into()),
                Int(r.away_team_runs.into()),
                Int(r.home_team_runs.into()),
            ],
        }
    }

    /// Validate record data integrity
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PipelineRecord::Venue(r) => {
                if r.id <= 0 {
                    return Err(format!("Venue id must be positive, got {}", r.id));
                }
            }
            PipelineRecord::League(r) => {
                if r.id <= 0 {
                    return Err(format!("League id must be positive, got {}", r.id));
                }
            }
            PipelineRecord::Division(r) => {
                if !matches!(r.code.as_str(), "E" | "C" | "W") {
                    return Err(format!("Unknown division code: {:?}", r.code));
                }
            }
            PipelineRecord::Team(r) => {
                if r.id <= 0 {
                    return Err(format!("Team id must be positive, got {}", r.id));
                }
                if r.code.is_empty() {
                    return Err(format!("Team {} has an empty code", r.id));
                }
            }
            PipelineRecord::Standing(r) => {
                if r.team_id <= 0 {
                    return Err(format!("Standing team id must be positive, got {}", r.team_id));
                }
            }
            PipelineRecord::Game(r) => {
                if r.id <= 0 {
                    return Err(format!("Game id must be positive, got {}", r.id));
                }
                if r.away_team_id == r.home_team_id {
                    return Err(format!(
                        "Game {} has the same away and home team ({})",
                        r.id, r.home_team_id
                    ));
                }
            }
            PipelineRecord::GameStatus(r) => {
                if r.id <= 0 {
                    return Err(format!("Game status id must be positive, got {}", r.id));
                }
            }
            PipelineRecord::InningScore(r) => {
                if r.inning == 0 {
                    return Err(format!("Game {} has an inning numbered 0", r.game_id));
                }
            }
        }

        Ok(())
    }

    /// Decode one JSON record, dispatching on its `kind` tag.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 5, 29, hour, 0, 0).unwrap()
    }

    fn team(date: DateTime<Utc>) -> PipelineRecord {
        PipelineRecord::Team(TeamRecord {
            effective_date: date,
            id: 141,
            name: "Toronto".to_string(),
            code: "tor".to_string(),
            city: "Toronto".to_string(),
            league_id: 103,
            division: "E".to_string(),
        })
    }

    #[test]
    fn test_record_kind_from_str() {
        assert_eq!(RecordKind::from_str("Venue").unwrap(), RecordKind::Venue);
        assert_eq!(RecordKind::from_str("gamestatus").unwrap(), RecordKind::GameStatus);
        assert!(RecordKind::from_str("Weather").is_err());
    }

    #[test]
    fn test_policy_by_kind() {
        for kind in [RecordKind::Venue, RecordKind::League, RecordKind::Division, RecordKind::Team] {
            assert_eq!(kind.policy(), ReconcilePolicy::KeepEarliest, "{}", kind);
        }
        for kind in [
            RecordKind::Standing,
            RecordKind::Game,
            RecordKind::GameStatus,
            RecordKind::InningScore,
        ] {
            assert_eq!(kind.policy(), ReconcilePolicy::KeepLatest, "{}", kind);
        }
    }

    #[test]
    fn test_should_replace() {
        let (t1, t2) = (at(17), at(23));
        assert!(!ReconcilePolicy::KeepEarliest.should_replace(t1, t2));
        assert!(ReconcilePolicy::KeepEarliest.should_replace(t2, t1));
        assert!(ReconcilePolicy::KeepLatest.should_replace(t1, t2));
        assert!(!ReconcilePolicy::KeepLatest.should_replace(t2, t1));
        // ties keep what is stored
        assert!(!ReconcilePolicy::KeepEarliest.should_replace(t1, t1));
        assert!(!ReconcilePolicy::KeepLatest.should_replace(t1, t1));
    }

    #[test]
    fn test_json_tagged_decode() {
        let record = team(at(23));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"kind":"Team""#), "{}", json);

        let decoded = PipelineRecord::from_json(&json).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.kind(), RecordKind::Team);
    }

    #[test]
    fn test_json_unknown_kind_rejected() {
        let err = PipelineRecord::from_json(r#"{"kind":"Weather","id":1}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_standing_key_uses_eastern_day() {
        // 02:30 UTC on the 30th is still the evening of the 29th in New York
        let late = Utc.with_ymd_and_hms(2017, 5, 30, 2, 30, 0).unwrap();
        let standing = PipelineRecord::Standing(StandingRecord {
            effective_date: late,
            team_id: 141,
            wins: 25,
            losses: 27,
            games_back: "6.5".to_string(),
            wildcard_games_back: "3.0".to_string(),
        });

        assert_eq!(
            standing.natural_key(),
            NaturalKey::TeamDay(141, NaiveDate::from_ymd_opt(2017, 5, 29).unwrap())
        );
        assert_eq!(standing.fields()[5], FieldValue::Int(52));
    }

    #[test]
    fn test_fields_start_with_effective_date() {
        let record = team(at(23));
        let fields = record.fields();
        assert_eq!(fields[0], FieldValue::Time(at(23)));
        assert_eq!(fields[0].to_string(), "Mon May 29 23:00:00 UTC 2017");
        assert_eq!(fields.len(), 7);
    }

    #[test]
    fn test_validate() {
        let mut record = TeamRecord {
            effective_date: at(1),
            id: 141,
            name: "Toronto".to_string(),
            code: "tor".to_string(),
            city: "Toronto".to_string(),
            league_id: 103,
            division: "E".to_string(),
        };
        assert!(PipelineRecord::Team(record.clone()).validate().is_ok());

        record.code.clear();
        assert!(PipelineRecord::Team(record.clone()).validate().is_err());

        record.code = "tor".to_string();
        record.id = 0;
        assert!(PipelineRecord::Team(record).validate().is_err());

        let division = PipelineRecord::Division(DivisionRecord {
            effective_date: at(1),
            name: "North".to_string(),
            code: "N".to_string(),
        });
        assert!(division.validate().is_err());
    }
}
