//! `master_scoreboard.xml` extraction
//!
//! The scoreboard lists every game of a day:
//!
//! ```xml
//! <games year="2017" month="05" day="29">
//!   <game id="2017/05/29/anamlb-tormlb-1" game_pk="491105" time_date="2017/05/29 7:07" ampm="PM" ...>
//!     <status status="Final" top_inning="N" .../>
//!     <linescore>
//!       <inning away="0" home="1"/>
//!       <r away="3" home="5"/> <h .../> <e .../> <hr .../> <sb .../> <so .../>
//!     </linescore>
//!   </game>
//! </games>
//! ```
//!
//! [`ScoreboardReader::next_game`] returns each game as soon as its closing
//! tag has been read; [`ScoreboardGame::records`] derives the pipeline records.

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use tokio::io::AsyncBufRead;

use super::{division_name, league_name, localize, time_zone, Attrs, DecodeError};
use crate::resolver::{GameId, GAME_ID_PREFIX};
use crate::{
    DivisionRecord, GameRecord, GameStatusRecord, InningScoreRecord, LeagueRecord, PipelineRecord,
    StandingRecord, TeamRecord, VenueRecord,
};

/// `time_date` + `ampm` layout (`2017/05/29 7:07PM`)
const GAME_TIME_FORMAT: &str = "%Y/%m/%d %I:%M%p";

/// Line score totals tracked per side.
const TOTALS: [&str; 6] = ["r", "h", "e", "hr", "sb", "so"];

/// Away/home pair of counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Split {
    /// Away side
    pub away: u32,
    /// Home side
    pub home: u32,
}

impl Split {
    fn from_attrs(attrs: &Attrs) -> Self {
        Self {
            away: attrs.count("away"),
            home: attrs.count("home"),
        }
    }
}

/// Line score of one game
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Linescore {
    /// Runs per inning, first inning first
    pub innings: Vec<Split>,
    /// Runs
    pub runs: Split,
    /// Hits
    pub hits: Split,
    /// Errors
    pub errors: Split,
    /// Home runs
    pub home_runs: Split,
    /// Stolen bases
    pub stolen_bases: Split,
    /// Strikeouts
    pub strikeouts: Split,
}

/// One side of a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSide {
    /// Team id
    pub id: i64,
    /// Team name
    pub name: String,
    /// Home city
    pub city: String,
    /// Short team code
    pub code: String,
    /// Sport code of the team's league
    pub sport_code: String,
    /// League id
    pub league_id: i64,
    /// League name
    pub league_name: &'static str,
    /// Division code
    pub division_code: String,
    /// Division name
    pub division_name: &'static str,
    /// Wins
    pub wins: u32,
    /// Losses
    pub losses: u32,
    /// Games behind the division leader
    pub games_back: String,
    /// Games behind the wildcard
    pub wildcard_games_back: String,
}

/// Status block of a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStatus {
    /// Status text
    pub status: String,
    /// Status indicator code
    pub ind: String,
    /// Delay or postponement reason
    pub reason: String,
    /// Current inning
    pub inning: u32,
    /// Top of the inning
    pub top_inning: bool,
    /// Balls
    pub balls: u32,
    /// Strikes
    pub strikes: u32,
    /// Outs
    pub outs: u32,
    /// Inning state text
    pub inning_state: String,
    /// Status note
    pub note: String,
    /// Perfect game flag
    pub perfect_game: bool,
    /// No hitter flag
    pub no_hitter: bool,
}

/// A fully decoded and validated scoreboard game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardGame {
    /// Game primary key
    pub game_pk: i64,
    /// First pitch, the effective date of every derived record
    pub start_time: DateTime<Utc>,
    /// Remote game directory (`/components/game/mlb/year_.../gid_...`)
    pub game_data_directory: String,
    /// `gameday` token without the `gid_` prefix
    pub gameday: String,
    /// Venue id
    pub venue_id: i64,
    /// Venue name
    pub venue: String,
    /// Venue location
    pub location: String,
    /// Venue channel location code
    pub venue_channel: String,
    /// Away side
    pub away: TeamSide,
    /// Home side
    pub home: TeamSide,
    /// Game type code
    pub game_type: String,
    /// Resume date
    pub resume_date: String,
    /// Original date
    pub original_date: String,
    /// Tiebreaker switch
    pub tiebreaker: String,
    /// Gameday coverage switch
    pub gameday_sw: String,
    /// Double header switch
    pub double_header: String,
    /// Game number
    pub game_number: u32,
    /// TBD flag
    pub tbd_flag: String,
    /// League / interleague indicator
    pub league: String,
    /// Scheduled innings
    pub scheduled_innings: u32,
    /// Description
    pub description: String,
    /// Status block
    pub status: GameStatus,
    /// Line score
    pub linescore: Linescore,
}

impl ScoreboardGame {
    /// Game identifier, from the data directory or the `gameday` attribute.
    pub fn game_id(&self) -> Option<GameId> {
        let from_dir = self
            .game_data_directory
            .rsplit('/')
            .find(|s| !s.is_empty())
            .and_then(|s| GameId::parse(s).ok());

        from_dir.or_else(|| GameId::parse(&format!("{}{}", GAME_ID_PREFIX, self.gameday)).ok())
    }

    /// Derive every record of this game, in a fixed order: venue, leagues,
    /// divisions, teams, standings, game, status, then one inning score per
    /// line score inning.
    pub fn records(&self) -> Vec<PipelineRecord> {
        let at = self.start_time;
        let mut records = Vec::with_capacity(11 + self.linescore.innings.len());

        records.push(PipelineRecord::Venue(VenueRecord {
            effective_date: at,
            id: self.venue_id,
            name: self.venue.clone(),
            location: self.location.clone(),
            channel: self.venue_channel.clone(),
        }));

        for side in [&self.away, &self.home] {
            records.push(PipelineRecord::League(LeagueRecord {
                effective_date: at,
                id: side.league_id,
                name: side.league_name.to_string(),
                sport_code: side.sport_code.clone(),
            }));
        }
        for side in [&self.away, &self.home] {
            records.push(PipelineRecord::Division(DivisionRecord {
                effective_date: at,
                name: side.division_name.to_string(),
                code: side.division_code.clone(),
            }));
        }
        for side in [&self.away, &self.home] {
            records.push(PipelineRecord::Team(TeamRecord {
                effective_date: at,
                id: side.id,
                name: side.name.clone(),
                code: side.code.clone(),
                city: side.city.clone(),
                league_id: side.league_id,
                division: side.division_code.clone(),
            }));
        }
        for side in [&self.away, &self.home] {
            records.push(PipelineRecord::Standing(StandingRecord {
                effective_date: at,
                team_id: side.id,
                wins: side.wins,
                losses: side.losses,
                games_back: side.games_back.clone(),
                wildcard_games_back: side.wildcard_games_back.clone(),
            }));
        }

        records.push(PipelineRecord::Game(GameRecord {
            effective_date: at,
            id: self.game_pk,
            resume_date: self.resume_date.clone(),
            original_date: self.original_date.clone(),
            game_type: self.game_type.clone(),
            tiebreaker: self.tiebreaker.clone(),
            gameday: self.gameday_sw.clone(),
            double_header: self.double_header.clone(),
            game_number: self.game_number,
            tbd_flag: self.tbd_flag.clone(),
            interleague: self.league.clone(),
            scheduled_innings: self.scheduled_innings,
            description: self.description.clone(),
            venue_id: self.venue_id,
            away_team_id: self.away.id,
            home_team_id: self.home.id,
        }));

        let status = &self.status;
        let line = &self.linescore;
        records.push(PipelineRecord::GameStatus(GameStatusRecord {
            effective_date: at,
            id: self.game_pk,
            status: status.status.clone(),
            ind: status.ind.clone(),
            reason: status.reason.clone(),
            current_inning: status.inning,
            top_of_inning: status.top_inning,
            balls: status.balls,
            strikes: status.strikes,
            outs: status.outs,
            inning_state: status.inning_state.clone(),
            note: status.note.clone(),
            perfect_game: status.perfect_game,
            no_hitter: status.no_hitter,
            away_team_runs: line.runs.away,
            home_team_runs: line.runs.home,
            away_team_hits: line.hits.away,
            home_team_hits: line.hits.home,
            away_team_errors: line.errors.away,
            home_team_errors: line.errors.home,
            away_team_hr: line.home_runs.away,
            home_team_hr: line.home_runs.home,
            away_team_sb: line.stolen_bases.away,
            home_team_sb: line.stolen_bases.home,
            away_team_so: line.strikeouts.away,
            home_team_so: line.strikeouts.home,
        }));

        for (i, inning) in line.innings.iter().enumerate() {
            records.push(PipelineRecord::InningScore(InningScoreRecord {
                effective_date: at,
                game_id: self.game_pk,
                inning: i as u32 + 1,
                away_team_runs: inning.away,
                home_team_runs: inning.home,
            }));
        }

        records
    }
}

/// Elements of one `<game>` collected while it streams past.
#[derive(Debug, Default)]
struct RawGame {
    game: Attrs,
    status: Attrs,
    innings: Vec<Split>,
    totals: HashMap<&'static str, Split>,
}

impl RawGame {
    fn label(&self) -> String {
        match self.game.text("id") {
            id if !id.is_empty() => id,
            _ => self.game.text("game_pk"),
        }
    }

    fn decode(self) -> Result<ScoreboardGame, DecodeError> {
        let label = self.label();
        let invalid = |reason: String| DecodeError::InvalidGame {
            game: label.clone(),
            reason,
        };
        let g = &self.game;

        let zone_name = g.text("time_zone");
        let zone = time_zone(&zone_name)
            .ok_or_else(|| invalid(format!("unexpected time zone {:?}", zone_name)))?;
        let time_string = format!("{}{}", g.text("time_date"), g.text("ampm"));
        let naive = NaiveDateTime::parse_from_str(&time_string, GAME_TIME_FORMAT)
            .map_err(|e| invalid(format!("bad game time {:?}: {}", time_string, e)))?;
        let start_time = localize(naive, zone)
            .ok_or_else(|| invalid(format!("game time {:?} does not exist in {}", time_string, zone_name)))?;

        let game_pk = g.id("game_pk").map_err(&invalid)?;
        let venue_id = g.id("venue_id").map_err(&invalid)?;
        let away = team_side(g, "away").map_err(&invalid)?;
        let home = team_side(g, "home").map_err(&invalid)?;

        let s = &self.status;
        let status = GameStatus {
            status: s.text("status"),
            ind: s.text("ind"),
            reason: s.text("reason"),
            inning: s.count("inning"),
            top_inning: s.flag("top_inning").map_err(&invalid)?,
            balls: s.count("b"),
            strikes: s.count("s"),
            outs: s.count("o"),
            inning_state: s.text("inning_state"),
            note: s.text("note"),
            perfect_game: s.flag("is_perfect_game").map_err(&invalid)?,
            no_hitter: s.flag("is_no_hitter").map_err(&invalid)?,
        };

        let total = |name: &str| self.totals.get(name).copied().unwrap_or_default();
        let linescore = Linescore {
            innings: self.innings.clone(),
            runs: total("r"),
            hits: total("h"),
            errors: total("e"),
            home_runs: total("hr"),
            stolen_bases: total("sb"),
            strikeouts: total("so"),
        };

        let scheduled_innings = match g.count("scheduled_innings") {
            0 => 9,
            n => n,
        };

        Ok(ScoreboardGame {
            game_pk,
            start_time,
            game_data_directory: g.text("game_data_directory"),
            gameday: g.text("gameday"),
            venue_id,
            venue: g.text("venue"),
            location: g.text("location"),
            venue_channel: g.text("venue_w_chan_loc"),
            away,
            home,
            game_type: g.text("game_type"),
            resume_date: g.text("resume_date"),
            original_date: g.text("original_date"),
            tiebreaker: g.text("tiebreaker_sw"),
            gameday_sw: g.text("gameday_sw"),
            double_header: g.text("double_header_sw"),
            game_number: g.count("game_nbr"),
            tbd_flag: g.text("tbd_flag"),
            league: g.text("league"),
            scheduled_innings,
            description: g.text("description"),
            status,
            linescore,
        })
    }
}

fn team_side(g: &Attrs, side: &str) -> Result<TeamSide, String> {
    let key = |suffix: &str| format!("{}_{}", side, suffix);

    let league_id = g.id(&key("league_id"))?;
    let league = league_name(league_id).ok_or_else(|| format!("unexpected {} league id {}", side, league_id))?;
    let division_code = g.text(&key("division"));
    let division = division_name(&division_code)
        .ok_or_else(|| format!("unexpected {} division code {:?}", side, division_code))?;

    Ok(TeamSide {
        id: g.id(&key("team_id"))?,
        name: g.text(&key("team_name")),
        city: g.text(&key("team_city")),
        code: g.text(&key("code")),
        sport_code: g.text(&key("sport_code")),
        league_id,
        league_name: league,
        division_code,
        division_name: division,
        wins: g.count(&key("win")),
        losses: g.count(&key("loss")),
        games_back: g.text(&key("games_back")),
        wildcard_games_back: g.text(&key("games_back_wildcard")),
    })
}

/// Pull reader yielding one [`ScoreboardGame`] per `<game>` element.
pub struct ScoreboardReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: AsyncBufRead + Unpin> ScoreboardReader<R> {
    /// Wrap a buffered byte source.
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            finished: false,
        }
    }

    /// Next game of the document.
    ///
    /// Returns `Ok(None)` at the end of the document. A recoverable error
    /// (see [`DecodeError::is_recoverable`]) skips only the offending game;
    /// after a syntax error every later call returns `Ok(None)`.
    pub async fn next_game(&mut self) -> Result<Option<ScoreboardGame>, DecodeError> {
        let mut current: Option<RawGame> = None;
        let mut in_linescore = false;

        while !self.finished {
            self.buf.clear();
            let event = match self.reader.read_event_into_async(&mut self.buf).await {
                Ok(event) => event,
                Err(e) => {
                    self.finished = true;
                    return Err(e.into());
                }
            };

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let empty = matches!(event, Event::Empty(_));
                    if let Some(done) = on_element(&mut current, &mut in_linescore, e, empty)? {
                        return done.decode().map(Some);
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"linescore" => in_linescore = false,
                    b"game" => {
                        if let Some(raw) = current.take() {
                            return raw.decode().map(Some);
                        }
                    }
                    _ => {}
                },
                Event::Eof => self.finished = true,
                _ => {}
            }
        }

        Ok(None)
    }

    /// Drain the document, logging and skipping invalid games.
    pub async fn collect_games(mut self) -> Result<Vec<ScoreboardGame>, DecodeError> {
        let mut games = Vec::new();
        loop {
            match self.next_game().await {
                Ok(Some(game)) => games.push(game),
                Ok(None) => return Ok(games),
                Err(e) if e.is_recoverable() => tracing::warn!("Skipping scoreboard game: {}", e),
                Err(e) => return Err(e),
            }
        }
    }
}

/// Fold one opening or empty element into the game being collected. Returns
/// the game when an empty `<game/>` element completes it on the spot.
fn on_element(
    current: &mut Option<RawGame>,
    in_linescore: &mut bool,
    element: &BytesStart<'_>,
    empty: bool,
) -> Result<Option<RawGame>, DecodeError> {
    let name = element.name();
    let name = name.as_ref();

    if name == b"game" {
        let raw = RawGame {
            game: Attrs::from_element(element)?,
            ..RawGame::default()
        };
        if empty {
            return Ok(Some(raw));
        }
        *current = Some(raw);
        *in_linescore = false;
        return Ok(None);
    }

    let Some(game) = current.as_mut() else {
        return Ok(None);
    };

    match name {
        b"status" => game.status = Attrs::from_element(element)?,
        b"linescore" => *in_linescore = !empty,
        b"inning" if *in_linescore => {
            game.innings.push(Split::from_attrs(&Attrs::from_element(element)?));
        }
        other if *in_linescore => {
            if let Some(key) = TOTALS.iter().find(|t| t.as_bytes() == other) {
                game.totals
                    .insert(*key, Split::from_attrs(&Attrs::from_element(element)?));
            }
        }
        _ => {}
    }

    Ok(None)
}
