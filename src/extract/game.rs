//! `game.xml` extraction
//!
//! ```xml
//! <game type="R" local_game_time="19:07" game_pk="491105" game_time_et="07:07 PM" gameday_sw="P">
//!   <team type="away" code="ana" id="108" name="LA Angels" name_full="Los Angeles Angels"
//!         name_brief="Angels" w="27" l="27" division_id="200" league_id="103" league="AL"/>
//!   <team type="home" .../>
//!   <stadium id="14" name="Rogers Centre" venue_w_chan_loc="CAXX0504" location="Toronto, ON"/>
//! </game>
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::America::New_York;
use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::io::AsyncBufRead;

use super::{localize, Attrs, DecodeError};
use crate::{PipelineRecord, TeamRecord, VenueRecord};

/// `game_time_et` layout (`07:07 PM`)
const GAME_TIME_ET_FORMAT: &str = "%I:%M %p";

/// Division code for a `division_id`.
pub fn division_code(division_id: i64) -> Option<&'static str> {
    match division_id {
        200 | 203 => Some("W"),
        201 | 204 => Some("E"),
        202 | 205 => Some("C"),
        _ => None,
    }
}

/// One `<team>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTeam {
    /// `home` or `away`
    pub side: String,
    /// Team id
    pub id: i64,
    /// Short code
    pub code: String,
    /// Display name
    pub name: String,
    /// Full name (`Los Angeles Angels`)
    pub full_name: String,
    /// Brief name (`Angels`)
    pub brief_name: String,
    /// League id
    pub league_id: i64,
    /// Division code derived from `division_id`
    pub division: &'static str,
}

impl GameTeam {
    /// Full name with the trailing brief name removed.
    pub fn city(&self) -> String {
        self.full_name
            .strip_suffix(self.brief_name.as_str())
            .filter(|_| !self.brief_name.is_empty())
            .unwrap_or(&self.full_name)
            .trim()
            .to_string()
    }
}

/// `<stadium>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stadium {
    /// Venue id
    pub id: i64,
    /// Venue name
    pub name: String,
    /// Channel location code
    pub channel: String,
    /// City and state
    pub location: String,
}

/// Decoded `game.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDocument {
    /// Game primary key
    pub game_pk: i64,
    /// Scheduled start, effective date of the derived records
    pub start_time: DateTime<Utc>,
    /// Both teams, document order
    pub teams: Vec<GameTeam>,
    /// Stadium
    pub stadium: Stadium,
}

impl GameDocument {
    /// Read a whole `game.xml`. `date` is the calendar day of the game
    /// directory; the document itself only carries the Eastern wall time.
    pub async fn read<R: AsyncBufRead + Unpin>(inner: R, date: NaiveDate) -> Result<Self, DecodeError> {
        let mut reader = Reader::from_reader(inner);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        let mut game: Option<Attrs> = None;
        let mut teams = Vec::new();
        let mut stadium: Option<Attrs> = None;

        loop {
            buf.clear();
            match reader.read_event_into_async(&mut buf).await? {
                Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                    b"game" => game = Some(Attrs::from_element(e)?),
                    b"team" => teams.push(Attrs::from_element(e)?),
                    b"stadium" => stadium = Some(Attrs::from_element(e)?),
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        let game = game.ok_or(DecodeError::Missing("game"))?;
        let stadium = stadium.ok_or(DecodeError::Missing("stadium"))?;
        decode(&game, &teams, &stadium, date)
    }

    /// Venue first, then one team record per `<team>`.
    pub fn records(&self) -> Vec<PipelineRecord> {
        let at = self.start_time;
        let mut records = vec![PipelineRecord::Venue(VenueRecord {
            effective_date: at,
            id: self.stadium.id,
            name: self.stadium.name.clone(),
            location: self.stadium.location.clone(),
            channel: self.stadium.channel.clone(),
        })];

        records.extend(self.teams.iter().map(|team| {
            PipelineRecord::Team(TeamRecord {
                effective_date: at,
                id: team.id,
                name: team.name.clone(),
                code: team.code.clone(),
                city: team.city(),
                league_id: team.league_id,
                division: team.division.to_string(),
            })
        }));

        records
    }
}

fn decode(game: &Attrs, teams: &[Attrs], stadium: &Attrs, date: NaiveDate) -> Result<GameDocument, DecodeError> {
    let label = game.text("game_pk");
    let invalid = |reason: String| DecodeError::InvalidGame {
        game: label.clone(),
        reason,
    };

    let game_pk = game.id("game_pk").map_err(&invalid)?;
    let time_et = game.text("game_time_et");
    let time = NaiveTime::parse_from_str(&time_et, GAME_TIME_ET_FORMAT)
        .map_err(|e| invalid(format!("bad game_time_et {:?}: {}", time_et, e)))?;
    let start_time = localize(date.and_time(time), New_York)
        .ok_or_else(|| invalid(format!("game time {} {} does not exist in New York", date, time_et)))?;

    let teams = teams
        .iter()
        .map(|t| {
            let division_id = t.id("division_id")?;
            let division =
                division_code(division_id).ok_or_else(|| format!("unexpected division_id {}", division_id))?;
            Ok(GameTeam {
                side: t.text("type"),
                id: t.id("id")?,
                code: t.text("code"),
                name: t.text("name"),
                full_name: t.text("name_full"),
                brief_name: t.text("name_brief"),
                league_id: t.id("league_id")?,
                division,
            })
        })
        .collect::<Result<Vec<_>, String>>()
        .map_err(&invalid)?;
    if teams.len() != 2 {
        return Err(invalid(format!("expected 2 teams, found {}", teams.len())));
    }

    let stadium = Stadium {
        id: stadium.id("id").map_err(&invalid)?,
        name: stadium.text("name"),
        channel: stadium.text("venue_w_chan_loc"),
        location: stadium.text("location"),
    };

    Ok(GameDocument {
        game_pk,
        start_time,
        teams,
        stadium,
    })
}
