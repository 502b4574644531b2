//! Remote/local resource resolution
//!
//! A [`ResourceResolver`] holds the `(remote root, local root)` pair for one
//! run and maps dates and game identifiers onto remote URLs and local mirror
//! paths. Every locate operation is a pure string transform: no I/O, no shared
//! state, safe to call from any number of stages at once.
//!
//! # Layout
//!
//! ```text
//! {remote}/year_2017/month_05/day_29/                                   day listing
//! {remote}/year_2017/month_05/day_29/master_scoreboard.xml              scoreboard
//! {remote}/year_2017/month_05/day_29/gid_2017_05_29_anamlb_tormlb_1/    game directory
//! ```
//!
//! Local paths drop the first four segments of the remote URL path (the empty
//! leading segment plus the three-segment API prefix) and add `index.html`
//! when the last segment has no extension.

mod game_id;

pub use game_id::{GameId, GAME_ID_PREFIX};

use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use url::Url;

/// Number of leading remote path segments not mirrored locally.
pub const API_PREFIX_SEGMENTS: usize = 4;

/// Leaf written for directory-style remote paths.
pub const INDEX_FILE: &str = "index.html";

/// Scoreboard file in every day directory.
pub const SCOREBOARD_FILE: &str = "master_scoreboard.xml";

/// Resolver errors
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A locate operation ran before roots were set
    #[error("resolver roots were not configured")]
    NotConfigured,

    /// Remote root is not an absolute http(s) URL
    #[error("invalid remote root {0:?}: {1}")]
    InvalidRoot(String, String),

    /// Malformed game identifier
    #[error("invalid game id {0}")]
    InvalidGameId(String),

    /// Could not build a URL below the remote root
    #[error("invalid location {0:?}: {1}")]
    InvalidLocation(String, String),
}

/// One remote resource and where it is mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Remote URL
    pub remote: Url,
    /// Local mirror path
    pub local: PathBuf,
}

/// Files fetched for every game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameFile {
    /// `game.xml`
    Game,
    /// `game_events.xml`
    GameEvents,
    /// `inning/inning_all.xml`
    InningAll,
    /// `inning/inning_hit.xml`
    InningHit,
    /// `bis_boxscore.xml`
    BoxScore,
}

impl GameFile {
    /// Files returned by [`ResourceResolver::locate_game`].
    pub const MIRRORED: [GameFile; 4] = [
        GameFile::Game,
        GameFile::GameEvents,
        GameFile::InningAll,
        GameFile::InningHit,
    ];

    /// Complete per-game file set, box score included.
    pub const ALL: [GameFile; 5] = [
        GameFile::BoxScore,
        GameFile::Game,
        GameFile::GameEvents,
        GameFile::InningAll,
        GameFile::InningHit,
    ];

    /// Path relative to the game directory
    pub fn relative_path(&self) -> &'static str {
        match self {
            GameFile::Game => "game.xml",
            GameFile::GameEvents => "game_events.xml",
            GameFile::InningAll => "inning/inning_all.xml",
            GameFile::InningHit => "inning/inning_hit.xml",
            GameFile::BoxScore => "bis_boxscore.xml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Roots {
    remote: Url,
    local: PathBuf,
}

/// Maps dates and game ids onto remote and local locations.
///
/// `Default` yields an unconfigured resolver; every locate call on it fails
/// with [`ResolveError::NotConfigured`] until [`ResourceResolver::roots`] is
/// called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceResolver {
    roots: Option<Roots>,
}

impl ResourceResolver {
    /// Build a configured resolver.
    pub fn new(remote_root: &str, local_root: impl Into<PathBuf>) -> Result<Self, ResolveError> {
        let mut resolver = Self::default();
        resolver.roots(remote_root, local_root)?;
        Ok(resolver)
    }

    /// Set the remote and local roots.
    pub fn roots(&mut self, remote_root: &str, local_root: impl Into<PathBuf>) -> Result<(), ResolveError> {
        let mut remote = Url::parse(remote_root.trim())
            .map_err(|e| ResolveError::InvalidRoot(remote_root.to_string(), e.to_string()))?;
        if !matches!(remote.scheme(), "http" | "https") {
            return Err(ResolveError::InvalidRoot(
                remote_root.to_string(),
                "scheme must be http or https".to_string(),
            ));
        }
        if !remote.path().ends_with('/') {
            let path = format!("{}/", remote.path());
            remote.set_path(&path);
        }

        self.roots = Some(Roots {
            remote,
            local: local_root.into(),
        });
        Ok(())
    }

    /// Whether roots have been set
    pub fn is_configured(&self) -> bool {
        self.roots.is_some()
    }

    /// Remote root, always ending in `/`
    pub fn remote_root(&self) -> Result<&Url, ResolveError> {
        Ok(&self.configured()?.remote)
    }

    /// Day directory listing for `date`.
    pub fn locate_date(&self, date: NaiveDate) -> Result<Location, ResolveError> {
        let remote = self.join(&self.configured()?.remote, &day_suffix(date))?;
        self.locate_url(remote)
    }

    /// Day scoreboard for `date`.
    pub fn locate_scoreboard(&self, date: NaiveDate) -> Result<Location, ResolveError> {
        let day = self.locate_date(date)?;
        let remote = self.join(&day.remote, SCOREBOARD_FILE)?;
        self.locate_url(remote)
    }

    /// Game directory for `game`.
    pub fn locate_game_dir(&self, game: &GameId) -> Result<Location, ResolveError> {
        let day = self.locate_date(game.date())?;
        let remote = self.join(&day.remote, &format!("{}/", game))?;
        self.locate_url(remote)
    }

    /// One file of one game.
    pub fn locate_game_file(&self, game: &GameId, file: GameFile) -> Result<Location, ResolveError> {
        let dir = self.locate_game_dir(game)?;
        let remote = self.join(&dir.remote, file.relative_path())?;
        self.locate_url(remote)
    }

    /// The four mirrored files of a game, in [`GameFile::MIRRORED`] order.
    pub fn locate_game(&self, game: &GameId) -> Result<[Location; 4], ResolveError> {
        let [a, b, c, d] = GameFile::MIRRORED;
        Ok([
            self.locate_game_file(game, a)?,
            self.locate_game_file(game, b)?,
            self.locate_game_file(game, c)?,
            self.locate_game_file(game, d)?,
        ])
    }

    /// Pair an arbitrary remote URL with its local mirror path.
    pub fn locate_url(&self, remote: Url) -> Result<Location, ResolveError> {
        let local = self.local_path(&remote)?;
        Ok(Location { remote, local })
    }

    /// Local mirror path of a remote URL.
    pub fn local_path(&self, remote: &Url) -> Result<PathBuf, ResolveError> {
        let roots = self.configured()?;
        Ok(mirror_path(&roots.local, remote.path()))
    }

    fn configured(&self) -> Result<&Roots, ResolveError> {
        self.roots.as_ref().ok_or(ResolveError::NotConfigured)
    }

    fn join(&self, base: &Url, suffix: &str) -> Result<Url, ResolveError> {
        base.join(suffix)
            .map_err(|e| ResolveError::InvalidLocation(format!("{}{}", base, suffix), e.to_string()))
    }
}

fn day_suffix(date: NaiveDate) -> String {
    format!(
        "year_{:04}/month_{:02}/day_{:02}/",
        date.year(),
        date.month(),
        date.day()
    )
}

fn mirror_path(local_root: &Path, remote_path: &str) -> PathBuf {
    let segments: Vec<&str> = remote_path.split('/').skip(API_PREFIX_SEGMENTS).collect();

    let mut path = local_root.to_path_buf();
    for segment in segments.iter().filter(|s| !s.is_empty()) {
        path.push(segment);
    }

    let has_extension = segments
        .last()
        .map(|last| Path::new(last).extension().is_some())
        .unwrap_or(false);
    if !has_extension {
        path.push(INDEX_FILE);
    }
    path
}

/// Recover the calendar date from any path or URL containing
/// `year_YYYY/month_MM/day_DD` segments.
pub fn date_from_path(path: &str) -> Option<NaiveDate> {
    let mut year = None;
    let mut month = None;
    let mut day = None;

    for segment in path.split(['/', '\\']) {
        if let Some(v) = segment.strip_prefix("year_") {
            year = v.parse::<i32>().ok();
        } else if let Some(v) = segment.strip_prefix("month_") {
            month = v.parse::<u32>().ok();
        } else if let Some(v) = segment.strip_prefix("day_") {
            day = v.parse::<u32>().ok();
        }
    }

    NaiveDate::from_ymd_opt(year?, month?, day?)
}
