//! Resource resolution through the public API

use chrono::NaiveDate;
use gameday_ingest::resolver::{date_from_path, GameFile, GameId, ResolveError, ResourceResolver};
use std::path::PathBuf;
use url::Url;

fn resolver() -> ResourceResolver {
    ResourceResolver::new("http://gd2.mlb.com/components/game/mlb", "/srv/mirror").unwrap()
}

#[test]
fn listing_urls_gain_an_index_file() {
    let resolver = resolver();
    let remote = Url::parse(
        "http://gd2.mlb.com/components/game/mlb/year_2017/month_05/day_29/gid_2017_05_29_anamlb_tormlb_1/",
    )
    .unwrap();
    let location = resolver.locate_url(remote).unwrap();
    assert_eq!(
        location.local,
        PathBuf::from("/srv/mirror/year_2017/month_05/day_29/gid_2017_05_29_anamlb_tormlb_1/index.html")
    );
    assert_eq!(
        date_from_path(&location.local.to_string_lossy()),
        NaiveDate::from_ymd_opt(2017, 5, 29)
    );
}

#[test]
fn game_files_mirror_under_the_game_directory() {
    let resolver = resolver();
    let game = GameId::parse("gid_2017_05_29_anamlb_tormlb_1").unwrap();
    let files = resolver.locate_game(&game).unwrap();

    assert_eq!(files.len(), 4);
    assert_eq!(
        files[0].remote.as_str(),
        "http://gd2.mlb.com/components/game/mlb/year_2017/month_05/day_29/gid_2017_05_29_anamlb_tormlb_1/game.xml"
    );
    assert_eq!(
        files[3].local,
        PathBuf::from("/srv/mirror/year_2017/month_05/day_29/gid_2017_05_29_anamlb_tormlb_1/inning/inning_hit.xml")
    );

    let boxscore = resolver.locate_game_file(&game, GameFile::BoxScore).unwrap();
    assert!(boxscore.local.ends_with("bis_boxscore.xml"));
}

#[test]
fn game_id_parts() {
    let game = GameId::parse("gid_2017_05_29_anamlb_tormlb_2").unwrap();
    assert_eq!(game.date(), NaiveDate::from_ymd_opt(2017, 5, 29).unwrap());
    assert_eq!(game.away(), "anamlb");
    assert_eq!(game.home(), "tormlb");
    assert_eq!(game.number(), 2);
    assert_eq!(game.to_string(), "gid_2017_05_29_anamlb_tormlb_2");

    assert!(matches!(GameId::parse("gid_2017_13_29_anamlb_tormlb_1"), Err(ResolveError::InvalidGameId(_))));
    assert!(matches!(GameId::parse("2017_05_29_anamlb_tormlb_1"), Err(ResolveError::InvalidGameId(_))));
}

#[test]
fn unconfigured_resolver_refuses_to_locate() {
    let resolver = ResourceResolver::default();
    let date = NaiveDate::from_ymd_opt(2017, 5, 29).unwrap();
    assert_eq!(resolver.locate_date(date), Err(ResolveError::NotConfigured));
    assert!(matches!(resolver.locate_scoreboard(date), Err(ResolveError::NotConfigured)));
}

#[test]
fn relative_remote_root_is_rejected() {
    assert!(matches!(
        ResourceResolver::new("gd2.mlb.com/components/game/mlb", "/srv/mirror"),
        Err(ResolveError::InvalidRoot(_, _))
    ));
}
