//! Event store integration: reading seeds and hits, writing outputs.

mod helpers;

use helpers::fit::{Script, ScriptedFitSystem};
use helpers::fixtures::*;

use tracker_extrapolation::{
    Collection, Event, EventDriver, EventStore, ExtrapolationConfig, ExtrapolationError, HitId,
};

fn event_with_hits() -> Event {
    let struck = element(OUTER_BARREL_ID, 0, 3, 2);
    Event::new(3, 42)
        .with_collection(SEEDS, Collection::Tracks(vec![seed(1e-3, 0, 3)]))
        .with_collection(
            OUTER_BARREL_HITS,
            Collection::Hits(collection(vec![
                hit_on(100, struck, 400.0),
                hit_on(101, element(OUTER_BARREL_ID, 0, 8, 2), 400.0),
            ])),
        )
}

fn script() -> Script {
    Script::new()
        .propagate(layer_key(OUTER_BARREL_ID, 0), element(OUTER_BARREL_ID, 0, 3, 2))
        .chi2(HitId(100), 2.0)
}

fn run(config: ExtrapolationConfig, event: &mut Event) -> Result<(), ExtrapolationError> {
    let mut driver = EventDriver::new(config, &geometry(), ScriptedFitSystem::new(script()))?;
    driver.process_event(event)
}

#[test]
fn test_process_event_writes_outputs() {
    let mut event = event_with_hits();
    let config = barrel_config().with_outputs("Extended", "Unused");

    run(config, &mut event).unwrap();

    let tracks = event.extended_tracks("Extended").unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].added_hits, 1);

    let unused = event.hits("Unused").unwrap();
    assert!(unused.subset);
    assert_eq!(unused.hits.len(), 1);
    assert_eq!(unused.hits[0].id, HitId(101));
}

#[test]
fn test_event_without_seeds_is_untouched() {
    let mut event = Event::new(3, 43).with_collection(
        OUTER_BARREL_HITS,
        Collection::Hits(collection(vec![hit_on(
            100,
            element(OUTER_BARREL_ID, 0, 3, 2),
            400.0,
        )])),
    );
    let before = event.clone();

    run(barrel_config(), &mut event).unwrap();

    assert_eq!(event, before);
}

#[test]
fn test_missing_hit_collection_leaves_tracks_unextended() {
    let mut event = Event::new(3, 44)
        .with_collection(SEEDS, Collection::Tracks(vec![seed(1e-3, 0, 3)]));
    let config = barrel_config();
    let output_name = config.output_track_collection.clone();
    let unused_name = config.output_unused_hit_collection.clone();

    run(config, &mut event).unwrap();

    let tracks = event.extended_tracks(&output_name).unwrap();
    assert_eq!(tracks[0].added_hits, 0);
    assert!(event.hits(&unused_name).unwrap().is_empty());
}

#[test]
fn test_empty_collection_name_disables_subdetector() {
    let mut event = event_with_hits();
    let config = barrel_config().with_subdetectors([("", OUTER_BARREL)]);

    run(config.clone(), &mut event).unwrap();

    let tracks = event
        .extended_tracks(&config.output_track_collection)
        .unwrap();
    assert_eq!(tracks[0].added_hits, 0);
}

#[test]
fn test_seed_collection_of_wrong_kind_is_ignored() {
    let mut event = Event::new(3, 45).with_collection(SEEDS, Collection::Hits(collection(Vec::new())));
    let before = event.clone();

    run(barrel_config(), &mut event).unwrap();

    assert_eq!(event, before);
}

#[test]
fn test_existing_output_name_is_an_error() {
    let mut event = event_with_hits();
    let config = barrel_config().with_outputs(OUTER_BARREL_HITS, "Unused");

    let result = run(config, &mut event);

    assert!(matches!(
        result,
        Err(ExtrapolationError::DuplicateCollection { ref name }) if name == OUTER_BARREL_HITS
    ));
}

#[test]
fn test_existing_leftover_name_leaves_event_unwritten() {
    let mut event = event_with_hits().with_collection("Unused", Collection::Hits(collection(Vec::new())));
    let before = event.clone();
    let config = barrel_config().with_outputs("Extended", "Unused");
    let mut driver = EventDriver::new(config, &geometry(), ScriptedFitSystem::new(script())).unwrap();

    let result = driver.process_event(&mut event);

    assert!(matches!(
        result,
        Err(ExtrapolationError::DuplicateCollection { ref name }) if name == "Unused"
    ));
    assert_eq!(event, before);
    assert!(event.extended_tracks("Extended").is_none());
    assert_eq!(driver.statistics().events, 0);
}

#[test]
fn test_config_from_json_drives_run() {
    let json = format!(
        r#"{{
            "inputTrackCollection": "{}",
            "hitCollections": ["{}"],
            "subdetectorNames": ["{}"],
            "outputTrackCollection": "FromJson",
            "maxChi2Increment": 1.0
        }}"#,
        SEEDS, OUTER_BARREL_HITS, OUTER_BARREL
    );
    let config = ExtrapolationConfig::from_json_str(&json).unwrap();
    let mut event = event_with_hits();

    run(config, &mut event).unwrap();

    // Hit 100 scores 2.0, above the configured cut
    let tracks = event.extended_tracks("FromJson").unwrap();
    assert_eq!(tracks[0].added_hits, 0);
    assert_eq!(tracks[0].outliers.len(), 1);
    assert!(event.hits("NotUsedHits").unwrap().hits.iter().all(|h| h.id != HitId(100)));
}
