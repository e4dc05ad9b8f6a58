use pitlane_client::{Client, ClientEvents, LapEvent, RaceStartEvent, RaceStateEvent};
use pitlane_server::{CheatEvent, ServerConfig};
use pitlane_shared::{Controls, Level, RaceState};
use pitlane_test::{Session, TestLevel};

const THROTTLE: Controls = Controls {
    turn: 0.0,
    accelerate: true,
    brake: false,
};

fn record(log: &mut Vec<(RaceState, RaceState)>, mut events: ClientEvents) {
    log.extend(events.read::<RaceStateEvent>());
}

/// Drives `driver` through `laps` full laps by jumping from checkpoint to
/// checkpoint, letting the server relay every jump to `watcher`.
fn drive_laps(
    session: &mut Session,
    driver: &mut Client,
    watcher: Option<&mut Client>,
    laps: usize,
    driver_log: &mut Vec<(RaceState, RaceState)>,
    watcher_log: &mut Vec<(RaceState, RaceState)>,
) -> Vec<(String, u32)> {
    let mut completed = Vec::new();
    let mut watcher = watcher;
    for _ in 0..laps {
        for point in TestLevel::lap_points() {
            session.clock.advance(500);
            let mut events = session.teleport(driver, point);
            completed.extend(events.read::<LapEvent>().map(|(name, lap, time)| {
                assert!(time.is_some());
                (name, lap)
            }));
            record(driver_log, events);

            let server_events = session.serve();
            assert!(!server_events.has::<CheatEvent>());

            if let Some(watcher) = watcher.as_deref_mut() {
                let events = session.tick(watcher, Controls::IDLE);
                record(watcher_log, events);
            }
        }
    }
    completed
}

#[tokio::test(flavor = "multi_thread")]
async fn race_start_holds_cars_on_the_grid() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    let mut b = session.join("b").await;
    session.round(&mut [&mut a, &mut b]);

    session.server.start_race(3, 3_000, &session.level).unwrap();
    let start_ms = session.clock.now() + 3_000;

    let mut events = session.tick(&mut a, THROTTLE);
    let starts: Vec<_> = events.read::<RaceStartEvent>().collect();
    assert_eq!(starts, vec![(3, start_ms)]);
    let states: Vec<_> = events.read::<RaceStateEvent>().collect();
    assert_eq!(states, vec![(RaceState::Standby, RaceState::Pending)]);
    session.tick(&mut b, Controls::IDLE);

    let grid_a = session.level.start_slot(0).position;
    let grid_b = session.level.start_slot(1).position;
    assert_eq!(a.local_car().unwrap().position, grid_a);
    assert_eq!(b.local_car().unwrap().position, grid_b);
    assert!(a.local_car().unwrap().locked);
    assert_eq!(a.local_car().unwrap().lap, 1);

    // flooring it during the countdown goes nowhere
    for _ in 0..20 {
        session.tick(&mut a, THROTTLE);
        let events = session.serve();
        assert!(!events.has::<CheatEvent>());
        session.clock.advance(100);
    }
    assert_eq!(a.local_car().unwrap().position, grid_a);
    assert_eq!(a.race().state(), RaceState::Pending);

    session.clock.advance(1_000);
    let mut events = session.tick(&mut a, THROTTLE);
    let states: Vec<_> = events.read::<RaceStateEvent>().collect();
    assert_eq!(states, vec![(RaceState::Pending, RaceState::Running)]);
    assert!(!a.local_car().unwrap().locked);

    for _ in 0..30 {
        session.tick(&mut a, THROTTLE);
        let events = session.serve();
        assert!(!events.has::<CheatEvent>());
    }
    assert!(a.local_car().unwrap().position.x > grid_a.x);
    assert!(a.is_connected());
}

#[tokio::test(flavor = "multi_thread")]
async fn two_player_race_runs_to_the_end() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    let mut b = session.join("b").await;
    session.round(&mut [&mut a, &mut b]);

    let mut a_log = Vec::new();
    let mut b_log = Vec::new();

    session.server.start_race(3, 3_000, &session.level).unwrap();
    let (_, events) = session.round(&mut [&mut a, &mut b]);
    let mut events = events.into_iter();
    for client_events in events.next().into_iter().flatten() {
        record(&mut a_log, client_events);
    }
    for client_events in events.next().into_iter().flatten() {
        record(&mut b_log, client_events);
    }
    assert_eq!(a.race().state(), RaceState::Pending);

    session.clock.advance(3_000);
    let (_, events) = session.round(&mut [&mut a, &mut b]);
    let mut events = events.into_iter();
    for client_events in events.next().into_iter().flatten() {
        record(&mut a_log, client_events);
    }
    for client_events in events.next().into_iter().flatten() {
        record(&mut b_log, client_events);
    }
    assert_eq!(a.race().state(), RaceState::Running);
    assert_eq!(b.race().state(), RaceState::Running);

    let laps = drive_laps(&mut session, &mut a, Some(&mut b), 3, &mut a_log, &mut b_log);
    let own_laps: Vec<_> = laps.iter().filter(|(name, _)| name == "a").collect();
    assert_eq!(own_laps.len(), 3);
    assert_eq!(own_laps.last().map(|(_, lap)| *lap), Some(3));

    assert_eq!(a.race().state(), RaceState::FinishedSingle);
    assert!(a.race().finish_ms().is_some());
    assert_eq!(b.race().state(), RaceState::Running);
    assert_eq!(b.progress("a").unwrap().lap(), 4);

    drive_laps(&mut session, &mut b, Some(&mut a), 3, &mut b_log, &mut a_log);

    assert_eq!(a.race().state(), RaceState::FinishedAll);
    assert_eq!(b.race().state(), RaceState::FinishedAll);

    let expected = vec![
        (RaceState::Standby, RaceState::Pending),
        (RaceState::Pending, RaceState::Running),
        (RaceState::Running, RaceState::FinishedSingle),
        (RaceState::FinishedSingle, RaceState::FinishedAll),
    ];
    assert_eq!(a_log, expected);
    assert_eq!(b_log, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn departed_player_is_not_waited_for() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    let mut b = session.join("b").await;
    session.round(&mut [&mut a, &mut b]);

    session.server.start_race(1, 1_000, &session.level).unwrap();
    session.round(&mut [&mut a, &mut b]);
    session.clock.advance(1_000);
    session.round(&mut [&mut a, &mut b]);
    assert_eq!(a.race().state(), RaceState::Running);

    b.disconnect();
    session.serve();
    session.tick(&mut a, Controls::IDLE);
    assert!(!a.race().is_registered("b"));

    let mut a_log = Vec::new();
    let mut unused = Vec::new();
    drive_laps(&mut session, &mut a, None, 1, &mut a_log, &mut unused);

    assert_eq!(
        a_log,
        vec![
            (RaceState::Running, RaceState::FinishedSingle),
            (RaceState::FinishedSingle, RaceState::FinishedAll),
        ]
    );
}
