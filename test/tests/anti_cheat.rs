use pitlane_client::{DisconnectEvent as ClientDisconnectEvent, PlayerLeftEvent};
use pitlane_server::{
    CarStateEvent, CheatEvent, DisconnectEvent as ServerDisconnectEvent, ServerConfig,
};
use pitlane_shared::{Controls, GoodbyeReason, Vec2};
use pitlane_test::Session;

const THROTTLE: Controls = Controls {
    turn: 0.0,
    accelerate: true,
    brake: false,
};

/// Cycles through throttle, braking and coasting with changing steering so
/// the server sees plenty of input changes and heartbeats.
fn driving_pattern(step: u32) -> Controls {
    match (step / 40) % 3 {
        0 => Controls {
            turn: 0.6,
            accelerate: true,
            brake: false,
        },
        1 => Controls {
            turn: -0.3,
            accelerate: false,
            brake: true,
        },
        _ => Controls {
            turn: 0.0,
            accelerate: false,
            brake: false,
        },
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn honest_driver_is_never_flagged() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;

    let mut accepted = 0;
    for step in 0..300 {
        session.tick(&mut a, driving_pattern(step));
        let mut events = session.serve();
        assert!(!events.has::<CheatEvent>(), "flagged at step {}", step);
        accepted += events.read::<CarStateEvent>().count();
        session.clock.advance(16);
    }

    assert!(a.is_connected());
    assert_eq!(session.server.users_count(), 1);
    // every input change plus the heartbeats
    assert!(accepted >= 8, "only {} states accepted", accepted);

    let key = session.server.user_key_by_name("a").unwrap();
    let shadow = session.server.user(&key).unwrap().shadow().clone();
    let car = a.local_car().unwrap();
    assert!(shadow.iteration <= car.iteration);
}

#[tokio::test(flavor = "multi_thread")]
async fn teleporting_without_a_collision_gets_kicked() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    let mut b = session.join("b").await;
    session.round(&mut [&mut a, &mut b]);

    for _ in 0..10 {
        session.tick(&mut a, THROTTLE);
        session.serve();
    }

    if let Some(car) = a.local_car_mut() {
        car.position.x += 5.0;
    }
    // an input change forces the doctored state out
    session.tick(&mut a, Controls::IDLE);
    let mut events = session.serve();

    let cheats: Vec<_> = events.read::<CheatEvent>().collect();
    assert_eq!(cheats.len(), 1);
    assert_eq!(cheats[0].1, "a");
    assert!(cheats[0].2.deviation().unwrap() > 4.0);

    let gone: Vec<_> = events.read::<ServerDisconnectEvent>().collect();
    assert_eq!(gone.len(), 1);
    assert_eq!(gone[0].2, Some(GoodbyeReason::Cheating));
    assert_eq!(session.server.users_count(), 1);

    let mut events = session.tick(&mut a, Controls::IDLE);
    let reasons: Vec<_> = events.read::<ClientDisconnectEvent>().collect();
    assert_eq!(reasons, vec![Some(GoodbyeReason::Cheating)]);
    assert!(!a.is_connected());
    assert_eq!(a.goodbye_reason(), Some(GoodbyeReason::Cheating));

    let mut events = session.tick(&mut b, Controls::IDLE);
    assert!(events.read::<PlayerLeftEvent>().any(|name| name == "a"));
    assert!(b.car("a").is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn collision_flag_exempts_a_jump() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    session.round(&mut [&mut a]);

    let target = Vec2::new(70.0, 40.0);
    session.teleport(&mut a, target);
    let mut events = session.serve();
    assert!(!events.has::<CheatEvent>());

    let states: Vec<_> = events.read::<CarStateEvent>().collect();
    assert_eq!(states.len(), 1);
    assert!(states[0].1.after_collision);
    let key = session.server.user_key_by_name("a").unwrap();
    assert_eq!(session.server.user(&key).unwrap().shadow().position, target);

    // the jump is the new baseline for honest driving
    for step in 0..100 {
        session.tick(&mut a, driving_pattern(step));
        let events = session.serve();
        assert!(!events.has::<CheatEvent>());
    }
    assert!(a.is_connected());
}

#[tokio::test(flavor = "multi_thread")]
async fn loose_tolerance_lets_small_drift_through() {
    let mut session = Session::new(ServerConfig {
        position_tolerance: 10.0,
        ..Default::default()
    });
    let mut a = session.join("a").await;
    session.round(&mut [&mut a]);

    if let Some(car) = a.local_car_mut() {
        car.position.y += 3.0;
    }
    session.tick(&mut a, THROTTLE);
    let events = session.serve();
    assert!(!events.has::<CheatEvent>());
    assert!(events.has::<CarStateEvent>());
}
