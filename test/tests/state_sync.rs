use pitlane_server::{CarStateEvent, CheatEvent, ServerConfig};
use pitlane_shared::{physics, Controls, SimulationConfig};
use pitlane_test::Session;

fn weaving(step: u32) -> Controls {
    Controls {
        turn: if (step / 15) % 2 == 0 { 0.8 } else { -0.8 },
        accelerate: step % 50 < 35,
        brake: step % 50 >= 45,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_car_extrapolates_like_its_owner() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    let mut b = session.join("b").await;
    session.round(&mut [&mut a, &mut b]);

    let simulation = SimulationConfig::default();
    for step in 0..150 {
        session.tick(&mut a, weaving(step));
        session.serve();
        session.tick(&mut b, Controls::IDLE);

        // b has stepped its copy once more than a has stepped the original
        let mine = a.local_car().unwrap();
        let expected = physics::update(
            mine,
            &mine.controls,
            &session.level,
            simulation.tick_ms,
            &simulation.physics,
        );
        let seen = b.car("a").unwrap();
        assert_eq!(seen.iteration, expected.iteration, "step {}", step);
        assert_eq!(seen.position, expected.position, "step {}", step);
        assert_eq!(seen.controls, mine.controls, "step {}", step);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn steady_input_only_sends_heartbeats() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    session.round(&mut [&mut a]);

    let cruise = Controls {
        turn: 0.2,
        accelerate: true,
        brake: false,
    };
    let heartbeat = SimulationConfig::default().heartbeat_ticks;

    let mut received = 0;
    for _ in 0..(2 * heartbeat + 5) {
        session.tick(&mut a, cruise);
        let mut events = session.serve();
        assert!(!events.has::<CheatEvent>());
        received += events.read::<CarStateEvent>().count();
    }

    // the input change, then one heartbeat per interval
    assert_eq!(received, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn relayed_states_carry_the_owner_name() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    let mut b = session.join("b").await;
    session.round(&mut [&mut a, &mut b]);

    session.tick(
        &mut b,
        Controls {
            turn: 0.0,
            accelerate: true,
            brake: false,
        },
    );
    let mut events = session.serve();
    let states: Vec<_> = events.read::<CarStateEvent>().collect();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].1.owner, "b");
    let key = session.server.user_key_by_name("b").unwrap();
    assert_eq!(states[0].0, key);

    session.tick(&mut a, Controls::IDLE);
    let seen = a.car("b").unwrap();
    assert!(seen.controls.accelerate);
    assert!(a.local_car().unwrap().iteration > 0);
}
