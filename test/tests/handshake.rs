use std::time::Duration;

use pitlane_client::{
    Client, ClientConfig, DisconnectEvent as ClientDisconnectEvent, PlayerJoinedEvent,
    PlayerLeftEvent,
};
use pitlane_server::{
    ConnectEvent as ServerConnectEvent, DisconnectEvent as ServerDisconnectEvent, ServerConfig,
};
use pitlane_shared::{Controls, GameModeKind, GoodbyeReason, ProtocolVersion};
use pitlane_test::Session;

#[tokio::test(flavor = "multi_thread")]
async fn client_joins_and_learns_the_game() {
    let mut session = Session::new(ServerConfig {
        level_id: String::from("harbour"),
        game_mode: GameModeKind::TimeTrial,
        ..Default::default()
    });

    let client = session.join("ayrton").await;

    assert!(client.is_connected());
    assert_eq!(client.game_mode(), Some(GameModeKind::TimeTrial));
    assert_eq!(client.level_id(), Some("harbour"));
    assert!(client.local_car().is_some());
    assert_eq!(session.server.users_count(), 1);
    let key = session.server.user_key_by_name("ayrton").unwrap();
    assert_eq!(session.server.user(&key).unwrap().name(), "ayrton");
}

#[tokio::test(flavor = "multi_thread")]
async fn server_reports_new_connections() {
    let mut session = Session::new(ServerConfig::default());
    let mut client = Client::new(Session::client_config("nelson"));
    client.connect(session.hub.client_socket()).unwrap();

    let mut connected = Vec::new();
    for _ in 0..500 {
        session.tick(&mut client, Controls::IDLE);
        let mut events = session.serve();
        connected.extend(events.read::<ServerConnectEvent>());
        if !connected.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    assert_eq!(connected.len(), 1);
    assert_eq!(connected[0].1, "nelson");
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_name_is_refused() {
    let mut session = Session::new(ServerConfig::default());
    let _first = session.join("ayrton").await;

    let second = session.join_with(Session::client_config("ayrton")).await;
    assert_eq!(second.err(), Some(Some(GoodbyeReason::NameInUse)));
    assert_eq!(session.server.users_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn protocol_mismatch_is_refused() {
    let mut session = Session::new(ServerConfig::default());
    let config = ClientConfig {
        protocol: ProtocolVersion { major: 0, minor: 9 },
        ..Session::client_config("retro")
    };

    let result = session.join_with(config).await;
    assert_eq!(result.err(), Some(Some(GoodbyeReason::UnsupportedProtocol)));
    assert_eq!(session.server.users_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_name_is_refused() {
    let mut session = Session::new(ServerConfig::default());
    let result = session.join_with(Session::client_config("  ")).await;
    assert_eq!(result.err(), Some(Some(GoodbyeReason::InvalidName)));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_fails_the_connect() {
    let mut session = Session::new(ServerConfig::default());
    session.hub.refuse_connections(true);

    let result = session.join_with(Session::client_config("lost")).await;
    assert_eq!(result.err(), Some(None));
}

#[tokio::test(flavor = "multi_thread")]
async fn players_learn_about_each_other() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    // let the server accept a's first state so the game state carries it
    session.round(&mut [&mut a]);

    let mut b = session.join("b").await;
    assert!(b.car("a").is_ok());

    let mut events = session.tick(&mut a, Controls::IDLE);
    let joined: Vec<String> = events.read::<PlayerJoinedEvent>().collect();
    assert_eq!(joined, vec!["b".to_string()]);
    assert!(a.car("b").is_ok());

    let mut names: Vec<&str> = b.player_names().collect();
    names.sort();
    assert_eq!(names, vec!["a", "b"]);
    session.round(&mut [&mut a, &mut b]);
}

#[tokio::test(flavor = "multi_thread")]
async fn leaving_player_is_removed_everywhere() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    let mut b = session.join("b").await;
    session.round(&mut [&mut a, &mut b]);

    a.disconnect();
    assert!(!a.is_connected());

    let mut events = session.serve();
    let gone: Vec<_> = events.read::<ServerDisconnectEvent>().collect();
    assert_eq!(gone.len(), 1);
    assert_eq!(gone[0].1, "a");
    assert_eq!(gone[0].2, None);
    assert_eq!(session.server.users_count(), 1);

    let mut events = session.tick(&mut b, Controls::IDLE);
    let left: Vec<String> = events.read::<PlayerLeftEvent>().collect();
    assert_eq!(left, vec!["a".to_string()]);
    assert!(b.car("a").is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_says_goodbye_to_everyone() {
    let mut session = Session::new(ServerConfig::default());
    let mut a = session.join("a").await;
    let mut b = session.join("b").await;

    session.server.shutdown();
    assert_eq!(session.server.users_count(), 0);

    for client in [&mut a, &mut b] {
        let mut events = session.tick(client, Controls::IDLE);
        let reasons: Vec<_> = events.read::<ClientDisconnectEvent>().collect();
        assert_eq!(reasons, vec![Some(GoodbyeReason::ServerShutdown)]);
        assert!(!client.is_connected());
        assert_eq!(client.goodbye_reason(), Some(GoodbyeReason::ServerShutdown));
    }
    assert!(session.hub.connected_clients().is_empty());
}
