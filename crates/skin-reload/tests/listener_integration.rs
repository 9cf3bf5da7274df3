//! # Listener Integration Tests
//!
//! Drive a real listener over TCP and run the registered dispatcher the way a
//! host frame would: on the test's own thread, after the HTTP call returned.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use skin_reload::{
    ConnectionState, HostSession, RefreshError, ReloadConfig, ReloadListener, SessionRegistry,
    TickScheduler,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;

const STEAM_ID: &str = "76561197960287930";

#[derive(Debug, Clone)]
struct Player {
    steam_id: String,
    name: String,
    state: ConnectionState,
}

impl HostSession for Player {
    fn identity(&self) -> &str {
        &self.steam_id
    }
    fn connection_state(&self) -> ConnectionState {
        self.state
    }
    fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Default)]
struct Players(Rc<RefCell<Vec<Player>>>);

impl Players {
    fn connect(&self, steam_id: &str, name: &str) {
        self.0.borrow_mut().push(Player {
            steam_id: steam_id.to_string(),
            name: name.to_string(),
            state: ConnectionState::Connected,
        });
    }
}

impl SessionRegistry for Players {
    type Session = Player;

    fn live_sessions(&self) -> Vec<Player> {
        self.0.borrow().clone()
    }
}

/// Host frame loop stand-in.
#[derive(Default)]
struct Frames {
    callbacks: Vec<Box<dyn FnMut()>>,
}

impl Frames {
    fn tick(&mut self) {
        for callback in &mut self.callbacks {
            callback();
        }
    }
}

impl TickScheduler for Frames {
    fn register_tick_callback(&mut self, callback: Box<dyn FnMut()>) {
        self.callbacks.push(callback);
    }
}

struct Harness {
    listener: ReloadListener,
    frames: Frames,
    players: Players,
    refreshed: Rc<RefCell<Vec<String>>>,
    addr: SocketAddr,
}

impl Harness {
    fn start() -> Self {
        let players = Players::default();
        let refreshed: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut frames = Frames::default();

        let log = Rc::clone(&refreshed);
        let refresh = move |player: &Player| -> Result<(), RefreshError> {
            log.borrow_mut().push(player.steam_id.clone());
            Ok(())
        };

        let mut listener =
            ReloadListener::new(ReloadConfig::ephemeral(), Handle::current()).unwrap();
        let addr = listener
            .start(&mut frames, players.clone(), refresh)
            .unwrap();

        Self {
            listener,
            frames,
            players,
            refreshed,
            addr,
        }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    fn refreshed(&self) -> Vec<String> {
        self.refreshed.borrow().clone()
    }
}

async fn get(url: &str) -> (u16, String) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_queue_then_tick_refreshes_connected_player() {
    let mut h = Harness::start();
    h.players.connect(STEAM_ID, "alice");
    h.players.connect("76561197960287931", "bob");

    let (status, body) = get(&h.url(&format!("/update_skins?steamid={STEAM_ID}"))).await;
    assert_eq!(status, 200);
    assert_eq!(body, format!("Queued !wp for {STEAM_ID}\n"));

    // Nothing runs until the host ticks.
    assert!(h.refreshed().is_empty());
    h.frames.tick();
    assert_eq!(h.refreshed(), vec![STEAM_ID]);

    h.frames.tick();
    assert_eq!(h.refreshed(), vec![STEAM_ID]);

    h.listener.shutdown().await;
}

#[tokio::test]
async fn test_queue_then_tick_without_matching_player() {
    let mut h = Harness::start();
    h.players.connect("76561197960287931", "bob");

    let (status, _) = get(&h.url(&format!("/update_skins?steamid={STEAM_ID}"))).await;
    assert_eq!(status, 200);

    h.frames.tick();
    assert!(h.refreshed().is_empty());
    assert_eq!(h.listener.queue().pending(), 0);

    h.listener.shutdown().await;
}

#[tokio::test]
async fn test_bad_requests_never_enqueue() {
    let mut h = Harness::start();

    let (status, body) = get(&h.url("/update_skins")).await;
    assert_eq!((status, body.as_str()), (400, "Missing steamid parameter."));

    let (status, body) = get(&h.url("/update_skins?steamid=")).await;
    assert_eq!((status, body.as_str()), (400, "Missing steamid parameter."));

    let (status, body) = get(&h.url("/somewhere_else?steamid=1")).await;
    assert_eq!((status, body.as_str()), (404, ""));

    let client = reqwest::Client::new();
    let response = client
        .post(h.url("/update_skins?steamid=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    assert_eq!(h.listener.queue().pending(), 0);
    h.listener.shutdown().await;
}

#[tokio::test]
async fn test_single_caller_order_is_preserved() {
    let mut h = Harness::start();
    for id in ["a", "b", "c"] {
        h.players.connect(id, id);
    }

    for id in ["a", "b", "c"] {
        let (status, _) = get(&h.url(&format!("/update_skins?steamid={id}"))).await;
        assert_eq!(status, 200);
    }

    h.frames.tick();
    assert_eq!(h.refreshed(), vec!["a", "b", "c"]);

    h.listener.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_are_delivered_exactly_once() {
    const CALLERS: usize = 64;

    let mut h = Harness::start();
    for i in 0..CALLERS {
        h.players.connect(&format!("id-{i}"), "p");
    }

    let client = reqwest::Client::new();
    let requests: Vec<_> = (0..CALLERS)
        .map(|i| {
            let client = client.clone();
            let url = h.url(&format!("/update_skins?steamid=id-{i}"));
            tokio::spawn(async move { client.get(url).send().await.unwrap().status() })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap().as_u16(), 200);
    }

    // Every response was written after its enqueue, so all tokens are present.
    h.frames.tick();
    let mut refreshed = h.refreshed();
    assert_eq!(refreshed.len(), CALLERS);
    refreshed.sort();
    refreshed.dedup();
    assert_eq!(refreshed.len(), CALLERS);

    h.listener.shutdown().await;
}

#[tokio::test]
async fn test_malformed_traffic_does_not_stop_accept_loop() {
    let mut h = Harness::start();
    h.players.connect(STEAM_ID, "alice");

    // Garbage on the wire.
    let mut garbage = TcpStream::connect(h.addr).await.unwrap();
    garbage
        .write_all(b"\x00\x01 NOT HTTP AT ALL\r\n\r\n")
        .await
        .unwrap();
    let mut sink = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(2), garbage.read_to_end(&mut sink)).await;

    // Caller that hangs up mid-request.
    let mut aborted = TcpStream::connect(h.addr).await.unwrap();
    aborted
        .write_all(b"GET /update_skins?steamid=half")
        .await
        .unwrap();
    drop(aborted);

    let (status, _) = get(&h.url(&format!("/update_skins?steamid={STEAM_ID}"))).await;
    assert_eq!(status, 200);

    h.frames.tick();
    assert_eq!(h.refreshed(), vec![STEAM_ID]);

    h.listener.shutdown().await;
}

#[tokio::test]
async fn test_queued_tokens_survive_stop() {
    let mut h = Harness::start();
    h.players.connect(STEAM_ID, "alice");

    let (status, _) = get(&h.url(&format!("/update_skins?steamid={STEAM_ID}"))).await;
    assert_eq!(status, 200);

    h.listener.shutdown().await;
    assert!(TcpStream::connect(h.addr).await.is_err());

    h.frames.tick();
    assert_eq!(h.refreshed(), vec![STEAM_ID]);
}
