//! In-memory transport for end-to-end tests.
//! Routes packets between one server and any number of clients without
//! network I/O. Each direction is a tokio unbounded channel, so ordering is
//! preserved per connection just like on a stream socket.
use std::{
    collections::HashMap,
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
};

use tokio::sync::mpsc::{
    error::TryRecvError, unbounded_channel, UnboundedReceiver, UnboundedSender,
};

use pitlane_client::transport::{
    PacketReceiver as ClientPacketReceiver, PacketSender as ClientPacketSender, RecvError,
    SendError, Socket as ClientSocket,
};
use pitlane_server::transport::{
    PacketReceiver as ServerPacketReceiver, PacketSender as ServerPacketSender,
    RecvError as ServerRecvError, SendError as ServerSendError, Socket as ServerSocket,
};

const FIRST_CLIENT_PORT: u16 = 20_000;

type Datagram = (SocketAddr, Vec<u8>);

struct HubState {
    to_server: UnboundedSender<Datagram>,
    server_inbox: Option<UnboundedReceiver<Datagram>>,
    to_clients: HashMap<SocketAddr, UnboundedSender<Vec<u8>>>,
    /// Clients that hung up on their own
    hung_up: Vec<SocketAddr>,
    next_port: u16,
    refuse_connections: bool,
}

/// One server endpoint plus a factory for client endpoints that reach it.
#[derive(Clone)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHub {
    pub fn new() -> Self {
        let (to_server, server_inbox) = unbounded_channel();
        Self {
            state: Arc::new(Mutex::new(HubState {
                to_server,
                server_inbox: Some(server_inbox),
                to_clients: HashMap::new(),
                hung_up: Vec::new(),
                next_port: FIRST_CLIENT_PORT,
                refuse_connections: false,
            })),
        }
    }

    /// The server's side. Only the first socket taken can listen.
    pub fn server_socket(&self) -> Box<dyn ServerSocket> {
        Box::new(LocalServerSocket { hub: self.clone() })
    }

    /// A fresh client endpoint; each connects from its own address.
    pub fn client_socket(&self) -> Box<dyn ClientSocket> {
        Box::new(LocalClientSocket { hub: self.clone() })
    }

    /// Makes every later client connect fail, as if nothing listened.
    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    /// Addresses of clients the server has not dropped.
    pub fn connected_clients(&self) -> Vec<SocketAddr> {
        let mut clients: Vec<SocketAddr> = self.lock().to_clients.keys().copied().collect();
        clients.sort();
        clients
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// Server side

struct LocalServerSocket {
    hub: LocalHub,
}

impl ServerSocket for LocalServerSocket {
    fn listen(
        self: Box<Self>,
    ) -> io::Result<(Box<dyn ServerPacketSender>, Box<dyn ServerPacketReceiver>)> {
        let Some(inbox) = self.hub.lock().server_inbox.take() else {
            return Err(io::Error::new(
                io::ErrorKind::AddrInUse,
                "a server already listens on this hub",
            ));
        };
        let sender = LocalServerSender {
            hub: self.hub.clone(),
        };
        let receiver = LocalServerReceiver {
            hub: self.hub,
            inbox,
            current: None,
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

struct LocalServerSender {
    hub: LocalHub,
}

impl ServerPacketSender for LocalServerSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), ServerSendError> {
        let state = self.hub.lock();
        let client = state.to_clients.get(address).ok_or(ServerSendError)?;
        client.send(payload.to_vec()).map_err(|_| ServerSendError)
    }

    fn disconnect(&self, address: &SocketAddr) {
        // dropping the sender closes the client's receiving end once it has
        // drained what is already queued
        self.hub.lock().to_clients.remove(address);
    }
}

struct LocalServerReceiver {
    hub: LocalHub,
    inbox: UnboundedReceiver<Datagram>,
    current: Option<Vec<u8>>,
}

impl ServerPacketReceiver for LocalServerReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, ServerRecvError> {
        match self.inbox.try_recv() {
            Ok((address, payload)) => {
                let payload = self.current.insert(payload);
                Ok(Some((address, &payload[..])))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ServerRecvError),
        }
    }

    fn take_disconnections(&mut self) -> Vec<SocketAddr> {
        std::mem::take(&mut self.hub.lock().hung_up)
    }
}

// Client side

struct LocalClientSocket {
    hub: LocalHub,
}

impl ClientSocket for LocalClientSocket {
    fn connect(
        self: Box<Self>,
    ) -> io::Result<(Box<dyn ClientPacketSender>, Box<dyn ClientPacketReceiver>)> {
        let mut state = self.hub.lock();
        if state.refuse_connections || state.server_inbox.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "no server is listening",
            ));
        }

        let address = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), state.next_port);
        state.next_port += 1;

        let (to_client, inbox) = unbounded_channel();
        state.to_clients.insert(address, to_client);
        let to_server = state.to_server.clone();
        drop(state);

        let sender = LocalClientSender {
            hub: self.hub,
            address,
            to_server,
        };
        let receiver = LocalClientReceiver {
            inbox,
            current: None,
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

struct LocalClientSender {
    hub: LocalHub,
    address: SocketAddr,
    to_server: UnboundedSender<Datagram>,
}

impl ClientPacketSender for LocalClientSender {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        self.to_server
            .send((self.address, payload.to_vec()))
            .map_err(|_| SendError)
    }

    fn disconnect(&self) {
        let mut state = self.hub.lock();
        if state.to_clients.remove(&self.address).is_some() {
            state.hung_up.push(self.address);
        }
    }
}

struct LocalClientReceiver {
    inbox: UnboundedReceiver<Vec<u8>>,
    current: Option<Vec<u8>>,
}

impl ClientPacketReceiver for LocalClientReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, RecvError> {
        match self.inbox.try_recv() {
            Ok(payload) => {
                let payload = self.current.insert(payload);
                Ok(Some(&payload[..]))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(RecvError),
        }
    }
}
