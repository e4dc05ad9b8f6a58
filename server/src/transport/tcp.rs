use std::{
    collections::{HashMap, VecDeque},
    io::{self, ErrorKind, Read},
    net::{Shutdown, SocketAddr, TcpListener, TcpStream},
    sync::{Arc, Mutex},
};

use log::{info, warn};

use pitlane_shared::{FrameBuffer, FrameQueue};

use super::{
    PacketReceiver, PacketSender as TransportSender, RecvError, SendError,
    Socket as TransportSocket,
};

const READ_CHUNK_SIZE: usize = 4096;

struct Connection {
    stream: TcpStream,
    frames: FrameBuffer,
    outgoing: FrameQueue,
}

impl Connection {
    /// Pushes out what the peer has room for. A failure shuts the stream
    /// down, so the receiver reports the peer gone on its next read.
    fn flush(&mut self, address: &SocketAddr) -> Result<(), SendError> {
        if let Err(error) = self.outgoing.flush_into(&mut self.stream) {
            warn!("TCP: write to {} failed: {}", address, error);
            let _ = self.stream.shutdown(Shutdown::Both);
            return Err(SendError);
        }
        Ok(())
    }
}

type ConnectionMap = Arc<Mutex<HashMap<SocketAddr, Connection>>>;

// Socket
pub struct Socket {
    listen_addr: SocketAddr,
}

impl Socket {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self { listen_addr }
    }
}

impl TransportSocket for Socket {
    fn listen(
        self: Box<Self>,
    ) -> io::Result<(Box<dyn TransportSender>, Box<dyn PacketReceiver>)> {
        let connections: ConnectionMap = Arc::new(Mutex::new(HashMap::new()));

        let listener = TcpListener::bind(self.listen_addr)?;
        listener.set_nonblocking(true)?;
        info!("TCP: listening on {}", listener.local_addr()?);

        let sender = TcpPacketSender {
            connections: connections.clone(),
        };
        let receiver = TcpPacketReceiver {
            listener,
            connections,
            incoming: VecDeque::new(),
            disconnections: Vec::new(),
            current_payload: None,
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

// Sender
struct TcpPacketSender {
    connections: ConnectionMap,
}

impl TransportSender for TcpPacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        let mut connections = self.connections.lock().map_err(|_| SendError)?;
        let connection = connections.get_mut(address).ok_or(SendError)?;
        if let Err(error) = connection.outgoing.push(payload) {
            warn!("TCP: dropping {}: {}", address, error);
            let _ = connection.stream.shutdown(Shutdown::Both);
            return Err(SendError);
        }
        connection.flush(address)
    }

    fn disconnect(&self, address: &SocketAddr) {
        let Ok(mut connections) = self.connections.lock() else {
            return;
        };
        if let Some(connection) = connections.remove(address) {
            let _ = connection.stream.shutdown(Shutdown::Both);
        }
    }
}

// Receiver
struct TcpPacketReceiver {
    listener: TcpListener,
    connections: ConnectionMap,
    incoming: VecDeque<(SocketAddr, Box<[u8]>)>,
    disconnections: Vec<SocketAddr>,
    current_payload: Option<Box<[u8]>>,
}

impl TcpPacketReceiver {
    fn accept_new(&mut self, connections: &mut HashMap<SocketAddr, Connection>) {
        loop {
            match self.listener.accept() {
                Ok((stream, address)) => {
                    if let Err(error) = stream.set_nonblocking(true) {
                        warn!("TCP: dropping {}, cannot go non-blocking: {}", address, error);
                        continue;
                    }
                    let _ = stream.set_nodelay(true);
                    connections.insert(
                        address,
                        Connection {
                            stream,
                            frames: FrameBuffer::new(),
                            outgoing: FrameQueue::new(),
                        },
                    );
                }
                Err(error) if error.kind() == ErrorKind::WouldBlock => break,
                Err(error) => {
                    warn!("TCP: accept failed: {}", error);
                    break;
                }
            }
        }
    }

    fn poll(&mut self) -> Result<(), RecvError> {
        let connections = self.connections.clone();
        let mut connections = connections.lock().map_err(|_| RecvError)?;

        self.accept_new(&mut connections);

        let mut closed = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        for (address, connection) in connections.iter_mut() {
            if !connection.outgoing.is_empty() {
                let _ = connection.flush(address);
            }
            loop {
                match connection.stream.read(&mut chunk) {
                    Ok(0) => {
                        closed.push(*address);
                        break;
                    }
                    Ok(read) => connection.frames.extend(&chunk[..read]),
                    Err(error) if error.kind() == ErrorKind::WouldBlock => break,
                    Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => {
                        closed.push(*address);
                        break;
                    }
                }
            }
            while let Some(frame) = connection.frames.next_frame() {
                self.incoming.push_back((*address, frame));
            }
        }

        for address in closed {
            connections.remove(&address);
            self.disconnections.push(address);
        }
        Ok(())
    }
}

impl PacketReceiver for TcpPacketReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        if self.incoming.is_empty() {
            self.poll()?;
        }
        match self.incoming.pop_front() {
            Some((address, payload)) => {
                let payload = self.current_payload.insert(payload);
                Ok(Some((address, &payload[..])))
            }
            None => Ok(None),
        }
    }

    fn take_disconnections(&mut self) -> Vec<SocketAddr> {
        std::mem::take(&mut self.disconnections)
    }
}
