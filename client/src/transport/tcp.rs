use std::{
    collections::VecDeque,
    io::{self, ErrorKind, Read},
    net::{Shutdown, SocketAddr, TcpStream},
    sync::{Arc, Mutex},
    time::Duration,
};

use log::{info, warn};

use pitlane_shared::{FrameBuffer, FrameQueue};

use super::{
    PacketReceiver as TransportReceiver, PacketSender as TransportSender, RecvError, SendError,
    Socket as TransportSocket,
};

const READ_CHUNK_SIZE: usize = 4096;

/// The write half with the bytes it has not taken yet
struct Outgoing {
    stream: TcpStream,
    queue: FrameQueue,
}

impl Outgoing {
    fn flush(&mut self) -> Result<(), SendError> {
        if let Err(error) = self.queue.flush_into(&mut self.stream) {
            warn!("TCP: write to server failed: {}", error);
            let _ = self.stream.shutdown(Shutdown::Both);
            return Err(SendError);
        }
        Ok(())
    }
}

// Socket
pub struct Socket {
    server_addr: SocketAddr,
    timeout: Duration,
}

impl Socket {
    pub fn new(server_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            server_addr,
            timeout,
        }
    }
}

impl TransportSocket for Socket {
    fn connect(
        self: Box<Self>,
    ) -> io::Result<(Box<dyn TransportSender>, Box<dyn TransportReceiver>)> {
        let stream = TcpStream::connect_timeout(&self.server_addr, self.timeout)?;
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;
        let write_half = stream.try_clone()?;

        info!("TCP: connected to {}", self.server_addr);

        let outgoing = Arc::new(Mutex::new(Outgoing {
            stream: write_half,
            queue: FrameQueue::new(),
        }));
        let sender = PacketSender {
            outgoing: outgoing.clone(),
        };
        let receiver = PacketReceiver {
            stream,
            outgoing,
            frames: FrameBuffer::new(),
            incoming: VecDeque::new(),
            current_payload: None,
            closed: false,
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

// Sender
struct PacketSender {
    outgoing: Arc<Mutex<Outgoing>>,
}

impl TransportSender for PacketSender {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        let mut outgoing = self.outgoing.lock().map_err(|_| SendError)?;
        if let Err(error) = outgoing.queue.push(payload) {
            warn!("TCP: giving up on the server: {}", error);
            let _ = outgoing.stream.shutdown(Shutdown::Both);
            return Err(SendError);
        }
        outgoing.flush()
    }

    fn disconnect(&self) {
        if let Ok(outgoing) = self.outgoing.lock() {
            let _ = outgoing.stream.shutdown(Shutdown::Both);
        }
    }
}

// Receiver
struct PacketReceiver {
    stream: TcpStream,
    outgoing: Arc<Mutex<Outgoing>>,
    frames: FrameBuffer,
    incoming: VecDeque<Box<[u8]>>,
    current_payload: Option<Box<[u8]>>,
    closed: bool,
}

impl PacketReceiver {
    fn poll(&mut self) {
        if let Ok(mut outgoing) = self.outgoing.lock() {
            if !outgoing.queue.is_empty() {
                let _ = outgoing.flush();
            }
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.closed = true;
                    break;
                }
                Ok(read) => self.frames.extend(&chunk[..read]),
                Err(error) if error.kind() == ErrorKind::WouldBlock => break,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(_) => {
                    self.closed = true;
                    break;
                }
            }
        }
        while let Some(frame) = self.frames.next_frame() {
            self.incoming.push_back(frame);
        }
    }
}

impl TransportReceiver for PacketReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, RecvError> {
        if self.incoming.is_empty() && !self.closed {
            self.poll();
        }
        match self.incoming.pop_front() {
            Some(payload) => {
                let payload = self.current_payload.insert(payload);
                Ok(Some(&payload[..]))
            }
            // hand out everything that arrived before the close first
            None if self.closed => Err(RecvError),
            None => Ok(None),
        }
    }
}
