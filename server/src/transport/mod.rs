cfg_if! {
    if #[cfg(feature = "transport_tcp")] {
        pub mod tcp;
    } else {}
}

pub use inner::{PacketReceiver, PacketSender, RecvError, SendError, Socket};

mod inner {

    use std::{io, net::SocketAddr};

    #[derive(Debug)]
    pub struct SendError;

    #[derive(Debug)]
    pub struct RecvError;

    pub trait Socket {
        /// Starts accepting clients, splitting the socket into its halves
        fn listen(self: Box<Self>)
            -> io::Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>)>;
    }

    pub trait PacketSender: Send + Sync {
        /// Sends a packet from the Server Socket to a connected client
        fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError>;
        /// Closes the connection to a client; unknown addresses are ignored
        fn disconnect(&self, address: &SocketAddr);
    }

    pub trait PacketReceiver: Send + Sync {
        /// Receives a packet from the Server Socket
        fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError>;
        /// Addresses whose connection dropped since the last call
        fn take_disconnections(&mut self) -> Vec<SocketAddr>;
    }
}
