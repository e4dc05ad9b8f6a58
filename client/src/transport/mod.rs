cfg_if! {
    if #[cfg(feature = "transport_tcp")] {
        pub mod tcp;
    } else {}
}

pub use inner::{PacketReceiver, PacketSender, RecvError, SendError, Socket};

mod inner {

    use std::io;

    #[derive(Debug)]
    pub struct SendError;

    /// The connection is gone; nothing more will arrive
    #[derive(Debug)]
    pub struct RecvError;

    pub trait Socket: Send {
        /// Opens the connection to the server. May block, but must give up on
        /// its own: the client joins the call even after it stopped waiting
        fn connect(self: Box<Self>)
            -> io::Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>)>;
    }

    pub trait PacketSender: Send + Sync {
        /// Sends a packet from the Client Socket
        fn send(&self, payload: &[u8]) -> Result<(), SendError>;
        /// Closes the connection
        fn disconnect(&self);
    }

    pub trait PacketReceiver: Send + Sync {
        /// Receives a packet from the Client Socket
        fn receive(&mut self) -> Result<Option<&[u8]>, RecvError>;
    }
}
