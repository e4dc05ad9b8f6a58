use std::time::Duration;

use log::debug;
use tokio::{runtime::Handle, sync::oneshot, task::JoinError};

use crate::{
    transport::{PacketReceiver, PacketSender, Socket},
    PitlaneClientError,
};

pub(crate) type Io = (Box<dyn PacketSender>, Box<dyn PacketReceiver>);

pub(crate) enum ConnectPoll {
    Waiting,
    Finished(Result<Io, PitlaneClientError>),
}

/// Runs a transport's blocking `connect` off the simulation thread. The
/// result comes back through a oneshot that the main loop polls once per
/// tick.
///
/// The blocking worker is always joined. When the client stops waiting,
/// either on timeout or by cancelling, the task keeps the worker's handle
/// until it returns and then drops whatever connection it produced.
pub(crate) struct PendingConnect {
    receiver: oneshot::Receiver<Result<Io, PitlaneClientError>>,
}

enum Wait {
    Done(Result<std::io::Result<Io>, JoinError>),
    TimedOut,
    Cancelled,
}

fn flatten(joined: Result<std::io::Result<Io>, JoinError>) -> Result<Io, PitlaneClientError> {
    match joined {
        Ok(Ok(io)) => Ok(io),
        Ok(Err(error)) => Err(PitlaneClientError::ConnectFailed {
            reason: error.to_string(),
        }),
        Err(join_error) => Err(PitlaneClientError::ConnectFailed {
            reason: join_error.to_string(),
        }),
    }
}

impl PendingConnect {
    pub(crate) fn start(runtime: &Handle, socket: Box<dyn Socket>, timeout: Duration) -> Self {
        let (mut sender, receiver) = oneshot::channel();

        runtime.spawn(async move {
            let mut attempt = tokio::task::spawn_blocking(move || socket.connect());

            let wait = tokio::select! {
                joined = &mut attempt => Wait::Done(joined),
                _ = tokio::time::sleep(timeout) => Wait::TimedOut,
                _ = sender.closed() => Wait::Cancelled,
            };

            let late = match wait {
                Wait::Done(joined) => {
                    // the client may have cancelled and dropped the receiver already
                    let _ = sender.send(flatten(joined));
                    return;
                }
                Wait::TimedOut => {
                    let _ = sender.send(Err(PitlaneClientError::ConnectTimeout {
                        timeout_ms: timeout.as_millis(),
                    }));
                    attempt.await
                }
                Wait::Cancelled => attempt.await,
            };
            if let Ok(Ok(_)) = late {
                debug!("Dropping a connection nobody waits for anymore");
            }
        });

        Self { receiver }
    }

    pub(crate) fn poll(&mut self) -> ConnectPoll {
        match self.receiver.try_recv() {
            Ok(result) => ConnectPoll::Finished(result),
            Err(oneshot::error::TryRecvError::Empty) => ConnectPoll::Waiting,
            Err(oneshot::error::TryRecvError::Closed) => {
                ConnectPoll::Finished(Err(PitlaneClientError::ConnectFailed {
                    reason: String::from("connect task ended without a result"),
                }))
            }
        }
    }

    /// Stops waiting. Closing the channel lets the task stop timing the
    /// attempt; it still joins the worker and drops a late connection.
    pub(crate) fn cancel(self) {
        drop(self.receiver);
    }
}
