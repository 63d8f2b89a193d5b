use std::sync::{
    mpsc::{self, Receiver, Sender, TryRecvError},
    Arc,
};

use spellgrid_core::{Brain, Message};
use tracing::debug;

/// Creates a connected seat/peer pair.
#[must_use]
pub fn channel() -> (ChannelBrain, ChannelPeer) {
    let (request_tx, request_rx) = mpsc::channel();
    let (reply_tx, reply_rx) = mpsc::channel();
    (
        ChannelBrain {
            requests: request_tx,
            replies: reply_rx,
        },
        ChannelPeer {
            requests: request_rx,
            replies: reply_tx,
        },
    )
}

/// Seat side of a channel pair, handed to the orchestrator.
#[derive(Debug)]
pub struct ChannelBrain {
    requests: Sender<Arc<Message>>,
    replies: Receiver<Message>,
}

impl Brain for ChannelBrain {
    fn send(&mut self, message: Arc<Message>) {
        if self.requests.send(message).is_err() {
            debug!("channel peer hung up, request dropped");
        }
    }

    fn poll(&mut self) -> Option<Message> {
        match self.replies.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                debug!("channel peer hung up");
                None
            }
        }
    }
}

/// Remote side of a channel pair, driven by whoever plays the seat.
#[derive(Debug)]
pub struct ChannelPeer {
    requests: Receiver<Arc<Message>>,
    replies: Sender<Message>,
}

impl ChannelPeer {
    /// Next delivered request, if one is queued.
    #[must_use]
    pub fn try_recv(&self) -> Option<Arc<Message>> {
        self.requests.try_recv().ok()
    }

    /// Waits for the next request, or `None` once the seat was dropped.
    #[must_use]
    pub fn recv(&self) -> Option<Arc<Message>> {
        self.requests.recv().ok()
    }

    /// Queues a reply for the seat. Returns `false` once the seat was dropped.
    pub fn reply(&self, message: Message) -> bool {
        self.replies.send(message).is_ok()
    }
}
