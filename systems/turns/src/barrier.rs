//! Request/reply correlation for a single seat.

use std::sync::Arc;

use spellgrid_core::{Brain, Message, PlayerId};
use tracing::debug;

/// One seat at the table: its brain and the exchange in flight.
///
/// The last request stays attached to the seat after it was answered so the
/// resolution step can read the options it offered.
pub(crate) struct Seat {
    id: PlayerId,
    brain: Box<dyn Brain>,
    request: Option<Arc<Message>>,
    reply: Option<Message>,
}

impl Seat {
    pub(crate) fn new(id: PlayerId, brain: Box<dyn Brain>) -> Self {
        Self {
            id,
            brain,
            request: None,
            reply: None,
        }
    }

    /// Delivers a request and starts waiting for its reply.
    pub(crate) fn send(&mut self, message: Message) {
        let request = Arc::new(message);
        self.request = Some(Arc::clone(&request));
        self.reply = None;
        self.brain.send(request);
    }

    /// Polls the brain once and reports whether the seat has answered.
    ///
    /// Replies whose kind or tick do not answer the outstanding request are
    /// discarded; the seat keeps waiting.
    pub(crate) fn poll(&mut self) -> bool {
        let Some(request) = &self.request else {
            return true;
        };
        if self.reply.is_some() {
            return true;
        }
        let Some(reply) = self.brain.poll() else {
            return false;
        };

        if answers(request, &reply) {
            self.reply = Some(reply);
            return true;
        }

        debug!(
            seat = %self.id,
            expected = ?request.kind().expected_reply(),
            expected_tick = %request.tick(),
            received = ?reply.kind(),
            received_tick = %reply.tick(),
            "dropped uncorrelated reply"
        );
        false
    }

    /// Hands out the answered request together with its reply.
    pub(crate) fn take_exchange(&mut self) -> Option<(Arc<Message>, Message)> {
        let reply = self.reply.take()?;
        let request = self.request.take()?;
        Some((request, reply))
    }
}

fn answers(request: &Message, reply: &Message) -> bool {
    request.kind().expected_reply() == Some(reply.kind()) && request.tick() == reply.tick()
}

/// Polls every seat once and reports whether none is still waiting.
///
/// Each seat is polled even after an earlier one was found waiting, so
/// replies keep draining on every tick.
pub(crate) fn all_answered(seats: &mut [Seat]) -> bool {
    let mut answered = true;
    for seat in seats {
        if !seat.poll() {
            answered = false;
        }
    }
    answered
}
