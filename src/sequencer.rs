use crate::types::RequestId;

/// Request id counters, one per namespace that carries `requestId`
///
/// Each call hands out the current value and advances the counter. The two
/// counters are independent. There is no internal locking: the owning
/// channel serializes access through `&mut self`.
#[derive(Debug, Default, Clone)]
pub struct RequestSequencer {
    receiver: RequestId,
    media: RequestId,
}

impl RequestSequencer {
    /// Create a sequencer with both counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Next request id for the receiver namespace
    pub fn next_receiver_id(&mut self) -> RequestId {
        let id = self.receiver;
        self.receiver = self.receiver.wrapping_add(1);
        id
    }

    /// Next request id for the media namespace
    pub fn next_media_id(&mut self) -> RequestId {
        let id = self.media;
        self.media = self.media.wrapping_add(1);
        id
    }

    /// Value the next receiver request will use
    pub fn peek_receiver_id(&self) -> RequestId {
        self.receiver
    }

    /// Value the next media request will use
    pub fn peek_media_id(&self) -> RequestId {
        self.media
    }
}
