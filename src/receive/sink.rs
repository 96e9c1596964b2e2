//! Receive notifications and the sinks that consume them.
//!
//! Sinks run on the receive worker thread, in delivery order. A caller that
//! needs events on its own thread (a UI loop, an async task) passes one of the
//! channel senders and drains the other end there.

/// Notification produced by a receive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveEvent {
    /// Bytes arrived. `count` is the running byte count of the current portion.
    Data { chunk: Vec<u8>, count: usize },
    /// The line went quiet; `portion` holds every byte of the finished portion.
    PortionEnd { portion: Vec<u8> },
    /// The device failed and the session stopped.
    Fault { port: String, message: String },
}

/// Consumer of [`ReceiveEvent`]s.
pub trait ReceiveSink: Send + 'static {
    fn deliver(&mut self, event: ReceiveEvent);
}

impl ReceiveSink for std::sync::mpsc::Sender<ReceiveEvent> {
    fn deliver(&mut self, event: ReceiveEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(event);
    }
}

impl ReceiveSink for tokio::sync::mpsc::UnboundedSender<ReceiveEvent> {
    fn deliver(&mut self, event: ReceiveEvent) {
        let _ = self.send(event);
    }
}

impl ReceiveSink for Box<dyn ReceiveSink> {
    fn deliver(&mut self, event: ReceiveEvent) {
        (**self).deliver(event)
    }
}

/// Sink backed by a closure. Build one with [`sink_fn`].
pub struct FnSink<F>(F);

impl<F> ReceiveSink for FnSink<F>
where
    F: FnMut(ReceiveEvent) + Send + 'static,
{
    fn deliver(&mut self, event: ReceiveEvent) {
        (self.0)(event)
    }
}

/// Wrap a closure as a [`ReceiveSink`].
///
/// ```
/// use serial_links::receive::{sink_fn, ReceiveEvent, ReceiveSink};
///
/// let mut sink = sink_fn(|event: ReceiveEvent| println!("{event:?}"));
/// sink.deliver(ReceiveEvent::Data { chunk: vec![b'a'], count: 1 });
/// ```
pub fn sink_fn<F>(f: F) -> FnSink<F>
where
    F: FnMut(ReceiveEvent) + Send + 'static,
{
    FnSink(f)
}
