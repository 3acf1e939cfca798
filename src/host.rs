use std::convert::Infallible;
use std::future::{ready, Future};
use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::blocking::{self, Blocking};
use crate::codec::{self, PREFIX_LEN};
use crate::config::HostConfig;
use crate::error::{BoxError, NmError, Result, StreamKind};
use crate::provider::{AsyncStreamProvider, StreamProvider, Stdio};
use crate::session::{Session, SessionGuard, SessionState};

/// A native messaging host bound to one stream provider.
///
/// Send one-shot messages with [`send`](Self::send) /
/// [`send_async`](Self::send_async), or serve a whole connection with one of
/// the `start_listening*` methods. Blocking and async methods share the same
/// loop, so they produce identical bytes for identical input.
///
/// A host runs at most one listen loop at a time. Starting another while one
/// is active (for example from inside a handler) returns `Ok(())` straight
/// away without touching the streams.
///
/// The session state lives in a `Cell`, so `MessagingHost` is not `Sync`:
/// share it across threads only behind your own synchronization.
#[derive(Debug, Default)]
pub struct MessagingHost<P = Stdio> {
    provider: P,
    config: HostConfig,
    session: Session,
}

impl MessagingHost<Stdio> {
    /// A host talking over the current process's stdin/stdout.
    pub fn new() -> Self {
        Self::with_provider(Stdio)
    }
}

impl<P> MessagingHost<P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            config: HostConfig::default(),
            session: Session::default(),
        }
    }

    pub fn with_config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Current state of the listen loop.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_listening(&self) -> bool {
        self.session.state().is_active()
    }

    fn claim_session(&self) -> Option<SessionGuard<'_>> {
        let guard = self.session.begin();
        if guard.is_none() {
            debug!("listen loop already active; ignoring start request");
        }
        guard
    }

    fn frame(&self, message: &str) -> Result<Vec<u8>> {
        if message.is_empty() {
            return Err(NmError::EmptyMessage);
        }
        if let Some(max) = self.config.max_outgoing_len {
            if message.len() > max {
                return Err(NmError::MessageTooLarge {
                    size: message.len(),
                    max,
                });
            }
        }
        codec::encode(message)
    }

    /// Acquire the output stream, write one whole frame, flush, release.
    async fn deliver<S: Streams>(&self, streams: &S, message: &str) -> Result<()> {
        let frame = self.frame(message)?;
        let mut output = streams
            .output()
            .map_err(|err| NmError::acquisition(StreamKind::Output, err))?;
        output.write_all(&frame).await?;
        output.flush().await?;
        trace!(len = frame.len() - PREFIX_LEN, "frame sent");
        Ok(())
    }

    /// Acquire the input stream and read one frame. `None` is the disconnect sentinel.
    async fn receive<S: Streams>(&self, streams: &S) -> Result<Option<String>> {
        let mut input = streams
            .input()
            .map_err(|err| NmError::acquisition(StreamKind::Input, err))?;

        let len = codec::read_prefix(&mut input).await?;
        if len == 0 {
            return Ok(None);
        }
        if let Some(max) = self.config.max_incoming_len {
            let size = len as usize;
            if size > max {
                return Err(NmError::MessageTooLarge { size, max });
            }
        }

        let message = codec::read_payload(&mut input, len).await?;
        trace!(len, "frame received");
        Ok(Some(message))
    }

    async fn run_session<S, H, HFut, HErr, D, DFut, DErr>(
        &self,
        guard: SessionGuard<'_>,
        streams: S,
        on_message: H,
        on_disconnect: D,
    ) -> Result<()>
    where
        S: Streams,
        H: FnMut(String) -> HFut,
        HFut: Future<Output = std::result::Result<String, HErr>>,
        HErr: Into<BoxError>,
        D: FnOnce() -> DFut,
        DFut: Future<Output = std::result::Result<(), DErr>>,
        DErr: Into<BoxError>,
    {
        debug!("listen loop started");
        match self
            .dispatch_until_disconnect(&guard, &streams, on_message, on_disconnect)
            .await
        {
            Ok(()) => {
                guard.disconnected();
                debug!("listen loop ended on disconnect frame");
                Ok(())
            }
            Err(NmError::StreamClosed) => {
                debug!("listen loop ended: input stream closed");
                Err(NmError::StreamClosed)
            }
            Err(err) => {
                warn!(error = %err, "listen loop terminated");
                Err(err)
            }
        }
    }

    async fn dispatch_until_disconnect<S, H, HFut, HErr, D, DFut, DErr>(
        &self,
        guard: &SessionGuard<'_>,
        streams: &S,
        mut on_message: H,
        on_disconnect: D,
    ) -> Result<()>
    where
        S: Streams,
        H: FnMut(String) -> HFut,
        HFut: Future<Output = std::result::Result<String, HErr>>,
        HErr: Into<BoxError>,
        D: FnOnce() -> DFut,
        DFut: Future<Output = std::result::Result<(), DErr>>,
        DErr: Into<BoxError>,
    {
        loop {
            let Some(message) = self.receive(streams).await? else {
                debug!("disconnect frame received");
                return on_disconnect()
                    .await
                    .map_err(|err| NmError::DisconnectHandler(err.into()));
            };

            guard.dispatching();
            let reply = on_message(message)
                .await
                .map_err(|err| NmError::Handler(err.into()))?;
            guard.listening();

            self.deliver(streams, &reply).await?;
        }
    }
}

impl<P: StreamProvider> MessagingHost<P> {
    /// Write a single framed message to the output stream.
    pub fn send(&self, message: &str) -> Result<()> {
        blocking::resolve(self.deliver(&BlockingStreams(&self.provider), message))
    }

    /// Serve the connection until a disconnect frame arrives, replying to each
    /// message with whatever `handler` returns.
    pub fn start_listening<H, E>(&self, handler: H) -> Result<()>
    where
        H: FnMut(String) -> std::result::Result<String, E>,
        E: Into<BoxError>,
    {
        self.start_listening_with(handler, || Ok::<(), Infallible>(()))
    }

    /// Like [`start_listening`](Self::start_listening), calling `on_disconnect`
    /// once when the disconnect frame arrives.
    ///
    /// If `handler` fails, the error is returned and `on_disconnect` is not called.
    pub fn start_listening_with<H, E, D, DE>(&self, mut handler: H, on_disconnect: D) -> Result<()>
    where
        H: FnMut(String) -> std::result::Result<String, E>,
        E: Into<BoxError>,
        D: FnOnce() -> std::result::Result<(), DE>,
        DE: Into<BoxError>,
    {
        let Some(guard) = self.claim_session() else {
            return Ok(());
        };
        blocking::resolve(self.run_session(
            guard,
            BlockingStreams(&self.provider),
            move |message| ready(handler(message)),
            move || ready(on_disconnect()),
        ))
    }
}

impl<P: AsyncStreamProvider> MessagingHost<P> {
    /// Async form of [`send`](Self::send).
    pub async fn send_async(&self, message: &str) -> Result<()> {
        self.deliver(&AsyncStreams(&self.provider), message).await
    }

    /// Async form of [`start_listening`](Self::start_listening).
    pub async fn start_listening_async<H, Fut, E>(&self, handler: H) -> Result<()>
    where
        H: FnMut(String) -> Fut,
        Fut: Future<Output = std::result::Result<String, E>>,
        E: Into<BoxError>,
    {
        self.start_listening_async_with(handler, || ready(Ok::<(), Infallible>(())))
            .await
    }

    /// Async form of [`start_listening_with`](Self::start_listening_with).
    ///
    /// Dropping the returned future ends the session; the host is left in
    /// [`SessionState::Terminated`].
    pub async fn start_listening_async_with<H, Fut, E, D, DFut, DE>(
        &self,
        handler: H,
        on_disconnect: D,
    ) -> Result<()>
    where
        H: FnMut(String) -> Fut,
        Fut: Future<Output = std::result::Result<String, E>>,
        E: Into<BoxError>,
        D: FnOnce() -> DFut,
        DFut: Future<Output = std::result::Result<(), DE>>,
        DE: Into<BoxError>,
    {
        let Some(guard) = self.claim_session() else {
            return Ok(());
        };
        self.run_session(guard, AsyncStreams(&self.provider), handler, on_disconnect)
            .await
    }
}

/// Stream acquisition as seen by the shared loop.
trait Streams {
    type Input: AsyncRead + Unpin;
    type Output: AsyncWrite + Unpin;

    fn input(&self) -> io::Result<Self::Input>;

    fn output(&self) -> io::Result<Self::Output>;
}

struct BlockingStreams<'a, P>(&'a P);

impl<P: StreamProvider> Streams for BlockingStreams<'_, P> {
    type Input = Blocking<P::Input>;
    type Output = Blocking<P::Output>;

    fn input(&self) -> io::Result<Self::Input> {
        self.0.input_stream().map(Blocking)
    }

    fn output(&self) -> io::Result<Self::Output> {
        self.0.output_stream().map(Blocking)
    }
}

struct AsyncStreams<'a, P>(&'a P);

impl<P: AsyncStreamProvider> Streams for AsyncStreams<'_, P> {
    type Input = P::Input;
    type Output = P::Output;

    fn input(&self) -> io::Result<Self::Input> {
        self.0.async_input_stream()
    }

    fn output(&self) -> io::Result<Self::Output> {
        self.0.async_output_stream()
    }
}
