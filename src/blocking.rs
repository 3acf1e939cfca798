//! Adapter that lets blocking `Read`/`Write` streams run through the async
//! framing and listen-loop code.
//!
//! Every poll performs the blocking call on the current thread and returns
//! `Poll::Ready`, so a future built only from these streams never suspends.
//! [`resolve`] then drives it to completion in place. It holds no executor
//! context, so a handler running inside one session may call `send` (which
//! resolves its own future) without tripping a nested-executor check.

use std::future::Future;
use std::io::{self, ErrorKind, Read, Write};
use std::pin::{pin, Pin};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A blocking stream exposed through tokio's async I/O traits.
#[derive(Debug)]
pub(crate) struct Blocking<T>(pub(crate) T);

// The inner stream is never pinned.
impl<T> Unpin for Blocking<T> {}

impl<R: Read> AsyncRead for Blocking<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let inner = &mut self.get_mut().0;
        loop {
            match inner.read(buf.initialize_unfilled()) {
                Ok(n) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Poll::Ready(Err(err)),
            }
        }
    }
}

impl<W: Write> AsyncWrite for Blocking<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let inner = &mut self.get_mut().0;
        loop {
            match inner.write(buf) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                other => return Poll::Ready(other),
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let inner = &mut self.get_mut().0;
        loop {
            match inner.flush() {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                other => return Poll::Ready(other),
            }
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_flush(cx)
    }
}

struct ThreadWaker(Thread);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

/// Run a future to completion on the calling thread, parking it while pending.
pub(crate) fn resolve<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
    let mut cx = Context::from_waker(&waker);
    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => return output,
            Poll::Pending => thread::park(),
        }
    }
}
