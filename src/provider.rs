//! Sources of the raw byte streams a host talks over.
//!
//! A host asks its provider for a fresh stream for every read cycle and every
//! reply, and drops it as soon as that operation finishes. Test doubles can
//! therefore hand out a different in-memory stream per call.

use std::io::{self, Read, Write};

use tokio::io::{AsyncRead, AsyncWrite};

/// Supplies blocking input/output streams.
pub trait StreamProvider {
    type Input: Read;
    type Output: Write;

    fn input_stream(&self) -> io::Result<Self::Input>;

    fn output_stream(&self) -> io::Result<Self::Output>;
}

/// Supplies async input/output streams.
pub trait AsyncStreamProvider {
    type Input: AsyncRead + Unpin;
    type Output: AsyncWrite + Unpin;

    fn async_input_stream(&self) -> io::Result<Self::Input>;

    fn async_output_stream(&self) -> io::Result<Self::Output>;
}

/// The current process's stdin/stdout.
///
/// The async streams are tokio's stdio handles, which need a running tokio
/// runtime with its blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdio;

impl StreamProvider for Stdio {
    type Input = io::Stdin;
    type Output = io::Stdout;

    fn input_stream(&self) -> io::Result<io::Stdin> {
        Ok(io::stdin())
    }

    fn output_stream(&self) -> io::Result<io::Stdout> {
        Ok(io::stdout())
    }
}

impl AsyncStreamProvider for Stdio {
    type Input = tokio::io::Stdin;
    type Output = tokio::io::Stdout;

    fn async_input_stream(&self) -> io::Result<tokio::io::Stdin> {
        Ok(tokio::io::stdin())
    }

    fn async_output_stream(&self) -> io::Result<tokio::io::Stdout> {
        Ok(tokio::io::stdout())
    }
}

impl<P: StreamProvider + ?Sized> StreamProvider for &P {
    type Input = P::Input;
    type Output = P::Output;

    fn input_stream(&self) -> io::Result<Self::Input> {
        (**self).input_stream()
    }

    fn output_stream(&self) -> io::Result<Self::Output> {
        (**self).output_stream()
    }
}

impl<P: AsyncStreamProvider + ?Sized> AsyncStreamProvider for &P {
    type Input = P::Input;
    type Output = P::Output;

    fn async_input_stream(&self) -> io::Result<Self::Input> {
        (**self).async_input_stream()
    }

    fn async_output_stream(&self) -> io::Result<Self::Output> {
        (**self).async_output_stream()
    }
}
