//! # chrome_native_messaging
//!
//! A Rust implementation of the **Chrome Native Messaging** host side:
//!
//! - Frame and unframe messages exactly as Chrome does (length prefix + UTF-8)
//! - Serve a connection with a **blocking** or an **async** listen loop (same state machine)
//! - Install and remove the **host manifest** Chrome uses to find your binary (feature `install`)
//!
//! ---
//!
//! ## The protocol
//!
//! Chrome starts the host process and talks to it over standard I/O pipes:
//!
//! 1. The sender writes a **4-byte length prefix** (`u32`) in **native endianness**.
//! 2. Then writes **that many bytes** of UTF-8 (normally JSON).
//!
//! The host reads from **stdin** and writes replies to **stdout**. A frame whose
//! prefix is `0` is the **disconnect sentinel**: the listen loop calls your
//! disconnect handler and returns.
//!
//! ### Gotchas
//!
//! - **A closed stdin is not the sentinel.** If the browser simply closes the pipe, the loop
//!   returns [`NmError::StreamClosed`]. Most hosts treat it as a normal shutdown.
//! - **Never log to stdout.** stdout carries frames. Use `tracing` with a stderr writer,
//!   or `eprintln!`.
//! - **Empty replies are refused.** `""` would encode as the sentinel, so `send("")`
//!   fails with [`NmError::EmptyMessage`].
//! - **Payloads are opaque.** Parsing JSON is up to your handler.
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`codec`]: `encode` plus blocking and async prefix/payload decoding.
//! - [`host`]: [`MessagingHost`], `send`/`send_async` and the listen loops.
//! - [`provider`]: where the byte streams come from ([`Stdio`] or your own).
//! - [`config`]: optional size limits ([`HostConfig`]).
//! - `install`: manifest model, validation and installer (feature `install`).
//!
//! ---
//!
//! ## Quick start: blocking host
//!
//! ```no_run
//! use chrome_native_messaging::{BoxError, MessagingHost, NmError};
//!
//! fn main() -> Result<(), NmError> {
//!     let host = MessagingHost::new();
//!     let served = host.start_listening_with(
//!         |request: String| -> Result<String, BoxError> {
//!             // Reply with the request wrapped in an envelope.
//!             Ok(format!(r#"{{"echo":{request}}}"#))
//!         },
//!         || -> Result<(), BoxError> {
//!             eprintln!("extension disconnected");
//!             Ok(())
//!         },
//!     );
//!     match served {
//!         Err(NmError::StreamClosed) => Ok(()),
//!         other => other,
//!     }
//! }
//! ```
//!
//! ## Quick start: async host
//!
//! ```no_run
//! use chrome_native_messaging::{BoxError, MessagingHost, NmError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), NmError> {
//!     let host = MessagingHost::new();
//!     host.start_listening_async(|request: String| async move {
//!         Ok::<_, BoxError>(request.to_uppercase())
//!     })
//!     .await
//! }
//! ```
//!
//! ---
//!
//! ## Pure framing (runnable example)
//!
//! ```rust
//! use chrome_native_messaging::codec::{decode_message, encode, PREFIX_LEN};
//! use std::io::Cursor;
//!
//! let frame = encode(r#"{"hello":"world"}"#).unwrap();
//! assert_eq!(frame.len(), PREFIX_LEN + 17);
//!
//! let mut cur = Cursor::new(frame);
//! assert_eq!(decode_message(&mut cur).unwrap(), r#"{"hello":"world"}"#);
//! ```
//!
//! ---
//!
//! ## Testing your host
//!
//! Implement [`StreamProvider`] (and/or [`AsyncStreamProvider`]) over in-memory
//! buffers. The host asks for a new input stream on every read cycle and a new
//! output stream on every reply, so a provider can hand out one prepared frame
//! per call and record each write separately.

pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod provider;
pub mod session;

mod blocking;

#[cfg(feature = "install")]
pub mod install;

#[cfg(feature = "cli")]
pub mod logging;

// -------- Host re-exports --------

#[doc(inline)]
pub use codec::{decode_message, encode, DISCONNECT_FRAME};
#[doc(inline)]
pub use config::HostConfig;
#[doc(inline)]
pub use error::{BoxError, NmError, StreamKind};
#[doc(inline)]
pub use host::MessagingHost;
#[doc(inline)]
pub use provider::{AsyncStreamProvider, StreamProvider, Stdio};
#[doc(inline)]
pub use session::SessionState;

// -------- Install re-exports --------

#[cfg(feature = "install")]
#[doc(inline)]
pub use install::{install, uninstall, verify_installed, Manifest};
