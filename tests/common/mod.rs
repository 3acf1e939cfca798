#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::env;
use std::io::{self, Cursor, Write};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use chrome_native_messaging::{encode, AsyncStreamProvider, StreamProvider, DISCONNECT_FRAME};
use tempfile::TempDir;
use tokio::io::AsyncWrite;

pub const REPLY_PREFIX: &str = "Reply: ";

pub const TEST_MESSAGES: [&str; 3] = [
    "Test plain message",
    r#"{"glossary": {"title": "example glossary", "GlossDiv": {"title": "S", "GlossList": {"GlossEntry": {"ID": "SGML", "SortAs": "SGML", "GlossTerm": "Standard Generalized Markup Language", "Acronym": "SGML", "Abbrev": "ISO 8879:1986", "GlossDef": {"para": "A meta-markup language, used to create markup languages such as DocBook.", "GlossSeeAlso": ["GML", "XML"]}, "GlossSee": "markup"}}}}}"#,
    "! \" # $ % & ' ( ) * + , - . / 0 1 2 3 4 5 6 7 8 9 : ; < = > ? @ A B C D E F G H I J K L M N O P Q R S T U V W X Y Z [ \\ ] ^ _ ` a b c d e f g h i j k l m n o p q r s t u v w x y z { | } ~",
];

pub fn frame(message: &str) -> Vec<u8> {
    encode(message).expect("encode")
}

pub fn disconnect() -> Vec<u8> {
    DISCONNECT_FRAME.to_vec()
}

/// Write sink that records each `write` call separately.
#[derive(Clone, Default)]
pub struct Recorder {
    writes: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl Write for Recorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.borrow_mut().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncWrite for Recorder {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Write::write(self.get_mut(), buf))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Stream provider double: each input acquisition pops the next prepared
/// stream (an empty one once they run out), each output acquisition shares
/// one recorder.
#[derive(Default)]
pub struct FakeProvider {
    inputs: RefCell<VecDeque<Vec<u8>>>,
    output: Recorder,
    input_acquisitions: Cell<usize>,
    output_acquisitions: Cell<usize>,
    fail_input: bool,
    fail_output: bool,
}

impl FakeProvider {
    pub fn with_inputs<I: IntoIterator<Item = Vec<u8>>>(inputs: I) -> Self {
        Self {
            inputs: RefCell::new(inputs.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn failing_input() -> Self {
        Self {
            fail_input: true,
            ..Self::default()
        }
    }

    pub fn failing_output() -> Self {
        Self {
            fail_output: true,
            ..Self::default()
        }
    }

    pub fn input_acquisitions(&self) -> usize {
        self.input_acquisitions.get()
    }

    pub fn output_acquisitions(&self) -> usize {
        self.output_acquisitions.get()
    }

    /// Every `write` call, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.output.writes.borrow().clone()
    }

    /// All bytes written, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.writes().concat()
    }

    fn next_input(&self) -> io::Result<Cursor<Vec<u8>>> {
        self.input_acquisitions.set(self.input_acquisitions.get() + 1);
        if self.fail_input {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin unavailable"));
        }
        let next = self.inputs.borrow_mut().pop_front().unwrap_or_default();
        Ok(Cursor::new(next))
    }

    fn next_output(&self) -> io::Result<Recorder> {
        self.output_acquisitions.set(self.output_acquisitions.get() + 1);
        if self.fail_output {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout unavailable"));
        }
        Ok(self.output.clone())
    }
}

impl StreamProvider for FakeProvider {
    type Input = Cursor<Vec<u8>>;
    type Output = Recorder;

    fn input_stream(&self) -> io::Result<Self::Input> {
        self.next_input()
    }

    fn output_stream(&self) -> io::Result<Self::Output> {
        self.next_output()
    }
}

impl AsyncStreamProvider for FakeProvider {
    type Input = Cursor<Vec<u8>>;
    type Output = Recorder;

    fn async_input_stream(&self) -> io::Result<Self::Input> {
        self.next_input()
    }

    fn async_output_stream(&self) -> io::Result<Self::Output> {
        self.next_output()
    }
}

/// Env guard that restores previous env vars on drop.
pub struct EnvGuard {
    old: HashMap<String, Option<String>>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, String)]) -> Self {
        let mut old = HashMap::new();
        for (k, v) in vars {
            old.insert((*k).to_string(), env::var(k).ok());
            env::set_var(k, v);
        }
        Self { old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, prev) in self.old.drain() {
            match prev {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }
}

/// Create a temp sandbox and point HOME / LOCALAPPDATA into it so installs
/// never touch the real profile.
pub fn sandbox_env() -> (TempDir, EnvGuard) {
    let td = TempDir::new().expect("tempdir");
    let root = td.path().to_path_buf();

    let home = root.join("home");
    let localappdata = root.join("appdata_local");

    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&localappdata).unwrap();

    let guard = EnvGuard::set(&[
        ("HOME", home.to_string_lossy().to_string()),
        ("LOCALAPPDATA", localappdata.to_string_lossy().to_string()),
    ]);

    (td, guard)
}
