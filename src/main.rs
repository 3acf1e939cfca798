use std::process::ExitCode;

use chrome_native_messaging::install::{self, Manifest};
use chrome_native_messaging::logging::LogArgs;
use chrome_native_messaging::{BoxError, HostConfig, MessagingHost, NmError};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const HOST_NAME: &str = "com.example.chrome_nm_example";
const HOST_DESCRIPTION: &str = "Example native messaging host that replies with the reversed text";

/// Example Chrome native messaging host.
///
/// Without --install/--uninstall it serves one extension connection on
/// stdin/stdout, answering `{"text": "..."}` with the text reversed.
#[derive(Parser, Debug)]
#[command(name = "chrome-nm-example", version, about)]
struct Cli {
    /// Origin of the calling extension (passed by the browser).
    origin: Option<String>,

    /// Install the host manifest for the given extension ID, then exit.
    #[arg(long, value_name = "EXTENSION_ID", conflicts_with = "uninstall")]
    install: Option<String>,

    /// Remove the host manifest for the given extension ID, then exit.
    #[arg(long, value_name = "EXTENSION_ID")]
    uninstall: Option<String>,

    /// Serve the connection with the async listen loop.
    #[arg(long = "async")]
    use_async: bool,

    /// Reject incoming messages larger than this many bytes.
    #[arg(long, value_name = "BYTES", env = "NM_MAX_MESSAGE_SIZE")]
    max_message_size: Option<usize>,

    #[command(flatten)]
    log: LogArgs,

    /// Native window handle Chrome passes on Windows. Logged only.
    #[arg(long, hide = true)]
    parent_window: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextMessage {
    text: String,
}

fn reverse_reply(raw: String) -> Result<String, BoxError> {
    let request: TextMessage = serde_json::from_str(&raw)?;
    let reply = TextMessage {
        text: request.text.chars().rev().collect(),
    };
    Ok(serde_json::to_string(&reply)?)
}

fn manifest(extension_id: &str) -> Result<Manifest, BoxError> {
    let exe = std::env::current_exe()?;
    Ok(Manifest::new(
        HOST_NAME,
        HOST_DESCRIPTION,
        exe,
        [extension_id],
    ))
}

fn run_install(extension_id: &str) -> Result<(), BoxError> {
    let written = install::install(&manifest(extension_id)?)?;
    if written.is_empty() {
        println!("No supported browser profile found; nothing installed");
    }
    for path in written {
        println!("Writing manifest to '{}'", path.display());
    }
    Ok(())
}

fn run_uninstall(extension_id: &str) -> Result<(), BoxError> {
    install::uninstall(&manifest(extension_id)?)?;
    println!("Removed manifest for {HOST_NAME}");
    Ok(())
}

fn serve(host: &MessagingHost, use_async: bool) -> Result<(), NmError> {
    let on_disconnect = || {
        info!("extension disconnected");
        Ok::<(), BoxError>(())
    };

    if !use_async {
        return host.start_listening_with(reverse_reply, on_disconnect);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(host.start_listening_async_with(
        |raw| async move { reverse_reply(raw) },
        || async move { on_disconnect() },
    ))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.log.init();

    let result = if let Some(id) = cli.install.as_deref() {
        run_install(id)
    } else if let Some(id) = cli.uninstall.as_deref() {
        run_uninstall(id)
    } else {
        info!(
            origin = cli.origin.as_deref().unwrap_or("-"),
            parent_window = ?cli.parent_window,
            "host started"
        );
        let config = HostConfig {
            max_incoming_len: cli.max_message_size,
            ..HostConfig::default()
        };
        let host = MessagingHost::new().with_config(config);
        match serve(&host, cli.use_async) {
            Ok(()) => Ok(()),
            Err(NmError::StreamClosed) => {
                info!("input closed by browser");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "host failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_text_field() {
        let reply = reverse_reply(r#"{"text":"abc"}"#.to_string()).unwrap();
        assert_eq!(reply, r#"{"text":"cba"}"#);
    }

    #[test]
    fn invalid_request_is_a_handler_error() {
        assert!(reverse_reply("not json".to_string()).is_err());
    }

    #[test]
    fn accepts_browser_origin_and_parent_window() {
        let cli = Cli::try_parse_from([
            "chrome-nm-example",
            "chrome-extension://abc/",
            "--parent-window=0",
        ])
        .expect("browser launch args should parse");
        assert_eq!(cli.origin.as_deref(), Some("chrome-extension://abc/"));
        assert!(cli.install.is_none());
    }

    #[test]
    fn rejects_install_and_uninstall_together() {
        let err = Cli::try_parse_from(["chrome-nm-example", "--install", "a", "--uninstall", "b"])
            .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
