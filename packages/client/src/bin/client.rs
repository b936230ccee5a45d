//! Interactive Groove client.
//!
//! Joins a listening room and mirrors its playback with a simulated player.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin groove-client -- --room chill --create
//! ```

use clap::Parser;
use groove_client::{
    ClientConfig, Session, SessionConfig,
    command::{self, HELP, UserCommand},
    display,
    identity::{FileProfileStore, IdentityResolver, ProfileOverrides},
    playback::ClockPlayer,
    session::{JOIN_TIMEOUT, TICK_INTERVAL},
};
use groove_shared::{logger::setup_logger, protocol::RoomConfigDto};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    let config = ClientConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    if let Err(e) = run(config).await {
        tracing::error!("Client error: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = IdentityResolver::new(FileProfileStore::new(config.profile_path()));
    let resolved = resolver.resolve(
        config.account_id.as_deref(),
        &ProfileOverrides {
            display_name: config.name.clone(),
            color: config.color.clone(),
        },
    )?;
    let identity = resolved.identity.id().to_string();
    println!("* you are {} ({})", resolved.profile.display_name, identity);

    let session_config = SessionConfig {
        url: config.ws_url(&identity)?,
        room_id: config.room.clone(),
        create: config.create.then(|| RoomConfigDto {
            is_public: !config.private,
            ..RoomConfigDto::default()
        }),
        join_timeout: JOIN_TIMEOUT,
        tick: TICK_INTERVAL,
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let Some(text) = display::render(&event) {
                println!("{text}");
            }
        }
    });

    // rustyline blocks, so it gets its own thread
    std::thread::spawn(move || read_commands(command_tx));

    let session = Session::new(
        session_config,
        &identity,
        resolved.profile,
        ClockPlayer::new(config.track_seconds),
        event_tx,
    );
    let result = session.run(command_rx).await;
    printer.abort();
    Ok(result?)
}

fn read_commands(commands: mpsc::UnboundedSender<UserCommand>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            tracing::error!("Failed to start line editor: {}", e);
            let _ = commands.send(UserCommand::Quit);
            return;
        }
    };

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if line.trim() == "/help" {
                    println!("{HELP}");
                    continue;
                }
                match command::parse(&line) {
                    Ok(Some(command)) => {
                        let quit = command == UserCommand::Quit;
                        if commands.send(command).is_err() || quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("! {e}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                let _ = commands.send(UserCommand::Quit);
                break;
            }
            Err(e) => {
                tracing::error!("Readline error: {}", e);
                let _ = commands.send(UserCommand::Quit);
                break;
            }
        }
    }
}
