use boardroom::prelude::*;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "room-watch", version, about = "Join a board-game room and log every update")]
struct Cli {
    #[arg(long, env = "BOARDROOM_WS_URL", default_value = "ws://localhost:3001/socket")]
    ws_url: String,
    #[arg(long, env = "BOARDROOM_API_URL", default_value = "http://localhost:3001/api")]
    api_url: String,
    #[arg(long)]
    room: String,
    #[arg(long, default_value = "watcher")]
    username: String,
    /// Rejoin under an existing session id instead of a fresh one.
    #[arg(long)]
    session_id: Option<String>,
    #[arg(long, value_enum, default_value_t = Game::Snakes)]
    game: Game,
    /// Roll automatically whenever it is our turn to roll.
    #[arg(long)]
    auto_roll: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Game {
    Snakes,
    Ludo,
    Chess,
    Tictactoe,
    Monopoly,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boardroom::telemetry::init_tracing();
    let cli = Cli::parse();

    match cli.game {
        Game::Snakes => watch::<SnakesAndLadders>(&cli).await?,
        Game::Ludo => watch::<Ludo>(&cli).await?,
        Game::Chess => watch::<Chess>(&cli).await?,
        Game::Tictactoe => watch::<TicTacToe>(&cli).await?,
        Game::Monopoly => watch::<Monopoly>(&cli).await?,
    }
    Ok(())
}

async fn watch<G: GameKind>(cli: &Cli) -> Result<(), BoardroomError> {
    let builder = RoomRunnerBuilder::new().room(RoomCode::new(cli.room.as_str()));
    let builder = match &cli.session_id {
        Some(id) => builder.identity(SessionIdentity::with_session_id(
            SessionId(id.clone()),
            cli.username.as_str(),
        )?),
        None => builder.username(cli.username.as_str()),
    };
    let (runner, mut handle) = builder.build::<G, _, _>(
        WebSocketConnector::new(cli.ws_url.as_str()),
        HttpRoomApi::new(cli.api_url.as_str())?,
    )?;

    let auto_roll = cli.auto_roll;
    let view = async move {
        loop {
            tokio::select! {
                update = handle.next_update() => match update {
                    Some(update) => report(&handle, update, auto_roll).await,
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("leaving room");
                    if handle.leave().await.is_err() {
                        break;
                    }
                }
            }
        }
    };

    let (result, ()) = tokio::join!(runner.run(), view);
    result
}

async fn report<G: GameKind>(handle: &RoomHandle<G>, update: ViewUpdate<G>, auto_roll: bool) {
    match update {
        ViewUpdate::Status(status) => info!(?status, "channel"),
        ViewUpdate::Frame(frame) => {
            info!(
                phase = ?frame.phase,
                turn = ?frame.turn_owner,
                seat = ?frame.local_seat,
                animating = frame.animating,
                players = frame.room.players.len(),
                "frame"
            );
            if auto_roll && frame.is_local_turn() && frame.phase == TurnPhase::AwaitingRoll {
                if let Err(e) = handle.roll().await {
                    warn!(error = %e, "roll not sent");
                }
            }
        }
        ViewUpdate::Cue(cue) => info!(subject = ?cue.subject, kind = ?cue.kind, "cue"),
        ViewUpdate::Notice { message, ttl } => {
            warn!(%message, ttl_ms = ttl.as_millis() as u64, "notice")
        }
        ViewUpdate::Outcome(outcome) => info!(
            winner = ?outcome.winner,
            draw = outcome.is_draw,
            "game over"
        ),
        ViewUpdate::Theme(theme) => info!(%theme, "theme"),
    }
}
