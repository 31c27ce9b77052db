mod cli;

use clap::Parser;
use cli::{Cli, Commands, DisplayMode, MessagePrinter};
use party_shared::{ClientMsg, PlaybackUpdate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let msg = match cli.command {
        Commands::Watch => {
            return cli::watch_ws(&cli.server, cli.json).await;
        }
        Commands::Chat { message } => ClientMsg::Chat { message },
        Commands::Clap { sprite } => ClientMsg::Clap { sprite },
        Commands::Play {
            pause,
            progress,
            video,
        } => ClientMsg::RequestPlay(PlaybackUpdate {
            playing: !pause,
            progress,
            video,
        }),
        Commands::ChangeVideo { video } => ClientMsg::ChangeVideo { video },
        Commands::Ready => ClientMsg::Ready,
        Commands::State => ClientMsg::UpdateState,
        Commands::Videos => ClientMsg::VideoList,
        Commands::Images => ClientMsg::ImageList,
    };

    let mut printer = MessagePrinter::new(cli.json, DisplayMode::Everything);
    cli::run_once_ws(&cli.server, msg, cli.wait_ms, &mut printer).await
}
