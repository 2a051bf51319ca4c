use clap::Parser;
use hearth::args::{Cli, Command, ServeArgs};
use hearth::{ChatConfig, ChatService, OllamaBackend, logger, server, terminal};
use std::sync::Arc;
use tokio::io::{BufReader, stdin, stdout};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::try_init(cli.log_level).map_err(|e| anyhow::anyhow!(e))?;

    let config = ChatConfig::from(&cli.chat);
    tracing::debug!(?config, "configuration");
    let backend = Arc::new(OllamaBackend::connect(&config)?);
    let service = Arc::new(ChatService::new(&config, backend));

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => terminal::run(&service, BufReader::new(stdin()), stdout()).await,
        Command::Serve(ServeArgs { host, port }) => server::serve(service, &host, port).await,
    }
}
