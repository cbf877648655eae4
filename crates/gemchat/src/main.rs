use gemchat::{Session, Settings, TurnOrchestrator};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never mix with the chat transcript.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load_default()?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let session = Session::new(
        stdin.lock(),
        stdout.lock(),
        TurnOrchestrator::new(&settings),
    );
    session.run().await?;
    Ok(())
}
