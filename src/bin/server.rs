use clap::Parser;
use kvgate::{server, Config, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::parse();

    server::run(config).await
}
