// src/main.rs

use siteforge::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("siteforge error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(summary) if summary.all_ok() => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("siteforge error: {err:?}");
            std::process::exit(1);
        }
    }
}
