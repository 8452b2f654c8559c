use std::process;

mod headless;
mod logging;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|arg| arg == "--verbose" || arg == "-v");
    logging::setup_tracing(verbose);

    tracing::info!("dnorm starting");

    if let Err(err) = headless::run(&args) {
        eprintln!("dnorm error: {err}");
        process::exit(1);
    }
}
