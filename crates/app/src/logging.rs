use std::io;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

// Logs go to stderr so `--print` output on stdout stays clean JSON.
pub(crate) fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter_layer = tracing_subscriber::filter::filter_fn(move |metadata| {
        let target = metadata.target();
        let is_dnorm = target.starts_with("dnorm");
        let effective_level = if is_dnorm { level } else { Level::WARN };
        metadata.level() <= &effective_level
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(verbose)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter_layer))
        .init();
}
