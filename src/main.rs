use anyhow::Context;
use backtrace::Backtrace;
use clap::{value_parser, Arg, Command};
use tracing::{error, info};

use std::path::PathBuf;
use std::sync::mpsc;

mod buffer;
mod config;
mod exporter;
mod host;
mod rate;
mod samplers;
mod scheduler;
mod stats;

use config::{Config, SinkKind};
use exporter::{Exporter, HttpSink, LogSink, MetricsSink};
use samplers::{CounterReader, Sysfs};
use scheduler::SampleScheduler;

fn main() {
    // custom panic hook to terminate whole process after unwinding
    std::panic::set_hook(Box::new(|s| {
        eprintln!("{s}");
        eprintln!("{:?}", Backtrace::new());
        std::process::exit(101);
    }));

    // parse command line options
    let matches = Command::new(env!("CARGO_BIN_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_about(
            "Samples EFA port counters, derives throughput and error metrics, \
            and exports them in batches to a metrics endpoint.",
        )
        .arg(
            Arg::new("CONFIG")
                .help("Monitor configuration file")
                .value_parser(value_parser!(PathBuf))
                .action(clap::ArgAction::Set)
                .index(1),
        )
        .get_matches();

    // load config from file, or run on defaults
    let config = match matches.get_one::<PathBuf>("CONFIG") {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(error) => {
                eprintln!("error loading config file: {:?}\n{error}", path);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = configure_logging(&config) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn configure_logging(config: &Config) -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(config.log().level())
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to initialize debug log")?;

    // route `log` records from dependencies through the same subscriber
    tracing_log::LogTracer::init().context("failed to bridge log records")?;

    Ok(())
}

fn run(config: Config) -> anyhow::Result<()> {
    info!("starting EFA network monitor");

    let host_id = host::host_id(config.general().host_id());
    info!(host_id = %host_id, "resolved host identity");

    let root = config.sysfs().root();
    let interfaces = samplers::monitored_interfaces(config.general().interfaces(), &root);

    let scheduler = SampleScheduler::build(
        CounterReader::new(Sysfs::new(&root, config.sysfs().port())),
        interfaces,
        host_id,
        config.general().interval(),
        config.export().batch_cycles(),
        || exporter(&config),
    )?;

    let mut scheduler = match scheduler {
        Some(scheduler) => scheduler,
        None => {
            info!(root = %root.display(), "no EFA interfaces found, exiting");
            return Ok(());
        }
    };

    let (tx, rx) = mpsc::channel();

    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("failed to set ctrl-c handler")?;

    scheduler.run(rx);

    Ok(())
}

fn exporter(config: &Config) -> anyhow::Result<Exporter<Box<dyn MetricsSink>>> {
    let sink: Box<dyn MetricsSink> = match config.export().sink() {
        SinkKind::Log => Box::new(LogSink),
        SinkKind::Http => {
            let endpoint = config
                .export()
                .endpoint()
                .context("the http sink requires an export endpoint")?;

            Box::new(
                HttpSink::new(endpoint, config.export().timeout())
                    .context("failed to create http sink")?,
            )
        }
    };

    Ok(Exporter::new(
        sink,
        config.export().namespace(),
        config.export().chunk_size(),
    ))
}
