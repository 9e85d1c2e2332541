use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use route_generator::config::Settings;
use route_generator::error::Error;
use route_generator::feed::FeedClient;
use route_generator::feed::FeedSource;
use route_generator::output;
use route_generator::platform::Platform;
use route_generator::platform::RenderOptions;
use routes::builder::RouteBuilder;
use routes::region::Region;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogOutputFormat {
    Json,
    Pretty,
}

/// Generate VPN route scripts from a registry delegation feed.
#[derive(Debug, Parser)]
#[clap(name = "route-generator")]
struct Args {
    /// Optional path to the configuration file. If not provided, the
    /// built-in defaults and environment variables are used.
    #[clap(short = 'c', long, required = false)]
    config: Option<PathBuf>,

    /// Target platform.
    #[clap(short = 'p', long, value_enum)]
    platform: Option<Platform>,

    /// Metric for the generated routes.
    #[clap(short = 'm', long)]
    metric: Option<u32>,

    /// Target region: not-asia, asia or china.
    #[clap(short = 'r', long)]
    region: Option<Region>,

    /// Read the delegation feed from a local file instead of downloading it.
    #[clap(short = 'i', long)]
    input: Option<PathBuf>,

    /// Directory the scripts are written to.
    #[clap(short = 'd', long = "output-dir")]
    output_dir: Option<PathBuf>,

    #[clap(short = 'o', long = "output-format", default_value = "pretty")]
    output_format: Option<LogOutputFormat>,
}

impl Args {
    /// Command line flags take precedence over the configuration.
    fn apply(&self, settings: &mut Settings) {
        if let Some(platform) = self.platform {
            settings.routes.platform = platform;
        }
        if let Some(metric) = self.metric {
            settings.routes.metric = metric;
        }
        if let Some(region) = self.region {
            settings.routes.region = region;
        }
        if let Some(directory) = &self.output_dir {
            settings.output.directory = directory.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse the command line arguments.
    let args = Args::parse();

    // Configure the binary's stderr output based on the provided output format.
    let pretty = matches!(args.output_format, Some(LogOutputFormat::Pretty));
    route_generator::logging::setup_logging(route_generator::logging::DEFAULT_DIRECTIVES, pretty);

    let usage = run(&args).await?;
    println!("{usage}");

    Ok(())
}

/// Generate and write the scripts, returning the usage hint for them.
async fn run(args: &Args) -> Result<String, Error> {
    // Load the configuration file and/or environment variables.
    let mut settings = Settings::new(args.config.as_deref())?;
    args.apply(&mut settings);

    let source = match &args.input {
        Some(path) => FeedSource::File(path.clone()),
        None => FeedSource::Http(FeedClient::new(&settings.feed)?),
    };

    let region = settings.routes.region;
    let platform = settings.routes.platform;
    tracing::info!(%region, %platform, "generating routes");

    let mut builder = RouteBuilder::new(region, &settings.feed.registry);
    source
        .for_each_line(|line| builder.push_line(line).map_err(Error::from))
        .await?;
    let routes = builder.finish();

    let options = RenderOptions {
        metric: settings.routes.metric,
        region,
    };
    let files = platform.render(&routes.blocks, &options);
    let written = output::write_scripts(&settings.output.directory, &files)?;
    tracing::info!(
        files = written.len(),
        directory = %settings.output.directory.display(),
        "wrote route scripts"
    );

    Ok(platform.usage(routes.blocks.len(), &options))
}
