use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use skycast_core::{SelectorConfig, WeatherField, WeatherRecord};
use skycast_scraper::{scrape_weather, validate_selectors, WeatherClient};

#[derive(Debug, Parser)]
#[command(name = "skycast-cli")]
#[command(about = "Scrape weather pages from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the live page for a city and print the extracted record.
    Fetch {
        city: String,
        /// Upstream URL text placed before the encoded city name.
        #[arg(long, env = "SCRAPE_API_FIRST")]
        url_prefix: String,
        /// Upstream URL text placed after the encoded city name.
        #[arg(long, env = "SCRAPE_API_LAST")]
        url_suffix: String,
        #[arg(long, env = "SKYCAST_SCRAPER_REQUEST_TIMEOUT_SECS", default_value_t = 5)]
        timeout_secs: u64,
        #[arg(
            long,
            env = "SKYCAST_SCRAPER_USER_AGENT",
            default_value = "skycast/0.1 (weather-scraper)"
        )]
        user_agent: String,
        #[command(flatten)]
        selectors: SelectorArgs,
    },
    /// Run extraction over a saved HTML page without touching the network.
    Extract {
        file: PathBuf,
        #[command(flatten)]
        selectors: SelectorArgs,
    },
}

#[derive(Debug, Args)]
struct SelectorArgs {
    #[arg(long, env = "TEMPERATURE_CLASS")]
    temperature: String,
    #[arg(long, env = "MIN_MAX_TEMPERATURE_CLASS")]
    min_max_temperature: String,
    #[arg(long, env = "HUMIDITY_PRESSURE_CLASS")]
    humidity_pressure: String,
    #[arg(long, env = "CONDITION_CLASS")]
    condition: String,
    #[arg(long, env = "DATE_CLASS")]
    date: String,
}

impl SelectorArgs {
    fn into_config(self) -> anyhow::Result<SelectorConfig> {
        let config = SelectorConfig::from_lookup(|field| {
            Some(
                match field {
                    WeatherField::Temperature => &self.temperature,
                    WeatherField::MinMaxTemperature => &self.min_max_temperature,
                    WeatherField::HumidityPressure => &self.humidity_pressure,
                    WeatherField::Condition => &self.condition,
                    WeatherField::Date => &self.date,
                }
                .clone(),
            )
        })?;
        validate_selectors(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "running command");
    let record = match cli.command {
        Commands::Fetch {
            city,
            url_prefix,
            url_suffix,
            timeout_secs,
            user_agent,
            selectors,
        } => {
            let selectors = selectors.into_config()?;
            let client = WeatherClient::new(url_prefix, url_suffix, timeout_secs, &user_agent)?;
            let markup = client
                .fetch_page(city.trim())
                .await
                .with_context(|| format!("fetching weather page for {city}"))?;
            scrape_weather(&markup, &selectors)?
        }
        Commands::Extract { file, selectors } => {
            let selectors = selectors.into_config()?;
            let markup = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            scrape_weather(&markup, &selectors)?
        }
    };

    print_record(&record)
}

fn print_record(record: &WeatherRecord) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}
