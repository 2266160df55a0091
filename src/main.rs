use anyhow::{Result, bail};
use tintwave::client::{FixedPosition, HttpWeatherEndpoint, render::render};
use tintwave::{Coordinates, TintwaveConfig, WeatherController, logging, web};

const USAGE: &str = "Usage: tintwave [serve | lookup [CITY... | LAT LON]]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = TintwaveConfig::load()?;
    logging::init(&config.logging)?;

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("serve") => web::run(config).await,
        Some("lookup") => lookup(&config, args.collect()).await,
        Some("help" | "--help" | "-h") => {
            println!("TintWave {}\n{USAGE}", tintwave::VERSION);
            Ok(())
        }
        Some(other) => bail!("Unknown command '{other}'. {USAGE}"),
    }
}

async fn lookup(config: &TintwaveConfig, args: Vec<String>) -> Result<()> {
    let endpoint = HttpWeatherEndpoint::new(&config.client)?;
    let mut controller = WeatherController::new(endpoint);

    match parse_position(&args) {
        Some(position) => controller.mount(&FixedPosition(Some(position))).await,
        None if args.is_empty() => controller.mount(&FixedPosition(None)).await,
        None => {
            controller.set_city(args.join(" "));
            controller.submit().await;
        }
    }

    print!("{}", render(&controller));
    if controller.error().is_some() {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_position(args: &[String]) -> Option<Coordinates> {
    match args {
        [lat, lon] => Some(Coordinates::new(lat.parse().ok()?, lon.parse().ok()?)),
        _ => None,
    }
}
