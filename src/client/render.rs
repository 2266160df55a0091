//! Plain-text rendering of the lookup state

use std::fmt::Write;

use super::{ViewState, WeatherController, WeatherEndpoint};

pub fn render<E: WeatherEndpoint>(controller: &WeatherController<E>) -> String {
    let mut out = String::new();

    match controller.state() {
        ViewState::Idle => {}
        ViewState::Loading => out.push_str("...\n"),
        ViewState::Failed(message) => {
            let _ = writeln!(out, "Error: {message}");
        }
        ViewState::Ready(report) => {
            let current = &report.current;
            let place = current.location_name.as_deref().unwrap_or(controller.city());
            let _ = writeln!(out, "Current Weather - {place}");
            let _ = write!(out, "  {}", current.format_temperature());
            if let Some(condition) = current.primary_condition() {
                let _ = write!(out, "  {}  {}", condition.description, condition.icon_url());
            }
            out.push('\n');

            let offset = report.forecast.offset();
            out.push_str("\n5-day Forecast\n");
            for entry in controller.daily_digest() {
                let _ = write!(
                    out,
                    "  {:<12} {:>4}°C",
                    entry.day_label(offset),
                    entry.rounded_temperature()
                );
                if let Some(condition) = entry.primary_condition() {
                    let _ = write!(out, "  {}  {}", condition.description, condition.icon_url());
                }
                out.push('\n');
            }
        }
    }

    out
}
