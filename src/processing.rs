use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{FaultColorPolicy, ProcessingConfig};
use crate::hours;
use crate::types::{AtmRecord, Marker};

/// Sentinel values used by the wire format.
pub const ROUND_THE_CLOCK: &str = "Круглосуточно";
pub const NO_FAULT: &str = "нет";
pub const CASH_IN_YES: &str = "да";

/// Dedup key: hash of the street address plus house number. Only
/// uniqueness matters here, not collision resistance.
pub fn address_key(record: &AtmRecord) -> String {
    sha256::digest(format!("{} {}", record.address, record.house))
}

/// Single pass over the fetched regions in their configured order,
/// records in response order. The first record per unique address wins;
/// later duplicates are dropped. Records without parseable coordinates
/// are skipped.
pub fn build_markers(
    config: &ProcessingConfig,
    regions: &[(String, Vec<AtmRecord>)],
) -> Vec<Marker> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut markers = Vec::new();

    for (region, records) in regions {
        for record in records {
            if !seen.insert(address_key(record)) {
                continue;
            }

            let coords = record
                .gps_x
                .trim()
                .parse::<f64>()
                .and_then(|lat| record.gps_y.trim().parse::<f64>().map(|lng| (lat, lng)));
            let (lat, lng) = match coords {
                Ok(c) => c,
                Err(_) => {
                    warn!(
                        %region,
                        address = %record.address,
                        gps_x = %record.gps_x,
                        gps_y = %record.gps_y,
                        "skipping record with unparseable coordinates"
                    );
                    continue;
                }
            };

            markers.push(Marker {
                lat,
                lng,
                popup: compose_popup(config, record),
            });
        }
    }

    info!(markers = markers.len(), "built marker list");
    markers
}

fn currency_color(config: &ProcessingConfig, currency: &str) -> &'static str {
    match currency {
        "BYN" => "green",
        "USD" => "blue",
        _ => config.unknown_currency_color.as_css(),
    }
}

fn availability_color(policy: FaultColorPolicy, atm_error: &str) -> &'static str {
    let no_fault = atm_error == NO_FAULT;
    match policy {
        FaultColorPolicy::FaultIsRed => {
            if no_fault {
                "green"
            } else {
                "red"
            }
        }
        FaultColorPolicy::FaultIsGreen => {
            if no_fault {
                "red"
            } else {
                "green"
            }
        }
    }
}

fn round_the_clock(record: &AtmRecord) -> bool {
    record.work_time_full == ROUND_THE_CLOCK
}

fn working_hours_text(config: &ProcessingConfig, record: &AtmRecord) -> String {
    if !config.reformat_hours {
        return record.work_time_full.clone();
    }
    if round_the_clock(record) {
        hours::OPEN_DAILY.to_string()
    } else {
        hours::reformat(&record.work_time)
    }
}

fn compose_popup(config: &ProcessingConfig, record: &AtmRecord) -> String {
    let currency = currency_color(config, &record.currency);
    let twenty_four_seven = if round_the_clock(record) { "green" } else { "red" };
    let availability = availability_color(config.fault_color, &record.atm_error);
    let cash_in = if record.cash_in == CASH_IN_YES { "green" } else { "red" };
    let work_time = working_hours_text(config, record);

    format!(
        "<b>{}</b><br>Улица: {}<br>Номер банкомата: {}\
         <br><span style=\"color: {currency};\">Выдаваемая валюта: {}</span>\
         <br><span style=\"color: {twenty_four_seven};\">Работает 24/7: {}</span>\
         <br><span style=\"color: {availability};\">Исправность банкомата: {}</span>\
         <br><span style=\"color: {cash_in};\">Наличие купюроприемника: {}</span>",
        record.install_place_full,
        record.address,
        record.install_place,
        record.currency,
        work_time,
        record.atm_error,
        record.cash_in,
    )
}

/// The fixed substrings the client-side checkboxes test popups against.
/// Derived server-side so the page script never hardcodes text that
/// depends on the configured policies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSubstrings {
    pub currency: String,
    pub round_clock: String,
    pub fault: String,
    pub cash_in: String,
}

pub fn filter_substrings(config: &ProcessingConfig) -> FilterSubstrings {
    let round_clock_text = if config.reformat_hours {
        hours::OPEN_DAILY
    } else {
        ROUND_THE_CLOCK
    };
    FilterSubstrings {
        currency: "Выдаваемая валюта: BYN".to_string(),
        round_clock: format!("Работает 24/7: {round_clock_text}"),
        fault: format!("Исправность банкомата: {NO_FAULT}"),
        cash_in: format!("Наличие купюроприемника: {CASH_IN_YES}"),
    }
}
