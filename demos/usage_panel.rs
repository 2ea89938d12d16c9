//! Collect usage and graph panel data from an in-memory sample source.
//!
//! Run with:
//! ```sh
//! cargo run --example usage_panel
//! ```

use chrono::{Duration, Timelike, Utc};
use sensor_panel::{
    DurationParts, GraphData, PanelConfig, SensorData, SeriesQuery, UsageData,
};

const CONFIG: &str = r#"
influxdb:
  url: "http://localhost:8086"
  org: "home"
  bucket: "sensor"
usage:
  target:
    type: "sensor.power"
    host: "meter"
    param: "power"
    threshold:
      work: 100
      wake: 10
graph:
  param:
    name: "temp"
    unit: "C"
    range: [0, 40]
  equip_list:
    - type: "sensor.rasp"
      host: "room-1"
      label: "Living"
    - type: "sensor.rasp"
      host: "room-2"
  valve:
    type: "sensor.flow"
    host: "cooler"
    param: "flow"
    threshold:
      full: 2.0
      interm: 0.1
"#;

/// Twelve 10-minute buckets ending now, shaped differently per host.
fn fake_influx(query: &SeriesQuery) -> Result<SensorData, sensor_panel::Error> {
    let now = Utc::now().with_second(0).unwrap_or_else(Utc::now);
    let time = (0..12)
        .rev()
        .map(|i| (now - Duration::minutes(10 * i)).fixed_offset())
        .collect();

    let value: Vec<Option<f64>> = match query.hostname.as_str() {
        "meter" => [0, 120, 130, 40, 40, 40, 0, 150, 150, 20, 0, 0]
            .iter()
            .map(|&v| Some(f64::from(v)))
            .collect(),
        "room-1" => (0..12).map(|i| Some(20.0 + f64::from(i) * 0.2)).collect(),
        "cooler" => [0.0, 0.5, 2.5, 3.0, 1.0, 0.0, 0.0, 2.2, 2.4, 0.3, 0.0, 0.0]
            .iter()
            .map(|&v| Some(v))
            .collect(),
        _ => return Err(sensor_panel::Error::Fetch("host unreachable".to_string())),
    };

    Ok(SensorData::new(value, time))
}

fn main() -> Result<(), sensor_panel::Error> {
    let config = PanelConfig::from_yaml(CONFIG)?;
    let now = Utc::now().with_timezone(&config.tz()?);

    let usage = UsageData::collect(&fake_influx, &config, &now)?;
    let work = DurationParts::from_minutes(usage.summary.work_minutes);
    println!(
        "Usage over {}: {}h {}m working, {} min left on (shown: {})",
        usage.period,
        work.hours.unwrap_or(0),
        work.minutes_text().unwrap_or_else(|| "00".to_string()),
        usage.summary.leave_minutes,
        usage.summary.show_leave()
    );

    let graph = GraphData::collect(&fake_influx, &config, &now)?;
    println!("Graph axis starts at {}", graph.time_begin);
    for row in &graph.rows {
        match row.latest {
            Some(value) => println!("  {}: {:.1}", row.title, value),
            None => println!("  {}: ?", row.title),
        }
    }
    for range in &graph.valve_ranges {
        let band = if range.is_full { "FULL" } else { "INTERM" };
        println!("  valve {} {} -> {}", band, range.start.format("%H:%M"), range.end.format("%H:%M"));
    }

    Ok(())
}
