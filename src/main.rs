//! Entry point for the dc-chunker planner.
//! Parses CLI arguments, builds the requested chunk plan and prints it as JSON.

use clap::Parser;
use dc_chunker::prelude::*;
use env_logger::Env;
use log::info;
use serde_json::{json, Value as JsonValue};

mod cli;

use cli::{Args, Command, GroupBy};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    ParallelConfig::new(args.threads).setup_global_pool()?;

    let plan = match args.command {
        Command::Geo {
            latitude,
            longitude,
            chunk_size,
        } => geo_plan(latitude, longitude, chunk_size)?,
        Command::Time {
            dates,
            chunk_size,
            no_limit,
            reverse,
            group_by,
            months,
        } => {
            let order = if reverse {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            match group_by {
                Some(group_by) => group_plan(&dates, order, group_by, months)?,
                None => {
                    let chunker = TimeChunker {
                        order,
                        chunk_size: (!no_limit).then_some(chunk_size),
                    };
                    batch_plan(&chunker, &dates)?
                }
            }
        }
        Command::Baseline { length, window } => baseline_plan(length, window)?,
    };

    println!("{}", render_plan(&plan)?);
    Ok(())
}

fn render_plan(plan: &JsonValue) -> Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

fn geo_plan(latitude: (f64, f64), longitude: (f64, f64), chunk_size: f64) -> Result<JsonValue> {
    let chunks = create_geographic_chunks(Some(longitude), Some(latitude), chunk_size)?;
    info!(
        "Planned {} geographic chunks over lat {:?}, lon {:?}",
        chunks.len(),
        latitude,
        longitude
    );
    Ok(JsonValue::Array(
        chunks.iter().map(ChunkDescriptor::to_json).collect(),
    ))
}

fn batch_plan(chunker: &TimeChunker, dates: &[chrono::DateTime<chrono::Utc>]) -> Result<JsonValue> {
    let batches = chunker.chunk(dates)?;
    info!("Planned {} time batches from {} dates", batches.len(), dates.len());
    Ok(JsonValue::Array(
        batches
            .iter()
            .map(|batch| json!(batch.iter().map(|d| d.to_rfc3339()).collect::<Vec<_>>()))
            .collect(),
    ))
}

fn group_plan(
    dates: &[chrono::DateTime<chrono::Utc>],
    order: SortOrder,
    group_by: GroupBy,
    months: Option<Vec<u32>>,
) -> Result<JsonValue> {
    // Grouping only joins adjacent dates, so sort first.
    let sorted = create_time_chunks(dates, order, None)?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    let groups: Vec<JsonValue> = match group_by {
        GroupBy::Year => group_datetimes_by_year(&sorted)
            .into_iter()
            .map(|g| group_json(i64::from(g.key), &g.members))
            .collect(),
        GroupBy::Month => {
            let filter = match months {
                Some(months) => MonthFilter::new(months)?,
                None => MonthFilter::default(),
            };
            group_datetimes_by_month(&sorted, &filter)
                .into_iter()
                .map(|g| group_json(i64::from(g.key), &g.members))
                .collect()
        }
    };
    info!("Planned {} {:?} groups from {} dates", groups.len(), group_by, dates.len());
    Ok(JsonValue::Array(groups))
}

fn group_json(key: i64, members: &[chrono::DateTime<chrono::Utc>]) -> JsonValue {
    json!({
        "key": key,
        "members": members.iter().map(|d| d.to_rfc3339()).collect::<Vec<_>>(),
    })
}

fn baseline_plan(length: usize, window: usize) -> Result<JsonValue> {
    let indices: Vec<usize> = (0..length).collect();
    let windows = generate_baseline(&indices, window)?;
    Ok(json!(windows))
}
