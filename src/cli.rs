//! Defines command-line interface options using `clap` for the dc-chunker planner.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use dc_chunker::geographic::DEFAULT_GEOGRAPHIC_CHUNK_SIZE;
use dc_chunker::temporal::DEFAULT_TIME_CHUNK_SIZE;

/// Plan chunked loads for data cube queries and print the plan as JSON
#[derive(Parser, Debug)]
#[command(
    version,
    name = "dc-chunker",
    about = "Plan geographic and temporal chunks for incremental data cube loads"
)]
pub struct Args {
    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads for the global thread pool. Defaults to Rayon's choice.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a bounding box into latitude bands
    Geo {
        /// Latitude range, formatted as <min>,<max>
        #[arg(long, value_parser = parse_range, allow_hyphen_values = true)]
        latitude: (f64, f64),

        /// Longitude range, formatted as <min>,<max>
        #[arg(long, value_parser = parse_range, allow_hyphen_values = true)]
        longitude: (f64, f64),

        /// Target area per chunk in square degrees
        #[arg(long, default_value_t = DEFAULT_GEOGRAPHIC_CHUNK_SIZE)]
        chunk_size: f64,
    },

    /// Sort acquisition dates into batches or calendar groups
    Time {
        /// Comma separated dates, RFC 3339 or YYYY-MM-DD
        #[arg(long, required = true, value_delimiter = ',', value_parser = parse_datetime)]
        dates: Vec<DateTime<Utc>>,

        /// Number of dates per batch
        #[arg(long, default_value_t = DEFAULT_TIME_CHUNK_SIZE)]
        chunk_size: usize,

        /// Put every date in a single batch
        #[arg(long, conflicts_with = "chunk_size")]
        no_limit: bool,

        /// Sort most recent first
        #[arg(long)]
        reverse: bool,

        /// Group sorted dates by calendar field instead of batching
        #[arg(long, value_enum)]
        group_by: Option<GroupBy>,

        /// Months kept when grouping by month, e.g. 6,7,8
        #[arg(long, value_delimiter = ',', requires = "group_by")]
        months: Option<Vec<u32>>,
    },

    /// Print baseline windows over the indices 0..length
    Baseline {
        /// Length of the sequence
        #[arg(long)]
        length: usize,

        /// Window length
        #[arg(long)]
        window: usize,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Year,
    Month,
}

fn parse_range(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(',').collect();
    match parts.as_slice() {
        [min, max] => {
            let min = min
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid range start '{}'", min))?;
            let max = max
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid range end '{}'", max))?;
            Ok((min, max))
        }
        _ => Err("Invalid format: Expected '<min>,<max>'.".to_string()),
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("Invalid date '{}': expected RFC 3339 or YYYY-MM-DD", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_geo_with_negative_ranges() {
        let args = Args::try_parse_from([
            "dc-chunker",
            "geo",
            "--latitude",
            "-35,-33.5",
            "--longitude",
            "150,151.25",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Command::Geo {
                latitude,
                longitude,
                chunk_size,
            } => {
                assert_eq!(latitude, (-35.0, -33.5));
                assert_eq!(longitude, (150.0, 151.25));
                assert_eq!(chunk_size, DEFAULT_GEOGRAPHIC_CHUNK_SIZE);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_time_grouping() {
        let args = Args::try_parse_from([
            "dc-chunker",
            "time",
            "--dates",
            "2020-06-01,2020-07-01T12:00:00Z",
            "--group-by",
            "month",
            "--months",
            "6,7",
        ])
        .unwrap();

        match args.command {
            Command::Time {
                dates,
                group_by,
                months,
                chunk_size,
                ..
            } => {
                assert_eq!(
                    dates,
                    vec![
                        Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(),
                        Utc.with_ymd_and_hms(2020, 7, 1, 12, 0, 0).unwrap(),
                    ]
                );
                assert_eq!(group_by, Some(GroupBy::Month));
                assert_eq!(months, Some(vec![6, 7]));
                assert_eq!(chunk_size, DEFAULT_TIME_CHUNK_SIZE);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_months_require_group_by() {
        let result = Args::try_parse_from([
            "dc-chunker",
            "time",
            "--dates",
            "2020-06-01",
            "--months",
            "6",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(Args::try_parse_from(["dc-chunker", "geo", "--latitude", "0", "--longitude", "0,1"]).is_err());
        assert!(Args::try_parse_from(["dc-chunker", "time", "--dates", "yesterday"]).is_err());
        assert!(Args::try_parse_from([
            "dc-chunker",
            "time",
            "--dates",
            "2020-01-01",
            "--chunk-size",
            "3",
            "--no-limit",
        ])
        .is_err());
    }

    #[test]
    fn test_parse_baseline() {
        let args = Args::try_parse_from(["dc-chunker", "baseline", "--length", "5", "--window", "2"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Baseline {
                length: 5,
                window: 2
            }
        ));
    }
}
