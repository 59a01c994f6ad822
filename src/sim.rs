//! Demo, benchmark, and stress-test runners for the picking line.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::LineConfig;
use crate::dispatcher::{DispatchReport, dispatch};
use crate::error::{WarehouseError, WarehouseResult};
use crate::events::{ConsoleObserver, FanOut, LineObserver, NoopObserver, RecordingObserver};
use crate::factory::{PieceFactory, RandomPieceFactory};
use crate::log_dev;
use crate::storage::Storage;
use crate::vehicle::Agvs;
use crate::warehouse::{DrainPolicy, Warehouse};

// Bench defaults give vehicles enough charge to drain a typical backlog.
const BENCH_VEHICLES: usize = 4;
const BENCH_PIECES: usize = 100;
const BENCH_MAX_BATTERY: u32 = 100_000;

const CSV_HEADER: &str = "vehicles,pieces,max_battery,policy,elapsed_ms,throughput_pieces_per_s,delivered,lost,leftover,failed_vehicles,cpu_user_s,cpu_sys_s,duplicate_claims";

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data, and getrusage only writes into it.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let seconds = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0;
    Some((seconds(usage.ru_utime), seconds(usage.ru_stime)))
}

#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Feed `count` random pieces onto the conveyor, then close it.
fn load_conveyor(warehouse: &Warehouse, config: &LineConfig) -> WarehouseResult<()> {
    let mut factory = RandomPieceFactory::new(config.shape_factories(), config.seed)?;
    for _ in 0..config.pieces {
        warehouse
            .add_piece(factory.create())
            .map_err(|piece| WarehouseError::LineClosed(piece.id()))?;
    }
    warehouse.close();
    Ok(())
}

/// Take every parked vehicle out of the depot, oldest first.
fn take_all(depot: &mut Storage<Agvs>) -> WarehouseResult<Vec<Agvs>> {
    let mut vehicles = Vec::with_capacity(depot.len());
    while !depot.is_empty() {
        vehicles.push(depot.remove()?);
    }
    Ok(vehicles)
}

fn has_duplicates(recorder: &RecordingObserver) -> bool {
    let loaded = recorder.loaded_pieces();
    let unique: HashSet<_> = loaded.iter().collect();
    unique.len() != loaded.len()
}

/// Piece accounting after a run.
struct Tally {
    delivered: usize,
    lost: usize,
    leftover: usize,
}

impl Tally {
    fn of(warehouse: &Warehouse, report: &DispatchReport) -> Self {
        Self {
            delivered: warehouse.delivered(),
            lost: report.lost_pieces().len(),
            leftover: warehouse.line().remaining(),
        }
    }

    fn total(&self) -> usize {
        self.delivered + self.lost + self.leftover
    }
}

/// Run the standard line once, printing every event and the final storages.
pub fn run_demo(config: &LineConfig) -> WarehouseResult<()> {
    config.validate()?;
    log_dev!("[DEMO] start");

    let recorder = Arc::new(RecordingObserver::new());
    let observer: Arc<dyn LineObserver> = Arc::new(FanOut(vec![
        Arc::new(ConsoleObserver) as Arc<dyn LineObserver>,
        recorder.clone(),
    ]));
    let warehouse = Arc::new(config.build_warehouse(observer));

    load_conveyor(&warehouse, config)?;
    println!(
        "Picking point is at {}",
        warehouse.line().picking_point_position()
    );

    let mut depot = config.build_depot();
    println!("Vehicles parked at {}: {depot}", depot.position());
    let vehicles = take_all(&mut depot)?;

    let start = Instant::now();
    let report = dispatch(&warehouse, vehicles);
    log_dev!("[DEMO] finished in {}ms", start.elapsed().as_millis());

    for failure in &report.failures {
        eprintln!("{}", failure.reason);
    }
    for storage in warehouse.storages().iter().rev() {
        println!("{storage}");
    }

    let tally = Tally::of(&warehouse, &report);
    println!("DEMO SUMMARY");
    println!("vehicles={} pieces_total={}", config.vehicles, config.pieces);
    let per_vehicle: Vec<usize> = report.vehicles.iter().map(|v| v.delivered).collect();
    println!("delivered_per_vehicle={per_vehicle:?}");
    println!("delivered={}", tally.delivered);
    println!("lost={}", tally.lost);
    println!("leftover={}", tally.leftover);
    println!("failed_vehicles={}", report.failures.len());
    println!("duplicate_claims={}", has_duplicates(&recorder));
    println!("conserved={}", tally.total() == config.pieces);
    Ok(())
}

/// Aggregated metrics from a single benchmark run.
struct BenchResult {
    vehicles: usize,
    pieces: usize,
    max_battery: u32,
    policy: DrainPolicy,
    elapsed_ms: f64,
    throughput: f64,
    tally: Tally,
    failed_vehicles: usize,
    cpu_user_s: Option<f64>,
    cpu_sys_s: Option<f64>,
    duplicate_claims: Option<bool>,
}

fn benchmark_once(config: &LineConfig, validate: bool) -> WarehouseResult<BenchResult> {
    config.validate()?;
    let recorder = validate.then(|| Arc::new(RecordingObserver::new()));
    let observer: Arc<dyn LineObserver> = match recorder.as_ref() {
        Some(recorder) => recorder.clone(),
        None => Arc::new(NoopObserver),
    };
    let warehouse = Arc::new(config.build_warehouse(observer));
    load_conveyor(&warehouse, config)?;
    let mut depot = config.build_depot();
    let vehicles = take_all(&mut depot)?;

    let cpu_start = cpu_times_seconds();
    let start = Instant::now();
    let report = dispatch(&warehouse, vehicles);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let tally = Tally::of(&warehouse, &report);
    let throughput = if elapsed_ms > 0.0 {
        tally.delivered as f64 / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    Ok(BenchResult {
        vehicles: config.vehicles,
        pieces: config.pieces,
        max_battery: config.max_battery,
        policy: config.policy,
        elapsed_ms,
        throughput,
        failed_vehicles: report.failures.len(),
        tally,
        cpu_user_s,
        cpu_sys_s,
        duplicate_claims: recorder.as_deref().map(has_duplicates),
    })
}

fn print_row(result: &BenchResult) {
    let format_cpu = |value: Option<f64>| {
        value
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string())
    };
    let policy = match result.policy {
        DrainPolicy::BestEffort => "best_effort",
        DrainPolicy::UntilClosed => "until_closed",
    };
    let duplicates = result
        .duplicate_claims
        .map(|d| d.to_string())
        .unwrap_or_else(|| "NA".to_string());
    println!(
        "{},{},{},{},{:.2},{:.2},{},{},{},{},{},{},{}",
        result.vehicles,
        result.pieces,
        result.max_battery,
        policy,
        result.elapsed_ms,
        result.throughput,
        result.tally.delivered,
        result.tally.lost,
        result.tally.leftover,
        result.failed_vehicles,
        format_cpu(result.cpu_user_s),
        format_cpu(result.cpu_sys_s),
        duplicates,
    );
    if result.tally.total() != result.pieces {
        eprintln!("# violation,piece_conservation");
    }
    if result.duplicate_claims == Some(true) {
        eprintln!("# violation,duplicate_claims");
    }
}

/// Run a single benchmark with optional parameter overrides.
pub fn run_benchmark(
    vehicles: Option<usize>,
    pieces: Option<usize>,
    max_battery: Option<u32>,
    move_time_ms: Option<u64>,
    validate: bool,
    policy: DrainPolicy,
) -> WarehouseResult<()> {
    let config = LineConfig {
        vehicles: vehicles.unwrap_or(BENCH_VEHICLES),
        pieces: pieces.unwrap_or(BENCH_PIECES),
        max_battery: max_battery.unwrap_or(BENCH_MAX_BATTERY),
        move_time_ms: move_time_ms.unwrap_or(0),
        policy,
        ..LineConfig::default()
    };
    let result = benchmark_once(&config, validate)?;
    println!("{CSV_HEADER}");
    print_row(&result);
    Ok(())
}

/// Sweep multiple benchmark configurations and print CSV output.
pub fn run_stress(
    vehicle_sets: Option<Vec<usize>>,
    piece_sets: Option<Vec<usize>>,
    battery_sets: Option<Vec<u32>>,
    move_time_ms: Option<u64>,
    validate: bool,
    policy: DrainPolicy,
) -> WarehouseResult<()> {
    let vehicle_sets = vehicle_sets.unwrap_or_else(|| vec![1, 2, 4, 8]);
    let piece_sets = piece_sets.unwrap_or_else(|| vec![25, 100, 400]);
    let battery_sets = battery_sets.unwrap_or_else(|| vec![5_000, BENCH_MAX_BATTERY]);
    let move_time_ms = move_time_ms.unwrap_or(0);

    // Validate the whole sweep before printing anything.
    let mut configs = Vec::new();
    for &vehicles in &vehicle_sets {
        for &pieces in &piece_sets {
            for &max_battery in &battery_sets {
                let config = LineConfig {
                    vehicles,
                    pieces,
                    max_battery,
                    move_time_ms,
                    policy,
                    ..LineConfig::default()
                };
                config.validate()?;
                configs.push(config);
            }
        }
    }

    println!("{CSV_HEADER}");
    for config in configs {
        let result = benchmark_once(&config, validate)?;
        print_row(&result);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmark_accounts_for_every_piece() {
        let config = LineConfig {
            vehicles: 3,
            pieces: 40,
            max_battery: BENCH_MAX_BATTERY,
            ..LineConfig::default()
        };
        let result = benchmark_once(&config, true).expect("valid config");
        assert_eq!(result.tally.total(), 40);
        assert_eq!(result.tally.delivered, 40);
        assert_eq!(result.failed_vehicles, 0);
        assert_eq!(result.duplicate_claims, Some(false));
    }

    #[test]
    fn low_battery_run_still_conserves_pieces() {
        let config = LineConfig {
            vehicles: 2,
            pieces: 30,
            max_battery: 1_000,
            policy: DrainPolicy::BestEffort,
            ..LineConfig::default()
        };
        let result = benchmark_once(&config, true).expect("valid config");
        assert_eq!(result.tally.total(), 30);
        // Ten cells per vehicle cannot drain thirty pieces.
        assert_eq!(result.failed_vehicles, 2);
        assert!(result.tally.leftover > 0);
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let config = LineConfig {
            vehicles: 0,
            ..LineConfig::default()
        };
        assert!(benchmark_once(&config, false).is_err());
    }

    #[test]
    fn depot_is_emptied_in_order() {
        let mut depot = LineConfig::default().build_depot();
        let vehicles = take_all(&mut depot).expect("check-first removal");
        let ids: Vec<_> = vehicles.iter().map(Agvs::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(depot.is_empty());
    }
}
