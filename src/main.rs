mod config;
mod conveyor;
mod dispatcher;
mod error;
mod events;
mod factory;
mod logging;
mod sim;
mod storage;
mod types;
mod vehicle;
mod warehouse;

use config::LineConfig;
use error::WarehouseResult;
use warehouse::DrainPolicy;

fn parse_list<T: std::str::FromStr>(arg: &str) -> Option<Vec<T>> {
    if arg == "-" {
        return None;
    }
    let mut values = Vec::new();
    for part in arg.split(',') {
        if part.trim().is_empty() {
            return None;
        }
        values.push(part.trim().parse::<T>().ok()?);
    }
    Some(values)
}

fn print_usage(program: &str) {
    println!("AGV picking line simulator");
    println!("Usage:");
    println!("  {program} (run demo)");
    println!("  {program} bench [vehicles] [pieces] [max_battery] [move_time_ms] [validate] [besteffort]");
    println!("  {program} stress [vehicle_sets] [piece_sets] [battery_sets] [move_time_ms] [validate] [besteffort]");
    println!("  {program} --help");
    println!();
    println!("Sets are comma-separated lists (e.g., 1,2,4). Use \"-\" to keep defaults for a set.");
    println!("Defaults:");
    println!("  demo   vehicles=3 pieces=10 max_battery=5000 move_cost=100");
    println!("  bench  vehicles=4 pieces=100 max_battery=100000 move_time_ms=0");
    println!("  stress vehicles=1,2,4,8 pieces=25,100,400 max_battery=5000,100000 move_time_ms=0");
    println!("Flags:");
    println!("  validate    record events and check every piece was claimed once");
    println!("  besteffort  let idle vehicles leave before the conveyor is closed");
}

fn exit_with_usage(program: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(program);
    std::process::exit(2);
}

/// Split trailing flags from positional arguments.
fn split_flags(args: impl Iterator<Item = String>) -> (Vec<String>, bool, DrainPolicy) {
    let mut positional = Vec::new();
    let mut validate = false;
    let mut policy = DrainPolicy::UntilClosed;
    for arg in args {
        match arg.as_str() {
            "validate" => validate = true,
            "besteffort" => policy = DrainPolicy::BestEffort,
            _ => positional.push(arg),
        }
    }
    (positional, validate, policy)
}

fn run_bench(program: &str, args: Vec<String>, validate: bool, policy: DrainPolicy) -> WarehouseResult<()> {
    if args.len() > 4 {
        exit_with_usage(program, &format!("bench: unexpected argument: {}", args[4]));
    }
    let mut args = args.into_iter();
    let vehicles = args.next().and_then(|v| v.parse::<usize>().ok());
    let pieces = args.next().and_then(|v| v.parse::<usize>().ok());
    let max_battery = args.next().and_then(|v| v.parse::<u32>().ok());
    let move_time_ms = args.next().and_then(|v| v.parse::<u64>().ok());
    sim::run_benchmark(vehicles, pieces, max_battery, move_time_ms, validate, policy)
}

fn run_stress(program: &str, args: Vec<String>, validate: bool, policy: DrainPolicy) -> WarehouseResult<()> {
    let mut vehicle_sets: Option<Vec<usize>> = None;
    let mut piece_sets: Option<Vec<usize>> = None;
    let mut battery_sets: Option<Vec<u32>> = None;
    let mut move_time_ms: Option<u64> = None;

    for (index, arg) in args.iter().enumerate() {
        match index {
            0 if arg != "-" => {
                vehicle_sets = Some(parse_list(arg).unwrap_or_else(|| {
                    exit_with_usage(program, &format!("stress: invalid vehicle_sets value: {arg}"))
                }));
            }
            1 if arg != "-" => {
                piece_sets = Some(parse_list(arg).unwrap_or_else(|| {
                    exit_with_usage(program, &format!("stress: invalid piece_sets value: {arg}"))
                }));
            }
            2 if arg != "-" => {
                battery_sets = Some(parse_list(arg).unwrap_or_else(|| {
                    exit_with_usage(program, &format!("stress: invalid battery_sets value: {arg}"))
                }));
            }
            0..=2 => {}
            3 => match arg.parse::<u64>() {
                Ok(value) => move_time_ms = Some(value),
                Err(_) => exit_with_usage(program, &format!("stress: invalid move_time_ms value: {arg}")),
            },
            _ => exit_with_usage(program, &format!("stress: unexpected argument: {arg}")),
        }
    }

    sim::run_stress(vehicle_sets, piece_sets, battery_sets, move_time_ms, validate, policy)
}

fn main() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "agv_line".to_string());
    let mut args = std::env::args().skip(1);
    let command = args.next();
    let (positional, validate, policy) = split_flags(args);

    let result = match command.as_deref() {
        Some("bench") => run_bench(&program, positional, validate, policy),
        Some("stress") => run_stress(&program, positional, validate, policy),
        Some("--help") | Some("-h") | Some("help") => {
            print_usage(&program);
            Ok(())
        }
        Some(other) => exit_with_usage(&program, &format!("unknown command: {other}")),
        None => sim::run_demo(&LineConfig::default()),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_reads_comma_separated_values() {
        assert_eq!(parse_list::<usize>("1,2, 4"), Some(vec![1, 2, 4]));
        assert_eq!(parse_list::<usize>("-"), None);
        assert_eq!(parse_list::<usize>("1,,2"), None);
        assert_eq!(parse_list::<u32>("x"), None);
    }

    #[test]
    fn flags_are_pulled_out_of_positional_args() {
        let args = ["8", "validate", "200", "besteffort"].map(String::from);
        let (positional, validate, policy) = split_flags(args.into_iter());
        assert_eq!(positional, vec!["8", "200"]);
        assert!(validate);
        assert_eq!(policy, DrainPolicy::BestEffort);
    }
}
