use super::VERSION;
use clap::{App, Arg};
use std::path::PathBuf;

/// Takes the CLI arguments that control the loading and plotting of the event trend.
pub fn parse_cli() -> (PathBuf, PathBuf, Option<PathBuf>) {
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("name of the input csv file with the event log")
        .short("f")
        .long("csvfile")
        .takes_value(true)
        .required(true)
        .default_value("Query.csv");
    let arg_pngout = Arg::with_name("output_pngfile")
        .help("name of the output png file")
        .short("o")
        .long("pngfile")
        .takes_value(true)
        .default_value("event_trend_plot.png");
    let arg_countsout = Arg::with_name("output_countsfile")
        .help("also save the aggregated monthly counts to this csv file")
        .short("s")
        .long("countsfile")
        .takes_value(true);
    let cli_args = App::new("Events_plot")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot the monthly trend of events by category")
        .arg(arg_csvin)
        .arg(arg_pngout)
        .arg(arg_countsout)
        .get_matches();
    let csvin = PathBuf::from(cli_args.value_of("input_csvfile").unwrap_or_default());
    let pngout = PathBuf::from(cli_args.value_of("output_pngfile").unwrap_or_default());
    let countsout = cli_args.value_of("output_countsfile").map(PathBuf::from);
    return (csvin, pngout, countsout);
}
