use events_lpp::plot::parse_cli;
use events_lpp::{EventLog, SELECTED_CATEGORIES};

fn main() {
    env_logger::init();
    let (csvin, pngout, countsout) = parse_cli();
    println!(
        "read events from {} and plot to {}",
        csvin.to_str().unwrap(),
        pngout.to_str().unwrap()
    );
    let log = EventLog::from_csv(&csvin).expect("could not read the event csv");
    let dated = log.drop_undated();
    println!("kept {} of {} events with a valid date", dated.len(), log.len());
    let selected = dated.keep_categories(SELECTED_CATEGORIES);
    println!("kept {} events in the selected categories", selected.len());
    let counts = selected.count_by_month();
    if let Some(fout) = countsout {
        counts.to_csv(&fout).expect("could not write the counts csv");
        println!("wrote monthly counts to {}", fout.to_str().unwrap());
    }
    counts.plot_trend(&pngout).expect("could not plot the event trend");
    println!("wrote plot to {}", pngout.to_str().unwrap());
}
