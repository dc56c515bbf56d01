use chrono::prelude::*;
use log::warn;
use plotters::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
pub mod plot;

pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// category identifiers kept by the filter, everything else is dropped
pub const SELECTED_CATEGORIES: &[&str] = &[
    "https://linked4resilience.eu/data/library",
    "https://linked4resilience.eu/data/museum",
    "https://linked4resilience.eu/data/education",
    "https://linked4resilience.eu/data/religious-site",
];

/// category identifier to the short label shown in the chart legend
pub const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("https://linked4resilience.eu/data/library", "Library"),
    ("https://linked4resilience.eu/data/education", "E&R"),
    ("https://linked4resilience.eu/data/museum", "Museum"),
    ("https://linked4resilience.eu/data/religious-site", "Religious sites"),
];

pub const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// EventID, EventType, EventDate
pub const EXPECTED_COLUMNS: usize = 3;

/// 6 x 3 in at 300 dpi
pub const PLOT_SIZE: (u32, u32) = (1800, 900);

pub fn display_label(category: &str) -> Option<&'static str> {
    CATEGORY_LABELS
        .iter()
        .find(|(uri, _)| *uri == category)
        .map(|(_, label)| *label)
}

/// tries the recognized datetime and date formats in order,
/// returning None when no format matches
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    None
}

/// calendar month used as the aggregation period and as the plot axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_date(date: NaiveDate) -> YearMonth {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// first calendar day of the month, the position of the month on the time axis
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The main struct for the event log, one vector per column
#[derive(Debug, Clone)]
pub struct EventLog {
    pub id: Vec<String>,
    pub category: Vec<String>,
    pub date: Vec<Option<NaiveDate>>,
}

impl EventLog {
    pub fn new(capacity: usize) -> EventLog {
        EventLog {
            id: Vec::with_capacity(capacity),
            category: Vec::with_capacity(capacity),
            date: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Init an EventLog from csv with a header row and the columns
    /// EventID, EventType, EventDate, taken in positional order.
    /// Dates that match none of the recognized formats are kept as None,
    /// the rows are dropped later by drop_undated;
    /// a missing file, a wrong number of header columns,
    /// or a malformed record is an error.
    pub fn from_csv(fin: &Path) -> Result<EventLog, Box<dyn std::error::Error>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(fin)?;
        let ncols = reader.headers()?.len();
        if ncols != EXPECTED_COLUMNS {
            return Err(format!(
                "expected {} columns (EventID, EventType, EventDate), found {}",
                EXPECTED_COLUMNS, ncols
            )
            .into());
        }
        let mut log = EventLog::new(1024);
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let raw_date = record.get(2).unwrap_or("");
            let date = parse_event_date(raw_date);
            if date.is_none() {
                warn!(
                    "line {}: unrecognized date {:?}, row will be dropped",
                    i + 2,
                    raw_date
                );
            }
            log.id.push(record.get(0).unwrap_or("").to_string());
            log.category.push(record.get(1).unwrap_or("").to_string());
            log.date.push(date);
        }
        Ok(log)
    }

    /// drops all the rows whose date could not be parsed,
    /// takes a reference and returns a new EventLog
    pub fn drop_undated(&self) -> EventLog {
        let mut kept = EventLog::new(self.len());
        for ((id, category), date) in self
            .id
            .iter()
            .zip(self.category.iter())
            .zip(self.date.iter())
        {
            if let Some(d) = date {
                kept.id.push(id.clone());
                kept.category.push(category.clone());
                kept.date.push(Some(*d));
            }
        }
        kept
    }

    /// keeps the rows whose category equals one of the given identifiers,
    /// compared by exact string equality
    pub fn keep_categories(&self, categories: &[&str]) -> EventLog {
        let mut kept = EventLog::new(self.len());
        for ((id, category), date) in self
            .id
            .iter()
            .zip(self.category.iter())
            .zip(self.date.iter())
        {
            if categories.contains(&category.as_str()) {
                kept.id.push(id.clone());
                kept.category.push(category.clone());
                kept.date.push(*date);
            }
        }
        kept
    }

    /// counts the events per (month, category) pair and pivots the counts
    /// into a matrix with one row per month, in chronological order,
    /// and one column per category present in the data;
    /// rows without a date are skipped
    pub fn count_by_month(&self) -> MonthlyCounts {
        let mut buckets: BTreeMap<(YearMonth, &str), u64> = BTreeMap::new();
        for (category, date) in self.category.iter().zip(self.date.iter()) {
            let month = match date {
                Some(d) => YearMonth::from_date(*d),
                None => continue,
            };
            *buckets.entry((month, category.as_str())).or_insert(0) += 1;
        }
        let months: Vec<YearMonth> = buckets
            .keys()
            .map(|&(m, _)| m)
            .collect::<BTreeSet<YearMonth>>()
            .into_iter()
            .collect();
        let categories: Vec<String> = buckets
            .keys()
            .map(|&(_, c)| c)
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(String::from)
            .collect();
        let mut counts: Vec<Vec<u64>> = Vec::with_capacity(months.len());
        for month in months.iter() {
            let row: Vec<u64> = categories
                .iter()
                .map(|c| buckets.get(&(*month, c.as_str())).copied().unwrap_or(0))
                .collect();
            counts.push(row);
        }
        MonthlyCounts {
            months,
            categories,
            counts,
        }
    }
}

/// Count matrix from the aggregation, counts[m][c] is the number of events
/// of category c in month m, missing combinations are filled with 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyCounts {
    pub months: Vec<YearMonth>,
    pub categories: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

impl MonthlyCounts {
    /// sum over all cells, equals the number of aggregated rows
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// writes the month and the per-category count columns as a csv at the given path
    pub fn to_csv(&self, fout: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let file = File::create(fout)?;
        let mut buf = BufWriter::new(file);
        write!(buf, "month")?;
        for category in self.categories.iter() {
            write!(buf, ",{}", category)?;
        }
        writeln!(buf)?;
        for (month, row) in self.months.iter().zip(self.counts.iter()) {
            write!(buf, "{}", month)?;
            for n in row.iter() {
                write!(buf, ",{}", n)?;
            }
            writeln!(buf)?;
        }
        Ok(())
    }

    /// plots one line with markers per category column over the month axis
    /// and writes the chart as a png;
    /// every category must have an entry in CATEGORY_LABELS
    /// and the matrix must have at least one month
    pub fn plot_trend(&self, fout: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let (first, last) = match (self.months.first(), self.months.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err("no monthly counts to plot".into()),
        };
        let mut labels: Vec<&'static str> = Vec::with_capacity(self.categories.len());
        for category in self.categories.iter() {
            let label = display_label(category)
                .ok_or_else(|| format!("no display label for category {}", category))?;
            labels.push(label);
        }
        let xmargin = chrono::Duration::days(15);
        let xmin = first.first_day() - xmargin;
        let xmax = last.first_day() + xmargin;
        let ymax = self.counts.iter().flatten().copied().max().unwrap_or(0) + 1;
        let root = BitMapBackend::new(fout, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(40)
            .x_label_area_size(110)
            .y_label_area_size(120)
            .build_cartesian_2d(xmin..xmax, 0u64..ymax)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 28))
            .x_labels(12) // max number of labels
            .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m").to_string())
            .x_desc("Month")
            .y_desc("Number of Events")
            .draw()?;
        for (ci, label) in labels.iter().enumerate() {
            let color = Palette99::pick(ci).to_rgba();
            let points: Vec<(NaiveDate, u64)> = self
                .months
                .iter()
                .zip(self.counts.iter())
                .map(|(m, row)| (m.first_day(), row[ci]))
                .collect();
            chart
                .draw_series(LineSeries::new(
                    points.iter().copied(),
                    color.stroke_width(2),
                ))?
                .label(*label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
            )?;
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 28))
            .draw()?;
        root.present()?;
        Ok(())
    }
}

impl fmt::Display for MonthlyCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "month")?;
        for category in self.categories.iter() {
            write!(f, ",{}", category)?;
        }
        writeln!(f)?;
        for (month, row) in self.months.iter().zip(self.counts.iter()) {
            write!(f, "{}", month)?;
            for n in row.iter() {
                write!(f, ",{}", n)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
