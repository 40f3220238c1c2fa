//! Reporting views derived from the visit list
//!
//! Everything here is a pure function of the visits and the evaluation
//! instant. "Local" dates are calendar dates in the offset carried by `now`.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::{
    api::{
        analytics::{AnalyticsResponse, CategoryShare, SummaryStats, TrendPoint, Window},
        visitors::DailyLogResponse,
    },
    models::visitor::{Visit, VisitStatus},
};

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Fallback category for visits without a purpose/type
pub const GENERAL_CATEGORY: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Day,
    Month,
}

impl Window {
    fn granularity(&self) -> Granularity {
        match self {
            Window::Today | Window::Week | Window::Month => Granularity::Day,
            Window::Year | Window::AllTime => Granularity::Month,
        }
    }

    /// First local day inside the window
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Window::Today => Some(today),
            Window::Week => Some(today - Duration::days(6)),
            Window::Month => Some(today - Duration::days(29)),
            Window::Year => {
                let (year, month) = month_from_index(month_index(today) - 11);
                NaiveDate::from_ymd_opt(year, month, 1)
            }
            Window::AllTime => None,
        }
    }
}

/// UTC instant of local midnight starting `date`; `None` outside chrono's range
pub fn local_day_start(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
    date.and_time(NaiveTime::MIN)
        .checked_sub_signed(Duration::seconds(offset.local_minus_utc() as i64))
        .map(|utc| Utc.from_utc_datetime(&utc))
}

fn local_date(instant: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    instant.with_timezone(offset).date_naive()
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn month_from_index(index: i32) -> (i32, u32) {
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn day_bucket(date: NaiveDate) -> (String, String) {
    (
        date.format("%Y-%m-%d").to_string(),
        date.format("%b %d").to_string(),
    )
}

fn month_bucket(index: i32) -> (String, String) {
    let (year, month) = month_from_index(index);
    (
        format!("{:04}-{:02}", year, month),
        format!("{} {}", MONTH_ABBR[month as usize - 1], year),
    )
}

/// Visits checked in inside `window`, never after `now`
pub fn filter_window<'a>(
    visits: &'a [Visit],
    window: Window,
    now: DateTime<FixedOffset>,
) -> Vec<&'a Visit> {
    let offset = *now.offset();
    let start = window.start(now.date_naive());

    visits
        .iter()
        .filter(|v| v.check_in_time <= now)
        .filter(|v| start.map_or(true, |s| local_date(v.check_in_time, &offset) >= s))
        .collect()
}

/// Check-in counts per bucket, sorted by bucket key
pub fn trend(visits: &[&Visit], window: Window, now: DateTime<FixedOffset>) -> Vec<TrendPoint> {
    let offset = *now.offset();
    let today = now.date_naive();
    let mut buckets: BTreeMap<String, (String, i64)> = BTreeMap::new();

    // Pre-seed empty buckets so the series covers the whole window
    match window {
        Window::Week | Window::Month => {
            if let Some(start) = window.start(today) {
                let mut day = start;
                while day <= today {
                    let (key, label) = day_bucket(day);
                    buckets.insert(key, (label, 0));
                    day += Duration::days(1);
                }
            }
        }
        Window::Year => {
            let current = month_index(today);
            for index in (current - 11)..=current {
                let (key, label) = month_bucket(index);
                buckets.insert(key, (label, 0));
            }
        }
        Window::Today | Window::AllTime => {}
    }

    for visit in visits {
        let date = local_date(visit.check_in_time, &offset);
        let (key, label) = match window.granularity() {
            Granularity::Day => day_bucket(date),
            Granularity::Month => month_bucket(month_index(date)),
        };
        buckets.entry(key).or_insert((label, 0)).1 += 1;
    }

    buckets
        .into_iter()
        .map(|(key, (label, visits))| TrendPoint { key, label, visits })
        .collect()
}

fn purpose_of(visit: &Visit) -> Option<&str> {
    Some(visit.purpose.as_str())
}

fn visitor_type_of(visit: &Visit) -> Option<&str> {
    visit.visitor_type.as_deref()
}

/// Share of visits per category; empty when there are no visits
pub fn breakdown<F>(visits: &[&Visit], category: F) -> Vec<CategoryShare>
where
    F: Fn(&Visit) -> Option<&str>,
{
    let total = visits.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for visit in visits {
        let name = category(*visit)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(GENERAL_CATEGORY);
        *counts.entry(name.to_string()).or_insert(0) += 1;
    }

    let mut shares: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(name, count)| CategoryShare {
            percentage: ((count as f64 / total as f64) * 100.0).round() as i64,
            name,
            count,
        })
        .collect();
    // Stable sort keeps names ascending among equal counts
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

/// Stat cards; `all` is the unfiltered list used for "currently inside"
pub fn summary(all: &[Visit], filtered: &[&Visit]) -> SummaryStats {
    let unique: HashSet<&str> = filtered
        .iter()
        .map(|v| {
            v.email
                .as_deref()
                .filter(|e| !e.is_empty())
                .unwrap_or(v.phone.as_str())
        })
        .collect();

    let durations: Vec<f64> = filtered.iter().filter_map(|v| v.duration_minutes()).collect();
    let average_duration_minutes = if durations.is_empty() {
        None
    } else {
        Some((durations.iter().sum::<f64>() / durations.len() as f64).round() as i64)
    };

    SummaryStats {
        total_visits: filtered.len() as i64,
        unique_visitors: unique.len() as i64,
        currently_inside: all.iter().filter(|v| v.is_open()).count() as i64,
        average_duration_minutes,
    }
}

/// Full analytics view for one window
pub fn analyze(visits: &[Visit], window: Window, now: DateTime<FixedOffset>) -> AnalyticsResponse {
    let filtered = filter_window(visits, window, now);

    AnalyticsResponse {
        window,
        since: window.start(now.date_naive()),
        summary: summary(visits, &filtered),
        trend: trend(&filtered, window, now),
        by_purpose: breakdown(&filtered, purpose_of),
        by_visitor_type: breakdown(&filtered, visitor_type_of),
    }
}

/// Visits checked in on the local day `date`, with the day's counts.
/// `status` narrows the returned rows but not the counts.
pub fn daily_log(
    visits: Vec<Visit>,
    date: NaiveDate,
    status: Option<VisitStatus>,
    offset: FixedOffset,
) -> DailyLogResponse {
    let day: Vec<Visit> = visits
        .into_iter()
        .filter(|v| local_date(v.check_in_time, &offset) == date)
        .collect();

    let currently_inside = day.iter().filter(|v| v.is_open()).count() as i64;
    let total = day.len() as i64;

    DailyLogResponse {
        date,
        total,
        currently_inside,
        checked_out: total - currently_inside,
        visitors: day
            .into_iter()
            .filter(|v| status.map_or(true, |s| v.status() == s))
            .collect(),
    }
}
