//! Call-center and purchase analytics over raw customer sheet rows
//!
//! Every field is parsed defensively: unparseable numbers count as 0 and are
//! left out of averages, unparseable dates drop the row from any ranged or
//! day-bucketed view.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    CallAnalytics, CallOutcomes, DailyHotLeads, DailyIntent, InterestBreakdown, LabelCount,
    MonthlyPurchase, PeriodSummary, PurchaseStats, SentimentBreakdown, SheetRow,
};
use crate::workflows::percent;

const TOP_OBJECTIONS: usize = 5;
const HISTORY_MONTHS: i32 = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    ThisMonth,
    #[serde(rename = "last_3_months")]
    Last3Months,
    AllTime,
}

impl TimeRange {
    /// Unknown or missing values fall back to `this_month`.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("last_3_months") => TimeRange::Last3Months,
            Some("all_time") => TimeRange::AllTime,
            _ => TimeRange::ThisMonth,
        }
    }

    fn months_back(self) -> i32 {
        match self {
            TimeRange::Last3Months => 2,
            _ => 0,
        }
    }
}

/// Inclusive date span; `end == None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl Period {
    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.start && self.end.is_none_or(|end| d <= end)
    }
}

/// Current and previous period for a ranged view; `None` for all-time.
pub fn periods(range: TimeRange, today: NaiveDate) -> Option<(Period, Period)> {
    if range == TimeRange::AllTime {
        return None;
    }
    let back = range.months_back();
    let current_start = month_start(today, back);
    let previous_start = month_start(today, (back + 1) * 2 - 1);
    let previous_end = current_start.pred_opt().unwrap_or(current_start);
    Some((
        Period {
            start: current_start,
            end: None,
        },
        Period {
            start: previous_start,
            end: Some(previous_end),
        },
    ))
}

/// First day of the month `months_back` months before `today`'s month.
pub fn month_start(today: NaiveDate, months_back: i32) -> NaiveDate {
    let index = today.year() * 12 + today.month0() as i32 - months_back;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .unwrap_or(NaiveDate::MIN)
}

pub fn range_label(range: TimeRange, today: NaiveDate) -> String {
    match range {
        TimeRange::AllTime => "All Time".to_string(),
        TimeRange::Last3Months => format!(
            "{} – {}",
            month_start(today, 2).format("%b %Y"),
            today.format("%b %Y")
        ),
        TimeRange::ThisMonth => today.format("%B %Y").to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Defensive field parsing
// ═══════════════════════════════════════════════════════════════════════════

fn field<'a>(row: &'a SheetRow, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or("")
}

fn field_lower(row: &SheetRow, key: &str) -> String {
    field(row, key).trim().to_lowercase()
}

/// Leading decimal number of `s` (`"7.5/10"` → 7.5), like a lenient float parse.
pub fn parse_leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].trim_end_matches('.').parse().ok()
}

/// Money-ish cell (`"$1,240.50"`) → amount; anything unreadable is 0.
pub fn parse_amount(s: &str) -> f64 {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    parse_leading_number(&digits).unwrap_or(0.0)
}

/// True when a purchase cell records an actual purchase.
pub fn is_purchase(cell: &str) -> bool {
    let v = cell.trim();
    let lower = v.to_lowercase();
    if v.is_empty() || lower == "no" || lower == "false" || v == "0" {
        return false;
    }
    parse_amount(v) > 0.0
}

fn intent_score(row: &SheetRow) -> Option<f64> {
    parse_leading_number(field(row, "purchase_intent_score")).filter(|n| *n > 0.0)
}

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y, %H:%M:%S",
];

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        })
}

/// The row's call date: `Date`, else `call_date`.
pub fn row_date(row: &SheetRow) -> Option<NaiveDate> {
    let date = field(row, "Date");
    let raw = if date.is_empty() { field(row, "call_date") } else { date };
    parse_date(raw)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Mean of the positive intent scores, one decimal; 0 when there are none.
fn average_intent<'a>(rows: impl IntoIterator<Item = &'a SheetRow>) -> f64 {
    let scores: Vec<f64> = rows.into_iter().filter_map(intent_score).collect();
    if scores.is_empty() {
        return 0.0;
    }
    round1(scores.iter().sum::<f64>() / scores.len() as f64)
}

fn is_answered(row: &SheetRow) -> bool {
    field_lower(row, "call_status") == "answered"
}

/// `"price_too_high"` → `"Price Too High"`; `None` for blanks and "none".
pub fn objection_label(raw: &str) -> Option<String> {
    let v = raw.trim().to_lowercase();
    if v.is_empty() || v == "none" {
        return None;
    }
    let spaced = v.replace('_', " ");
    let mut label = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if at_word_start && c.is_alphanumeric() {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    Some(label)
}

/// Top objections by frequency; ties keep first-seen order.
pub fn top_objections(rows: &[&SheetRow]) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = Vec::new();
    for label in rows.iter().filter_map(|r| objection_label(field(r, "primary_objection"))) {
        match counts.iter_mut().find(|c| c.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(LabelCount { label, count: 1 }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_OBJECTIONS);
    counts
}

fn summarize(rows: &[&SheetRow]) -> PeriodSummary {
    let answered: Vec<&SheetRow> = rows.iter().copied().filter(|r| is_answered(r)).collect();
    let interested = answered
        .iter()
        .filter(|r| field_lower(r, "call_outcome") == "interested")
        .count();

    PeriodSummary {
        total_customers: rows.len(),
        calls_answered: answered.len(),
        answer_rate: percent(answered.len(), rows.len()),
        avg_purchase_intent: average_intent(answered.iter().copied()),
        interested_pct: percent(interested, answered.len()),
        objection_count: answered
            .iter()
            .filter(|r| objection_label(field(r, "primary_objection")).is_some())
            .count(),
        total_purchases_post_call: answered
            .iter()
            .filter(|r| is_purchase(field(r, "purchase_post_call")))
            .count(),
    }
}

fn by_day<'a>(rows: &[&'a SheetRow]) -> BTreeMap<NaiveDate, Vec<&'a SheetRow>> {
    let mut days: BTreeMap<NaiveDate, Vec<&SheetRow>> = BTreeMap::new();
    for row in rows {
        if let Some(d) = row_date(row) {
            days.entry(d).or_default().push(*row);
        }
    }
    days
}

fn day_average(days: &BTreeMap<NaiveDate, Vec<&SheetRow>>, key: Option<&NaiveDate>) -> f64 {
    key.and_then(|k| days.get(k))
        .map(|rows| average_intent(rows.iter().copied()))
        .unwrap_or(0.0)
}

fn day_label(d: NaiveDate) -> String {
    d.format("%b %-d").to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// Aggregation
// ═══════════════════════════════════════════════════════════════════════════

/// KPI summary for `range`, compared with the preceding period of equal length.
pub fn aggregate(rows: &[SheetRow], range: TimeRange, today: NaiveDate) -> CallAnalytics {
    let (current, previous): (Vec<&SheetRow>, Vec<&SheetRow>) = match periods(range, today) {
        None => (rows.iter().collect(), Vec::new()),
        Some((cur, prev)) => {
            let in_period = |p: Period| {
                rows.iter()
                    .filter(|r| row_date(r).is_some_and(|d| p.contains(d)))
                    .collect::<Vec<_>>()
            };
            (in_period(cur), in_period(prev))
        }
    };

    let answered: Vec<&SheetRow> = current.iter().copied().filter(|r| is_answered(r)).collect();
    let previous_answered: Vec<&SheetRow> =
        previous.iter().copied().filter(|r| is_answered(r)).collect();

    let mut interest = InterestBreakdown::default();
    let mut sentiment = SentimentBreakdown::default();
    let mut outcomes = CallOutcomes::default();
    for row in &answered {
        match field_lower(row, "interest_level").as_str() {
            "hot" => interest.hot += 1,
            "warm" => interest.warm += 1,
            "cold" => interest.cold += 1,
            "not_interested" => interest.not_interested += 1,
            _ => {}
        }
        match field_lower(row, "sentiment").as_str() {
            "positive" => sentiment.positive += 1,
            "neutral" => sentiment.neutral += 1,
            "negative" => sentiment.negative += 1,
            _ => {}
        }
        match field_lower(row, "call_outcome").as_str() {
            "interested" => outcomes.interested += 1,
            "not_interested" => outcomes.not_interested += 1,
            "needs_more_info" => outcomes.needs_more_info += 1,
            "no_decision" => outcomes.no_decision += 1,
            _ => {}
        }
    }

    let current_days = by_day(&answered);
    let previous_days = by_day(&previous_answered);

    // Buckets are paired by position, not by calendar day.
    let current_keys: Vec<&NaiveDate> = current_days.keys().collect();
    let previous_keys: Vec<&NaiveDate> = previous_days.keys().collect();
    let buckets = current_keys.len().max(previous_keys.len());
    let daily_intent = (0..buckets)
        .map(|i| {
            let c = current_keys.get(i).copied();
            let p = previous_keys.get(i).copied();
            DailyIntent {
                date: c
                    .or(p)
                    .map(|d| day_label(*d))
                    .unwrap_or_else(|| format!("Day {}", i + 1)),
                current: day_average(&current_days, c),
                previous: day_average(&previous_days, p),
            }
        })
        .collect();

    let daily_hot_leads = current_days
        .iter()
        .map(|(day, rows)| DailyHotLeads {
            date: day_label(*day),
            hot_leads: rows
                .iter()
                .filter(|r| field_lower(r, "interest_level") == "hot")
                .count(),
            purchases: rows
                .iter()
                .filter(|r| is_purchase(field(r, "purchase_post_call")))
                .count(),
        })
        .collect();

    let summary = summarize(&current);

    CallAnalytics {
        total_customers: summary.total_customers,
        calls_answered: summary.calls_answered,
        answer_rate: summary.answer_rate,
        avg_purchase_intent: summary.avg_purchase_intent,
        interest_breakdown: interest,
        sentiment_breakdown: sentiment,
        top_objections: top_objections(&current),
        call_outcomes: outcomes,
        range_label: range_label(range, today),
        daily_intent,
        daily_hot_leads,
        total_purchases_post_call: summary.total_purchases_post_call,
        interested_pct: summary.interested_pct,
        objection_count: summary.objection_count,
        previous_period: (range != TimeRange::AllTime).then(|| summarize(&previous)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Purchases
// ═══════════════════════════════════════════════════════════════════════════

fn purchase_amount(row: &SheetRow) -> f64 {
    parse_amount(field(row, "Purchases"))
}

/// Revenue and order counts for this month, the last three months and all time.
pub fn purchase_stats(rows: &[SheetRow], today: NaiveDate) -> PurchaseStats {
    let month = month_start(today, 0);
    let quarter = month_start(today, 2);
    let mut stats = PurchaseStats::default();

    for row in rows {
        let amount = purchase_amount(row);
        if amount <= 0.0 {
            continue;
        }
        stats.all_time += amount;
        stats.all_time_count += 1;

        let Some(d) = row_date(row) else { continue };
        if d >= quarter {
            stats.last3_months += amount;
            stats.last3_months_count += 1;
        }
        if d >= month {
            stats.this_month += amount;
            stats.this_month_count += 1;
        }
    }

    stats.this_month = round2(stats.this_month);
    stats.last3_months = round2(stats.last3_months);
    stats.all_time = round2(stats.all_time);
    stats
}

/// Revenue per calendar month for the last six months, oldest first.
pub fn purchase_history(rows: &[SheetRow], today: NaiveDate) -> Vec<MonthlyPurchase> {
    let mut months: Vec<(NaiveDate, MonthlyPurchase)> = (0..HISTORY_MONTHS)
        .rev()
        .map(|back| {
            let start = month_start(today, back);
            (
                start,
                MonthlyPurchase {
                    month: start.format("%b %Y").to_string(),
                    total: 0.0,
                    count: 0,
                },
            )
        })
        .collect();

    for row in rows {
        let amount = purchase_amount(row);
        if amount <= 0.0 {
            continue;
        }
        let Some(d) = row_date(row) else { continue };
        if let Some((_, bucket)) = months
            .iter_mut()
            .find(|(start, _)| start.year() == d.year() && start.month() == d.month())
        {
            bucket.total += amount;
            bucket.count += 1;
        }
    }

    months
        .into_iter()
        .map(|(_, mut m)| {
            m.total = round2(m.total);
            m
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_number_is_lenient() {
        assert_eq!(parse_leading_number("7.5/10"), Some(7.5));
        assert_eq!(parse_leading_number(" 8 "), Some(8.0));
        assert_eq!(parse_leading_number("-2"), Some(-2.0));
        assert_eq!(parse_leading_number("n/a"), None);
        assert_eq!(parse_leading_number(""), None);
        assert_eq!(parse_leading_number("3."), Some(3.0));
    }

    #[test]
    fn amounts_strip_currency() {
        assert_eq!(parse_amount("$1,240.50"), 1240.5);
        assert_eq!(parse_amount("free"), 0.0);
    }

    #[test]
    fn purchase_sentinels() {
        assert!(!is_purchase(""));
        assert!(!is_purchase("No"));
        assert!(!is_purchase("false"));
        assert!(!is_purchase("0"));
        assert!(!is_purchase("yes"));
        assert!(is_purchase("$35"));
    }

    #[test]
    fn dates_in_common_sheet_formats() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(parse_date("2026-03-04"), Some(d));
        assert_eq!(parse_date("3/4/2026"), Some(d));
        assert_eq!(parse_date("2026-03-04T15:20:00Z"), Some(d));
        assert_eq!(parse_date("2026-03-04 15:20:00"), Some(d));
        assert_eq!(parse_date("March 4, 2026"), Some(d));
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn month_start_crosses_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        assert_eq!(month_start(today, 2), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(month_start(today, 5), NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
    }

    #[test]
    fn previous_period_matches_length() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 20).unwrap();
        let (cur, prev) = periods(TimeRange::Last3Months, today).unwrap();
        assert_eq!(cur.start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(prev.start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(prev.end, Some(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()));
        assert!(periods(TimeRange::AllTime, today).is_none());
    }

    #[test]
    fn objection_labels_are_title_cased() {
        assert_eq!(objection_label("price_too_high").as_deref(), Some("Price Too High"));
        assert_eq!(objection_label("ALREADY_USES_BRAND").as_deref(), Some("Already Uses Brand"));
        assert_eq!(objection_label("None"), None);
        assert_eq!(objection_label("  "), None);
    }
}
