//! Presentation fields derived from raw internship documents: aggregate
//! cost and deadline values, the "new" badge, and deadline urgency colors.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::models::{Costs, DateField, DeadlineEntry, PriceValue};
use crate::normalize::{normalize_date, parse_date};

/// Minimum of all numeric "lowest" values across cost entries. An absent
/// section, an empty list, or all-non-numeric entries mean the program is
/// treated as free - unknown cost is shown as 0, not an error.
pub fn lowest_cost(cost: Option<&Costs>) -> f64 {
    let Some(entries) = cost.and_then(|c| c.costs.as_deref()) else {
        return 0.0;
    };
    entries
        .iter()
        .filter_map(|entry| match entry.lowest {
            Some(PriceValue::Amount(a)) => Some(a),
            _ => None,
        })
        .fold(None, |min: Option<f64>, a| {
            Some(match min {
                Some(m) => m.min(a),
                None => a,
            })
        })
        .unwrap_or(0.0)
}

/// Earliest valid date across deadline entries, or None if nothing parses.
/// Placeholder and unparseable dates are skipped. A true minimum, so list
/// order never matters.
pub fn earliest_deadline(deadlines: &[DeadlineEntry]) -> Option<NaiveDate> {
    deadlines
        .iter()
        .filter_map(|d| d.date.as_deref())
        .filter_map(parse_date)
        .map(|dt| dt.date_naive())
        .min()
}

/// Whole days from `today` until `deadline`. Negative when overdue.
pub fn days_until(deadline: NaiveDate, today: NaiveDate) -> i64 {
    (deadline - today).num_days()
}

/// True iff the listing was added within the trailing 7-day window ending at
/// `now` (inclusive on both ends). Absent or unparseable dates are false.
pub fn is_recent(date_added: Option<&DateField>, now: DateTime<Utc>) -> bool {
    let Some(added) = normalize_date(date_added) else {
        log::debug!("recency check skipped: no usable date_added");
        return false;
    };
    let age = now.signed_duration_since(added);
    age >= TimeDelta::zero() && age <= TimeDelta::days(7)
}

/// Display color for a deadline countdown. Buckets are fixed and checked in
/// order, first match wins; the boundaries are inclusive on the upper end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyColor {
    /// No deadline / unknown.
    Gray,
    /// Overdue (0 days or fewer remaining).
    Red,
    /// 1-3 days remaining.
    DarkRed,
    /// 4-7 days remaining.
    Amber,
    /// More than a week out.
    Green,
}

impl UrgencyColor {
    pub fn hex(self) -> &'static str {
        match self {
            UrgencyColor::Gray => "#9e9e9e",
            UrgencyColor::Red => "#e53935",
            UrgencyColor::DarkRed => "#8e0000",
            UrgencyColor::Amber => "#ffb300",
            UrgencyColor::Green => "#43a047",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UrgencyColor::Gray => "no deadline",
            UrgencyColor::Red => "overdue",
            UrgencyColor::DarkRed => "due soon",
            UrgencyColor::Amber => "this week",
            UrgencyColor::Green => "open",
        }
    }
}

pub fn urgency_color(days_left: Option<i64>) -> UrgencyColor {
    match days_left {
        None => UrgencyColor::Gray,
        Some(d) if d <= 0 => UrgencyColor::Red,
        Some(d) if d <= 3 => UrgencyColor::DarkRed,
        Some(d) if d <= 7 => UrgencyColor::Amber,
        Some(_) => UrgencyColor::Green,
    }
}
