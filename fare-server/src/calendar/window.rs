//! The calendar window: one search page's run of day cells.

use chrono::{Datelike, NaiveDate};
use tracing::trace;

use crate::domain::{DateRange, DayLabel, Fare, parse_raw_date};
use crate::html::{self, Element};

use super::WindowError;
use super::selector::{OUTBOUND_TABLE_ID, RETURN_TABLE_ID, lowest_fare_in_table};

/// Direction of a navigation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Previous,
    Next,
}

/// A day cell as rendered: no year, maybe a raw date, maybe a fare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub label: DayLabel,
    /// The `data-new-date` attribute, when non-empty.
    pub raw_date: Option<NaiveDate>,
    /// Cheapest fare shown for the day; `None` when sold out or unpriced.
    pub fare: Option<Fare>,
}

/// One entry of the calendar row, in rendered order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FareCell {
    Day(DayCell),
    Sentinel(Nav),
}

/// Today's fare, read from the fare tables.
///
/// The calendar row never contains the current day, so when an anchor is
/// today its fare is only available from the corresponding fare table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Heading {
    /// Neither anchor is today.
    #[default]
    Absent,
    /// The departure anchor is today.
    Departing(Option<Fare>),
    /// The return anchor is today.
    Returning(Option<Fare>),
    /// Both anchors are today.
    Both {
        outbound: Option<Fare>,
        inbound: Option<Fare>,
    },
}

impl Heading {
    /// Today's outbound fare, if the departure anchor was today.
    pub fn departing(&self) -> Option<Option<Fare>> {
        match *self {
            Heading::Departing(fare) => Some(fare),
            Heading::Both { outbound, .. } => Some(outbound),
            _ => None,
        }
    }

    /// Today's return fare, if the return anchor was today.
    pub fn returning(&self) -> Option<Option<Fare>> {
        match *self {
            Heading::Returning(fare) => Some(fare),
            Heading::Both { inbound, .. } => Some(inbound),
            _ => None,
        }
    }
}

/// A year-qualified day of the fare calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayFare {
    pub date: NaiveDate,
    pub label: DayLabel,
    pub fare: Option<Fare>,
}

impl DayFare {
    pub fn new(date: NaiveDate, fare: Option<Fare>) -> Self {
        Self {
            date,
            label: DayLabel::of(date),
            fare,
        }
    }
}

/// The parsed calendar part of one search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarWindow {
    cells: Vec<FareCell>,
    heading: Heading,
}

impl CalendarWindow {
    /// Parse a search page fetched with the given anchors.
    ///
    /// Fails with [`WindowError::Empty`] when there is no calendar row or
    /// the row has no day cells.
    pub fn parse(
        document: &str,
        anchors: DateRange,
        today: NaiveDate,
        fare_class: &str,
    ) -> Result<Self, WindowError> {
        let heading = parse_heading(document, anchors, today, fare_class)?;

        let Some(row) = html::find_by_class(document, "div", "date-row") else {
            return Err(WindowError::Empty);
        };

        let mut cells = Vec::new();
        for li in row.find_all("li") {
            if !li.has_class("date-change") {
                continue;
            }
            if let Some(cell) = parse_cell(&li)? {
                cells.push(cell);
            }
        }

        let window = Self { cells, heading };
        if window.days().next().is_none() {
            return Err(WindowError::Empty);
        }
        Ok(window)
    }

    /// All cells in rendered order, sentinels included.
    pub fn cells(&self) -> &[FareCell] {
        &self.cells
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Day cells only, in rendered order.
    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter_map(|cell| match cell {
            FareCell::Day(day) => Some(day),
            FareCell::Sentinel(_) => None,
        })
    }

    /// The last day cell with a raw date, as (index among days, date).
    pub fn year_anchor(&self) -> Option<(usize, NaiveDate)> {
        self.days()
            .enumerate()
            .filter_map(|(i, day)| day.raw_date.map(|d| (i, d)))
            .last()
    }

    /// Year of the window's last raw-dated day cell.
    pub fn resolved_year(&self) -> Option<i32> {
        self.year_anchor().map(|(_, date)| date.year())
    }

    /// Turn the day cells into year-qualified days.
    ///
    /// Years are anchored on [`CalendarWindow::year_anchor`] and propagated
    /// outwards: a month number that drops moving forward starts the next
    /// year, one that rises moving backward is the previous year. Without
    /// any raw date, the first cell is placed in the year nearest to
    /// `carry`.
    pub fn resolve_days(&self, carry: Option<NaiveDate>) -> Result<Vec<DayFare>, WindowError> {
        let days: Vec<&DayCell> = self.days().collect();
        if days.is_empty() {
            return Err(WindowError::Empty);
        }

        let (anchor, anchor_date) = match self.year_anchor() {
            Some(found) => found,
            None => {
                let carry = carry.ok_or(WindowError::NoYearAnchor)?;
                (0, nearest_to(days[0].label, carry)?)
            }
        };

        let mut dates = vec![anchor_date; days.len()];

        let mut year = anchor_date.year();
        for i in anchor + 1..days.len() {
            if days[i].label.month() < days[i - 1].label.month() {
                year += 1;
            }
            dates[i] = in_year(days[i].label, year)?;
        }

        year = anchor_date.year();
        for i in (0..anchor).rev() {
            if days[i].label.month() > days[i + 1].label.month() {
                year -= 1;
            }
            dates[i] = in_year(days[i].label, year)?;
        }

        days.iter()
            .zip(dates)
            .map(|(day, date)| {
                let raw_ok = day.raw_date.is_none_or(|raw| raw == date);
                if !raw_ok || !day.label.matches(date) {
                    return Err(WindowError::Inconsistent {
                        label: day.label,
                        date,
                    });
                }
                Ok(DayFare {
                    date,
                    label: day.label,
                    fare: day.fare,
                })
            })
            .collect()
    }
}

fn parse_heading(
    document: &str,
    anchors: DateRange,
    today: NaiveDate,
    fare_class: &str,
) -> Result<Heading, WindowError> {
    let departing = if anchors.start() == today {
        Some(lowest_fare_in_table(document, OUTBOUND_TABLE_ID, fare_class)?)
    } else {
        None
    };
    let returning = if anchors.end() == today {
        Some(lowest_fare_in_table(document, RETURN_TABLE_ID, fare_class)?)
    } else {
        None
    };

    Ok(match (departing, returning) {
        (None, None) => Heading::Absent,
        (Some(fare), None) => Heading::Departing(fare),
        (None, Some(fare)) => Heading::Returning(fare),
        (Some(outbound), Some(inbound)) => Heading::Both { outbound, inbound },
    })
}

fn parse_cell(li: &Element<'_>) -> Result<Option<FareCell>, WindowError> {
    if li.contains_class("img", "prevDay") {
        return Ok(Some(FareCell::Sentinel(Nav::Previous)));
    }
    if li.contains_class("img", "nextDay") {
        return Ok(Some(FareCell::Sentinel(Nav::Next)));
    }

    let fare_span = li.find_by_class("span", "lowest-day-fare");
    let label_markup = match &fare_span {
        Some(span) => li.inner_html_without(span),
        None => li.inner_html().to_string(),
    };
    let label_text = html::text_of(&label_markup);
    if label_text.is_empty() {
        trace!("skipping calendar cell without a label");
        return Ok(None);
    }

    let label = DayLabel::parse(&label_text)?;
    let raw_date = li
        .attr("data-new-date")
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(parse_raw_date)
        .transpose()?;
    let fare = fare_span.and_then(|span| Fare::parse(&span.text()).ok());

    Ok(Some(FareCell::Day(DayCell {
        label,
        raw_date,
        fare,
    })))
}

fn in_year(label: DayLabel, year: i32) -> Result<NaiveDate, WindowError> {
    label
        .in_year(year)
        .ok_or(WindowError::NoSuchDay { label, year })
}

/// The date `label` names in the year that puts it closest to `carry`.
fn nearest_to(label: DayLabel, carry: NaiveDate) -> Result<NaiveDate, WindowError> {
    (carry.year() - 1..=carry.year() + 1)
        .filter_map(|year| label.in_year(year))
        .min_by_key(|date| (*date - carry).num_days().abs())
        .ok_or(WindowError::NoSuchDay {
            label,
            year: carry.year(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DEFAULT_FARE_CLASS;
    use crate::domain::format_raw_date;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    fn day_li(d: NaiveDate, raw: bool, fare: Option<&str>) -> String {
        let raw = if raw { format_raw_date(d) } else { String::new() };
        let fare = fare
            .map(|f| format!(r#"<span class="lowest-day-fare">${f}</span>"#))
            .unwrap_or_default();
        format!(
            r#"<li class="js-cal-date-change date-change" data-new-date="{raw}">
                 {}{fare}
               </li>"#,
            d.format("%a, %d %b")
        )
    }

    fn sentinel(class: &str) -> String {
        format!(
            r#"<li class="js-cal-date-change date-change" data-new-date=""><img class="{class}" src="x.png"></li>"#
        )
    }

    fn page(cells: &[String], tables: &str) -> String {
        format!(
            r#"<html><body>{tables}<div class="date-row"><ul>{}</ul></div></body></html>"#,
            cells.concat()
        )
    }

    fn fare(s: &str) -> Fare {
        Fare::parse(s).unwrap()
    }

    fn today() -> NaiveDate {
        date(2019, 4, 1)
    }

    #[test]
    fn parses_days_and_sentinels_in_order() {
        let html = page(
            &[
                sentinel("prevDay"),
                day_li(date(2019, 5, 3), true, Some("89.00")),
                day_li(date(2019, 5, 4), true, None),
                day_li(date(2019, 5, 5), true, Some("120.50")),
                sentinel("nextDay"),
            ],
            "",
        );
        let window = CalendarWindow::parse(
            &html,
            range(date(2019, 5, 3), date(2019, 5, 5)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap();

        let cells = window.cells();
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0], FareCell::Sentinel(Nav::Previous));
        assert_eq!(cells[4], FareCell::Sentinel(Nav::Next));

        let days: Vec<_> = window.days().collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].label.to_string(), "Fri, 03 May");
        assert_eq!(days[0].fare, Some(fare("89")));
        assert_eq!(days[1].fare, None);
        assert_eq!(days[2].fare, Some(fare("120.5")));
        assert_eq!(window.heading(), Heading::Absent);
        assert_eq!(window.resolved_year(), Some(2019));
    }

    #[test]
    fn missing_row_or_no_days_is_empty() {
        let anchors = range(date(2019, 5, 3), date(2019, 5, 5));

        let err = CalendarWindow::parse("<html></html>", anchors, today(), DEFAULT_FARE_CLASS)
            .unwrap_err();
        assert_eq!(err, WindowError::Empty);

        let only_sentinels = page(&[sentinel("prevDay"), sentinel("nextDay")], "");
        let err = CalendarWindow::parse(&only_sentinels, anchors, today(), DEFAULT_FARE_CLASS)
            .unwrap_err();
        assert_eq!(err, WindowError::Empty);
    }

    #[test]
    fn unparseable_label_is_an_error() {
        let html = page(
            &[r#"<li class="date-change" data-new-date="">Someday</li>"#.to_string()],
            "",
        );
        let err = CalendarWindow::parse(
            &html,
            range(date(2019, 5, 3), date(2019, 5, 5)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap_err();
        assert!(matches!(err, WindowError::Cell(_)));
    }

    #[test]
    fn heading_read_only_when_anchor_is_today() {
        let tables = r#"
            <table id="table-0"><tr><td data-fare-type="Light Fare"><span class="currency">$</span>55.00</td></tr></table>
            <table id="table-1"><tr><td data-fare-type="Light Fare"><span class="fares-remaining">Sold out</span></td></tr></table>
        "#;
        let html = page(&[day_li(date(2019, 4, 2), true, Some("60.00"))], tables);

        let departing = CalendarWindow::parse(
            &html,
            range(today(), date(2019, 4, 4)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap();
        assert_eq!(departing.heading(), Heading::Departing(Some(fare("55"))));
        assert_eq!(departing.heading().departing(), Some(Some(fare("55"))));
        assert_eq!(departing.heading().returning(), None);

        let both =
            CalendarWindow::parse(&html, range(today(), today()), today(), DEFAULT_FARE_CLASS)
                .unwrap();
        assert_eq!(
            both.heading(),
            Heading::Both {
                outbound: Some(fare("55")),
                inbound: None
            }
        );
        assert_eq!(both.heading().returning(), Some(None));
    }

    #[test]
    fn heading_requires_its_table() {
        let html = page(&[day_li(date(2019, 4, 2), true, None)], "");
        let err = CalendarWindow::parse(
            &html,
            range(today(), date(2019, 4, 4)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap_err();
        assert_eq!(err, WindowError::MissingTable(OUTBOUND_TABLE_ID.to_string()));
    }

    #[test]
    fn resolve_days_across_new_year() {
        // Only the first cell carries a raw date
        let cells: Vec<String> = [
            date(2019, 12, 30),
            date(2019, 12, 31),
            date(2020, 1, 1),
            date(2020, 1, 2),
        ]
        .iter()
        .enumerate()
        .map(|(i, d)| day_li(*d, i == 0, Some("70.00")))
        .collect();
        let html = page(&cells, "");
        let window = CalendarWindow::parse(
            &html,
            range(date(2019, 12, 29), date(2020, 1, 3)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap();

        assert_eq!(window.resolved_year(), Some(2019));
        let days = window.resolve_days(None).unwrap();
        let dates: Vec<_> = days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2019, 12, 30),
                date(2019, 12, 31),
                date(2020, 1, 1),
                date(2020, 1, 2)
            ]
        );
    }

    #[test]
    fn resolve_days_backwards_from_last_raw_date() {
        let cells = vec![
            day_li(date(2019, 12, 31), false, None),
            day_li(date(2020, 1, 1), false, None),
            day_li(date(2020, 1, 2), true, None),
        ];
        let html = page(&cells, "");
        let window = CalendarWindow::parse(
            &html,
            range(date(2019, 12, 30), date(2020, 1, 3)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap();

        assert_eq!(window.year_anchor(), Some((2, date(2020, 1, 2))));
        let days = window.resolve_days(None).unwrap();
        assert_eq!(days[0].date, date(2019, 12, 31));
        assert_eq!(days[0].label, DayLabel::of(date(2019, 12, 31)));
    }

    #[test]
    fn resolve_without_raw_dates_uses_carry() {
        let cells = vec![
            day_li(date(2020, 1, 1), false, None),
            day_li(date(2020, 1, 2), false, None),
        ];
        let html = page(&cells, "");
        let window = CalendarWindow::parse(
            &html,
            range(date(2019, 12, 31), date(2020, 1, 5)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap();

        assert_eq!(window.resolved_year(), None);
        assert_eq!(
            window.resolve_days(None).unwrap_err(),
            WindowError::NoYearAnchor
        );

        let days = window.resolve_days(Some(date(2019, 12, 31))).unwrap();
        assert_eq!(days[0].date, date(2020, 1, 1));
        assert_eq!(days[1].date, date(2020, 1, 2));
    }

    #[test]
    fn weekday_mismatch_is_inconsistent() {
        // Label rendered for 2019 but raw date says 2020
        let html = page(
            &[r#"<li class="date-change" data-new-date="20200504">Sat, 04 May</li>"#.to_string()],
            "",
        );
        let window = CalendarWindow::parse(
            &html,
            range(date(2020, 5, 3), date(2020, 5, 5)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap();
        let err = window.resolve_days(None).unwrap_err();
        assert!(matches!(err, WindowError::Inconsistent { .. }));
    }

    #[test]
    fn unpriced_fare_span_is_absent() {
        let html = page(
            &[r#"<li class="date-change" data-new-date="20190504">Sat, 04 May<span class="lowest-day-fare">Sold out</span></li>"#.to_string()],
            "",
        );
        let window = CalendarWindow::parse(
            &html,
            range(date(2019, 5, 3), date(2019, 5, 5)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap();
        let days = window.resolve_days(None).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].fare, None);
    }

    #[test]
    fn fare_text_repeated_in_the_label_is_kept() {
        // The fare "06" also appears in the day number
        let html = page(
            &[r#"<li class="date-change" data-new-date="20190506">Mon, 06 May<span class="lowest-day-fare">06</span></li>"#.to_string()],
            "",
        );
        let window = CalendarWindow::parse(
            &html,
            range(date(2019, 5, 5), date(2019, 5, 7)),
            today(),
            DEFAULT_FARE_CLASS,
        )
        .unwrap();
        let days = window.resolve_days(None).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, date(2019, 5, 6));
        assert_eq!(days[0].fare, Some(fare("6")));
    }
}
