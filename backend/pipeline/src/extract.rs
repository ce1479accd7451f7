//! Fare and date extraction from a fare-overview snapshot.
//!
//! The overview lists one price label per time-of-day bucket and a date
//! scroller reading like `Mon. 14. Oct 2024`. Labels carry a currency
//! symbol that is sometimes mis-decoded (`â‚¬` for `€`), so the symbol is
//! treated as an opaque token around a single number.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use railfare_config::SiteConfig;
use railfare_core::{DateLocale, DayFare, BUCKET_COUNT};
use regex::Regex;
use scraper::{Html, Selector};

use crate::error::ExtractionError;

// One number, optionally wrapped in a single symbol token on either side.
static PRICE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[^\s\dA-Za-z.,]*\s*(\d(?:[\d.,]*\d)?)\s*[^\s\dA-Za-z.,]*\s*$").unwrap()
});

/// Parses fare-overview snapshots into [`DayFare`]s.
#[derive(Debug, Clone)]
pub struct FareExtractor {
    price_buttons: Selector,
    date_scroller: Selector,
    locale: DateLocale,
}

impl FareExtractor {
    pub fn new(
        price_buttons: &str,
        date_scroller: &str,
        locale: DateLocale,
    ) -> Result<Self, ExtractionError> {
        Ok(Self {
            price_buttons: parse_selector(price_buttons)?,
            date_scroller: parse_selector(date_scroller)?,
            locale,
        })
    }

    pub fn from_config(site: &SiteConfig) -> Result<Self, ExtractionError> {
        Self::new(
            &site.selectors.price_buttons,
            &site.selectors.date_scroller,
            site.date_locale,
        )
    }

    pub fn extract(&self, markup: &str) -> Result<DayFare, ExtractionError> {
        let document = Html::parse_document(markup);

        let labels: Vec<String> = document
            .select(&self.price_buttons)
            .map(|el| el.text().collect::<String>())
            .collect();
        if labels.len() != BUCKET_COUNT {
            return Err(ExtractionError::BucketCount {
                expected: BUCKET_COUNT,
                found: labels.len(),
            });
        }

        let mut intervals = [0.0; BUCKET_COUNT];
        for (bucket, (slot, text)) in intervals.iter_mut().zip(&labels).enumerate() {
            *slot = parse_price(text, self.locale).ok_or_else(|| ExtractionError::MalformedPrice {
                bucket,
                text: text.trim().to_string(),
            })?;
        }

        let date_text = document
            .select(&self.date_scroller)
            .next()
            .map(|el| el.text().collect::<String>())
            .ok_or(ExtractionError::MissingDate)?;
        let date = parse_scroller_date(&date_text, self.locale)?;

        Ok(DayFare::new(date, intervals))
    }
}

/// Compile a CSS selector, keeping the parser's complaint as text.
pub(crate) fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Price in a label such as `€19.99`, `â‚¬ 1,234.50` or `19,99 €`.
///
/// The label must hold exactly one number. Separators follow `locale`:
/// English groups thousands with `,` and uses `.` for decimals, German the
/// other way round. Groups after the first must have three digits.
pub fn parse_price(text: &str, locale: DateLocale) -> Option<f64> {
    let raw = PRICE_LABEL.captures(text)?.get(1)?.as_str();
    let (group, decimal) = match locale {
        DateLocale::English => (',', '.'),
        DateLocale::German => ('.', ','),
    };

    let (whole, fraction) = match raw.split_once(decimal) {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    let mut groups = whole.split(group);
    let lead = groups.next()?;
    if lead.is_empty() || !lead.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut digits = lead.to_string();
    for rest in groups {
        if rest.len() != 3 || !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.push_str(rest);
    }
    if let Some(fraction) = fraction {
        digits.push('.');
        digits.push_str(fraction);
    }
    digits.parse().ok()
}

/// Date of a scroller text `<weekday> <day>. <month> <year>`.
///
/// The weekday is ignored. The day may carry a trailing period and a single
/// digit; the month is looked up in `locale`'s table.
pub fn parse_scroller_date(text: &str, locale: DateLocale) -> Result<NaiveDate, ExtractionError> {
    let malformed = || ExtractionError::MalformedDate {
        text: text.trim().to_string(),
    };

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [_weekday, day, month, year] = tokens.as_slice() else {
        return Err(malformed());
    };

    let day: u32 = day.trim_end_matches('.').parse().map_err(|_| malformed())?;
    let month = locale
        .month_number(month)
        .ok_or_else(|| ExtractionError::UnknownMonth {
            token: month.to_string(),
            locale,
        })?;
    let year: i32 = year.trim_end_matches('.').parse().map_err(|_| malformed())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)
}
