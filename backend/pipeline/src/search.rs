//! Search initiation: from the home page to the fare overview of day 1.
//!
//! The steps run in a fixed order and any missing element aborts the leg.
//! The date picker's "tomorrow" cell has no stable selector, so it is
//! addressed by the structural path of the element following today's cell.

use std::fmt;
use std::time::Duration;

use railfare_browser::{
    next_sibling_element, structural_path, BrowserDriver, DriverError, Locator, StructuralPath,
};
use railfare_config::{SiteConfig, TimingConfig};
use railfare_core::FareQuery;
use scraper::{Html, Selector};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{ExtractionError, ScrapeError};
use crate::extract::parse_selector;

/// Steps of the search protocol, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStep {
    Navigate,
    FillOrigin,
    FillDestination,
    OpenDatePanel,
    LocateCurrentDay,
    AdvanceDate,
    AcceptConsent,
    Search,
    SwitchOverview,
    Ready,
}

impl SearchStep {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchStep::Navigate => "navigate",
            SearchStep::FillOrigin => "fill_origin",
            SearchStep::FillDestination => "fill_destination",
            SearchStep::OpenDatePanel => "open_date_panel",
            SearchStep::LocateCurrentDay => "locate_current_day",
            SearchStep::AdvanceDate => "advance_date",
            SearchStep::AcceptConsent => "accept_consent",
            SearchStep::Search => "search",
            SearchStep::SwitchOverview => "switch_overview",
            SearchStep::Ready => "ready",
        }
    }
}

impl fmt::Display for SearchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives a fresh page to the fare overview of the day after today.
#[derive(Debug, Clone)]
pub struct SearchProtocol {
    base_url: String,
    origin_input: Locator,
    destination_input: Locator,
    date_panel: Locator,
    current_day_css: String,
    current_day: Selector,
    consent_button: Locator,
    search_button: Locator,
    overview_switch: Locator,
    element_timeout: Duration,
    picker_settle: Duration,
    search_settle: Duration,
    switch_settle: Duration,
    ready_settle: Duration,
}

impl SearchProtocol {
    pub fn from_config(site: &SiteConfig, timing: &TimingConfig) -> Result<Self, ExtractionError> {
        let s = &site.selectors;
        Ok(Self {
            base_url: site.base_url.clone(),
            origin_input: Locator::name(&s.origin_input),
            destination_input: Locator::name(&s.destination_input),
            date_panel: Locator::class(&s.date_panel),
            current_day_css: s.current_day.clone(),
            current_day: parse_selector(&s.current_day)?,
            consent_button: Locator::css(&s.consent_button),
            search_button: Locator::css(&s.search_button),
            overview_switch: Locator::css(&s.overview_switch),
            element_timeout: timing.element_timeout(),
            picker_settle: timing.picker_settle(),
            search_settle: timing.search_settle(),
            switch_settle: timing.switch_settle(),
            ready_settle: timing.ready_settle(),
        })
    }

    /// Run every step for `query` on `driver`.
    pub async fn run<D>(&self, driver: &D, query: &FareQuery) -> Result<(), ScrapeError>
    where
        D: BrowserDriver + ?Sized,
    {
        info!(origin = %query.origin, destination = %query.destination, "Starting search");

        driver
            .navigate(&self.base_url)
            .await
            .map_err(|source| navigation(SearchStep::Navigate, &self.base_url, source))?;

        self.fill(driver, SearchStep::FillOrigin, &self.origin_input, &query.origin)
            .await?;
        self.fill(
            driver,
            SearchStep::FillDestination,
            &self.destination_input,
            &query.destination,
        )
        .await?;

        self.click(driver, SearchStep::OpenDatePanel, &self.date_panel)
            .await?;
        sleep(self.picker_settle).await;

        let next_day = self.locate_next_day(driver).await?;
        debug!(path = %next_day, "Located next day in picker");
        self.click(driver, SearchStep::AdvanceDate, &Locator::from(next_day))
            .await?;

        self.click(driver, SearchStep::AcceptConsent, &self.consent_button)
            .await?;
        self.click(driver, SearchStep::Search, &self.search_button)
            .await?;
        sleep(self.search_settle).await;

        self.click(driver, SearchStep::SwitchOverview, &self.overview_switch)
            .await?;
        sleep(self.switch_settle).await;

        sleep(self.ready_settle).await;
        info!(step = %SearchStep::Ready, "Fare overview ready");
        Ok(())
    }

    async fn fill<D>(
        &self,
        driver: &D,
        step: SearchStep,
        locator: &Locator,
        text: &str,
    ) -> Result<(), ScrapeError>
    where
        D: BrowserDriver + ?Sized,
    {
        debug!(%step, %locator, "Filling");
        self.require(driver, step, locator).await?;
        driver
            .fill(locator, text)
            .await
            .map_err(|source| navigation(step, locator, source))
    }

    async fn click<D>(&self, driver: &D, step: SearchStep, locator: &Locator) -> Result<(), ScrapeError>
    where
        D: BrowserDriver + ?Sized,
    {
        debug!(%step, %locator, "Clicking");
        self.require(driver, step, locator).await?;
        driver
            .click(locator)
            .await
            .map_err(|source| navigation(step, locator, source))
    }

    async fn require<D>(&self, driver: &D, step: SearchStep, locator: &Locator) -> Result<(), ScrapeError>
    where
        D: BrowserDriver + ?Sized,
    {
        driver
            .wait_for(locator, self.element_timeout)
            .await
            .map(|_| ())
            .map_err(|source| navigation(step, locator, source))
    }

    async fn locate_next_day<D>(&self, driver: &D) -> Result<StructuralPath, ScrapeError>
    where
        D: BrowserDriver + ?Sized,
    {
        let step = SearchStep::LocateCurrentDay;
        let markup = driver
            .current_markup_snapshot()
            .await
            .map_err(|source| navigation(step, &self.current_day_css, source))?;
        next_day_path(&markup, &self.current_day).ok_or_else(|| {
            navigation(
                step,
                &self.current_day_css,
                DriverError::ElementNotFound {
                    locator: format!("next sibling of css={}", self.current_day_css),
                },
            )
        })
    }
}

/// Structural path of the element right after the first `current_day` match.
pub fn next_day_path(markup: &str, current_day: &Selector) -> Option<StructuralPath> {
    let document = Html::parse_document(markup);
    let today = document.select(current_day).next()?;
    let tomorrow = next_sibling_element(today)?;
    structural_path(&tomorrow)
}

fn navigation(step: SearchStep, locator: impl fmt::Display, source: DriverError) -> ScrapeError {
    ScrapeError::Navigation {
        step,
        locator: locator.to_string(),
        source,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use railfare_browser::{DriverAction, ScriptedDriver};

    use super::*;

    /// A date picker whose current day is followed by a text node and the next day.
    pub(crate) fn picker_page() -> String {
        let today = SiteConfig::default()
            .selectors
            .current_day
            .trim_start_matches("div.")
            .replace('.', " ");
        format!(
            "<html><body><div class=\"db-web-date-picker-calendar\">\
             <div class=\"db-web-date-picker-calendar-day\">13</div>\
             <div class=\"{today}\">14</div> \
             <div class=\"db-web-date-picker-calendar-day\">15</div>\
             </div></body></html>"
        )
    }

    fn protocol() -> SearchProtocol {
        SearchProtocol::from_config(&SiteConfig::default(), &TimingConfig::immediate()).unwrap()
    }

    fn query() -> FareQuery {
        FareQuery::new("Berlin Hbf", "München Hbf", 3, false).unwrap()
    }

    #[test]
    fn next_day_is_the_following_element() {
        let selector = parse_selector(&SiteConfig::default().selectors.current_day).unwrap();
        let path = next_day_path(&picker_page(), &selector).unwrap();
        assert_eq!(path.to_string(), "/html/body/div/div[3]");
    }

    #[test]
    fn last_day_of_picker_has_no_next() {
        let selector = Selector::parse("div.last").unwrap();
        let page = "<html><body><div><div>1</div><div class=\"last\">2</div></div></body></html>";
        assert!(next_day_path(page, &selector).is_none());
    }

    #[tokio::test]
    async fn runs_steps_in_order() {
        let driver = ScriptedDriver::new().with_snapshots([picker_page()]);
        protocol().run(&driver, &query()).await.unwrap();

        let site = SiteConfig::default();
        let s = &site.selectors;
        let today = parse_selector(&s.current_day).unwrap();
        let clicks: Vec<Locator> = driver
            .actions()
            .into_iter()
            .filter_map(|a| match a {
                DriverAction::Click(l) => Some(l),
                _ => None,
            })
            .collect();
        assert_eq!(
            clicks,
            vec![
                Locator::class(&s.date_panel),
                Locator::from(next_day_path(&picker_page(), &today).unwrap()),
                Locator::css(&s.consent_button),
                Locator::css(&s.search_button),
                Locator::css(&s.overview_switch),
            ]
        );

        let actions = driver.actions();
        assert_eq!(actions[0], DriverAction::Navigate(site.base_url.clone()));
        assert!(actions.contains(&DriverAction::Fill(
            Locator::name(&s.origin_input),
            "Berlin Hbf".into()
        )));
        assert!(actions.contains(&DriverAction::Fill(
            Locator::name(&s.destination_input),
            "München Hbf".into()
        )));
        assert_eq!(driver.remaining_snapshots(), 0);
    }

    #[tokio::test]
    async fn missing_consent_names_the_step() {
        let consent = Locator::css(&SiteConfig::default().selectors.consent_button);
        let driver = ScriptedDriver::new()
            .with_snapshots([picker_page()])
            .with_missing(consent.clone());
        let err = protocol().run(&driver, &query()).await.unwrap_err();
        match err {
            ScrapeError::Navigation {
                step,
                locator,
                source,
            } => {
                assert_eq!(step, SearchStep::AcceptConsent);
                assert_eq!(locator, consent.to_string());
                assert!(source.is_missing_element());
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing after the failing step is attempted.
        let search = Locator::css(&SiteConfig::default().selectors.search_button);
        assert_eq!(driver.count(|a| *a == DriverAction::Click(search.clone())), 0);
    }

    #[tokio::test]
    async fn picker_without_today_fails_locate_step() {
        let driver = ScriptedDriver::new().with_snapshots(["<html><body></body></html>"]);
        let err = protocol().run(&driver, &query()).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Navigation {
                step: SearchStep::LocateCurrentDay,
                ..
            }
        ));
    }

    #[test]
    fn steps_display_in_snake_case() {
        assert_eq!(SearchStep::FillDestination.to_string(), "fill_destination");
        assert_eq!(SearchStep::AcceptConsent.to_string(), "accept_consent");
    }
}
