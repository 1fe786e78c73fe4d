//! HTML extractor for city lists, complex cards and detail pages
//!
//! This module turns raw HTML into structured values according to the page role:
//! - Root pages: the list of cities (`<select>` options or anchor lists)
//! - Listing pages: complex cards (title, detail link, short description)
//! - Detail pages: canonical title and long description
//! - Any page: same-origin links for generic crawling
//!
//! Extraction never fails a page. Missing elements are reported as
//! [`ExtractionGap`] values next to whatever could be extracted.

use crate::config::{check_selector, SelectorConfig};
use crate::state::PageRole;
use crate::url::SiteOrigin;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Placeholder used when a detail page has no description block
pub const NO_DESCRIPTION: &str = "no description available";

/// A city entry from the root page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityLink {
    pub name: String,
    pub url: Url,
}

/// A housing complex extracted from a listing card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub title: String,
    pub detail_url: Url,
    /// Inline card text, replaced by the detail page text after enrichment
    pub description: Option<String>,
}

impl CandidateRecord {
    /// Returns a copy enriched with the complex's detail page
    pub fn enriched(&self, detail: &DetailPage) -> Self {
        Self {
            title: detail.title.clone().unwrap_or_else(|| self.title.clone()),
            detail_url: self.detail_url.clone(),
            description: Some(detail.description.clone()),
        }
    }
}

/// Text extracted from a complex's own page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub title: Option<String>,
    /// Long description, or [`NO_DESCRIPTION`]
    pub description: String,
}

/// An expected element that was absent; logged, never fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionGap {
    /// Root page without a recognizable city list
    NoCityList,
    /// Listing page without any complex card
    NoCards,
    /// Card skipped because it has no title
    CardWithoutTitle,
    /// Card skipped because it has no usable detail link
    CardWithoutLink,
    /// Detail page without a title
    NoDetailTitle,
    /// Detail page without a description block
    NoDescription,
}

impl fmt::Display for ExtractionGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoCityList => "no city list",
            Self::NoCards => "no complex cards",
            Self::CardWithoutTitle => "card without title",
            Self::CardWithoutLink => "card without detail link",
            Self::NoDetailTitle => "detail page without title",
            Self::NoDescription => "detail page without description",
        };
        f.write_str(text)
    }
}

/// Everything extracted from one page
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub cities: Vec<CityLink>,
    pub records: Vec<CandidateRecord>,
    /// Same-origin links to feed back into the frontier
    pub links: Vec<Url>,
    pub detail: Option<DetailPage>,
    pub gaps: Vec<ExtractionGap>,
}

/// Compiled selector set
#[derive(Debug, Clone)]
pub struct Selectors {
    cities: Selector,
    card: Selector,
    card_title: Selector,
    card_link: Selector,
    card_description: Selector,
    next_page: Selector,
    detail_title: Selector,
    detail_description: Selector,
    page_title: Selector,
    anchors: Selector,
}

impl Selectors {
    /// Compiles the configured selectors
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            cities: check_selector("cities", &config.cities)?,
            card: check_selector("card", &config.card)?,
            card_title: check_selector("card-title", &config.card_title)?,
            card_link: check_selector("card-link", &config.card_link)?,
            card_description: check_selector("card-description", &config.card_description)?,
            next_page: check_selector("next-page", &config.next_page)?,
            detail_title: check_selector("detail-title", &config.detail_title)?,
            detail_description: check_selector("detail-description", &config.detail_description)?,
            page_title: check_selector("title", "title")?,
            anchors: check_selector("anchors", "a[href]")?,
        })
    }
}

/// Role-driven HTML extractor bound to one site origin
#[derive(Debug, Clone)]
pub struct Extractor {
    selectors: Selectors,
    origin: SiteOrigin,
}

impl Extractor {
    pub fn new(selectors: Selectors, origin: SiteOrigin) -> Self {
        Self { selectors, origin }
    }

    pub fn origin(&self) -> &SiteOrigin {
        &self.origin
    }

    /// Parses a page once and extracts what its role calls for
    ///
    /// | Role | Extracted |
    /// |------|-----------|
    /// | Root | cities; without a city list also cards and links |
    /// | Listing | cards and the next-page link |
    /// | Generic | cards and every same-origin link |
    /// | Detail | title and description |
    pub fn extract(&self, html: &str, page_url: &Url, role: PageRole) -> PageExtraction {
        let document = Html::parse_document(html);
        let mut extraction = PageExtraction::default();

        match role {
            PageRole::Root => {
                extraction.cities = self.cities_in(&document, page_url);
                if extraction.cities.is_empty() {
                    extraction.gaps.push(ExtractionGap::NoCityList);
                    extraction.records = self.cards_in(&document, page_url, &mut extraction.gaps);
                    extraction.links = self.links_in(&document, page_url);
                }
            }
            PageRole::Listing => {
                extraction.records = self.cards_in(&document, page_url, &mut extraction.gaps);
                if extraction.records.is_empty() && extraction.gaps.is_empty() {
                    extraction.gaps.push(ExtractionGap::NoCards);
                }
                extraction.links = self.next_page_in(&document, page_url).into_iter().collect();
            }
            PageRole::Generic => {
                extraction.records = self.cards_in(&document, page_url, &mut extraction.gaps);
                extraction.links = self.links_in(&document, page_url);
            }
            PageRole::Detail => {
                extraction.detail = Some(self.detail_in(&document, &mut extraction.gaps));
            }
        }

        extraction
    }

    /// Root-page mode: the city list, empty when none is recognizable
    pub fn cities(&self, html: &str, page_url: &Url) -> Vec<CityLink> {
        self.cities_in(&Html::parse_document(html), page_url)
    }

    /// Listing-page mode: complex cards with their gaps
    pub fn listing(&self, html: &str, page_url: &Url) -> (Vec<CandidateRecord>, Vec<ExtractionGap>) {
        let mut gaps = Vec::new();
        let records = self.cards_in(&Html::parse_document(html), page_url, &mut gaps);
        (records, gaps)
    }

    /// Detail-page mode: canonical title and description
    pub fn detail(&self, html: &str) -> DetailPage {
        let mut gaps = Vec::new();
        self.detail_in(&Html::parse_document(html), &mut gaps)
    }

    /// Generic link-discovery mode: same-origin links in document order
    pub fn links(&self, html: &str, page_url: &Url) -> Vec<Url> {
        self.links_in(&Html::parse_document(html), page_url)
    }

    fn cities_in(&self, document: &Html, page_url: &Url) -> Vec<CityLink> {
        let mut seen = HashSet::new();
        let mut cities = Vec::new();

        for element in document.select(&self.selectors.cities) {
            let target = if element.value().name() == "option" {
                element.value().attr("value")
            } else {
                element.value().attr("href")
            };

            // Placeholder options ("Выберите город") carry an empty value
            let Some(target) = target.map(str::trim).filter(|t| !t.is_empty()) else {
                continue;
            };

            let name = element_text(&element);
            if name.is_empty() {
                continue;
            }

            let Some(url) = self.resolve_link(target, page_url) else {
                tracing::debug!("Skipping city '{}' with unusable link {}", name, target);
                continue;
            };

            if seen.insert(url.as_str().to_string()) {
                cities.push(CityLink { name, url });
            }
        }

        cities
    }

    fn cards_in(
        &self,
        document: &Html,
        page_url: &Url,
        gaps: &mut Vec<ExtractionGap>,
    ) -> Vec<CandidateRecord> {
        let mut records = Vec::new();

        for card in document.select(&self.selectors.card) {
            let is_anchor = card.value().name() == "a";

            let title = card
                .select(&self.selectors.card_title)
                .map(|el| element_text(&el))
                .find(|text| !text.is_empty())
                .or_else(|| is_anchor.then(|| element_text(&card)))
                .filter(|text| !text.is_empty());

            let Some(title) = title else {
                gaps.push(ExtractionGap::CardWithoutTitle);
                continue;
            };

            let href = if is_anchor {
                card.value().attr("href")
            } else {
                card.select(&self.selectors.card_link)
                    .find_map(|el| el.value().attr("href"))
            };

            let Some(detail_url) = href.and_then(|h| self.resolve_link(h, page_url)) else {
                tracing::debug!("Skipping card '{}' without usable detail link", title);
                gaps.push(ExtractionGap::CardWithoutLink);
                continue;
            };

            let description = card
                .select(&self.selectors.card_description)
                .map(|el| element_text(&el))
                .find(|text| !text.is_empty() && *text != title);

            records.push(CandidateRecord {
                title,
                detail_url,
                description,
            });
        }

        records
    }

    fn next_page_in(&self, document: &Html, page_url: &Url) -> Option<Url> {
        document
            .select(&self.selectors.next_page)
            .filter_map(|el| el.value().attr("href"))
            .find_map(|href| self.resolve_link(href, page_url))
    }

    fn detail_in(&self, document: &Html, gaps: &mut Vec<ExtractionGap>) -> DetailPage {
        let title = first_text(document, &self.selectors.detail_title)
            .or_else(|| first_text(document, &self.selectors.page_title));
        if title.is_none() {
            gaps.push(ExtractionGap::NoDetailTitle);
        }

        let description = match first_text(document, &self.selectors.detail_description) {
            Some(text) => text,
            None => {
                gaps.push(ExtractionGap::NoDescription);
                NO_DESCRIPTION.to_string()
            }
        };

        DetailPage { title, description }
    }

    fn links_in(&self, document: &Html, page_url: &Url) -> Vec<Url> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&self.selectors.anchors) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| self.resolve_link(href, page_url))
            {
                if seen.insert(url.as_str().to_string()) {
                    links.push(url);
                }
            }
        }

        links
    }

    /// Resolves a link href to a normalized same-origin URL
    ///
    /// Returns None if the link should be excluded:
    /// - javascript:, mailto:, tel:, data: schemes
    /// - fragment-only links (same page anchors)
    /// - invalid URLs
    /// - URLs outside the site origin
    fn resolve_link(&self, href: &str, page_url: &Url) -> Option<Url> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let lowered = href.to_ascii_lowercase();
        if lowered.starts_with("javascript:")
            || lowered.starts_with("mailto:")
            || lowered.starts_with("tel:")
            || lowered.starts_with("data:")
        {
            return None;
        }

        self.origin.resolve(href, page_url).ok()
    }
}

/// Text content of an element with whitespace collapsed
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first matching element that has any
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}
