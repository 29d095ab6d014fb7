//! Config-driven web source adapter
//!
//! A [`WebSource`] is described entirely by CSS selectors in the settings
//! file: one selector picks the chapter entries out of the page, optional
//! per-field selectors pick name, number and link out of each entry. The
//! extracted fields stay loosely typed; validation happens in the core's
//! normalizer.

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use shiori_core::{FieldValue, RawListing, RawRecord, Source, SourceError};
use tracing::debug;
use url::Url;

/// One source's scraping description, loaded from the settings file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Display name for logs; the host is used when absent
    #[serde(default)]
    pub name: Option<String>,

    /// Page to fetch, also the base for relative chapter links
    pub url: String,

    /// Selector matching one element per chapter entry
    pub list_selector: String,

    /// Selector for the title name inside an entry
    #[serde(default)]
    pub name_selector: Option<String>,

    /// Selector for the chapter number inside an entry; the entry's own
    /// text is used when absent
    #[serde(default)]
    pub number_selector: Option<String>,

    /// Selector for the chapter link inside an entry; the entry itself is
    /// probed for an href when absent
    #[serde(default)]
    pub link_selector: Option<String>,

    /// Regex whose first capture group extracts the number from the
    /// selected text, e.g. `Chapter\s+([0-9.]+)`
    #[serde(default)]
    pub number_pattern: Option<String>,
}

/// A chapter source scraped from a web page with CSS selectors
#[derive(Debug)]
pub struct WebSource {
    name: String,
    base: Url,
    client: reqwest::Client,
    list: Selector,
    name_sel: Option<Selector>,
    number_sel: Option<Selector>,
    link_sel: Option<Selector>,
    number_re: Option<Regex>,
}

fn parse_selector(raw: &str) -> Result<Selector, SourceError> {
    Selector::parse(raw).map_err(|e| SourceError::Malformed(format!("bad selector {raw:?}: {e}")))
}

impl WebSource {
    pub fn from_config(config: &SourceConfig, client: reqwest::Client) -> Result<Self, SourceError> {
        let base = Url::parse(&config.url)
            .map_err(|e| SourceError::Malformed(format!("bad url {:?}: {e}", config.url)))?;
        let name = config
            .name
            .clone()
            .or_else(|| base.host_str().map(str::to_string))
            .unwrap_or_else(|| config.url.clone());
        let number_re = config
            .number_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| SourceError::Malformed(format!("bad number pattern: {e}")))?;
        Ok(Self {
            name,
            base,
            client,
            list: parse_selector(&config.list_selector)?,
            name_sel: config.name_selector.as_deref().map(parse_selector).transpose()?,
            number_sel: config.number_selector.as_deref().map(parse_selector).transpose()?,
            link_sel: config.link_selector.as_deref().map(parse_selector).transpose()?,
            number_re,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pull the raw records out of a fetched page
    ///
    /// A page where the list selector matches nothing yields a listing
    /// without a chapter section, which the index builder skips.
    fn extract(&self, html: &str) -> RawListing {
        let doc = Html::parse_document(html);
        let mut records = Vec::new();
        for item in doc.select(&self.list) {
            records.push(RawRecord {
                name: self.texts_of(item, &self.name_sel),
                number: self.numbers_of(item),
                link: self.links_of(item),
            });
        }
        debug!(source = %self.name, entries = records.len(), "extracted listing");
        RawListing {
            chapters: if records.is_empty() {
                None
            } else {
                Some(records)
            },
        }
    }

    fn texts_of(&self, item: ElementRef<'_>, selector: &Option<Selector>) -> Option<FieldValue> {
        let texts: Vec<String> = match selector {
            Some(sel) => item.select(sel).map(element_text).collect(),
            None => vec![element_text(item)],
        };
        field_from(texts)
    }

    fn numbers_of(&self, item: ElementRef<'_>) -> Option<FieldValue> {
        let raw = self.texts_of(item, &self.number_sel)?;
        let Some(re) = &self.number_re else {
            return Some(raw);
        };
        // every capture in every selected text counts as a sub-chapter
        let numbers: Vec<String> = raw
            .candidates()
            .flat_map(|text| {
                re.captures_iter(text)
                    .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();
        field_from(numbers)
    }

    fn links_of(&self, item: ElementRef<'_>) -> Option<FieldValue> {
        let hrefs: Vec<String> = match &self.link_sel {
            Some(sel) => item
                .select(sel)
                .filter_map(|el| el.value().attr("href"))
                .map(str::to_string)
                .collect(),
            None => item
                .value()
                .attr("href")
                .map(str::to_string)
                .into_iter()
                .collect(),
        };
        field_from(hrefs)
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn field_from(mut values: Vec<String>) -> Option<FieldValue> {
    values.retain(|v| !v.is_empty());
    match values.len() {
        0 => None,
        1 => Some(FieldValue::One(values.remove(0))),
        _ => Some(FieldValue::Many(values)),
    }
}

#[async_trait]
impl Source for WebSource {
    fn base_url(&self) -> &Url {
        &self.base
    }

    async fn fetch(&self) -> Result<RawListing, SourceError> {
        let response = self
            .client
            .get(self.base.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;
        Ok(self.extract(&body))
    }

    /// Drop entries where nothing at all was extracted
    fn shrink(&self, raw: RawListing) -> RawListing {
        RawListing {
            chapters: raw.chapters.map(|records| {
                records.into_iter().filter(|r| !r.is_empty()).collect()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="latest">
            <div class="entry">
              <span class="title">Dai Dark</span>
              <a class="chap" href="/read/dai-dark-8">Chapter 8</a>
            </div>
            <div class="entry">
              <span class="title">Blame!</span>
              <a class="chap" href="/read/blame-4-5">Chapter 4.5</a>
              <a class="chap" href="/read/blame-4-6">Chapter 4.6</a>
            </div>
            <div class="entry"></div>
          </div>
        </body></html>"#;

    fn config() -> SourceConfig {
        SourceConfig {
            name: Some("testsource".into()),
            url: "https://scans.example/latest".into(),
            list_selector: ".latest .entry".into(),
            name_selector: Some(".title".into()),
            number_selector: Some(".chap".into()),
            link_selector: Some(".chap".into()),
            number_pattern: Some(r"Chapter\s+([0-9.]+)".into()),
        }
    }

    fn source() -> WebSource {
        WebSource::from_config(&config(), reqwest::Client::new()).unwrap()
    }

    #[test]
    fn test_extract_fields_per_entry() {
        let listing = source().extract(PAGE);
        let records = listing.chapters.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, Some(FieldValue::One("Dai Dark".into())));
        assert_eq!(records[0].number, Some(FieldValue::One("8".into())));
        assert_eq!(
            records[0].link,
            Some(FieldValue::One("/read/dai-dark-8".into()))
        );
        // two chapter links become a list of candidates
        assert_eq!(
            records[1].number,
            Some(FieldValue::Many(vec!["4.5".into(), "4.6".into()]))
        );
    }

    #[test]
    fn test_shrink_drops_empty_entries() {
        let src = source();
        let listing = src.shrink(src.extract(PAGE));
        assert_eq!(listing.chapters.unwrap().len(), 2);
    }

    #[test]
    fn test_page_without_list_structure_has_no_chapter_section() {
        let listing = source().extract("<html><body><p>maintenance</p></body></html>");
        assert!(listing.chapters.is_none());
    }

    #[test]
    fn test_bad_selector_is_malformed() {
        let mut cfg = config();
        cfg.list_selector = ":::".into();
        let err = WebSource::from_config(&cfg, reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn test_config_deserializes_with_optional_fields() {
        let cfg: SourceConfig = serde_json::from_str(
            r#"{"url": "https://x.example/", "list_selector": ".c"}"#,
        )
        .unwrap();
        assert!(cfg.name_selector.is_none());
        assert!(cfg.number_pattern.is_none());
    }
}
