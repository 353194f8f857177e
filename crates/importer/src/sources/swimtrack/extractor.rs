use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use storage::models::{Course, SwimmerName};

use super::stroke_mapper::SwimTrackStrokeMapper;
use crate::canonical::models::{RawRecord, SwimmerListing};
use crate::html::{element_text, resolve_href};
use crate::parsing::parse_link_title_date;
use crate::stroke_mapper::StrokeMapper;

lazy_static! {
    static ref SWIMMER_SELECT: Selector = Selector::parse(
        "select[name=zwemmer], select[id=zwemmer], select[name=swimmer], select[id=swimmer]"
    )
    .unwrap();
    static ref ANY_SELECT: Selector = Selector::parse("select").unwrap();
    static ref OPTION: Selector = Selector::parse("option").unwrap();
    static ref TIME_LINK: Selector = Selector::parse("a[href][title]").unwrap();
    static ref SLAG: Regex = Regex::new(r"slag=([a-z]+)(\d+)").unwrap();
}

/// Options of the swimmer dropdown. Values are personal-page URLs relative
/// to the listing page and are resolved here.
pub fn swimmer_options(html: &str, page_url: &str) -> Vec<SwimmerListing> {
    let document = Html::parse_document(html);
    let select = document
        .select(&SWIMMER_SELECT)
        .next()
        .or_else(|| document.select(&ANY_SELECT).next());

    let Some(select) = select else {
        return Vec::new();
    };

    select
        .select(&OPTION)
        .filter_map(|option| {
            let name = element_text(option);
            let value = option.value().attr("value").unwrap_or_default().trim();
            let lowered = name.to_lowercase();
            let placeholder = lowered.contains("kies") || lowered.contains("select");
            if name.is_empty() || value.is_empty() || placeholder {
                return None;
            }
            Some(SwimmerListing {
                name,
                url: resolve_href(page_url, value)?,
            })
        })
        .collect()
}

/// Exact (case-insensitive) full-name match first, then the first option
/// containing both name parts.
pub fn find_swimmer<'a>(
    options: &'a [SwimmerListing],
    name: &SwimmerName,
) -> Option<&'a SwimmerListing> {
    options
        .iter()
        .find(|o| name.matches_exactly(&o.name))
        .or_else(|| options.iter().find(|o| name.matches_loosely(&o.name)))
}

/// Result anchors on a personal page: `slag=<code><distance>` in the href and
/// "Gezwommen op DD-MM-YYYY" in the title. Split-time links (`tuss`) are ignored.
pub fn time_records(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let mapper = SwimTrackStrokeMapper;
    let mut records = Vec::new();

    for link in document.select(&TIME_LINK) {
        let href = link.value().attr("href").unwrap_or_default();
        let title = link.value().attr("title").unwrap_or_default();
        if !href.contains("slag=") || href.contains("tuss") || !title.contains("Gezwommen op") {
            continue;
        }

        let Some(caps) = SLAG.captures(href) else {
            continue;
        };
        let Some(stroke) = mapper.map_stroke(&caps[1]) else {
            tracing::debug!("Unknown stroke code in {}", href);
            continue;
        };

        let mut record = RawRecord::new(format!("{}m {}", &caps[2], stroke), element_text(link));
        record.stroke = Some(stroke);
        record.course = Some(Course::ShortCourse);
        record.date_text = parse_link_title_date(title).map(|d| d.to_string());
        records.push(record);
    }

    records
}
