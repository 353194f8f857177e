use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use storage::models::Course;

use crate::canonical::models::{RawRecord, SwimmerListing};
use crate::html::{element_text, link_or_text, resolve_href};

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref STYLE_SELECT: Selector = Selector::parse("select[name=rankingStyleId]").unwrap();
    static ref ANY_SELECT: Selector = Selector::parse("select").unwrap();
    static ref OPTION: Selector = Selector::parse("option").unwrap();
    static ref BEST_TABLE: Selector = Selector::parse("table.athleteBest").unwrap();
    static ref RANKING_TABLE: Selector = Selector::parse("table.athleteRanking").unwrap();
    static ref ROW: Selector = Selector::parse("tr").unwrap();
    static ref CELL: Selector = Selector::parse("td").unwrap();
    static ref ATHLETE_ID: Regex = Regex::new(r"(?i)athleteId=(\d+)").unwrap();
}

/// One entry of the "personal ranking" style dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingStyle {
    pub id: u32,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableKind {
    PersonalBest,
    RankingHistory,
}

/// Absolute URL of the first athlete detail link on a search result page.
pub fn find_detail_link(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains("athleteDetail"))
        .and_then(|href| resolve_athlete_href(page_url, href))
}

/// Like `resolve_href`, but a bare query such as `page=athleteDetail&athleteId=1`
/// is read as the query string of `index.php`.
fn resolve_athlete_href(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    let bare_query = href.contains('=')
        && !href.contains('?')
        && !href.contains("://")
        && !href.starts_with('/');
    if bare_query {
        resolve_href(page_url, &format!("/index.php?{}", href))
    } else {
        resolve_href(page_url, href)
    }
}

pub fn athlete_id(url: &str) -> Option<u64> {
    ATHLETE_ID.captures(url)?.get(1)?.as_str().parse().ok()
}

/// Athletes linked from a listing or search page, deduplicated by name.
pub fn athlete_listings(html: &str, page_url: &str) -> Vec<SwimmerListing> {
    let document = Html::parse_document(html);
    let mut listings: Vec<SwimmerListing> = Vec::new();

    for link in document.select(&LINK) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().contains("athleteid=") {
            continue;
        }

        let name = element_text(link);
        let lowered = name.to_lowercase();
        if name.chars().count() < 2 || lowered.contains("select") || lowered.contains("home") {
            continue;
        }
        if listings.iter().any(|l| l.name == name) {
            continue;
        }
        if let Some(url) = resolve_athlete_href(page_url, href) {
            listings.push(SwimmerListing { name, url });
        }
    }

    listings
}

/// Numeric style ids from the ranking dropdown, in page order.
pub fn ranking_styles(html: &str) -> Vec<RankingStyle> {
    let document = Html::parse_document(html);
    let select = document.select(&STYLE_SELECT).next().or_else(|| {
        document.select(&ANY_SELECT).find(|s| {
            let inner = s.inner_html();
            inner.contains("50m Freestyle") || inner.contains("Backstroke")
        })
    });

    let Some(select) = select else {
        return Vec::new();
    };

    select
        .select(&OPTION)
        .filter_map(|option| {
            let id: u32 = option.value().attr("value")?.trim().parse().ok()?;
            (id != 0).then(|| RankingStyle {
                id,
                label: element_text(option),
            })
        })
        .collect()
}

/// Result rows from a detail page. Personal-best tables name the event per row;
/// ranking-history tables rely on `style_label` and are skipped without one.
pub fn performance_records(html: &str, style_label: Option<&str>) -> Vec<RawRecord> {
    let document = Html::parse_document(html);

    let mut kind = TableKind::PersonalBest;
    let mut tables: Vec<ElementRef> = document.select(&BEST_TABLE).collect();
    if tables.is_empty() {
        kind = TableKind::RankingHistory;
        tables = document.select(&RANKING_TABLE).collect();
    }

    let mut records = Vec::new();
    for table in tables {
        let mut block_course = None;
        for row in table.select(&ROW) {
            let class = row.value().attr("class").unwrap_or_default();
            if class.contains("Head") {
                block_course = course_marker(&element_text(row));
                continue;
            }
            if !(class.contains("athleteBest") || class.contains("athleteRanking")) {
                continue;
            }

            let cells: Vec<ElementRef> = row.select(&CELL).collect();
            let record = match kind {
                TableKind::PersonalBest => personal_best_row(&cells, block_course),
                TableKind::RankingHistory => {
                    style_label.and_then(|label| ranking_row(&cells, label, block_course))
                }
            };
            if let Some(record) = record {
                records.push(record);
            }
        }
    }

    records
}

// [event-link, course, time, code, date]
fn personal_best_row(cells: &[ElementRef], block_course: Option<Course>) -> Option<RawRecord> {
    if cells.len() < 5 {
        return None;
    }

    let mut record = RawRecord::new(link_or_text(cells[0]), link_or_text(cells[2]));
    record.course = block_course.or_else(|| course_marker(&element_text(cells[1])));
    record.date_text = Some(element_text(cells[4])).filter(|d| !d.is_empty());
    Some(record)
}

// [time, code, date, city]
fn ranking_row(
    cells: &[ElementRef],
    style_label: &str,
    block_course: Option<Course>,
) -> Option<RawRecord> {
    if cells.len() < 3 {
        return None;
    }

    let mut record = RawRecord::new(style_label, link_or_text(cells[0]));
    record.course = block_course;
    record.date_text = Some(element_text(cells[2])).filter(|d| !d.is_empty());
    record.location = cells
        .get(3)
        .map(|cell| element_text(*cell))
        .filter(|city| !city.is_empty());
    Some(record)
}

fn course_marker(text: &str) -> Option<Course> {
    let lowered = text.to_lowercase();
    if lowered.contains("25m") || lowered.contains("short course") {
        Some(Course::ShortCourse)
    } else if lowered.contains("50m") || lowered.contains("long course") {
        Some(Course::LongCourse)
    } else {
        None
    }
}
