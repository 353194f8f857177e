use lazy_static::lazy_static;
use regex::Regex;
use storage::models::Stroke;

lazy_static! {
    static ref IM_WORD: Regex = Regex::new(r"(?:\d\s*|\b)i\.?m\b").unwrap();
}

pub trait StrokeMapper {
    fn map_stroke(&self, source_label: &str) -> Option<Stroke>;
}

/// Free-text classifier for English and Dutch event labels.
///
/// Keyword groups are checked in a fixed order and the first hit wins, so
/// "100m Medley Freestyle leg" is Freestyle.
pub struct KeywordStrokeMapper;

const KEYWORDS: &[(Stroke, &[&str])] = &[
    (Stroke::Freestyle, &["free", "crawl", "vrij"]),
    (Stroke::Backstroke, &["back", "dorsal", "rug"]),
    (Stroke::Breaststroke, &["breast", "school"]),
    (Stroke::Butterfly, &["fly", "butterfly", "papillon", "vlinder"]),
    (Stroke::IndividualMedley, &["medley", "individual", "wissel"]),
];

impl StrokeMapper for KeywordStrokeMapper {
    fn map_stroke(&self, label: &str) -> Option<Stroke> {
        let label = label.to_lowercase();

        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| label.contains(w)))
            .map(|(stroke, _)| *stroke)
            .or_else(|| IM_WORD.is_match(&label).then_some(Stroke::IndividualMedley))
    }
}
