use storage::models::Stroke;

use crate::stroke_mapper::StrokeMapper;

/// Maps the stroke codes in swimtrack `slag=` parameters (`vl50`, `ru100`, ...).
pub struct SwimTrackStrokeMapper;

impl StrokeMapper for SwimTrackStrokeMapper {
    fn map_stroke(&self, code: &str) -> Option<Stroke> {
        match code.to_lowercase().as_str() {
            "vl" => Some(Stroke::Butterfly),
            "ru" => Some(Stroke::Backstroke),
            "ss" => Some(Stroke::Breaststroke),
            "vr" => Some(Stroke::Freestyle),
            "wi" => Some(Stroke::IndividualMedley),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let mapper = SwimTrackStrokeMapper;
        assert_eq!(mapper.map_stroke("vl"), Some(Stroke::Butterfly));
        assert_eq!(mapper.map_stroke("ru"), Some(Stroke::Backstroke));
        assert_eq!(mapper.map_stroke("ss"), Some(Stroke::Breaststroke));
        assert_eq!(mapper.map_stroke("vr"), Some(Stroke::Freestyle));
        assert_eq!(mapper.map_stroke("wi"), Some(Stroke::IndividualMedley));
        assert_eq!(mapper.map_stroke("xx"), None);
    }
}
