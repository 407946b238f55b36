/// Filename filter over rendered thumbnails
///
/// Matching is a case-insensitive substring test on the display name (the
/// part after the last path separator). The result keeps catalog order.
use crate::thumbnails::ThumbnailEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterView {
    query: String,
    /// Lowercased copy of `query`
    needle: String,
}

impl FilterView {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the query; returns true if the visible set may have changed
    pub fn set_query(&mut self, query: String) -> bool {
        if query == self.query {
            return false;
        }
        self.needle = query.to_lowercase();
        self.query = query;
        true
    }

    pub fn matches(&self, entry: &ThumbnailEntry) -> bool {
        self.needle.is_empty()
            || entry
                .file
                .display_name()
                .to_lowercase()
                .contains(&self.needle)
    }

    /// Entries passing the filter, in their original order
    pub fn apply<'a>(
        &'a self,
        entries: &'a [ThumbnailEntry],
    ) -> impl Iterator<Item = &'a ThumbnailEntry> + 'a {
        entries.iter().filter(move |entry| self.matches(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModelFile;
    use crate::render::{encode_png, ImageHandle};
    use image::RgbaImage;

    fn entries(ids: &[&str]) -> Vec<ThumbnailEntry> {
        let image: ImageHandle = encode_png(&RgbaImage::new(1, 1)).expect("encode");
        ids.iter()
            .map(|id| ThumbnailEntry {
                file: ModelFile::new(*id),
                image: image.clone(),
            })
            .collect()
    }

    fn visible(filter: &FilterView, entries: &[ThumbnailEntry]) -> Vec<String> {
        filter.apply(entries).map(|e| e.file.id.clone()).collect()
    }

    #[test]
    fn test_empty_query_shows_everything() {
        let all = entries(&["b.glb", "a.glb"]);
        assert_eq!(visible(&FilterView::default(), &all), ["b.glb", "a.glb"]);
    }

    #[test]
    fn test_case_insensitive_in_order() {
        let all = entries(&["Chair.glb", "table.glb", "armchair.glb", "lamp.glb"]);
        let mut filter = FilterView::default();
        assert!(filter.set_query("CHAIR".to_string()));

        assert_eq!(visible(&filter, &all), ["Chair.glb", "armchair.glb"]);
    }

    #[test]
    fn test_matches_display_name_only() {
        let all = entries(&["chairs/red.glb", "tables/chair-leg.glb"]);
        let mut filter = FilterView::default();
        filter.set_query("chair".to_string());

        assert_eq!(visible(&filter, &all), ["tables/chair-leg.glb"]);
    }

    #[test]
    fn test_same_query_is_not_a_change() {
        let mut filter = FilterView::default();
        assert!(filter.set_query("a".to_string()));
        assert!(!filter.set_query("a".to_string()));
        assert_eq!(filter.query(), "a");
    }
}
