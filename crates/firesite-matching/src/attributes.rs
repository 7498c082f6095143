//! Per-target attributes carried through entity resolution.
//!
//! When several directory rows resolve to one forest their attributes are
//! merged with [`MergeAttributes::merge`].

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Union of two attribute sets describing the same forest.
pub trait MergeAttributes: Clone + Default {
    fn merge(&mut self, other: &Self);
}

/// Facility flags from the facilities directory. Merged by logical OR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestFacilities {
    pub camping: bool,
    pub fireplaces: bool,
    pub toilets: bool,
    pub picnic_areas: bool,
    pub walking_tracks: bool,
    pub four_wheel_driving: bool,
    pub horse_riding: bool,
    pub mountain_biking: bool,
}

impl ForestFacilities {
    /// Builds flags from directory tags. Unknown tags are ignored.
    #[must_use]
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut flags = Self::default();
        for tag in tags {
            let tag = tag.as_ref().trim().to_lowercase().replace(['-', '_'], " ");
            match tag.as_str() {
                "camping" | "campground" | "camp sites" => flags.camping = true,
                "fireplaces" | "fire places" | "barbecue" | "barbecues" | "bbq" => {
                    flags.fireplaces = true;
                }
                "toilets" | "toilet" => flags.toilets = true,
                "picnic" | "picnic areas" | "picnic area" => flags.picnic_areas = true,
                "walking" | "walking tracks" | "bushwalking" => flags.walking_tracks = true,
                "4wd" | "four wheel driving" | "4wd tracks" => flags.four_wheel_driving = true,
                "horse riding" => flags.horse_riding = true,
                "mountain biking" | "cycling" => flags.mountain_biking = true,
                other => tracing::debug!(tag = other, "ignoring unknown facility tag"),
            }
        }
        flags
    }
}

impl MergeAttributes for ForestFacilities {
    fn merge(&mut self, other: &Self) {
        self.camping |= other.camping;
        self.fireplaces |= other.fireplaces;
        self.toilets |= other.toilets;
        self.picnic_areas |= other.picnic_areas;
        self.walking_tracks |= other.walking_tracks;
        self.four_wheel_driving |= other.four_wheel_driving;
        self.horse_riding |= other.horse_riding;
        self.mountain_biking |= other.mountain_biking;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    None,
    Partial,
    Full,
}

/// Structured reading of a closure notice's free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureImpact {
    pub level: ImpactLevel,
    pub affects_camping: bool,
    pub affects_access: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureNotice {
    pub title: String,
    pub detail: Option<String>,
    pub url: Option<String>,
    /// Filled in by a [`ClosureImpactClassifier`], if one is plugged in.
    pub impact: Option<ClosureImpact>,
}

/// Closure notices attached to one forest. Merged by concatenation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureNotices(pub Vec<ClosureNotice>);

impl MergeAttributes for ClosureNotices {
    fn merge(&mut self, other: &Self) {
        for notice in &other.0 {
            if !self.0.contains(notice) {
                self.0.push(notice.clone());
            }
        }
    }
}

/// Text-to-impact enrichment step (an LLM classifier in production).
pub trait ClosureImpactClassifier {
    /// Returns `None` when the text could not be classified.
    fn classify(&self, text: &str) -> impl Future<Output = Option<ClosureImpact>> + Send;
}

/// Runs `classifier` over every notice that has not been classified yet.
///
/// Returns the number of notices that received an impact.
pub async fn classify_closures<C: ClosureImpactClassifier>(
    notices: &mut ClosureNotices,
    classifier: &C,
) -> usize {
    let mut classified = 0;
    for notice in notices.0.iter_mut().filter(|n| n.impact.is_none()) {
        let text = match &notice.detail {
            Some(detail) => format!("{}\n{detail}", notice.title),
            None => notice.title.clone(),
        };
        match classifier.classify(&text).await {
            Some(impact) => {
                notice.impact = Some(impact);
                classified += 1;
            }
            None => tracing::warn!(title = %notice.title, "closure notice left unclassified"),
        }
    }
    classified
}
