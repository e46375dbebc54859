//! Detection of deprecated sign-in libraries in page scripts.
//!
//! Scripts are scanned line by line for known API signatures. Results for
//! scripts loaded later can be folded into an earlier result with
//! [`sum_up_detection_results`].

pub mod signatures;

use serde::{Deserialize, Serialize};
use signatures::{GIS_SIGNATURES, GSI_V2_MODULE_SIGNATURES, GSI_V2_SIGNATURES};

/// A script loaded by the inspected page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptResource {
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ScriptResource {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: Some(content.into()),
        }
    }
}

/// Where a signature was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLocation {
    pub script_url: String,
    /// 1-based line number.
    pub line: usize,
}

/// Every location of one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureMatch {
    pub feature: String,
    pub sub_items: Vec<MatchLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryMatches {
    pub signature_matches: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_match: Option<usize>,
    pub matches: Vec<SignatureMatch>,
}

impl LibraryMatches {
    fn with_modules() -> Self {
        Self {
            module_match: Some(0),
            ..Self::default()
        }
    }

    fn record(&mut self, feature: &str, location: MatchLocation) {
        self.signature_matches += 1;
        match self.matches.iter_mut().find(|m| m.feature == feature) {
            Some(existing) => {
                if !existing.sub_items.contains(&location) {
                    existing.sub_items.push(location);
                }
            }
            None => self.matches.push(SignatureMatch {
                feature: feature.to_string(),
                sub_items: vec![location],
            }),
        }
    }

    fn absorb(&mut self, other: &LibraryMatches) {
        self.signature_matches += other.signature_matches;
        if let Some(modules) = other.module_match {
            *self.module_match.get_or_insert(0) += modules;
        }
        for matched in &other.matches {
            for location in &matched.sub_items {
                match self.matches.iter_mut().find(|m| m.feature == matched.feature) {
                    Some(existing) if existing.sub_items.contains(location) => {}
                    Some(existing) => existing.sub_items.push(location.clone()),
                    None => self.matches.push(SignatureMatch {
                        feature: matched.feature.clone(),
                        sub_items: vec![location.clone()],
                    }),
                }
            }
        }
    }
}

/// Detection result for every known library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryData {
    pub gis: LibraryMatches,
    pub gsi_v2: LibraryMatches,
}

impl Default for LibraryData {
    fn default() -> Self {
        Self {
            gis: LibraryMatches::default(),
            gsi_v2: LibraryMatches::with_modules(),
        }
    }
}

impl LibraryData {
    pub fn gis_detected(&self) -> bool {
        !self.gis.matches.is_empty()
    }

    /// Moment methods only matter when the GSI client itself is loaded.
    pub fn gsi_v2_detected(&self) -> bool {
        !self.gsi_v2.matches.is_empty() && self.gsi_v2.module_match.unwrap_or(0) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.gis.matches.is_empty() && self.gsi_v2.matches.is_empty()
    }
}

/// Scan scripts for deprecated API signatures.
pub fn detect_matching_signatures(resources: &[ScriptResource]) -> LibraryData {
    let mut data = LibraryData::default();

    for resource in resources {
        let Some(content) = resource.content.as_deref() else {
            continue;
        };
        for (index, line) in content.lines().enumerate() {
            let location = || MatchLocation {
                script_url: resource.url.clone(),
                line: index + 1,
            };

            for signature in GIS_SIGNATURES {
                if contains_signature(line, signature) {
                    data.gis.record(signature, location());
                }
            }
            for signature in GSI_V2_SIGNATURES {
                if contains_signature(line, signature) {
                    data.gsi_v2.record(signature, location());
                }
            }
            if GSI_V2_MODULE_SIGNATURES
                .iter()
                .any(|signature| line.contains(signature))
            {
                *data.gsi_v2.module_match.get_or_insert(0) += 1;
            }
        }
    }

    if !data.is_empty() {
        tracing::debug!(
            gis = data.gis.signature_matches,
            gsi_v2 = data.gsi_v2.signature_matches,
            "deprecated sign-in signatures found"
        );
    }
    data
}

/// Fold a newer detection result into an accumulated one.
pub fn sum_up_detection_results(accumulated: &LibraryData, latest: &LibraryData) -> LibraryData {
    let mut sum = accumulated.clone();
    sum.gis.absorb(&latest.gis);
    sum.gsi_v2.absorb(&latest.gsi_v2);
    sum
}

/// `signature` occurs in `line` and is not the prefix of a longer name.
fn contains_signature(line: &str, signature: &str) -> bool {
    line.match_indices(signature).any(|(start, _)| {
        line[start + signature.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '$'))
    })
}
