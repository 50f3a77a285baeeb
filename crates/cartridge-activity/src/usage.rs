// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequencing usage classification.
//!
//! Answers "does this SCORM 2004 package truly use sequencing, and at what
//! level?" from a set of evidence indicators. Weak evidence (namespace
//! declarations, schema-location hints, visibility flags, schema-default
//! delivery controls) never promotes a package on its own.

use cartridge_scorm::scorm2004::{Scorm2004Item, Scorm2004Manifest};
use cartridge_scorm::sequencing::Sequencing;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One piece of evidence found in the manifest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SequencingIndicator {
    /// The IMS Simple Sequencing namespace is declared.
    ImsssNamespace,
    /// The schema-location hint mentions the sequencing schema.
    SchemaLocationImsss,
    /// The schema-location hint mentions the ADL sequencing schema.
    SchemaLocationAdlseq,
    /// An item is marked invisible.
    ItemIsVisibleFalse,
    /// An empty item carries no resource reference.
    ItemNoIdentifierRef,
    /// An item carries a sequencing block with significant content.
    ActivitySequencing,
    /// A sequencing block carries a control mode.
    SequencingControlMode,
    /// A sequencing block carries condition rules.
    SequencingRules,
    /// A sequencing block carries randomization controls.
    SequencingRandomization,
    /// A sequencing block carries ADL objective extensions.
    SequencingAdlObjectives,
    /// A sequencing block carries rollup considerations.
    SequencingRollupConsiderations,
    /// A sequencing block constrains choice.
    SequencingConstrainChoice,
    /// An item's delivery controls deviate from the schema defaults.
    SequencingDeliveryControls,
    /// An item's sequencing points into the collection by `IDRef`.
    SequencingIdRef,
    /// The manifest carries a sequencing collection.
    SequencingCollection,
    /// A presentation block hides part of the LMS UI.
    PresentationControls,
    /// An item carries a completion threshold.
    CompletionThreshold,
    /// At least one resource is a SCO.
    ResourceSco,
}

/// How much of the sequencing machinery the package uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencingLevel {
    /// No meaningful sequencing evidence.
    None,
    /// Only collection-referenced sequencing with strong sub-elements.
    Minimal,
    /// No sequencing, but several SCOs under the default organization.
    Multi,
    /// Item-carried sequencing that a conformant player must honor.
    Full,
}

/// The analyzer's verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencingUsage {
    /// `true` iff the level is [`SequencingLevel::Full`].
    pub uses_sequencing: bool,
    /// The classified level.
    pub level: SequencingLevel,
    /// Every piece of evidence found, strong or weak.
    pub indicators: BTreeSet<SequencingIndicator>,
}

/// Significant content of a sequencing block: anything beyond `ID`/`IDRef`
/// bookkeeping and schema-default delivery controls.
fn has_significant_content(seq: &Sequencing) -> bool {
    seq.control_mode.is_some()
        || seq.sequencing_rules.as_ref().is_some_and(|r| !r.is_empty())
        || seq.limit_conditions.is_some()
        || seq.rollup_rules.is_some()
        || seq.objectives.is_some()
        || seq.adl_objectives.is_some()
        || seq.randomization_controls.is_some()
        || seq.rollup_considerations.is_some()
        || seq.constrain_choice_considerations.is_some()
        || seq
            .delivery_controls
            .as_ref()
            .is_some_and(|dc| !dc.is_schema_default())
}

fn sequencing_sub_indicators(seq: &Sequencing, out: &mut BTreeSet<SequencingIndicator>) {
    if seq.control_mode.is_some() {
        out.insert(SequencingIndicator::SequencingControlMode);
    }
    if seq.sequencing_rules.as_ref().is_some_and(|r| !r.is_empty()) {
        out.insert(SequencingIndicator::SequencingRules);
    }
    if seq.randomization_controls.is_some() {
        out.insert(SequencingIndicator::SequencingRandomization);
    }
    if seq.adl_objectives.is_some() {
        out.insert(SequencingIndicator::SequencingAdlObjectives);
    }
    if seq.rollup_considerations.is_some() {
        out.insert(SequencingIndicator::SequencingRollupConsiderations);
    }
    if seq.constrain_choice_considerations.is_some() {
        out.insert(SequencingIndicator::SequencingConstrainChoice);
    }
    if seq
        .delivery_controls
        .as_ref()
        .is_some_and(|dc| !dc.is_schema_default())
    {
        out.insert(SequencingIndicator::SequencingDeliveryControls);
    }
}

fn scan_item(
    item: &Scorm2004Item,
    manifest: &Scorm2004Manifest,
    indicators: &mut BTreeSet<SequencingIndicator>,
    minimal_candidate: &mut bool,
) {
    if item.is_visible == Some(false) {
        indicators.insert(SequencingIndicator::ItemIsVisibleFalse);
    }
    if item.identifier_ref.is_none() && item.items.is_empty() {
        indicators.insert(SequencingIndicator::ItemNoIdentifierRef);
    }
    if item
        .presentation
        .as_ref()
        .is_some_and(|p| p.hides_anything())
    {
        indicators.insert(SequencingIndicator::PresentationControls);
    }
    if item.completion_threshold.is_some() {
        indicators.insert(SequencingIndicator::CompletionThreshold);
    }
    if let Some(seq) = &item.sequencing {
        if has_significant_content(seq) {
            indicators.insert(SequencingIndicator::ActivitySequencing);
            sequencing_sub_indicators(seq, indicators);
        }
        if let Some(id_ref) = &seq.id_ref {
            indicators.insert(SequencingIndicator::SequencingIdRef);
            if let Some(entry) = manifest.collection_entry(id_ref)
                && has_significant_content(entry)
            {
                *minimal_candidate = true;
            }
        }
    }
    for child in &item.items {
        scan_item(child, manifest, indicators, minimal_candidate);
    }
}

const STRONG: &[SequencingIndicator] = &[
    SequencingIndicator::ActivitySequencing,
    SequencingIndicator::SequencingControlMode,
    SequencingIndicator::SequencingRules,
    SequencingIndicator::SequencingRandomization,
    SequencingIndicator::SequencingAdlObjectives,
    SequencingIndicator::SequencingRollupConsiderations,
    SequencingIndicator::SequencingConstrainChoice,
    SequencingIndicator::SequencingDeliveryControls,
    SequencingIndicator::PresentationControls,
    SequencingIndicator::CompletionThreshold,
];

/// Classify a SCORM 2004 manifest's sequencing usage.
#[must_use]
pub fn analyze_sequencing(manifest: &Scorm2004Manifest) -> SequencingUsage {
    let mut indicators = BTreeSet::new();
    let mut minimal_candidate = false;

    if manifest.namespaces.iter().any(|ns| ns.contains("imsss")) {
        indicators.insert(SequencingIndicator::ImsssNamespace);
    }
    if let Some(location) = &manifest.schema_location {
        if location.contains("imsss") {
            indicators.insert(SequencingIndicator::SchemaLocationImsss);
        }
        if location.contains("adlseq") {
            indicators.insert(SequencingIndicator::SchemaLocationAdlseq);
        }
    }
    if !manifest.sequencing_collection.is_empty() {
        indicators.insert(SequencingIndicator::SequencingCollection);
    }
    if !manifest.resources.sco_identifiers().is_empty() {
        indicators.insert(SequencingIndicator::ResourceSco);
    }

    for org in &manifest.organizations.organizations {
        for item in &org.items {
            scan_item(item, manifest, &mut indicators, &mut minimal_candidate);
        }
    }

    let has_strong = STRONG.iter().any(|s| indicators.contains(s));
    let level = if has_strong {
        SequencingLevel::Full
    } else if minimal_candidate {
        SequencingLevel::Minimal
    } else if default_org_sco_count(manifest) >= 2 {
        SequencingLevel::Multi
    } else {
        SequencingLevel::None
    };

    SequencingUsage {
        uses_sequencing: level == SequencingLevel::Full,
        level,
        indicators,
    }
}

/// Distinct SCO resources referenced from the default organization.
fn default_org_sco_count(manifest: &Scorm2004Manifest) -> usize {
    let mut seen = BTreeSet::new();
    for item in manifest.default_items() {
        if let Some(r) = &item.identifier_ref
            && let Some(resource) = manifest.resources.by_identifier(r)
            && resource
                .scorm_type
                .as_ref()
                .is_some_and(cartridge_scorm::ScormType::is_sco)
        {
            seen.insert(r.as_str());
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartridge_core::{CancellationToken, NoopParsingEventListener, ParseContext};
    use cartridge_fs::MemoryFileAccess;
    use cartridge_scorm::scorm2004::parse_scorm2004;

    fn manifest_from(xml: &str) -> Scorm2004Manifest {
        let fs = MemoryFileAccess::new().with_file("imsmanifest.xml", xml.as_bytes());
        let listener = NoopParsingEventListener;
        let cancel = CancellationToken::new();
        let mut ctx = ParseContext::new(&listener, &cancel);
        parse_scorm2004(&fs, &mut ctx).unwrap()
    }

    fn two_sco(extra_item_content: &str, extra_manifest: &str) -> String {
        format!(
            r#"<manifest identifier="m"
                xmlns="http://www.imsglobal.org/xsd/imscp_v1p1"
                xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3"
                xmlns:imsss="http://www.imsglobal.org/xsd/imsss">
                <organizations default="ORG">
                    <organization identifier="ORG">
                        <title>Org</title>
                        <item identifier="I1" identifierref="res-1">
                            <title>One</title>
                            {extra_item_content}
                        </item>
                        <item identifier="I2" identifierref="res-2"><title>Two</title></item>
                    </organization>
                </organizations>
                <resources>
                    <resource identifier="res-1" adlcp:scormType="sco" href="a.html"/>
                    <resource identifier="res-2" adlcp:scormType="sco" href="b.html"/>
                </resources>
                {extra_manifest}
            </manifest>"#
        )
    }

    #[test]
    fn namespace_declarations_alone_stay_none_for_single_sco() {
        let xml = r#"<manifest identifier="m"
            xmlns="http://www.imsglobal.org/xsd/imscp_v1p1"
            xmlns:imsss="http://www.imsglobal.org/xsd/imsss"
            xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3">
            <organizations default="ORG">
                <organization identifier="ORG">
                    <item identifier="I1" identifierref="res-1"><title>One</title></item>
                </organization>
            </organizations>
            <resources>
                <resource identifier="res-1" adlcp:scormType="sco" href="a.html"/>
            </resources>
        </manifest>"#;
        let usage = analyze_sequencing(&manifest_from(xml));
        assert_eq!(usage.level, SequencingLevel::None);
        assert!(!usage.uses_sequencing);
        assert!(usage
            .indicators
            .contains(&SequencingIndicator::ImsssNamespace));
        assert!(usage.indicators.contains(&SequencingIndicator::ResourceSco));
    }

    #[test]
    fn two_scos_without_sequencing_classify_multi() {
        let usage = analyze_sequencing(&manifest_from(&two_sco("", "")));
        assert_eq!(usage.level, SequencingLevel::Multi);
        assert!(!usage.uses_sequencing);
    }

    #[test]
    fn inline_control_mode_classifies_full() {
        let usage = analyze_sequencing(&manifest_from(&two_sco(
            r#"<imsss:sequencing><imsss:controlMode choice="true"/></imsss:sequencing>"#,
            "",
        )));
        assert_eq!(usage.level, SequencingLevel::Full);
        assert!(usage.uses_sequencing);
        assert!(usage
            .indicators
            .contains(&SequencingIndicator::ActivitySequencing));
        assert!(usage
            .indicators
            .contains(&SequencingIndicator::SequencingControlMode));
    }

    #[test]
    fn schema_default_delivery_controls_do_not_promote() {
        let usage = analyze_sequencing(&manifest_from(&two_sco(
            r#"<imsss:sequencing><imsss:deliveryControls tracked="true"/></imsss:sequencing>"#,
            "",
        )));
        // Two SCOs remain: the default-valued block is weak evidence.
        assert_eq!(usage.level, SequencingLevel::Multi);
        assert!(!usage
            .indicators
            .contains(&SequencingIndicator::ActivitySequencing));
    }

    #[test]
    fn non_default_delivery_controls_promote_to_full() {
        let usage = analyze_sequencing(&manifest_from(&two_sco(
            r#"<imsss:sequencing>
                   <imsss:deliveryControls completionSetByContent="true"/>
               </imsss:sequencing>"#,
            "",
        )));
        assert_eq!(usage.level, SequencingLevel::Full);
        assert!(usage
            .indicators
            .contains(&SequencingIndicator::SequencingDeliveryControls));
    }

    #[test]
    fn id_ref_into_strong_collection_is_minimal() {
        let usage = analyze_sequencing(&manifest_from(&two_sco(
            r#"<imsss:sequencing IDRef="shared"/>"#,
            r#"<imsss:sequencingCollection>
                   <imsss:sequencing ID="shared">
                       <imsss:controlMode flow="true"/>
                   </imsss:sequencing>
               </imsss:sequencingCollection>"#,
        )));
        assert_eq!(usage.level, SequencingLevel::Minimal);
        assert!(!usage.uses_sequencing);
        assert!(usage
            .indicators
            .contains(&SequencingIndicator::SequencingIdRef));
        assert!(usage
            .indicators
            .contains(&SequencingIndicator::SequencingCollection));
    }

    #[test]
    fn id_ref_into_empty_collection_entry_is_not_minimal() {
        let usage = analyze_sequencing(&manifest_from(&two_sco(
            r#"<imsss:sequencing IDRef="shared"/>"#,
            r#"<imsss:sequencingCollection>
                   <imsss:sequencing ID="shared"/>
               </imsss:sequencingCollection>"#,
        )));
        // Falls through to the SCO count.
        assert_eq!(usage.level, SequencingLevel::Multi);
    }

    #[test]
    fn presentation_with_hidden_ui_is_full() {
        let usage = analyze_sequencing(&manifest_from(&two_sco(
            r#"<adlnav:presentation xmlns:adlnav="http://www.adlnet.org/xsd/adlnav_v1p3">
                   <adlnav:navigationInterface>
                       <adlnav:hideLMSUI>continue</adlnav:hideLMSUI>
                   </adlnav:navigationInterface>
               </adlnav:presentation>"#,
            "",
        )));
        assert_eq!(usage.level, SequencingLevel::Full);
        assert!(usage
            .indicators
            .contains(&SequencingIndicator::PresentationControls));
    }

    #[test]
    fn default_only_presentation_stays_multi() {
        let usage = analyze_sequencing(&manifest_from(&two_sco(
            r#"<adlnav:presentation xmlns:adlnav="http://www.adlnet.org/xsd/adlnav_v1p3">
                   <adlnav:navigationInterface/>
               </adlnav:presentation>"#,
            "",
        )));
        assert_eq!(usage.level, SequencingLevel::Multi);
    }

    #[test]
    fn completion_threshold_is_full() {
        let usage = analyze_sequencing(&manifest_from(&two_sco(
            r#"<adlcp:completionThreshold minProgressMeasure="0.9"/>"#,
            "",
        )));
        assert_eq!(usage.level, SequencingLevel::Full);
        assert!(usage
            .indicators
            .contains(&SequencingIndicator::CompletionThreshold));
    }

    #[test]
    fn indicator_serde_is_screaming_snake() {
        let json = serde_json::to_string(&SequencingIndicator::ActivitySequencing).unwrap();
        assert_eq!(json, r#""ACTIVITY_SEQUENCING""#);
    }
}
