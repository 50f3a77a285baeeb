// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-family projector functions.
//!
//! Title and description preference order, per family: root manifest
//! element, then the default organization, then the first language entry
//! of the first language-tagged string.

use crate::{AuDetail, MetadataExtension, ModuleMetadata};
use cartridge_activity::{ActivityTree, SequencingUsage};
use cartridge_aicc::AiccManifest;
use cartridge_cmi5::Cmi5Manifest;
use cartridge_core::{ModuleEditionType, ModuleType};
use cartridge_scorm::scorm2004::Scorm2004Manifest;
use cartridge_scorm::sequencing::Sequencing;
use cartridge_scorm::{Resources, Scorm12Manifest};
use cartridge_xapi::TincanManifest;
use std::collections::{BTreeMap, BTreeSet};

/// Join an `xml:base` prefix onto a relative path, inserting a single
/// separator. Absolute paths and full URLs pass through untouched.
fn join_base(base: Option<&str>, path: &str) -> String {
    if path.contains("://") || path.starts_with('/') {
        return path.to_string();
    }
    match base.filter(|b| !b.is_empty()) {
        Some(base) if base.ends_with('/') => format!("{base}{path}"),
        Some(base) => format!("{base}/{path}"),
        None => path.to_string(),
    }
}

/// The launch URL of a resource: resources-level base, then
/// resource-level base, then `href`.
fn resource_launch_url(resources: &Resources, identifier: &str) -> Option<String> {
    let resource = resources.by_identifier(identifier)?;
    let href = resource.href.as_deref()?;
    let with_resource_base = join_base(resource.base.as_deref(), href);
    Some(join_base(resources.base.as_deref(), &with_resource_base))
}

// ── SCORM 1.2 ───────────────────────────────────────────────────────────

/// Project a SCORM 1.2 manifest.
#[must_use]
pub fn project_scorm12(manifest: &Scorm12Manifest) -> ModuleMetadata {
    let org = manifest.organizations.effective_default();
    let lom = manifest.metadata.lom.as_ref();

    let title = lom
        .and_then(|l| l.title.first_value())
        .map(str::to_string)
        .or_else(|| org.and_then(|o| o.title.clone()));
    let description = lom
        .and_then(|l| l.description.first_value())
        .map(str::to_string);

    let launch_url = manifest
        .default_items()
        .iter()
        .find_map(|item| item.identifier_ref.as_deref())
        .and_then(|r| resource_launch_url(&manifest.resources, r));

    let mut prerequisites = BTreeMap::new();
    let mut mastery_scores = BTreeMap::new();
    let mut custom_data = BTreeMap::new();
    for org in &manifest.organizations.organizations {
        for item in &org.items {
            collect_scorm12_item(item, &mut prerequisites, &mut mastery_scores, &mut custom_data);
        }
    }

    ModuleMetadata {
        title,
        description,
        launch_url,
        identifier: manifest.identifier.clone(),
        version: manifest.version.clone(),
        duration: lom.and_then(|l| l.typical_learning_time.clone()),
        module_type: ModuleType::Scorm12,
        module_edition: None,
        xapi_enabled: false,
        has_multiple_launchable_units: manifest.resources.sco_identifiers().len() >= 2,
        size_on_disk: None,
        extension: MetadataExtension::Scorm12 {
            prerequisites,
            mastery_scores,
            custom_data,
        },
    }
}

fn collect_scorm12_item(
    item: &cartridge_scorm::Scorm12Item,
    prerequisites: &mut BTreeMap<String, String>,
    mastery_scores: &mut BTreeMap<String, f64>,
    custom_data: &mut BTreeMap<String, String>,
) {
    if let Some(p) = &item.prerequisites {
        prerequisites.insert(item.identifier.clone(), p.clone());
    }
    if let Some(score) = item.mastery_score {
        mastery_scores.insert(item.identifier.clone(), score);
    }
    if let Some(data) = &item.data_from_lms {
        custom_data.insert(item.identifier.clone(), data.clone());
    }
    for child in &item.items {
        collect_scorm12_item(child, prerequisites, mastery_scores, custom_data);
    }
}

// ── SCORM 2004 ──────────────────────────────────────────────────────────

/// Project a SCORM 2004 manifest together with its activity tree and
/// sequencing analysis.
#[must_use]
pub fn project_scorm2004(
    manifest: &Scorm2004Manifest,
    tree: &ActivityTree,
    usage: &SequencingUsage,
    edition: Option<ModuleEditionType>,
) -> ModuleMetadata {
    let org = manifest.organizations.effective_default();
    let lom = manifest.metadata.lom.as_ref();

    let title = lom
        .and_then(|l| l.title.first_value())
        .map(str::to_string)
        .or_else(|| org.and_then(|o| o.title.clone()));
    let description = lom
        .and_then(|l| l.description.first_value())
        .map(str::to_string);

    let launch_url = tree
        .first_launchable()
        .and_then(|node| node.resource_identifier.as_deref())
        .and_then(|r| resource_launch_url(&manifest.resources, r));

    let mut global_objective_ids = Vec::new();
    for node in tree.items() {
        if let Some(seq) = &node.sequencing {
            collect_global_objectives(seq, &mut global_objective_ids);
        }
    }

    let mut sco_ids = Vec::new();
    let mut seen = BTreeSet::new();
    for item in manifest.default_items() {
        if let Some(r) = &item.identifier_ref
            && manifest
                .resources
                .by_identifier(r)
                .and_then(|res| res.scorm_type.as_ref())
                .is_some_and(cartridge_scorm::ScormType::is_sco)
            && seen.insert(r.clone())
        {
            sco_ids.push(r.clone());
        }
    }

    ModuleMetadata {
        title,
        description,
        launch_url,
        identifier: manifest.identifier.clone(),
        version: manifest.version.clone(),
        duration: lom.and_then(|l| l.typical_learning_time.clone()),
        module_type: ModuleType::Scorm2004,
        module_edition: edition,
        xapi_enabled: false,
        has_multiple_launchable_units: manifest.resources.sco_identifiers().len() >= 2,
        size_on_disk: None,
        extension: MetadataExtension::Scorm2004 {
            global_objective_ids,
            sco_ids,
            sequencing_level: usage.level,
            sequencing_indicators: usage.indicators.clone(),
            activity_tree: tree.clone(),
        },
    }
}

fn collect_global_objectives(seq: &Sequencing, out: &mut Vec<String>) {
    if let Some(objectives) = &seq.objectives {
        for objective in objectives.iter() {
            for map in &objective.map_info {
                if !out.contains(&map.target_objective_id) {
                    out.push(map.target_objective_id.clone());
                }
            }
        }
    }
    if let Some(adl) = &seq.adl_objectives {
        for objective in &adl.objectives {
            for map in &objective.map_info {
                if !out.contains(&map.target_objective_id) {
                    out.push(map.target_objective_id.clone());
                }
            }
        }
    }
}

// ── cmi5 ────────────────────────────────────────────────────────────────

/// Project a cmi5 course structure.
#[must_use]
pub fn project_cmi5(manifest: &Cmi5Manifest) -> ModuleMetadata {
    let all_aus = manifest.all_assignable_units();

    let mut assignable_unit_ids = Vec::new();
    let mut assignable_unit_urls = Vec::new();
    let mut au_details = BTreeMap::new();
    let mut mastery_scores = BTreeMap::new();
    let mut move_on_criteria = BTreeMap::new();
    let mut launch_methods = BTreeMap::new();
    let mut activity_types = BTreeMap::new();
    let mut launch_parameters = BTreeMap::new();

    for au in &all_aus {
        assignable_unit_ids.push(au.id.clone());
        if let Some(url) = &au.url {
            assignable_unit_urls.push(url.clone());
        }
        if let Some(score) = au.mastery_score {
            mastery_scores.insert(au.id.clone(), score.value());
        }
        if let Some(move_on) = &au.move_on {
            move_on_criteria.insert(au.id.clone(), move_on.as_str().to_string());
        }
        if let Some(method) = &au.launch_method {
            let lexical = match method {
                cartridge_cmi5::LaunchMethod::AnyWindow => "AnyWindow".to_string(),
                cartridge_cmi5::LaunchMethod::OwnWindow => "OwnWindow".to_string(),
                cartridge_cmi5::LaunchMethod::Unknown(raw) => raw.clone(),
            };
            launch_methods.insert(au.id.clone(), lexical);
        }
        if let Some(activity_type) = &au.activity_type {
            activity_types.insert(au.id.clone(), activity_type.clone());
        }
        if let Some(params) = &au.launch_parameters {
            launch_parameters.insert(au.id.clone(), params.clone());
        }
        au_details.insert(
            au.id.clone(),
            AuDetail {
                url: au.url.clone(),
                title: au.title.first_value().map(str::to_string),
                description: au.description.first_value().map(str::to_string),
                launch_method: launch_methods.get(&au.id).cloned(),
                move_on: move_on_criteria.get(&au.id).cloned(),
                mastery_score: au.mastery_score.map(|s| s.value()),
                activity_type: au.activity_type.clone(),
                launch_parameters: au.launch_parameters.clone(),
                entitlement_key: au.entitlement_key.clone(),
            },
        );
    }

    ModuleMetadata {
        title: manifest.course.title.first_value().map(str::to_string),
        description: manifest.course.description.first_value().map(str::to_string),
        launch_url: manifest
            .first_launchable_au()
            .and_then(|au| au.url.clone()),
        identifier: Some(manifest.course.id.clone()).filter(|id| !id.is_empty()),
        version: None,
        duration: None,
        module_type: ModuleType::Cmi5,
        module_edition: None,
        // The orchestrator flips this when a tincan.xml sits beside the
        // course structure.
        xapi_enabled: false,
        // cmi5 is single-launch by design.
        has_multiple_launchable_units: false,
        size_on_disk: None,
        extension: MetadataExtension::Cmi5 {
            assignable_unit_ids,
            assignable_unit_urls,
            au_details,
            mastery_scores,
            move_on_criteria,
            launch_methods,
            activity_types,
            launch_parameters,
            block_ids: manifest.block_ids().iter().map(|s| s.to_string()).collect(),
            objective_ids: manifest.objectives.iter().map(|o| o.id.clone()).collect(),
        },
    }
}

// ── AICC ────────────────────────────────────────────────────────────────

/// Project an AICC course.
#[must_use]
pub fn project_aicc(manifest: &AiccManifest) -> ModuleMetadata {
    let assignable_unit_ids: Vec<String> = manifest
        .assignable_units
        .iter()
        .map(|au| au.system_id.clone())
        .collect();
    let assignable_unit_names = manifest
        .assignable_units
        .iter()
        .filter_map(|au| {
            manifest
                .title_of(&au.system_id)
                .map(|t| (au.system_id.clone(), t.to_string()))
        })
        .collect();
    let prerequisites = manifest
        .prerequisites
        .iter()
        .map(|row| (row.structure_element.clone(), row.expression.clone()))
        .collect();
    let completion_requirements = manifest
        .completion_requirements
        .iter()
        .map(|row| (row.structure_element.clone(), row.requirement.clone()))
        .collect();

    let description = manifest.course.course_description.as_text();

    ModuleMetadata {
        title: manifest.course.course.course_title.clone(),
        description: (!description.trim().is_empty()).then_some(description),
        launch_url: manifest
            .first_assignable_unit()
            .and_then(|au| au.launch_target())
            .map(str::to_string),
        identifier: manifest.course.course.course_id.clone(),
        version: manifest.course.course.version.clone(),
        duration: None,
        module_type: ModuleType::Aicc,
        module_edition: None,
        xapi_enabled: false,
        has_multiple_launchable_units: manifest.assignable_units.len() >= 2,
        size_on_disk: None,
        extension: MetadataExtension::Aicc {
            assignable_unit_ids,
            assignable_unit_names,
            prerequisites,
            completion_requirements,
        },
    }
}

// ── xAPI ────────────────────────────────────────────────────────────────

/// Project a bare TinCan descriptor.
#[must_use]
pub fn project_tincan(manifest: &TincanManifest) -> ModuleMetadata {
    let first = manifest.activities.first();
    ModuleMetadata {
        title: first.and_then(|a| a.name.first_value()).map(str::to_string),
        description: first
            .and_then(|a| a.description.first_value())
            .map(str::to_string),
        launch_url: manifest.first_launch().map(str::to_string),
        identifier: first.map(|a| a.id.clone()).filter(|id| !id.is_empty()),
        version: None,
        duration: None,
        module_type: ModuleType::Xapi,
        module_edition: None,
        xapi_enabled: true,
        has_multiple_launchable_units: manifest
            .activities
            .iter()
            .filter(|a| a.launch.first_value().is_some())
            .count()
            >= 2,
        size_on_disk: None,
        extension: MetadataExtension::Xapi {
            activity_ids: manifest.activities.iter().map(|a| a.id.clone()).collect(),
        },
    }
}
