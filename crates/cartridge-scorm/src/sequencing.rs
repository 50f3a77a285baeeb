// SPDX-License-Identifier: MIT OR Apache-2.0

//! IMS Simple Sequencing and ADL sequencing model.
//!
//! Attribute presence is kept distinct from schema defaults: fields are
//! `Option<T>` and accessors apply the default, so consumers can tell "the
//! author wrote the default value" apart from "the author wrote nothing".

use cartridge_core::{MeasureType, ParseContext, PercentType, ScormDuration};
use cartridge_error::ParseError;
use cartridge_xml::decode::{bool_attr, measure_attr, percent_attr, u32_attr};
use cartridge_xml::{XmlElement, measure_value, percent_value};
use serde::{Deserialize, Serialize};

/// ADL sequencing namespace, used to tell `adlseq:objectives` apart from
/// `imsss:objectives`.
pub const ADLSEQ_NAMESPACE: &str = "http://www.adlnet.org/xsd/adlseq_v1p3";

// ── Vocabularies ────────────────────────────────────────────────────────

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Unrecognized vocabulary, preserved verbatim.
            Unknown(String),
        }

        impl $name {
            /// Case-insensitive vocabulary parse; unknown text is
            /// preserved, not rejected.
            #[must_use]
            pub fn parse(value: &str) -> Self {
                let lowered = value.trim().to_ascii_lowercase();
                match lowered.as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::Unknown(value.trim().to_string()),
                }
            }

            /// `true` when the value fell back to [`Self::Unknown`].
            #[must_use]
            pub fn is_unknown(&self) -> bool {
                matches!(self, Self::Unknown(_))
            }
        }
    };
}

vocabulary! {
    /// How a condition set combines its members.
    ConditionCombination {
        /// Every condition must hold.
        All => "all",
        /// Any one condition suffices.
        Any => "any",
    }
}

vocabulary! {
    /// The tested condition of a sequencing rule.
    RuleConditionType {
        /// The referenced objective is satisfied.
        Satisfied => "satisfied",
        /// The referenced objective's status is known.
        ObjectiveStatusKnown => "objectivestatusknown",
        /// The referenced objective's measure is known.
        ObjectiveMeasureKnown => "objectivemeasureknown",
        /// The measure exceeds the threshold.
        ObjectiveMeasureGreaterThan => "objectivemeasuregreaterthan",
        /// The measure is below the threshold.
        ObjectiveMeasureLessThan => "objectivemeasurelessthan",
        /// The activity is completed.
        Completed => "completed",
        /// The activity's progress is known.
        ActivityProgressKnown => "activityprogressknown",
        /// The activity has been attempted.
        Attempted => "attempted",
        /// The attempt limit has been exceeded.
        AttemptLimitExceeded => "attemptlimitexceeded",
        /// The time limit has been exceeded.
        TimeLimitExceeded => "timelimitexceeded",
        /// Outside the available time range.
        OutsideAvailableTimeRange => "outsideavailabletimerange",
        /// Unconditionally true.
        Always => "always",
    }
}

vocabulary! {
    /// Optional negation applied to a condition.
    ConditionOperator {
        /// Use the condition as-is.
        NoOp => "noop",
        /// Negate the condition.
        Not => "not",
    }
}

vocabulary! {
    /// Action of a pre-condition rule.
    PreConditionAction {
        /// Skip the activity during flow.
        Skip => "skip",
        /// Disable the activity.
        Disabled => "disabled",
        /// Hide the activity from choice navigation.
        HiddenFromChoice => "hiddenfromchoice",
        /// Stop forward traversal at the activity.
        StopForwardTraversal => "stopforwardtraversal",
    }
}

vocabulary! {
    /// Action of an exit-condition rule.
    ExitConditionAction {
        /// Exit the activity.
        Exit => "exit",
    }
}

vocabulary! {
    /// Action of a post-condition rule.
    PostConditionAction {
        /// Exit the parent activity.
        ExitParent => "exitparent",
        /// Exit every ancestor.
        ExitAll => "exitall",
        /// Retry the activity.
        Retry => "retry",
        /// Retry the whole tree.
        RetryAll => "retryall",
        /// Continue to the next activity.
        Continue => "continue",
        /// Go to the previous activity.
        Previous => "previous",
    }
}

vocabulary! {
    /// Which children a rollup rule considers.
    ChildActivitySet {
        /// Every child.
        All => "all",
        /// At least one child.
        Any => "any",
        /// No child.
        None => "none",
        /// At least `minimumCount` children.
        AtLeastCount => "atleastcount",
        /// At least `minimumPercent` of the children.
        AtLeastPercent => "atleastpercent",
    }
}

vocabulary! {
    /// The status a rollup rule writes to the parent.
    RollupActionType {
        /// Mark the parent satisfied.
        Satisfied => "satisfied",
        /// Mark the parent not satisfied.
        NotSatisfied => "notsatisfied",
        /// Mark the parent completed.
        Completed => "completed",
        /// Mark the parent incomplete.
        Incomplete => "incomplete",
    }
}

vocabulary! {
    /// The tested condition of a rollup rule.
    RollupConditionType {
        /// The child is satisfied.
        Satisfied => "satisfied",
        /// The child's objective status is known.
        ObjectiveStatusKnown => "objectivestatusknown",
        /// The child's objective measure is known.
        ObjectiveMeasureKnown => "objectivemeasureknown",
        /// The child is completed.
        Completed => "completed",
        /// The child's progress is known.
        ActivityProgressKnown => "activityprogressknown",
        /// The child has been attempted.
        Attempted => "attempted",
        /// The child's attempt limit has been exceeded.
        AttemptLimitExceeded => "attemptlimitexceeded",
        /// The child's time limit has been exceeded.
        TimeLimitExceeded => "timelimitexceeded",
        /// Outside the available time range.
        OutsideAvailableTimeRange => "outsideavailabletimerange",
    }
}

vocabulary! {
    /// When randomization or selection happens.
    RandomizationTiming {
        /// Never.
        Never => "never",
        /// Once, on first attempt.
        Once => "once",
        /// On every new attempt.
        OnEachNewAttempt => "oneachnewattempt",
    }
}

vocabulary! {
    /// When a child is required for a rollup consideration.
    RollupConsiderationType {
        /// Always considered.
        Always => "always",
        /// Considered when attempted.
        IfAttempted => "ifattempted",
        /// Considered unless skipped.
        IfNotSkipped => "ifnotskipped",
        /// Considered unless suspended.
        IfNotSuspended => "ifnotsuspended",
    }
}

// ── Structures ──────────────────────────────────────────────────────────

/// `<imsss:controlMode>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlMode {
    /// `choice` attribute (schema default `true`).
    pub choice: Option<bool>,
    /// `choiceExit` attribute (schema default `true`).
    pub choice_exit: Option<bool>,
    /// `flow` attribute (schema default `false`).
    pub flow: Option<bool>,
    /// `forwardOnly` attribute (schema default `false`).
    pub forward_only: Option<bool>,
    /// `useCurrentAttemptObjectiveInfo` attribute (schema default `true`).
    pub use_current_attempt_objective_info: Option<bool>,
    /// `useCurrentAttemptProgressInfo` attribute (schema default `true`).
    pub use_current_attempt_progress_info: Option<bool>,
}

impl ControlMode {
    /// `choice` with its schema default applied.
    #[must_use]
    pub fn choice_or_default(&self) -> bool {
        self.choice.unwrap_or(true)
    }

    /// `flow` with its schema default applied.
    #[must_use]
    pub fn flow_or_default(&self) -> bool {
        self.flow.unwrap_or(false)
    }
}

/// One condition inside a rule condition set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// The tested condition.
    pub condition: RuleConditionType,
    /// Optional negation (schema default `noOp`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,
    /// Local objective the condition reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_objective: Option<String>,
    /// Threshold for the measure comparisons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_threshold: Option<MeasureType>,
}

/// The condition set of a sequencing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConditions {
    /// `conditionCombination` attribute (schema default `all`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination: Option<ConditionCombination>,
    /// The conditions, in document order.
    pub conditions: Vec<RuleCondition>,
}

/// A pre-, exit-, or post-condition rule; the action type is the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencingRule<A> {
    /// The condition set gating the action.
    pub conditions: RuleConditions,
    /// The action taken when the conditions hold.
    pub action: A,
}

/// `<imsss:sequencingRules>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequencingRules {
    /// Pre-condition rules, in document order.
    pub pre_condition_rules: Vec<SequencingRule<PreConditionAction>>,
    /// Exit-condition rules, in document order.
    pub exit_condition_rules: Vec<SequencingRule<ExitConditionAction>>,
    /// Post-condition rules, in document order.
    pub post_condition_rules: Vec<SequencingRule<PostConditionAction>>,
}

impl SequencingRules {
    /// `true` when no rules of any profile are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pre_condition_rules.is_empty()
            && self.exit_condition_rules.is_empty()
            && self.post_condition_rules.is_empty()
    }
}

/// `<imsss:limitConditions>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitConditions {
    /// Maximum attempts on the activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_limit: Option<u32>,
    /// Wall-clock cap per attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_absolute_duration_limit: Option<ScormDuration>,
    /// Wall-clock cap for the activity across attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_absolute_duration_limit: Option<ScormDuration>,
}

/// One rollup rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRule {
    /// Which children the rule considers (schema default `all`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_activity_set: Option<ChildActivitySet>,
    /// Minimum child count for `atLeastCount`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_count: Option<u32>,
    /// Minimum child fraction for `atLeastPercent`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_percent: Option<PercentType>,
    /// The condition set (combination schema default `any`).
    pub conditions: RuleConditions2,
    /// The status written to the parent.
    pub action: RollupActionType,
}

/// The condition set of a rollup rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConditions2 {
    /// `conditionCombination` attribute (schema default `any`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination: Option<ConditionCombination>,
    /// The conditions, in document order.
    pub conditions: Vec<RollupCondition>,
}

/// One condition inside a rollup condition set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupCondition {
    /// The tested condition.
    pub condition: RollupConditionType,
    /// Optional negation (schema default `noOp`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,
}

/// `<imsss:rollupRules>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupRules {
    /// Whether objective satisfaction rolls up (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup_objective_satisfied: Option<bool>,
    /// Whether progress completion rolls up (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup_progress_completion: Option<bool>,
    /// Weight of this activity's measure in the parent's measure
    /// (schema default `1.0`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_measure_weight: Option<PercentType>,
    /// The rules, in document order.
    pub rules: Vec<RollupRule>,
}

impl RollupRules {
    /// `true` when no attribute is set and no rule is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rollup_objective_satisfied.is_none()
            && self.rollup_progress_completion.is_none()
            && self.objective_measure_weight.is_none()
            && self.rules.is_empty()
    }
}

/// Mapping between a local objective and a global shared objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    /// Identifier of the global objective.
    pub target_objective_id: String,
    /// Read satisfaction from the global objective (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_satisfied_status: Option<bool>,
    /// Write satisfaction to the global objective (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_satisfied_status: Option<bool>,
    /// Read the measure from the global objective (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_normalized_measure: Option<bool>,
    /// Write the measure to the global objective (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_normalized_measure: Option<bool>,
}

/// A local objective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    /// Local objective identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_id: Option<String>,
    /// Whether satisfaction derives from the measure (schema default
    /// `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfied_by_measure: Option<bool>,
    /// Threshold for measure-derived satisfaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_normalized_measure: Option<MeasureType>,
    /// Global objective mappings, in document order.
    pub map_info: Vec<MapInfo>,
}

/// `<imsss:objectives>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    /// The primary objective, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<Objective>,
    /// Secondary objectives, in document order.
    pub objectives: Vec<Objective>,
}

impl Objectives {
    /// All objectives, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        self.primary.iter().chain(self.objectives.iter())
    }
}

/// `<adlseq:objectives>` (ADL extension).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdlObjectives {
    /// The objectives, in document order.
    pub objectives: Vec<AdlObjective>,
}

/// One ADL objective extension entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdlObjective {
    /// Local objective identifier the extension applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_id: Option<String>,
    /// Extended global mappings, in document order.
    pub map_info: Vec<AdlMapInfo>,
}

/// Extended mapping of an ADL objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdlMapInfo {
    /// Identifier of the global objective.
    pub target_objective_id: String,
    /// Read the raw score (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_raw_score: Option<bool>,
    /// Write the raw score (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_raw_score: Option<bool>,
    /// Read the min score (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_min_score: Option<bool>,
    /// Write the min score (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_min_score: Option<bool>,
    /// Read the max score (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_max_score: Option<bool>,
    /// Write the max score (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_max_score: Option<bool>,
    /// Read the completion status (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_completion_status: Option<bool>,
    /// Write the completion status (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_completion_status: Option<bool>,
    /// Read the progress measure (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_progress_measure: Option<bool>,
    /// Write the progress measure (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_progress_measure: Option<bool>,
}

/// `<imsss:randomizationControls>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomizationControls {
    /// When randomization happens (schema default `never`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomization_timing: Option<RandomizationTiming>,
    /// How many children to select.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_count: Option<u32>,
    /// Whether to reorder children (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_children: Option<bool>,
    /// When selection happens (schema default `never`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_timing: Option<RandomizationTiming>,
}

/// `<imsss:deliveryControls>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryControls {
    /// Whether the activity is tracked (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracked: Option<bool>,
    /// Whether content sets completion (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_set_by_content: Option<bool>,
    /// Whether content sets the objective (schema default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_set_by_content: Option<bool>,
}

impl DeliveryControls {
    /// `true` when every attribute is absent or equals its schema default.
    #[must_use]
    pub fn is_schema_default(&self) -> bool {
        self.tracked.unwrap_or(true)
            && !self.completion_set_by_content.unwrap_or(false)
            && !self.objective_set_by_content.unwrap_or(false)
    }
}

/// `<adlseq:rollupConsiderations>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupConsiderations {
    /// Requirement for satisfied rollup (schema default `always`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_for_satisfied: Option<RollupConsiderationType>,
    /// Requirement for not-satisfied rollup (schema default `always`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_for_not_satisfied: Option<RollupConsiderationType>,
    /// Requirement for completed rollup (schema default `always`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_for_completed: Option<RollupConsiderationType>,
    /// Requirement for incomplete rollup (schema default `always`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_for_incomplete: Option<RollupConsiderationType>,
    /// Whether measures satisfy while active (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_satisfaction_if_active: Option<bool>,
}

/// `<adlseq:constrainChoiceConsiderations>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstrainChoiceConsiderations {
    /// Whether activation outside flow is prevented (schema default
    /// `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevent_activation: Option<bool>,
    /// Whether choice is constrained to the flow order (schema default
    /// `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constrain_choice: Option<bool>,
}

/// One `<imsss:sequencing>` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequencing {
    /// `ID` attribute, used inside a sequencing collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `IDRef` attribute pointing into the sequencing collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_ref: Option<String>,
    /// Control mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_mode: Option<ControlMode>,
    /// Sequencing rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequencing_rules: Option<SequencingRules>,
    /// Limit conditions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_conditions: Option<LimitConditions>,
    /// Rollup rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup_rules: Option<RollupRules>,
    /// Local objectives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectives: Option<Objectives>,
    /// ADL objective extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adl_objectives: Option<AdlObjectives>,
    /// Randomization controls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomization_controls: Option<RandomizationControls>,
    /// Delivery controls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_controls: Option<DeliveryControls>,
    /// ADL rollup considerations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup_considerations: Option<RollupConsiderations>,
    /// ADL constrained-choice considerations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constrain_choice_considerations: Option<ConstrainChoiceConsiderations>,
}

impl Sequencing {
    /// `true` when the block carries at least one sub-element (the `ID` /
    /// `IDRef` attributes alone do not count).
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.control_mode.is_some()
            || self.sequencing_rules.is_some()
            || self.limit_conditions.is_some()
            || self.rollup_rules.is_some()
            || self.objectives.is_some()
            || self.adl_objectives.is_some()
            || self.randomization_controls.is_some()
            || self.delivery_controls.is_some()
            || self.rollup_considerations.is_some()
            || self.constrain_choice_considerations.is_some()
    }
}

// ── Decoding ────────────────────────────────────────────────────────────

fn warn_if_unknown(
    ctx: &mut ParseContext<'_>,
    file: &str,
    field: &str,
    raw: &str,
    unknown: bool,
) {
    if unknown {
        ctx.warn_unknown_vocabulary(file, field, raw);
    }
}

fn decode_rule_conditions(
    el: &XmlElement,
    file: &str,
    ctx: &mut ParseContext<'_>,
) -> Result<RuleConditions, ParseError> {
    let combination = el.attr("conditioncombination").map(|raw| {
        let parsed = ConditionCombination::parse(raw);
        warn_if_unknown(ctx, file, "conditionCombination", raw, parsed.is_unknown());
        parsed
    });
    let mut conditions = Vec::new();
    for cond_el in el.children_named("rulecondition") {
        let raw = cond_el.attr("condition").unwrap_or_default();
        let condition = RuleConditionType::parse(raw);
        warn_if_unknown(ctx, file, "ruleCondition/condition", raw, condition.is_unknown());
        let operator = cond_el.attr("operator").map(|raw| {
            let parsed = ConditionOperator::parse(raw);
            warn_if_unknown(ctx, file, "ruleCondition/operator", raw, parsed.is_unknown());
            parsed
        });
        conditions.push(RuleCondition {
            condition,
            operator,
            referenced_objective: cond_el.attr("referencedobjective").map(str::to_string),
            measure_threshold: measure_attr(cond_el, "measurethreshold", file)?,
        });
    }
    Ok(RuleConditions {
        combination,
        conditions,
    })
}

fn decode_rules<A>(
    parent: &XmlElement,
    name: &str,
    file: &str,
    ctx: &mut ParseContext<'_>,
    parse_action: impl Fn(&str) -> (A, bool),
) -> Result<Vec<SequencingRule<A>>, ParseError> {
    let mut rules = Vec::new();
    for rule_el in parent.children_named(name) {
        ctx.check_cancelled()?;
        let conditions = match rule_el.child("ruleconditions") {
            Some(c) => decode_rule_conditions(c, file, ctx)?,
            None => RuleConditions {
                combination: None,
                conditions: Vec::new(),
            },
        };
        let raw_action = rule_el
            .child("ruleaction")
            .and_then(|a| a.attr("action"))
            .unwrap_or_default();
        let (action, unknown) = parse_action(raw_action);
        warn_if_unknown(ctx, file, "ruleAction/action", raw_action, unknown);
        rules.push(SequencingRule { conditions, action });
    }
    Ok(rules)
}

fn decode_objective(el: &XmlElement, file: &str) -> Result<Objective, ParseError> {
    let min_normalized_measure = el
        .child("minnormalizedmeasure")
        .map(|m| m.text().to_string())
        .filter(|t| !t.is_empty())
        .map(|t| measure_value(&t, file, "minNormalizedMeasure"))
        .transpose()?;
    let mut map_info = Vec::new();
    for map_el in el.children_named("mapinfo") {
        let target = map_el
            .attr("targetobjectiveid")
            .map(str::to_string)
            .ok_or_else(|| ParseError::SchemaViolation {
                file: file.to_string(),
                field: "mapInfo/targetObjectiveID".to_string(),
                value: String::new(),
                constraint: "is required".to_string(),
            })?;
        map_info.push(MapInfo {
            target_objective_id: target,
            read_satisfied_status: bool_attr(map_el, "readsatisfiedstatus"),
            write_satisfied_status: bool_attr(map_el, "writesatisfiedstatus"),
            read_normalized_measure: bool_attr(map_el, "readnormalizedmeasure"),
            write_normalized_measure: bool_attr(map_el, "writenormalizedmeasure"),
        });
    }
    Ok(Objective {
        objective_id: el.attr("objectiveid").map(str::to_string),
        satisfied_by_measure: bool_attr(el, "satisfiedbymeasure"),
        min_normalized_measure,
        map_info,
    })
}

fn decode_adl_map_info(el: &XmlElement, file: &str) -> Result<AdlMapInfo, ParseError> {
    let target = el
        .attr("targetobjectiveid")
        .map(str::to_string)
        .ok_or_else(|| ParseError::SchemaViolation {
            file: file.to_string(),
            field: "adlseq mapInfo/targetObjectiveID".to_string(),
            value: String::new(),
            constraint: "is required".to_string(),
        })?;
    Ok(AdlMapInfo {
        target_objective_id: target,
        read_raw_score: bool_attr(el, "readrawscore"),
        write_raw_score: bool_attr(el, "writerawscore"),
        read_min_score: bool_attr(el, "readminscore"),
        write_min_score: bool_attr(el, "writeminscore"),
        read_max_score: bool_attr(el, "readmaxscore"),
        write_max_score: bool_attr(el, "writemaxscore"),
        read_completion_status: bool_attr(el, "readcompletionstatus"),
        write_completion_status: bool_attr(el, "writecompletionstatus"),
        read_progress_measure: bool_attr(el, "readprogressmeasure"),
        write_progress_measure: bool_attr(el, "writeprogressmeasure"),
    })
}

fn duration_attr(
    el: &XmlElement,
    name: &str,
    file: &str,
) -> Result<Option<ScormDuration>, ParseError> {
    el.attr(name)
        .map(|raw| {
            raw.parse()
                .map_err(|e: cartridge_core::scalar::ScalarError| ParseError::SchemaViolation {
                    file: file.to_string(),
                    field: name.to_string(),
                    value: e.value,
                    constraint: e.constraint,
                })
        })
        .transpose()
}

/// Decode one `<imsss:sequencing>` element.
///
/// # Errors
///
/// Returns [`ParseError::SchemaViolation`] for out-of-range measures and
/// missing required identifiers; unknown vocabulary is recorded as a
/// warning instead.
pub fn decode_sequencing(
    el: &XmlElement,
    file: &str,
    ctx: &mut ParseContext<'_>,
) -> Result<Sequencing, ParseError> {
    let control_mode = el.child("controlmode").map(|cm| ControlMode {
        choice: bool_attr(cm, "choice"),
        choice_exit: bool_attr(cm, "choiceexit"),
        flow: bool_attr(cm, "flow"),
        forward_only: bool_attr(cm, "forwardonly"),
        use_current_attempt_objective_info: bool_attr(cm, "usecurrentattemptobjectiveinfo"),
        use_current_attempt_progress_info: bool_attr(cm, "usecurrentattemptprogressinfo"),
    });

    let sequencing_rules = match el.child("sequencingrules") {
        Some(rules_el) => Some(SequencingRules {
            pre_condition_rules: decode_rules(rules_el, "preconditionrule", file, ctx, |raw| {
                let parsed = PreConditionAction::parse(raw);
                let unknown = parsed.is_unknown();
                (parsed, unknown)
            })?,
            exit_condition_rules: decode_rules(rules_el, "exitconditionrule", file, ctx, |raw| {
                let parsed = ExitConditionAction::parse(raw);
                let unknown = parsed.is_unknown();
                (parsed, unknown)
            })?,
            post_condition_rules: decode_rules(rules_el, "postconditionrule", file, ctx, |raw| {
                let parsed = PostConditionAction::parse(raw);
                let unknown = parsed.is_unknown();
                (parsed, unknown)
            })?,
        }),
        None => None,
    };

    let limit_conditions = match el.child("limitconditions") {
        Some(lc) => Some(LimitConditions {
            attempt_limit: u32_attr(lc, "attemptlimit"),
            attempt_absolute_duration_limit: duration_attr(
                lc,
                "attemptabsolutedurationlimit",
                file,
            )?,
            activity_absolute_duration_limit: duration_attr(
                lc,
                "activityabsolutedurationlimit",
                file,
            )?,
        }),
        None => None,
    };

    let rollup_rules = match el.child("rolluprules") {
        Some(rr) => {
            let mut rules = Vec::new();
            for rule_el in rr.children_named("rolluprule") {
                ctx.check_cancelled()?;
                let child_activity_set = rule_el.attr("childactivityset").map(|raw| {
                    let parsed = ChildActivitySet::parse(raw);
                    warn_if_unknown(ctx, file, "childActivitySet", raw, parsed.is_unknown());
                    parsed
                });
                let conditions = match rule_el.child("rollupconditions") {
                    Some(rc) => {
                        let combination = rc.attr("conditioncombination").map(|raw| {
                            let parsed = ConditionCombination::parse(raw);
                            warn_if_unknown(
                                ctx,
                                file,
                                "conditionCombination",
                                raw,
                                parsed.is_unknown(),
                            );
                            parsed
                        });
                        let mut conditions = Vec::new();
                        for cond_el in rc.children_named("rollupcondition") {
                            let raw = cond_el.attr("condition").unwrap_or_default();
                            let condition = RollupConditionType::parse(raw);
                            warn_if_unknown(
                                ctx,
                                file,
                                "rollupCondition/condition",
                                raw,
                                condition.is_unknown(),
                            );
                            let operator = cond_el.attr("operator").map(|raw| {
                                let parsed = ConditionOperator::parse(raw);
                                warn_if_unknown(
                                    ctx,
                                    file,
                                    "rollupCondition/operator",
                                    raw,
                                    parsed.is_unknown(),
                                );
                                parsed
                            });
                            conditions.push(RollupCondition {
                                condition,
                                operator,
                            });
                        }
                        RuleConditions2 {
                            combination,
                            conditions,
                        }
                    }
                    None => RuleConditions2::default(),
                };
                let raw_action = rule_el
                    .child("rollupaction")
                    .and_then(|a| a.attr("action"))
                    .unwrap_or_default();
                let action = RollupActionType::parse(raw_action);
                warn_if_unknown(ctx, file, "rollupAction/action", raw_action, action.is_unknown());
                rules.push(RollupRule {
                    child_activity_set,
                    minimum_count: u32_attr(rule_el, "minimumcount"),
                    minimum_percent: percent_attr(rule_el, "minimumpercent", file)?,
                    conditions,
                    action,
                });
            }
            Some(RollupRules {
                rollup_objective_satisfied: bool_attr(rr, "rollupobjectivesatisfied"),
                rollup_progress_completion: bool_attr(rr, "rollupprogresscompletion"),
                objective_measure_weight: percent_attr(rr, "objectivemeasureweight", file)?,
                rules,
            })
        }
        None => None,
    };

    // imsss:objectives and adlseq:objectives share a local name; the
    // namespace tells them apart.
    let mut objectives = None;
    let mut adl_objectives = None;
    for obj_el in el.children_named("objectives") {
        if obj_el.namespace.as_deref() == Some(ADLSEQ_NAMESPACE) {
            let mut entries = Vec::new();
            for o in obj_el.children_named("objective") {
                let mut map_info = Vec::new();
                for m in o.children_named("mapinfo") {
                    map_info.push(decode_adl_map_info(m, file)?);
                }
                entries.push(AdlObjective {
                    objective_id: o.attr("objectiveid").map(str::to_string),
                    map_info,
                });
            }
            adl_objectives = Some(AdlObjectives {
                objectives: entries,
            });
        } else if objectives.is_none() {
            let primary = obj_el
                .child("primaryobjective")
                .map(|p| decode_objective(p, file))
                .transpose()?;
            let mut secondary = Vec::new();
            for o in obj_el.children_named("objective") {
                secondary.push(decode_objective(o, file)?);
            }
            objectives = Some(Objectives {
                primary,
                objectives: secondary,
            });
        }
    }

    let randomization_controls = el.child("randomizationcontrols").map(|rc| {
        RandomizationControls {
            randomization_timing: rc.attr("randomizationtiming").map(|raw| {
                let parsed = RandomizationTiming::parse(raw);
                warn_if_unknown(ctx, file, "randomizationTiming", raw, parsed.is_unknown());
                parsed
            }),
            select_count: u32_attr(rc, "selectcount"),
            reorder_children: bool_attr(rc, "reorderchildren"),
            selection_timing: rc.attr("selectiontiming").map(|raw| {
                let parsed = RandomizationTiming::parse(raw);
                warn_if_unknown(ctx, file, "selectionTiming", raw, parsed.is_unknown());
                parsed
            }),
        }
    });

    let delivery_controls = el.child("deliverycontrols").map(|dc| DeliveryControls {
        tracked: bool_attr(dc, "tracked"),
        completion_set_by_content: bool_attr(dc, "completionsetbycontent"),
        objective_set_by_content: bool_attr(dc, "objectivesetbycontent"),
    });

    let rollup_considerations = el.child("rollupconsiderations").map(|rc| {
        let consideration = |name: &str, ctx: &mut ParseContext<'_>| {
            rc.attr(name).map(|raw| {
                let parsed = RollupConsiderationType::parse(raw);
                warn_if_unknown(ctx, file, name, raw, parsed.is_unknown());
                parsed
            })
        };
        RollupConsiderations {
            required_for_satisfied: consideration("requiredforsatisfied", ctx),
            required_for_not_satisfied: consideration("requiredfornotsatisfied", ctx),
            required_for_completed: consideration("requiredforcompleted", ctx),
            required_for_incomplete: consideration("requiredforincomplete", ctx),
            measure_satisfaction_if_active: bool_attr(rc, "measuresatisfactionifactive"),
        }
    });

    let constrain_choice_considerations =
        el.child("constrainchoiceconsiderations")
            .map(|cc| ConstrainChoiceConsiderations {
                prevent_activation: bool_attr(cc, "preventactivation"),
                constrain_choice: bool_attr(cc, "constrainchoice"),
            });

    Ok(Sequencing {
        id: el.attr("id").map(str::to_string),
        id_ref: el.attr("idref").map(str::to_string),
        control_mode,
        sequencing_rules,
        limit_conditions,
        rollup_rules,
        objectives,
        adl_objectives,
        randomization_controls,
        delivery_controls,
        rollup_considerations,
        constrain_choice_considerations,
    })
}
