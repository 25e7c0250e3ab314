//! Interactivity sequencing: pick the archetype for one scene.
//!
//! Stateless. The only history is the caller's list of preceding choices,
//! which the caller extends with each winner before the next call. Keep one
//! list per generation request; sharing it across requests would make one
//! storyboard's choices penalize another's.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::catalog::{catalog, InteractivityArchetype};
use crate::core::checksum::fields_hash;
use crate::schema::pedagogy::{CognitiveLevel, InstructionalPurpose, LoadTier, MODULE_LEVELS};

/// Runner-ups reported alongside the winner.
const MAX_ALTERNATIVES: usize = 3;

/// Combined scores are rounded to this many steps per unit before ranking,
/// so sums that are equal on paper compare equal after float rounding.
const SCORE_STEPS: f64 = 1e9;

/// Signals within this margin of the strongest contribution are also named
/// as dominant in the justification.
const DOMINANCE_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("module level {0} outside 1..=4")]
    InvalidModuleLevel(u8),
    #[error("scene {scene}: no archetype supports {level:?} at module level {module_level}")]
    NoCompatibleArchetype {
        scene: u32,
        level: CognitiveLevel,
        module_level: u8,
    },
}

/// Weight of each signal in the combined score. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub purpose: f64,
    pub load: f64,
    pub novelty: f64,
    pub module_level: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            purpose: 0.35,
            load: 0.25,
            novelty: 0.25,
            module_level: 0.15,
        }
    }
}

impl SignalWeights {
    pub fn sum(&self) -> f64 {
        self.purpose + self.load + self.novelty + self.module_level
    }

    fn combine(&self, signals: &SignalScores) -> f64 {
        self.purpose * signals.purpose
            + self.load * signals.load
            + self.novelty * signals.novelty
            + self.module_level * signals.module_level
    }

    fn contributions(&self, signals: &SignalScores) -> [(Signal, f64); 4] {
        [
            (Signal::Purpose, self.purpose * signals.purpose),
            (Signal::Load, self.load * signals.load),
            (Signal::Novelty, self.novelty * signals.novelty),
            (Signal::ModuleLevel, self.module_level * signals.module_level),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub weights: SignalWeights,
    /// How many of the most recent choices count against novelty.
    pub novelty_lookback: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            novelty_lookback: 3,
        }
    }
}

/// Pedagogical metadata for one scene plus the request's choice history.
#[derive(Debug, Clone, Copy)]
pub struct SceneMeta<'a> {
    pub ordinal: u32,
    pub cognitive_level: CognitiveLevel,
    pub instructional_purpose: InstructionalPurpose,
    pub module_level: u8,
    /// Archetype ids chosen for earlier scenes, most recent last.
    pub preceding_choices: &'a [String],
    pub cognitive_load_hint: Option<LoadTier>,
}

/// The four normalized signals, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub purpose: f64,
    pub load: f64,
    pub novelty: f64,
    pub module_level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Purpose,
    Load,
    Novelty,
    ModuleLevel,
}

impl Signal {
    fn label(&self) -> &'static str {
        match self {
            Self::Purpose => "purpose fit",
            Self::Load => "cognitive-load fit",
            Self::Novelty => "novelty",
            Self::ModuleLevel => "module-level affinity",
        }
    }

    fn value(&self, signals: &SignalScores) -> f64 {
        match self {
            Self::Purpose => signals.purpose,
            Self::Load => signals.load,
            Self::Novelty => signals.novelty,
            Self::ModuleLevel => signals.module_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlternative {
    pub archetype_id: String,
    pub score: f64,
    pub signals: SignalScores,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencingDecision {
    pub scene: u32,
    pub archetype_id: String,
    pub score: f64,
    pub signals: SignalScores,
    pub justification: String,
    /// Up to three runner-ups, best first.
    pub alternatives: Vec<RankedAlternative>,
    pub checksum: String,
}

struct Scored<'c> {
    index: usize,
    archetype: &'c InteractivityArchetype,
    signals: SignalScores,
    score: f64,
}

/// Choose an interactivity for a scene from the built-in catalog.
pub fn select_interactivity_for_scene(
    meta: &SceneMeta<'_>,
    config: &SequencerConfig,
) -> Result<SequencingDecision, SequencerError> {
    select_from(catalog(), meta, config)
}

/// Choose an interactivity for a scene from `entries`.
///
/// Archetypes incompatible with the scene's cognitive level or module level
/// are dropped before scoring. The rest are ranked by combined score, ties
/// going to the entry declared first.
pub fn select_from(
    entries: &[InteractivityArchetype],
    meta: &SceneMeta<'_>,
    config: &SequencerConfig,
) -> Result<SequencingDecision, SequencerError> {
    if !MODULE_LEVELS.contains(&meta.module_level) {
        return Err(SequencerError::InvalidModuleLevel(meta.module_level));
    }

    let weights = &config.weights;
    let mut ranked: Vec<Scored<'_>> = entries
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_compatible(meta.cognitive_level, meta.module_level))
        .map(|(index, archetype)| {
            let signals = score_signals(archetype, meta, config.novelty_lookback);
            Scored {
                index,
                archetype,
                signals,
                score: quantize(weights.combine(&signals)),
            }
        })
        .collect();

    if ranked.is_empty() {
        return Err(SequencerError::NoCompatibleArchetype {
            scene: meta.ordinal,
            level: meta.cognitive_level,
            module_level: meta.module_level,
        });
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));

    let winner = &ranked[0];
    let alternatives: Vec<RankedAlternative> = ranked[1..]
        .iter()
        .take(MAX_ALTERNATIVES)
        .map(|alt| RankedAlternative {
            archetype_id: alt.archetype.id.to_string(),
            score: alt.score,
            signals: alt.signals,
            rationale: runner_up_rationale(winner, alt, weights),
        })
        .collect();

    let score_text = format!("{:.6}", winner.score);
    let ordinal = meta.ordinal.to_string();
    let module_level = meta.module_level.to_string();
    let hint = meta.cognitive_load_hint.map_or("none", |t| t.name());
    let mut fields = vec![
        ordinal.as_str(),
        meta.cognitive_level.name(),
        meta.instructional_purpose.name(),
        module_level.as_str(),
        hint,
    ];
    fields.extend(meta.preceding_choices.iter().map(String::as_str));
    fields.push(winner.archetype.id);
    fields.push(score_text.as_str());
    let checksum = fields_hash(fields);

    tracing::debug!(
        scene = meta.ordinal,
        archetype = winner.archetype.id,
        score = winner.score,
        candidates = ranked.len(),
        "selected interactivity"
    );

    Ok(SequencingDecision {
        scene: meta.ordinal,
        archetype_id: winner.archetype.id.to_string(),
        score: winner.score,
        signals: winner.signals,
        justification: justify(winner, weights),
        alternatives,
        checksum,
    })
}

fn quantize(score: f64) -> f64 {
    (score * SCORE_STEPS).round() / SCORE_STEPS
}

/// Compute the four signals for one archetype. Exposed for inspection and
/// tests; [`select_from`] uses the same function.
pub fn score_signals(
    archetype: &InteractivityArchetype,
    meta: &SceneMeta<'_>,
    novelty_lookback: usize,
) -> SignalScores {
    SignalScores {
        purpose: purpose_fit(archetype, meta.instructional_purpose),
        load: load_fit(archetype.load_tier, meta.cognitive_load_hint, meta.module_level),
        novelty: novelty(archetype.id, meta.preceding_choices, novelty_lookback),
        module_level: module_level_affinity(archetype, meta.module_level),
    }
}

/// Full credit for a declared purpose, half for a purpose in the same
/// family, nothing otherwise.
fn purpose_fit(archetype: &InteractivityArchetype, purpose: InstructionalPurpose) -> f64 {
    if archetype.purposes.contains(&purpose) {
        1.0
    } else if archetype
        .purposes
        .iter()
        .any(|p| p.family() == purpose.family())
    {
        0.5
    } else {
        0.0
    }
}

/// Inverse distance between the archetype's tier and the tier implied by
/// the hint and the module level together.
fn load_fit(tier: LoadTier, hint: Option<LoadTier>, module_level: u8) -> f64 {
    let implied = f64::from(LoadTier::for_module_level(module_level).index());
    let target = match hint {
        Some(hint) => (f64::from(hint.index()) + implied) / 2.0,
        None => implied,
    };
    1.0 - (f64::from(tier.index()) - target).abs() / 2.0
}

/// 1.0 when the archetype is absent from the lookback window. Each
/// occurrence subtracts a penalty that decays linearly with age: the most
/// recent slot costs 1, the oldest slot in the window `1 / lookback`.
fn novelty(id: &str, history: &[String], lookback: usize) -> f64 {
    if lookback == 0 {
        return 1.0;
    }
    let window = lookback as f64;
    let penalty: f64 = history
        .iter()
        .rev()
        .take(lookback)
        .enumerate()
        .filter(|(_, choice)| choice.as_str() == id)
        .map(|(age, _)| (window - age as f64) / window)
        .sum();
    (1.0 - penalty).max(0.0)
}

/// Full credit in the central half of the archetype's module-level range,
/// falling to 0.5 at its edges.
fn module_level_affinity(archetype: &InteractivityArchetype, module_level: u8) -> f64 {
    let low = f64::from(*archetype.module_levels.start());
    let high = f64::from(*archetype.module_levels.end());
    let half_span = (high - low) / 2.0;
    if half_span <= 0.0 {
        return 1.0;
    }
    let center = low + half_span;
    let distance = ((f64::from(module_level) - center).abs() / half_span).min(1.0);
    if distance <= 0.5 {
        1.0
    } else {
        1.5 - distance
    }
}

fn justify(winner: &Scored<'_>, weights: &SignalWeights) -> String {
    let contributions = weights.contributions(&winner.signals);
    let strongest = contributions
        .iter()
        .map(|(_, c)| *c)
        .fold(f64::MIN, f64::max);
    let dominant: Vec<&str> = contributions
        .iter()
        .filter(|(_, c)| *c > 0.0 && strongest - *c <= DOMINANCE_MARGIN)
        .map(|(signal, _)| signal.label())
        .collect();
    if dominant.is_empty() {
        format!(
            "{} chosen as the first compatible entry; no signal favours it",
            winner.archetype.id
        )
    } else {
        format!(
            "{} chosen for {} (score {:.2})",
            winner.archetype.id,
            dominant.join(" and "),
            winner.score
        )
    }
}

fn runner_up_rationale(winner: &Scored<'_>, alt: &Scored<'_>, weights: &SignalWeights) -> String {
    if alt.score.total_cmp(&winner.score).is_eq() {
        return format!(
            "ties at {:.2}; listed after {} in the catalog",
            alt.score, winner.archetype.id
        );
    }
    let winner_parts = weights.contributions(&winner.signals);
    let alt_parts = weights.contributions(&alt.signals);
    let weakest = winner_parts
        .iter()
        .zip(alt_parts.iter())
        .map(|((signal, w), (_, a))| (*signal, w - a))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    match weakest {
        Some((signal, gap)) if gap > 0.0 => format!(
            "scored {:.2}; trails {} on {} ({:.2} vs {:.2})",
            alt.score,
            winner.archetype.id,
            signal.label(),
            signal.value(&alt.signals),
            signal.value(&winner.signals)
        ),
        _ => format!("scored {:.2}", alt.score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::find_archetype;

    fn meta<'a>(history: &'a [String]) -> SceneMeta<'a> {
        SceneMeta {
            ordinal: 4,
            cognitive_level: CognitiveLevel::Apply,
            instructional_purpose: InstructionalPurpose::Practice,
            module_level: 3,
            preceding_choices: history,
            cognitive_load_hint: None,
        }
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_a_compatible_archetype() {
        let decision = select_interactivity_for_scene(&meta(&[]), &SequencerConfig::default())
            .unwrap();
        let chosen = find_archetype(&decision.archetype_id).unwrap();
        assert!(chosen.is_compatible(CognitiveLevel::Apply, 3));
        assert!(decision.alternatives.len() <= MAX_ALTERNATIVES);
        assert!(!decision.justification.is_empty());
        assert_eq!(decision.checksum.len(), 64);
    }

    #[test]
    fn alternatives_are_ranked_and_exclude_winner() {
        let decision = select_interactivity_for_scene(&meta(&[]), &SequencerConfig::default())
            .unwrap();
        let mut previous = decision.score;
        for alt in &decision.alternatives {
            assert_ne!(alt.archetype_id, decision.archetype_id);
            assert!(alt.score <= previous);
            assert!(!alt.rationale.is_empty());
            previous = alt.score;
        }
    }

    #[test]
    fn incompatible_archetypes_are_never_candidates() {
        let m = SceneMeta {
            cognitive_level: CognitiveLevel::Remember,
            module_level: 1,
            ..meta(&[])
        };
        let decision = select_interactivity_for_scene(&m, &SequencerConfig::default()).unwrap();
        let all: Vec<&str> = std::iter::once(decision.archetype_id.as_str())
            .chain(decision.alternatives.iter().map(|a| a.archetype_id.as_str()))
            .collect();
        for id in all {
            assert!(find_archetype(id).unwrap().is_compatible(CognitiveLevel::Remember, 1));
        }
    }

    #[test]
    fn rejects_invalid_module_level() {
        let m = SceneMeta {
            module_level: 5,
            ..meta(&[])
        };
        assert_eq!(
            select_interactivity_for_scene(&m, &SequencerConfig::default()),
            Err(SequencerError::InvalidModuleLevel(5))
        );
    }

    #[test]
    fn no_compatible_archetype() {
        let only: Vec<InteractivityArchetype> = vec![find_archetype("flashcards").unwrap().clone()];
        let result = select_from(&only, &meta(&[]), &SequencerConfig::default());
        assert!(matches!(
            result,
            Err(SequencerError::NoCompatibleArchetype { scene: 4, .. })
        ));
    }

    #[test]
    fn ties_go_to_declaration_order() {
        let base = find_archetype("drag_and_drop").unwrap().clone();
        let first = InteractivityArchetype {
            id: "first_twin",
            ..base.clone()
        };
        let second = InteractivityArchetype {
            id: "second_twin",
            ..base
        };

        let forward = select_from(
            &[first.clone(), second.clone()],
            &meta(&[]),
            &SequencerConfig::default(),
        )
        .unwrap();
        assert_eq!(forward.archetype_id, "first_twin");
        assert!(forward.alternatives[0].rationale.contains("ties"));

        let reversed = select_from(&[second, first], &meta(&[]), &SequencerConfig::default())
            .unwrap();
        assert_eq!(reversed.archetype_id, "second_twin");
    }

    #[test]
    fn float_rounding_does_not_break_catalog_order() {
        // 0.35 * 0.5 + 0.25 * 0.5 + 0.15 * 1.0 sums to just under 0.45 in
        // f64, while the later entries sum to exactly 0.45.
        let history = ids(&["reflection_prompt"]);
        let scene = SceneMeta {
            ordinal: 6,
            cognitive_level: CognitiveLevel::Evaluate,
            instructional_purpose: InstructionalPurpose::Introduce,
            module_level: 3,
            preceding_choices: &history,
            cognitive_load_hint: None,
        };
        let decision = select_interactivity_for_scene(&scene, &SequencerConfig::default())
            .unwrap();

        assert_eq!(decision.archetype_id, "reflection_prompt");
        assert_eq!(decision.score, 0.45);
        let runner_ups: Vec<&str> = decision
            .alternatives
            .iter()
            .map(|a| a.archetype_id.as_str())
            .collect();
        assert_eq!(runner_ups, vec!["case_study_analysis", "branching_scenario"]);
        for alt in &decision.alternatives {
            assert_eq!(alt.score, decision.score);
            assert!(alt.rationale.starts_with("ties at 0.45"), "{}", alt.rationale);
        }
    }

    #[test]
    fn repeating_the_last_choice_is_discouraged() {
        let config = SequencerConfig::default();
        let fresh = select_interactivity_for_scene(&meta(&[]), &config).unwrap();
        let history = vec![fresh.archetype_id.clone()];
        let next = select_interactivity_for_scene(&meta(&history), &config).unwrap();
        assert_ne!(next.archetype_id, fresh.archetype_id);
    }

    #[test]
    fn novelty_decays_with_age() {
        let h = ids(&["simulation", "quiz", "tabs"]);
        let oldest = novelty("simulation", &h, 3);
        let h = ids(&["quiz", "simulation", "tabs"]);
        let middle = novelty("simulation", &h, 3);
        let h = ids(&["quiz", "tabs", "simulation"]);
        let newest = novelty("simulation", &h, 3);
        assert!(oldest > middle && middle > newest);
        assert_eq!(novelty("simulation", &[], 3), 1.0);
        assert_eq!(newest, 0.0);
    }

    #[test]
    fn novelty_ignores_choices_outside_window() {
        let h = ids(&["simulation", "a", "b", "c"]);
        assert_eq!(novelty("simulation", &h, 3), 1.0);
    }

    #[test]
    fn repeated_use_accumulates() {
        let once = novelty("x", &ids(&["x", "a", "b"]), 3);
        let twice = novelty("x", &ids(&["x", "x", "b"]), 3);
        assert!(twice < once);
    }

    #[test]
    fn load_fit_prefers_closer_tiers() {
        assert_eq!(load_fit(LoadTier::Medium, None, 3), 1.0);
        assert_eq!(load_fit(LoadTier::High, None, 3), 0.5);
        assert_eq!(load_fit(LoadTier::High, Some(LoadTier::High), 4), 1.0);
        assert_eq!(load_fit(LoadTier::Low, Some(LoadTier::High), 4), 0.0);
        assert_eq!(load_fit(LoadTier::High, Some(LoadTier::Low), 4), 0.5);
    }

    #[test]
    fn module_level_affinity_center_and_edges() {
        let wide = find_archetype("multiple_choice_quiz").unwrap(); // 1..=4
        assert_eq!(module_level_affinity(wide, 2), 1.0);
        assert_eq!(module_level_affinity(wide, 3), 1.0);
        assert_eq!(module_level_affinity(wide, 1), 0.5);
        assert_eq!(module_level_affinity(wide, 4), 0.5);

        let narrow = find_archetype("simulation").unwrap(); // 3..=4
        assert_eq!(module_level_affinity(narrow, 3), 0.5);
    }

    #[test]
    fn purpose_fit_levels() {
        let quiz = find_archetype("multiple_choice_quiz").unwrap();
        assert_eq!(purpose_fit(quiz, InstructionalPurpose::Assess), 1.0);
        assert_eq!(purpose_fit(quiz, InstructionalPurpose::Reflect), 0.5);
        assert_eq!(purpose_fit(quiz, InstructionalPurpose::Introduce), 0.0);
    }

    #[test]
    fn weights_steer_the_choice() {
        let purpose_only = SequencerConfig {
            weights: SignalWeights {
                purpose: 1.0,
                load: 0.0,
                novelty: 0.0,
                module_level: 0.0,
            },
            novelty_lookback: 3,
        };
        let m = SceneMeta {
            instructional_purpose: InstructionalPurpose::Assess,
            ..meta(&[])
        };
        let decision = select_interactivity_for_scene(&m, &purpose_only).unwrap();
        let chosen = find_archetype(&decision.archetype_id).unwrap();
        assert!(chosen.purposes.contains(&InstructionalPurpose::Assess));
        assert!(decision.justification.contains("purpose fit"));
    }

    #[test]
    fn checksum_tracks_history() {
        let config = SequencerConfig::default();
        let a = select_interactivity_for_scene(&meta(&[]), &config).unwrap();
        let history = ids(&["reflection_prompt"]);
        let b = select_interactivity_for_scene(&meta(&history), &config).unwrap();
        assert_ne!(a.checksum, b.checksum);
    }
}
