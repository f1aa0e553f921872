//! Prompt templates for every inference call a run makes.

use crate::{
    DestinationPhase, EmbodimentRequirements, GenerationConfig, NarrationLanguage, UniqueElements,
};
use somnia_core::{BeatPlan, OutlineBeat, SensoryMode, StoryBible, ThemeAnalysis};
use typed_builder::TypedBuilder;

/// Second prompt for theme analysis after an unusable answer.
pub const THEME_REPAIR_PROMPT: &str =
    "Output valid JSON with: setting, time_of_day, mood, sensory_elements, key_objects, atmosphere";

/// Second prompt for outline generation after an unusable answer.
pub const OUTLINE_REPAIR_PROMPT: &str =
    "Generate valid JSON outline with story_bible and acts array";

/// Brief used when the spatial coach call fails.
pub const FALLBACK_SPATIAL_BRIEF: &str = "Maintain 2nd person movement, consequent perceptions, a spatial transition, and if arriving, settle and invite rest.";

/// Prompt asking for a JSON theme analysis.
pub fn theme_analysis_prompt(
    theme: &str,
    description: Option<&str>,
    embodiment: &EmbodimentRequirements,
) -> String {
    let pov = if embodiment.pov_enforce_second_person {
        "strict second person"
    } else {
        "flexible"
    };
    format!(
        r#"You are a creative analyst for sleep stories with advanced parameter awareness.

Given theme: {theme}
Additional description: {description}
POV Mode: {pov}
Sensory Coupling Level: {coupling}

Analyze and extract sensory elements optimized for the specified parameters. Output valid JSON only:
{{
  "setting": "detailed location",
  "time_of_day": "dawn/dusk/night",
  "mood": "peaceful",
  "sensory_elements": ["visual", "audio", "tactile", "olfactory"],
  "key_objects": ["list", "of", "objects"],
  "atmosphere": "description emphasizing the {pov} perspective",
  "spatial_waypoints": ["point1", "point2", "point3", "point4", "point5"]
}}
"#,
        theme = theme,
        description = description.unwrap_or("None"),
        pov = pov,
        coupling = embodiment.sensory_coupling,
    )
}

/// Prompt asking for a 3-act JSON outline.
pub fn outline_prompt(
    analysis: &ThemeAnalysis,
    duration_minutes: u32,
    config: &GenerationConfig,
) -> String {
    let theme = serde_json::to_string(analysis).unwrap_or_else(|_| analysis.setting.clone());
    let embodiment = &config.embodiment;
    format!(
        r#"You are a master storyteller for calming sleep narratives with parameter-aware planning.

TASK: Create a 3-act outline for a {duration}-minute sleep story.

THEME: {theme}
TARGET WORDS: {target_words} ({duration} min x {wpm} wpm)
BEATS: {beats} total

GENERATION PARAMETERS:
- POV Enforcement: {pov}
- Embodiment Level: {movement} movement verbs per beat
- Sensory Coupling: {coupling} senses per beat
- Destination Required: {destination}

Write titles and descriptions in {language}.

OUTPUT a valid JSON outline:
{{
  "story_bible": {{
    "setting": "location",
    "time_of_day": "dawn/dusk/night",
    "key_objects": ["object1", "object2"],
    "mood_baseline": 8,
    "spatial_waypoints": ["entry path", "clearing", "destination"]
  }},
  "acts": [
    {{
      "act_number": 1,
      "title": "Departure",
      "beats": [
        {{
          "beat_id": 1,
          "title": "Destination Promise",
          "description": "Establish a clear destination with movement and sensory detail",
          "sensory_focus": ["sight", "sound"],
          "waypoint": "entry path",
          "mood_target": 8
        }}
      ]
    }}
  ]
}}
"#,
        duration = duration_minutes,
        theme = theme,
        target_words = config.target_words_for(duration_minutes),
        wpm = config.target_wpm,
        beats = config.beats,
        pov = embodiment.pov_enforce_second_person,
        movement = embodiment.movement_verbs_required,
        coupling = embodiment.sensory_coupling,
        destination = config.destination.closure_required,
        language = config.language.name(),
    )
}

/// Everything the base prompt of one beat is built from.
#[derive(Debug, TypedBuilder)]
pub struct BeatPrompt<'a> {
    bible: &'a StoryBible,
    previous_text: &'a str,
    beat: &'a OutlineBeat,
    target_words: usize,
    sensory_mode: SensoryMode,
    waypoint: &'a str,
    phase: DestinationPhase,
    destination: &'a str,
    coherence: &'a str,
    unique: &'a UniqueElements,
    #[builder(default)]
    forbidden: &'a [String],
    config: &'a GenerationConfig,
    #[builder(default)]
    tts_markers: bool,
    #[builder(default)]
    strict_schema: bool,
}

impl BeatPrompt<'_> {
    /// Render the base prompt.
    pub fn render(&self) -> String {
        let bible = serde_json::to_string(self.bible).unwrap_or_else(|_| self.bible.setting.clone());
        let previous = if self.previous_text.is_empty() {
            "Start"
        } else {
            self.previous_text
        };
        let description = if self.beat.description.is_empty() {
            "Continue"
        } else {
            self.beat.description.as_str()
        };
        let requirements = &self.config.embodiment;

        let mut prompt = format!(
            r#"PARAMETER-AWARE BEAT GENERATION

CONTEXT:
{bible}

PREVIOUS TEXT (last 500 words):
{previous}

CURRENT BEAT:
Title: {title}
Description: {description}
Target: ~{target} words
Sensory Focus: {sensory}

GENERATION PARAMETERS:
{parameters}

MOVEMENT SCAFFOLD (MANDATORY):
- Waypoint: {waypoint}
- Action: {action}
- Suggested movement: {movement}
- Consequent Perceptions: {perception}
- Suggested perception: {sensory_phrase}
- Spatial Transition: {transition}
- Suggested transition: {transition_phrase}
- Downshift: {downshift}

DESTINATION PHASE: {phase}
- {phase_instructions}

STYLE ENFORCEMENT:
{style}

{language}"#,
            bible = bible,
            previous = previous,
            title = self.beat.title,
            description = description,
            target = self.target_words,
            sensory = self.sensory_mode,
            parameters = format_generation_parameters(
                requirements,
                self.tts_markers,
                self.strict_schema
            ),
            waypoint = self.unique.waypoint_variation,
            action = format_action_style(requirements),
            movement = self.unique.movement,
            perception = format_perception_requirements(requirements),
            sensory_phrase = self.unique.sensory,
            transition = format_transition_requirements(requirements),
            transition_phrase = self.unique.transition,
            downshift = format_downshift_requirements(requirements),
            phase = self.phase,
            phase_instructions = self.phase.instructions(self.destination),
            style = format_style_requirements(requirements, self.tts_markers),
            language = self.config.language.directive(),
        );

        if !self.coherence.is_empty() {
            prompt.push_str("\n\nCONTINUITY:\n");
            prompt.push_str(self.coherence);
        }
        if !self.forbidden.is_empty() {
            prompt.push_str("\n\nDO NOT REUSE: ");
            prompt.push_str(&self.forbidden.join("; "));
        }
        if self.waypoint != self.unique.waypoint_variation && !self.waypoint.is_empty() {
            prompt.push_str(&format!("\n(Waypoint label: {})", self.waypoint));
        }
        prompt.push_str(&format!(
            "\n\nEXACT WORD COUNT: {}. Avoid repeated openers.\n\nGenerate next segment with strict parameter compliance:",
            self.target_words
        ));
        prompt
    }
}

/// Prompt for the reasoner stage.
pub fn reasoner_prompt(
    text: &str,
    plan: &BeatPlan,
    hints: &[String],
    target_words: usize,
    language: NarrationLanguage,
) -> String {
    let hints = if hints.is_empty() {
        "- none".to_string()
    } else {
        hints
            .iter()
            .map(|h| format!("- {}", h))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "You are a reasoning editor. Improve coherence, remove repeated openers, \
         maintain narrative progression, and keep calm pacing.\n\
         {language}\n\n\
         {plan}\n\n\
         CRITIQUE:\n{hints}\n\n\
         TARGET WORDS: {target} (must keep within ±5%).\n\n\
         TEXT:\n{text}\n\n\
         Rewritten text (same content, improved coherence, similar length):",
        language = language.directive(),
        plan = plan.render(),
        hints = hints,
        target = target_words,
        text = text,
    )
}

/// Prompt for the polish stage.
pub fn polisher_prompt(text: &str, target_words: usize, language: NarrationLanguage) -> String {
    format!(
        "Polish the prose for smooth, soothing style and natural rhythm. \
         Keep the same meaning and approximately the same length (±3%, about {target} words). \
         Avoid listy phrasing; prefer flowing sentences.\n\
         {language}\n\n\
         TEXT:\n{text}\n\nPolished text:",
        target = target_words,
        language = language.directive(),
        text = text,
    )
}

/// Prompt for a corrective rewrite of one beat.
pub fn correction_prompt(
    text: &str,
    instructions: &[String],
    target_words: usize,
    language: NarrationLanguage,
) -> String {
    let instructions = instructions
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "EMBODIMENT AND DESTINATION REVISION\n\n\
         REQUIRED CHANGES:\n{instructions}\n\n\
         Rewrite the text to include every required change with minimal edits, \
         preserving meaning and the sleep-inducing tone. Keep second person present tense.\n\
         {language}\n\n\
         TARGET WORDS: {target} (must keep within ±5%).\n\n\
         TEXT:\n{text}\n\nRevised text:",
        instructions = instructions,
        language = language.directive(),
        target = target_words,
        text = text,
    )
}

/// Prompt for the spatial coach micro-brief.
pub fn spatial_coach_prompt(
    text: &str,
    waypoint: &str,
    phase: DestinationPhase,
    language: NarrationLanguage,
) -> String {
    format!(
        "You are a spatial journey coach. Create a 1-2 sentence brief that enforces:\n\
         - second person movement (one movement verb)\n\
         - one consequent perception (corporeal) + one environmental\n\
         - one spatial transition connector coherent with phase ({phase})\n\
         - if phase is arrival: include settling + permission to rest\n\
         {language}\n\n\
         WAYPOINT: {waypoint}\n\
         TEXT:\n{text}\n\n\
         Return ONLY the brief, no preface:",
        phase = phase,
        language = language.directive(),
        waypoint = waypoint,
        text = text,
    )
}

/// Generation parameter lines.
pub fn format_generation_parameters(
    requirements: &EmbodimentRequirements,
    tts_markers: bool,
    strict_schema: bool,
) -> String {
    let mut lines = Vec::new();
    if requirements.pov_enforce_second_person {
        lines.push("POV: Strict second person present tense (you walk, you see, you feel)".to_string());
    } else {
        lines.push("POV: Flexible but prefer second person".to_string());
    }
    if requirements.movement_verbs_required > 0 {
        lines.push(format!(
            "Movement: Minimum {} embodied action verb(s) per beat",
            requirements.movement_verbs_required
        ));
    }
    lines.push(format!(
        "Sensory: Couple {} sensory elements (sight+sound+touch)",
        requirements.sensory_coupling
    ));
    if requirements.transition_tokens_required > 0 {
        lines.push(format!(
            "Transitions: Include {} spatial connector(s)",
            requirements.transition_tokens_required
        ));
    }
    if requirements.downshift_required {
        lines.push("Downshift: Include relaxation cues (breath slows, shoulders ease)".to_string());
    }
    if tts_markers {
        lines.push("TTS: Include [PAUSE:x.x] and [BREATHE] markers".to_string());
    }
    if strict_schema {
        lines.push("Schema: Maintain structured beat format for video production".to_string());
    }
    lines.join("\n")
}

/// Style rules.
pub fn format_style_requirements(requirements: &EmbodimentRequirements, tts_markers: bool) -> String {
    let mut rules = Vec::new();
    if requirements.pov_enforce_second_person {
        rules.push("NEVER use first person (I/me) or third person (he/she/they)");
        rules.push("ALWAYS use second person present: 'You walk', 'You notice', 'You feel'");
    }
    rules.push("NO lists or bullet points");
    rules.push("NO tension, conflict, or stimulating content");
    rules.push("Slow pacing with natural pauses between actions");
    rules.push("Causal sensory descriptions (action → perception)");
    if tts_markers {
        rules.push("Natural breathing spaces marked with [BREATHE]");
        rules.push("Longer pauses marked with [PAUSE:2.0] for contemplation");
    }
    rules.join("\n")
}

/// Movement instruction.
pub fn format_action_style(requirements: &EmbodimentRequirements) -> String {
    let person = if requirements.pov_enforce_second_person {
        "strict 2nd person present"
    } else {
        "preferred 2nd person"
    };
    match requirements.movement_verbs_required {
        0 => "Gentle, minimal movement focus".to_string(),
        1 => format!("One clear movement verb in {}", person),
        n => format!("Include {} distinct movement verbs in {}", n, person),
    }
}

/// Perception instruction.
pub fn format_perception_requirements(requirements: &EmbodimentRequirements) -> String {
    match requirements.sensory_coupling {
        0 | 1 => "minimal sensory focus, emphasis on peaceful flow".to_string(),
        2 => "at least 2 sensory perceptions (one corporeal like feet/hands/breath, one environmental like light/sound/scent)".to_string(),
        n => format!(
            "at least {} sensory perceptions (corporeal + environmental + additional)",
            n
        ),
    }
}

/// Transition instruction.
pub fn format_transition_requirements(requirements: &EmbodimentRequirements) -> String {
    match requirements.transition_tokens_required {
        0 => "smooth narrative flow without forced transitions".to_string(),
        1 => "one spatial transition (beyond, through, toward, etc.)".to_string(),
        n => format!(
            "{} directional connectors (e.g., 'più avanti', 'oltre il', 'raggiungi')",
            n
        ),
    }
}

/// Downshift instruction.
pub fn format_downshift_requirements(requirements: &EmbodimentRequirements) -> &'static str {
    if requirements.downshift_required {
        "explicit relaxation cues (breath slows, shoulders release, pace softens)"
    } else {
        "optional gentle relaxation elements"
    }
}
