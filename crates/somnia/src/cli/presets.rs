//! Presets command handler.

use somnia_narrative::{GenerationConfig, Preset};
use std::io::Write;
use strum::IntoEnumIterator;

/// Lists every preset with its shape and description.
pub fn handle_presets(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Available presets:")?;
    for preset in Preset::iter() {
        let config = GenerationConfig::from(preset);
        writeln!(
            out,
            "  {:<14} {:>2} beats x {:>3} words  {}",
            preset.as_ref(),
            config.beats,
            config.words_per_beat,
            preset.description()
        )?;
    }
    Ok(())
}
