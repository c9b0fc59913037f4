//! Voice identifier validation for the speech synthesis catalog.

/// The closed set of prebuilt voice names the speech service accepts.
pub const SUPPORTED_VOICES: [&str; 30] = [
    "achernar", "achird", "algenib", "algieba", "alnilam",
    "aoede", "autonoe", "callirrhoe", "charon", "despina",
    "enceladus", "erinome", "fenrir", "gacrux", "iapetus",
    "kore", "laomedeia", "leda", "orus", "puck",
    "pulcherrima", "rasalgethi", "sadachbia", "sadaltager",
    "schedar", "sulafat", "umbriel", "vindemiatrix",
    "zephyr", "zubenelgenubi",
];

/// Safe default used when the generator suggests a voice outside the catalog.
pub const FALLBACK_VOICE: &str = "charon";

/// Resolve a model-suggested voice name to a member of the supported set.
///
/// The generator is instructed to pick from the catalog but may still
/// hallucinate a name. Input is trimmed and lower-cased before lookup;
/// anything not in the set, including the empty string, resolves to
/// [`FALLBACK_VOICE`]. Total over all inputs, never fails.
pub fn sanitize_voice_name(name: &str) -> String {
    let normalized = name.trim().to_lowercase();
    if SUPPORTED_VOICES.contains(&normalized.as_str()) {
        normalized
    } else {
        FALLBACK_VOICE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_voice_passes_through() {
        for voice in SUPPORTED_VOICES {
            assert_eq!(sanitize_voice_name(voice), voice);
            // Case and surrounding whitespace must not matter
            let padded = format!("  {} ", voice.to_uppercase());
            assert_eq!(sanitize_voice_name(&padded), voice);
        }
    }

    #[test]
    fn mixed_case_with_trailing_space() {
        assert_eq!(sanitize_voice_name("Charon "), "charon");
    }

    #[test]
    fn unknown_voice_falls_back() {
        assert_eq!(sanitize_voice_name("nonexistentvoice"), FALLBACK_VOICE);
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(sanitize_voice_name(""), FALLBACK_VOICE);
        assert_eq!(sanitize_voice_name("   "), FALLBACK_VOICE);
    }

    #[test]
    fn fallback_is_a_member_of_the_set() {
        assert!(SUPPORTED_VOICES.contains(&FALLBACK_VOICE));
    }
}
