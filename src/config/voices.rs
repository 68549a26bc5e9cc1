//! Kokoro voice table and default voice selection.
//!
//! Kokoro v1.0 ships 53 voices across 9 languages. The table only carries
//! what narration needs: the speaker ID handed to the model and the language
//! used to pick lexicons and the default voice for a book.

use std::fmt;

use anyhow::Result;
use book_narrator::book::CjkScript;

/// Voice name that selects a default by book language.
pub const AUTO_VOICE: &str = "auto";

/// Default voice for books without CJK text.
pub const DEFAULT_VOICE: &str = "af_bella";

/// Default voice for Chinese books.
pub const DEFAULT_CJK_VOICE: &str = "zf_xiaobei";

/// Default voice for Japanese books.
pub const DEFAULT_JA_VOICE: &str = "jf_alpha";

/// Language a Kokoro voice speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    AmericanEnglish,
    BritishEnglish,
    Spanish,
    French,
    Hindi,
    Italian,
    Japanese,
    BrazilianPortuguese,
    Mandarin,
}

impl Language {
    const ALL: [Language; 9] = [
        Language::AmericanEnglish,
        Language::BritishEnglish,
        Language::Spanish,
        Language::French,
        Language::Hindi,
        Language::Italian,
        Language::Japanese,
        Language::BrazilianPortuguese,
        Language::Mandarin,
    ];
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::AmericanEnglish => "American English",
            Language::BritishEnglish => "British English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::Hindi => "Hindi",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
            Language::BrazilianPortuguese => "Portuguese BR",
            Language::Mandarin => "Mandarin Chinese",
        };
        f.write_str(name)
    }
}

/// A Kokoro voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub name: &'static str,
    pub speaker_id: i32,
    pub language: Language,
}

/// (name, speaker ID, language), sorted by name for binary search.
const VOICES: &[(&str, i32, Language)] = &[
    ("af_alloy", 0, Language::AmericanEnglish),
    ("af_aoede", 1, Language::AmericanEnglish),
    ("af_bella", 2, Language::AmericanEnglish),
    ("af_heart", 3, Language::AmericanEnglish),
    ("af_jessica", 4, Language::AmericanEnglish),
    ("af_kore", 5, Language::AmericanEnglish),
    ("af_nicole", 6, Language::AmericanEnglish),
    ("af_nova", 7, Language::AmericanEnglish),
    ("af_river", 8, Language::AmericanEnglish),
    ("af_sarah", 9, Language::AmericanEnglish),
    ("af_sky", 10, Language::AmericanEnglish),
    ("am_adam", 11, Language::AmericanEnglish),
    ("am_echo", 12, Language::AmericanEnglish),
    ("am_eric", 13, Language::AmericanEnglish),
    ("am_fenrir", 14, Language::AmericanEnglish),
    ("am_liam", 15, Language::AmericanEnglish),
    ("am_michael", 16, Language::AmericanEnglish),
    ("am_onyx", 17, Language::AmericanEnglish),
    ("am_puck", 18, Language::AmericanEnglish),
    ("am_santa", 19, Language::AmericanEnglish),
    ("bf_alice", 20, Language::BritishEnglish),
    ("bf_emma", 21, Language::BritishEnglish),
    ("bf_isabella", 22, Language::BritishEnglish),
    ("bf_lily", 23, Language::BritishEnglish),
    ("bm_daniel", 24, Language::BritishEnglish),
    ("bm_fable", 25, Language::BritishEnglish),
    ("bm_george", 26, Language::BritishEnglish),
    ("bm_lewis", 27, Language::BritishEnglish),
    ("ef_dora", 28, Language::Spanish),
    ("em_alex", 29, Language::Spanish),
    ("ff_siwis", 30, Language::French),
    ("hf_alpha", 31, Language::Hindi),
    ("hf_beta", 32, Language::Hindi),
    ("hm_omega", 33, Language::Hindi),
    ("hm_psi", 34, Language::Hindi),
    ("if_sara", 35, Language::Italian),
    ("im_nicola", 36, Language::Italian),
    ("jf_alpha", 37, Language::Japanese),
    ("jf_gongitsune", 38, Language::Japanese),
    ("jf_nezumi", 39, Language::Japanese),
    ("jf_tebukuro", 40, Language::Japanese),
    ("jm_kumo", 41, Language::Japanese),
    ("pf_dora", 42, Language::BrazilianPortuguese),
    ("pm_alex", 43, Language::BrazilianPortuguese),
    ("pm_santa", 44, Language::BrazilianPortuguese),
    ("zf_xiaobei", 45, Language::Mandarin),
    ("zf_xiaoni", 46, Language::Mandarin),
    ("zf_xiaoxiao", 47, Language::Mandarin),
    ("zf_xiaoyi", 48, Language::Mandarin),
    ("zm_yunjian", 49, Language::Mandarin),
    ("zm_yunxi", 50, Language::Mandarin),
    ("zm_yunxia", 51, Language::Mandarin),
    ("zm_yunyang", 52, Language::Mandarin),
];

fn voice_at(idx: usize) -> Voice {
    let (name, speaker_id, language) = VOICES[idx];
    Voice { name, speaker_id, language }
}

/// Get voice metadata by name using binary search.
pub fn get_voice(name: &str) -> Option<Voice> {
    VOICES.binary_search_by_key(&name, |&(n, _, _)| n).ok().map(voice_at)
}

/// Resolve the voice for a book.
///
/// `auto` picks [`DEFAULT_JA_VOICE`] for Japanese books, [`DEFAULT_CJK_VOICE`]
/// for Chinese books and [`DEFAULT_VOICE`] otherwise; any other name must be
/// in the table.
pub fn resolve_voice(name: &str, script: Option<CjkScript>) -> Result<(&'static str, Voice)> {
    let name = if name.eq_ignore_ascii_case(AUTO_VOICE) {
        match script {
            Some(CjkScript::Japanese) => DEFAULT_JA_VOICE,
            Some(CjkScript::Chinese) => DEFAULT_CJK_VOICE,
            None => DEFAULT_VOICE,
        }
    } else {
        name
    };

    let voice = get_voice(name).ok_or_else(|| anyhow::anyhow!("Voice '{}' not found. Run with --list-voices to see available voices", name))?;
    Ok((voice.name, voice))
}

/// Print all available voices grouped by language.
pub fn print_voices() {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Kokoro TTS v1.0 - {} Voices Across {} Languages", VOICES.len(), Language::ALL.len());
    println!("═══════════════════════════════════════════════════════════════════");

    for language in Language::ALL {
        let mut lang_voices: Vec<Voice> = (0..VOICES.len()).map(voice_at).filter(|v| v.language == language).collect();
        lang_voices.sort_by_key(|v| v.speaker_id);

        println!("\n── {} ({} voices) ──", language, lang_voices.len());
        println!("{:<15} ID", "VOICE");
        println!("{}", "─".repeat(30));
        for voice in lang_voices {
            println!("{:<15} {}", voice.name, voice.speaker_id);
        }
    }

    println!("\n{}\n", "─".repeat(70));
    println!(
        "Default: auto ({} for Chinese books, {} for Japanese books, {} otherwise)",
        DEFAULT_CJK_VOICE, DEFAULT_JA_VOICE, DEFAULT_VOICE
    );
    println!();
    println!("Usage:");
    println!("  book-narrator book.epub --tts-voice bf_emma");
    println!("  book-narrator book.epub --tts-voice zm_yunxi --tts-speed 0.9");
}

/// Print detailed information about a specific voice.
pub fn print_voice_info(name: &str) -> Result<()> {
    let voice = get_voice(name).ok_or_else(|| anyhow::anyhow!("Voice '{}' not found. Run with --list-voices to see available voices", name))?;

    println!();
    println!("Voice: {}", voice.name);
    println!("{}", "─".repeat(40));
    println!("Speaker ID:    {}", voice.speaker_id);
    println!("Language:      {}", voice.language);
    println!();
    println!("Usage:");
    println!("  book-narrator book.epub --tts-voice {}", voice.name);
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_for_binary_search() {
        assert!(VOICES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_get_voice() {
        let voice = get_voice("bf_emma").unwrap();
        assert_eq!(voice.speaker_id, 21);
        assert_eq!(voice.language, Language::BritishEnglish);
        assert!(get_voice("xx_nobody").is_none());
    }

    #[test]
    fn test_resolve_auto_voice_by_book_language() {
        assert_eq!(resolve_voice("auto", None).unwrap().0, DEFAULT_VOICE);
        assert_eq!(resolve_voice("AUTO", Some(CjkScript::Chinese)).unwrap().0, DEFAULT_CJK_VOICE);
        assert_eq!(resolve_voice("auto", Some(CjkScript::Chinese)).unwrap().1.language, Language::Mandarin);
        assert_eq!(resolve_voice("auto", Some(CjkScript::Japanese)).unwrap().1.language, Language::Japanese);
    }

    #[test]
    fn test_resolve_explicit_voice_ignores_book_language() {
        let (name, voice) = resolve_voice("am_adam", Some(CjkScript::Japanese)).unwrap();
        assert_eq!(name, "am_adam");
        assert_eq!(voice.speaker_id, 11);
        assert!(resolve_voice("nope", None).is_err());
    }
}
