//! Language codes used in LSD headers
//!
//! Headers store Windows locale identifiers. DSL output wants the language
//! names understood by the DSL compiler.

use log::warn;

/// Name written for codes missing from [`LANGUAGES`]
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Locale identifier to DSL language name, ordered by code
pub const LANGUAGES: &[(u16, &str)] = &[
    (1025, "Arabic"),
    (1026, "Bulgarian"),
    (1027, "Catalan"),
    (1029, "Czech"),
    (1030, "Danish"),
    (1031, "German"),
    (1032, "Greek"),
    (1033, "English"),
    (1034, "Spanish"),
    (1035, "Finnish"),
    (1036, "French"),
    (1038, "Hungarian"),
    (1039, "Icelandic"),
    (1040, "Italian"),
    (1041, "Japanese"),
    (1042, "Korean"),
    (1043, "Dutch"),
    (1044, "Norwegian"),
    (1045, "Polish"),
    (1046, "PortugueseBrazilian"),
    (1048, "Romanian"),
    (1049, "Russian"),
    (1050, "Croatian"),
    (1051, "Slovak"),
    (1052, "Albanian"),
    (1053, "Swedish"),
    (1055, "Turkish"),
    (1057, "Indonesian"),
    (1058, "Ukrainian"),
    (1059, "Belarusian"),
    (1060, "Slovenian"),
    (1061, "Estonian"),
    (1062, "Latvian"),
    (1063, "Lithuanian"),
    (1067, "Armenian"),
    (1069, "Basque"),
    (1078, "Afrikaans"),
    (1087, "Kazakh"),
    (1092, "Tatar"),
    (1142, "Latin"),
    (2052, "ChinesePRC"),
    (2070, "Portuguese"),
    (3082, "SpanishModernSort"),
];

/// DSL name for a locale identifier, if known
pub fn language_name(code: u16) -> Option<&'static str> {
    LANGUAGES
        .binary_search_by_key(&code, |&(known, _)| known)
        .ok()
        .map(|index| LANGUAGES[index].1)
}

/// DSL name for a locale identifier, [`UNKNOWN_LANGUAGE`] when not known
pub fn dsl_language(code: u16) -> &'static str {
    language_name(code).unwrap_or_else(|| {
        warn!("Unknown language code {code}");
        UNKNOWN_LANGUAGE
    })
}
