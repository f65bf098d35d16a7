//! User-facing summary sentences

use dactyl_common::config::Language;

/// Summary of a submission batch
pub fn registration_summary(language: Language, registered: &[String]) -> String {
    if registered.is_empty() {
        return match language {
            Language::En => "No fingerprint could be registered.".to_string(),
            Language::Es => "No se pudo registrar ninguna huella.".to_string(),
        };
    }

    let names = registered.join(", ");
    match language {
        Language::En => format!("Fingerprints registered: {}.", names),
        Language::Es => format!("Huellas registradas: {}.", names),
    }
}
