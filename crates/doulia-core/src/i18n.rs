//! Fixed bilingual copy: chat fallbacks, alerts and static UI text.

use crate::language::Language;
use crate::state::MessagePart;

pub fn summarize_instruction(language: Language) -> &'static str {
    language.pick(
        "Veuillez résumer ce document en 3 points clés.",
        "Please summarize this document into 3 key bullet points.",
    )
}

pub fn summary_offer(language: Language, file_name: &str) -> String {
    match language {
        Language::Fr => format!(
            "J'ai reçu votre document (**{file_name}**). Souhaitez-vous que je le résume en 3 points clés ?"
        ),
        Language::En => format!(
            "I have received your document (**{file_name}**). Would you like me to summarize it into 3 key bullet points?"
        ),
    }
}

pub fn no_response(language: Language) -> &'static str {
    language.pick(
        "Désolé, je n'ai pas pu générer de réponse.",
        "Sorry, I could not generate a response.",
    )
}

pub fn service_failure(language: Language) -> &'static str {
    language.pick(
        "Désolé, une erreur est survenue lors de la communication avec le service. Veuillez réessayer plus tard.",
        "Sorry, an error occurred while communicating with the service. Please try again later.",
    )
}

pub fn configuration_failure(language: Language) -> &'static str {
    language.pick(
        "Le service n'est pas correctement configuré (clé API invalide ou manquante).",
        "The service is not configured correctly (invalid or missing API key).",
    )
}

pub fn pdf_only(language: Language) -> &'static str {
    language.pick(
        "Veuillez ne télécharger que des fichiers PDF.",
        "Please upload PDF files only.",
    )
}

pub fn no_speech(language: Language) -> &'static str {
    language.pick(
        "Aucune parole détectée. Veuillez réessayer.",
        "No speech detected. Please try again.",
    )
}

pub fn microphone_denied(language: Language) -> &'static str {
    language.pick(
        "Permission du microphone refusée. Veuillez l'activer dans les paramètres.",
        "Microphone permission denied. Please enable it in your settings.",
    )
}

pub fn speech_unavailable(language: Language) -> &'static str {
    language.pick(
        "La reconnaissance vocale n'est pas disponible. Configurez `speech_command`.",
        "Speech recognition is not available. Configure `speech_command`.",
    )
}

/// The bilingual greeting the conversation starts with.
pub fn welcome_parts() -> Vec<MessagePart> {
    vec![
        MessagePart::text(
            "Bonjour ! Je suis DOULIA, votre consultant expert en IA pour PAA Procure and Advisory Company. ",
        ),
        MessagePart::text(
            "Comment puis-je vous aider à sécuriser et optimiser vos marchés publics aujourd'hui ?",
        ),
        MessagePart::text(
            "\n\nHello! I am DOULIA, your AI expert consultant for PAA Procure and Advisory Company. ",
        ),
        MessagePart::text(
            "How can I assist you in securing and optimizing your public procurement today?",
        ),
    ]
}

pub fn placeholder(language: Language) -> &'static str {
    language.pick("Écrivez votre message...", "Type your message...")
}

pub fn send_label(language: Language) -> &'static str {
    language.pick("Envoyer", "Send")
}

pub fn sending_label(language: Language) -> &'static str {
    language.pick("Envoi...", "Sending...")
}

pub fn recording_label(language: Language) -> &'static str {
    language.pick("Enregistrement... (v pour arrêter)", "Recording... (v to stop)")
}

pub fn speaking_label(language: Language) -> &'static str {
    language.pick("DOULIA parle...", "DOULIA is speaking...")
}

pub fn thinking_label(language: Language) -> &'static str {
    language.pick("Réflexion", "Thinking")
}

pub fn headline() -> &'static str {
    "PAA Expert Consultant"
}

pub fn tagline(language: Language) -> &'static str {
    language.pick(
        "Votre partenaire stratégique pour l'optimisation et la sécurisation de vos marchés publics.",
        "Your strategic partner for optimizing and securing your public procurement.",
    )
}

pub fn social_proof(language: Language) -> &'static str {
    language.pick(
        "Une innovation exclusive de PAA Procure and Advisory, développée pour le marché camerounais.",
        "An exclusive innovation from PAA Procure and Advisory, developed for the Cameroonian market.",
    )
}

pub fn upload_prompt(language: Language) -> &'static str {
    language.pick("Chemin du fichier PDF", "Path to PDF file")
}

pub fn attach_prompt(language: Language) -> &'static str {
    language.pick("Joindre un PDF au prochain message", "Attach a PDF to the next message")
}
