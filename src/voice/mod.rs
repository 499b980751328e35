//! Voice assistant panel
//!
//! Recognition and speech are simulated: listening yields one of a few canned
//! questions, answers are built from keywords over the live account data.

use crate::models::{format_clp, Screen, TrustedContact};
use crate::stores::Ledger;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SAMPLE_COMMANDS: &[&str] = &[
    "¿Cuánto dinero me queda?",
    "¿Ya se pagó la cuenta de la luz?",
    "Léeme mis últimos gastos",
    "¿Hay alguna alerta de seguridad?",
    "Muéstrame mi círculo de confianza",
];

const FALLBACK_RESPONSE: &str = "Entiendo tu pregunta. Te ayudo con eso en un momento.";

/// Picks the transcript of a simulated recognition
pub fn random_command() -> &'static str {
    SAMPLE_COMMANDS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(SAMPLE_COMMANDS[0])
}

/// Builds the spoken answer for `command`
pub fn respond(command: &str, ledger: &Ledger, contacts: &[TrustedContact]) -> String {
    let text = command.to_lowercase();

    if text.contains("dinero") || text.contains("saldo") {
        format!(
            "Tu saldo actual es de {} pesos. Tienes suficiente dinero para tus gastos del mes.",
            format_clp(ledger.balance)
        )
    } else if text.contains("cuenta") || text.contains("luz") {
        let bill = &ledger.last_electricity_bill;
        format!(
            "Sí, la cuenta de la {} se pagó el día {} de este mes por {} pesos.",
            bill.name,
            bill.paid_on_day,
            format_clp(bill.amount as i64)
        )
    } else if text.contains("gastos") {
        let items: Vec<String> = ledger
            .recent_transactions
            .iter()
            .map(|t| format!("{} por {}", t.merchant, format_clp(t.amount.abs())))
            .collect();
        if items.is_empty() {
            "No tienes gastos recientes.".to_string()
        } else {
            format!("Tus últimos gastos fueron: {}.", items.join(", y "))
        }
    } else if text.contains("alerta") || text.contains("seguridad") {
        "No hay alertas de seguridad activas. Tu cuenta está protegida y monitoreada.".to_string()
    } else if text.contains("confianza") || text.contains("círculo") {
        let names: Vec<String> = contacts
            .iter()
            .map(|c| format!("{} ({})", c.name, c.relationship.to_lowercase()))
            .collect();
        format!(
            "Tu círculo de confianza tiene {} personas: {}.",
            contacts.len(),
            names.join(", ")
        )
    } else {
        FALLBACK_RESPONSE.to_string()
    }
}

/// Screen a command asks for, if any
pub fn route_command(command: &str) -> Option<Screen> {
    let text = command.to_lowercase();
    if text.contains("dinero") || text.contains("saldo") {
        None
    } else if text.contains("gastos") {
        Some(Screen::Expenses)
    } else if text.contains("confianza") {
        Some(Screen::Trust)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoicePhase {
    #[default]
    Idle,
    Listening,
    Processing,
    Speaking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    ListeningStarted,
    Heard(String),
    Answered(String),
    SpeakingFinished,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceAssistant {
    pub phase: VoicePhase,
    pub transcript: Option<String>,
    pub response: Option<String>,
}

impl VoiceAssistant {
    /// Status line shown under the microphone button
    pub fn prompt(&self) -> &'static str {
        match self.phase {
            VoicePhase::Listening => "Te estoy escuchando...",
            VoicePhase::Processing => "Procesando tu pregunta...",
            VoicePhase::Speaking => "Respondiendo...",
            VoicePhase::Idle => "Presiona el botón y hazme una pregunta",
        }
    }

    /// Applies `event`; returns false when it arrived too late to matter
    pub fn apply(&mut self, event: VoiceEvent) -> bool {
        match event {
            VoiceEvent::ListeningStarted => {
                self.phase = VoicePhase::Listening;
                self.transcript = None;
                self.response = None;
                true
            }
            VoiceEvent::Heard(transcript) => {
                if self.phase != VoicePhase::Listening {
                    debug!(%transcript, "Transcript arrived after stop; discarded");
                    return false;
                }
                self.transcript = Some(transcript);
                self.phase = VoicePhase::Processing;
                true
            }
            VoiceEvent::Answered(response) => {
                if self.phase != VoicePhase::Processing {
                    return false;
                }
                self.response = Some(response);
                self.phase = VoicePhase::Speaking;
                true
            }
            VoiceEvent::SpeakingFinished => {
                if self.phase == VoicePhase::Speaking {
                    self.phase = VoicePhase::Idle;
                }
                true
            }
            VoiceEvent::Stopped => {
                if matches!(self.phase, VoicePhase::Listening | VoicePhase::Processing) {
                    self.phase = VoicePhase::Idle;
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::ContactBook;

    #[test]
    fn balance_question_quotes_the_balance() {
        let answer = respond("¿Cuánto dinero me queda?", &Ledger::seeded(), &[]);
        assert!(answer.contains("$482.550"), "{}", answer);
    }

    #[test]
    fn expenses_question_lists_recent_transactions() {
        let answer = respond("Léeme mis últimos gastos", &Ledger::seeded(), &[]);
        assert!(answer.contains("Unimarc por $28.450"), "{}", answer);
        assert!(answer.contains("Farmacia Cruz Verde por $15.200"), "{}", answer);
    }

    #[test]
    fn circle_question_counts_contacts() {
        let book = ContactBook::seeded();
        let answer = respond("Muéstrame mi círculo de confianza", &Ledger::seeded(), book.all());
        assert!(answer.contains("3 personas"), "{}", answer);
        assert!(answer.contains("Javier Astudillo"), "{}", answer);
    }

    #[test]
    fn unknown_question_gets_fallback() {
        assert_eq!(respond("hola", &Ledger::seeded(), &[]), FALLBACK_RESPONSE);
    }

    #[test]
    fn routing_follows_keywords() {
        assert_eq!(route_command("Léeme mis últimos gastos"), Some(Screen::Expenses));
        assert_eq!(route_command("Muéstrame mi círculo de confianza"), Some(Screen::Trust));
        assert_eq!(route_command("¿Cuánto dinero me queda?"), None);
        assert_eq!(route_command("¿Hay alguna alerta de seguridad?"), None);
    }

    #[test]
    fn random_command_is_a_sample() {
        for _ in 0..20 {
            assert!(SAMPLE_COMMANDS.contains(&random_command()));
        }
    }

    #[test]
    fn late_transcript_after_stop_is_discarded() {
        let mut voice = VoiceAssistant::default();
        voice.apply(VoiceEvent::ListeningStarted);
        voice.apply(VoiceEvent::Stopped);

        assert!(!voice.apply(VoiceEvent::Heard("Léeme mis últimos gastos".to_string())));
        assert_eq!(voice.phase, VoicePhase::Idle);
        assert_eq!(voice.transcript, None);
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut voice = VoiceAssistant::default();
        assert!(voice.apply(VoiceEvent::ListeningStarted));
        assert!(voice.apply(VoiceEvent::Heard("x".to_string())));
        assert_eq!(voice.phase, VoicePhase::Processing);
        assert!(voice.apply(VoiceEvent::Answered("y".to_string())));
        assert_eq!(voice.phase, VoicePhase::Speaking);
        voice.apply(VoiceEvent::SpeakingFinished);
        assert_eq!(voice.phase, VoicePhase::Idle);
        assert_eq!(voice.response.as_deref(), Some("y"));
    }
}
