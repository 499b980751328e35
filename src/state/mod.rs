//! Application state and its single update boundary
//!
//! Everything a screen can show lives in [`AppState`]; it changes only
//! through [`AppState::apply`].

use crate::auth::{CredentialFlags, LoginEvent, LoginFlow, LoginMethod};
use crate::models::{FraudDecision, PauseDecision, Screen, Session};
use crate::navigation::{Router, Section};
use crate::security::SecurityCenter;
use crate::stores::{ContactBook, DocumentVault, GoalBoard, Ledger, Marketplace, MarketplaceQuery};
use crate::voice::{VoiceAssistant, VoiceEvent};
use crate::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Mutations accepted by [`AppState::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Session
    SessionStarted(Session),
    SessionEnded(CredentialFlags),

    // Login screen
    LoginMethodSelected(LoginMethod),
    LoginBack,
    PinInput(String),
    ConfirmPinInput(String),
    PinRevealToggled,
    Login(LoginEvent),

    // Navigation
    ScreenLoadStarted(Screen),
    ScreenLoaded(Screen),
    ScreenEntered(Screen),
    SectionLoadStarted(Section),
    SectionLoaded(Section),

    // Screen actions
    ContactToggled(u32),
    FraudResolved(FraudDecision),
    PauseResolved(PauseDecision),
    MarketplaceQueryChanged(MarketplaceQuery),
    Voice(VoiceEvent),
}

/// What changed, for callers that chain follow-up work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// The event arrived after the state moved on and was dropped
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    pub router: Router,
    pub login: LoginFlow,
    /// Sections still showing placeholders
    pub loading: BTreeSet<Section>,
    pub contacts: ContactBook,
    pub vault: DocumentVault,
    pub goals: GoalBoard,
    pub marketplace: Marketplace,
    pub ledger: Ledger,
    pub security: SecurityCenter,
    pub voice: VoiceAssistant,
}

impl AppState {
    /// Fresh, signed-out state with seeded stores
    pub fn new(flags: CredentialFlags) -> Self {
        Self {
            router: Router::new(),
            login: LoginFlow::new(flags),
            loading: [Section::Dashboard].into_iter().collect(),
            contacts: ContactBook::seeded(),
            vault: DocumentVault::seeded(),
            goals: GoalBoard::seeded(),
            marketplace: Marketplace::seeded(),
            ledger: Ledger::seeded(),
            security: SecurityCenter::seeded(),
            voice: VoiceAssistant::default(),
        }
    }

    pub fn is_loading(&self, section: Section) -> bool {
        self.loading.contains(&section)
    }

    pub fn apply(&mut self, event: Event) -> Result<Applied> {
        // PIN digits stay out of the logs.
        if !matches!(event, Event::PinInput(_) | Event::ConfirmPinInput(_)) {
            debug!(?event, "Applying event");
        }

        match event {
            Event::SessionStarted(session) => {
                info!(session_id = %session.session_id, "Session started");
                self.router.sign_in(session);
                self.loading.extend([Section::Dashboard, Section::Balance, Section::Transactions]);
            }
            Event::SessionEnded(flags) => {
                if let Some(session) = self.router.session() {
                    info!(session_id = %session.session_id, "Session ended");
                }
                self.router.sign_out();
                self.login = LoginFlow::new(flags);
                self.loading.insert(Section::Dashboard);
            }

            Event::LoginMethodSelected(method) => self.login.select(method)?,
            Event::LoginBack => self.login.back_to_choose(),
            Event::PinInput(raw) => self.login.set_pin_input(&raw),
            Event::ConfirmPinInput(raw) => self.login.set_confirm_input(&raw),
            Event::PinRevealToggled => self.login.toggle_reveal(),
            Event::Login(login_event) => self.login.apply(login_event),

            Event::ScreenLoadStarted(target) => self.router.begin(target)?,
            Event::ScreenLoaded(target) => {
                if !self.router.complete(target) {
                    return Ok(Applied::Ignored);
                }
            }
            Event::ScreenEntered(target) => {
                if !self.router.is_authenticated() || self.router.current() == target {
                    return Ok(Applied::Ignored);
                }
                self.router.enter(target)?;
            }
            Event::SectionLoadStarted(section) => {
                self.loading.insert(section);
            }
            Event::SectionLoaded(section) => {
                self.loading.remove(&section);
            }

            Event::ContactToggled(id) => {
                let enabled = self.contacts.toggle(id)?;
                info!(contact_id = id, enabled, "Trusted contact toggled");
            }
            Event::FraudResolved(decision) => self.security.record_fraud_decision(decision),
            Event::PauseResolved(decision) => self.security.record_pause_decision(decision),
            Event::MarketplaceQueryChanged(query) => self.marketplace.set_query(query),
            Event::Voice(voice_event) => {
                if !self.voice.apply(voice_event) {
                    return Ok(Applied::Ignored);
                }
            }
        }

        Ok(Applied::Changed)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(CredentialFlags::default())
    }
}
