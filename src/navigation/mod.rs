//! Screen router
//!
//! Closed transition table over [`Screen`] plus the session gate. Every
//! navigation passes through a loading condition before it lands.

use crate::config::Delays;
use crate::error::GuardianError;
use crate::models::{Screen, Session};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Data blocks that load on their own timer after a screen or session starts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Dashboard,
    Balance,
    Transactions,
    Expenses,
    Contacts,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Balance => "balance",
            Section::Transactions => "transactions",
            Section::Expenses => "expenses",
            Section::Contacts => "contacts",
        }
    }
}

impl Screen {
    /// Targets reachable from this screen
    pub fn valid_transitions(&self) -> &'static [Screen] {
        use Screen::*;
        match self {
            Dashboard => &[
                Expenses,
                Alerts,
                Trust,
                Help,
                DigitalVault,
                FamilyGoals,
                Marketplace,
                VoiceAssistant,
            ],
            Alerts => &[Dashboard, FraudAlert, SecurityPause],
            VoiceAssistant => &[Dashboard, Expenses, Trust],
            Expenses | Trust | Help | FraudAlert | SecurityPause | DigitalVault | FamilyGoals
            | Marketplace => &[Dashboard],
        }
    }

    pub fn can_transition_to(&self, target: Screen) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// How long the loading condition lasts before the screen lands
    pub fn load_delay(&self, delays: &Delays) -> Duration {
        match self {
            Screen::Expenses => delays.screen_expenses,
            Screen::Trust => delays.screen_trust,
            _ => delays.screen_default,
        }
    }

    /// Section loaded right after the screen lands
    pub fn data_section(&self, delays: &Delays) -> Option<(Section, Duration)> {
        match self {
            Screen::Expenses => Some((Section::Expenses, delays.expenses_data)),
            Screen::Trust => Some((Section::Contacts, delays.contacts_data)),
            _ => None,
        }
    }
}

/// Current session and screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    session: Option<Session>,
    screen: Screen,
    /// Target of the navigation in progress
    loading: Option<Screen>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            session: None,
            screen: Screen::Dashboard,
            loading: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current(&self) -> Screen {
        self.screen
    }

    pub fn loading_target(&self) -> Option<Screen> {
        self.loading
    }

    pub fn require_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(GuardianError::NotAuthenticated)
        }
    }

    /// Checks that `target` is reachable now without changing anything
    pub fn check_transition(&self, target: Screen) -> Result<()> {
        self.require_authenticated()?;
        if self.screen.can_transition_to(target) {
            Ok(())
        } else {
            Err(GuardianError::InvalidTransition {
                from: self.screen,
                to: target,
            })
        }
    }

    /// Enters the loading condition for `target`
    pub fn begin(&mut self, target: Screen) -> Result<()> {
        self.check_transition(target)?;
        self.loading = Some(target);
        debug!(from = %self.screen, to = %target, "Screen loading");
        Ok(())
    }

    /// Lands a navigation started with [`Router::begin`].
    ///
    /// Returns false when the navigation is no longer the one in flight, either
    /// because the session ended or because a direct entry replaced it.
    pub fn complete(&mut self, target: Screen) -> bool {
        if self.loading != Some(target) {
            debug!(to = %target, "Navigation superseded; ignored");
            return false;
        }
        self.loading = None;
        if !self.is_authenticated() {
            debug!(to = %target, "Navigation resolved after logout; ignored");
            return false;
        }
        self.screen = target;
        true
    }

    /// Moves straight to `target`, used when a screen's own action resolves.
    /// Drops any navigation still loading.
    pub fn enter(&mut self, target: Screen) -> Result<()> {
        self.check_transition(target)?;
        if let Some(dropped) = self.loading.take() {
            debug!(dropped = %dropped, to = %target, "Direct entry replaced pending navigation");
        }
        self.screen = target;
        Ok(())
    }

    pub fn sign_in(&mut self, session: Session) {
        self.session = Some(session);
        self.screen = Screen::Dashboard;
        self.loading = None;
    }

    pub fn sign_out(&mut self) {
        self.session = None;
        self.screen = Screen::Dashboard;
        self.loading = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in() -> Router {
        let mut router = Router::new();
        router.sign_in(Session::start());
        router
    }

    #[test]
    fn every_screen_can_go_back_to_dashboard() {
        for screen in Screen::ALL {
            if screen != Screen::Dashboard {
                assert!(screen.can_transition_to(Screen::Dashboard), "{}", screen);
            }
        }
    }

    #[test]
    fn dashboard_does_not_loop_to_itself() {
        assert!(!Screen::Dashboard.can_transition_to(Screen::Dashboard));
    }

    #[test]
    fn fraud_alert_is_reached_only_from_alerts() {
        let sources: Vec<Screen> = Screen::ALL
            .iter()
            .copied()
            .filter(|s| s.can_transition_to(Screen::FraudAlert))
            .collect();
        assert_eq!(sources, vec![Screen::Alerts]);
    }

    #[test]
    fn unauthenticated_router_rejects_navigation() {
        let mut router = Router::new();
        assert!(matches!(
            router.begin(Screen::Expenses),
            Err(GuardianError::NotAuthenticated)
        ));
    }

    #[test]
    fn begin_then_complete_lands_on_target() {
        let mut router = signed_in();
        router.begin(Screen::Trust).unwrap();
        assert_eq!(router.loading_target(), Some(Screen::Trust));
        assert_eq!(router.current(), Screen::Dashboard);

        assert!(router.complete(Screen::Trust));
        assert_eq!(router.current(), Screen::Trust);
        assert_eq!(router.loading_target(), None);
    }

    #[test]
    fn invalid_transition_is_reported() {
        let mut router = signed_in();
        let err = router.begin(Screen::SecurityPause).unwrap_err();
        assert!(matches!(
            err,
            GuardianError::InvalidTransition {
                from: Screen::Dashboard,
                to: Screen::SecurityPause
            }
        ));
    }

    #[test]
    fn completion_after_sign_out_is_ignored() {
        let mut router = signed_in();
        router.begin(Screen::Expenses).unwrap();
        router.sign_out();

        assert!(!router.complete(Screen::Expenses));
        assert!(!router.is_authenticated());
        assert_eq!(router.current(), Screen::Dashboard);
    }

    #[test]
    fn load_delays_follow_screen() {
        let delays = Delays::default();
        assert_eq!(Screen::Expenses.load_delay(&delays), Duration::from_millis(2000));
        assert_eq!(Screen::Trust.load_delay(&delays), Duration::from_millis(1500));
        assert_eq!(Screen::Help.load_delay(&delays), Duration::from_millis(1000));
        assert_eq!(
            Screen::Trust.data_section(&delays),
            Some((Section::Contacts, Duration::from_millis(800)))
        );
        assert_eq!(Screen::Alerts.data_section(&delays), None);
    }

    #[test]
    fn direct_entry_drops_the_pending_navigation() {
        let mut router = signed_in();
        router.enter(Screen::Alerts).unwrap();
        router.begin(Screen::FraudAlert).unwrap();

        router.enter(Screen::Dashboard).unwrap();
        assert_eq!(router.loading_target(), None);

        assert!(!router.complete(Screen::FraudAlert));
        assert_eq!(router.current(), Screen::Dashboard);
    }
}
