//! Application facade
//!
//! Every user action enters through [`GuardianApp`]: preconditions are checked
//! against the current state, the action is scheduled on the deferred
//! executor, and its completion is applied to [`AppState`] as an [`Event`].

use crate::auth::{
    validate_new_pin, BiometricVerifier, Credentials, FileKeyValueStore, InMemoryKeyValueStore,
    KeyValueStore, LoginEvent, LoginMethod, LoginStep, SimulatedBiometric, PIN_MIN_LEN,
};
use crate::config::{AppConfig, Delays};
use crate::deferred::{ActionLabel, DeferredExecutor, DeferredHandle, PendingActions};
use crate::error::GuardianError;
use crate::models::{FraudDecision, PauseDecision, Screen, Session};
use crate::navigation::Section;
use crate::state::{AppState, Applied, Event};
use crate::stores::MarketplaceQuery;
use crate::views::{render, Frame};
use crate::voice::{random_command, respond, route_command, VoiceEvent};
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

/// Awaitable outcome of a scheduled user action
pub type ActionHandle = DeferredHandle<Result<()>>;

const LOGIN: &str = "login";
const PIN_SETUP: &str = "pin-setup";
const BIOMETRIC_SETUP: &str = "biometric-setup";
const LOGOUT: &str = "logout";
const NAVIGATE: &str = "navigate";
const FRAUD_DECISION: &str = "fraud-decision";
const SECURITY_PAUSE: &str = "security-pause";
const SECURITY_PAUSE_CALL: &str = "security-pause-call";
const CALL_SUPPORT: &str = "call-support";
const ADD_DOCUMENT: &str = "add-document";
const CREATE_GOAL: &str = "create-goal";
const VOICE: &str = "voice";

#[derive(Clone)]
pub struct GuardianApp {
    state: Arc<RwLock<AppState>>,
    executor: DeferredExecutor,
    credentials: Credentials,
    biometric: Arc<dyn BiometricVerifier>,
    delays: Arc<Delays>,
}

impl GuardianApp {
    /// Reads the stored login flags and builds a signed-out app
    pub async fn start(
        delays: Delays,
        store: Arc<dyn KeyValueStore>,
        biometric: Arc<dyn BiometricVerifier>,
    ) -> Result<Self> {
        let credentials = Credentials::new(store);
        let flags = credentials.flags().await?;

        info!(
            has_pin = flags.has_pin,
            biometric_enabled = flags.biometric_enabled,
            biometric_available = biometric.is_available(),
            "Guardian app started"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(AppState::new(flags))),
            executor: DeferredExecutor::new(),
            credentials,
            biometric,
            delays: Arc::new(delays),
        })
    }

    /// Builds the storage and biometric backends named by `config`
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => Arc::new(FileKeyValueStore::open(path).await?),
            None => Arc::new(InMemoryKeyValueStore::new()),
        };
        let biometric = Arc::new(SimulatedBiometric::from_config(&config.biometric));

        Self::start(config.delays.clone(), store, biometric).await
    }

    pub fn pending(&self) -> &PendingActions {
        self.executor.pending()
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    /// Renders the current screen
    pub async fn view(&self) -> Frame {
        let state = self.state.read().await;
        render(&state, self.executor.pending())
    }

    //
    // ================= Internals =================
    //

    async fn apply(&self, event: Event) -> Result<Applied> {
        self.state.write().await.apply(event)
    }

    fn defer<F, Fut>(
        &self,
        label: impl Into<ActionLabel>,
        delay: Duration,
        effect: F,
    ) -> Result<ActionHandle>
    where
        F: FnOnce(GuardianApp) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let app = self.clone();
        self.executor.schedule(label, delay, move || effect(app))
    }

    fn ensure_idle(&self, label: &str) -> Result<()> {
        if self.executor.pending().is_pending(label) {
            return Err(GuardianError::ActionPending(label.to_string()));
        }
        Ok(())
    }

    /// Read access once the user is signed in and looking at `screen`
    async fn on_screen(
        &self,
        action: &str,
        screen: Screen,
    ) -> Result<RwLockReadGuard<'_, AppState>> {
        let state = self.state.read().await;
        state.router.require_authenticated()?;

        let current = state.router.current();
        if current != screen {
            return Err(GuardianError::WrongScreen {
                action: action.to_string(),
                screen: current,
            });
        }
        Ok(state)
    }

    async fn edit_login(&self, event: Event) -> Result<()> {
        let mut state = self.state.write().await;
        if state.router.is_authenticated() {
            return Err(GuardianError::AlreadyAuthenticated);
        }
        state.apply(event)?;
        Ok(())
    }

    /// Starts the session and the dashboard's staggered data loads
    async fn sign_in(&self) -> Result<()> {
        self.apply(Event::SessionStarted(Session::start())).await?;

        self.load_section(Section::Balance, self.delays.balance).await?;
        self.load_section(Section::Transactions, self.delays.transactions).await?;
        self.load_section(Section::Dashboard, self.delays.dashboard_data).await?;
        Ok(())
    }

    async fn load_section(&self, section: Section, delay: Duration) -> Result<()> {
        self.apply(Event::SectionLoadStarted(section)).await?;

        let label = format!("load-{}", section.as_str());
        let scheduled = self.defer(label, delay, move |app| async move {
            app.apply(Event::SectionLoaded(section)).await?;
            Ok(())
        });

        match scheduled {
            Ok(_) => Ok(()),
            Err(GuardianError::ActionPending(label)) => {
                debug!(%label, "Section already loading");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn return_to_dashboard(&self) -> Result<()> {
        self.apply(Event::ScreenEntered(Screen::Dashboard)).await?;
        Ok(())
    }

    /// Completes a navigation started by [`GuardianApp::navigate`]
    async fn land(&self, target: Screen) -> Result<()> {
        if self.apply(Event::ScreenLoaded(target)).await? == Applied::Ignored {
            return Ok(());
        }
        if let Some((section, delay)) = target.data_section(&self.delays) {
            self.load_section(section, delay).await?;
        }
        Ok(())
    }

    //
    // ================= Login =================
    //

    pub async fn select_login_method(&self, method: LoginMethod) -> Result<()> {
        self.edit_login(Event::LoginMethodSelected(method)).await
    }

    pub async fn back_to_login_choice(&self) -> Result<()> {
        self.edit_login(Event::LoginBack).await
    }

    pub async fn enter_pin(&self, raw: &str) -> Result<()> {
        self.edit_login(Event::PinInput(raw.to_string())).await
    }

    pub async fn enter_confirm_pin(&self, raw: &str) -> Result<()> {
        self.edit_login(Event::ConfirmPinInput(raw.to_string())).await
    }

    pub async fn toggle_pin_reveal(&self) -> Result<()> {
        self.edit_login(Event::PinRevealToggled).await
    }

    /// Checks the entered PIN against storage
    pub async fn submit_pin(&self) -> Result<ActionHandle> {
        let pin = {
            let state = self.state.read().await;
            if state.router.is_authenticated() {
                return Err(GuardianError::AlreadyAuthenticated);
            }
            if state.login.step() != LoginStep::Pin {
                return Err(GuardianError::MethodUnavailable(LoginMethod::Pin.as_str().to_string()));
            }
            if !state.login.can_submit_pin() {
                return Err(GuardianError::PinTooShort { min: PIN_MIN_LEN });
            }
            state.login.pin().to_string()
        };

        self.defer(LOGIN, self.delays.pin_check, move |app| async move {
            match app.credentials.verify_pin(&pin).await {
                Ok(()) => app.sign_in().await,
                Err(GuardianError::PinMismatch) => {
                    warn!("PIN rejected");
                    app.apply(Event::Login(LoginEvent::PinRejected)).await?;
                    Err(GuardianError::PinMismatch)
                }
                Err(e) => {
                    app.apply(Event::Login(LoginEvent::Failed(e.to_string()))).await?;
                    Err(e)
                }
            }
        })
    }

    /// Runs one simulated biometric check
    pub async fn start_biometric(&self) -> Result<ActionHandle> {
        self.ensure_idle(LOGIN)?;
        {
            let mut state = self.state.write().await;
            if state.router.is_authenticated() {
                return Err(GuardianError::AlreadyAuthenticated);
            }
            if !self.biometric.is_available() {
                let err = GuardianError::BiometricUnavailable;
                state.apply(Event::Login(LoginEvent::Failed(err.to_string())))?;
                return Err(err);
            }
            state.apply(Event::LoginMethodSelected(LoginMethod::Biometric))?;
        }

        self.defer(LOGIN, self.delays.biometric_check, |app| async move {
            if app.biometric.verify() {
                return app.sign_in().await;
            }
            warn!("Biometric verification failed");
            let err = GuardianError::BiometricFailed;
            app.apply(Event::Login(LoginEvent::BiometricRejected(err.to_string()))).await?;
            Err(err)
        })
    }

    /// Stores a new PIN once it passes validation
    pub async fn submit_pin_setup(&self) -> Result<ActionHandle> {
        let pin = {
            let mut state = self.state.write().await;
            if state.router.is_authenticated() {
                return Err(GuardianError::AlreadyAuthenticated);
            }
            if state.login.step() != LoginStep::SetupPin {
                return Err(GuardianError::MethodUnavailable(
                    LoginMethod::Setup.as_str().to_string(),
                ));
            }
            let checked = validate_new_pin(state.login.pin(), state.login.confirm_pin());
            if let Err(e) = checked {
                state.apply(Event::Login(LoginEvent::Failed(e.to_string())))?;
                return Err(e);
            }
            state.login.pin().to_string()
        };

        self.defer(PIN_SETUP, self.delays.pin_setup, move |app| async move {
            if let Err(e) = app.credentials.save_pin(&pin).await {
                app.apply(Event::Login(LoginEvent::Failed(e.to_string()))).await?;
                return Err(e);
            }
            info!("PIN configured");
            app.apply(Event::Login(LoginEvent::PinStored)).await?;
            Ok(())
        })
    }

    pub async fn enable_biometric(&self) -> Result<ActionHandle> {
        self.finish_setup(true).await
    }

    pub async fn skip_biometric(&self) -> Result<ActionHandle> {
        self.finish_setup(false).await
    }

    async fn finish_setup(&self, enabled: bool) -> Result<ActionHandle> {
        {
            let state = self.state.read().await;
            if state.router.is_authenticated() {
                return Err(GuardianError::AlreadyAuthenticated);
            }
            if state.login.step() != LoginStep::SetupBiometric {
                return Err(GuardianError::MethodUnavailable(
                    LoginMethod::Biometric.as_str().to_string(),
                ));
            }
        }
        if enabled && !self.biometric.is_available() {
            return Err(GuardianError::BiometricUnavailable);
        }

        let delay = if enabled {
            self.delays.biometric_enable
        } else {
            self.delays.biometric_skip
        };

        self.defer(BIOMETRIC_SETUP, delay, move |app| async move {
            app.credentials.set_biometric(enabled).await?;
            info!(enabled, "Biometric preference stored");
            app.sign_in().await
        })
    }

    //
    // ================= Session & navigation =================
    //

    pub async fn logout(&self) -> Result<ActionHandle> {
        self.state.read().await.router.require_authenticated()?;

        self.defer(LOGOUT, self.delays.logout, |app| async move {
            let flags = match app.credentials.flags().await {
                Ok(flags) => flags,
                Err(e) => {
                    warn!(error = %e, "Could not re-read login flags; keeping the current ones");
                    app.state.read().await.login.flags()
                }
            };
            app.apply(Event::SessionEnded(flags)).await?;
            Ok(())
        })
    }

    /// Moves to `target` through its loading condition
    pub async fn navigate(&self, target: Screen) -> Result<ActionHandle> {
        let mut state = self.state.write().await;
        state.router.check_transition(target)?;

        let handle = self.defer(NAVIGATE, target.load_delay(&self.delays), move |app| async move {
            app.land(target).await
        })?;
        state.apply(Event::ScreenLoadStarted(target))?;

        Ok(handle)
    }

    /// Returns to the dashboard
    pub async fn back(&self) -> Result<ActionHandle> {
        self.navigate(Screen::Dashboard).await
    }

    //
    // ================= Screen actions =================
    //

    pub async fn toggle_contact(&self, contact_id: u32) -> Result<ActionHandle> {
        self.on_screen("toggle-contact", Screen::Trust)
            .await?
            .contacts
            .require(contact_id)?;

        self.defer(
            ActionLabel::toggle_contact(contact_id),
            self.delays.toggle_contact,
            move |app| async move {
                app.apply(Event::ContactToggled(contact_id)).await?;
                Ok(())
            },
        )
    }

    pub async fn resolve_fraud_alert(&self, decision: FraudDecision) -> Result<ActionHandle> {
        self.on_screen("fraud-decision", Screen::FraudAlert).await?;

        self.defer(FRAUD_DECISION, self.delays.fraud_decision, move |app| async move {
            app.apply(Event::FraudResolved(decision)).await?;
            app.return_to_dashboard().await
        })
    }

    pub async fn resolve_security_pause(&self, decision: PauseDecision) -> Result<ActionHandle> {
        self.on_screen("security-pause", Screen::SecurityPause).await?;

        self.defer(SECURITY_PAUSE, self.delays.pause_decision, move |app| async move {
            app.apply(Event::PauseResolved(decision)).await?;
            if decision.returns_immediately() {
                return app.return_to_dashboard().await;
            }

            let contact = app.state.read().await.security.pause_contact.name.clone();
            info!(%contact, "Calling trusted contact");
            app.defer(
                SECURITY_PAUSE_CALL,
                app.delays.trusted_call_followup,
                |app| async move { app.return_to_dashboard().await },
            )?;
            Ok(())
        })
    }

    pub async fn call_support(&self) -> Result<ActionHandle> {
        self.on_screen("call-support", Screen::Help).await?;
        self.complete_later(CALL_SUPPORT, self.delays.call_support)
    }

    pub async fn add_document(&self) -> Result<ActionHandle> {
        self.on_screen("add-document", Screen::DigitalVault).await?;
        self.complete_later(ADD_DOCUMENT, self.delays.add_document)
    }

    pub async fn create_goal(&self) -> Result<ActionHandle> {
        self.on_screen("create-goal", Screen::FamilyGoals).await?;
        self.complete_later(CREATE_GOAL, self.delays.create_goal)
    }

    pub async fn contribute(&self, goal_id: &str) -> Result<ActionHandle> {
        self.on_screen("contribute", Screen::FamilyGoals)
            .await?
            .goals
            .require(goal_id)?;
        self.complete_later(ActionLabel::contribute(goal_id), self.delays.contribute)
    }

    pub async fn set_marketplace_query(&self, query: MarketplaceQuery) -> Result<()> {
        self.on_screen("marketplace-query", Screen::Marketplace).await?;
        self.apply(Event::MarketplaceQueryChanged(query)).await?;
        Ok(())
    }

    pub async fn contact_service(&self, service_id: &str) -> Result<ActionHandle> {
        self.on_screen("contact-service", Screen::Marketplace)
            .await?
            .marketplace
            .require(service_id)?;
        self.complete_later(ActionLabel::contact_service(service_id), self.delays.contact_service)
    }

    /// Actions whose completion changes nothing
    fn complete_later(
        &self,
        label: impl Into<ActionLabel>,
        delay: Duration,
    ) -> Result<ActionHandle> {
        let label = label.into();
        let done = label.clone();
        self.defer(label, delay, move |_| async move {
            debug!(label = %done, "Simulated action completed");
            Ok(())
        })
    }

    //
    // ================= Voice assistant =================
    //

    /// Listens, answers and speaks; routes the command to a screen when it asks for one
    pub async fn start_listening(&self) -> Result<ActionHandle> {
        self.listen(|| random_command().to_string()).await
    }

    /// Returns the panel to idle; an in-flight listen still resolves but is discarded
    pub async fn stop_listening(&self) -> Result<()> {
        self.state.read().await.router.require_authenticated()?;
        self.apply(Event::Voice(VoiceEvent::Stopped)).await?;
        Ok(())
    }

    /// `hear` yields the transcript once listening ends
    async fn listen(&self, hear: fn() -> String) -> Result<ActionHandle> {
        let mut state = self.state.write().await;
        state.router.require_authenticated()?;
        let current = state.router.current();
        if current != Screen::VoiceAssistant {
            return Err(GuardianError::WrongScreen {
                action: VOICE.to_string(),
                screen: current,
            });
        }

        let handle = self.defer(VOICE, self.delays.voice_listen, move |app| async move {
            app.answer_voice_command(hear()).await
        })?;
        state.apply(Event::Voice(VoiceEvent::ListeningStarted))?;

        Ok(handle)
    }

    async fn answer_voice_command(&self, command: String) -> Result<()> {
        let heard = Event::Voice(VoiceEvent::Heard(command.clone()));
        if self.apply(heard).await? == Applied::Ignored {
            return Ok(());
        }

        tokio::time::sleep(self.delays.voice_process).await;

        let response = {
            let state = self.state.read().await;
            respond(&command, &state.ledger, state.contacts.all())
        };
        let answered = Event::Voice(VoiceEvent::Answered(response));
        if self.apply(answered).await? == Applied::Ignored {
            return Ok(());
        }
        info!(%command, "Voice command answered");

        if let Some(target) = route_command(&command) {
            if let Err(e) = self.navigate(target).await {
                debug!(error = %e, %target, "Voice command did not navigate");
            }
        }

        tokio::time::sleep(self.delays.voice_speak).await;
        self.apply(Event::Voice(VoiceEvent::SpeakingFinished)).await?;
        Ok(())
    }
}

//
// ================= Tests =================
//
