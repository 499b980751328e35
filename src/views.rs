//! View models
//!
//! [`render`] turns the application state into one serialisable frame per
//! screen. Nothing here mutates state.

use crate::auth::{LoginMethod, LoginStep};
use crate::deferred::{ActionLabel, PendingActions};
use crate::models::{
    format_clp, BudgetUsage, ContactCard, Document, ExpenseShare, FamilyGoal, FlaggedTransaction,
    FraudAlert, FraudDecision, PauseDecision, Screen, Service, Transaction, TrustedContact,
};
use crate::navigation::Section;
use crate::state::AppState;
use crate::stores::marketplace::{categories, CategoryOption};
use crate::stores::MarketplaceQuery;
use crate::voice::{VoicePhase, SAMPLE_COMMANDS};
use serde::Serialize;

const PIN_MASK: char = '•';

/// Everything needed to draw the app once
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    /// Target of the navigation in progress
    pub screen_loading: Option<Screen>,
    pub pending_actions: Vec<ActionLabel>,
    pub view: ScreenView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "screen", rename_all = "kebab-case")]
pub enum ScreenView {
    Login(LoginView),
    Dashboard(DashboardView),
    Expenses(ExpensesView),
    Alerts(AlertsView),
    Trust(TrustView),
    Help(HelpView),
    FraudAlert(FraudAlertView),
    VoiceAssistant(VoiceView),
    SecurityPause(SecurityPauseView),
    DigitalVault(VaultView),
    FamilyGoals(GoalsView),
    Marketplace(MarketplaceView),
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginView {
    pub step: LoginStep,
    pub methods: Vec<LoginMethod>,
    /// Masked unless the reveal toggle is on
    pub pin: String,
    pub confirm_pin: String,
    pub reveal_pin: bool,
    pub error: Option<String>,
    pub can_submit: bool,
    pub busy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub merchant: String,
    pub when: String,
    pub amount: String,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        Self {
            merchant: t.merchant.clone(),
            when: t.when.clone(),
            amount: format_clp(t.amount),
        }
    }
}

/// `None` fields are still loading
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub balance: Option<String>,
    pub recent_transactions: Option<Vec<TransactionRow>>,
    pub shortcuts: Option<Vec<Screen>>,
    pub logging_out: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpensesView {
    pub categories: Option<Vec<ExpenseShare>>,
    pub budgets: Option<Vec<BudgetUsage>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsView {
    pub monitoring_active: bool,
    pub fraud_alert: FraudAlert,
    pub flagged_transaction: FlaggedTransaction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactRow {
    #[serde(flatten)]
    pub contact: TrustedContact,
    pub toggling: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrustView {
    pub contacts: Option<Vec<ContactRow>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelpView {
    pub calling_support: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FraudAlertView {
    pub alert: FraudAlert,
    pub amount: String,
    pub deciding: bool,
    pub last_decision: Option<FraudDecision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceView {
    pub phase: VoicePhase,
    pub prompt: &'static str,
    pub transcript: Option<String>,
    pub response: Option<String>,
    pub suggestions: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityPauseView {
    pub transaction: FlaggedTransaction,
    pub amount: String,
    pub trusted_contact: ContactCard,
    pub deciding: bool,
    pub calling_trusted_contact: bool,
    pub last_decision: Option<PauseDecision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultView {
    pub documents: Vec<Document>,
    pub uploading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalRow {
    #[serde(flatten)]
    pub goal: FamilyGoal,
    pub progress_percent: u8,
    pub remaining: String,
    pub contributing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalsView {
    pub goals: Vec<GoalRow>,
    pub total_raised: String,
    pub creating: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRow {
    #[serde(flatten)]
    pub service: Service,
    pub contacting: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketplaceView {
    pub categories: Vec<CategoryOption>,
    pub query: MarketplaceQuery,
    pub services: Vec<ServiceRow>,
}

fn mask(pin: &str, reveal: bool) -> String {
    if reveal {
        pin.to_string()
    } else {
        pin.chars().map(|_| PIN_MASK).collect()
    }
}

fn unless_loading<T>(state: &AppState, section: Section, value: impl FnOnce() -> T) -> Option<T> {
    if state.is_loading(section) {
        None
    } else {
        Some(value())
    }
}

pub fn render(state: &AppState, pending: &PendingActions) -> Frame {
    let view = if state.router.is_authenticated() {
        render_screen(state, pending)
    } else {
        ScreenView::Login(render_login(state, pending))
    };

    Frame {
        screen_loading: state.router.loading_target(),
        pending_actions: pending.snapshot(),
        view,
    }
}

fn render_login(state: &AppState, pending: &PendingActions) -> LoginView {
    let login = &state.login;
    let can_submit = match login.step() {
        LoginStep::Pin => login.can_submit_pin(),
        LoginStep::SetupPin => login.can_submit_setup(),
        _ => false,
    };

    LoginView {
        step: login.step(),
        methods: login.available_methods(),
        pin: mask(login.pin(), login.reveal_pin()),
        confirm_pin: mask(login.confirm_pin(), login.reveal_pin()),
        reveal_pin: login.reveal_pin(),
        error: login.error().map(str::to_string),
        can_submit,
        busy: ["login", "pin-setup", "biometric-setup"]
            .iter()
            .any(|label| pending.is_pending(label)),
    }
}

fn render_screen(state: &AppState, pending: &PendingActions) -> ScreenView {
    match state.router.current() {
        Screen::Dashboard => ScreenView::Dashboard(DashboardView {
            balance: unless_loading(state, Section::Balance, || format_clp(state.ledger.balance)),
            recent_transactions: unless_loading(state, Section::Transactions, || {
                state.ledger.recent_transactions.iter().map(TransactionRow::from).collect()
            }),
            shortcuts: unless_loading(state, Section::Dashboard, || {
                Screen::Dashboard.valid_transitions().to_vec()
            }),
            logging_out: pending.is_pending("logout"),
        }),

        Screen::Expenses => ScreenView::Expenses(ExpensesView {
            categories: unless_loading(state, Section::Expenses, || {
                state.ledger.expense_shares.clone()
            }),
            budgets: unless_loading(state, Section::Expenses, || state.ledger.budgets.clone()),
        }),

        Screen::Alerts => ScreenView::Alerts(AlertsView {
            monitoring_active: state.security.monitoring_active,
            fraud_alert: state.security.fraud_alert.clone(),
            flagged_transaction: state.security.pause_subject.clone(),
        }),

        Screen::Trust => ScreenView::Trust(TrustView {
            contacts: unless_loading(state, Section::Contacts, || {
                state
                    .contacts
                    .all()
                    .iter()
                    .map(|contact| ContactRow {
                        contact: contact.clone(),
                        toggling: pending.is_pending(&format!("toggle-{}", contact.id)),
                    })
                    .collect()
            }),
        }),

        Screen::Help => ScreenView::Help(HelpView {
            calling_support: pending.is_pending("call-support"),
        }),

        Screen::FraudAlert => ScreenView::FraudAlert(FraudAlertView {
            alert: state.security.fraud_alert.clone(),
            amount: format_clp(state.security.fraud_alert.amount as i64),
            deciding: pending.is_pending("fraud-decision"),
            last_decision: state.security.last_fraud_decision,
        }),

        Screen::VoiceAssistant => ScreenView::VoiceAssistant(VoiceView {
            phase: state.voice.phase,
            prompt: state.voice.prompt(),
            transcript: state.voice.transcript.clone(),
            response: state.voice.response.clone(),
            suggestions: SAMPLE_COMMANDS,
        }),

        Screen::SecurityPause => ScreenView::SecurityPause(SecurityPauseView {
            transaction: state.security.pause_subject.clone(),
            amount: format_clp(state.security.pause_subject.amount as i64),
            trusted_contact: state.security.pause_contact.clone(),
            deciding: pending.is_pending("security-pause"),
            calling_trusted_contact: pending.is_pending("security-pause-call"),
            last_decision: state.security.last_pause_decision,
        }),

        Screen::DigitalVault => ScreenView::DigitalVault(VaultView {
            documents: state.vault.all().to_vec(),
            uploading: pending.is_pending("add-document"),
        }),

        Screen::FamilyGoals => ScreenView::FamilyGoals(GoalsView {
            goals: state
                .goals
                .all()
                .iter()
                .map(|goal| GoalRow {
                    goal: goal.clone(),
                    progress_percent: goal.progress_percent(),
                    remaining: format_clp(goal.remaining() as i64),
                    contributing: pending.is_pending(&format!("contribute-{}", goal.id)),
                })
                .collect(),
            total_raised: format_clp(state.goals.total_raised() as i64),
            creating: pending.is_pending("create-goal"),
        }),

        Screen::Marketplace => ScreenView::Marketplace(MarketplaceView {
            categories: categories(),
            query: state.marketplace.query().clone(),
            services: state
                .marketplace
                .visible()
                .into_iter()
                .map(|service| ServiceRow {
                    service: service.clone(),
                    contacting: pending.is_pending(&format!("contact-{}", service.id)),
                })
                .collect(),
        }),
    }
}
