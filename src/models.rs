//! Core data models for the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::GuardianError;

//
// ================= Screens =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    Dashboard,
    Expenses,
    Alerts,
    Trust,
    Help,
    FraudAlert,
    VoiceAssistant,
    SecurityPause,
    DigitalVault,
    FamilyGoals,
    Marketplace,
}

impl Screen {
    pub const ALL: [Screen; 11] = [
        Screen::Dashboard,
        Screen::Expenses,
        Screen::Alerts,
        Screen::Trust,
        Screen::Help,
        Screen::FraudAlert,
        Screen::VoiceAssistant,
        Screen::SecurityPause,
        Screen::DigitalVault,
        Screen::FamilyGoals,
        Screen::Marketplace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Dashboard => "dashboard",
            Screen::Expenses => "expenses",
            Screen::Alerts => "alerts",
            Screen::Trust => "trust",
            Screen::Help => "help",
            Screen::FraudAlert => "fraud-alert",
            Screen::VoiceAssistant => "voice-assistant",
            Screen::SecurityPause => "security-pause",
            Screen::DigitalVault => "digital-vault",
            Screen::FamilyGoals => "family-goals",
            Screen::Marketplace => "marketplace",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = GuardianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .iter()
            .copied()
            .find(|screen| screen.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| GuardianError::NotFound(format!("screen '{}'", s)))
    }
}

//
// ================= Session =================
//

/// An authenticated session. Its absence is the unauthenticated state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn start() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

//
// ================= Trusted Circle =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustedContact {
    pub id: u32,
    pub name: String,
    pub relationship: String,
    pub enabled: bool,
}

//
// ================= Vault =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Id,
    Medical,
    Insurance,
    Medication,
    Emergency,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub date_added: String,
    pub size: String,
}

//
// ================= Family Goals =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Health,
    Comfort,
    Travel,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contribution {
    pub name: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamilyGoal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub target_amount: u64,
    /// Not clamped to `target_amount`.
    pub current_amount: u64,
    pub contributors: Vec<Contribution>,
    pub category: GoalCategory,
    pub created_date: String,
}

impl FamilyGoal {
    /// Funding progress for display, saturating at 100.
    pub fn progress_percent(&self) -> u8 {
        if self.target_amount == 0 {
            return 100;
        }
        let percent = self.current_amount.saturating_mul(100) / self.target_amount;
        percent.min(100) as u8
    }

    pub fn remaining(&self) -> u64 {
        self.target_amount.saturating_sub(self.current_amount)
    }
}

//
// ================= Marketplace =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Health,
    Legal,
    Home,
    Insurance,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Health,
        ServiceCategory::Legal,
        ServiceCategory::Home,
        ServiceCategory::Insurance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Health => "health",
            ServiceCategory::Legal => "legal",
            ServiceCategory::Home => "home",
            ServiceCategory::Insurance => "insurance",
        }
    }
}

/// Category selection on the marketplace screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(ServiceCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: ServiceCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(selected) => *selected == category,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category.as_str(),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = GuardianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if value.is_empty() || value == "all" {
            return Ok(CategoryFilter::All);
        }
        ServiceCategory::ALL
            .iter()
            .find(|category| category.as_str() == value)
            .map(|category| CategoryFilter::Only(*category))
            .ok_or_else(|| GuardianError::NotFound(format!("service category '{}'", s)))
    }
}

impl Serialize for CategoryFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub category: ServiceCategory,
    pub description: String,
    pub rating: f32,
    pub review_count: u32,
    pub phone: String,
    pub location: String,
    pub verified: bool,
    pub specialties: Vec<String>,
    pub price: String,
}

//
// ================= Ledger =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub merchant: String,
    pub when: String,
    /// Signed amount in whole pesos; debits are negative.
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpenseShare {
    pub label: String,
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetUsage {
    pub category: String,
    pub spent: u64,
    pub budget_used_percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillPayment {
    pub name: String,
    pub amount: u64,
    pub paid_on_day: u8,
}

//
// ================= Security =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FraudAlert {
    pub merchant: String,
    pub amount: u64,
    pub occurred_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlaggedTransaction {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: u64,
    pub recipient: String,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactCard {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FraudDecision {
    /// The user recognises the charge.
    Confirm,
    Block,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PauseDecision {
    CallTrusted,
    Confirm,
    Cancel,
}

//
// ================= Formatting =================
//

/// Formats whole pesos the way the app shows them: `$482.550`, `-$28.450`.
pub fn format_clp(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

//
// ================= Tests =================
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_round_trips_through_its_name() {
        for screen in Screen::ALL {
            assert_eq!(screen.as_str().parse::<Screen>().unwrap(), screen);
        }
        assert!("settings".parse::<Screen>().is_err());
    }

    #[test]
    fn screen_serializes_kebab_case() {
        let json = serde_json::to_string(&Screen::FraudAlert).unwrap();
        assert_eq!(json, "\"fraud-alert\"");
    }

    #[test]
    fn category_filter_parses_all_and_categories() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Legal".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(ServiceCategory::Legal)
        );
        assert!("food".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn format_clp_groups_thousands_with_dots() {
        assert_eq!(format_clp(482_550), "$482.550");
        assert_eq!(format_clp(-28_450), "-$28.450");
        assert_eq!(format_clp(1_000_000), "$1.000.000");
        assert_eq!(format_clp(950), "$950");
        assert_eq!(format_clp(0), "$0");
    }

    #[test]
    fn goal_progress_saturates() {
        let mut goal = FamilyGoal {
            id: "x".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            target_amount: 200,
            current_amount: 50,
            contributors: vec![],
            category: GoalCategory::Other,
            created_date: String::new(),
        };
        assert_eq!(goal.progress_percent(), 25);
        assert_eq!(goal.remaining(), 150);

        goal.current_amount = 300;
        assert_eq!(goal.progress_percent(), 100);
        assert_eq!(goal.remaining(), 0);
    }
}
