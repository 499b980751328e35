//! Account snapshot shown on the dashboard and expenses screens

use crate::models::{BillPayment, BudgetUsage, ExpenseShare, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub balance: i64,
    pub recent_transactions: Vec<Transaction>,
    pub expense_shares: Vec<ExpenseShare>,
    pub budgets: Vec<BudgetUsage>,
    pub last_electricity_bill: BillPayment,
}

impl Ledger {
    pub fn seeded() -> Self {
        let share = |label: &str, percent| ExpenseShare {
            label: label.to_string(),
            percent,
        };

        Self {
            balance: 482_550,
            recent_transactions: vec![
                Transaction {
                    merchant: "Unimarc".to_string(),
                    when: "Ayer, 14:30".to_string(),
                    amount: -28_450,
                },
                Transaction {
                    merchant: "Farmacia Cruz Verde".to_string(),
                    when: "Lunes, 10:15".to_string(),
                    amount: -15_200,
                },
            ],
            expense_shares: vec![
                share("Supermercado", 40),
                share("Cuentas", 25),
                share("Salud", 20),
                share("Otros", 15),
            ],
            budgets: vec![
                BudgetUsage {
                    category: "Supermercado".to_string(),
                    spent: 195_200,
                    budget_used_percent: 75,
                },
                BudgetUsage {
                    category: "Salud".to_string(),
                    spent: 98_400,
                    budget_used_percent: 45,
                },
            ],
            last_electricity_bill: BillPayment {
                name: "luz".to_string(),
                amount: 45_200,
                paid_on_day: 15,
            },
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::seeded()
    }
}
