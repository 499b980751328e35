//! Family savings goals

use crate::error::GuardianError;
use crate::models::{Contribution, FamilyGoal, GoalCategory};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalBoard {
    goals: Vec<FamilyGoal>,
}

impl GoalBoard {
    pub fn seeded() -> Self {
        let contribution = |name: &str, amount| Contribution {
            name: name.to_string(),
            amount,
        };

        Self {
            goals: vec![
                FamilyGoal {
                    id: "1".to_string(),
                    title: "Sillón Reclinable Nuevo".to_string(),
                    description: "Un sillón más cómodo para ver televisión y descansar".to_string(),
                    target_amount: 250_000,
                    current_amount: 180_000,
                    contributors: vec![
                        contribution("Roberto (Yo)", 80_000),
                        contribution("Javier", 60_000),
                        contribution("María", 40_000),
                    ],
                    category: GoalCategory::Comfort,
                    created_date: "10 Mar 2024".to_string(),
                },
                FamilyGoal {
                    id: "2".to_string(),
                    title: "Audífono Digital".to_string(),
                    description: "Audífono moderno para escuchar mejor".to_string(),
                    target_amount: 180_000,
                    current_amount: 45_000,
                    contributors: vec![contribution("Roberto (Yo)", 45_000)],
                    category: GoalCategory::Health,
                    created_date: "5 Mar 2024".to_string(),
                },
            ],
        }
    }

    pub fn all(&self) -> &[FamilyGoal] {
        &self.goals
    }

    pub fn require(&self, id: &str) -> Result<&FamilyGoal> {
        self.goals
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| GuardianError::NotFound(format!("family goal {}", id)))
    }

    /// Sum of what every goal has raised so far
    pub fn total_raised(&self) -> u64 {
        self.goals.iter().map(|g| g.current_amount).sum()
    }
}

impl Default for GoalBoard {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_contributions_add_up_to_current_amount() {
        for goal in GoalBoard::seeded().all() {
            let sum: u64 = goal.contributors.iter().map(|c| c.amount).sum();
            assert_eq!(sum, goal.current_amount, "{}", goal.title);
        }
    }

    #[test]
    fn seeded_progress() {
        let board = GoalBoard::seeded();
        assert_eq!(board.require("1").unwrap().progress_percent(), 72);
        assert_eq!(board.require("2").unwrap().progress_percent(), 25);
        assert_eq!(board.total_raised(), 225_000);
        assert!(board.require("3").is_err());
    }
}
