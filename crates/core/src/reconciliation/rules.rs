//! Bank categorization rules.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BankRuleId};

use super::error::ReconciliationError;
use super::status::BankTransactionStatus;

/// Transaction field a condition inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleField {
    /// Statement description.
    Description,
    /// Signed amount.
    Amount,
}

/// Comparison a condition applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleOperator {
    /// Substring, case-insensitive.
    Contains,
    /// Whole value; decimal equality for amounts.
    Equals,
    /// Prefix, case-insensitive.
    StartsWith,
    /// Amount strictly greater than the value.
    GreaterThan,
    /// Amount strictly less than the value.
    LessThan,
}

impl RuleOperator {
    const fn is_numeric(self) -> bool {
        matches!(self, Self::GreaterThan | Self::LessThan)
    }
}

/// One condition of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Field inspected.
    pub field: RuleField,
    /// Comparison.
    pub operator: RuleOperator,
    /// Value compared against.
    pub value: String,
}

impl RuleCondition {
    /// Checks that the condition can ever be evaluated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` for numeric comparisons on the description or
    /// numeric comparisons whose value is not a decimal.
    pub fn validate(&self) -> Result<(), ReconciliationError> {
        if self.operator.is_numeric() {
            if self.field != RuleField::Amount {
                return Err(ReconciliationError::InvalidRule(
                    "numeric comparisons apply to the amount only".to_string(),
                ));
            }
            if Decimal::from_str(self.value.trim()).is_err() {
                return Err(ReconciliationError::InvalidRule(format!(
                    "'{}' is not a number",
                    self.value
                )));
            }
        }
        Ok(())
    }

    /// Evaluates the condition against a transaction.
    #[must_use]
    pub fn matches(&self, description: &str, amount: Decimal) -> bool {
        let target = self.value.trim().to_lowercase();
        match (self.field, self.operator) {
            (
                RuleField::Amount,
                RuleOperator::GreaterThan | RuleOperator::LessThan | RuleOperator::Equals,
            ) => {
                let Ok(value) = Decimal::from_str(&target) else {
                    return false;
                };
                match self.operator {
                    RuleOperator::GreaterThan => amount > value,
                    RuleOperator::LessThan => amount < value,
                    _ => amount == value,
                }
            }
            (RuleField::Description, RuleOperator::GreaterThan | RuleOperator::LessThan) => false,
            (field, operator) => {
                let text = match field {
                    RuleField::Description => description.to_lowercase(),
                    RuleField::Amount => amount.to_string(),
                };
                match operator {
                    RuleOperator::Contains => text.contains(&target),
                    RuleOperator::StartsWith => text.starts_with(&target),
                    _ => text == target,
                }
            }
        }
    }
}

/// A categorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRule {
    /// Rule ID.
    pub id: BankRuleId,
    /// Rule name.
    pub name: String,
    /// Evaluation order; lower runs first.
    pub priority: i32,
    /// All must hold for the rule to match.
    pub conditions: Vec<RuleCondition>,
    /// Category account assigned.
    pub assign_account: Option<AccountId>,
    /// Payee assigned.
    pub assign_payee: Option<String>,
    /// Categorize and post immediately instead of suggesting.
    pub auto_confirm: bool,
    /// Inactive rules are skipped.
    pub is_active: bool,
}

impl BankRule {
    /// Validates every condition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` for an empty name or an invalid condition.
    pub fn validate(&self) -> Result<(), ReconciliationError> {
        if self.name.trim().is_empty() {
            return Err(ReconciliationError::InvalidRule("name is required".to_string()));
        }
        self.conditions.iter().try_for_each(RuleCondition::validate)
    }

    /// True if every condition holds. A rule without conditions never matches.
    #[must_use]
    pub fn matches(&self, description: &str, amount: Decimal) -> bool {
        !self.conditions.is_empty()
            && self
                .conditions
                .iter()
                .all(|c| c.matches(description, amount))
    }
}

/// Result of running the rules over one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// No rule applies.
    NoMatch,
    /// Assign account/payee and leave the row for review.
    Suggested {
        /// Matching rule.
        rule_id: BankRuleId,
        /// Account assigned.
        account: Option<AccountId>,
        /// Payee assigned.
        payee: Option<String>,
    },
    /// Assign and categorize the row.
    Confirmed {
        /// Matching rule.
        rule_id: BankRuleId,
        /// Account assigned.
        account: AccountId,
        /// Payee assigned.
        payee: Option<String>,
    },
}

/// Active rules in evaluation order.
pub struct RuleEngine<'a> {
    rules: Vec<&'a BankRule>,
}

impl<'a> RuleEngine<'a> {
    /// Keeps active rules, ordered by priority then name.
    #[must_use]
    pub fn new(rules: &'a [BankRule]) -> Self {
        let mut active: Vec<&BankRule> = rules.iter().filter(|r| r.is_active).collect();
        active.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        Self { rules: active }
    }

    /// The first rule that matches, if any.
    #[must_use]
    pub fn first_match(&self, description: &str, amount: Decimal) -> Option<&'a BankRule> {
        self.rules
            .iter()
            .copied()
            .find(|rule| rule.matches(description, amount))
    }

    /// Evaluates a transaction. Only rows awaiting review are considered.
    #[must_use]
    pub fn evaluate(
        &self,
        status: BankTransactionStatus,
        description: &str,
        amount: Decimal,
    ) -> RuleOutcome {
        if status != BankTransactionStatus::ForReview {
            return RuleOutcome::NoMatch;
        }
        let Some(rule) = self.first_match(description, amount) else {
            return RuleOutcome::NoMatch;
        };
        match (rule.auto_confirm, rule.assign_account) {
            (true, Some(account)) => RuleOutcome::Confirmed {
                rule_id: rule.id,
                account,
                payee: rule.assign_payee.clone(),
            },
            _ => RuleOutcome::Suggested {
                rule_id: rule.id,
                account: rule.assign_account,
                payee: rule.assign_payee.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn condition(field: RuleField, operator: RuleOperator, value: &str) -> RuleCondition {
        RuleCondition {
            field,
            operator,
            value: value.to_string(),
        }
    }

    fn rule(name: &str, priority: i32, conditions: Vec<RuleCondition>) -> BankRule {
        BankRule {
            id: BankRuleId::new(),
            name: name.to_string(),
            priority,
            conditions,
            assign_account: Some(AccountId::new()),
            assign_payee: Some("Tim Hortons".into()),
            auto_confirm: false,
            is_active: true,
        }
    }

    #[rstest]
    #[case(RuleField::Description, RuleOperator::Contains, "hortons", true)]
    #[case(RuleField::Description, RuleOperator::StartsWith, "tim ", true)]
    #[case(RuleField::Description, RuleOperator::Equals, "TIM HORTONS #123", true)]
    #[case(RuleField::Description, RuleOperator::Equals, "tim hortons", false)]
    #[case(RuleField::Description, RuleOperator::GreaterThan, "1", false)]
    #[case(RuleField::Amount, RuleOperator::LessThan, "0", true)]
    #[case(RuleField::Amount, RuleOperator::GreaterThan, "-10", true)]
    #[case(RuleField::Amount, RuleOperator::GreaterThan, "-4.5", false)]
    #[case(RuleField::Amount, RuleOperator::Equals, "-4.5", true)]
    #[case(RuleField::Amount, RuleOperator::StartsWith, "-4", true)]
    #[case(RuleField::Amount, RuleOperator::LessThan, "abc", false)]
    fn test_condition_matches(
        #[case] field: RuleField,
        #[case] operator: RuleOperator,
        #[case] value: &str,
        #[case] expected: bool,
    ) {
        let c = condition(field, operator, value);
        assert_eq!(c.matches("TIM HORTONS #123", dec!(-4.50)), expected);
    }

    #[test]
    fn test_rule_without_conditions_never_matches() {
        assert!(!rule("Empty", 1, vec![]).matches("anything", dec!(1)));
    }

    #[test]
    fn test_all_conditions_must_hold() {
        let r = rule(
            "Coffee",
            1,
            vec![
                condition(RuleField::Description, RuleOperator::Contains, "tim"),
                condition(RuleField::Amount, RuleOperator::LessThan, "-10"),
            ],
        );
        assert!(!r.matches("TIM HORTONS", dec!(-4.50)));
        assert!(r.matches("TIM HORTONS", dec!(-14.50)));
    }

    #[test]
    fn test_engine_orders_by_priority_then_name() {
        let coffee = condition(RuleField::Description, RuleOperator::Contains, "coffee");
        let rules = vec![
            rule("B", 2, vec![coffee.clone()]),
            rule("Z", 1, vec![coffee.clone()]),
            rule("A", 1, vec![coffee.clone()]),
            BankRule {
                is_active: false,
                ..rule("0 inactive", 0, vec![coffee])
            },
        ];
        let engine = RuleEngine::new(&rules);
        assert_eq!(engine.first_match("COFFEE", dec!(-3)).unwrap().name, "A");
    }

    #[test]
    fn test_evaluate_outcomes() {
        let mut auto = rule(
            "Auto",
            1,
            vec![condition(RuleField::Description, RuleOperator::Contains, "rent")],
        );
        auto.auto_confirm = true;
        let account = auto.assign_account.unwrap();
        let rules = vec![auto];
        let engine = RuleEngine::new(&rules);

        assert!(matches!(
            engine.evaluate(BankTransactionStatus::ForReview, "RENT MARCH", dec!(-1200)),
            RuleOutcome::Confirmed { account: a, .. } if a == account
        ));
        assert_eq!(
            engine.evaluate(BankTransactionStatus::Categorized, "RENT MARCH", dec!(-1200)),
            RuleOutcome::NoMatch
        );
        assert_eq!(
            engine.evaluate(BankTransactionStatus::ForReview, "PAYROLL", dec!(-1200)),
            RuleOutcome::NoMatch
        );
    }

    #[test]
    fn test_auto_confirm_without_account_only_suggests() {
        let mut r = rule(
            "Payee only",
            1,
            vec![condition(RuleField::Description, RuleOperator::Contains, "x")],
        );
        r.auto_confirm = true;
        r.assign_account = None;
        let rules = vec![r];
        assert!(matches!(
            RuleEngine::new(&rules).evaluate(BankTransactionStatus::ForReview, "x", dec!(1)),
            RuleOutcome::Suggested { account: None, .. }
        ));
    }

    #[test]
    fn test_validate() {
        assert!(
            condition(RuleField::Description, RuleOperator::GreaterThan, "5")
                .validate()
                .is_err()
        );
        assert!(
            condition(RuleField::Amount, RuleOperator::GreaterThan, "five")
                .validate()
                .is_err()
        );
        assert!(condition(RuleField::Amount, RuleOperator::GreaterThan, "5.25").validate().is_ok());
        assert!(rule(" ", 1, vec![]).validate().is_err());
    }
}
