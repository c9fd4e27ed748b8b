//! Defense points: the currency spent on deployables before the final
//! stand, earned by turning in salvage.

use dropship_types::ItemKind;
use tracing::{info, warn};

use crate::cargo::SharedCargo;
use crate::config::DefenseConfig;

/// Errors returned by defense point operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DefenseError {
    /// The amount was zero or negative.
    #[error("invalid defense point amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// The balance does not cover the amount.
    #[error("insufficient defense points: need {needed}, have {available}")]
    Insufficient {
        /// Points requested.
        needed: u32,
        /// Points held.
        available: u32,
    },
}

/// Defense point balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefensePoints {
    balance: u32,
    points_per_salvage: u32,
}

impl DefensePoints {
    /// Create an empty balance.
    pub const fn new(config: &DefenseConfig) -> Self {
        Self {
            balance: 0,
            points_per_salvage: config.points_per_salvage,
        }
    }

    /// Credit `amount` points. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`DefenseError::InvalidAmount`] (and logs a warning) when
    /// `amount` is zero or negative; the balance is unchanged.
    pub fn add(&mut self, amount: i64) -> Result<u32, DefenseError> {
        let points = positive_amount(amount)?;
        self.balance = self.balance.saturating_add(points);
        info!(added = points, balance = self.balance, "Defense points added");
        Ok(self.balance)
    }

    /// Debit `amount` points. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`DefenseError::InvalidAmount`] for zero or negative amounts
    /// and [`DefenseError::Insufficient`] when the balance is too low.
    pub fn spend(&mut self, amount: i64) -> Result<u32, DefenseError> {
        let points = positive_amount(amount)?;
        let Some(remaining) = self.balance.checked_sub(points) else {
            warn!(needed = points, available = self.balance, "Not enough defense points");
            return Err(DefenseError::Insufficient {
                needed: points,
                available: self.balance,
            });
        };
        self.balance = remaining;
        info!(spent = points, balance = self.balance, "Defense points spent");
        Ok(self.balance)
    }

    /// Whether the balance covers `amount`.
    pub const fn can_afford(&self, amount: u32) -> bool {
        self.balance >= amount
    }

    /// Set the balance to zero.
    pub const fn reset(&mut self) {
        self.balance = 0;
    }

    /// Remove every salvage item from `cargo` and credit
    /// `points_per_salvage` for each. Returns the points gained.
    pub fn convert_salvage(&mut self, cargo: &mut SharedCargo) -> u32 {
        let salvage = cargo.remove_where(ItemKind::is_salvage);
        if salvage == 0 {
            return 0;
        }
        let gained = u32::try_from(salvage)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.points_per_salvage);
        self.balance = self.balance.saturating_add(gained);
        info!(salvage, gained, balance = self.balance, "Salvage converted");
        gained
    }

    /// Current balance.
    pub const fn balance(&self) -> u32 {
        self.balance
    }
}

fn positive_amount(amount: i64) -> Result<u32, DefenseError> {
    match u32::try_from(amount) {
        Ok(points) if points > 0 => Ok(points),
        _ => {
            warn!(amount, "Ignoring invalid defense point amount");
            Err(DefenseError::InvalidAmount { amount })
        }
    }
}
