use super::ids::InstrumentId;
use super::market::MarketBoard;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCondition {
    Above,
    Below,
}

/// A one-shot price threshold watch. Triggering deactivates the alert;
/// the user can re-arm it with a toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    id: Uuid,
    instrument_id: InstrumentId,
    symbol: String,
    threshold: f64,
    condition: AlertCondition,
    active: bool,
    created_at: DateTime<Utc>,
}

impl PriceAlert {
    pub fn new(
        instrument_id: InstrumentId,
        symbol: impl Into<String>,
        threshold: f64,
        condition: AlertCondition,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id,
            symbol: symbol.into(),
            threshold,
            condition,
            active: true,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn condition(&self) -> AlertCondition {
        self.condition
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_met(&self, price: f64) -> bool {
        match self.condition {
            AlertCondition::Above => price >= self.threshold,
            AlertCondition::Below => price <= self.threshold,
        }
    }
}

/// All configured alerts. Evaluation runs after every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertBook {
    alerts: Vec<PriceAlert>,
}

impl AlertBook {
    pub fn set(&mut self, alert: PriceAlert) {
        self.alerts.push(alert);
    }

    /// Returns true if an alert was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id() != id);
        self.alerts.len() != before
    }

    /// Flips active on/off; no-op on unknown ids. Returns the new state.
    pub fn toggle(&mut self, id: Uuid) -> Option<bool> {
        let alert = self.alerts.iter_mut().find(|a| a.id() == id)?;
        alert.active = !alert.active;
        Some(alert.active)
    }

    pub fn get(&self, id: Uuid) -> Option<&PriceAlert> {
        self.alerts.iter().find(|a| a.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceAlert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Deactivates and returns every active alert whose condition the
    /// current prices meet.
    pub fn evaluate(&mut self, board: &MarketBoard) -> Vec<PriceAlert> {
        let mut triggered = Vec::new();
        for alert in self.alerts.iter_mut().filter(|a| a.active) {
            let Some(quote) = board.quote(&alert.instrument_id) else {
                continue;
            };
            if alert.is_met(quote.current_price) {
                alert.active = false;
                triggered.push(alert.clone());
            }
        }
        triggered
    }
}
